use glam::Vec2;
use swarm_common::{EntityBatch, STATUS_ACTIVE};

/// Parameters of the demo batch generator.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Positions are uniform in `[-spread/2, spread/2)` on each axis.
    pub position_spread: f32,
    /// Velocities (world units per second) are uniform in `[-spread/2, spread/2)`.
    pub velocity_spread: f32,
    /// Cumulative probability thresholds per type; the last type takes the rest.
    pub type_weights: Vec<f32>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            position_spread: 0.1,
            velocity_spread: 0.5,
            // friendly 50%, hostile 30%, neutral 15%, unknown 5%
            type_weights: vec![0.5, 0.8, 0.95],
        }
    }
}

/// Deterministic generator of demo entity batches.
///
/// Same seed, same sequence of batches. Stands in for the external batch
/// producer so the apps have something to ingest.
#[derive(Debug, Clone)]
pub struct BatchGenerator {
    config: SpawnConfig,
    state: u64,
}

impl BatchGenerator {
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, SpawnConfig::default())
    }

    pub fn with_config(seed: u64, config: SpawnConfig) -> Self {
        Self {
            config,
            state: seed,
        }
    }

    /// Produce `count` active entities.
    pub fn generate(&mut self, count: usize) -> EntityBatch {
        let mut batch = EntityBatch::with_capacity(count);
        for _ in 0..count {
            let position = self.centered_pair() * self.config.position_spread;
            let velocity = self.centered_pair() * self.config.velocity_spread;
            let kind = self.pick_type();
            batch.push(position, velocity, STATUS_ACTIVE, kind);
        }
        batch
    }

    fn pick_type(&mut self) -> u32 {
        let r = self.next_f32();
        self.config
            .type_weights
            .iter()
            .position(|&threshold| r < threshold)
            .unwrap_or(self.config.type_weights.len()) as u32
    }

    /// Both components uniform in `[-0.5, 0.5)`, x drawn first.
    fn centered_pair(&mut self) -> Vec2 {
        let x = self.next_f32() - 0.5;
        let y = self.next_f32() - 0.5;
        Vec2::new(x, y)
    }

    /// Uniform in `[0, 1)` from the top 24 bits.
    fn next_f32(&mut self) -> f32 {
        self.state = splitmix64(self.state);
        (self.state >> 40) as f32 / (1u64 << 24) as f32
    }
}

/// Splitmix64 step function.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_batch() {
        let a = BatchGenerator::new(42).generate(100);
        let b = BatchGenerator::new(42).generate(100);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = BatchGenerator::new(1).generate(10);
        let b = BatchGenerator::new(2).generate(10);
        assert_ne!(a.positions, b.positions);
    }

    #[test]
    fn batch_rows_are_active_and_bounded() {
        let batch = BatchGenerator::new(7).generate(1000);
        assert_eq!(batch.len(), 1000);
        assert!(batch.is_consistent());
        assert!(batch.statuses.iter().all(|&s| s == STATUS_ACTIVE));
        assert!(batch.types.iter().all(|&t| t < 4));
        for p in &batch.positions {
            assert!(p[0].abs() <= 0.05 && p[1].abs() <= 0.05);
            assert_eq!(p[2], 0.0);
        }
    }

    #[test]
    fn type_distribution_favours_first_type() {
        let batch = BatchGenerator::new(99).generate(10_000);
        let mut counts = [0usize; 4];
        for &t in &batch.types {
            counts[t as usize] += 1;
        }
        assert!(counts[0] > counts[1]);
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[3]);
        assert!(counts[3] > 0);
    }
}
