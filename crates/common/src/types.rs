use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed slot capacity of the device-resident entity arrays.
pub const MAX_ENTITIES: u32 = 1_000_000;

/// Invocations per simulation workgroup.
pub const WORKGROUP_SIZE: u32 = 64;

/// Picking word meaning "no valid id".
pub const PICK_SENTINEL: u32 = 0xFFFF_FFFF;

pub const STATUS_INACTIVE: u32 = 0;
pub const STATUS_ACTIVE: u32 = 1;

/// Half edge of a sprite quad in device pixels. Mirrored by the WGSL constant of the same name.
pub const SPRITE_HALF_PX: f32 = 8.0;

/// Slot index of an entity in the device-resident arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    /// Decode a raw picking word. The sentinel maps to `None`.
    pub fn from_pick(raw: u32) -> Option<Self> {
        (raw != PICK_SENTINEL).then_some(Self(raw))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:06}", self.0)
    }
}

/// A batch of entities to append, stored as four parallel arrays.
///
/// Row `i` of every array describes the same entity. A batch whose arrays
/// disagree in length is treated as having the length of the shortest one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityBatch {
    pub positions: Vec<[f32; 4]>,
    pub velocities: Vec<[f32; 4]>,
    pub statuses: Vec<u32>,
    pub types: Vec<u32>,
}

impl EntityBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            positions: Vec::with_capacity(capacity),
            velocities: Vec::with_capacity(capacity),
            statuses: Vec::with_capacity(capacity),
            types: Vec::with_capacity(capacity),
        }
    }

    /// Build a batch from flat arrays: 4 floats per position and velocity,
    /// one word per status and type. Trailing partial rows are ignored.
    pub fn from_flat(
        positions: &[f32],
        velocities: &[f32],
        statuses: &[u32],
        types: &[u32],
    ) -> Self {
        let to_rows = |flat: &[f32]| -> Vec<[f32; 4]> {
            flat.chunks_exact(4)
                .map(|c| [c[0], c[1], c[2], c[3]])
                .collect()
        };
        Self {
            positions: to_rows(positions),
            velocities: to_rows(velocities),
            statuses: statuses.to_vec(),
            types: types.to_vec(),
        }
    }

    /// Append one entity. `w` of the position is set to 1.0.
    pub fn push(&mut self, position: Vec2, velocity: Vec2, status: u32, kind: u32) {
        self.positions.push([position.x, position.y, 0.0, 1.0]);
        self.velocities.push([velocity.x, velocity.y, 0.0, 0.0]);
        self.statuses.push(status);
        self.types.push(kind);
    }

    /// Number of complete rows.
    pub fn len(&self) -> usize {
        self.positions
            .len()
            .min(self.velocities.len())
            .min(self.statuses.len())
            .min(self.types.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when all four arrays have the same length.
    pub fn is_consistent(&self) -> bool {
        let n = self.positions.len();
        self.velocities.len() == n && self.statuses.len() == n && self.types.len() == n
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinel_decodes_to_none() {
        assert_eq!(EntityId::from_pick(PICK_SENTINEL), None);
        assert_eq!(EntityId::from_pick(0), Some(EntityId(0)));
        assert_eq!(EntityId::from_pick(41), Some(EntityId(41)));
    }

    #[test]
    fn entity_id_display_is_zero_padded() {
        assert_eq!(EntityId(42).to_string(), "#000042");
    }

    #[test]
    fn push_keeps_rows_paired() {
        let mut batch = EntityBatch::new();
        batch.push(Vec2::new(1.0, 2.0), Vec2::new(0.1, 0.2), STATUS_ACTIVE, 3);
        assert_eq!(batch.len(), 1);
        assert!(batch.is_consistent());
        assert_eq!(batch.positions[0], [1.0, 2.0, 0.0, 1.0]);
        assert_eq!(batch.velocities[0], [0.1, 0.2, 0.0, 0.0]);
        assert_eq!(batch.types[0], 3);
    }

    #[test]
    fn mismatched_arrays_use_shortest_length() {
        let batch = EntityBatch {
            positions: vec![[0.0; 4]; 3],
            velocities: vec![[0.0; 4]; 3],
            statuses: vec![1; 2],
            types: vec![0; 3],
        };
        assert_eq!(batch.len(), 2);
        assert!(!batch.is_consistent());
    }

    #[test]
    fn from_flat_drops_partial_rows() {
        let positions = [1.0, 2.0, 0.0, 1.0, 3.0, 4.0];
        let velocities = [0.5, 0.5, 0.0, 0.0];
        let batch = EntityBatch::from_flat(&positions, &velocities, &[1], &[2]);
        assert_eq!(batch.positions, vec![[1.0, 2.0, 0.0, 1.0]]);
        assert_eq!(batch.len(), 1);
    }
}
