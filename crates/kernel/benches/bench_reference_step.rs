use std::hint::black_box;
use std::time::Instant;

use glam::Mat4;
use swarm_common::{FrameUniforms, PICK_SENTINEL};
use swarm_kernel::{BatchGenerator, SlotArena, reference};

fn bench_step(entity_count: usize, iterations: usize) {
    let mut entities = BatchGenerator::new(42).generate(entity_count);
    let uniforms = FrameUniforms {
        view_proj: Mat4::orthographic_rh(-0.05, 0.05, -0.05, 0.05, -1.0, 1.0).to_cols_array_2d(),
        delta_time: 0.016,
        viewport_width: 1280.0,
        viewport_height: 720.0,
        pointer_world: [0.0, 0.0],
        pick_radius: 0.001,
        click: 1.0,
        ..Default::default()
    };

    let start = Instant::now();
    let mut visible = 0;
    for _ in 0..iterations {
        let out = reference::step(black_box(&mut entities), black_box(&uniforms), PICK_SENTINEL);
        visible = out.instance_count();
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  step ({entity_count} entities, {iterations} iters): {per_iter:?}/iter, \
         total {elapsed:?}, last visible {visible}"
    );
}

fn bench_reserve(iterations: usize) {
    let start = Instant::now();
    for _ in 0..iterations {
        let mut arena = SlotArena::default();
        while !arena.is_full() {
            black_box(arena.reserve(black_box(10_000)));
        }
    }
    let elapsed = start.elapsed();
    println!("  fill arena in 10k batches ({iterations} iters): total {elapsed:?}");
}

fn main() {
    println!("=== Reference Simulation Benchmarks ===\n");

    println!("Reference step:");
    bench_step(10_000, 100);
    bench_step(100_000, 10);
    bench_step(1_000_000, 2);

    println!("\nSlot arena:");
    bench_reserve(1000);

    println!("\n=== Done ===");
}
