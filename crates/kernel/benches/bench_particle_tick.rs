use std::hint::black_box;
use std::time::Instant;

use walkscene_input::{Action, Direction};
use walkscene_kernel::{FrameScheduler, LocomotionParams, ParticleField, SmokeParams, YawRig};

fn bench_smoke_tick(count: usize, iterations: usize) {
    let mut field = ParticleField::new(SmokeParams {
        count,
        ..SmokeParams::default()
    });

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(field.tick());
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  smoke tick ({count} particles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn bench_frame(count: usize, iterations: usize) {
    let mut scheduler = FrameScheduler::new(
        LocomotionParams::default(),
        SmokeParams {
            count,
            ..SmokeParams::default()
        },
    );
    scheduler.locomotion.handle(Action::RequestLock);
    scheduler.locomotion.handle(Action::LockResolved(true));
    scheduler.locomotion.handle(Action::Press(Direction::Forward));
    let mut rig = YawRig::default();

    let start = Instant::now();
    for _ in 0..iterations {
        black_box(scheduler.tick(black_box(0.016), &mut rig));
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!(
        "  full frame ({count} particles, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}"
    );
}

fn main() {
    println!("=== Frame Kernel Benchmarks ===\n");

    println!("Smoke tick:");
    bench_smoke_tick(200, 10_000);
    bench_smoke_tick(2_000, 1_000);
    bench_smoke_tick(20_000, 100);

    println!("\nFull frame (locomotion + smoke):");
    bench_frame(200, 10_000);
    bench_frame(20_000, 100);

    println!("\n=== Done ===");
}
