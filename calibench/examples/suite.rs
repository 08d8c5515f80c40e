//! Calibench Example Benchmarks
//!
//! This example demonstrates Calibench features and serves as a template for
//! creating your own benchmark suite.
//!
//! Run with:
//!   cargo run --release --example suite                        # Run all benchmarks
//!   cargo run --release --example suite -- --list              # List benchmarks
//!   cargo run --release --example suite -- '^sort' -v          # Filter, debug logging
//!   cargo run --release --example suite -- --bench-time 200x   # Fixed iteration count
//!   cargo run --release --example suite -- --format compact    # Machine-readable map

use calibench::prelude::*;
use calibench::TrackingAllocator;
use calibench::bench;
use std::collections::HashMap;

#[global_allocator]
static ALLOC: TrackingAllocator = TrackingAllocator;

// ============================================================================
// Basic Benchmarks
// ============================================================================

/// Simple arithmetic benchmark
#[bench]
fn addition(b: &mut Bencher) {
    let x = 42u64;
    for i in 0..b.n() {
        black_box(black_box(x) + black_box(i));
    }
}

/// Checksum with declared throughput
#[bench(tags = "throughput")]
fn checksum(b: &mut Bencher) {
    let data: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
    b.set_bytes_per_iteration(data.len() as u64);
    b.reset_timer();

    for _ in 0..b.n() {
        let sum = data
            .iter()
            .fold(0u32, |acc, &x| acc.rotate_left(5) ^ u32::from(x));
        black_box(sum);
    }
}

/// Allocating workload: shows B/op and allocs/op
#[bench(tags = "alloc")]
fn build_map(b: &mut Bencher) {
    for i in 0..b.n() {
        let mut map = HashMap::with_capacity(16);
        for k in 0..16u64 {
            map.insert(k, i ^ k);
        }
        black_box(map);
    }
}

// ============================================================================
// Sub-benchmarks
// ============================================================================

/// One entry point fanning out over input sizes
#[bench(name = "sort", time = "300ms")]
fn sort_sizes(b: &mut Bencher) -> Outcome {
    for size in [16usize, 256, 4096] {
        b.run(&format!("{size}"), move |b: &mut Bencher| {
            let input: Vec<u64> = (0..size as u64).rev().collect();
            for _ in 0..b.n() {
                b.stop_timer();
                let mut v = input.clone();
                b.start_timer();
                v.sort_unstable();
                black_box(v);
            }
            Ok(())
        });
    }
    Ok(())
}

// ============================================================================
// Skip, Fail and Cancellation
// ============================================================================

/// Skipped when the environment lacks what it needs
#[bench]
fn needs_env(b: &mut Bencher) -> Outcome {
    let Ok(path) = std::env::var("CALIBENCH_FIXTURE") else {
        return b.skip("CALIBENCH_FIXTURE not set");
    };
    let Ok(bytes) = std::fs::read(&path) else {
        return b.fail(format!("cannot read {path}"));
    };
    b.set_bytes_per_iteration(bytes.len() as u64);
    for _ in 0..b.n() {
        black_box(bytes.iter().filter(|&&c| c == b'\n').count());
    }
    Ok(())
}

/// Long-running loop that cooperates with the time budget
#[bench(iterations = 50)]
fn cooperative(b: &mut Bencher) -> Outcome {
    for i in 0..b.n() {
        b.check_deadline()?;
        black_box((0..10_000u64).fold(i, |a, x| a.wrapping_add(x * x)));
    }
    Ok(())
}

// ============================================================================
// Triggers
// ============================================================================

/// Fails the trigger (not the suite) when the temp dir is unusable
#[trigger(before)]
fn scratch_dir() -> TriggerResult {
    std::fs::create_dir_all(std::env::temp_dir().join("calibench-example"))?;
    Ok(())
}

#[trigger(after, name = "cleanup")]
fn cleanup() {
    let _ = std::fs::remove_dir_all(std::env::temp_dir().join("calibench-example"));
}

fn main() {
    // All benchmarks defined above are automatically discovered via inventory
    if let Err(e) = calibench::run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
