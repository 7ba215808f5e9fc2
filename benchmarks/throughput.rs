use std::hint::black_box;
use std::time::Instant;

use vcmrg::{AnyCmrg, Backend};

const NUM_STEPS: usize = 10_000;
const NUM_ITER: usize = 200;
const NUM_STREAMS: usize = 64;
const SEED: f64 = 12345.0;

/// Median values/µs over `NUM_ITER` timed rounds of `NUM_STEPS` steps per group.
fn bench_backend(backend: Backend) -> Option<f64> {
    let mut rng = AnyCmrg::with_backend(backend, NUM_STREAMS, SEED).ok()?;
    let mut buf = [0.0f64; 4];
    let mut results = Vec::with_capacity(NUM_ITER);

    // warmup
    for g in 0..rng.group_count() {
        for _ in 0..1_000 {
            black_box(rng.generate_into(g, &mut buf));
        }
    }

    for _ in 0..NUM_ITER {
        let start = Instant::now();
        let mut generated = 0usize;

        for _ in 0..NUM_STEPS {
            for g in 0..rng.group_count() {
                // NOTE: We consume result to avoid optimizations
                generated += black_box(rng.generate_into(g, &mut buf));
            }
        }

        let elapsed_us = start.elapsed().as_secs_f64() * 1e6;
        results.push(generated as f64 / elapsed_us);
    }

    results.sort_by(f64::total_cmp);

    // median
    Some(results[NUM_ITER / 2])
}

/// Lag-1 autocorrelation of one stream.
fn autocorrelation(backend: Backend) -> Option<f64> {
    const N: usize = 100_000;

    let mut rng = AnyCmrg::with_backend(backend, 1, SEED).ok()?;
    let mut numbers = vec![0.0; N];
    rng.fill(0, &mut numbers);

    let mean = numbers.iter().sum::<f64>() / N as f64;

    let mut num_acc = 0.0;
    let mut den_acc = 0.0;

    for pair in numbers.windows(2) {
        let x = pair[0] - mean;
        let y = pair[1] - mean;

        num_acc += x * y;
        den_acc += x * x;
    }

    Some(num_acc / den_acc)
}

fn main() {
    println!("## Benchmarks");
    println!();
    println!("detected backend: {}", Backend::detect());
    println!();
    println!("| Backend | Lanes | Throughput (values/µs) | Lag-1 autocorr |");
    println!("|:-------:|:-----:|:----------------------:|:--------------:|");

    for backend in Backend::ALL {
        let (Some(thpt), Some(ac)) = (bench_backend(backend), autocorrelation(backend)) else {
            continue;
        };

        println!("| {:<7} | {:>5} | {:>22.2} | {:>14.5} |", backend, backend.width(), thpt, ac);
    }
}
