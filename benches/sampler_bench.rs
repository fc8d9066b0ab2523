use econ_rust::econ_sampler::EpochSampler;
use econ_rust::SamplerKind;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Instant;

/// Benchmark one interval of epoch sampling with each selection index
fn main() {
    std::env::set_var("RUST_LOG", "error");
    let _ = simple_logger::init();

    println!("\n=== Epoch Sampler Benchmark (one interval) ===\n");

    // (label, candidates, active slots, reserve slots)
    let networks = vec![
        ("Minimum network (k=720)", 1440, 360, 360),
        ("Grown network (k=1200)", 2400, 600, 600),
        ("Large network (k=3000)", 6000, 1500, 1500),
    ];
    let epochs = 720;

    println!(
        "{:<28} {:>16} {:>16} {:>10}",
        "Network", "Fenwick (ms)", "Scan (ms)", "Speedup"
    );
    println!("{}", "-".repeat(74));

    for (name, candidates, active, reserve) in networks {
        let mut rng = StdRng::seed_from_u64(1);
        let weights: Vec<f64> = (0..candidates).map(|_| rng.gen_range(0.1..1.0)).collect();

        let mut timings = Vec::new();
        for kind in [SamplerKind::Fenwick, SamplerKind::CumulativeScan] {
            let sampler = match EpochSampler::new(weights.clone(), active, reserve, kind) {
                Ok(sampler) => sampler,
                Err(e) => {
                    eprintln!("{}: {}", name, e);
                    return;
                }
            };
            let mut rng = StdRng::seed_from_u64(2);
            let start = Instant::now();
            let shares = sampler.run(epochs, &mut rng);
            let elapsed = start.elapsed().as_secs_f64() * 1000.0;

            let total: f64 = shares.active.iter().sum();
            assert!((total - active as f64).abs() < 1e-6);
            timings.push(elapsed);
        }

        println!(
            "{:<28} {:>16.1} {:>16.1} {:>9.1}x",
            name,
            timings[0],
            timings[1],
            timings[1] / timings[0]
        );
    }

    println!("\nBoth samplers draw each node with probability proportional to its");
    println!("remaining stake weight; only the lookup structure differs.");
}
