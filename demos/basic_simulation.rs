//! Basic economy simulation
//!
//! Run with: cargo run --example basic_simulation --release

use log::info;
use simple_logger::SimpleLogger;

use econ_rust::econ_results::NodeParameter;
use econ_rust::{EconConfig, EconSimulation, SizeClass};

fn main() {
    SimpleLogger::new().init().unwrap();

    info!("Setting up simulation...");

    // One year with traffic growing 6% per month and cheap bandwidth
    let config = EconConfig {
        num_intervals: 13,
        seed: None, // Will be auto-generated
        type_bw_growth: "BW_EXP_GROWTH_6%_STEADY".to_string(),
        cost_packet_bw_initial_dollar: 1e-9,
        ..Default::default()
    };

    info!("Starting simulation...");

    let result = match EconSimulation::new(config).and_then(|sim| sim.run()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    info!("Simulation complete!");
    info!("Seed used: {:?}", result.seed);

    for t in [0, 6, 12] {
        let rewards = result.distribution(NodeParameter::ReceivedRewards);
        let rewarded = rewards[t].iter().flatten().filter(|&&r| r > 0.0).count();
        info!(
            "Month {:>2}: k={} candidates={} (SAT {}, RND {}, MIN {}), {} rewarded, unclaimed {:.0}",
            t,
            result.sizing.k[t],
            result.sizing.num_mixes[t],
            result.class_count(t, SizeClass::Saturated),
            result.class_count(t, SizeClass::RandomPledge),
            result.class_count(t, SizeClass::Minimum),
            rewarded,
            result.series.rewards_unclaimed[t]
        );
    }

    let yearly = result.annualized_by_year(NodeParameter::RosDelegator);
    if let Some(first_year) = yearly.first() {
        let avg = first_year.iter().sum::<f64>() / first_year.len().max(1) as f64;
        info!("Average annualized delegator return, year 1: {:.2}%", 100.0 * avg);
    }

    result.print_summary();
}
