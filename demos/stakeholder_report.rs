//! Stakeholder compounding report
//!
//! Run with: cargo run --example stakeholder_report --release
//!
//! Runs the baseline economy and shows how each stakeholder preset would
//! fare staking at the median return of nodes above 90% saturation.

use log::info;
use simple_logger::SimpleLogger;

use econ_rust::{EconConfig, EconSimulation, Stakeholder, StakeholderKind};

fn main() {
    SimpleLogger::new().init().unwrap();

    let config = EconConfig {
        seed: Some([7u8; 32]),
        ..Default::default()
    };

    info!("Running baseline simulation ({} months)...", config.num_intervals);
    let result = match EconSimulation::new(config).and_then(|sim| sim.run()) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Simulation failed: {}", e);
            std::process::exit(1);
        }
    };

    let median_ros = result.median_ros_reputable(0.9);
    info!(
        "Median monthly ROS of reputable nodes: {:?}",
        median_ros.iter().map(|r| format!("{:.4}", r)).collect::<Vec<_>>()
    );

    println!("\n{:<16} {:>14} {:>14} {:>14} {:>10}", "Stakeholder", "Start", "Wealth", "Rewards", "Gain");
    println!("{}", "-".repeat(72));
    for kind in StakeholderKind::ALL {
        let mut holder = Stakeholder::new(kind, &result.config);
        holder.compute_rewards(&median_ros);

        let last = holder.rewards.len() - 1;
        let start = holder.total_stake[0];
        let wealth = holder.wealth_compounded_stake[last];
        println!(
            "{:<16} {:>14.0} {:>14.0} {:>14.0} {:>9.2}%",
            kind.name(),
            start,
            wealth,
            holder.rewards_cumulative[last],
            100.0 * (wealth - start) / start
        );
    }
    println!();
}
