use log::{error, info};
use simple_logger::SimpleLogger;

use econ_rust::econ_results::hex_seed;
use econ_rust::{EconConfig, EconSimulation, Stakeholder, StakeholderKind};

/// Month whose node list is printed after the run
const SAMPLE_MONTH: usize = 0;

fn main() {
    SimpleLogger::new().init().unwrap();

    info!("starting");

    let config = EconConfig::default();
    let seed = config.resolve_seed();
    info!("let seed = {:?};", seed);

    let simulation = match EconSimulation::new(EconConfig {
        seed: Some(seed),
        ..config
    }) {
        Ok(simulation) => simulation,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // run() fails on a pledge budget that cannot cover all nodes, or when the
    // token total does not add up at the end
    let result = match simulation.run() {
        Ok(result) => result,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    result.print_summary();
    result.print_nodes(SAMPLE_MONTH);

    let median_ros = result.median_ros_reputable(0.9);
    for kind in StakeholderKind::ALL {
        let mut holder = Stakeholder::new(kind, &result.config);
        holder.compute_rewards(&median_ros);
        holder.print_summary();
    }

    info!("done. seed {}", hex_seed(&result.seed));
}
