//! # econRust - Mixnet Token Economy Simulator
//!
//! An offline, seedable what-if simulator for the monthly economy of a
//! token-incentivized mix network: token supply (vesting, mixmining pool
//! emission), network sizing driven by traffic demand, the population of
//! reward-eligible mix nodes and their stake, stochastic active/reserve duty
//! per epoch, and the resulting rewards for operators and delegators.
//!
//! ## Core Components
//!
//! - **EconSimulation**: interval state machine running the six monthly stages in order
//! - **NodePopulation**: per-interval candidate nodes with pledge and delegated stake
//! - **EpochSampler**: stake-weighted active/reserve selection per epoch
//! - **RewardContext / split_profit**: reward formula and operator/delegator split
//! - **SimulationResult**: time series, node lists and report queries
//!
//! ## Usage
//!
//! ```no_run
//! use econ_rust::{EconConfig, EconSimulation};
//!
//! let config = EconConfig {
//!     num_intervals: 13,
//!     seed: Some([0u8; 32]),
//!     ..Default::default()
//! };
//!
//! let result = EconSimulation::new(config)?.run()?;
//! result.print_summary();
//! # Ok::<(), econ_rust::EconError>(())
//! ```
//!
//! ## Scenarios
//!
//! For running YAML scenario files see the `scenario_runner` binary in
//! `simulator/`.

// Shared types
pub mod econ_interface;
pub mod econ_error;
pub mod econ_config;

// Exogenous inputs
pub mod econ_curves;
pub mod econ_network;

// Simulation core
pub mod econ_node;
pub mod econ_population;
pub mod econ_sampler;
pub mod econ_rewards;
pub mod econ_state;

// Reporting
pub mod econ_results;
pub mod econ_stakeholder;

// Re-export commonly used types
pub use econ_config::{EconConfig, SamplerKind};
pub use econ_error::{EconError, Result};
pub use econ_interface::{Interval, NodeSerial, SizeClass, Token};
pub use econ_node::SettledNode;
pub use econ_results::{NodeParameter, SimulationResult};
pub use econ_stakeholder::{Stakeholder, StakeholderKind};
pub use econ_state::{EconSimulation, IntervalStage};
