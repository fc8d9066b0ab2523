//! Error types for the economic simulation

use crate::econ_interface::{Interval, Token};
use thiserror::Error;

/// Result type alias for simulation operations
pub type Result<T> = std::result::Result<T, EconError>;

/// Fatal conditions that terminate a simulation run
#[derive(Error, Debug, Clone)]
pub enum EconError {
    // === Node population ===
    /// Not enough pledge to give every candidate the minimum pledge
    #[error(
        "interval {interval}: pledge budget {budget:.0} cannot cover {required:.0} of saturated and minimum pledges \
         (increase frac_token_pledged, decrease minimum_pledge_mix or decrease frac_whale_mix)"
    )]
    PledgeBudgetInsufficient {
        interval: Interval,
        budget: Token,
        required: Token,
    },

    /// The capped Pareto excess vector did not settle under the saturation cap
    #[error(
        "interval {interval}: pledge excess capping did not converge after {iterations} iterations \
         (saturation threshold too close to minimum pledge for the remaining pledge budget)"
    )]
    PledgeCapNotConverged { interval: Interval, iterations: usize },

    /// Saturated and minimum classes together exceed the candidate count
    #[error(
        "interval {interval}: {saturated} saturated + {minimum} minimum-pledge nodes exceed {candidates} candidates"
    )]
    NodeClassOverflow {
        interval: Interval,
        saturated: usize,
        minimum: usize,
        candidates: usize,
    },

    // === Bookkeeping ===
    /// pool + circulating + unvested drifted away from the total supply
    #[error("interval {interval}: token total is {observed:.3} instead of {expected:.3}\n{ledger}")]
    TokenConservation {
        interval: Interval,
        observed: Token,
        expected: Token,
        ledger: String,
    },

    // === Configuration ===
    /// A growth curve name the library does not know
    #[error("unrecognized growth curve type: {name}")]
    UnknownCurve { name: String },

    /// Configuration failed validation
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Scenario file could not be read or parsed
    #[error("failed to load scenario: {0}")]
    ScenarioLoad(String),
}

impl EconError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
