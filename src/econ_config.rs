// Simulation Configuration
//
// Every input parameter of the model. A config value is immutable once a run
// starts and is passed by reference into each component.

use crate::econ_error::{EconError, Result};
use crate::econ_interface::{Token, DUMMY_PACKETS_PER_SECOND, EPOCHS_PER_MONTH, SECONDS_PER_MONTH};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

// ============================================================================
// Main Configuration
// ============================================================================

/// All tunable parameters of the economic model
///
/// `Default` is the baseline scenario: two years of operation with no user
/// traffic, a 250M token mixmining pool emitting 2% per month, and 675M tokens
/// vesting in eight quarterly tranches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EconConfig {
    /// Number of monthly reward intervals (12 * 2 + 1 covers two years)
    pub num_intervals: usize,

    /// Random seed for reproducibility (None = generated from entropy)
    #[serde(skip)]
    pub seed: Option<[u8; 32]>,

    // ------------------------------------------------------------------------
    // Demand
    // ------------------------------------------------------------------------
    /// Growth curve of user bandwidth demand (packets per month)
    pub type_bw_growth: String,

    /// Packets per second in the first month (ignored by BW_ZERO)
    pub initial_bandwidth: f64,

    // ------------------------------------------------------------------------
    // Token supply
    // ------------------------------------------------------------------------
    pub total_token: Token,
    pub mixmining_pool_initial: Token,

    /// Fraction of the mixmining pool emitted each month
    pub emission_rate: f64,

    pub liquid_tokens_initial: Token,
    pub unvested_tokens_initial: Token,

    /// Months until all unvested tokens are released
    pub vesting_period: usize,

    /// Months between vesting tranches
    pub vesting_interval: usize,

    // ------------------------------------------------------------------------
    // Staking
    // ------------------------------------------------------------------------
    /// Fraction of available stake pledged by operators to their own nodes
    pub frac_token_pledged: f64,

    /// Fraction of available stake delegated to nodes run by others
    pub frac_token_delegated: f64,

    /// Recompute pledge/delegation budgets from each interval's max delegatable
    /// stake instead of keeping the interval-0 budgets
    pub rebase_stake_budgets: bool,

    // ------------------------------------------------------------------------
    // Bandwidth income split
    // ------------------------------------------------------------------------
    /// Fraction of bandwidth income going to mix nodes (rest to gateways)
    pub bw_to_mix: f64,

    // ------------------------------------------------------------------------
    // Node parameters (identical for every node)
    // ------------------------------------------------------------------------
    pub node_profit_margin: f64,
    pub node_performance: f64,
    pub minimum_pledge_mix: Token,

    // ------------------------------------------------------------------------
    // Stake distribution and reward formula
    // ------------------------------------------------------------------------
    /// Fraction of all candidates registered with exactly the minimum pledge
    pub frac_min_pledge_mix: f64,

    /// Fraction of k (not of the candidates) registered with a saturated pledge
    pub frac_whale_mix: f64,

    /// Fraction of available stake needed to saturate every node
    pub beta: f64,

    /// Sybil-resistance premium weight for pledge in the reward formula
    pub alpha: f64,

    /// Work of an active node relative to a node in reserve
    pub factor_work_active: f64,

    // ------------------------------------------------------------------------
    // Prices
    // ------------------------------------------------------------------------
    pub type_token_growth: String,
    pub token_launch_price: f64,
    pub type_pp_growth: String,
    pub price_packet_initial_dollar: f64,

    // ------------------------------------------------------------------------
    // Node costs
    // ------------------------------------------------------------------------
    pub cost_packet_bw_initial_dollar: f64,
    pub monthly_cost_cpu_initial_dollar: f64,
    pub cpus_per_mix_initial: f64,

    /// Sphinx packets per second per cpu
    pub cpu_capacity_initial: f64,

    pub type_cpu_cost_growth: String,
    pub type_packet_bw_cost_growth: String,
    pub type_cpu_growth: String,
    pub type_capacity_growth: String,

    // ------------------------------------------------------------------------
    // Network size
    // ------------------------------------------------------------------------
    pub mixnet_layers: usize,
    pub type_mixnet_growth: String,

    /// Lower bound on k regardless of traffic
    pub nr_min_mixes: usize,

    /// Lower bound on the number of active mixes per layer
    pub min_mixnet_width: usize,

    /// Fraction of the k rewarded mixes that are active (rest in reserve)
    pub mix_active_rate: f64,

    /// Traffic peak over the average load that can be served at capacity
    pub peak_factor: f64,

    /// Registered candidates relative to k
    pub excess_candidate_factor: f64,

    // ------------------------------------------------------------------------
    // Epoch sampling
    // ------------------------------------------------------------------------
    pub epochs_per_interval: usize,
    pub sampler: SamplerKind,

    // ------------------------------------------------------------------------
    // Stakeholder reporting
    // ------------------------------------------------------------------------
    /// Unvested holdings up to this amount count fully towards effective stake
    pub cap_staking_unvested: Token,

    /// Share of unvested holdings above the cap that can be staked
    pub frac_staking_unvested: f64,
}

/// Weighted selection structure used by the epoch sampler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    /// Binary indexed tree, O(log n) per draw
    Fenwick,

    /// Shrinking cumulative array scanned linearly, O(n) per draw
    CumulativeScan,
}

// ============================================================================
// Default Implementation
// ============================================================================

impl Default for EconConfig {
    fn default() -> Self {
        let frac_token_pledged = 0.15;
        Self {
            num_intervals: 12 * 2 + 1,
            seed: None,

            type_bw_growth: "BW_ZERO".to_string(),
            initial_bandwidth: 200.0 * 1e3,

            total_token: 1e9,
            mixmining_pool_initial: 250.0 * 1e6,
            emission_rate: 0.02,
            liquid_tokens_initial: 75.0 * 1e6,
            unvested_tokens_initial: 675.0 * 1e6,
            vesting_period: 2 * 12,
            vesting_interval: 3,

            frac_token_pledged,
            frac_token_delegated: 0.60,
            rebase_stake_budgets: false,

            bw_to_mix: 0.6,

            node_profit_margin: 0.1,
            node_performance: 1.0,
            minimum_pledge_mix: 1000.0,

            frac_min_pledge_mix: 0.5,
            frac_whale_mix: frac_token_pledged / 4.0,
            beta: 1.0,
            alpha: 0.30,
            factor_work_active: 10.0,

            type_token_growth: "TOK_CONSTANT_100CENT".to_string(),
            token_launch_price: 0.5,
            type_pp_growth: "PP_CONSTANT".to_string(),
            price_packet_initial_dollar: 1e-6,

            cost_packet_bw_initial_dollar: 0.0,
            monthly_cost_cpu_initial_dollar: 12.5,
            cpus_per_mix_initial: 8.0,
            cpu_capacity_initial: 3125.0,

            type_cpu_cost_growth: "COST_CPU_CONSTANT".to_string(),
            type_packet_bw_cost_growth: "COST_BW_CONSTANT".to_string(),
            type_cpu_growth: "N_CPU_CONSTANT".to_string(),
            type_capacity_growth: "CPU_EXP_1%_STEADY".to_string(),

            mixnet_layers: 3,
            type_mixnet_growth: "MIXNET_LINEAR_GROWTH_WITH_TRAFFIC".to_string(),
            nr_min_mixes: 720,
            min_mixnet_width: 120,
            mix_active_rate: 0.5,
            peak_factor: 5.0,
            excess_candidate_factor: 2.0,

            epochs_per_interval: EPOCHS_PER_MONTH,
            sampler: SamplerKind::Fenwick,

            cap_staking_unvested: 100_000.0,
            frac_staking_unvested: 0.01,
        }
    }
}

impl Default for SamplerKind {
    fn default() -> Self {
        Self::Fenwick
    }
}

// ============================================================================
// Derived Parameters
// ============================================================================

impl EconConfig {
    /// Fraction of bandwidth income going to gateways
    pub fn bw_to_gw(&self) -> f64 {
        1.0 - self.bw_to_mix
    }

    /// Monthly bandwidth cost floor of a mix caused by loop cover traffic
    pub fn cost_mix_dummy(&self) -> f64 {
        self.cost_packet_bw_initial_dollar * DUMMY_PACKETS_PER_SECOND * SECONDS_PER_MONTH
    }

    /// Stake that could be delegated given the current mixmining pool
    pub fn max_delegatable_stake(&self, mixmining_pool: Token) -> Token {
        self.beta * (self.total_token - mixmining_pool)
    }

    /// Get or generate seed
    pub fn resolve_seed(&self) -> [u8; 32] {
        self.seed.unwrap_or_else(|| {
            let mut temp_rng = StdRng::from_entropy();
            let mut seed = [0u8; 32];
            temp_rng.fill_bytes(&mut seed);
            seed
        })
    }

    /// Reject parameter combinations the model cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.num_intervals == 0 {
            return Err(EconError::invalid("num_intervals must be at least 1"));
        }
        if self.vesting_interval == 0 || self.vesting_period == 0 {
            return Err(EconError::invalid("vesting_interval and vesting_period must be positive"));
        }
        if !(self.mix_active_rate > 0.0 && self.mix_active_rate <= 1.0) {
            return Err(EconError::invalid(format!(
                "mix_active_rate must be in (0, 1], got {}",
                self.mix_active_rate
            )));
        }
        if self.excess_candidate_factor < 1.0 {
            return Err(EconError::invalid(format!(
                "excess_candidate_factor must be >= 1, got {}",
                self.excess_candidate_factor
            )));
        }
        if !(0.0..=1.0).contains(&self.bw_to_mix) {
            return Err(EconError::invalid("bw_to_mix must be in [0, 1]"));
        }
        if self.frac_token_pledged < 0.0
            || self.frac_token_delegated < 0.0
            || self.frac_token_pledged + self.frac_token_delegated > 1.0
        {
            return Err(EconError::invalid(
                "frac_token_pledged + frac_token_delegated must be within [0, 1]",
            ));
        }
        if !(0.0..=1.0).contains(&self.node_profit_margin) {
            return Err(EconError::invalid("node_profit_margin must be in [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.node_performance) {
            return Err(EconError::invalid("node_performance must be in [0, 1]"));
        }
        if self.peak_factor <= 0.0 || self.factor_work_active <= 0.0 {
            return Err(EconError::invalid("peak_factor and factor_work_active must be positive"));
        }
        if self.mixnet_layers == 0 {
            return Err(EconError::invalid("mixnet_layers must be at least 1"));
        }
        if self.epochs_per_interval == 0 {
            return Err(EconError::invalid("epochs_per_interval must be at least 1"));
        }
        if self.minimum_pledge_mix <= 0.0 {
            return Err(EconError::invalid("minimum_pledge_mix must be positive"));
        }
        let supply = self.mixmining_pool_initial + self.liquid_tokens_initial + self.unvested_tokens_initial;
        if (supply - self.total_token).abs() > 0.5 {
            return Err(EconError::invalid(format!(
                "initial pool + liquid + unvested = {} does not match total_token {}",
                supply, self.total_token
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EconConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.num_intervals, 25);
        assert!((config.frac_whale_mix - 0.0375).abs() < 1e-12);
        assert!((config.bw_to_gw() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_dummy_cost_zero_without_bw_cost() {
        let mut config = EconConfig::default();
        assert_eq!(config.cost_mix_dummy(), 0.0);

        config.cost_packet_bw_initial_dollar = 1e-9;
        let expected = 1e-9 * 4000.0 * 3600.0 * 24.0 * 30.0;
        assert!((config.cost_mix_dummy() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_max_delegatable_stake() {
        let config = EconConfig::default();
        assert_eq!(config.max_delegatable_stake(250e6), 750e6);
    }

    #[test]
    fn test_rejects_bad_active_rate() {
        let config = EconConfig {
            mix_active_rate: 1.5,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(EconError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_supply_mismatch() {
        let config = EconConfig {
            liquid_tokens_initial: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "num_intervals: 6\nalpha: 0.5\nsampler: cumulative_scan\n";
        let config: EconConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.num_intervals, 6);
        assert_eq!(config.alpha, 0.5);
        assert_eq!(config.sampler, SamplerKind::CumulativeScan);
        assert_eq!(config.nr_min_mixes, 720);
        assert!(config.seed.is_none());
    }

    #[test]
    fn test_fixed_seed_is_used() {
        let config = EconConfig {
            seed: Some([7u8; 32]),
            ..Default::default()
        };
        assert_eq!(config.resolve_seed(), [7u8; 32]);
    }
}
