// Reward Distribution Engine
//
// Splits an interval's global mix income among nodes according to their stake
// share, pledge share and sampled activity, then splits each node's profit
// between its operator and its delegators.

use crate::econ_interface::Token;
use crate::econ_node::NodeProfile;

// ============================================================================
// Work Factors
// ============================================================================

/// Relative work of an active node and of a node in reserve
///
/// With `f` the active/reserve work ratio, `k` rewarded nodes and `idle`
/// reserve slots, `f*active + idle*reserve` sums to one over the rewarded set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkFactors {
    pub active: f64,
    pub idle: f64,
}

impl WorkFactors {
    /// # Arguments
    /// * `k` - rewarded set size
    /// * `active_nodes` - layers * mixnet width
    /// * `factor` - work of an active node relative to a reserve node
    pub fn new(k: usize, active_nodes: usize, factor: f64) -> Self {
        let idle_nodes = k.saturating_sub(active_nodes) as f64;
        let denominator = factor * k as f64 - (factor - 1.0) * idle_nodes;
        Self {
            active: factor / denominator,
            idle: 1.0 / denominator,
        }
    }
}

// ============================================================================
// Reward Formula
// ============================================================================

/// Per-interval inputs shared by every node's reward computation
#[derive(Debug, Clone, Copy)]
pub struct RewardContext {
    /// Emission plus the mix share of bandwidth income
    pub income_global_mix: Token,
    pub performance: f64,
    pub alpha: f64,
    pub k: usize,
    pub work: WorkFactors,
}

impl RewardContext {
    /// Tokens a node receives for the interval
    ///
    /// The active and reserve terms are weighted by the fraction of epochs the
    /// node spent in each role, so a node never selected receives nothing.
    pub fn node_reward(&self, profile: &NodeProfile) -> Token {
        let k = self.k as f64;
        let base = self.performance * self.income_global_mix * profile.sigma * k;
        let premium = self.alpha * profile.lambda;

        let active = profile.activity_percent * base * (self.work.active + premium) / (1.0 + self.alpha);
        let reserve = profile.reserve_percent * base * (self.work.idle + premium) / (1.0 + self.alpha);
        active + reserve
    }
}

// ============================================================================
// Profit Split
// ============================================================================

/// Operator and delegator shares of a node's profit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfitSplit {
    pub operator: Token,
    pub delegators: Token,
}

/// Split a node's profit between operator and delegators
///
/// A positive profit gives the operator its margin plus a pledge-proportional
/// part of the rest. A loss is borne entirely by the operator.
pub fn split_profit(profit: Token, pledge: Token, delegated: Token, margin: f64) -> ProfitSplit {
    if profit > 0.0 {
        let total = pledge + delegated;
        ProfitSplit {
            operator: (margin + (1.0 - margin) * pledge / total) * profit,
            delegators: (1.0 - margin) * delegated / total * profit,
        }
    } else {
        ProfitSplit {
            operator: profit,
            delegators: 0.0,
        }
    }
}
