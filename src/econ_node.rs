//! Mix node records for one interval
//!
//! A node is rebuilt from scratch every interval and moves through four typed
//! stages, each consuming the previous one:
//!
//! ```text
//! CandidateNode --price--> PricedNode --reward--> RewardedNode --settle--> SettledNode
//! ```
//!
//! The stage types make the required ordering (costs before rewards, rewards
//! before the profit split) impossible to skip.

use crate::econ_interface::{NodeSerial, SizeClass, Token};

/// Stake, weights and sampled activity of a node; fixed once generated
#[derive(Debug, Clone, PartialEq)]
pub struct NodeProfile {
    /// Serial number within the interval
    pub serial: NodeSerial,

    /// How the pledge was chosen
    pub size_class: SizeClass,

    /// Stake committed by the operator
    pub pledge: Token,

    /// Stake delegated by stakeholders
    pub delegated: Token,

    /// Saturation point per node in the interval (global value)
    pub stake_saturation: Token,

    /// Pledge share of total stake, capped at 1/k
    pub lambda: f64,

    /// Total stake share, capped at 1/k
    pub sigma: f64,

    /// Fraction of epochs spent in the active set
    pub activity_percent: f64,

    /// Fraction of epochs spent in reserve
    pub reserve_percent: f64,
}

impl NodeProfile {
    pub fn total_stake(&self) -> Token {
        self.pledge + self.delegated
    }

    /// Total stake relative to the saturation point
    pub fn saturation_percent(&self) -> f64 {
        self.total_stake() / self.stake_saturation
    }

    /// Pledge relative to the saturation point
    pub fn pledge_saturation_percent(&self) -> f64 {
        self.pledge / self.stake_saturation
    }
}

// ============================================================================
// Stages
// ============================================================================

/// Generated node with its declared flat monthly cost
#[derive(Debug, Clone)]
pub struct CandidateNode {
    pub profile: NodeProfile,
    pub flat_cost: Token,
}

/// Node whose operational cost includes the activity-dependent bandwidth cost
#[derive(Debug, Clone)]
pub struct PricedNode {
    pub profile: NodeProfile,
    pub node_cost: Token,
}

/// Node with its share of the interval's reward budget
#[derive(Debug, Clone)]
pub struct RewardedNode {
    pub profile: NodeProfile,
    pub node_cost: Token,
    pub received_rewards: Token,
}

/// Final per-interval record, profit split between operator and delegators
#[derive(Debug, Clone)]
pub struct SettledNode {
    pub profile: NodeProfile,
    pub node_cost: Token,
    pub received_rewards: Token,
    pub operator_profit: Token,
    pub delegate_profit: Token,
}

impl CandidateNode {
    /// Add the variable bandwidth cost, paid only while active
    pub fn price(self, bw_cost: Token) -> PricedNode {
        let node_cost = self.flat_cost + self.profile.activity_percent * bw_cost;
        PricedNode {
            profile: self.profile,
            node_cost,
        }
    }
}

impl PricedNode {
    pub fn reward(self, received_rewards: Token) -> RewardedNode {
        RewardedNode {
            profile: self.profile,
            node_cost: self.node_cost,
            received_rewards,
        }
    }
}

impl RewardedNode {
    /// Rewards minus operational cost; negative when costs exceed rewards
    pub fn profit(&self) -> Token {
        self.received_rewards - self.node_cost
    }

    pub fn settle(self, operator_profit: Token, delegate_profit: Token) -> SettledNode {
        SettledNode {
            profile: self.profile,
            node_cost: self.node_cost,
            received_rewards: self.received_rewards,
            operator_profit,
            delegate_profit,
        }
    }
}

// ============================================================================
// Return Metrics
// ============================================================================

impl SettledNode {
    pub fn serial(&self) -> NodeSerial {
        self.profile.serial
    }

    pub fn profit(&self) -> Token {
        self.received_rewards - self.node_cost
    }

    /// Monthly operator return, taking operational costs into account
    pub fn ros_operator(&self) -> f64 {
        self.operator_profit / (self.profile.pledge + self.node_cost)
    }

    /// Monthly delegator return; not applicable without delegated stake
    pub fn ros_delegator(&self) -> Option<f64> {
        if self.profile.delegated > 0.0 {
            Some(self.delegate_profit / self.profile.delegated)
        } else {
            None
        }
    }

    /// Operator profit over pledge, annualized without compounding
    pub fn apy_operator(&self) -> f64 {
        12.0 * self.operator_profit / self.profile.pledge
    }

    /// Delegator profit over delegated stake, annualized without compounding
    pub fn apy_delegator(&self) -> Option<f64> {
        self.ros_delegator().map(|ros| 12.0 * ros)
    }

    /// Delegator profit if any stake is delegated
    pub fn delegate_profit_if_any(&self) -> Option<Token> {
        (self.profile.delegated > 0.0).then_some(self.delegate_profit)
    }
}
