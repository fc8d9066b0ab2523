// Simulation Results
//
// Finished run: time series, per-interval node lists and the queries used by
// reports (node parameters, distributions, staking reward samples, median
// returns of reputable nodes).

use crate::econ_config::EconConfig;
use crate::econ_error::{EconError, Result};
use crate::econ_interface::{Interval, SizeClass, Token, CONSERVATION_TOLERANCE};
use crate::econ_network::NetworkSizing;
use crate::econ_node::SettledNode;
use crate::econ_state::{EconSeries, ExogenousInputs};
use std::fmt::Write;

/// Pledges within this relative band of a stake amount count as comparable
const PLEDGE_MATCH_BAND: f64 = 0.2;

// ============================================================================
// Node Parameters
// ============================================================================

/// Numeric node fields that can be queried across a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeParameter {
    Serial,
    Pledge,
    Delegated,
    TotalStake,
    NodeCost,
    ReceivedRewards,
    OperatorProfit,
    DelegateProfit,
    Lambda,
    Sigma,
    SaturationPercent,
    PledgeSaturationPercent,
    ActivityPercent,
    ReservePercent,
    RosOperator,
    RosDelegator,
    ApyOperator,
    ApyDelegator,
}

impl NodeParameter {
    pub const ALL: [NodeParameter; 18] = [
        NodeParameter::Serial,
        NodeParameter::Pledge,
        NodeParameter::Delegated,
        NodeParameter::TotalStake,
        NodeParameter::NodeCost,
        NodeParameter::ReceivedRewards,
        NodeParameter::OperatorProfit,
        NodeParameter::DelegateProfit,
        NodeParameter::Lambda,
        NodeParameter::Sigma,
        NodeParameter::SaturationPercent,
        NodeParameter::PledgeSaturationPercent,
        NodeParameter::ActivityPercent,
        NodeParameter::ReservePercent,
        NodeParameter::RosOperator,
        NodeParameter::RosDelegator,
        NodeParameter::ApyOperator,
        NodeParameter::ApyDelegator,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Serial => "serial",
            Self::Pledge => "pledge",
            Self::Delegated => "delegated",
            Self::TotalStake => "total_stake",
            Self::NodeCost => "node_cost",
            Self::ReceivedRewards => "received_rewards",
            Self::OperatorProfit => "operator_profit",
            Self::DelegateProfit => "delegate_profit",
            Self::Lambda => "lambda",
            Self::Sigma => "sigma",
            Self::SaturationPercent => "saturation_percent",
            Self::PledgeSaturationPercent => "pledge_saturation_percent",
            Self::ActivityPercent => "activity_percent",
            Self::ReservePercent => "reserve_percent",
            Self::RosOperator => "ROS_operator",
            Self::RosDelegator => "ROS_delegator",
            Self::ApyOperator => "APY_operator",
            Self::ApyDelegator => "APY_delegator",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|p| p.name() == name)
    }

    /// Value of the parameter for a node; `None` where the ratio is undefined
    /// (delegator figures of a node without delegated stake)
    pub fn value(&self, node: &SettledNode) -> Option<f64> {
        let p = &node.profile;
        match self {
            Self::Serial => Some(p.serial as f64),
            Self::Pledge => Some(p.pledge),
            Self::Delegated => Some(p.delegated),
            Self::TotalStake => Some(p.total_stake()),
            Self::NodeCost => Some(node.node_cost),
            Self::ReceivedRewards => Some(node.received_rewards),
            Self::OperatorProfit => Some(node.operator_profit),
            Self::DelegateProfit => node.delegate_profit_if_any(),
            Self::Lambda => Some(p.lambda),
            Self::Sigma => Some(p.sigma),
            Self::SaturationPercent => Some(p.saturation_percent()),
            Self::PledgeSaturationPercent => Some(p.pledge_saturation_percent()),
            Self::ActivityPercent => Some(p.activity_percent),
            Self::ReservePercent => Some(p.reserve_percent),
            Self::RosOperator => Some(node.ros_operator()),
            Self::RosDelegator => node.ros_delegator(),
            Self::ApyOperator => Some(node.apy_operator()),
            Self::ApyDelegator => node.apy_delegator(),
        }
    }
}

// ============================================================================
// Staking Reward Samples
// ============================================================================

/// Annualized reward a stake would earn on one node, with that node's saturation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardSample {
    pub reward: Token,
    pub saturation: f64,
}

/// Per-interval samples for pledging vs delegating a given stake
#[derive(Debug, Clone, Default)]
pub struct StakingRewardSamples {
    pub pledge: Vec<Vec<RewardSample>>,
    pub delegate: Vec<Vec<RewardSample>>,
}

// ============================================================================
// Result
// ============================================================================

/// Complete output of a simulation run
#[derive(Debug, Clone)]
pub struct SimulationResult {
    pub config: EconConfig,

    /// Seed the run was started from
    pub seed: [u8; 32],

    pub inputs: ExogenousInputs,
    pub sizing: NetworkSizing,
    pub series: EconSeries,

    /// Settled nodes of every interval, ordered by serial
    pub nodes: Vec<Vec<SettledNode>>,
}

impl SimulationResult {
    pub fn num_intervals(&self) -> usize {
        self.nodes.len()
    }

    /// pool + circulating + unvested must equal the total supply every interval
    pub fn check_token_conservation(&self) -> Result<()> {
        let expected = self.config.total_token;
        for interval in 0..self.series.len() {
            let observed = self.series.total_tokens(interval);
            if (observed - expected).abs() > CONSERVATION_TOLERANCE {
                return Err(EconError::TokenConservation {
                    interval,
                    observed,
                    expected,
                    ledger: self.token_ledger(),
                });
            }
        }
        Ok(())
    }

    /// Pool, circulating and unvested balances of every interval as a table
    pub fn token_ledger(&self) -> String {
        let s = &self.series;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:>5} {:>18} {:>18} {:>18} {:>18}",
            "month", "pool", "circulating", "unvested", "total"
        );
        for t in 0..s.len() {
            let _ = writeln!(
                out,
                "{:>5} {:>18.3} {:>18.3} {:>18.3} {:>18.3}",
                t,
                s.mixmining_pool[t],
                s.circulating_tokens[t],
                s.unvested_tokens[t],
                s.total_tokens(t)
            );
        }
        out
    }

    /// Values of a parameter for every node of every interval
    pub fn distribution(&self, param: NodeParameter) -> Vec<Vec<Option<f64>>> {
        self.nodes
            .iter()
            .map(|nodes| nodes.iter().map(|n| param.value(n)).collect())
            .collect()
    }

    /// Annualized values of a monthly parameter pooled per full year,
    /// skipping nodes where it is undefined
    pub fn annualized_by_year(&self, param: NodeParameter) -> Vec<Vec<f64>> {
        let distribution = self.distribution(param);
        let years = self.num_intervals() / 12;
        (0..years)
            .map(|year| {
                distribution[year * 12..year * 12 + 12]
                    .iter()
                    .flatten()
                    .flatten()
                    .map(|v| 12.0 * v)
                    .collect()
            })
            .collect()
    }

    /// What pledging or delegating `stake` would have returned per year
    ///
    /// Pledging samples nodes whose pledge is within 20% of the stake;
    /// delegating samples nodes holding at least that much delegated stake.
    pub fn sample_annualized_rewards(&self, stake: Token) -> StakingRewardSamples {
        let low = (1.0 - PLEDGE_MATCH_BAND) * stake;
        let high = (1.0 + PLEDGE_MATCH_BAND) * stake;
        let mut samples = StakingRewardSamples::default();

        for nodes in &self.nodes {
            let mut pledge = Vec::new();
            let mut delegate = Vec::new();
            for node in nodes {
                let saturation = node.profile.saturation_percent();
                if node.profile.pledge >= low && node.profile.pledge <= high {
                    pledge.push(RewardSample {
                        reward: stake * 12.0 * node.ros_operator(),
                        saturation,
                    });
                }
                if let Some(ros) = node.ros_delegator() {
                    if stake <= node.profile.delegated {
                        delegate.push(RewardSample {
                            reward: stake * 12.0 * ros,
                            saturation,
                        });
                    }
                }
            }
            samples.pledge.push(pledge);
            samples.delegate.push(delegate);
        }

        samples
    }

    /// Median monthly delegator return among nodes at or above a saturation
    /// level, per interval (0 when no node qualifies)
    pub fn median_ros_reputable(&self, threshold: f64) -> Vec<f64> {
        self.nodes
            .iter()
            .map(|nodes| {
                let mut ros: Vec<f64> = nodes
                    .iter()
                    .filter(|n| n.profile.saturation_percent() >= threshold)
                    .filter_map(|n| n.ros_delegator())
                    .collect();
                median(&mut ros).unwrap_or(0.0)
            })
            .collect()
    }

    /// Number of nodes of each size class in an interval
    pub fn class_count(&self, interval: Interval, class: SizeClass) -> usize {
        self.nodes[interval]
            .iter()
            .filter(|n| n.profile.size_class == class)
            .count()
    }

    // ========================================================================
    // Console Output
    // ========================================================================

    pub fn print_summary(&self) {
        let s = &self.series;
        let last = s.len().saturating_sub(1);

        println!("\n╔════════════════════════════════════════════════════════╗");
        println!("║    MIXNET ECONOMY SIMULATION RESULTS                   ║");
        println!("╚════════════════════════════════════════════════════════╝\n");

        println!("Intervals: {}", self.num_intervals());
        println!("Seed: {}", hex_seed(&self.seed));
        println!();

        println!("═══ Token Supply (final month) ═══");
        println!("  Mixmining pool: {:.0}", s.mixmining_pool[last]);
        println!("  Circulating: {:.0}", s.circulating_tokens[last]);
        println!("  Unvested: {:.0}", s.unvested_tokens[last]);
        println!("  Total: {:.0}", s.total_tokens(last));
        println!();

        println!("═══ Network Size ═══");
        println!(
            "  k: {} -> {}, candidates: {} -> {}",
            self.sizing.k[0], self.sizing.k[last], self.sizing.num_mixes[0], self.sizing.num_mixes[last]
        );
        println!(
            "  Mixnet width: {} -> {}",
            self.sizing.mixnet_width[0], self.sizing.mixnet_width[last]
        );
        println!(
            "  Stake saturation: {:.0} -> {:.0}",
            s.stake_saturation[0], s.stake_saturation[last]
        );
        println!();

        println!("═══ Rewards (all months) ═══");
        let emitted: f64 = s.mixmining_emitted.iter().sum();
        let bw_income: f64 = s.bw_income.iter().sum();
        let distributed: f64 = s.rewards_distributed_mix.iter().sum();
        let unclaimed: f64 = s.rewards_unclaimed.iter().sum();
        println!("  Emitted: {:.0}", emitted);
        println!("  Bandwidth income: {:.0}", bw_income);
        println!("  Distributed to mixes: {:.0}", distributed);
        println!("  Unclaimed (returned to pool): {:.0}", unclaimed);
        let undelegated: f64 = s.undelegated_stake.iter().sum();
        if undelegated > 0.0 {
            println!("  Undelegated stake (saturated network): {:.0}", undelegated);
        }
        println!();

        println!("═══ Monthly Returns (median, saturation >= 0.9) ═══");
        let median_ros = self.median_ros_reputable(0.9);
        for (t, ros) in median_ros.iter().enumerate() {
            if t % 6 == 0 || t == last {
                println!("  Month {:>3}: {:.3}% ({:.2}% annualized)", t, 100.0 * ros, 1200.0 * ros);
            }
        }
        println!();
    }

    /// Every node of a month, one block per node
    pub fn print_nodes(&self, interval: Interval) {
        println!("\n================\n MONTH: {}\n================\n", interval);
        for node in &self.nodes[interval] {
            let p = &node.profile;
            println!("mix node nr {} ; sat level {}", p.serial, p.size_class);
            println!("node cost: {:.0}", node.node_cost);
            println!("pledge: {:.0} ; lambda {:.5}", p.pledge, p.lambda);
            println!("delegated: {:.0} ; sigma {:.4}", p.delegated, p.sigma);
            println!(
                "activity_percent= {:.2}%  ; reserve_percent= {:.2}%",
                100.0 * p.activity_percent,
                100.0 * p.reserve_percent
            );
            println!(
                "received rewards: {:.0} ; operator profit: {:.0} ; delegate profit: {:.0}",
                node.received_rewards, node.operator_profit, node.delegate_profit
            );
            println!(
                "ROS operator: {:.2}%  ; annualized: {:.2}%",
                100.0 * node.operator_profit / p.pledge,
                100.0 * node.apy_operator()
            );
            if let (Some(ros), Some(apy)) = (node.ros_delegator(), node.apy_delegator()) {
                println!("ROS delegator: {:.2}%  ; annualized: {:.2}%", 100.0 * ros, 100.0 * apy);
            }
            println!("---");
        }
    }
}

pub fn hex_seed(seed: &[u8; 32]) -> String {
    seed.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Median of a slice (sorted in place); `None` when empty
fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::econ_node::NodeProfile;
    use crate::econ_state::EconSimulation;

    fn settled(serial: usize, pledge: Token, delegated: Token, operator: Token, delegate: Token) -> SettledNode {
        SettledNode {
            profile: NodeProfile {
                serial,
                size_class: SizeClass::RandomPledge,
                pledge,
                delegated,
                stake_saturation: 10_000.0,
                lambda: pledge / 100_000.0,
                sigma: (pledge + delegated) / 100_000.0,
                activity_percent: 0.5,
                reserve_percent: 0.5,
            },
            node_cost: 0.0,
            received_rewards: operator + delegate,
            operator_profit: operator,
            delegate_profit: delegate,
        }
    }

    fn small_result() -> SimulationResult {
        let config = EconConfig {
            num_intervals: 2,
            seed: Some([9u8; 32]),
            nr_min_mixes: 24,
            min_mixnet_width: 4,
            epochs_per_interval: 12,
            ..Default::default()
        };
        EconSimulation::new(config).unwrap().run().unwrap()
    }

    #[test]
    fn test_parameter_names_round_trip() {
        for param in NodeParameter::ALL {
            assert_eq!(NodeParameter::from_name(param.name()), Some(param));
        }
        assert_eq!(NodeParameter::from_name("sat_level"), None);
    }

    #[test]
    fn test_delegator_values_undefined_without_delegation() {
        let node = settled(0, 1000.0, 0.0, 50.0, 0.0);
        assert_eq!(NodeParameter::RosDelegator.value(&node), None);
        assert_eq!(NodeParameter::DelegateProfit.value(&node), None);
        assert_eq!(NodeParameter::RosOperator.value(&node), Some(0.05));
        assert_eq!(NodeParameter::TotalStake.value(&node), Some(1000.0));
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&mut []), None);
        assert_eq!(median(&mut [3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&mut [4.0, 1.0, 3.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_conservation_violation_reports_ledger() {
        let mut result = small_result();
        assert!(result.check_token_conservation().is_ok());

        result.series.circulating_tokens[1] += 10.0;
        match result.check_token_conservation() {
            Err(EconError::TokenConservation {
                interval, ledger, ..
            }) => {
                assert_eq!(interval, 1);
                assert!(ledger.contains("circulating"));
                assert_eq!(ledger.lines().count(), 3);
            }
            other => panic!("expected conservation error, got {:?}", other),
        }
    }

    #[test]
    fn test_staking_samples_and_median() {
        let mut result = small_result();
        result.nodes[0] = vec![
            settled(0, 1000.0, 9000.0, 10.0, 90.0),
            settled(1, 1100.0, 500.0, 20.0, 5.0),
            settled(2, 5000.0, 0.0, 100.0, 0.0),
        ];

        let samples = result.sample_annualized_rewards(1000.0);
        // pledges 1000 and 1100 are within 20%, 5000 is not
        assert_eq!(samples.pledge[0].len(), 2);
        assert!((samples.pledge[0][0].reward - 1000.0 * 12.0 * 0.01).abs() < 1e-9);
        // only the node with 9000 delegated covers a 1000 delegation
        assert_eq!(samples.delegate[0].len(), 1);
        assert!((samples.delegate[0][0].reward - 1000.0 * 12.0 * 0.01).abs() < 1e-9);
        assert_eq!(samples.delegate[0][0].saturation, 1.0);

        let median_ros = result.median_ros_reputable(0.9);
        assert_eq!(median_ros.len(), 2);
        assert!((median_ros[0] - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_distribution_shape() {
        let result = small_result();
        let dist = result.distribution(NodeParameter::Sigma);
        assert_eq!(dist.len(), 2);
        assert_eq!(dist[0].len(), result.sizing.num_mixes[0]);
        assert!(dist[0].iter().all(|v| v.is_some()));

        let sat = result.class_count(0, SizeClass::Saturated);
        let min = result.class_count(0, SizeClass::Minimum);
        let rnd = result.class_count(0, SizeClass::RandomPledge);
        assert_eq!(sat + min + rnd, result.sizing.num_mixes[0]);
        assert!(result.annualized_by_year(NodeParameter::RosOperator).is_empty());
    }

    #[test]
    fn test_hex_seed() {
        let mut seed = [0u8; 32];
        seed[0] = 0xab;
        assert!(hex_seed(&seed).starts_with("ab00"));
        assert_eq!(hex_seed(&seed).len(), 64);
    }
}
