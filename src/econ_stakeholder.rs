// Stakeholder Compounding
//
// Illustrative holders (liquid buyers, locked validators and whales) staking
// their holdings at the median return of reputable nodes, with rewards
// compounding month by month.

use crate::econ_config::EconConfig;
use crate::econ_error::{EconError, Result};
use crate::econ_interface::Token;

/// Number of quarterly tranches a locked purchase vests in
const LOCKED_TRANCHES: usize = 8;
const MONTHS_PER_TRANCHE: usize = 3;

/// Preset holder profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StakeholderKind {
    Testnet,
    Option1,
    Option2,
    Validator100k,
    Validator200k,
    Validator400k,
    Whale1M,
    Whale10M,
    Whale80M,
}

impl StakeholderKind {
    pub const ALL: [StakeholderKind; 9] = [
        StakeholderKind::Testnet,
        StakeholderKind::Option1,
        StakeholderKind::Option2,
        StakeholderKind::Validator100k,
        StakeholderKind::Validator200k,
        StakeholderKind::Validator400k,
        StakeholderKind::Whale1M,
        StakeholderKind::Whale10M,
        StakeholderKind::Whale80M,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Testnet => "TESTNET",
            Self::Option1 => "OPTION_1",
            Self::Option2 => "OPTION_2",
            Self::Validator100k => "VALIDATOR_100k",
            Self::Validator200k => "VALIDATOR_200k",
            Self::Validator400k => "VALIDATOR_400k",
            Self::Whale1M => "WHALE_1M",
            Self::Whale10M => "WHALE_10M",
            Self::Whale80M => "WHALE_80M",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name() == name)
            .ok_or_else(|| EconError::invalid(format!("unknown stakeholder type: {}", name)))
    }

    /// Tokens bought, and whether they vest over time
    fn purchase(&self) -> (Token, bool) {
        match self {
            Self::Testnet => (1250.0, false),
            Self::Option1 => (1000.0, false),
            Self::Option2 => (4000.0, false),
            Self::Validator100k => (100e3, true),
            Self::Validator200k => (200e3, true),
            Self::Validator400k => (400e3, true),
            Self::Whale1M => (1e6, true),
            Self::Whale10M => (10e6, true),
            Self::Whale80M => (80e6, true),
        }
    }
}

/// Holdings and compounded rewards of one holder over the run
#[derive(Debug, Clone)]
pub struct Stakeholder {
    pub kind: StakeholderKind,
    pub liquid_stake: Vec<Token>,
    pub unvested_stake: Vec<Token>,
    pub total_stake: Vec<Token>,

    /// Liquid holdings plus the stakeable part of unvested holdings
    pub effective_stake: Vec<Token>,

    pub effective_compounded_stake: Vec<Token>,
    pub wealth_compounded_stake: Vec<Token>,
    pub rewards: Vec<Token>,
    pub rewards_cumulative: Vec<Token>,
}

impl Stakeholder {
    pub fn new(kind: StakeholderKind, config: &EconConfig) -> Self {
        let n = config.num_intervals;
        let (purchase, locked) = kind.purchase();

        let mut liquid_stake = Vec::with_capacity(n);
        let mut unvested_stake = Vec::with_capacity(n);
        for month in 0..n {
            if locked {
                // nothing is liquid before the first tranche at month 3
                let vested = LOCKED_TRANCHES.min(month / MONTHS_PER_TRANCHE);
                let tranches = LOCKED_TRANCHES as f64;
                liquid_stake.push(purchase * vested as f64 / tranches);
                unvested_stake.push(purchase * (LOCKED_TRANCHES - vested) as f64 / tranches);
            } else {
                liquid_stake.push(purchase);
                unvested_stake.push(0.0);
            }
        }

        let total_stake: Vec<Token> = liquid_stake.iter().zip(&unvested_stake).map(|(l, u)| l + u).collect();
        let effective_stake: Vec<Token> = liquid_stake
            .iter()
            .zip(&unvested_stake)
            .map(|(&l, &u)| effective(config, l, u))
            .collect();

        Self {
            kind,
            effective_compounded_stake: effective_stake.clone(),
            wealth_compounded_stake: total_stake.clone(),
            rewards: vec![0.0; n],
            rewards_cumulative: vec![0.0; n],
            liquid_stake,
            unvested_stake,
            total_stake,
            effective_stake,
        }
    }

    /// Compound monthly rewards at the given return series
    pub fn compute_rewards(&mut self, monthly_ros: &[f64]) {
        let n = self.rewards.len().min(monthly_ros.len());
        if n == 0 {
            return;
        }

        self.rewards[0] = monthly_ros[0] * self.effective_compounded_stake[0];
        self.rewards_cumulative[0] = self.rewards[0];

        for month in 1..n {
            let earned = self.rewards_cumulative[month - 1];
            self.wealth_compounded_stake[month] += earned;
            self.effective_compounded_stake[month] += earned;
            self.rewards[month] = monthly_ros[month] * self.effective_compounded_stake[month];
            self.rewards_cumulative[month] = earned + self.rewards[month];
        }
    }

    pub fn print_summary(&self) {
        let last = self.rewards.len().saturating_sub(1);
        println!("═══ Stakeholder {} ═══", self.kind.name());
        println!("  Total stake: {:.0} -> {:.0}", self.total_stake[0], self.total_stake[last]);
        println!(
            "  Effective stake: {:.0} -> {:.0}",
            self.effective_stake[0], self.effective_stake[last]
        );
        println!("  Wealth compounded: {:.0}", self.wealth_compounded_stake[last]);
        println!("  Cumulative rewards: {:.0}", self.rewards_cumulative[last]);
        println!();
    }
}

/// Unvested holdings count fully up to the cap, and only partially above it
fn effective(config: &EconConfig, liquid: Token, unvested: Token) -> Token {
    let cap = config.cap_staking_unvested;
    if unvested < cap {
        liquid + unvested
    } else {
        liquid + cap + config.frac_staking_unvested * (unvested - cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EconConfig {
        EconConfig {
            num_intervals: 30,
            ..Default::default()
        }
    }

    #[test]
    fn test_names_resolve() {
        for kind in StakeholderKind::ALL {
            assert_eq!(StakeholderKind::from_name(kind.name()).unwrap(), kind);
        }
        assert!(matches!(
            StakeholderKind::from_name("WHALE_1B"),
            Err(EconError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_liquid_holder() {
        let holder = Stakeholder::new(StakeholderKind::Testnet, &config());
        assert!(holder.liquid_stake.iter().all(|&l| l == 1250.0));
        assert!(holder.effective_stake.iter().all(|&e| e == 1250.0));
    }

    #[test]
    fn test_locked_holder_vests_quarterly() {
        let holder = Stakeholder::new(StakeholderKind::Whale1M, &config());
        assert_eq!(holder.liquid_stake[2], 0.0);
        assert_eq!(holder.liquid_stake[3], 125_000.0);
        assert_eq!(holder.unvested_stake[3], 875_000.0);
        assert_eq!(holder.liquid_stake[24], 1e6);
        assert_eq!(holder.liquid_stake[29], 1e6);
        assert!(holder.total_stake.iter().all(|&t| t == 1e6));

        // 100k cap counts fully, 1% of the remaining 900k
        assert!((holder.effective_stake[0] - (100_000.0 + 9_000.0)).abs() < 1e-9);
    }

    #[test]
    fn test_unvested_below_cap_counts_fully() {
        let holder = Stakeholder::new(StakeholderKind::Validator100k, &config());
        // 87.5k unvested is below the cap
        assert_eq!(holder.effective_stake[3], 100_000.0);
    }

    #[test]
    fn test_compounding() {
        let mut holder = Stakeholder::new(StakeholderKind::Option1, &config());
        holder.compute_rewards(&vec![0.01; 30]);

        assert!((holder.rewards[0] - 10.0).abs() < 1e-9);
        assert!((holder.effective_compounded_stake[1] - 1010.0).abs() < 1e-9);
        assert!((holder.rewards[1] - 10.1).abs() < 1e-9);
        assert!((holder.rewards_cumulative[1] - 20.1).abs() < 1e-9);
        // wealth after t months is 1000 * 1.01^t
        assert!((holder.wealth_compounded_stake[2] - 1000.0 * 1.01f64.powi(2)).abs() < 1e-9);
    }
}
