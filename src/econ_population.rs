// Node Population Generator
//
// Builds the candidate mixes of one interval: size classes, pledges drawn
// from a capped heavy-tailed distribution, randomized delegation up to
// saturation, stake shares, and the sampled activity of every node.

use crate::econ_config::EconConfig;
use crate::econ_error::{EconError, Result};
use crate::econ_interface::{Interval, SizeClass, Token};
use crate::econ_node::{CandidateNode, NodeProfile};
use crate::econ_sampler::EpochSampler;
use log::{debug, warn};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Pareto};

/// Shape of the pledge excess distribution (80/20 rule)
const PLEDGE_PARETO_SHAPE: f64 = 1.16;

/// Capped values are pulled back to this share of the maximum excess
const PLEDGE_CAP_SHRINK: f64 = 0.98;

const MAX_CAP_ITERATIONS: usize = 1000;
const MAX_DELEGATION_PASSES: usize = 10_000;

/// Headroom below this share of the saturation point counts as saturated
const SATURATION_EPSILON: f64 = 1e-9;

/// Interval-level inputs to population generation
#[derive(Debug, Clone)]
pub struct PopulationInputs {
    pub interval: Interval,
    pub k: usize,
    pub num_mixes: usize,
    pub active_slots: usize,
    pub reserve_slots: usize,
    pub stake_saturation: Token,
    pub pledged_budget: Token,
    pub delegated_budget: Token,
    /// Flat monthly cost of a mix in tokens
    pub flat_cost: Token,
}

/// Generated candidates plus the delegation budget no node could absorb
#[derive(Debug, Clone)]
pub struct Population {
    pub nodes: Vec<CandidateNode>,
    pub undelegated: Token,
}

/// Node counts per size class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassCounts {
    pub saturated: usize,
    pub minimum: usize,
    pub random: usize,
}

impl ClassCounts {
    /// Saturated nodes are a fraction of k, minimum-pledge nodes a fraction of
    /// all candidates; the rest get a random pledge
    pub fn partition(config: &EconConfig, interval: Interval, k: usize, num_mixes: usize) -> Result<Self> {
        let saturated = (config.frac_whale_mix * k as f64).round() as usize;
        let minimum = (config.frac_min_pledge_mix * num_mixes as f64).round() as usize;
        let random = num_mixes
            .checked_sub(saturated + minimum)
            .ok_or(EconError::NodeClassOverflow {
                interval,
                saturated,
                minimum,
                candidates: num_mixes,
            })?;
        Ok(Self {
            saturated,
            minimum,
            random,
        })
    }
}

// ============================================================================
// Generator
// ============================================================================

pub struct NodePopulation<'a> {
    config: &'a EconConfig,
    rng: StdRng,
}

impl<'a> NodePopulation<'a> {
    pub fn new(config: &'a EconConfig, rng: StdRng) -> Self {
        Self { config, rng }
    }

    /// Generate every candidate of the interval, ordered by serial
    pub fn generate(&mut self, inputs: &PopulationInputs) -> Result<Population> {
        let counts = ClassCounts::partition(self.config, inputs.interval, inputs.k, inputs.num_mixes)?;
        let sat = inputs.stake_saturation;
        let min_pledge = self.config.minimum_pledge_mix;

        let required = counts.saturated as f64 * sat + (counts.minimum + counts.random) as f64 * min_pledge;
        let remaining_pledge = inputs.pledged_budget - required;
        if remaining_pledge < 0.0 {
            return Err(EconError::PledgeBudgetInsufficient {
                interval: inputs.interval,
                budget: inputs.pledged_budget,
                required,
            });
        }

        debug!(
            "interval {}: {} SAT, {} RND, {} MIN nodes, {:.0} pledge left for random excess",
            inputs.interval, counts.saturated, counts.random, counts.minimum, remaining_pledge
        );

        if counts.random == 0 && remaining_pledge > 0.0 {
            warn!(
                "interval {}: no random-pledge nodes, {:.0} pledged tokens left unallocated",
                inputs.interval, remaining_pledge
            );
        }

        let excess = self.pledge_excess(inputs.interval, counts.random, remaining_pledge, sat - min_pledge)?;

        // serials: saturated first, then random pledge, then minimum pledge
        let mut profiles = Vec::with_capacity(inputs.num_mixes);
        let classes = std::iter::repeat(SizeClass::Saturated)
            .take(counts.saturated)
            .chain(std::iter::repeat(SizeClass::RandomPledge).take(counts.random))
            .chain(std::iter::repeat(SizeClass::Minimum).take(counts.minimum));
        for (serial, size_class) in classes.enumerate() {
            let pledge = match size_class {
                SizeClass::Saturated => sat,
                SizeClass::RandomPledge => min_pledge + excess[serial - counts.saturated],
                SizeClass::Minimum => min_pledge,
            };
            profiles.push(NodeProfile {
                serial,
                size_class,
                pledge,
                delegated: 0.0,
                stake_saturation: sat,
                lambda: 0.0,
                sigma: 0.0,
                activity_percent: 0.0,
                reserve_percent: 0.0,
            });
        }

        let undelegated = self.allocate_delegation(inputs.interval, &mut profiles, sat, inputs.delegated_budget);
        set_stake_shares(&mut profiles, sat, inputs.k);

        let sampler = EpochSampler::new(
            profiles.iter().map(|p| p.sigma).collect(),
            inputs.active_slots,
            inputs.reserve_slots,
            self.config.sampler,
        )?;
        let shares = sampler.run(self.config.epochs_per_interval, &mut self.rng);
        for profile in &mut profiles {
            profile.activity_percent = shares.active[profile.serial];
            profile.reserve_percent = shares.reserve[profile.serial];
        }

        let nodes = profiles
            .into_iter()
            .map(|profile| CandidateNode {
                profile,
                flat_cost: inputs.flat_cost,
            })
            .collect();

        Ok(Population { nodes, undelegated })
    }

    /// Heavy-tailed excess pledges over the minimum
    ///
    /// The returned values sum to `remaining` and none exceeds `max_excess`.
    /// Values over the cap are pulled back to 98% of it and the vector is
    /// renormalized until no value is over.
    pub fn pledge_excess(
        &mut self,
        interval: Interval,
        count: usize,
        remaining: Token,
        max_excess: Token,
    ) -> Result<Vec<Token>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let pareto = Pareto::new(1.0, PLEDGE_PARETO_SHAPE)
            .map_err(|e| EconError::invalid(format!("pareto distribution: {:?}", e)))?;
        // shifted to start at zero (Lomax)
        let samples: Vec<f64> = (0..count).map(|_| pareto.sample(&mut self.rng) - 1.0).collect();
        let mut shares = normalize(&samples);

        let mut iterations = 0;
        while max_value(&shares) * remaining > max_excess {
            if iterations >= MAX_CAP_ITERATIONS {
                return Err(EconError::PledgeCapNotConverged { interval, iterations });
            }
            let capped = PLEDGE_CAP_SHRINK * max_excess / remaining;
            for share in shares.iter_mut() {
                if *share * remaining > max_excess {
                    *share = capped;
                }
            }
            shares = normalize(&shares);
            iterations += 1;
        }

        if iterations > 0 {
            debug!("interval {}: pledge excess capped in {} iterations", interval, iterations);
        }

        Ok(shares.iter().map(|s| s * remaining).collect())
    }

    /// Hand out the delegation budget in passes over the nodes in serial order
    ///
    /// Each unsaturated node draws a uniform share of its headroom until the
    /// budget runs out. Returns the budget left when every node is saturated.
    fn allocate_delegation(
        &mut self,
        interval: Interval,
        profiles: &mut [NodeProfile],
        stake_saturation: Token,
        budget: Token,
    ) -> Token {
        let epsilon = SATURATION_EPSILON * stake_saturation;
        let mut remaining = budget;
        let mut passes = 0;

        while remaining > 0.0 {
            let mut absorbed = false;
            for profile in profiles.iter_mut() {
                if remaining <= 0.0 {
                    break;
                }
                let headroom = stake_saturation - profile.pledge - profile.delegated;
                if headroom <= epsilon {
                    continue;
                }
                absorbed = true;

                let sample = self.rng.gen::<f64>() * headroom;
                if sample < remaining {
                    profile.delegated += sample;
                    remaining -= sample;
                } else {
                    profile.delegated += remaining;
                    remaining = 0.0;
                }
            }

            passes += 1;
            if !absorbed {
                warn!(
                    "interval {}: all nodes saturated, {:.0} delegated tokens left unallocated",
                    interval, remaining
                );
                break;
            }
            if passes >= MAX_DELEGATION_PASSES {
                warn!(
                    "interval {}: delegation stopped after {} passes, {:.0} tokens left unallocated",
                    interval, passes, remaining
                );
                break;
            }
        }

        remaining.max(0.0)
    }
}

/// Pledge share (lambda) and stake share (sigma) relative to k saturated nodes
fn set_stake_shares(profiles: &mut [NodeProfile], stake_saturation: Token, k: usize) {
    let total_stake = stake_saturation * k as f64;
    let cap = 1.0 / k as f64;
    for profile in profiles {
        profile.lambda = (profile.pledge / total_stake).min(cap);
        profile.sigma = (profile.total_stake() / total_stake).min(cap);
    }
}

fn normalize(values: &[f64]) -> Vec<f64> {
    let sum: f64 = values.iter().sum();
    values.iter().map(|v| v / sum).collect()
}

fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
