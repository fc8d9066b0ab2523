// Network Sizing
//
// Translates bandwidth demand into the number of mixes needed per interval:
// mixnet width, the rewarded set size k and the number of registered candidates.

use crate::econ_config::EconConfig;
use crate::econ_error::{EconError, Result};
use crate::econ_interface::{Interval, SECONDS_PER_MONTH};

pub const MIXNET_LINEAR_GROWTH_WITH_TRAFFIC: &str = "MIXNET_LINEAR_GROWTH_WITH_TRAFFIC";

/// Per-interval network size, fixed before the interval loop starts
#[derive(Debug, Clone)]
pub struct NetworkSizing {
    /// Active mixes needed per layer to carry the average load
    pub mixnet_width: Vec<usize>,

    /// Target number of rewarded mixes
    pub k: Vec<usize>,

    /// Registered candidate mixes (k scaled by the excess factor)
    pub num_mixes: Vec<usize>,

    layers: usize,
}

impl NetworkSizing {
    /// Size the network for every interval
    ///
    /// # Arguments
    /// * `bw_demand` - packets per month
    /// * `cpus_per_mix` - cpus per mix
    /// * `cpu_capacity` - packets per second per cpu
    pub fn new(
        config: &EconConfig,
        bw_demand: &[f64],
        cpus_per_mix: &[f64],
        cpu_capacity: &[f64],
    ) -> Result<Self> {
        if config.type_mixnet_growth != MIXNET_LINEAR_GROWTH_WITH_TRAFFIC {
            return Err(EconError::invalid(format!(
                "unsupported type_mixnet_growth: {}",
                config.type_mixnet_growth
            )));
        }

        let n = config.num_intervals;
        let mut mixnet_width = Vec::with_capacity(n);
        let mut k = Vec::with_capacity(n);
        let mut num_mixes = Vec::with_capacity(n);

        for i in 0..n {
            let mix_capacity = cpu_capacity[i] * cpus_per_mix[i];
            let mix_avg_load = mix_capacity / config.peak_factor;
            let demand_per_second = bw_demand[i] / SECONDS_PER_MONTH;

            let traffic_width = if mix_avg_load > 0.0 {
                (demand_per_second / mix_avg_load).ceil() as usize
            } else {
                0
            };
            let width = traffic_width.max(config.min_mixnet_width);

            let mixnet_total = ((width * config.mixnet_layers) as f64 / config.mix_active_rate).ceil() as usize;
            let k_i = mixnet_total.max(config.nr_min_mixes);

            mixnet_width.push(width);
            k.push(k_i);
            num_mixes.push((k_i as f64 * config.excess_candidate_factor).round() as usize);
        }

        Ok(Self {
            mixnet_width,
            k,
            num_mixes,
            layers: config.mixnet_layers,
        })
    }

    /// Mixes routing traffic in an epoch of the interval
    pub fn active_slots(&self, interval: Interval) -> usize {
        self.layers * self.mixnet_width[interval]
    }

    /// Mixes kept in reserve in an epoch of the interval
    pub fn reserve_slots(&self, interval: Interval) -> usize {
        self.k[interval].saturating_sub(self.active_slots(interval))
    }
}
