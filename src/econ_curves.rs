// Growth Curve Library
//
// Preset time series for demand, token price, price per packet, cpu capacity,
// cpus per mix and node costs. Each curve is a pure function of the
// configuration and the number of intervals.

use crate::econ_config::EconConfig;
use crate::econ_error::{EconError, Result};
use crate::econ_interface::SECONDS_PER_MONTH;

/// Number of successive caps generated for the capped-growth curves
const MAX_GROWTH_CAPS: usize = 21;

/// Library of preset growth curves bound to a configuration
pub struct GrowthCurves<'a> {
    config: &'a EconConfig,
    num_intervals: usize,
}

impl<'a> GrowthCurves<'a> {
    pub fn new(config: &'a EconConfig) -> Self {
        Self {
            config,
            num_intervals: config.num_intervals,
        }
    }

    /// Series for a named curve type
    ///
    /// Unknown names yield an empty series rather than an error; callers that
    /// need a recognized type use [`GrowthCurves::require`].
    pub fn get_function(&self, name: &str) -> Vec<f64> {
        let n = self.num_intervals;
        let bw = self.config.initial_bandwidth * SECONDS_PER_MONTH;
        let token_price = self.config.token_launch_price;
        let cpu_cost = self.config.monthly_cost_cpu_initial_dollar;
        let bw_cost = self.config.cost_packet_bw_initial_dollar;

        match name {
            // Bandwidth demand (packets per month)
            "BW_ZERO" => vec![0.0; n],
            "BW_LINEAR_GROWTH_10kps" => self.linear(bw, 10_000.0 * SECONDS_PER_MONTH),
            "BW_EXP_GROWTH_6%_STEADY" => self.exponential(bw, &vec![1.06; n]),
            "BW_EXP_GROWTH_10%_STEADY" => self.exponential(bw, &vec![1.1; n]),
            "BW_EXP_GROWTH_10%_HALVES_6M" => self.exp_periodic_reduction(bw, 0.1, 6, 0.5),
            "BW_EXP_GROWTH_10%_HALVES_12M" => self.exp_periodic_reduction(bw, 0.1, 12, 0.5),
            "BW_EXP_GROWTH_10%_DROP1/4_6M" => self.exp_periodic_reduction(bw, 0.1, 6, 0.75),
            "BW_EXP_CAPPED_10%_HALVES_10x" => self.exp_cap_reduction(bw, 10.0, 0.1, 0.5),
            "BW_EXP_CAPPED_10%_HALVES_4x" => self.exp_cap_reduction(bw, 4.0, 0.1, 0.5),
            "BW_EXP_CAPPED_10%_DROP1/3_4x" => self.exp_cap_reduction(bw, 4.0, 0.1, 0.667),

            // Dollars per token
            "TOK_CONSTANT" => vec![token_price; n],
            "TOK_CONSTANT_100CENT" => vec![1.0; n],
            "TOK_LINEAR_GROWTH_2CENT" => self.linear(token_price, 0.02),
            "TOK_EXP_GROWTH_3%_STEADY" => self.exponential(token_price, &vec![1.03; n]),
            "TOK_EXP_GROWTH_10%_HALVES_12M" => self.exp_periodic_reduction(token_price, 0.1, 12, 0.5),
            "TOK_EXP_CAPPED_10%_HALVES_3x" => self.exp_cap_reduction(token_price, 3.0, 0.1, 0.5),

            // Dollars per packet paid by users
            "PP_CONSTANT" => vec![self.config.price_packet_initial_dollar; n],
            "PP_EXP_DECAY_1%" => self.exponential(self.config.price_packet_initial_dollar, &vec![0.99; n]),

            // Packets per second per cpu
            "CPU_CONSTANT_PPS" => vec![self.config.cpu_capacity_initial; n],
            "CPU_LINEAR_100PPS" => self.linear(self.config.cpu_capacity_initial, 100.0),
            "CPU_EXP_3%_STEADY" => self.exponential(self.config.cpu_capacity_initial, &vec![1.03; n]),
            "CPU_EXP_1%_STEADY" => self.exponential(self.config.cpu_capacity_initial, &vec![1.01; n]),

            // Cpus per mix
            "N_CPU_CONSTANT" => vec![self.config.cpus_per_mix_initial; n],
            "N_CPU_LINEAR_1CPU" => self.linear(self.config.cpus_per_mix_initial, 1.0),
            "N_CPU_EXP_DOUBLE_36M" => {
                let factors: Vec<f64> = (0..n).map(|i| if i % 36 == 0 { 2.0 } else { 1.0 }).collect();
                self.exponential(self.config.cpus_per_mix_initial, &factors)
            }

            // Monthly cost of one cpu (dollars)
            "COST_CPU_CONSTANT" => vec![cpu_cost; n],
            "COST_CPU_DECLINE_2%" => self.exponential(cpu_cost, &vec![0.98; n]),
            "COST_CPU_DOWN20%_12M" => self.exponential(cpu_cost, &Self::periodic_factor(n, 12, 0.8)),

            // Bandwidth cost per packet for operators (dollars)
            "COST_BW_CONSTANT" => vec![bw_cost; n],
            "COST_BW_DECLINE_1%" => self.exponential(bw_cost, &vec![0.99; n]),
            "COST_BW_DOWN10%_12M" => self.exponential(bw_cost, &Self::periodic_factor(n, 12, 0.9)),

            _ => Vec::new(),
        }
    }

    /// Series for a named curve type, failing on names the library does not know
    pub fn require(&self, name: &str) -> Result<Vec<f64>> {
        let series = self.get_function(name);
        if series.len() != self.num_intervals {
            return Err(EconError::UnknownCurve {
                name: name.to_string(),
            });
        }
        Ok(series)
    }

    /// y = a + b*i, floored at zero
    fn linear(&self, a: f64, b: f64) -> Vec<f64> {
        let mut y = Vec::with_capacity(self.num_intervals);
        y.push(a);
        for i in 1..self.num_intervals {
            y.push((a + b * i as f64).max(0.0));
        }
        y
    }

    /// y[i] = v[i] * y[i-1], floored at zero
    fn exponential(&self, a: f64, v: &[f64]) -> Vec<f64> {
        let mut y = Vec::with_capacity(self.num_intervals);
        y.push(a);
        for i in 1..self.num_intervals {
            let prev = y[i - 1];
            y.push((prev * v[i]).max(0.0));
        }
        y
    }

    /// Exponential growth whose rate is multiplied by `reduction_factor` every
    /// `reduction_period` intervals
    fn exp_periodic_reduction(
        &self,
        a: f64,
        initial_growth: f64,
        reduction_period: usize,
        reduction_factor: f64,
    ) -> Vec<f64> {
        let mut growth = initial_growth;
        let mut v = Vec::with_capacity(self.num_intervals);
        v.push(1.0 + growth);
        for i in 1..self.num_intervals {
            if i % reduction_period == 0 {
                growth *= reduction_factor;
            }
            v.push(1.0 + growth);
        }
        self.exponential(a, &v)
    }

    /// Exponential growth that slows down by `reduction_factor` each time the
    /// value crosses the next multiple of `order_mag_cap`
    fn exp_cap_reduction(
        &self,
        a: f64,
        order_mag_cap: f64,
        initial_growth: f64,
        reduction_factor: f64,
    ) -> Vec<f64> {
        let mut caps = Vec::with_capacity(MAX_GROWTH_CAPS);
        caps.push(a * order_mag_cap);
        for _ in 1..MAX_GROWTH_CAPS {
            let last = caps[caps.len() - 1];
            caps.push(last * order_mag_cap);
        }

        let mut y = Vec::with_capacity(self.num_intervals);
        y.push(a);
        let mut growth = initial_growth;
        let mut cap_ind = 0;
        for i in 1..self.num_intervals {
            let next_val = y[i - 1] * (1.0 + growth);
            y.push(next_val);
            if cap_ind < caps.len() && next_val > caps[cap_ind] {
                growth *= reduction_factor;
                cap_ind += 1;
            }
        }
        y
    }

    /// Factor vector that is 1 except every `period` intervals (from 1 on)
    fn periodic_factor(n: usize, period: usize, factor: f64) -> Vec<f64> {
        (0..n)
            .map(|i| if i > 0 && i % period == 0 { factor } else { 1.0 })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(num_intervals: usize) -> EconConfig {
        EconConfig {
            num_intervals,
            ..Default::default()
        }
    }

    #[test]
    fn test_unknown_curve_is_empty() {
        let config = config(12);
        let curves = GrowthCurves::new(&config);
        assert!(curves.get_function("BW_DOES_NOT_EXIST").is_empty());
        assert!(matches!(
            curves.require("BW_DOES_NOT_EXIST"),
            Err(EconError::UnknownCurve { .. })
        ));
    }

    #[test]
    fn test_bw_zero() {
        let config = config(5);
        let curves = GrowthCurves::new(&config);
        assert_eq!(curves.get_function("BW_ZERO"), vec![0.0; 5]);
    }

    #[test]
    fn test_linear_growth() {
        let config = config(4);
        let curves = GrowthCurves::new(&config);
        let y = curves.get_function("CPU_LINEAR_100PPS");
        assert_eq!(y, vec![3125.0, 3225.0, 3325.0, 3425.0]);
    }

    #[test]
    fn test_exponential_growth() {
        let config = config(3);
        let curves = GrowthCurves::new(&config);
        let y = curves.get_function("CPU_EXP_1%_STEADY");
        assert!((y[1] - 3125.0 * 1.01).abs() < 1e-9);
        assert!((y[2] - 3125.0 * 1.01 * 1.01).abs() < 1e-9);
    }

    #[test]
    fn test_periodic_reduction_halves_growth() {
        let config = config(8);
        let curves = GrowthCurves::new(&config);
        let y = curves.get_function("BW_EXP_GROWTH_10%_HALVES_6M");
        let a = 200_000.0 * SECONDS_PER_MONTH;
        // first five steps grow 10%, the sixth 5%
        assert!((y[5] / y[4] - 1.1).abs() < 1e-9);
        assert!((y[6] / y[5] - 1.05).abs() < 1e-9);
        assert!((y[0] - a).abs() < 1e-3);
    }

    #[test]
    fn test_capped_growth_slows_after_cap() {
        let config = config(40);
        let curves = GrowthCurves::new(&config);
        let y = curves.get_function("TOK_EXP_CAPPED_10%_HALVES_3x");
        let crossing = y.iter().position(|v| *v > 3.0 * 0.5).unwrap();
        let before = y[crossing] / y[crossing - 1];
        let after = y[crossing + 1] / y[crossing];
        assert!((before - 1.1).abs() < 1e-9);
        assert!((after - 1.05).abs() < 1e-9);
    }

    #[test]
    fn test_cpu_doubling_every_36_months() {
        let config = config(40);
        let curves = GrowthCurves::new(&config);
        let y = curves.get_function("N_CPU_EXP_DOUBLE_36M");
        assert_eq!(y[35], 8.0);
        assert_eq!(y[36], 16.0);
    }

    #[test]
    fn test_all_presets_have_full_length() {
        let config = config(13);
        let curves = GrowthCurves::new(&config);
        for name in [
            "BW_LINEAR_GROWTH_10kps",
            "BW_EXP_CAPPED_10%_DROP1/3_4x",
            "TOK_LINEAR_GROWTH_2CENT",
            "PP_EXP_DECAY_1%",
            "COST_CPU_DOWN20%_12M",
            "COST_BW_DOWN10%_12M",
        ] {
            assert_eq!(curves.get_function(name).len(), 13, "{}", name);
        }
    }
}
