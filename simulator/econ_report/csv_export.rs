// CSV Export

use econ_rust::econ_results::{NodeParameter, SimulationResult};
use econ_rust::{Interval, Stakeholder};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

// ============================================================================
// Time Series
// ============================================================================

/// Row-per-interval writer for the economy time series
pub struct SeriesCsv {
    writer: BufWriter<File>,
}

impl SeriesCsv {
    pub fn new<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        writeln!(
            writer,
            "month,bw_demand,dollar_per_token,mixnet_width,k,num_mixes,\
             mixmining_pool,circulating,unvested,stake_saturation,pledged_stake,delegated_stake,\
             undelegated_stake,emitted,bw_income,income_global_mix,income_global,\
             distributed_mix,distributed,unclaimed,median_ros_reputable"
        )?;

        Ok(Self { writer })
    }

    pub fn write_interval(&mut self, result: &SimulationResult, t: Interval, median_ros: f64) -> std::io::Result<()> {
        let s = &result.series;
        writeln!(
            self.writer,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            t,
            result.inputs.bw_demand[t],
            result.inputs.dollar_per_token[t],
            result.sizing.mixnet_width[t],
            result.sizing.k[t],
            result.sizing.num_mixes[t],
            s.mixmining_pool[t],
            s.circulating_tokens[t],
            s.unvested_tokens[t],
            s.stake_saturation[t],
            s.pledged_stake[t],
            s.delegated_stake[t],
            s.undelegated_stake[t],
            s.mixmining_emitted[t],
            s.bw_income[t],
            s.income_global_mix[t],
            s.income_global[t],
            s.rewards_distributed_mix[t],
            s.rewards_distributed[t],
            s.rewards_unclaimed[t],
            median_ros
        )
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

pub fn export_series_csv<P: AsRef<Path>>(result: &SimulationResult, path: P) -> std::io::Result<()> {
    let median_ros = result.median_ros_reputable(0.9);
    let mut csv = SeriesCsv::new(path)?;
    for t in 0..result.num_intervals() {
        csv.write_interval(result, t, median_ros[t])?;
    }
    csv.flush()
}

// ============================================================================
// Node List
// ============================================================================

/// Every node of one month, one column per node parameter plus its size class
pub fn export_nodes_csv<P: AsRef<Path>>(result: &SimulationResult, month: Interval, path: P) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);

    let header: Vec<&str> = NodeParameter::ALL.iter().map(|p| p.name()).collect();
    writeln!(writer, "sat_level,{}", header.join(","))?;

    for node in &result.nodes[month] {
        let values: Vec<String> = NodeParameter::ALL
            .iter()
            .map(|p| p.value(node).map(|v| v.to_string()).unwrap_or_default())
            .collect();
        writeln!(writer, "{},{}", node.profile.size_class, values.join(","))?;
    }

    writer.flush()
}

// ============================================================================
// Stakeholders
// ============================================================================

/// Monthly holdings and rewards of each stakeholder, one row per holder and month
pub fn export_stakeholders_csv<P: AsRef<Path>>(holders: &[Stakeholder], path: P) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(
        writer,
        "stakeholder,month,liquid,unvested,effective,effective_compounded,wealth_compounded,rewards,rewards_cumulative"
    )?;

    for holder in holders {
        for t in 0..holder.rewards.len() {
            writeln!(
                writer,
                "{},{},{},{},{},{},{},{},{}",
                holder.kind.name(),
                t,
                holder.liquid_stake[t],
                holder.unvested_stake[t],
                holder.effective_stake[t],
                holder.effective_compounded_stake[t],
                holder.wealth_compounded_stake[t],
                holder.rewards[t],
                holder.rewards_cumulative[t]
            )?;
        }
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use econ_rust::{EconConfig, EconSimulation, StakeholderKind};

    fn small_result() -> SimulationResult {
        let config = EconConfig {
            num_intervals: 3,
            seed: Some([5u8; 32]),
            nr_min_mixes: 24,
            min_mixnet_width: 4,
            epochs_per_interval: 12,
            ..Default::default()
        };
        EconSimulation::new(config).unwrap().run().unwrap()
    }

    #[test]
    fn test_series_and_nodes_export() {
        let result = small_result();
        let dir = std::env::temp_dir().join("econ_report_test");
        std::fs::create_dir_all(&dir).unwrap();

        let series_path = dir.join("series.csv");
        export_series_csv(&result, &series_path).unwrap();
        let content = std::fs::read_to_string(&series_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("month,bw_demand"));
        let columns = lines[0].split(',').count();
        assert!(lines[1..].iter().all(|l| l.split(',').count() == columns));

        let nodes_path = dir.join("nodes.csv");
        export_nodes_csv(&result, 0, &nodes_path).unwrap();
        let content = std::fs::read_to_string(&nodes_path).unwrap();
        assert_eq!(content.lines().count(), 1 + result.nodes[0].len());
        assert!(content.lines().nth(1).unwrap().starts_with("SAT,0,"));
    }

    #[test]
    fn test_stakeholder_export() {
        let config = EconConfig {
            num_intervals: 4,
            ..Default::default()
        };
        let mut holder = Stakeholder::new(StakeholderKind::Option2, &config);
        holder.compute_rewards(&[0.01; 4]);

        let path = std::env::temp_dir().join("econ_report_stakeholders.csv");
        export_stakeholders_csv(&[holder], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 5);
        assert!(content.lines().nth(1).unwrap().starts_with("OPTION_2,0,4000,"));
    }
}
