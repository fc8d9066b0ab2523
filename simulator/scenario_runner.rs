// Scenario Runner - Load and execute economy scenario YAML files
//
// Usage:
//   cargo run --bin scenario_runner simulator/scenarios/baseline.yaml
//   cargo run --bin scenario_runner simulator/scenarios/  (runs all .yaml files in directory)
//   cargo run --bin scenario_runner simulator/scenarios/baseline.yaml --seed 0x1234...
//   cargo run --bin scenario_runner simulator/scenarios/ --csv out/ --verbose

mod econ_report;

use econ_rust::econ_error::EconError;
use econ_rust::{EconConfig, EconSimulation, Stakeholder, StakeholderKind};
use log::LevelFilter;
use simple_logger::SimpleLogger;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Scenario file format
#[derive(Debug, serde::Deserialize)]
struct ScenarioFile {
    /// Scenario metadata
    #[serde(default)]
    meta: ScenarioMeta,

    /// Configuration overrides; missing fields keep their defaults
    #[serde(default)]
    config: EconConfig,

    /// Stakeholder presets to report on
    #[serde(default)]
    stakeholders: Vec<String>,

    /// Months whose node lists are printed
    #[serde(default)]
    print_months: Vec<usize>,
}

#[derive(Debug, Default, serde::Deserialize)]
struct ScenarioMeta {
    name: Option<String>,
    description: Option<String>,
    hypothesis: Option<String>,
}

/// Command line options shared by every scenario of a run
struct RunOptions {
    seed: Option<[u8; 32]>,
    csv_dir: Option<PathBuf>,
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!(
            "Usage: {} <scenario.yaml | directory/> [--seed SEED_HEX] [--csv DIR] [--verbose]",
            args[0]
        );
        eprintln!("\nExamples:");
        eprintln!("  {} simulator/scenarios/baseline.yaml", args[0]);
        eprintln!("  {} simulator/scenarios/", args[0]);
        eprintln!("  {} simulator/scenarios/baseline.yaml --seed 0x123456...", args[0]);
        std::process::exit(1);
    }

    let path = PathBuf::from(&args[1]);
    let mut options = RunOptions {
        seed: None,
        csv_dir: None,
    };
    let mut level = LevelFilter::Info;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seed" if i + 1 < args.len() => {
                options.seed = Some(parse_seed_hex(&args[i + 1]));
                i += 1;
            }
            "--csv" if i + 1 < args.len() => {
                options.csv_dir = Some(PathBuf::from(&args[i + 1]));
                i += 1;
            }
            "--verbose" => level = LevelFilter::Debug,
            other => {
                eprintln!("Unknown argument: {}", other);
                std::process::exit(1);
            }
        }
        i += 1;
    }

    SimpleLogger::new().with_level(level).init().unwrap();

    if let Some(ref dir) = options.csv_dir {
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Failed to create {}: {}", dir.display(), e);
            std::process::exit(1);
        }
    }

    let outcome = if path.is_dir() {
        run_scenario_directory(&path, &options)
    } else if path.is_file() {
        run_scenario_file(&path, &options)
    } else {
        eprintln!("Error: Path does not exist: {}", path.display());
        std::process::exit(1);
    };

    if let Err(e) = outcome {
        eprintln!("\nError: {}", e);
        std::process::exit(1);
    }
}

fn run_scenario_directory(dir: &Path, options: &RunOptions) -> Result<(), EconError> {
    let entries = fs::read_dir(dir).map_err(|e| EconError::ScenarioLoad(format!("{}: {}", dir.display(), e)))?;
    let mut scenarios: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().and_then(|s| s.to_str()) == Some("yaml"))
        .collect();

    scenarios.sort();

    if scenarios.is_empty() {
        return Err(EconError::ScenarioLoad(format!("no .yaml files found in {}", dir.display())));
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  SCENARIO RUNNER - Multiple Scenarios                 ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    println!("Found {} scenario(s) to run\n", scenarios.len());

    for (i, scenario_path) in scenarios.iter().enumerate() {
        println!("\n{}/{} Running: {}\n", i + 1, scenarios.len(), scenario_path.display());
        run_scenario_file(scenario_path, options)?;
    }

    println!("\n╔════════════════════════════════════════════════════════╗");
    println!("║  All scenarios complete!                               ║");
    println!("╚════════════════════════════════════════════════════════╝\n");
    Ok(())
}

fn run_scenario_file(path: &Path, options: &RunOptions) -> Result<(), EconError> {
    println!("Loading scenario from: {}", path.display());

    let yaml_content = fs::read_to_string(path)
        .map_err(|e| EconError::ScenarioLoad(format!("failed to read {}: {}", path.display(), e)))?;
    let scenario: ScenarioFile = serde_yaml::from_str(&yaml_content)
        .map_err(|e| EconError::ScenarioLoad(format!("failed to parse {}: {}", path.display(), e)))?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scenario")
        .to_string();

    // Print scenario header
    println!("\n╔════════════════════════════════════════════════════════╗");
    if let Some(ref name) = scenario.meta.name {
        println!("║  {}  {}", name, " ".repeat(54_usize.saturating_sub(name.len())));
    } else {
        println!("║  Scenario: {}  ", stem);
    }
    println!("╚════════════════════════════════════════════════════════╝\n");

    if let Some(ref desc) = scenario.meta.description {
        println!("{}\n", desc);
    }

    if let Some(ref hypothesis) = scenario.meta.hypothesis {
        println!("Hypothesis:");
        println!("  {}\n", hypothesis);
    }

    let mut config = scenario.config;
    config.seed = options.seed;

    let kinds = scenario
        .stakeholders
        .iter()
        .map(|name| StakeholderKind::from_name(name))
        .collect::<Result<Vec<_>, _>>()?;

    println!("Configuration:");
    println!("  Intervals: {}", config.num_intervals);
    println!("  Bandwidth growth: {}", config.type_bw_growth);
    println!("  Token price: {}", config.type_token_growth);
    println!(
        "  Pledged / delegated: {:.0}% / {:.0}%",
        config.frac_token_pledged * 100.0,
        config.frac_token_delegated * 100.0
    );
    println!("  Alpha: {}, work factor: {}", config.alpha, config.factor_work_active);
    println!("  Sampler: {:?}, {} epochs", config.sampler, config.epochs_per_interval);
    println!("\nStarting simulation...\n");

    let result = EconSimulation::new(config)?.run()?;

    result.print_summary();
    for &month in &scenario.print_months {
        if month < result.num_intervals() {
            result.print_nodes(month);
        }
    }

    let median_ros = result.median_ros_reputable(0.9);
    let mut holders = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let mut holder = Stakeholder::new(kind, &result.config);
        holder.compute_rewards(&median_ros);
        holder.print_summary();
        holders.push(holder);
    }

    if let Some(ref dir) = options.csv_dir {
        let io_err = |e: std::io::Error| EconError::ScenarioLoad(format!("csv export: {}", e));
        econ_report::export_series_csv(&result, dir.join(format!("{}_series.csv", stem))).map_err(io_err)?;
        for &month in &scenario.print_months {
            if month < result.num_intervals() {
                econ_report::export_nodes_csv(&result, month, dir.join(format!("{}_nodes_month{}.csv", stem, month)))
                    .map_err(io_err)?;
            }
        }
        if !holders.is_empty() {
            econ_report::export_stakeholders_csv(&holders, dir.join(format!("{}_stakeholders.csv", stem)))
                .map_err(io_err)?;
        }
        println!("CSV written to: {}", dir.display());
    }

    println!("\n✓ Scenario complete!\n");
    Ok(())
}

fn parse_seed_hex(hex: &str) -> [u8; 32] {
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let mut seed = [0u8; 32];

    for (i, chunk) in hex.as_bytes().chunks(2).enumerate() {
        if i >= 32 {
            break;
        }
        let byte_str = std::str::from_utf8(chunk).unwrap_or_else(|e| {
            eprintln!("Invalid hex seed: {}", e);
            std::process::exit(1);
        });
        seed[i] = u8::from_str_radix(byte_str, 16).unwrap_or_else(|e| {
            eprintln!("Invalid hex seed: {}", e);
            std::process::exit(1);
        });
    }

    seed
}
