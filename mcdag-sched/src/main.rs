/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};

use mcdag_sched::config::SystemConfig;
use mcdag_sched::report::ScheduleReport;
use mcdag_sched::scheduler::{Algorithm, McScheduler};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Static scheduling table synthesis for mixed-criticality DAG systems.
///
/// Example:
///   mcdag-sched -c system.yaml -c other.yaml --algorithm hybrid --format yaml
#[derive(Debug, Parser)]
#[command(
    name = "mcdag-sched",
    about = "Mixed-criticality DAG scheduling table builder",
    long_about = None,
)]
struct Cli {
    /// YAML system description(s).  Each one is built independently.
    #[arg(short = 'c', long = "config", required = true, num_args = 1..)]
    configs: Vec<PathBuf>,

    /// Override the algorithm named in the configuration.
    #[arg(short = 'a', long = "algorithm", value_parser = parse_algorithm)]
    algorithm: Option<Algorithm>,

    /// Output format.
    #[arg(short = 'f', long = "format", value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Yaml,
}

fn parse_algorithm(s: &str) -> Result<Algorithm, String> {
    s.parse::<Algorithm>().map_err(|e| e.to_string())
}

// ── One build ─────────────────────────────────────────────────────────────────

fn run(path: PathBuf, algorithm: Option<Algorithm>, format: Format) -> Result<String> {
    let config = SystemConfig::load_from_file(&path)?;
    let algorithm = algorithm.unwrap_or(config.algorithm);
    let scheduler = McScheduler::new(algorithm).with_hyperperiod_limit(config.hyperperiod_limit);

    let system = config
        .into_system()
        .with_context(|| format!("Invalid system description: {}", path.display()))?;
    let schedule = scheduler
        .build(&system)
        .with_context(|| format!("Cannot build tables for {}", path.display()))?;

    let report = ScheduleReport::new(&system, &schedule);
    match format {
        Format::Text => Ok(format!("# {}\n{}\n", path.display(), report)),
        Format::Yaml => report.to_yaml().context("Cannot serialize report"),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    info!(
        configs = cli.configs.len(),
        algorithm = ?cli.algorithm,
        format = ?cli.format,
        "mcdag-sched starting"
    );

    // Every build owns its own state; run them side by side.
    let handles: Vec<_> = cli
        .configs
        .iter()
        .cloned()
        .map(|path| {
            let (algorithm, format) = (cli.algorithm, cli.format);
            tokio::task::spawn_blocking(move || run(path, algorithm, format))
        })
        .collect();

    let mut failed = false;
    for (path, handle) in cli.configs.iter().zip(handles) {
        match handle.await {
            Ok(Ok(output)) => print!("{output}"),
            Ok(Err(e)) => {
                error!(config = %path.display(), "Build failed: {:#}", e);
                failed = true;
            }
            Err(e) => {
                error!(config = %path.display(), "Build task panicked: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
