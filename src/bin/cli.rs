// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Laminate planner CLI

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use laminate_planner::cli::Reporter;
use laminate_planner::config::PlannerConfig;
use laminate_planner::kernel::{Kernel, Outcome, Stage};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "laminate-plan")]
#[command(version, about = "Plan laser cuts for a laminate device", long_about = None)]
struct Cli {
    /// Device directory holding the tables and outline drawings
    #[arg(value_name = "DIR")]
    dir: PathBuf,

    /// Render a PNG preview of the layers and release passes
    #[arg(long)]
    plot: bool,

    /// Plan a mirrored copy beside the device
    #[arg(long)]
    twin: bool,

    /// Configuration file (defaults to laminate.toml in DIR)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Laser kerf
    #[arg(long)]
    kerf: Option<f64>,

    /// Hinge joint width
    #[arg(long)]
    joint_width: Option<f64>,

    /// Layers that receive single-layer release cuts (repeatable)
    #[arg(long = "thin-layer", value_name = "LAYER")]
    thin_layers: Vec<usize>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(&cli) {
        Reporter::report_error(&format!("{:#}", e));
        std::process::exit(1);
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<PlannerConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = PlannerConfig::from_file(path)?;
            config.apply_env_overrides(|key| std::env::var(key).ok())?;
            config
        }
        None => PlannerConfig::load(&cli.dir)?,
    };

    if let Some(kerf) = cli.kerf {
        config.plan.kerf = kerf;
    }
    if let Some(width) = cli.joint_width {
        config.joints.width = width;
    }
    if !cli.thin_layers.is_empty() {
        config.plan.thin_layers = Some(cli.thin_layers.clone());
    }
    config.validate()?;
    Ok(config)
}

fn run(cli: &Cli) -> Result<()> {
    if !cli.dir.is_dir() {
        anyhow::bail!("device directory not found: {}", cli.dir.display());
    }

    let config = load_config(cli)?;
    let kernel = Kernel::new(config)
        .with_twin(cli.twin)
        .with_preview(cli.plot);

    let pb = ProgressBar::new(Stage::ALL.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
            )?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let step = |stage: Stage| {
        pb.set_message(stage.to_string());
    };

    step(Stage::Import);
    let (input, import_warnings) = kernel
        .import(&cli.dir)
        .with_context(|| format!("reading {}", cli.dir.display()))?;
    pb.inc(1);

    step(Stage::Resolve);
    let input = kernel.resolve(input)?;
    pb.inc(1);

    step(Stage::Assemble);
    let device = kernel.assemble(&input)?;
    pb.inc(1);

    step(Stage::Plan);
    let plan = kernel.plan(&device)?;
    pb.inc(1);

    let mut warnings = import_warnings;
    warnings.extend(input.warnings.iter().cloned());
    let mut outcome = Outcome {
        input,
        device,
        plan,
        warnings,
    };

    step(Stage::Export);
    let written = kernel.export(&mut outcome, &cli.dir)?;
    pb.finish_and_clear();

    Reporter::report_plan(&cli.dir, &outcome, &written, start.elapsed());
    Reporter::success(&format!("Processed {}", cli.dir.display()));
    Ok(())
}
