// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Kinkfinder: finds kinks in interpolated and master outlines of a font

use anyhow::{Context, Result};

pub mod cli;
pub mod config;
pub mod error;
pub mod geometry;
pub mod interpolation;
pub mod marking;
pub mod model;
pub mod report;
pub mod sampler;
pub mod scanner;
pub mod settings;

use cli::CliArgs;
use config::KinkConfig;
use error::ScanError;
use interpolation::LinearInterpolator;
use marking::Mark;
use model::font::Font;
use report::{JsonReport, ReportSink, TextReport};
use scanner::{KinkScanner, ScanProgress, ScanReport};

/// Entry point for the kinkfinder command
pub fn run() -> Result<()> {
    // Initialize tracing subscriber (can be controlled via RUST_LOG env var)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("kinkfinder=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse(std::env::args().skip(1))?;
    if args.help {
        println!("{}", cli::USAGE);
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => KinkConfig::load(path)?,
        None => KinkConfig::default(),
    };
    args.apply(&mut config)?;

    if !args.font.exists() {
        tracing::error!("Path does not exist: {}", args.font.display());
        tracing::error!("Usage: kinkfinder [path/to/font.ufo|designspace]");
        anyhow::bail!("font not found: {}", args.font.display());
    }

    tracing::info!("Loading font from: {}", args.font.display());
    let font = model::load_font(&args.font, &config.inactive_instances)
        .with_context(|| format!("Failed to load font {}", args.font.display()))?;

    let (report, marks) = scan_font(&font, &config)?;

    let out = std::io::stdout().lock();
    if args.json {
        JsonReport::new(out).report(&font, &config, &report, &marks)
    } else {
        TextReport::new(out).report(&font, &config, &report, &marks)
    }
}

/// Scan `font` with the linear interpolator and plan marks for the findings
pub fn scan_font(font: &Font, config: &KinkConfig) -> Result<(ScanReport, Vec<Mark>), ScanError> {
    let engine = LinearInterpolator::new(font).with_grid(config.grid_length);
    let report = KinkScanner::new(font, &engine, config).scan_with_progress(log_progress)?;
    let marks = marking::plan_marks(font, config, &report);
    Ok((report, marks))
}

fn log_progress(progress: ScanProgress<'_>) {
    if progress.index % 100 == 0 && progress.total > 100 {
        tracing::info!("Progress: {}/{} glyphs", progress.index, progress.total);
    }
}
