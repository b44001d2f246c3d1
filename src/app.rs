//! Top-level application orchestration.
//!
//! `src/main.rs` stays tiny; this module is the real main that:
//! - parses CLI arguments and installs logging
//! - runs ingest, extraction and fitting
//! - prints the description, tables and plots
//! - writes the optional JSON export

use std::path::Path;

use clap::Parser;

use crate::cli::{AnalysisArgs, Command, ProbabilityArgs};
use crate::domain::{
    AnalysisConfig, Distribution, ExtractionMethod, ExtractionParams, ModelConfig, ModelKind,
    PlottingPosition,
};
use crate::error::AppError;
use crate::eva::Eva;
use crate::io::export::{AnalysisExport, write_export_json};

pub mod pipeline;

/// Entry point for the `eva` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    crate::logging::init(cli.verbose);

    match cli.command {
        Command::Summary(args) => handle_summary(&args),
        Command::Probability(args) => handle_probability(&args),
    }
}

fn handle_summary(args: &AnalysisArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(args);
    let run = pipeline::run_analysis(&config)?;

    println!("{}", run.eva);
    let table = run.eva.get_summary(
        config.return_periods.clone(),
        config.return_period_size.clone(),
        config.alpha,
    )?;
    println!("{}", crate::report::format_summary(&table));

    if let Some(path) = &config.export {
        export(&run.eva, &config, path)?;
    }
    Ok(())
}

fn handle_probability(args: &ProbabilityArgs) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args.analysis);
    let run = pipeline::run_analysis(&config)?;

    let plot = run.eva.probability_plot_data(
        args.kind,
        config.return_period_size.clone(),
        args.plotting_position,
    )?;
    println!("{}", crate::report::format_plot_header(&plot));
    println!(
        "{}",
        crate::plot::render_probability_plot(&plot, args.width, args.height)
    );

    if let Some(path) = &config.export {
        export(&run.eva, &config, path)?;
    }
    Ok(())
}

fn export(eva: &Eva, config: &AnalysisConfig, path: &Path) -> Result<(), AppError> {
    let (Some(extraction), Some(model)) = (eva.extremes(), eva.model()) else {
        return Err(AppError::new(5, "export requested without a fitted model"));
    };
    let plot = eva.return_value_plot_data(
        config.return_periods.clone(),
        config.return_period_size.clone(),
        config.alpha,
        PlottingPosition::default(),
    )?;

    let payload = AnalysisExport {
        tool: "eva".to_string(),
        label: eva.signal().name().to_string(),
        method: extraction.method(),
        extremes_type: extraction.extremes_type(),
        n_extremes: extraction.len(),
        model: model.name().to_string(),
        distribution: model.distribution().to_string(),
        parameters: model.params(),
        log_likelihood: model.log_likelihood(),
        return_period_size: config.return_period_size.to_string(),
        alpha: config.alpha,
        summary: plot.modeled,
        observed: plot.observed,
    };
    write_export_json(path, &payload)?;
    tracing::info!(path = %path.display(), "wrote export");
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalysisArgs) -> AnalysisConfig {
    let extraction = match args.method {
        ExtractionMethod::BlockMaxima => ExtractionParams::BlockMaxima {
            block_size: args.block_size.clone().into(),
            errors: args.errors,
        },
        ExtractionMethod::PeaksOverThreshold => ExtractionParams::PeaksOverThreshold {
            threshold: args.threshold,
            window: args.window.clone().into(),
        },
    };

    let model = match args.model {
        ModelKind::Mle => ModelConfig::PointEstimate {
            bootstrap_samples: args.bootstrap_samples,
            seed: args.seed,
        },
        ModelKind::Emcee => ModelConfig::PosteriorSample {
            walkers: args.walkers,
            samples: args.samples,
            burn_in: args.burn_in,
            seed: args.seed,
        },
    };

    AnalysisConfig {
        input: args.input.clone(),
        label: args.label.clone(),
        extremes_type: args.extremes_type,
        extraction,
        model,
        distribution: args
            .distribution
            .clone()
            .unwrap_or_else(|| Distribution::default_for(args.method)),
        return_periods: args.return_periods.clone(),
        return_period_size: args.return_period_size.clone().into(),
        alpha: (!args.no_intervals).then_some(args.alpha),
        export: args.export.clone(),
    }
}
