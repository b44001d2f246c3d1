//! Command-line parsing for the `eva` binary.
//!
//! Argument parsing and command dispatch stay separate from the analysis
//! code: this module only declares flags, `app` turns them into an
//! [`AnalysisConfig`](crate::domain::AnalysisConfig).

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::domain::{
    Distribution, EmptyBlockPolicy, ExtractionMethod, ExtremesType, ModelKind, PlotKind,
    PlottingPosition, ReturnPeriods,
};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "eva", version, about = "Extreme value analysis of time series")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract extremes, fit a model, print the description and the return-value table.
    Summary(AnalysisArgs),
    /// Extract extremes, fit a model and draw a PP or QQ plot in the terminal.
    Probability(ProbabilityArgs),
}

/// Options shared by every analysis command.
#[derive(Debug, Args, Clone)]
pub struct AnalysisArgs {
    /// CSV file: timestamp in the first column, value in the second.
    #[arg(short, long, value_name = "CSV")]
    pub input: PathBuf,

    /// Signal label (defaults to the value column header).
    #[arg(long)]
    pub label: Option<String>,

    /// Extraction method.
    #[arg(short, long, value_enum, default_value_t = ExtractionMethod::BlockMaxima)]
    pub method: ExtractionMethod,

    /// Extract maxima (high) or minima (low).
    #[arg(long, value_enum, default_value_t = ExtremesType::High)]
    pub extremes_type: ExtremesType,

    /// Block size for block maxima.
    #[arg(long, default_value = "1Y")]
    pub block_size: String,

    /// What block maxima does with blocks holding no data.
    #[arg(long, value_enum, default_value_t = EmptyBlockPolicy::Raise)]
    pub errors: EmptyBlockPolicy,

    /// Threshold for peaks over threshold.
    #[arg(long, allow_negative_numbers = true)]
    pub threshold: Option<f64>,

    /// Declustering window for peaks over threshold.
    #[arg(long, default_value = "24H")]
    pub window: String,

    /// Fitting approach.
    #[arg(long, value_enum, default_value_t = ModelKind::Mle)]
    pub model: ModelKind,

    /// Distribution name (genextreme, gumbel_r, genpareto, expon).
    /// Defaults to genextreme for BM and genpareto for POT.
    #[arg(short, long)]
    pub distribution: Option<Distribution>,

    /// Comma-separated return periods.
    #[arg(long, default_value = "2,5,10,25,50,100")]
    pub return_periods: ReturnPeriods,

    /// Unit of the return periods.
    #[arg(long, default_value = "1Y")]
    pub return_period_size: String,

    /// Width of the confidence/credible interval.
    #[arg(long, default_value_t = 0.95)]
    pub alpha: f64,

    /// Skip confidence/credible intervals.
    #[arg(long)]
    pub no_intervals: bool,

    /// Bootstrap resamples for MLE intervals.
    #[arg(long, default_value_t = 100)]
    pub bootstrap_samples: usize,

    /// Emcee walkers.
    #[arg(long, default_value_t = 100)]
    pub walkers: usize,

    /// Emcee steps per walker.
    #[arg(long, default_value_t = 500)]
    pub samples: usize,

    /// Emcee leading steps discarded for intervals.
    #[arg(long, default_value_t = 100)]
    pub burn_in: usize,

    /// Random seed for bootstrap and sampling.
    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// Export settings, parameters and return values to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

/// Options for the probability plot.
#[derive(Debug, Args, Clone)]
pub struct ProbabilityArgs {
    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Plot type (PP or QQ).
    #[arg(long, default_value = "PP")]
    pub kind: PlotKind,

    /// Plotting-position formula for empirical probabilities.
    #[arg(long, default_value = "weibull")]
    pub plotting_position: PlottingPosition,

    /// Plot width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}
