//! Shared domain types.
//!
//! These are the tags and settings the pipeline is driven by:
//!
//! - extraction tags (`ExtractionMethod`, `ExtremesType`, `EmptyBlockPolicy`)
//!   and their parameters (`ExtractionParams`, `MethodParameters`)
//! - distribution tags (`Distribution`, `DistributionFamily`)
//! - model settings (`ModelConfig`)
//! - diagnostic selectors (`PlottingPosition`, `PlotKind`)
//! - return-period input (`ReturnPeriods`)
//! - the CLI run configuration (`AnalysisConfig`)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::duration::{DurationArg, format_duration};
use crate::error::EvaError;

/// How extreme events are selected from the signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum ExtractionMethod {
    /// One extreme per fixed-length block.
    #[serde(rename = "BM")]
    #[value(name = "bm")]
    BlockMaxima,
    /// Declustered exceedances of a threshold.
    #[serde(rename = "POT")]
    #[value(name = "pot")]
    PeaksOverThreshold,
}

impl ExtractionMethod {
    /// Short label (`BM` / `POT`).
    pub fn label(self) -> &'static str {
        match self {
            ExtractionMethod::BlockMaxima => "BM",
            ExtractionMethod::PeaksOverThreshold => "POT",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether extremes are maxima or minima.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExtremesType {
    #[default]
    High,
    Low,
}

impl fmt::Display for ExtremesType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtremesType::High => f.write_str("high"),
            ExtremesType::Low => f.write_str("low"),
        }
    }
}

/// What block maxima does with a block that holds no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmptyBlockPolicy {
    /// Fail the extraction.
    #[default]
    Raise,
    /// Skip the block.
    Ignore,
    /// Use the mean of all other block extremes, stamped at the block midpoint.
    Coerce,
}

/// Extraction settings as supplied by the caller. The variant selects the
/// extraction method.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionParams {
    BlockMaxima {
        block_size: DurationArg,
        errors: EmptyBlockPolicy,
    },
    PeaksOverThreshold {
        /// Mandatory; `None` fails extraction with a missing-parameter error.
        threshold: Option<f64>,
        /// Declustering window.
        window: DurationArg,
    },
}

impl ExtractionParams {
    /// Block maxima with `errors = raise`.
    pub fn block_maxima(block_size: impl Into<DurationArg>) -> Self {
        ExtractionParams::BlockMaxima {
            block_size: block_size.into(),
            errors: EmptyBlockPolicy::Raise,
        }
    }

    /// Peaks over threshold with a 24 hour declustering window.
    pub fn peaks_over_threshold(threshold: f64) -> Self {
        ExtractionParams::PeaksOverThreshold {
            threshold: Some(threshold),
            window: DurationArg::from("24H"),
        }
    }

    /// Set the empty-block policy (block maxima only).
    pub fn with_errors(mut self, policy: EmptyBlockPolicy) -> Self {
        if let ExtractionParams::BlockMaxima { errors, .. } = &mut self {
            *errors = policy;
        }
        self
    }

    /// Set the declustering window (peaks over threshold only).
    pub fn with_window(mut self, value: impl Into<DurationArg>) -> Self {
        if let ExtractionParams::PeaksOverThreshold { window, .. } = &mut self {
            *window = value.into();
        }
        self
    }

    pub fn method(&self) -> ExtractionMethod {
        match self {
            ExtractionParams::BlockMaxima { .. } => ExtractionMethod::BlockMaxima,
            ExtractionParams::PeaksOverThreshold { .. } => ExtractionMethod::PeaksOverThreshold,
        }
    }
}

/// Extraction parameters stored with an extraction result.
///
/// The block size is normalized to a [`Duration`]; the declustering window is
/// kept exactly as it was supplied.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodParameters {
    BlockMaxima {
        block_size: Duration,
        errors: EmptyBlockPolicy,
    },
    PeaksOverThreshold {
        threshold: f64,
        window: DurationArg,
    },
}

impl MethodParameters {
    /// Name and rendered value of the defining parameter (block size or threshold).
    pub fn headline(&self) -> (&'static str, String) {
        match self {
            MethodParameters::BlockMaxima { block_size, .. } => {
                ("Block size", format_duration(*block_size))
            }
            MethodParameters::PeaksOverThreshold { threshold, .. } => {
                ("Threshold", format!("{threshold}"))
            }
        }
    }
}

/// Which kind of extremes a distribution is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistributionFamily {
    /// Generalized extreme value family: block maxima.
    Gev,
    /// Generalized Pareto family: threshold exceedances.
    Gpd,
    /// Unknown to the pipeline; no compatibility check.
    Other,
}

/// Tail distribution, named as in `scipy.stats`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Distribution {
    GenExtreme,
    GumbelR,
    GenPareto,
    Expon,
    Other(String),
}

impl Distribution {
    pub fn name(&self) -> &str {
        match self {
            Distribution::GenExtreme => "genextreme",
            Distribution::GumbelR => "gumbel_r",
            Distribution::GenPareto => "genpareto",
            Distribution::Expon => "expon",
            Distribution::Other(name) => name,
        }
    }

    pub fn family(&self) -> DistributionFamily {
        match self {
            Distribution::GenExtreme | Distribution::GumbelR => DistributionFamily::Gev,
            Distribution::GenPareto | Distribution::Expon => DistributionFamily::Gpd,
            Distribution::Other(_) => DistributionFamily::Other,
        }
    }

    /// Conventional default for an extraction method.
    pub fn default_for(method: ExtractionMethod) -> Self {
        match method {
            ExtractionMethod::BlockMaxima => Distribution::GenExtreme,
            ExtractionMethod::PeaksOverThreshold => Distribution::GenPareto,
        }
    }
}

impl FromStr for Distribution {
    type Err = EvaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        if name.is_empty() {
            return Err(EvaError::InvalidValue {
                parameter: "distribution",
                value: s.to_string(),
                allowed: "genextreme, gumbel_r, genpareto, expon".to_string(),
            });
        }
        Ok(match name {
            "genextreme" => Distribution::GenExtreme,
            "gumbel_r" => Distribution::GumbelR,
            "genpareto" => Distribution::GenPareto,
            "expon" => Distribution::Expon,
            other => Distribution::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fitting approach, as selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Maximum likelihood point estimate, bootstrap intervals.
    Mle,
    /// Ensemble MCMC posterior sample, credible intervals.
    Emcee,
}

/// Model settings, resolved once when the model is fit.
///
/// Each variant carries the fit-time controls and the interval-time controls
/// of its own approach.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelConfig {
    /// Maximum likelihood estimate.
    PointEstimate {
        /// Bootstrap resamples used for confidence intervals.
        bootstrap_samples: usize,
        seed: u64,
    },
    /// Affine-invariant ensemble MCMC.
    PosteriorSample {
        walkers: usize,
        /// Steps per walker.
        samples: usize,
        /// Leading steps of each walker discarded for intervals.
        burn_in: usize,
        seed: u64,
    },
}

impl ModelConfig {
    /// Maximum likelihood with 100 bootstrap resamples.
    pub fn mle() -> Self {
        ModelConfig::PointEstimate {
            bootstrap_samples: 100,
            seed: 0,
        }
    }

    /// 100 walkers, 500 steps each, first 100 steps discarded.
    pub fn emcee() -> Self {
        ModelConfig::PosteriorSample {
            walkers: 100,
            samples: 500,
            burn_in: 100,
            seed: 0,
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            ModelConfig::PointEstimate { .. } => ModelKind::Mle,
            ModelConfig::PosteriorSample { .. } => ModelKind::Emcee,
        }
    }

    /// Display name (`MLE` / `Emcee`).
    pub fn name(&self) -> &'static str {
        match self {
            ModelConfig::PointEstimate { .. } => "MLE",
            ModelConfig::PosteriorSample { .. } => "Emcee",
        }
    }
}

/// Plotting-position formula `p = (rank - alpha) / (n + 1 - alpha - beta)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlottingPosition {
    Ecdf,
    Hazen,
    #[default]
    Weibull,
    Tukey,
    Blom,
    Median,
    Cunnane,
    Gringorten,
    Beard,
}

impl PlottingPosition {
    pub const ALL: [PlottingPosition; 9] = [
        PlottingPosition::Ecdf,
        PlottingPosition::Hazen,
        PlottingPosition::Weibull,
        PlottingPosition::Tukey,
        PlottingPosition::Blom,
        PlottingPosition::Median,
        PlottingPosition::Cunnane,
        PlottingPosition::Gringorten,
        PlottingPosition::Beard,
    ];

    /// `(alpha, beta)` of the formula.
    pub fn alpha_beta(self) -> (f64, f64) {
        match self {
            PlottingPosition::Ecdf => (0.0, 1.0),
            PlottingPosition::Hazen => (0.5, 0.5),
            PlottingPosition::Weibull => (0.0, 0.0),
            PlottingPosition::Tukey => (1.0 / 3.0, 1.0 / 3.0),
            PlottingPosition::Blom => (3.0 / 8.0, 3.0 / 8.0),
            PlottingPosition::Median => (0.3175, 0.3175),
            PlottingPosition::Cunnane => (0.4, 0.4),
            PlottingPosition::Gringorten => (0.44, 0.44),
            PlottingPosition::Beard => (0.31, 0.31),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PlottingPosition::Ecdf => "ecdf",
            PlottingPosition::Hazen => "hazen",
            PlottingPosition::Weibull => "weibull",
            PlottingPosition::Tukey => "tukey",
            PlottingPosition::Blom => "blom",
            PlottingPosition::Median => "median",
            PlottingPosition::Cunnane => "cunnane",
            PlottingPosition::Gringorten => "gringorten",
            PlottingPosition::Beard => "beard",
        }
    }
}

impl FromStr for PlottingPosition {
    type Err = EvaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PlottingPosition::ALL
            .into_iter()
            .find(|p| p.name() == wanted)
            .ok_or_else(|| EvaError::InvalidValue {
                parameter: "plotting_position",
                value: s.to_string(),
                allowed: PlottingPosition::ALL
                    .iter()
                    .map(|p| p.name())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Probability plot type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlotKind {
    /// Probability-probability.
    PP,
    /// Quantile-quantile.
    QQ,
}

impl FromStr for PlotKind {
    type Err = EvaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PP" => Ok(PlotKind::PP),
            "QQ" => Ok(PlotKind::QQ),
            _ => Err(EvaError::InvalidValue {
                parameter: "plot_type",
                value: s.to_string(),
                allowed: "PP, QQ".to_string(),
            }),
        }
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlotKind::PP => f.write_str("PP"),
            PlotKind::QQ => f.write_str("QQ"),
        }
    }
}

/// One return period or an ordered list of them.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnPeriods {
    Single(f64),
    Many(Vec<f64>),
}

impl ReturnPeriods {
    pub fn as_slice(&self) -> &[f64] {
        match self {
            ReturnPeriods::Single(value) => std::slice::from_ref(value),
            ReturnPeriods::Many(values) => values,
        }
    }

    pub fn is_single(&self) -> bool {
        matches!(self, ReturnPeriods::Single(_))
    }
}

impl From<f64> for ReturnPeriods {
    fn from(value: f64) -> Self {
        ReturnPeriods::Single(value)
    }
}

impl From<Vec<f64>> for ReturnPeriods {
    fn from(values: Vec<f64>) -> Self {
        ReturnPeriods::Many(values)
    }
}

impl From<&[f64]> for ReturnPeriods {
    fn from(values: &[f64]) -> Self {
        ReturnPeriods::Many(values.to_vec())
    }
}

impl<const N: usize> From<[f64; N]> for ReturnPeriods {
    fn from(values: [f64; N]) -> Self {
        ReturnPeriods::Many(values.to_vec())
    }
}

impl FromStr for ReturnPeriods {
    type Err = EvaError;

    /// `"100"` is a single period, `"10,50,100"` an ordered list.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EvaError::InvalidReturnPeriodInput {
            input: s.to_string(),
        };
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(invalid());
        }
        if !trimmed.contains(',') {
            return trimmed
                .parse::<f64>()
                .map(ReturnPeriods::Single)
                .map_err(|_| invalid());
        }
        trimmed
            .split(',')
            .map(|part| part.trim().parse::<f64>().map_err(|_| invalid()))
            .collect::<Result<Vec<_>, _>>()
            .map(ReturnPeriods::Many)
    }
}

/// A full CLI run configuration, derived from flags plus defaults.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub input: PathBuf,
    /// Signal label; defaults to the CSV value column header.
    pub label: Option<String>,
    pub extremes_type: ExtremesType,
    pub extraction: ExtractionParams,
    pub model: ModelConfig,
    pub distribution: Distribution,
    pub return_periods: ReturnPeriods,
    pub return_period_size: DurationArg,
    /// Interval width; `None` skips intervals.
    pub alpha: Option<f64>,
    pub export: Option<PathBuf>,
}
