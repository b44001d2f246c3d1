//! The analysis orchestrator.
//!
//! [`Eva`] owns one signal and walks it through the pipeline:
//!
//! ```text
//! Initialized --get_extremes--> Extracted --fit_model--> Fitted
//!      ^                          |   ^                    |
//!      |                          +---+--get_extremes------+
//! ```
//!
//! Extraction always replaces the extremes and drops any fitted model.
//! Fitting replaces the model. A failed step leaves the previous state
//! untouched. Return values, summaries and diagnostics need a fitted model.

use std::fmt;

use serde::Serialize;
use tracing::{Span, debug, info, info_span, warn};

use crate::domain::{
    Distribution, DistributionFamily, DurationArg, ExtractionMethod, ExtractionParams, ExtremesType,
    ModelConfig, PlotKind, PlottingPosition, ReturnPeriods, Signal,
};
use crate::error::EvaError;
use crate::extremes::{DefaultExtractor, ExtractionResult, Extractor, ObservedReturnPeriod, Transformer, return_periods};
use crate::math::linspace;
use crate::models::{DefaultFitter, FitConstraints, ModelFitter, ReturnValueSet, TailModel, validate_alpha};

pub mod rate;

use rate::{exceedance_probabilities, occurrence_rate};

#[derive(Debug)]
struct Extracted {
    extraction: ExtractionResult,
    transformer: Transformer,
}

#[derive(Debug)]
struct Fitted {
    model: Box<dyn TailModel>,
    config: ModelConfig,
}

#[derive(Debug, Default)]
enum Stage {
    #[default]
    Initialized,
    Extracted(Extracted),
    Fitted(Extracted, Fitted),
}

/// Extreme value analysis of one signal.
pub struct Eva {
    signal: Signal,
    stage: Stage,
    extractor: Box<dyn Extractor>,
    fitter: Box<dyn ModelFitter>,
    span: Span,
}

/// Modeled return values, mapped back to the scale of the signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnValues {
    pub return_periods: Vec<f64>,
    pub exceedance_probabilities: Vec<f64>,
    pub estimate: Vec<f64>,
    pub lower: Option<Vec<f64>>,
    pub upper: Option<Vec<f64>>,
    /// Requested as a single return period.
    #[serde(skip)]
    scalar: bool,
}

impl ReturnValues {
    pub fn is_scalar(&self) -> bool {
        self.scalar
    }

    /// `(estimate, lower, upper)` of a single-period request.
    pub fn as_scalar(&self) -> Option<(f64, Option<f64>, Option<f64>)> {
        if !self.scalar {
            return None;
        }
        let estimate = *self.estimate.first()?;
        let lower = self.lower.as_ref().and_then(|v| v.first().copied());
        let upper = self.upper.as_ref().and_then(|v| v.first().copied());
        Some((estimate, lower, upper))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub return_period: f64,
    pub return_value: f64,
    pub lower_ci: Option<f64>,
    pub upper_ci: Option<f64>,
}

/// Return values per return period, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

impl From<ReturnValues> for SummaryTable {
    fn from(values: ReturnValues) -> Self {
        let at = |bound: &Option<Vec<f64>>, i: usize| bound.as_ref().and_then(|v| v.get(i).copied());
        let rows = values
            .return_periods
            .iter()
            .zip(&values.estimate)
            .enumerate()
            .map(|(i, (&return_period, &return_value))| SummaryRow {
                return_period,
                return_value,
                lower_ci: at(&values.lower, i),
                upper_ci: at(&values.upper, i),
            })
            .collect();
        SummaryTable { rows }
    }
}

/// Paired observed / theoretical coordinates for a PP or QQ plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbabilityPlot {
    pub kind: PlotKind,
    pub observed: Vec<f64>,
    pub theoretical: Vec<f64>,
}

/// Empirical return periods with the modeled curve at requested periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnValuePlot {
    pub observed: Vec<ObservedReturnPeriod>,
    pub modeled: SummaryTable,
}

/// Model density over the range of the extremes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DensityPlot {
    pub support: Vec<f64>,
    pub density: Vec<f64>,
}

/// Whether `distribution` may be fit to extremes extracted with `method`.
///
/// GEV-family distributions need block maxima, GPD-family distributions need
/// peaks over threshold; distributions of any other family are not checked.
pub fn check_compatibility(method: ExtractionMethod, distribution: &Distribution) -> Result<(), EvaError> {
    let required = match (distribution.family(), method) {
        (DistributionFamily::Other, _)
        | (DistributionFamily::Gev, ExtractionMethod::BlockMaxima)
        | (DistributionFamily::Gpd, ExtractionMethod::PeaksOverThreshold) => return Ok(()),
        (DistributionFamily::Gev, ExtractionMethod::PeaksOverThreshold) => ExtractionMethod::BlockMaxima,
        (DistributionFamily::Gpd, ExtractionMethod::BlockMaxima) => ExtractionMethod::PeaksOverThreshold,
    };
    Err(EvaError::IncompatibleDistribution {
        distribution: distribution.name().to_string(),
        required: required.label(),
        actual: method.label(),
    })
}

impl Eva {
    pub fn new(signal: Signal) -> Self {
        let span = info_span!("eva", label = %signal.name());
        span.in_scope(|| {
            info!(
                n = signal.len(),
                start = %signal.first_timestamp(),
                end = %signal.last_timestamp(),
                "analysis created"
            );
        });
        Self {
            signal,
            stage: Stage::Initialized,
            extractor: Box::new(DefaultExtractor),
            fitter: Box::new(DefaultFitter),
            span,
        }
    }

    /// Replace the extraction collaborator.
    pub fn with_extractor(mut self, extractor: impl Extractor + 'static) -> Self {
        self.extractor = Box::new(extractor);
        self
    }

    /// Replace the model-fitting collaborator.
    pub fn with_fitter(mut self, fitter: impl ModelFitter + 'static) -> Self {
        self.fitter = Box::new(fitter);
        self
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }

    pub fn extremes(&self) -> Option<&ExtractionResult> {
        self.extracted().map(|e| &e.extraction)
    }

    pub fn transformer(&self) -> Option<&Transformer> {
        self.extracted().map(|e| &e.transformer)
    }

    pub fn model(&self) -> Option<&dyn TailModel> {
        match &self.stage {
            Stage::Fitted(_, fitted) => Some(fitted.model.as_ref()),
            _ => None,
        }
    }

    pub fn model_config(&self) -> Option<&ModelConfig> {
        match &self.stage {
            Stage::Fitted(_, fitted) => Some(&fitted.config),
            _ => None,
        }
    }

    /// Extract extreme events. The variant of `params` selects the method.
    ///
    /// Replaces any earlier extremes and discards the fitted model.
    pub fn get_extremes(&mut self, extremes_type: ExtremesType, params: ExtractionParams) -> Result<(), EvaError> {
        let span = self.span.clone();
        let _entered = span.enter();

        info!(method = %params.method(), %extremes_type, "extracting extreme values");
        let extraction = self.extractor.extract(&self.signal, extremes_type, &params)?;
        let transformer = Transformer::new(&extraction);
        info!(n = extraction.len(), "extracted extreme values");

        if matches!(self.stage, Stage::Fitted(..)) {
            debug!("discarding fitted model");
        }
        self.stage = Stage::Extracted(Extracted { extraction, transformer });
        Ok(())
    }

    /// Fit `distribution` to the extracted extremes.
    pub fn fit_model(&mut self, config: ModelConfig, distribution: Distribution) -> Result<(), EvaError> {
        let span = self.span.clone();
        let _entered = span.enter();

        let extracted = self
            .extracted()
            .ok_or(EvaError::NotExtracted { operation: "fitting a model" })?;
        check_compatibility(extracted.extraction.method(), &distribution)?;

        info!(model = config.name(), %distribution, "fitting model");
        let constraints = FitConstraints {
            location: extracted.transformer.location(),
        };
        let model = self
            .fitter
            .fit(&config, extracted.transformer.transformed_extremes(), &distribution, constraints)?;
        let params = model.params();
        info!(
            loc = params.loc,
            scale = params.scale,
            shape = params.shape,
            "fitted model"
        );

        self.stage = match std::mem::take(&mut self.stage) {
            Stage::Extracted(extracted) | Stage::Fitted(extracted, _) => {
                Stage::Fitted(extracted, Fitted { model, config })
            }
            Stage::Initialized => {
                return Err(EvaError::Internal("extremes vanished while fitting".to_string()));
            }
        };
        Ok(())
    }

    /// Modeled return values for one or more return periods.
    ///
    /// `return_period_size` is the unit of the periods (`"1Y"` makes `100` a
    /// 100-year event). `alpha` is the interval width; `None` skips intervals.
    /// A period shorter than the mean time between extremes (exceedance
    /// probability above 1) yields NaN for its own entry only.
    pub fn get_return_value(
        &self,
        return_periods: impl Into<ReturnPeriods>,
        return_period_size: impl Into<DurationArg>,
        alpha: Option<f64>,
    ) -> Result<ReturnValues, EvaError> {
        let _entered = self.span.enter();
        let (extracted, fitted) = self.fitted("computing return values")?;
        let return_periods = return_periods.into();
        let size = return_period_size.into().resolve()?;

        let rate = occurrence_rate(&self.signal, &extracted.extraction, size)?;
        let probabilities = exceedance_probabilities(return_periods.as_slice(), rate)?;
        debug!(rate, ?probabilities, "return periods converted");

        // Periods shorter than the mean event spacing have no return value.
        let in_range: Vec<usize> = (0..probabilities.len())
            .filter(|&i| probabilities[i] <= 1.0)
            .collect();
        if in_range.len() < probabilities.len() {
            warn!(
                skipped = probabilities.len() - in_range.len(),
                "return periods shorter than the mean time between extremes have no return value"
            );
        }
        let set = if in_range.is_empty() {
            if let Some(alpha) = alpha {
                validate_alpha(alpha)?;
            }
            ReturnValueSet {
                estimate: Vec::new(),
                lower: alpha.map(|_| Vec::new()),
                upper: alpha.map(|_| Vec::new()),
            }
        } else {
            let wanted: Vec<f64> = in_range.iter().map(|&i| probabilities[i]).collect();
            fitted.model.return_value(&wanted, alpha)?
        };

        let transformer = &extracted.transformer;
        let scatter = |values: &[f64]| {
            let mut full = vec![f64::NAN; probabilities.len()];
            for (&i, &v) in in_range.iter().zip(values) {
                full[i] = v;
            }
            full
        };
        let estimate = transformer.inverse_all(&scatter(&set.estimate));
        let (lower, upper) = match (set.lower, set.upper) {
            (Some(lower), Some(upper)) => {
                let (lower, upper): (Vec<f64>, Vec<f64>) = scatter(&lower)
                    .iter()
                    .zip(&scatter(&upper))
                    .map(|(&lo, &hi)| {
                        let (a, b) = (transformer.inverse(lo), transformer.inverse(hi));
                        if a <= b { (a, b) } else { (b, a) }
                    })
                    .unzip();
                (Some(lower), Some(upper))
            }
            _ => (None, None),
        };

        Ok(ReturnValues {
            return_periods: return_periods.as_slice().to_vec(),
            exceedance_probabilities: probabilities,
            estimate,
            lower,
            upper,
            scalar: return_periods.is_single(),
        })
    }

    /// Return values as a table, one row per return period.
    pub fn get_summary(
        &self,
        return_periods: impl Into<ReturnPeriods>,
        return_period_size: impl Into<DurationArg>,
        alpha: Option<f64>,
    ) -> Result<SummaryTable, EvaError> {
        self.get_return_value(return_periods, return_period_size, alpha)
            .map(SummaryTable::from)
    }

    /// Empirical return periods of the extremes alongside the modeled values.
    pub fn return_value_plot_data(
        &self,
        return_periods: impl Into<ReturnPeriods>,
        return_period_size: impl Into<DurationArg>,
        alpha: Option<f64>,
        plotting_position: PlottingPosition,
    ) -> Result<ReturnValuePlot, EvaError> {
        let _entered = self.span.enter();
        let (extracted, _) = self.fitted("plotting return values")?;
        let size: DurationArg = return_period_size.into();
        let observed = return_periods::estimate(
            &self.signal,
            &extracted.extraction,
            size.resolve()?,
            plotting_position,
        )?;
        let modeled = self.get_summary(return_periods, size, alpha)?;
        Ok(ReturnValuePlot { observed, modeled })
    }

    /// PP or QQ coordinates of the extremes against the fitted model.
    ///
    /// PP: observed is `1 - p` (empirical), theoretical is the model cdf.
    /// QQ: observed is the extreme value, theoretical the model quantile at
    /// the same empirical exceedance probability `p`.
    pub fn probability_plot_data(
        &self,
        kind: PlotKind,
        return_period_size: impl Into<DurationArg>,
        plotting_position: PlottingPosition,
    ) -> Result<ProbabilityPlot, EvaError> {
        let _entered = self.span.enter();
        let (extracted, fitted) = self.fitted("building a probability plot")?;
        let observed_periods = return_periods::estimate(
            &self.signal,
            &extracted.extraction,
            return_period_size.into().resolve()?,
            plotting_position,
        )?;
        let transformer = &extracted.transformer;
        let model = fitted.model.as_ref();

        let (observed, theoretical): (Vec<f64>, Vec<f64>) = observed_periods
            .iter()
            .map(|row| match kind {
                PlotKind::PP => (
                    1.0 - row.exceedance_probability,
                    model.cdf(transformer.forward(row.value)),
                ),
                PlotKind::QQ => (
                    row.value,
                    transformer.inverse(model.isf(row.exceedance_probability)),
                ),
            })
            .unzip();
        Ok(ProbabilityPlot {
            kind,
            observed,
            theoretical,
        })
    }

    /// Model density at `points` evenly spaced values spanning the extremes.
    pub fn density_plot_data(&self, points: usize) -> Result<DensityPlot, EvaError> {
        let _entered = self.span.enter();
        let (extracted, fitted) = self.fitted("evaluating the model density")?;
        if points < 2 {
            return Err(EvaError::InvalidParameter {
                parameter: "points",
                reason: format!("at least 2 support points are required, got {points}"),
            });
        }
        let (min, max) = extracted
            .extraction
            .value_range()
            .ok_or_else(|| EvaError::Internal("extraction holds no finite values".to_string()))?;
        let support = linspace(min, max, points);
        let density = support
            .iter()
            .map(|&x| fitted.model.pdf(extracted.transformer.forward(x)))
            .collect();
        Ok(DensityPlot { support, density })
    }

    fn extracted(&self) -> Option<&Extracted> {
        match &self.stage {
            Stage::Initialized => None,
            Stage::Extracted(extracted) | Stage::Fitted(extracted, _) => Some(extracted),
        }
    }

    fn fitted(&self, operation: &'static str) -> Result<(&Extracted, &Fitted), EvaError> {
        match &self.stage {
            Stage::Fitted(extracted, fitted) => Ok((extracted, fitted)),
            _ => Err(EvaError::NotFitted { operation }),
        }
    }
}

impl fmt::Debug for Eva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Eva")
            .field("signal", &self.signal.name())
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Eva {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::report::describe(self))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::domain::EmptyBlockPolicy;
    use crate::error::ErrorKind;
    use crate::extremes::test_support::daily;
    use crate::models::Params;

    /// Exponential tail at the origin with a fixed ±1 interval.
    #[derive(Debug)]
    struct StubModel {
        distribution: Distribution,
    }

    impl TailModel for StubModel {
        fn name(&self) -> &'static str {
            "MLE"
        }
        fn distribution(&self) -> &Distribution {
            &self.distribution
        }
        fn params(&self) -> Params {
            Params::new(0.0, 1.0, 0.0)
        }
        fn log_likelihood(&self) -> f64 {
            -1.0
        }
        fn free_parameters(&self) -> usize {
            1
        }
        fn pdf(&self, x: f64) -> f64 {
            if x < 0.0 { 0.0 } else { (-x).exp() }
        }
        fn cdf(&self, x: f64) -> f64 {
            if x < 0.0 { 0.0 } else { 1.0 - (-x).exp() }
        }
        fn isf(&self, p: f64) -> f64 {
            -p.ln()
        }
        fn return_value(
            &self,
            probabilities: &[f64],
            alpha: Option<f64>,
        ) -> Result<crate::models::ReturnValueSet, EvaError> {
            let estimate: Vec<f64> = probabilities.iter().map(|&p| self.isf(p)).collect();
            let shifted = |by: f64| -> Vec<f64> { estimate.iter().map(|v| v + by).collect() };
            Ok(crate::models::ReturnValueSet {
                lower: alpha.map(|_| shifted(-1.0)),
                upper: alpha.map(|_| shifted(1.0)),
                estimate: estimate.clone(),
            })
        }
    }

    #[derive(Clone, Default)]
    struct CountingFitter {
        calls: Arc<AtomicUsize>,
        fail: bool,
    }

    impl ModelFitter for CountingFitter {
        fn fit(
            &self,
            _config: &ModelConfig,
            _data: &[f64],
            distribution: &Distribution,
            _constraints: FitConstraints,
        ) -> Result<Box<dyn TailModel>, EvaError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EvaError::FitFailed {
                    distribution: distribution.to_string(),
                    reason: "stub".to_string(),
                });
            }
            Ok(Box::new(StubModel {
                distribution: distribution.clone(),
            }))
        }
    }

    fn stub_eva() -> (Eva, Arc<AtomicUsize>) {
        let fitter = CountingFitter::default();
        let calls = fitter.calls.clone();
        let signal = daily(&[1.0, 4.0, 2.0, 0.5, 3.0, 9.0, 2.0, 5.0]);
        (Eva::new(signal).with_fitter(fitter), calls)
    }

    #[test]
    fn operations_require_earlier_steps() {
        let (mut eva, calls) = stub_eva();
        let err = eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("get_extremes"));

        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("2D")).unwrap();
        let err = eva.get_return_value(10.0, "1D", None).unwrap_err();
        assert!(matches!(err, EvaError::NotFitted { .. }));
        assert!(err.to_string().contains("fit_model"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn incompatible_distribution_never_reaches_fitter() {
        let (mut eva, calls) = stub_eva();
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("2D")).unwrap();
        for name in ["genpareto", "expon"] {
            let err = eva.fit_model(ModelConfig::mle(), name.parse().unwrap()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Compatibility);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        eva.get_extremes(ExtremesType::High, ExtractionParams::peaks_over_threshold(2.5)).unwrap();
        for name in ["genextreme", "gumbel_r"] {
            let err = eva.fit_model(ModelConfig::mle(), name.parse().unwrap()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Compatibility);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        eva.fit_model(ModelConfig::mle(), Distribution::GenPareto).unwrap();
        eva.fit_model(ModelConfig::mle(), Distribution::Other("weibull_min".to_string()))
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn compatibility_table() {
        use ExtractionMethod::{BlockMaxima as Bm, PeaksOverThreshold as Pot};
        assert!(check_compatibility(Bm, &Distribution::GenExtreme).is_ok());
        assert!(check_compatibility(Bm, &Distribution::GumbelR).is_ok());
        assert!(check_compatibility(Pot, &Distribution::GenPareto).is_ok());
        assert!(check_compatibility(Pot, &Distribution::Expon).is_ok());
        let err = check_compatibility(Bm, &Distribution::GenPareto).unwrap_err();
        assert_eq!(
            err.to_string(),
            "genpareto distribution is only applicable to extremes extracted using the POT method \
             (extremes were extracted using BM)"
        );
    }

    #[test]
    fn new_extraction_discards_model() {
        let (mut eva, _) = stub_eva();
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("2D")).unwrap();
        eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();
        assert!(eva.model().is_some());

        eva.get_extremes(
            ExtremesType::High,
            ExtractionParams::block_maxima("4D").with_errors(EmptyBlockPolicy::Ignore),
        )
        .unwrap();
        assert!(eva.model().is_none());
        assert!(eva.model_config().is_none());
        assert_eq!(eva.extremes().unwrap().len(), 2);
    }

    #[test]
    fn failed_steps_keep_state() {
        let fitter = CountingFitter {
            fail: true,
            ..Default::default()
        };
        let mut eva = Eva::new(daily(&[1.0, 4.0, 2.0, 0.5])).with_fitter(fitter);
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("2D")).unwrap();
        assert!(eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).is_err());
        assert!(eva.extremes().is_some());
        assert!(eva.model().is_none());

        assert!(eva.get_extremes(ExtremesType::High, ExtractionParams::peaks_over_threshold(100.0)).is_err());
        assert_eq!(eva.extremes().unwrap().values(), &[4.0, 2.0]);
    }

    #[test]
    fn return_values_keep_request_shape() {
        let (mut eva, _) = stub_eva();
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("1D")).unwrap();
        eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();

        let single = eva.get_return_value(10.0, "1D", None).unwrap();
        assert!(single.is_scalar());
        let (estimate, lower, upper) = single.as_scalar().unwrap();
        assert!((estimate - 10f64.ln()).abs() < 1e-12);
        assert_eq!((lower, upper), (None, None));

        let many = eva.get_return_value([10.0, 50.0, 100.0], "1D", Some(0.95)).unwrap();
        assert!(!many.is_scalar());
        assert_eq!(many.exceedance_probabilities, vec![0.1, 0.02, 0.01]);
        assert_eq!(many.estimate.len(), 3);
        assert_eq!(many.lower.as_ref().unwrap().len(), 3);

        let err = eva.get_return_value([10.0, -1.0], "1D", None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Value);
    }

    #[test]
    fn too_short_period_is_nan_only_for_its_entry() {
        let (mut eva, _) = stub_eva();
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("1D")).unwrap();
        eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();

        let values = eva.get_return_value([0.5, 10.0], "1D", Some(0.95)).unwrap();
        assert_eq!(values.exceedance_probabilities, vec![2.0, 0.1]);
        assert!(values.estimate[0].is_nan());
        assert!((values.estimate[1] - 10f64.ln()).abs() < 1e-12);
        let (lower, upper) = (values.lower.unwrap(), values.upper.unwrap());
        assert!(lower[0].is_nan() && upper[0].is_nan());
        assert!((lower[1] - (10f64.ln() - 1.0)).abs() < 1e-12);
        assert!((upper[1] - (10f64.ln() + 1.0)).abs() < 1e-12);

        let table = eva.get_summary([0.5, 10.0], "1D", None).unwrap();
        assert_eq!(table.rows.len(), 2);
        assert!(table.rows[0].return_value.is_nan());
        assert!(table.rows[1].return_value.is_finite());

        let only_short = eva.get_return_value(0.25, "1D", Some(0.9)).unwrap();
        let (estimate, lower, upper) = only_short.as_scalar().unwrap();
        assert!(estimate.is_nan());
        assert!(lower.unwrap().is_nan() && upper.unwrap().is_nan());

        let err = eva.get_return_value(0.5, "1D", Some(1.5)).unwrap_err();
        assert!(matches!(err, EvaError::InvalidParameter { parameter: "alpha", .. }));
    }

    #[test]
    fn low_extremes_map_back_with_ordered_bounds() {
        let (mut eva, _) = stub_eva();
        eva.get_extremes(ExtremesType::Low, ExtractionParams::block_maxima("2D")).unwrap();
        assert_eq!(eva.extremes().unwrap().values(), &[1.0, 0.5, 2.0, 2.0]);
        eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();

        let rv = eva.get_return_value(10.0, "2D", Some(0.9)).unwrap();
        let (estimate, lower, upper) = rv.as_scalar().unwrap();
        assert!((estimate + 10f64.ln()).abs() < 1e-12);
        assert!(lower.unwrap() < estimate && estimate < upper.unwrap());
    }

    #[test]
    fn summary_rows_follow_input_order() {
        let (mut eva, _) = stub_eva();
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("1D")).unwrap();
        eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();
        let table = eva.get_summary([100.0, 2.0, 10.0], "1D", Some(0.95)).unwrap();
        let periods: Vec<f64> = table.rows.iter().map(|r| r.return_period).collect();
        assert_eq!(periods, vec![100.0, 2.0, 10.0]);
        assert!(table.rows.iter().all(|r| r.lower_ci.is_some() && r.upper_ci.is_some()));
    }

    #[test]
    fn probability_plot_pairs() {
        let (mut eva, _) = stub_eva();
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("2D")).unwrap();
        eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();

        let pp = eva.probability_plot_data(PlotKind::PP, "2D", PlottingPosition::Weibull).unwrap();
        assert_eq!(pp.observed.len(), 4);
        assert!(pp.observed.iter().chain(&pp.theoretical).all(|v| (0.0..=1.0).contains(v)));

        let qq = eva.probability_plot_data(PlotKind::QQ, "2D", PlottingPosition::Weibull).unwrap();
        assert_eq!(qq.observed, eva.extremes().unwrap().values());
        // Largest extreme has the smallest exceedance probability, 1/5.
        assert!((qq.theoretical[2] - 5f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn density_spans_extremes() {
        let (mut eva, _) = stub_eva();
        eva.get_extremes(ExtremesType::High, ExtractionParams::block_maxima("2D")).unwrap();
        eva.fit_model(ModelConfig::mle(), Distribution::GumbelR).unwrap();
        let density = eva.density_plot_data(5).unwrap();
        assert_eq!(density.support.first(), Some(&2.0));
        assert_eq!(density.support.last(), Some(&9.0));
        assert!((density.density[0] - (-2f64).exp()).abs() < 1e-12);
        assert!(eva.density_plot_data(1).is_err());
    }
}
