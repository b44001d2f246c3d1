//! Error types.
//!
//! The library reports failures through [`EvaError`]. Every variant belongs to
//! exactly one [`ErrorKind`], so callers can branch on the broad category
//! (bad input, wrong call order, incompatible model, ...) without matching
//! on individual variants.
//!
//! The binary wraps library errors in [`AppError`], which carries a process
//! exit code.

use chrono::NaiveDateTime;

/// Broad error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input has the wrong shape or type (non-date index, non-numeric values).
    Type,
    /// Input has the right type but an unacceptable value.
    Value,
    /// An operation was called before the step it depends on.
    Precondition,
    /// The distribution family does not match the extraction method.
    Compatibility,
    /// The model collaborator failed to fit or evaluate.
    Fit,
    /// Internal invariant violated. Always a bug.
    Internal,
}

/// Error type for all fallible operations of the analysis pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvaError {
    /// A timestamp cell could not be read as a date/time.
    #[error("index of data must be a sequence of date-time objects: row {row} has '{value}'")]
    InvalidIndex {
        /// Zero-based input row.
        row: usize,
        /// Offending cell text.
        value: String,
    },

    /// A value cell could not be read as a number.
    #[error("data must be numeric: row {row} has '{value}'")]
    NonNumeric {
        /// Zero-based input row.
        row: usize,
        /// Offending cell text.
        value: String,
    },

    /// Return periods given in a form that is neither a number nor a list of numbers.
    #[error("invalid return period input '{input}': expected a number or a comma-separated list of numbers")]
    InvalidReturnPeriodInput {
        /// Offending input.
        input: String,
    },

    /// No valid observation is left after cleaning.
    #[error("signal '{name}' has no valid observations")]
    EmptySignal {
        /// Signal label.
        name: String,
    },

    /// A value outside a closed set of allowed names.
    #[error("'{value}' is not a valid '{parameter}' value. Available values: {allowed}")]
    InvalidValue {
        /// Parameter name.
        parameter: &'static str,
        /// Offending value.
        value: String,
        /// Comma-separated list of allowed values.
        allowed: String,
    },

    /// A duration string that cannot be parsed, or a non-positive duration.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration {
        /// Offending input.
        value: String,
        /// Description of the problem.
        reason: String,
    },

    /// A mandatory extraction parameter was not supplied.
    #[error("'{parameter}' must be provided for the {method} method")]
    MissingParameter {
        /// Extraction method label.
        method: &'static str,
        /// Missing parameter name.
        parameter: &'static str,
    },

    /// A block without data while empty blocks are configured to raise.
    #[error("no data in block [{start}, {end})")]
    EmptyBlock {
        /// Inclusive block start.
        start: NaiveDateTime,
        /// Exclusive block end.
        end: NaiveDateTime,
    },

    /// Extraction produced no extreme events.
    #[error("no extreme events found: {reason}")]
    NoExtremes {
        /// Description of the problem.
        reason: String,
    },

    /// A numeric parameter outside its valid range.
    #[error("invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// Parameter name.
        parameter: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// An exceedance probability outside `(0, 1]`.
    #[error("exceedance probability {probability} is outside (0, 1]")]
    InvalidProbability {
        /// Offending probability.
        probability: f64,
    },

    /// Too few extremes to fit the requested distribution.
    #[error("insufficient data: {n} extreme values, at least {min} required")]
    InsufficientData {
        /// Number of values supplied.
        n: usize,
        /// Minimum required.
        min: usize,
    },

    /// Fitting was requested before extraction.
    #[error("extreme values must be extracted before {operation}, use get_extremes first")]
    NotExtracted {
        /// Operation that needed the extremes.
        operation: &'static str,
    },

    /// A model-dependent output was requested before fitting.
    #[error("a model must be fit before {operation}, use fit_model first")]
    NotFitted {
        /// Operation that needed the model.
        operation: &'static str,
    },

    /// The distribution family does not match the extraction method.
    #[error("{distribution} distribution is only applicable to extremes extracted using the {required} method (extremes were extracted using {actual})")]
    IncompatibleDistribution {
        /// Distribution name.
        distribution: String,
        /// Extraction method the distribution requires.
        required: &'static str,
        /// Extraction method actually used.
        actual: &'static str,
    },

    /// The fitter does not implement the requested distribution.
    #[error("distribution '{name}' is not supported by the {model} model")]
    UnsupportedDistribution {
        /// Distribution name.
        name: String,
        /// Model kind name.
        model: &'static str,
    },

    /// The fitting routine failed (non-convergence, degenerate data).
    #[error("fitting {distribution} failed: {reason}")]
    FitFailed {
        /// Distribution name.
        distribution: String,
        /// Description of the failure.
        reason: String,
    },

    /// Internal invariant violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EvaError {
    /// Broad category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvaError::InvalidIndex { .. }
            | EvaError::NonNumeric { .. }
            | EvaError::InvalidReturnPeriodInput { .. } => ErrorKind::Type,
            EvaError::EmptySignal { .. }
            | EvaError::InvalidValue { .. }
            | EvaError::InvalidDuration { .. }
            | EvaError::MissingParameter { .. }
            | EvaError::EmptyBlock { .. }
            | EvaError::NoExtremes { .. }
            | EvaError::InvalidParameter { .. }
            | EvaError::InvalidProbability { .. }
            | EvaError::InsufficientData { .. } => ErrorKind::Value,
            EvaError::NotExtracted { .. } | EvaError::NotFitted { .. } => ErrorKind::Precondition,
            EvaError::IncompatibleDistribution { .. } => ErrorKind::Compatibility,
            EvaError::UnsupportedDistribution { .. } | EvaError::FitFailed { .. } => ErrorKind::Fit,
            EvaError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Error surfaced by the `eva` binary, with the process exit code to use.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<EvaError> for AppError {
    fn from(err: EvaError) -> Self {
        // 2: bad input, 3: unusable data, 4: modelling failure, 5: bug.
        let exit_code = match err.kind() {
            ErrorKind::Type => 2,
            ErrorKind::Value | ErrorKind::Precondition => 3,
            ErrorKind::Compatibility | ErrorKind::Fit => 4,
            ErrorKind::Internal => 5,
        };
        AppError::new(exit_code, err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
