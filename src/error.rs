/// Error returned while building or reading a [crate::MeasurementSet]
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("line {line}: expected two whitespace-separated fields `time error`, found {found}")]
    MissingField { line: usize, found: usize },

    #[error("line {line}: cannot parse {token:?} as a floating-point number")]
    InvalidNumber { line: usize, token: String },

    #[error("measurement set is empty")]
    Empty,

    #[error("times and uncertainties have different lengths: {times} != {uncertainties}")]
    LengthMismatch { times: usize, uncertainties: usize },

    #[error("measurement {index} has non-finite time {value}")]
    InvalidTime { index: usize, value: f64 },

    #[error("measurement {index} has invalid uncertainty {value}, it must be finite and non-negative")]
    InvalidUncertainty { index: usize, value: f64 },

    #[error("prefix of {requested} measurements requested, but only {available} are available")]
    PrefixTooLong { requested: usize, available: usize },

    #[error("line {line}: {source}")]
    ReadLine {
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Error returned from likelihood evaluation, minimizers and error estimators
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum FitError {
    #[error("lifetime must be positive, got tau = {0}")]
    NonPositiveLifetime(f64),

    #[error("signal fraction must be within [0, 1], got a = {0}")]
    SignalFractionOutOfRange(f64),

    #[error("degenerate parabola: {0}")]
    DegenerateParabola(&'static str),

    #[error("NLL is not finite ({value}) at {point:?}")]
    NonFiniteNll { value: f64, point: Vec<f64> },

    #[error("parabolic search stalled at x = {x}: the new point does not improve the worst one")]
    Stalled { x: f64 },

    #[error("no convergence after {iterations} iterations")]
    MaxIterations { iterations: usize },

    #[error("no contour at level {level} inside the supplied grid")]
    NoContour { level: f64 },

    #[error("contour has no points {side} the {parameter} estimate")]
    EmptyPartition {
        parameter: &'static str,
        side: &'static str,
    },

    #[error("grid along {axis} must have at least two points, got {len}")]
    ShortGrid { axis: &'static str, len: usize },

    #[error("subset size {size} exceeds the measurement set length {available}")]
    SubsetTooLarge { size: usize, available: usize },

    #[error("size sweep needs at least two subset sizes, got {0}")]
    EmptySweep(usize),

    #[error("lifetime error does not fall with the number of measurements, log-log slope is {0}")]
    NonNegativeSlope(f64),

    #[error("{name} {requirement}")]
    InvalidParameter {
        name: &'static str,
        requirement: &'static str,
    },
}

impl FitError {
    pub(crate) fn require(
        condition: bool,
        name: &'static str,
        requirement: &'static str,
    ) -> Result<(), Self> {
        if condition {
            Ok(())
        } else {
            Err(Self::InvalidParameter { name, requirement })
        }
    }
}

/// Error returned from [crate::LifetimeAnalysis]
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("data error: {0}")]
    Data(#[from] DataError),

    #[error("{stage} failed: {error}")]
    Fit {
        stage: &'static str,
        #[source]
        error: FitError,
    },
}

impl AnalysisError {
    pub(crate) fn fit(stage: &'static str) -> impl FnOnce(FitError) -> Self {
        move |error| Self::Fit { stage, error }
    }
}
