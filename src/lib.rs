#![doc = include_str!("../README.md")]

pub mod analysis;
pub use analysis::{
    BackgroundReport, LifetimeAnalysis, LifetimeReport, SignalReport, SweepSummary,
};

mod array_stats;

pub mod contour;
pub use contour::{ContourLine, contour_lines};

mod data;
pub use data::{
    MeasurementSet, SortedArray, read_measurements, read_measurements_from_path,
    write_measurements,
};

mod error;
pub use error::{AnalysisError, DataError, FitError};

pub mod grid;
pub use grid::{nll_curve, nll_surface};

pub mod likelihood;
pub use likelihood::{LikelihoodModel, gaussian_bkg, pdf_no_bkg, pdf_with_bkg};

pub mod minimize;
pub use minimize::{
    GradientDescent, GradientResult, Parabola, ParabolicMinimizer, ParabolicResult,
};

mod straight_line_fit;
#[doc(hidden)]
pub use straight_line_fit::{StraightLineFitterResult, fit_straight_line};

pub mod sweep;
pub use sweep::{SizeSweep, SweepPoint, SweepResult};

mod types;

pub mod uncertainty;
pub use uncertainty::{
    AsymmetricError, ContourErrorResult, ContourErrors, CurvatureError, LifetimeErrorMethod,
    LifetimeErrorTrait, ScanError,
};

pub use ndarray;
