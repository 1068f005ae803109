//! One-sigma uncertainties of the fitted parameters
//!
//! Lifetime errors of the signal-only fit are produced by a [LifetimeErrorMethod]: either the
//! curvature of the minimizer's final parabola or an explicit NLL scan. Errors of the
//! two-parameter background fit come from the NLL contour, see [ContourErrors].

use crate::error::FitError;
use crate::likelihood::LikelihoodModel;
use crate::minimize::ParabolicResult;

use enum_dispatch::enum_dispatch;
use macro_const::macro_const;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

mod contour;
pub use contour::{ContourErrorResult, ContourErrors, partition_errors};

mod curvature;
pub use curvature::CurvatureError;

mod scan;
pub use scan::ScanError;

/// Errors on both sides of an estimate, both non-negative
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AsymmetricError {
    /// Distance from the estimate to the upper bound of the interval
    pub positive: f64,
    /// Distance from the estimate to the lower bound of the interval
    pub negative: f64,
}

impl AsymmetricError {
    pub fn symmetric(error: f64) -> Self {
        Self {
            positive: error,
            negative: error,
        }
    }

    pub fn mean(&self) -> f64 {
        0.5 * (self.positive + self.negative)
    }
}

impl Display for AsymmetricError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "+{} -{}", self.positive, self.negative)
    }
}

macro_const! {
    const LIFETIME_ERROR_DOC: &str = r"Lifetime uncertainty of the signal-only fit

Both methods use the NLL threshold convention: the one-sigma interval is where the NLL stays
within $1/2$ of its minimum.
";
}

#[doc = LIFETIME_ERROR_DOC!()]
#[enum_dispatch]
pub trait LifetimeErrorTrait {
    fn lifetime_error(
        &self,
        model: &LikelihoodModel<'_, '_>,
        fit: &ParabolicResult,
    ) -> Result<AsymmetricError, FitError>;
}

#[doc = LIFETIME_ERROR_DOC!()]
#[enum_dispatch(LifetimeErrorTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum LifetimeErrorMethod {
    Curvature(CurvatureError),
    Scan(ScanError),
}

impl LifetimeErrorMethod {
    pub fn curvature() -> Self {
        Self::Curvature(CurvatureError::new())
    }

    /// Scan with default bounds and threshold, panics unless `step` is positive and finite
    pub fn scan(step: f64) -> Self {
        Self::Scan(ScanError::new(
            step,
            ScanError::default_delta_nll(),
            ScanError::default_lower_factor(),
            ScanError::default_upper_factor(),
        ))
    }
}

impl Default for LifetimeErrorMethod {
    fn default() -> Self {
        Self::curvature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MeasurementSet;
    use crate::minimize::ParabolicMinimizer;

    use approx::assert_relative_eq;
    use decay_lifetime_test_util::decay_sample;

    #[test]
    fn mean_and_display() {
        let error = AsymmetricError {
            positive: 0.25,
            negative: 0.75,
        };
        assert_eq!(error.mean(), 0.5);
        assert_eq!(error.to_string(), "+0.25 -0.75");
        assert_eq!(AsymmetricError::symmetric(0.1).mean(), 0.1);
    }

    #[test]
    fn methods_agree_on_decay_sample() {
        let (t, err) = decay_sample(5_000, 0.41, 0.28, 1.0, 3);
        let data = MeasurementSet::new(t, err).unwrap();
        let model = LikelihoodModel::new(&data);
        let fit = ParabolicMinimizer::default()
            .minimize(|tau| model.nll(tau))
            .unwrap();

        let curvature = LifetimeErrorMethod::curvature()
            .lifetime_error(&model, &fit)
            .unwrap();
        let scan = LifetimeErrorMethod::scan(1e-5)
            .lifetime_error(&model, &fit)
            .unwrap();
        assert_eq!(curvature.positive, curvature.negative);
        assert_relative_eq!(curvature.mean(), scan.mean(), max_relative = 0.2);
    }

    #[test]
    fn serialization_is_tagged() {
        let method = LifetimeErrorMethod::scan(1e-4);
        let json = serde_json::to_string(&method).unwrap();
        assert!(json.starts_with(r#"{"Scan":"#), "{json}");
        let decoded: LifetimeErrorMethod = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, method);

        let zero_step = json.replace("0.0001", "0.0");
        assert_ne!(zero_step, json);
        assert!(serde_json::from_str::<LifetimeErrorMethod>(&zero_step).is_err());
    }
}
