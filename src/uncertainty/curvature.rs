use crate::error::FitError;
use crate::likelihood::LikelihoodModel;
use crate::minimize::ParabolicResult;
use crate::uncertainty::{AsymmetricError, LifetimeErrorTrait};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Symmetric lifetime error from the curvature of the minimizer's final parabola
///
/// See [crate::minimize::Parabola::curvature_error]. No extra NLL evaluations are needed.
#[derive(Clone, Default, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Curvature")]
pub struct CurvatureError {}

impl CurvatureError {
    pub fn new() -> Self {
        Self {}
    }
}

impl LifetimeErrorTrait for CurvatureError {
    fn lifetime_error(
        &self,
        _model: &LikelihoodModel<'_, '_>,
        fit: &ParabolicResult,
    ) -> Result<AsymmetricError, FitError> {
        fit.parabola.curvature_error().map(AsymmetricError::symmetric)
    }
}
