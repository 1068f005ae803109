use crate::error::FitError;
use crate::likelihood::LikelihoodModel;
use crate::minimize::ParabolicResult;
use crate::uncertainty::{AsymmetricError, LifetimeErrorTrait};

use conv::ConvAsUtil;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One-sigma lifetime errors from walking away from the minimum until the NLL rises by
/// `delta_nll`
///
/// The positive side visits $\tau_\mathrm{min} + k \cdot \mathrm{step}$ for
/// $k = 0, 1, \dots$ while below `upper_factor` $\tau_\mathrm{min}$, the negative side
/// $\tau_\mathrm{min} - k \cdot \mathrm{step}$ while above `lower_factor` $\tau_\mathrm{min}$. The
/// error is the distance to the last visited point whose NLL doesn't exceed
/// $\mathrm{NLL}(\tau_\mathrm{min}) + \Delta$. The number of NLL evaluations is the range divided
/// by `step`.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Scan", try_from = "ScanErrorParameters")]
pub struct ScanError {
    pub step: f64,
    pub delta_nll: f64,
    pub lower_factor: f64,
    pub upper_factor: f64,
}

impl ScanError {
    /// Create a new [ScanError]
    ///
    /// # Arguments
    /// - `step`: scan increment in units of `tau`
    /// - `delta_nll`: NLL rise defining the interval, `0.5` for one sigma
    /// - `lower_factor`: lower scan bound as a fraction of `tau_min`, in `(0, 1)`
    /// - `upper_factor`: upper scan bound as a multiple of `tau_min`, above unity
    ///
    /// # Panics
    /// If any argument breaks the requirements listed above, see [ScanError::check]
    pub fn new(step: f64, delta_nll: f64, lower_factor: f64, upper_factor: f64) -> Self {
        let scan = Self {
            step,
            delta_nll,
            lower_factor,
            upper_factor,
        };
        if let Err(err) = scan.check() {
            panic!("{err}");
        }
        scan
    }

    /// Check the parameters, fields are public and could be changed after [ScanError::new]
    pub fn check(&self) -> Result<(), FitError> {
        FitError::require(
            self.step > 0.0 && self.step.is_finite(),
            "step",
            "must be positive and finite",
        )?;
        FitError::require(
            self.delta_nll > 0.0 && self.delta_nll.is_finite(),
            "delta_nll",
            "must be positive and finite",
        )?;
        FitError::require(
            self.lower_factor > 0.0 && self.lower_factor < 1.0,
            "lower_factor",
            "must be within (0, 1)",
        )?;
        FitError::require(
            self.upper_factor > 1.0 && self.upper_factor.is_finite(),
            "upper_factor",
            "must be finite and above unity",
        )
    }

    #[inline]
    pub fn default_step() -> f64 {
        1e-5
    }

    #[inline]
    pub fn default_delta_nll() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_lower_factor() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_upper_factor() -> f64 {
        2.0
    }

    /// Scan both sides of `tau_min`
    pub fn scan<F>(&self, tau_min: f64, mut f: F) -> Result<AsymmetricError, FitError>
    where
        F: FnMut(f64) -> Result<f64, FitError>,
    {
        self.check()?;
        let nll_min = f(tau_min)?;
        if !nll_min.is_finite() {
            return Err(FitError::NonFiniteNll {
                value: nll_min,
                point: vec![tau_min],
            });
        }
        let threshold = nll_min + self.delta_nll;
        Ok(AsymmetricError {
            positive: self.walk(tau_min, self.upper_factor * tau_min, threshold, &mut f)?,
            negative: self.walk(tau_min, self.lower_factor * tau_min, threshold, &mut f)?,
        })
    }

    /// Walk from `tau_min` towards `bound` and return the distance to the last accepted point
    fn walk<F>(&self, tau_min: f64, bound: f64, threshold: f64, f: &mut F) -> Result<f64, FitError>
    where
        F: FnMut(f64) -> Result<f64, FitError>,
    {
        let direction = (bound - tau_min).signum();
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let steps = ((bound - tau_min).abs() / self.step).ceil() as usize;

        let mut last = tau_min;
        for k in 0..steps {
            let k: f64 = k.approx().unwrap();
            let tau = tau_min + direction * k * self.step;
            if f(tau)? > threshold {
                return Ok(f64::abs(last - tau_min));
            }
            last = tau;
        }
        log::warn!(
            "NLL stays within {} of its minimum between tau = {tau_min} and the scan bound {bound}",
            self.delta_nll
        );
        Ok(f64::abs(last - tau_min))
    }
}

impl Default for ScanError {
    fn default() -> Self {
        Self::new(
            Self::default_step(),
            Self::default_delta_nll(),
            Self::default_lower_factor(),
            Self::default_upper_factor(),
        )
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename = "Scan")]
struct ScanErrorParameters {
    step: f64,
    delta_nll: f64,
    lower_factor: f64,
    upper_factor: f64,
}

impl TryFrom<ScanErrorParameters> for ScanError {
    type Error = FitError;

    fn try_from(p: ScanErrorParameters) -> Result<Self, Self::Error> {
        let scan = Self {
            step: p.step,
            delta_nll: p.delta_nll,
            lower_factor: p.lower_factor,
            upper_factor: p.upper_factor,
        };
        scan.check()?;
        Ok(scan)
    }
}

impl LifetimeErrorTrait for ScanError {
    fn lifetime_error(
        &self,
        model: &LikelihoodModel<'_, '_>,
        fit: &ParabolicResult,
    ) -> Result<AsymmetricError, FitError> {
        self.scan(fit.x_min, |tau| model.nll(tau))
    }
}
