use crate::error::FitError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Result of [GradientDescent::minimize]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct GradientResult {
    /// Function value at the last point
    pub nll: f64,
    pub tau: f64,
    pub a: f64,
    pub iterations: usize,
}

/// Fixed learning-rate gradient descent over `(tau, a)` with forward-difference derivatives
///
/// Partial derivatives are $(L(\tau + h, a) - L(\tau, a)) / h$ and likewise for $a$; each step
/// moves by `learning_rate` times the negative gradient. The descent stops when two successive
/// function values differ by no more than `tolerance`.
///
/// The parameters are not bounded. If the walk leaves the domain of the function, the
/// function's error is returned.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "GradientDescent", try_from = "GradientDescentParameters")]
pub struct GradientDescent {
    pub step: f64,
    pub learning_rate: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl GradientDescent {
    /// Create a new [GradientDescent]
    ///
    /// # Arguments
    /// - `step`: finite-difference step `h`
    /// - `learning_rate`: gradient multiplier `alpha`
    /// - `tolerance`: convergence tolerance on the function value
    /// - `max_iterations`: maximum number of descent steps
    pub fn new(step: f64, learning_rate: f64, tolerance: f64, max_iterations: usize) -> Self {
        let descent = Self {
            step,
            learning_rate,
            tolerance,
            max_iterations,
        };
        if let Err(err) = descent.check() {
            panic!("{err}");
        }
        descent
    }

    pub fn check(&self) -> Result<(), FitError> {
        for (name, value) in [
            ("step", self.step),
            ("learning_rate", self.learning_rate),
            ("tolerance", self.tolerance),
        ] {
            FitError::require(
                value > 0.0 && value.is_finite(),
                name,
                "must be positive and finite",
            )?;
        }
        FitError::require(
            self.max_iterations > 0,
            "max_iterations",
            "must be positive",
        )
    }

    #[inline]
    pub fn default_step() -> f64 {
        1e-5
    }

    #[inline]
    pub fn default_learning_rate() -> f64 {
        1e-5
    }

    #[inline]
    pub fn default_tolerance() -> f64 {
        1e-5
    }

    #[inline]
    pub fn default_max_iterations() -> usize {
        1_000_000
    }

    /// Forward-difference gradient at `(tau, a)` where the function value is `value`
    fn gradient<F>(&self, f: &mut F, tau: f64, a: f64, value: f64) -> Result<[f64; 2], FitError>
    where
        F: FnMut(f64, f64) -> Result<f64, FitError>,
    {
        let h = self.step;
        Ok([(f(tau + h, a)? - value) / h, (f(tau, a + h)? - value) / h])
    }

    pub fn minimize<F>(&self, start: [f64; 2], mut f: F) -> Result<GradientResult, FitError>
    where
        F: FnMut(f64, f64) -> Result<f64, FitError>,
    {
        self.check()?;
        let [mut tau, mut a] = start;
        let mut value = finite(f(tau, a)?, tau, a)?;

        for iteration in 1..=self.max_iterations {
            let [d_tau, d_a] = self.gradient(&mut f, tau, a, value)?;
            let next_tau = tau - self.learning_rate * d_tau;
            let next_a = a - self.learning_rate * d_a;
            let next_value = finite(f(next_tau, next_a)?, next_tau, next_a)?;

            let difference = f64::abs(next_value - value);
            tau = next_tau;
            a = next_a;
            value = next_value;

            if difference <= self.tolerance {
                log::debug!(
                    "gradient descent converged to tau = {tau}, a = {a}, value = {value} in {iteration} iterations"
                );
                return Ok(GradientResult {
                    nll: value,
                    tau,
                    a,
                    iterations: iteration,
                });
            }
        }
        Err(FitError::MaxIterations {
            iterations: self.max_iterations,
        })
    }
}

impl Default for GradientDescent {
    fn default() -> Self {
        Self::new(
            Self::default_step(),
            Self::default_learning_rate(),
            Self::default_tolerance(),
            Self::default_max_iterations(),
        )
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename = "GradientDescent")]
struct GradientDescentParameters {
    step: f64,
    learning_rate: f64,
    tolerance: f64,
    max_iterations: usize,
}

impl TryFrom<GradientDescentParameters> for GradientDescent {
    type Error = FitError;

    fn try_from(p: GradientDescentParameters) -> Result<Self, Self::Error> {
        let descent = Self {
            step: p.step,
            learning_rate: p.learning_rate,
            tolerance: p.tolerance,
            max_iterations: p.max_iterations,
        };
        descent.check()?;
        Ok(descent)
    }
}

fn finite(value: f64, tau: f64, a: f64) -> Result<f64, FitError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FitError::NonFiniteNll {
            value,
            point: vec![tau, a],
        })
    }
}
