//! Lifetime error as a function of the number of measurements

use crate::data::MeasurementSet;
use crate::error::FitError;
use crate::likelihood::LikelihoodModel;
use crate::minimize::ParabolicMinimizer;
use crate::straight_line_fit::{StraightLineFitterResult, fit_straight_line};
use crate::uncertainty::{AsymmetricError, LifetimeErrorMethod, LifetimeErrorTrait};

use conv::ConvAsUtil;
use ndarray::Array1;
use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fit the lifetime on growing prefixes of a measurement set
///
/// Every subset size gets an independent [ParabolicMinimizer] fit of the signal-only NLL and a
/// lifetime error from `error`. Fits run in parallel on the `rayon` thread pool, each on a
/// zero-copy prefix of the same measurement set.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(try_from = "SizeSweepParameters")]
pub struct SizeSweep {
    pub sizes: Vec<usize>,
    pub minimizer: ParabolicMinimizer,
    pub error: LifetimeErrorMethod,
}

/// Fit of a single subset size
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SweepPoint {
    pub size: usize,
    pub tau: f64,
    pub error: AsymmetricError,
}

/// Output of [SizeSweep::run], ordered by increasing subset size
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SweepResult {
    pub points: Vec<SweepPoint>,
}

impl SizeSweep {
    /// Sweep over `sizes` which must be strictly increasing and positive
    pub fn new(
        sizes: Vec<usize>,
        minimizer: ParabolicMinimizer,
        error: LifetimeErrorMethod,
    ) -> Self {
        let sweep = Self {
            sizes,
            minimizer,
            error,
        };
        if let Err(err) = sweep.check() {
            panic!("{err}");
        }
        sweep
    }

    pub fn check(&self) -> Result<(), FitError> {
        FitError::require(
            self.sizes.first().is_none_or(|&size| size > 0),
            "sizes",
            "must be positive",
        )?;
        FitError::require(
            self.sizes.windows(2).all(|w| w[0] < w[1]),
            "sizes",
            "must be strictly increasing",
        )?;
        self.minimizer.check()
    }

    /// Sizes `lower, lower + step, ...` up to and including `upper`
    pub fn from_range(lower: usize, upper: usize, step: usize) -> Self {
        assert!(step > 0, "step must be positive");
        Self::new(
            (lower..=upper).step_by(step).collect(),
            ParabolicMinimizer::default(),
            LifetimeErrorMethod::default(),
        )
    }

    #[inline]
    pub fn default_lower() -> usize {
        1000
    }

    #[inline]
    pub fn default_upper() -> usize {
        10_000
    }

    #[inline]
    pub fn default_step() -> usize {
        100
    }

    pub fn run(&self, data: &MeasurementSet) -> Result<SweepResult, FitError> {
        self.check()?;
        if let Some(&size) = self.sizes.iter().find(|&&size| size > data.len()) {
            return Err(FitError::SubsetTooLarge {
                size,
                available: data.len(),
            });
        }
        let points = self
            .sizes
            .par_iter()
            .map(|&size| self.fit_prefix(data, size))
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("size sweep fitted {} subsets", points.len());
        Ok(SweepResult { points })
    }

    fn fit_prefix(&self, data: &MeasurementSet, size: usize) -> Result<SweepPoint, FitError> {
        let subset = data
            .prefix(size)
            .map_err(|_| FitError::SubsetTooLarge {
                size,
                available: data.len(),
            })?;
        let model = LikelihoodModel::new(&subset);
        let fit = self.minimizer.minimize(|tau| model.nll(tau))?;
        let error = self.error.lifetime_error(&model, &fit)?;
        log::debug!("subset of {size}: tau = {}, error = {error}", fit.x_min);
        Ok(SweepPoint {
            size,
            tau: fit.x_min,
            error,
        })
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename = "SizeSweep")]
struct SizeSweepParameters {
    sizes: Vec<usize>,
    minimizer: ParabolicMinimizer,
    error: LifetimeErrorMethod,
}

impl TryFrom<SizeSweepParameters> for SizeSweep {
    type Error = FitError;

    fn try_from(p: SizeSweepParameters) -> Result<Self, Self::Error> {
        let sweep = Self {
            sizes: p.sizes,
            minimizer: p.minimizer,
            error: p.error,
        };
        sweep.check()?;
        Ok(sweep)
    }
}

impl Default for SizeSweep {
    fn default() -> Self {
        Self::from_range(
            Self::default_lower(),
            Self::default_upper(),
            Self::default_step(),
        )
    }
}

impl SweepResult {
    pub fn sizes(&self) -> Vec<usize> {
        self.points.iter().map(|point| point.size).collect()
    }

    /// Mean of the positive and negative errors for every size
    pub fn mean_errors(&self) -> Vec<f64> {
        self.points.iter().map(|point| point.error.mean()).collect()
    }

    /// Straight line through $(\lg N, \lg \sigma)$
    ///
    /// Points with a non-positive error are skipped. The slope is close to $-1/2$ for a
    /// well-behaved likelihood.
    pub fn log_log_fit(&self) -> Result<StraightLineFitterResult, FitError> {
        let (lg_size, lg_error): (Vec<f64>, Vec<f64>) = self
            .points
            .iter()
            .filter(|point| {
                let positive = point.error.mean() > 0.0;
                if !positive {
                    log::warn!("subset of {} has zero lifetime error, skipping it", point.size);
                }
                positive
            })
            .map(|point| {
                let size: f64 = point.size.approx().unwrap();
                (size.log10(), point.error.mean().log10())
            })
            .unzip();
        if lg_size.len() < 2 {
            return Err(FitError::EmptySweep(lg_size.len()));
        }
        Ok(fit_straight_line(
            Array1::from(lg_size).view(),
            Array1::from(lg_error).view(),
        ))
    }

    /// Number of measurements at which the extrapolated error reaches `target_error`
    ///
    /// Fails with [FitError::NonNegativeSlope] if the errors do not decrease with size.
    pub fn required_size(&self, target_error: f64) -> Result<f64, FitError> {
        FitError::require(
            target_error > 0.0 && target_error.is_finite(),
            "target_error",
            "must be positive and finite",
        )?;
        let line = self.log_log_fit()?;
        required_size(&line, target_error)
    }
}

fn required_size(line: &StraightLineFitterResult, target_error: f64) -> Result<f64, FitError> {
    // NaN slope fails too
    if line.slope < 0.0 {
        Ok(10_f64.powf((target_error.log10() - line.intercept) / line.slope))
    } else {
        Err(FitError::NonNegativeSlope(line.slope))
    }
}
