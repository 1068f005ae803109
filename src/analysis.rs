//! The complete lifetime measurement: both fits, their errors and the size sweep

use crate::data::MeasurementSet;
use crate::error::AnalysisError;
use crate::likelihood::LikelihoodModel;
use crate::minimize::{GradientDescent, ParabolicMinimizer};
use crate::sweep::{SizeSweep, SweepResult};
use crate::uncertainty::{
    AsymmetricError, ContourErrors, CurvatureError, LifetimeErrorTrait, ScanError,
};

use conv::{ConvAsUtil, RoundToNearest};
use ndarray::Array1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Configuration of [LifetimeAnalysis::run]
///
/// Every field has a default, so a partial JSON object is a valid configuration.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct LifetimeAnalysis {
    /// Signal-only fit
    pub minimizer: ParabolicMinimizer,
    /// Asymmetric errors of the signal-only fit
    pub scan: ScanError,
    /// Optional error versus subset size study
    pub sweep: Option<SizeSweep>,
    /// Target lifetime error for the sweep extrapolation
    pub target_error: f64,
    /// Signal plus background fit
    pub gradient: GradientDescent,
    /// Starting `[tau, a]` of the signal plus background fit
    pub background_start: [f64; 2],
    pub contour: ContourErrors,
    /// Contour grid spans the fitted `tau` plus minus this value
    pub contour_tau_half_width: f64,
    /// Contour grid starts this far below the fitted `a`
    pub contour_a_margin: f64,
    /// Upper `a` of the contour grid
    pub contour_a_max: f64,
    /// Number of grid points along each axis
    pub contour_points: usize,
}

impl LifetimeAnalysis {
    #[inline]
    pub fn default_target_error() -> f64 {
        1e-3
    }

    #[inline]
    pub fn default_background_start() -> [f64; 2] {
        [0.4, 0.9]
    }

    #[inline]
    pub fn default_contour_tau_half_width() -> f64 {
        0.05
    }

    #[inline]
    pub fn default_contour_a_margin() -> f64 {
        0.05
    }

    #[inline]
    pub fn default_contour_a_max() -> f64 {
        0.999
    }

    #[inline]
    pub fn default_contour_points() -> usize {
        100
    }

    pub fn run(&self, data: &MeasurementSet) -> Result<LifetimeReport, AnalysisError> {
        log::info!(
            "analysing {} measurements with mean uncertainty {}",
            data.len(),
            data.mean_sigma()
        );
        let model = LikelihoodModel::new(data);
        let signal = self.signal_fit(&model)?;
        let sweep = self.sweep_summary(data)?;
        let background = self.background_fit(&model)?;
        Ok(LifetimeReport {
            size: data.len(),
            sigma: model.sigma(),
            signal,
            sweep,
            background,
        })
    }

    fn signal_fit(&self, model: &LikelihoodModel<'_, '_>) -> Result<SignalReport, AnalysisError> {
        log::info!("fitting signal-only model");
        let fit = self
            .minimizer
            .minimize(|tau| model.nll(tau))
            .map_err(AnalysisError::fit("signal-only fit"))?;
        let scan_error = self
            .scan
            .lifetime_error(model, &fit)
            .map_err(AnalysisError::fit("NLL scan"))?;
        let curvature_error = CurvatureError::new()
            .lifetime_error(model, &fit)
            .map_err(AnalysisError::fit("parabola curvature"))?
            .mean();
        let pdf_area = model
            .pdf_area(fit.x_min)
            .map_err(AnalysisError::fit("signal PDF area"))?;
        Ok(SignalReport {
            tau: fit.x_min,
            nll_min: fit.y_min,
            scan_error,
            curvature_error,
            pdf_area,
            iterations: fit.iterations,
        })
    }

    fn sweep_summary(&self, data: &MeasurementSet) -> Result<Option<SweepSummary>, AnalysisError> {
        let Some(sweep) = &self.sweep else {
            return Ok(None);
        };
        log::info!("running size sweep over {} subsets", sweep.sizes.len());
        let result = sweep.run(data).map_err(AnalysisError::fit("size sweep"))?;
        let line = result
            .log_log_fit()
            .map_err(AnalysisError::fit("size sweep extrapolation"))?;
        let required_size = result
            .required_size(self.target_error)
            .map_err(AnalysisError::fit("size sweep extrapolation"))?;
        Ok(Some(SweepSummary {
            result,
            slope: line.slope,
            slope_error: line.slope_sigma2.sqrt(),
            reduced_chi2: line.reduced_chi2,
            intercept: line.intercept,
            target_error: self.target_error,
            required_size,
        }))
    }

    fn background_fit(
        &self,
        model: &LikelihoodModel<'_, '_>,
    ) -> Result<BackgroundReport, AnalysisError> {
        log::info!(
            "fitting signal plus background model from (tau, a) = {:?}",
            self.background_start
        );
        let fit = self
            .gradient
            .minimize(self.background_start, |tau, a| model.nll_with_bkg(tau, a))
            .map_err(AnalysisError::fit("signal plus background fit"))?;

        let taus = Array1::<f64>::linspace(
            fit.tau - self.contour_tau_half_width,
            fit.tau + self.contour_tau_half_width,
            self.contour_points,
        );
        let signal_fractions = Array1::<f64>::linspace(
            f64::max(fit.a - self.contour_a_margin, 0.0),
            self.contour_a_max,
            self.contour_points,
        );
        let errors = self
            .contour
            .estimate_for_model(model, taus.view(), signal_fractions.view(), &fit)
            .map_err(AnalysisError::fit("contour errors"))?;
        let pdf_area = model
            .pdf_with_bkg_area(fit.tau, fit.a)
            .map_err(AnalysisError::fit("signal plus background PDF area"))?;

        // the likelihood rejects a outside [0, 1], so the count is within [0, len]
        let background_fraction = 1.0 - fit.a;
        let size: f64 = model.data().len().approx().unwrap();
        let background_count: usize = (background_fraction * size)
            .approx_by::<RoundToNearest>()
            .expect("background fraction must be within [0, 1]");
        Ok(BackgroundReport {
            tau: fit.tau,
            a: fit.a,
            nll_min: fit.nll,
            tau_error: errors.tau,
            a_error: errors.a,
            pdf_area,
            background_fraction,
            background_count,
            iterations: fit.iterations,
        })
    }
}

impl Default for LifetimeAnalysis {
    fn default() -> Self {
        Self {
            minimizer: ParabolicMinimizer::default(),
            scan: ScanError::default(),
            sweep: None,
            target_error: Self::default_target_error(),
            gradient: GradientDescent::default(),
            background_start: Self::default_background_start(),
            contour: ContourErrors::default(),
            contour_tau_half_width: Self::default_contour_tau_half_width(),
            contour_a_margin: Self::default_contour_a_margin(),
            contour_a_max: Self::default_contour_a_max(),
            contour_points: Self::default_contour_points(),
        }
    }
}

/// Signal-only fit
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SignalReport {
    pub tau: f64,
    pub nll_min: f64,
    pub scan_error: AsymmetricError,
    pub curvature_error: f64,
    /// Trapezoid area of the fitted PDF over the sorted times
    pub pdf_area: f64,
    pub iterations: usize,
}

/// Signal plus background fit
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct BackgroundReport {
    pub tau: f64,
    pub a: f64,
    pub nll_min: f64,
    pub tau_error: AsymmetricError,
    pub a_error: AsymmetricError,
    pub pdf_area: f64,
    /// `1 - a`
    pub background_fraction: f64,
    /// Background fraction times the number of measurements, rounded
    pub background_count: usize,
    pub iterations: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct SweepSummary {
    pub result: SweepResult,
    /// Slope of the error in log-log scale
    pub slope: f64,
    /// Standard error of the slope, zero for two sizes
    pub slope_error: f64,
    /// Residual scatter of the log-log errors around the line
    pub reduced_chi2: f64,
    pub intercept: f64,
    pub target_error: f64,
    /// Extrapolated number of measurements giving `target_error`
    pub required_size: f64,
}

/// Output of [LifetimeAnalysis::run]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct LifetimeReport {
    /// Number of measurements
    pub size: usize,
    /// Mean uncertainty
    pub sigma: f64,
    pub signal: SignalReport,
    pub sweep: Option<SweepSummary>,
    pub background: BackgroundReport,
}

impl Display for LifetimeReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let Self {
            size,
            sigma,
            signal,
            sweep,
            background,
        } = self;
        writeln!(f, "Measurements: {size}, mean uncertainty: {sigma}")?;
        writeln!(f, "Area under signal PDF: {}", signal.pdf_area)?;
        writeln!(f, "Area under signal plus background PDF: {}", background.pdf_area)?;
        writeln!(f, "1D NLL minimum: {}", signal.nll_min)?;
        writeln!(f, "1D tau: {} {}", signal.tau, signal.scan_error)?;
        writeln!(f, "1D mean tau error: {}", signal.scan_error.mean())?;
        writeln!(f, "1D curvature tau error: {}", signal.curvature_error)?;
        if let Some(sweep) = sweep {
            writeln!(
                f,
                "Error vs size: slope {} +- {}, intercept {}, reduced chi2 {}",
                sweep.slope, sweep.slope_error, sweep.intercept, sweep.reduced_chi2
            )?;
            writeln!(
                f,
                "About {:.0} measurements for an error of {}",
                sweep.required_size, sweep.target_error
            )?;
        }
        writeln!(f, "2D NLL minimum: {}", background.nll_min)?;
        writeln!(f, "2D tau: {} {}", background.tau, background.tau_error)?;
        writeln!(f, "2D mean tau error: {}", background.tau_error.mean())?;
        writeln!(f, "2D a: {} {}", background.a, background.a_error)?;
        writeln!(f, "2D mean a error: {}", background.a_error.mean())?;
        write!(
            f,
            "Background: fraction {}, {} of {size} measurements",
            background.background_fraction, background.background_count
        )
    }
}
