use crate::array_stats::mean;
use crate::contour::{ContourLine, contour_lines};
use crate::error::FitError;
use crate::grid::nll_surface;
use crate::likelihood::LikelihoodModel;
use crate::minimize::GradientResult;
use crate::uncertainty::AsymmetricError;

use itertools::Itertools;
use macro_const::macro_const;
use ndarray::ArrayView1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_const! {
    const DOC: &str = r"
Errors of $\tau$ and $a$ from the contour of the two-parameter NLL

The NLL is evaluated on the Cartesian grid of the supplied $\tau$ and $a$ values and the contour
at $\mathrm{NLL}_\mathrm{min} + \Delta$ is traced. $\Delta = 1/2$ by default, the same threshold
as the one-parameter errors use. The contour vertices are split into those above the estimate
and the rest, separately for each parameter, and the errors are
$$
\sigma_+ = \langle x_i \mid x_i > \hat{x} \rangle - \hat{x},\quad
\sigma_- = \hat{x} - \langle x_i \mid x_i \le \hat{x} \rangle.
$$
Averaging all vertices of a side underestimates the extent of the contour: for a circle of
radius $r$ it gives about $0.64 r$.

When several contour lines are found, the closed one enclosing the estimate is used, otherwise
the line with the largest number of vertices.
";
}

#[doc = DOC!()]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Contour", try_from = "ContourErrorsParameters")]
pub struct ContourErrors {
    pub delta_nll: f64,
}

/// Output of [ContourErrors]
#[derive(Clone, Debug, PartialEq)]
pub struct ContourErrorResult {
    pub tau: AsymmetricError,
    pub a: AsymmetricError,
    /// Contour line the errors were derived from
    pub contour: ContourLine,
}

impl ContourErrors {
    /// Panics unless `delta_nll` is positive and finite
    pub fn new(delta_nll: f64) -> Self {
        let contour = Self { delta_nll };
        if let Err(err) = contour.check() {
            panic!("{err}");
        }
        contour
    }

    pub fn check(&self) -> Result<(), FitError> {
        FitError::require(
            self.delta_nll > 0.0 && self.delta_nll.is_finite(),
            "delta_nll",
            "must be positive and finite",
        )
    }

    #[inline]
    pub fn default_delta_nll() -> f64 {
        0.5
    }

    pub const fn doc() -> &'static str {
        DOC
    }

    /// Errors around `(tau_min, a_min)` of an arbitrary two-parameter function `f(tau, a)`
    ///
    /// `nll_min` is the function value at the estimate.
    pub fn estimate<F>(
        &self,
        taus: ArrayView1<f64>,
        signal_fractions: ArrayView1<f64>,
        [tau_min, a_min]: [f64; 2],
        nll_min: f64,
        f: F,
    ) -> Result<ContourErrorResult, FitError>
    where
        F: FnMut(f64, f64) -> Result<f64, FitError>,
    {
        self.check()?;
        if taus.len() < 2 {
            return Err(FitError::ShortGrid {
                axis: "tau",
                len: taus.len(),
            });
        }
        if signal_fractions.len() < 2 {
            return Err(FitError::ShortGrid {
                axis: "a",
                len: signal_fractions.len(),
            });
        }

        let surface = nll_surface(taus, signal_fractions, f)?;
        let level = nll_min + self.delta_nll;
        let lines = contour_lines(taus, signal_fractions, surface.view(), level);
        log::debug!(
            "{} contour line(s) found at level {level} on a {}x{} grid",
            lines.len(),
            taus.len(),
            signal_fractions.len()
        );

        let enclosing = lines
            .iter()
            .position(|line| line.contains([tau_min, a_min]));
        let index = match enclosing {
            Some(index) => index,
            None => lines
                .iter()
                .position_max_by_key(|line| line.len())
                .ok_or(FitError::NoContour { level })?,
        };
        let contour = lines
            .into_iter()
            .nth(index)
            .ok_or(FitError::NoContour { level })?;
        if enclosing.is_none() {
            log::warn!(
                "no closed contour at level {level} encloses (tau, a) = ({tau_min}, {a_min}), errors may be unreliable"
            );
        }

        let tau = partition_errors(contour.points.iter().map(|p| p[0]), tau_min, "tau")?;
        let a = partition_errors(contour.points.iter().map(|p| p[1]), a_min, "a")?;
        Ok(ContourErrorResult { tau, a, contour })
    }

    /// Errors of the signal plus background fit found by [crate::minimize::GradientDescent]
    pub fn estimate_for_model(
        &self,
        model: &LikelihoodModel<'_, '_>,
        taus: ArrayView1<f64>,
        signal_fractions: ArrayView1<f64>,
        fit: &GradientResult,
    ) -> Result<ContourErrorResult, FitError> {
        self.estimate(
            taus,
            signal_fractions,
            [fit.tau, fit.a],
            fit.nll,
            |tau, a| model.nll_with_bkg(tau, a),
        )
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename = "Contour")]
struct ContourErrorsParameters {
    delta_nll: f64,
}

impl TryFrom<ContourErrorsParameters> for ContourErrors {
    type Error = FitError;

    fn try_from(p: ContourErrorsParameters) -> Result<Self, Self::Error> {
        let contour = Self {
            delta_nll: p.delta_nll,
        };
        contour.check()?;
        Ok(contour)
    }
}

impl Default for ContourErrors {
    fn default() -> Self {
        Self::new(Self::default_delta_nll())
    }
}

/// Mean distance of `values` above `estimate` and of the rest below it
///
/// Fails with [FitError::EmptyPartition] if either side has no values. `parameter` names the
/// parameter in the error.
pub fn partition_errors<I>(
    values: I,
    estimate: f64,
    parameter: &'static str,
) -> Result<AsymmetricError, FitError>
where
    I: IntoIterator<Item = f64>,
{
    let (above, below): (Vec<f64>, Vec<f64>) =
        values.into_iter().partition(|&value| value > estimate);
    let mean_above = mean(above).ok_or(FitError::EmptyPartition {
        parameter,
        side: "above",
    })?;
    let mean_below = mean(below).ok_or(FitError::EmptyPartition {
        parameter,
        side: "below",
    })?;
    Ok(AsymmetricError {
        positive: mean_above - estimate,
        negative: estimate - mean_below,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MeasurementSet;
    use crate::minimize::GradientDescent;

    use approx::assert_relative_eq;
    use decay_lifetime_test_util::decay_sample;
    use ndarray::{Array1, arr1};
    use std::f64::consts::FRAC_PI_2;

    fn circle_nll(
        center: [f64; 2],
        r: f64,
        nll_min: f64,
    ) -> impl Fn(f64, f64) -> Result<f64, FitError> {
        move |tau, a| {
            let d2 = (tau - center[0]).powi(2) + (a - center[1]).powi(2);
            Ok(nll_min + 0.5 * d2 / (r * r))
        }
    }

    #[test]
    fn partition() {
        let errors = partition_errors([1.0, 2.0, 4.0, 5.0, 3.0], 3.0, "tau").unwrap();
        assert_eq!(errors.positive, 1.5);
        assert_eq!(errors.negative, 1.0);
    }

    #[test]
    fn empty_partition() {
        assert_eq!(
            partition_errors([1.0, 2.0], 3.0, "a"),
            Err(FitError::EmptyPartition {
                parameter: "a",
                side: "above"
            })
        );
        assert_eq!(
            partition_errors([4.0], 3.0, "tau"),
            Err(FitError::EmptyPartition {
                parameter: "tau",
                side: "below"
            })
        );
    }

    #[test]
    fn circular_contour() {
        let center = [0.41, 0.5];
        let r = 0.3037;
        let taus = Array1::<f64>::linspace(center[0] - 0.5, center[0] + 0.5, 161);
        let fractions = Array1::<f64>::linspace(center[1] - 0.5, center[1] + 0.5, 161);
        let result = ContourErrors::default()
            .estimate(
                taus.view(),
                fractions.view(),
                center,
                10.0,
                circle_nll(center, r, 10.0),
            )
            .unwrap();
        assert!(result.contour.closed);

        // Mean of the half-circle coordinates is (1 + pi / 2) / 4 of the radius
        let expected = 0.25 * (1.0 + FRAC_PI_2) * r;
        for error in [
            result.tau.positive,
            result.tau.negative,
            result.a.positive,
            result.a.negative,
        ] {
            assert_relative_eq!(error, expected, max_relative = 0.02);
        }
        assert_relative_eq!(result.tau.mean(), result.a.mean(), max_relative = 1e-9);
    }

    #[test]
    fn contour_cut_by_grid_border() {
        // Grid covers only the right half of the circle
        let center = [0.0, 0.0];
        let taus = Array1::<f64>::linspace(0.0, 1.0, 51);
        let fractions = Array1::<f64>::linspace(-1.0, 1.0, 101);
        let result = ContourErrors::default().estimate(
            taus.view(),
            fractions.view(),
            [-0.01, 0.0],
            0.0,
            circle_nll(center, 0.5, 0.0),
        );
        assert_eq!(
            result,
            Err(FitError::EmptyPartition {
                parameter: "tau",
                side: "below"
            })
        );
    }

    #[test]
    fn no_contour_inside_grid() {
        let taus = arr1(&[0.0, 1.0]);
        let fractions = arr1(&[0.0, 1.0]);
        let result = ContourErrors::default().estimate(
            taus.view(),
            fractions.view(),
            [0.5, 0.5],
            -10.0,
            |_, _| Ok(0.0),
        );
        assert_eq!(result, Err(FitError::NoContour { level: -9.5 }));
    }

    #[test]
    fn invalid_delta_nll() {
        let parsed: Result<ContourErrors, _> = serde_json::from_str(r#"{"delta_nll": -0.5}"#);
        assert!(parsed.is_err());
        let parsed: ContourErrors = serde_json::from_str(r#"{"delta_nll": 2.0}"#).unwrap();
        assert_eq!(parsed, ContourErrors::new(2.0));

        let contour = ContourErrors { delta_nll: f64::NAN };
        let result = contour.estimate(
            arr1(&[0.0, 1.0]).view(),
            arr1(&[0.0, 1.0]).view(),
            [0.5, 0.5],
            0.0,
            |_, _| Ok(0.0),
        );
        assert_eq!(
            result,
            Err(FitError::InvalidParameter {
                name: "delta_nll",
                requirement: "must be positive and finite"
            })
        );
    }

    #[test]
    fn short_grid() {
        let taus = arr1(&[0.4]);
        let fractions = arr1(&[0.0, 1.0]);
        let result = ContourErrors::default().estimate(
            taus.view(),
            fractions.view(),
            [0.4, 0.5],
            0.0,
            |_, _| Ok(0.0),
        );
        assert_eq!(result, Err(FitError::ShortGrid { axis: "tau", len: 1 }));
    }

    #[test]
    fn decay_likelihood_contour() {
        let (t, err) = decay_sample(10_000, 0.41, 0.28, 0.9, 0);
        let data = MeasurementSet::new(t, err).unwrap();
        let model = LikelihoodModel::new(&data);
        let fit = GradientDescent::default()
            .minimize([0.4, 0.85], |tau, a| model.nll_with_bkg(tau, a))
            .unwrap();

        let taus = Array1::<f64>::linspace(fit.tau - 0.05, fit.tau + 0.05, 60);
        let fractions = Array1::<f64>::linspace(fit.a - 0.05, 0.999, 60);
        let result = ContourErrors::default()
            .estimate_for_model(&model, taus.view(), fractions.view(), &fit)
            .unwrap();
        assert!(result.contour.closed);
        assert!(result.contour.contains([fit.tau, fit.a]));
        for error in [result.tau, result.a] {
            assert!(error.positive > 0.0 && error.negative > 0.0);
            assert!(error.mean() < 0.05);
        }
        assert!((0.001..0.02).contains(&result.tau.mean()));
    }
}
