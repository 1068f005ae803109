use crate::array_stats::{argmax, argmin};
use crate::error::FitError;

use ndarray::ArrayView1;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Three `(x, y)` points of a one-dimensional function and the parabola through them
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Parabola {
    pub x: [f64; 3],
    pub y: [f64; 3],
}

impl Parabola {
    pub fn new(x: [f64; 3], y: [f64; 3]) -> Self {
        Self { x, y }
    }

    /// `(x2 - x1) y0 + (x0 - x2) y1 + (x1 - x0) y2`, zero for colinear points
    fn denominator(&self) -> f64 {
        let Self { x, y } = self;
        (x[2] - x[1]) * y[0] + (x[0] - x[2]) * y[1] + (x[1] - x[0]) * y[2]
    }

    /// Abscissa of the parabola's vertex
    pub fn vertex(&self) -> Result<f64, FitError> {
        let Self { x, y } = self;
        let numerator = (x[2].powi(2) - x[1].powi(2)) * y[0]
            + (x[0].powi(2) - x[2].powi(2)) * y[1]
            + (x[1].powi(2) - x[0].powi(2)) * y[2];
        let denominator = self.denominator();
        if denominator == 0.0 {
            return Err(FitError::DegenerateParabola("points are colinear"));
        }
        let vertex = 0.5 * numerator / denominator;
        if vertex.is_finite() {
            Ok(vertex)
        } else {
            Err(FitError::DegenerateParabola("vertex is not finite"))
        }
    }

    /// One-sigma error from the parabola's curvature
    ///
    /// If the points come from an NLL, the parabola is $c (x - x_0)^2 + \mathrm{const}$ and the
    /// error is the distance at which it rises by one half, $\sqrt{1 / (2 c)}$.
    pub fn curvature_error(&self) -> Result<f64, FitError> {
        let Self { x, .. } = self;
        let numerator = (x[1] - x[0]) * (x[2] - x[0]) * (x[2] - x[1]);
        let denominator = self.denominator();
        if denominator == 0.0 {
            return Err(FitError::DegenerateParabola("points are colinear"));
        }
        let variance = 0.5 * numerator / denominator;
        if variance > 0.0 && variance.is_finite() {
            Ok(variance.sqrt())
        } else {
            Err(FitError::DegenerateParabola("curvature is not positive"))
        }
    }

    /// Index of the lowest point, the first one on ties
    pub fn argmin(&self) -> usize {
        // Never fails for a non-empty array
        argmin(ArrayView1::from(&self.y)).unwrap_or(0)
    }

    /// Index of the highest point, the first one on ties
    pub fn argmax(&self) -> usize {
        argmax(ArrayView1::from(&self.y)).unwrap_or(0)
    }

    /// The lowest `(x, y)` point
    pub fn minimum(&self) -> (f64, f64) {
        let i = self.argmin();
        (self.x[i], self.y[i])
    }
}

/// Result of [ParabolicMinimizer::minimize]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ParabolicResult {
    /// Position of the minimum
    pub x_min: f64,
    /// Function value at the minimum
    pub y_min: f64,
    /// Last three points, the curvature error is taken from them
    pub parabola: Parabola,
    pub iterations: usize,
}

/// Derivative-free minimizer of a one-dimensional function by successive parabolic
/// interpolation
///
/// Each iteration puts a parabola through three points, evaluates the function at its vertex and
/// replaces the highest point with the new one if the new value is lower than the highest value.
/// The search stops when the vertex is within `tolerance` of the lowest point of the triple
/// before the replacement.
///
/// If a non-converged vertex does not replace any point, the triple stays the same and every
/// following iteration would repeat it; this is reported as [FitError::Stalled].
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Parabolic", try_from = "ParabolicMinimizerParameters")]
pub struct ParabolicMinimizer {
    pub initial: [f64; 3],
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl ParabolicMinimizer {
    /// Create a new [ParabolicMinimizer]
    ///
    /// # Arguments
    /// - `initial`: three distinct initial guesses
    /// - `tolerance`: convergence tolerance in units of `x`
    /// - `max_iterations`: maximum number of parabolic steps
    pub fn new(initial: [f64; 3], tolerance: f64, max_iterations: usize) -> Self {
        let minimizer = Self {
            initial,
            tolerance,
            max_iterations,
        };
        if let Err(err) = minimizer.check() {
            panic!("{err}");
        }
        minimizer
    }

    /// Check the arguments of [ParabolicMinimizer::new], [ParabolicMinimizer::minimize] calls it
    pub fn check(&self) -> Result<(), FitError> {
        let [x0, x1, x2] = self.initial;
        FitError::require(
            self.initial.iter().all(|x| x.is_finite()),
            "initial",
            "guesses must be finite",
        )?;
        FitError::require(
            x0 != x1 && x1 != x2 && x0 != x2,
            "initial",
            "guesses must be distinct",
        )?;
        FitError::require(
            self.tolerance > 0.0 && self.tolerance.is_finite(),
            "tolerance",
            "must be positive and finite",
        )?;
        FitError::require(
            self.max_iterations > 0,
            "max_iterations",
            "must be positive",
        )
    }

    #[inline]
    pub fn default_initial() -> [f64; 3] {
        [0.3, 0.4, 0.5]
    }

    #[inline]
    pub fn default_tolerance() -> f64 {
        1e-5
    }

    #[inline]
    pub fn default_max_iterations() -> usize {
        10_000
    }

    pub fn minimize<F>(&self, mut f: F) -> Result<ParabolicResult, FitError>
    where
        F: FnMut(f64) -> Result<f64, FitError>,
    {
        self.check()?;
        let x = self.initial;
        let y = [f(x[0])?, f(x[1])?, f(x[2])?];
        if let Some(i) = y.iter().position(|y| !y.is_finite()) {
            return Err(FitError::NonFiniteNll {
                value: y[i],
                point: vec![x[i]],
            });
        }
        let mut parabola = Parabola::new(x, y);

        for iteration in 1..=self.max_iterations {
            let x_new = parabola.vertex()?;
            let y_new = f(x_new)?;

            let (x_best, _) = parabola.minimum();
            let difference = f64::abs(x_new - x_best);

            let worst = parabola.argmax();
            let replaced = y_new < parabola.y[worst];
            if replaced {
                parabola.x[worst] = x_new;
                parabola.y[worst] = y_new;
            }

            if difference <= self.tolerance {
                let (x_min, y_min) = parabola.minimum();
                log::debug!(
                    "parabolic search converged to x = {x_min}, y = {y_min} in {iteration} iterations"
                );
                return Ok(ParabolicResult {
                    x_min,
                    y_min,
                    parabola,
                    iterations: iteration,
                });
            }
            if !replaced {
                return Err(FitError::Stalled { x: x_new });
            }
        }
        Err(FitError::MaxIterations {
            iterations: self.max_iterations,
        })
    }
}

impl Default for ParabolicMinimizer {
    fn default() -> Self {
        Self::new(
            Self::default_initial(),
            Self::default_tolerance(),
            Self::default_max_iterations(),
        )
    }
}

#[derive(Deserialize, JsonSchema)]
#[serde(rename = "Parabolic")]
struct ParabolicMinimizerParameters {
    initial: [f64; 3],
    tolerance: f64,
    max_iterations: usize,
}

impl TryFrom<ParabolicMinimizerParameters> for ParabolicMinimizer {
    type Error = FitError;

    fn try_from(p: ParabolicMinimizerParameters) -> Result<Self, Self::Error> {
        let minimizer = Self {
            initial: p.initial,
            tolerance: p.tolerance,
            max_iterations: p.max_iterations,
        };
        minimizer.check()?;
        Ok(minimizer)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::data::MeasurementSet;
    use crate::likelihood::LikelihoodModel;

    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use decay_lifetime_test_util::decay_sample;

    /// NLL of exponentially distributed times with mean `mean` and no resolution
    fn exponential_nll(n: f64, mean: f64) -> impl Fn(f64) -> Result<f64, FitError> {
        move |tau| Ok(n * (f64::ln(tau) + mean / tau))
    }

    #[test]
    fn vertex_of_symmetric_parabola() {
        let parabola = Parabola::new([0.0, 1.0, 2.0], [1.0, 0.0, 1.0]);
        assert_eq!(parabola.vertex().unwrap(), 1.0);
    }

    #[test]
    fn vertex_is_order_independent() {
        let f = |x: f64| 3.0 * (x - 0.7).powi(2) + 2.0;
        let a = Parabola::new([0.1, 0.5, 1.3], [f(0.1), f(0.5), f(1.3)]);
        let b = Parabola::new([1.3, 0.1, 0.5], [f(1.3), f(0.1), f(0.5)]);
        assert_relative_eq!(a.vertex().unwrap(), 0.7, epsilon = 1e-12);
        assert_relative_eq!(b.vertex().unwrap(), 0.7, epsilon = 1e-12);
    }

    #[test]
    fn colinear_points_are_degenerate() {
        let parabola = Parabola::new([0.0, 1.0, 2.0], [1.0, 2.0, 3.0]);
        assert!(matches!(
            parabola.vertex(),
            Err(FitError::DegenerateParabola(_))
        ));
        assert!(matches!(
            parabola.curvature_error(),
            Err(FitError::DegenerateParabola(_))
        ));
    }

    #[test]
    fn curvature_error_of_unit_parabola() {
        // y = x^2 rises by 0.5 at x = sqrt(0.5)
        let parabola = Parabola::new([-1.0, 0.0, 2.0], [1.0, 0.0, 4.0]);
        assert_relative_eq!(
            parabola.curvature_error().unwrap(),
            f64::sqrt(0.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn concave_parabola_has_no_curvature_error() {
        let parabola = Parabola::new([-1.0, 0.0, 1.0], [-1.0, 0.0, -1.0]);
        assert!(parabola.curvature_error().is_err());
    }

    #[test]
    fn argmin_argmax_first_of_ties() {
        let parabola = Parabola::new([0.0, 1.0, 2.0], [2.0, 1.0, 2.0]);
        assert_eq!(parabola.argmin(), 1);
        assert_eq!(parabola.argmax(), 0);
    }

    #[test]
    fn converges_on_exponential_nll() {
        let minimizer = ParabolicMinimizer::default();
        let result = minimizer.minimize(exponential_nll(1000.0, 0.41)).unwrap();
        assert_abs_diff_eq!(result.x_min, 0.41, epsilon = minimizer.tolerance);
        assert_relative_eq!(
            result.y_min,
            1000.0 * (f64::ln(0.41) + 1.0),
            max_relative = 1e-9
        );
        assert!(result.iterations < 100);
    }

    #[test]
    fn converges_on_quadratic_in_two_steps() {
        let minimizer = ParabolicMinimizer::default();
        let result = minimizer
            .minimize(|x| Ok((x - 0.41).powi(2) / (2.0 * 0.013_f64.powi(2))))
            .unwrap();
        assert_abs_diff_eq!(result.x_min, 0.41, epsilon = 1e-12);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn converges_on_decay_likelihood() {
        let (t, err) = decay_sample(10_000, 0.41, 0.28, 1.0, 0);
        let data = MeasurementSet::new(t, err).unwrap();
        let model = LikelihoodModel::new(&data);
        let result = ParabolicMinimizer::default()
            .minimize(|tau| model.nll(tau))
            .unwrap();
        // Statistical error is about tau / sqrt(N) ~ 0.005
        assert_abs_diff_eq!(result.x_min, 0.41, epsilon = 0.025);
        assert_eq!(result.y_min, model.nll(result.x_min).unwrap());
    }

    #[test]
    fn colinear_start_fails() {
        let minimizer = ParabolicMinimizer::default();
        let result = minimizer.minimize(|x| Ok(2.0 * x + 1.0));
        assert!(matches!(result, Err(FitError::DegenerateParabola(_))));
    }

    #[test]
    fn non_finite_start_fails() {
        let minimizer = ParabolicMinimizer::default();
        let result = minimizer.minimize(|x| Ok(if x > 0.45 { f64::INFINITY } else { x }));
        assert_eq!(
            result,
            Err(FitError::NonFiniteNll {
                value: f64::INFINITY,
                point: vec![0.5],
            })
        );
    }

    #[test]
    fn concave_function_stalls() {
        // The vertex of a concave parabola is its maximum, it never improves the worst point
        let minimizer = ParabolicMinimizer::default();
        let result = minimizer.minimize(|x| Ok(-(x - 0.42).powi(2)));
        assert!(matches!(result, Err(FitError::Stalled { .. })));
    }

    #[test]
    fn iteration_limit() {
        let minimizer = ParabolicMinimizer::new([0.3, 0.4, 0.5], 1e-12, 1);
        let result = minimizer.minimize(exponential_nll(1000.0, 0.41));
        assert_eq!(result, Err(FitError::MaxIterations { iterations: 1 }));
    }

    #[test]
    fn likelihood_errors_propagate() {
        // The first vertex lies at negative lifetime
        let minimizer = ParabolicMinimizer::new([0.1, 0.2, 0.3], 1e-5, 100);
        let result = minimizer.minimize(|tau| {
            crate::likelihood::check_tau(tau)?;
            Ok((tau + 1.0).powi(2))
        });
        assert!(matches!(result, Err(FitError::NonPositiveLifetime(_))));
    }

    #[test]
    fn invalid_configuration() {
        let parsed: Result<ParabolicMinimizer, _> = serde_json::from_str(
            r#"{"initial": [0.3, 0.4, 0.5], "tolerance": 0.0, "max_iterations": 100}"#,
        );
        assert!(parsed.is_err());
        let parsed: ParabolicMinimizer = serde_json::from_str(
            r#"{"initial": [0.2, 0.4, 0.6], "tolerance": 1e-6, "max_iterations": 100}"#,
        )
        .unwrap();
        assert_eq!(parsed, ParabolicMinimizer::new([0.2, 0.4, 0.6], 1e-6, 100));

        let minimizer = ParabolicMinimizer {
            initial: [0.3, 0.5, 0.5],
            ..ParabolicMinimizer::default()
        };
        assert_eq!(
            minimizer.minimize(exponential_nll(10.0, 0.41)),
            Err(FitError::InvalidParameter {
                name: "initial",
                requirement: "guesses must be distinct"
            })
        );
    }

    #[test]
    #[should_panic(expected = "initial guesses must be distinct")]
    fn repeated_initial_guess() {
        let _ = ParabolicMinimizer::new([0.3, 0.3, 0.5], 1e-5, 100);
    }
}
