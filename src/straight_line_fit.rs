use conv::prelude::*;
use ndarray::{ArrayView1, Zip};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StraightLineFitterResult {
    pub slope: f64,
    pub intercept: f64,
    pub slope_sigma2: f64,
    pub reduced_chi2: f64,
}

/// Ordinary least squares fit of `y = intercept + slope x`
///
/// Noise is assumed to be constant and unknown, `slope_sigma2` is scaled by the reduced $\chi^2$
/// of the residuals. Two points give an exact fit with zero residuals and zero slope variance.
///
/// Panics if `x` and `y` differ in length, have fewer than two points, or all `x` are equal.
pub fn fit_straight_line(x: ArrayView1<f64>, y: ArrayView1<f64>) -> StraightLineFitterResult {
    assert_eq!(x.len(), y.len(), "x and y should have the same size");
    assert!(x.len() >= 2, "at least two points are required");

    let n: f64 = x.len().approx().unwrap();
    let x_mean = x.sum() / n;
    let y_mean = y.sum() / n;
    let (sxx, sxy) = Zip::from(x).and(y).fold((0.0, 0.0), |(sxx, sxy), &x, &y| {
        let dx = x - x_mean;
        (sxx + dx * dx, sxy + dx * (y - y_mean))
    });
    assert!(sxx > 0.0, "x values must not be all the same");

    let slope = sxy / sxx;
    let intercept = y_mean - slope * x_mean;
    let chi2 = Zip::from(x).and(y).fold(0.0, |chi2, &x, &y| {
        chi2 + (y - intercept - slope * x).powi(2)
    });
    let reduced_chi2 = if x.len() > 2 { chi2 / (n - 2.0) } else { 0.0 };

    StraightLineFitterResult {
        slope,
        intercept,
        slope_sigma2: reduced_chi2 / sxx,
        reduced_chi2,
    }
}
