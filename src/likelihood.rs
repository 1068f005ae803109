use crate::data::MeasurementSet;
use crate::error::FitError;

use macro_const::macro_const;
use ndarray::{Array1, ArrayView1};
use std::f64::consts::{FRAC_1_SQRT_2, PI};

macro_const! {
    const DOC: &str = r"
Negative log-likelihood of decay-time measurements

The signal model is an exponential decay with mean lifetime $\tau$ convolved with a Gaussian
resolution $\sigma$:
$$
f(t; \tau, \sigma) = \frac{1}{2\tau} \exp\left(\frac{\sigma^2}{2\tau^2} - \frac{t}{\tau}\right)
    \mathrm{erfc}\left(\frac{1}{\sqrt{2}}\left(\frac{\sigma}{\tau} - \frac{t}{\sigma}\right)\right).
$$
The background model mixes it with zero-lifetime events, i.e. a zero-mean Gaussian $g(t; \sigma)$,
with the signal fraction $a$:
$$
f_\mathrm{bkg}(t; \tau, a, \sigma) = a f(t; \tau, \sigma) + (1 - a) g(t; \sigma).
$$
The NLL sums $-\ln f$ over measurements using each measurement's own uncertainty. The sum is
accumulated in measurement order. A zero density gives $+\infty$, which is returned as is.
Zero uncertainties are allowed: the signal density becomes the bare exponential and the
background a delta function at $t = 0$.

- Parameters: $\tau > 0$, $a \in [0, 1]$
- Scalar $\sigma$ (mean uncertainty by default) is used for density curves only
";
}

/// Signal density: exponential decay convolved with Gaussian resolution
///
/// Zero `sigma` gives the bare exponential, with half of its jump at `time = 0`.
#[inline]
pub fn pdf_no_bkg(tau: f64, time: f64, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return if time > 0.0 {
            f64::exp(-time / tau) / tau
        } else if time == 0.0 {
            0.5 / tau
        } else {
            0.0
        };
    }
    let ratio = sigma / tau;
    0.5 / tau
        * f64::exp(0.5 * ratio * ratio - time / tau)
        * libm::erfc(FRAC_1_SQRT_2 * (ratio - time / sigma))
}

/// Background density: zero-mean normal distribution with standard deviation `sigma`
///
/// Zero `sigma` is the delta function limit: zero everywhere except `+inf` at `time = 0`.
#[inline]
pub fn gaussian_bkg(time: f64, sigma: f64) -> f64 {
    if sigma == 0.0 {
        return if time == 0.0 { f64::INFINITY } else { 0.0 };
    }
    let z = time / sigma;
    f64::exp(-0.5 * z * z) / (sigma * f64::sqrt(2.0 * PI))
}

/// Mixture of the signal density with weight `a` and the background density
#[inline]
pub fn pdf_with_bkg(tau: f64, a: f64, time: f64, sigma: f64) -> f64 {
    let signal = a * pdf_no_bkg(tau, time, sigma);
    // 0 * inf is NaN for a delta-like background
    if a == 1.0 {
        signal
    } else {
        signal + (1.0 - a) * gaussian_bkg(time, sigma)
    }
}

/// A zero density makes the NLL `+inf` even after an infinite density at zero resolution
#[inline]
fn add_nll_term(acc: f64, density: f64) -> f64 {
    if acc == f64::INFINITY || density == 0.0 {
        f64::INFINITY
    } else {
        acc - f64::ln(density)
    }
}

pub(crate) fn check_tau(tau: f64) -> Result<(), FitError> {
    // NaN fails too
    if tau > 0.0 {
        Ok(())
    } else {
        Err(FitError::NonPositiveLifetime(tau))
    }
}

pub(crate) fn check_signal_fraction(a: f64) -> Result<(), FitError> {
    if (0.0..=1.0).contains(&a) {
        Ok(())
    } else {
        Err(FitError::SignalFractionOutOfRange(a))
    }
}

#[doc = DOC!()]
#[derive(Clone, Copy, Debug)]
pub struct LikelihoodModel<'a, 'd> {
    data: &'a MeasurementSet<'d>,
    sigma: f64,
}

impl<'a, 'd> LikelihoodModel<'a, 'd> {
    /// Model with the mean uncertainty of `data` as its scalar resolution
    pub fn new(data: &'a MeasurementSet<'d>) -> Self {
        Self::with_sigma(data, data.mean_sigma())
    }

    pub fn with_sigma(data: &'a MeasurementSet<'d>, sigma: f64) -> Self {
        assert!(
            sigma.is_finite() && sigma >= 0.0,
            "sigma must be finite and non-negative"
        );
        Self { data, sigma }
    }

    pub const fn doc() -> &'static str {
        DOC
    }

    #[inline]
    pub fn data(&self) -> &'a MeasurementSet<'d> {
        self.data
    }

    #[inline]
    pub fn sigma(&self) -> f64 {
        self.sigma
    }

    /// Signal-only NLL
    pub fn nll(&self, tau: f64) -> Result<f64, FitError> {
        check_tau(tau)?;
        Ok(self
            .data
            .fold(0.0, |acc, &t, &s| add_nll_term(acc, pdf_no_bkg(tau, t, s))))
    }

    /// Signal plus background NLL
    pub fn nll_with_bkg(&self, tau: f64, a: f64) -> Result<f64, FitError> {
        check_tau(tau)?;
        check_signal_fraction(a)?;
        Ok(self
            .data
            .fold(0.0, |acc, &t, &s| add_nll_term(acc, pdf_with_bkg(tau, a, t, s))))
    }

    /// Signal density at `times` with the model's scalar resolution
    pub fn pdf_curve(&self, tau: f64, times: ArrayView1<f64>) -> Result<Array1<f64>, FitError> {
        check_tau(tau)?;
        Ok(times.mapv(|t| pdf_no_bkg(tau, t, self.sigma)))
    }

    /// Signal plus background density at `times` with the model's scalar resolution
    pub fn pdf_with_bkg_curve(
        &self,
        tau: f64,
        a: f64,
        times: ArrayView1<f64>,
    ) -> Result<Array1<f64>, FitError> {
        check_tau(tau)?;
        check_signal_fraction(a)?;
        Ok(times.mapv(|t| pdf_with_bkg(tau, a, t, self.sigma)))
    }

    /// Trapezoid area under the signal density over the sorted measurement times
    ///
    /// It is close to unity when the times cover the bulk of the distribution.
    pub fn pdf_area(&self, tau: f64) -> Result<f64, FitError> {
        check_tau(tau)?;
        Ok(self
            .data
            .sorted_times()
            .integrate(|t| pdf_no_bkg(tau, t, self.sigma)))
    }

    /// Trapezoid area under the signal plus background density over the sorted times
    pub fn pdf_with_bkg_area(&self, tau: f64, a: f64) -> Result<f64, FitError> {
        check_tau(tau)?;
        check_signal_fraction(a)?;
        Ok(self
            .data
            .sorted_times()
            .integrate(|t| pdf_with_bkg(tau, a, t, self.sigma)))
    }
}
