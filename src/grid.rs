//! NLL evaluation on requested grids, e.g. for plotting curves, surfaces and contours

use crate::error::FitError;
use crate::likelihood::LikelihoodModel;

use ndarray::{Array1, Array2, ArrayView1};

/// Evaluate `f` at every value of `taus`, in the same order
pub fn nll_curve<F>(taus: ArrayView1<f64>, mut f: F) -> Result<Array1<f64>, FitError>
where
    F: FnMut(f64) -> Result<f64, FitError>,
{
    taus.iter().map(|&tau| f(tau)).collect()
}

/// Evaluate `f` on the Cartesian grid of `taus` and `signal_fractions`
///
/// The output has shape `(signal_fractions.len(), taus.len())` with element `[[i, j]]` equal to
/// `f(taus[j], signal_fractions[i])`, the mesh grid layout expected by
/// [crate::contour::contour_lines]. Evaluation goes in row-major order.
pub fn nll_surface<F>(
    taus: ArrayView1<f64>,
    signal_fractions: ArrayView1<f64>,
    mut f: F,
) -> Result<Array2<f64>, FitError>
where
    F: FnMut(f64, f64) -> Result<f64, FitError>,
{
    let mut surface = Array2::zeros((signal_fractions.len(), taus.len()));
    for ((i, j), value) in surface.indexed_iter_mut() {
        *value = f(taus[j], signal_fractions[i])?;
    }
    Ok(surface)
}

impl LikelihoodModel<'_, '_> {
    /// Signal-only NLL at every value of `taus`
    pub fn nll_curve(&self, taus: ArrayView1<f64>) -> Result<Array1<f64>, FitError> {
        nll_curve(taus, |tau| self.nll(tau))
    }

    /// Signal plus background NLL on the grid, see [nll_surface]
    pub fn nll_surface(
        &self,
        taus: ArrayView1<f64>,
        signal_fractions: ArrayView1<f64>,
    ) -> Result<Array2<f64>, FitError> {
        nll_surface(taus, signal_fractions, |tau, a| self.nll_with_bkg(tau, a))
    }
}
