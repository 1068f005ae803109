use crate::array_stats::trapezoid;

use ndarray::{Array1, ArrayView1};
use std::ops::Deref;

// Underlying array is guaranteed to be sorted and contiguous
#[derive(Clone, Debug, PartialEq)]
pub struct SortedArray(pub Array1<f64>);

impl SortedArray {
    pub fn view(&self) -> ArrayView1<'_, f64> {
        self.0.view()
    }

    /// Trapezoid integral of `f` sampled at the sorted values
    ///
    /// Duplicated values contribute zero-width trapezoids, so the result is the area under the
    /// piecewise-linear interpolant of `f` between the minimum and maximum.
    pub fn integrate<F>(&self, f: F) -> f64
    where
        F: Fn(f64) -> f64,
    {
        let y = self.0.mapv(f);
        trapezoid(self.view(), y.view())
    }
}

impl From<Vec<f64>> for SortedArray {
    fn from(mut v: Vec<f64>) -> Self {
        v[..].sort_unstable_by(f64::total_cmp);
        Self(Array1::from_vec(v))
    }
}

impl From<&[f64]> for SortedArray {
    fn from(s: &[f64]) -> Self {
        s.to_vec().into()
    }
}

impl From<ArrayView1<'_, f64>> for SortedArray {
    fn from(v: ArrayView1<'_, f64>) -> Self {
        v.to_vec().into()
    }
}

impl Deref for SortedArray {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        // Always constructed from a Vec, so the array is contiguous
        self.0.as_slice().unwrap()
    }
}

impl AsRef<[f64]> for SortedArray {
    fn as_ref(&self) -> &[f64] {
        self
    }
}
