use crate::array_stats::mean;
use crate::data::sorted_array::SortedArray;
use crate::error::DataError;
use crate::types::CowArray1;

use ndarray::{Array1, ArrayView1, Zip, s};

/// Decay-time measurements with their uncertainties
///
/// Both arrays are stored as copy-on-write views, so the set either owns its data (e.g. after
/// reading a file) or borrows it, and [MeasurementSet::prefix] is zero-copy. The set is
/// immutable once constructed and the mean uncertainty is computed up front.
#[derive(Clone, Debug)]
pub struct MeasurementSet<'a> {
    times: CowArray1<'a, f64>,
    uncertainties: CowArray1<'a, f64>,
    mean_sigma: f64,
}

impl<'a> MeasurementSet<'a> {
    /// Construct `MeasurementSet` from decay times and their uncertainties
    ///
    /// Arrays must be non-empty and of the same length, times must be finite and uncertainties
    /// must be finite and non-negative. Inputs could be [`ndarray::Array1`],
    /// [`ndarray::ArrayView1`] or 1-D [`ndarray::CowArray`].
    pub fn new(
        times: impl Into<CowArray1<'a, f64>>,
        uncertainties: impl Into<CowArray1<'a, f64>>,
    ) -> Result<Self, DataError> {
        let times = times.into();
        let uncertainties = uncertainties.into();

        if times.len() != uncertainties.len() {
            return Err(DataError::LengthMismatch {
                times: times.len(),
                uncertainties: uncertainties.len(),
            });
        }
        if let Some((index, &value)) = times.iter().enumerate().find(|(_, t)| !t.is_finite()) {
            return Err(DataError::InvalidTime { index, value });
        }
        if let Some((index, &value)) = uncertainties
            .iter()
            .enumerate()
            .find(|(_, s)| !(s.is_finite() && **s >= 0.0))
        {
            return Err(DataError::InvalidUncertainty { index, value });
        }
        let mean_sigma = mean(uncertainties.iter().copied()).ok_or(DataError::Empty)?;

        Ok(Self {
            times,
            uncertainties,
            mean_sigma,
        })
    }

    /// Construct `MeasurementSet` from owned vectors
    pub fn from_vecs(times: Vec<f64>, uncertainties: Vec<f64>) -> Result<Self, DataError> {
        Self::new(Array1::from(times), Array1::from(uncertainties))
    }

    /// Number of measurements, it is never zero
    #[inline]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Always `false`, empty sets cannot be constructed
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn times(&self) -> ArrayView1<'_, f64> {
        self.times.view()
    }

    pub fn uncertainties(&self) -> ArrayView1<'_, f64> {
        self.uncertainties.view()
    }

    /// Mean uncertainty, the representative resolution of the whole set
    #[inline]
    pub fn mean_sigma(&self) -> f64 {
        self.mean_sigma
    }

    /// Iterate over `(time, uncertainty)` pairs in the original order
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.times
            .iter()
            .copied()
            .zip(self.uncertainties.iter().copied())
    }

    /// Zero-copy view of the first `size` measurements
    ///
    /// The mean uncertainty is recomputed for the prefix.
    pub fn prefix(&self, size: usize) -> Result<MeasurementSet<'_>, DataError> {
        if size > self.len() {
            return Err(DataError::PrefixTooLong {
                requested: size,
                available: self.len(),
            });
        }
        MeasurementSet::new(
            self.times.slice(s![..size]),
            self.uncertainties.slice(s![..size]),
        )
    }

    /// Times sorted in ascending order, used to integrate fitted densities
    pub fn sorted_times(&self) -> SortedArray {
        self.times.view().into()
    }

    /// Fold over the measurements strictly left to right
    ///
    /// NLL reductions go through this method, so their results are bit-reproducible for a given
    /// measurement order.
    pub(crate) fn fold<B, F>(&self, init: B, f: F) -> B
    where
        F: FnMut(B, &f64, &f64) -> B,
    {
        Zip::from(&self.times).and(&self.uncertainties).fold(init, f)
    }
}

impl<'b> PartialEq<MeasurementSet<'b>> for MeasurementSet<'_> {
    fn eq(&self, other: &MeasurementSet<'b>) -> bool {
        self.times == other.times && self.uncertainties == other.uncertainties
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use ndarray::arr1;

    fn example() -> MeasurementSet<'static> {
        MeasurementSet::from_vecs(vec![0.5, 1.0, 1.5, -0.2], vec![0.1, 0.2, 0.3, 0.4]).unwrap()
    }

    #[test]
    fn mean_sigma() {
        assert_relative_eq!(example().mean_sigma(), 0.25, epsilon = 1e-15);
    }

    #[test]
    fn from_view_borrows() {
        let t = [0.1, 0.2];
        let err = [0.01, 0.02];
        let set = MeasurementSet::new(ArrayView1::from(&t), ArrayView1::from(&err)).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.times(), arr1(&t));
    }

    #[test]
    fn prefix_is_ordered_view() {
        let set = example();
        let prefix = set.prefix(2).unwrap();
        assert_eq!(prefix.times(), arr1(&[0.5, 1.0]));
        assert_eq!(prefix.uncertainties(), arr1(&[0.1, 0.2]));
        assert_relative_eq!(prefix.mean_sigma(), 0.15, epsilon = 1e-15);
    }

    #[test]
    fn prefix_full_length_is_identity() {
        let set = example();
        assert_eq!(set.prefix(set.len()).unwrap(), set);
    }

    #[test]
    fn prefix_differs_from_parent() {
        let set = example();
        let prefix = set.prefix(3).unwrap();
        assert_ne!(prefix, set);
        assert_ne!(set, prefix);
        assert_eq!(prefix, set.prefix(3).unwrap());
    }

    #[test]
    fn prefix_too_long() {
        assert!(matches!(
            example().prefix(5),
            Err(DataError::PrefixTooLong {
                requested: 5,
                available: 4
            })
        ));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        assert!(matches!(example().prefix(0), Err(DataError::Empty)));
    }

    #[test]
    fn length_mismatch() {
        let result = MeasurementSet::from_vecs(vec![0.5, 1.0], vec![0.1]);
        assert!(matches!(
            result,
            Err(DataError::LengthMismatch {
                times: 2,
                uncertainties: 1
            })
        ));
    }

    #[test]
    fn negative_uncertainty() {
        let result = MeasurementSet::from_vecs(vec![0.5, 1.0], vec![0.1, -0.1]);
        assert!(matches!(
            result,
            Err(DataError::InvalidUncertainty { index: 1, .. })
        ));
    }

    #[test]
    fn nan_time() {
        let result = MeasurementSet::from_vecs(vec![f64::NAN], vec![0.1]);
        assert!(matches!(result, Err(DataError::InvalidTime { index: 0, .. })));
    }

    #[test]
    fn sorted_times() {
        let sorted = example().sorted_times();
        assert_eq!(&sorted[..], &[-0.2, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn fold_is_left_to_right() {
        let order = example().fold(vec![], |mut v, &t, _| {
            v.push(t);
            v
        });
        assert_eq!(order, vec![0.5, 1.0, 1.5, -0.2]);
    }
}
