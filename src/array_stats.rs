//! Small array statistics helpers

use conv::prelude::*;
use ndarray::{ArrayView1, Zip, s};

/// Find the index of the maximum element in an array, the first one on ties
pub fn argmax(arr: ArrayView1<f64>) -> Option<usize> {
    if arr.is_empty() {
        return None;
    }

    let (idx, _) = arr
        .iter()
        .enumerate()
        .fold((0, arr[0]), |(max_idx, max_val), (idx, &val)| {
            if val > max_val {
                (idx, val)
            } else {
                (max_idx, max_val)
            }
        });

    Some(idx)
}

/// Find the index of the minimum element in an array, the first one on ties
pub fn argmin(arr: ArrayView1<f64>) -> Option<usize> {
    if arr.is_empty() {
        return None;
    }

    let (idx, _) = arr
        .iter()
        .enumerate()
        .fold((0, arr[0]), |(min_idx, min_val), (idx, &val)| {
            if val < min_val {
                (idx, val)
            } else {
                (min_idx, min_val)
            }
        });

    Some(idx)
}

/// Arithmetic mean accumulated left to right, `None` for an empty input
pub fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), x| (sum + x, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count.approx_as::<f64>().ok()?)
    }
}

/// Trapezoid rule integral of `y` over the sample points `x`
pub fn trapezoid(x: ArrayView1<f64>, y: ArrayView1<f64>) -> f64 {
    assert_eq!(x.len(), y.len(), "x and y should have the same size");
    if x.len() < 2 {
        return 0.0;
    }
    Zip::from(x.slice(s![1..]))
        .and(x.slice(s![..-1]))
        .and(y.slice(s![1..]))
        .and(y.slice(s![..-1]))
        .fold(0.0, |area, &x1, &x0, &y1, &y0| {
            area + 0.5 * (x1 - x0) * (y1 + y0)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, arr1};

    #[test]
    fn test_argmax_basic() {
        let arr = arr1(&[1.0, 3.0, 2.0, 5.0, 4.0]);
        assert_eq!(argmax(arr.view()), Some(3));
    }

    #[test]
    fn test_argmax_first_of_ties() {
        let arr = arr1(&[5.0, 1.0, 5.0]);
        assert_eq!(argmax(arr.view()), Some(0));
    }

    #[test]
    fn test_argmin_basic() {
        let arr = arr1(&[1.0, -3.0, 2.0, -5.0, 4.0]);
        assert_eq!(argmin(arr.view()), Some(3));
    }

    #[test]
    fn test_argmin_first_of_ties() {
        let arr = arr1(&[2.0, 1.0, 1.0]);
        assert_eq!(argmin(arr.view()), Some(1));
    }

    #[test]
    fn test_arg_empty() {
        let arr: Array1<f64> = Array1::from(vec![]);
        assert_eq!(argmax(arr.view()), None);
        assert_eq!(argmin(arr.view()), None);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean([1.0, 2.0, 3.0, 6.0]), Some(3.0));
        assert_eq!(mean(std::iter::empty()), None);
    }

    #[test]
    fn test_trapezoid_triangle() {
        let x = arr1(&[0.0, 1.0, 2.0]);
        let y = arr1(&[0.0, 1.0, 0.0]);
        assert!((trapezoid(x.view(), y.view()) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_trapezoid_single_point() {
        let x = arr1(&[1.0]);
        assert_eq!(trapezoid(x.view(), x.view()), 0.0);
    }
}
