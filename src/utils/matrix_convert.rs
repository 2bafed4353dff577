//! Conversions between ndarray storage and faer matrices.
//!
//! The solver keeps residuals and Jacobians in ndarray; dense factorisations
//! run on faer. ndarray is row-major by default while faer is column-major,
//! so every conversion copies element by element.

use faer::Mat;
use ndarray::{Array1, Array2};

/// Copy an ndarray matrix into a faer matrix.
pub fn ndarray_to_faer(arr: &Array2<f64>) -> Mat<f64> {
    Mat::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

/// Copy a vector into a single-column faer matrix.
pub fn ndarray_vec_to_faer(vec: &Array1<f64>) -> Mat<f64> {
    Mat::from_fn(vec.len(), 1, |i, _| vec[i])
}

/// First column of a faer matrix as an ndarray vector.
pub fn faer_vec_to_ndarray(mat: &Mat<f64>) -> Array1<f64> {
    Array1::from_iter((0..mat.nrows()).map(|i| mat[(i, 0)]))
}
