// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Owned, contiguous `f32` tensors with allocation accounting.
//!
//! Data is stored in row-major order as a flat buffer. Every construction
//! and drop is reported to the [`alloc`](crate::alloc) gauge so the
//! profiler can observe the latent footprint of a computation.

use crate::{alloc, ModelError};
use rand::Rng;

/// An owned n-dimensional `f32` tensor.
#[derive(Debug)]
pub struct Tensor {
    shape: Vec<usize>,
    data: Vec<f32>,
}

impl Tensor {
    fn with_data(shape: &[usize], data: Vec<f32>) -> Self {
        let t = Self {
            shape: shape.to_vec(),
            data,
        };
        alloc::record_alloc(t.size_bytes());
        t
    }

    /// Creates a tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use model_core::Tensor;
    /// let t = Tensor::zeros(&[2, 3]);
    /// assert_eq!(t.numel(), 6);
    /// assert_eq!(t.size_bytes(), 24);
    /// ```
    pub fn zeros(shape: &[usize]) -> Self {
        Self::filled(shape, 0.0)
    }

    /// Creates a tensor filled with ones.
    pub fn ones(shape: &[usize]) -> Self {
        Self::filled(shape, 1.0)
    }

    /// Creates a tensor filled with `value`.
    pub fn filled(shape: &[usize], value: f32) -> Self {
        let numel = shape.iter().product();
        Self::with_data(shape, vec![value; numel])
    }

    /// Creates a tensor of uniform random values in `[0, 1)`.
    pub fn rand(shape: &[usize]) -> Self {
        let numel: usize = shape.iter().product();
        let mut rng = rand::thread_rng();
        let data = (0..numel).map(|_| rng.gen::<f32>()).collect();
        Self::with_data(shape, data)
    }

    /// Creates a tensor from explicit values.
    ///
    /// Returns an error if `values.len()` disagrees with the shape.
    pub fn from_values(shape: &[usize], values: Vec<f32>) -> Result<Self, ModelError> {
        let expected: usize = shape.iter().product();
        if values.len() != expected {
            return Err(ModelError::BufferSizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        Ok(Self::with_data(shape, values))
    }

    /// Zero tensor with the same shape as `self`.
    pub fn zeros_like(&self) -> Self {
        Self::zeros(&self.shape)
    }

    /// All-ones tensor with the same shape as `self`.
    pub fn ones_like(&self) -> Self {
        Self::ones(&self.shape)
    }

    /// Uniform random tensor with the same shape as `self`.
    pub fn rand_like(&self) -> Self {
        Self::rand(&self.shape)
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Returns the number of elements.
    pub fn numel(&self) -> usize {
        self.data.len()
    }

    /// Returns the memory footprint in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    /// Returns the flat element slice.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Returns the flat element slice, mutably.
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Element-wise sum with another tensor of identical shape.
    pub fn add(&self, other: &Tensor) -> Result<Tensor, ModelError> {
        if self.shape != other.shape {
            return Err(ModelError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();
        Ok(Self::with_data(&self.shape, data))
    }

    /// Element-wise accumulation in place.
    pub fn add_assign(&mut self, other: &Tensor) -> Result<(), ModelError> {
        if self.shape != other.shape {
            return Err(ModelError::ShapeMismatch {
                expected: self.shape.clone(),
                actual: other.shape.clone(),
            });
        }
        for (a, b) in self.data.iter_mut().zip(&other.data) {
            *a += b;
        }
        Ok(())
    }

    /// Returns a copy scaled by `factor`.
    pub fn scale(&self, factor: f32) -> Tensor {
        let data = self.data.iter().map(|v| v * factor).collect();
        Self::with_data(&self.shape, data)
    }

    /// Sum of all elements.
    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Element-wise approximate equality, shape included.
    pub fn allclose(&self, other: &Tensor, tolerance: f32) -> bool {
        self.shape == other.shape
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Clone for Tensor {
    fn clone(&self) -> Self {
        Self::with_data(&self.shape, self.data.clone())
    }
}

impl Drop for Tensor {
    fn drop(&mut self) {
        alloc::record_free(self.size_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_and_shape() {
        let t = Tensor::zeros(&[2, 4]);
        assert_eq!(t.shape(), &[2, 4]);
        assert_eq!(t.numel(), 8);
        assert!(t.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_from_values_rejects_bad_length() {
        assert!(matches!(
            Tensor::from_values(&[2, 2], vec![1.0, 2.0, 3.0]),
            Err(ModelError::BufferSizeMismatch {
                expected: 4,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_add() {
        let a = Tensor::from_values(&[3], vec![1.0, 2.0, 3.0]).unwrap();
        let b = Tensor::ones(&[3]);
        let c = a.add(&b).unwrap();
        assert_eq!(c.as_slice(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_add_shape_mismatch() {
        let a = Tensor::zeros(&[2]);
        let b = Tensor::zeros(&[3]);
        assert!(matches!(a.add(&b), Err(ModelError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_scale_and_sum() {
        let t = Tensor::from_values(&[2], vec![1.5, 2.5]).unwrap();
        assert_eq!(t.scale(2.0).as_slice(), &[3.0, 5.0]);
        assert_eq!(t.sum(), 4.0);
    }

    #[test]
    fn test_allclose() {
        let a = Tensor::from_values(&[2], vec![1.0, 2.0]).unwrap();
        let b = Tensor::from_values(&[2], vec![1.0 + 1e-7, 2.0]).unwrap();
        assert!(a.allclose(&b, 1e-5));
        assert!(!a.allclose(&Tensor::zeros(&[2]), 1e-5));
        assert!(!a.allclose(&Tensor::zeros(&[3]), 1e-5));
    }

    #[test]
    fn test_rand_in_unit_interval() {
        let t = Tensor::rand(&[100]);
        assert!(t.as_slice().iter().all(|&v| (0.0..1.0).contains(&v)));
    }
}
