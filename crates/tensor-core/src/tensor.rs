// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Core tensor type.

use crate::{Shape, TensorError};

/// An owned, n-dimensional `f32` tensor stored in contiguous memory.
///
/// `Tensor` is the data carrier between forecast steps. Every constructor
/// checks that the buffer length matches the shape, so a `Tensor` value
/// always has `data.len() == shape.num_elements()`.
///
/// # Memory Layout
/// Row-major (C) order. Serialised form is little-endian, matching the
/// SafeTensors `F32` encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Creates a new tensor filled with zeros.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::zeros(Shape::new(vec![2, 3]));
    /// assert_eq!(t.size_bytes(), 24); // 2 * 3 * 4 bytes
    /// ```
    pub fn zeros(shape: Shape) -> Self {
        let n = shape.num_elements();
        Self {
            shape,
            data: vec![0.0; n],
        }
    }

    /// Takes ownership of `data` as a tensor of the given shape.
    pub fn from_vec(shape: Shape, data: Vec<f32>) -> Result<Self, TensorError> {
        let expected = shape.num_elements();
        if data.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                shape,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Creates a tensor by copying a slice of `f32` values.
    ///
    /// # Examples
    /// ```
    /// use tensor_core::{Tensor, Shape};
    /// let t = Tensor::from_f32(Shape::vector(3), &[1.0, 2.0, 3.0]).unwrap();
    /// assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0]);
    /// ```
    pub fn from_f32(shape: Shape, values: &[f32]) -> Result<Self, TensorError> {
        Self::from_vec(shape, values.to_vec())
    }

    /// Decodes a little-endian `f32` byte buffer.
    pub fn from_le_bytes(shape: Shape, bytes: &[u8]) -> Result<Self, TensorError> {
        let expected = shape.size_bytes();
        if bytes.len() != expected {
            return Err(TensorError::BufferSizeMismatch {
                expected: shape.num_elements(),
                actual: bytes.len() / std::mem::size_of::<f32>(),
                shape,
            });
        }
        let data = bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();
        Ok(Self { shape, data })
    }

    /// Encodes the buffer as little-endian bytes.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.data.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    /// Returns the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Shorthand for `self.shape().dims()`.
    pub fn dims(&self) -> &[usize] {
        self.shape.dims()
    }

    /// Returns the rank.
    pub fn rank(&self) -> usize {
        self.shape.rank()
    }

    /// Returns the memory footprint of this tensor in bytes.
    pub fn size_bytes(&self) -> usize {
        self.shape.size_bytes()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the tensor and returns its buffer.
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Reinterprets the buffer under a new shape with the same element count.
    pub fn reshape(self, shape: Shape) -> Result<Tensor, TensorError> {
        if shape.num_elements() != self.data.len() {
            return Err(TensorError::ShapeMismatch {
                op: "reshape",
                lhs: self.shape,
                rhs: shape,
            });
        }
        Ok(Self {
            shape,
            data: self.data,
        })
    }

    /// Fills the tensor with a constant value.
    pub fn fill(&mut self, value: f32) {
        self.data.iter_mut().for_each(|x| *x = value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros() {
        let t = Tensor::zeros(Shape::new(vec![2, 3]));
        assert_eq!(t.size_bytes(), 24);
        assert_eq!(t.dims(), &[2, 3]);
        assert!(t.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_from_vec_size_mismatch() {
        let result = Tensor::from_vec(Shape::new(vec![2, 3]), vec![0.0; 5]);
        assert!(matches!(
            result,
            Err(TensorError::BufferSizeMismatch { expected: 6, actual: 5, .. })
        ));
    }

    #[test]
    fn test_le_bytes_roundtrip() {
        let t = Tensor::from_f32(Shape::vector(3), &[1.5, -2.0, 90.0]).unwrap();
        let bytes = t.to_le_bytes();
        assert_eq!(bytes.len(), 12);
        let back = Tensor::from_le_bytes(Shape::vector(3), &bytes).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_from_le_bytes_rejects_short_buffer() {
        assert!(Tensor::from_le_bytes(Shape::vector(3), &[0u8; 8]).is_err());
    }

    #[test]
    fn test_reshape() {
        let t = Tensor::from_f32(Shape::new(vec![2, 3]), &[1.0; 6]).unwrap();
        let r = t.clone().reshape(Shape::new(vec![1, 6])).unwrap();
        assert_eq!(r.dims(), &[1, 6]);
        assert!(t.reshape(Shape::vector(5)).is_err());
    }

    #[test]
    fn test_fill() {
        let mut t = Tensor::zeros(Shape::vector(5));
        t.fill(3.14);
        assert!(t.as_slice().iter().all(|&x| (x - 3.14).abs() < 1e-6));
    }
}
