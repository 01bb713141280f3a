// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Structured layer inputs and outputs.
//!
//! Layers are not restricted to single tensors: a layer may emit a pair
//! (or any nested tuple) that the next layer consumes whole. [`Bundle`]
//! is that shape-agnostic carrier. The profiler only ever needs one
//! scalar reduction of a bundle — the synthetic sum-of-all-leaves loss —
//! whose gradient seed is [`Bundle::ones_like`].

use crate::{ModelError, Tensor};

/// A single tensor or an ordered tuple of nested bundles.
#[derive(Debug, Clone)]
pub enum Bundle {
    One(Tensor),
    Many(Vec<Bundle>),
}

impl Bundle {
    /// Wraps a pair of bundles, the common structured case.
    pub fn pair(first: Bundle, second: Bundle) -> Self {
        Bundle::Many(vec![first, second])
    }

    fn kind(&self) -> &'static str {
        match self {
            Bundle::One(_) => "a single tensor",
            Bundle::Many(_) => "a tuple",
        }
    }

    /// Unwraps a single-tensor bundle.
    pub fn expect_one(&self) -> Result<&Tensor, ModelError> {
        match self {
            Bundle::One(t) => Ok(t),
            other => Err(ModelError::BundleMismatch {
                expected: "a single tensor",
                actual: other.kind(),
            }),
        }
    }

    /// Unwraps a two-element tuple bundle.
    pub fn expect_pair(&self) -> Result<(&Bundle, &Bundle), ModelError> {
        match self {
            Bundle::Many(items) if items.len() == 2 => Ok((&items[0], &items[1])),
            other => Err(ModelError::BundleMismatch {
                expected: "a pair",
                actual: other.kind(),
            }),
        }
    }

    /// All tensor leaves, in order.
    pub fn leaves(&self) -> Vec<&Tensor> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Tensor>) {
        match self {
            Bundle::One(t) => out.push(t),
            Bundle::Many(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
        }
    }

    /// The gradient seed of the synthetic scalar loss `sum(all leaves)`:
    /// a structurally identical bundle of all-ones tensors.
    pub fn ones_like(&self) -> Bundle {
        match self {
            Bundle::One(t) => Bundle::One(t.ones_like()),
            Bundle::Many(items) => Bundle::Many(items.iter().map(Bundle::ones_like).collect()),
        }
    }

    /// Total bytes across all leaves.
    pub fn total_bytes(&self) -> usize {
        self.leaves().iter().map(|t| t.size_bytes()).sum()
    }
}

impl From<Tensor> for Bundle {
    fn from(tensor: Tensor) -> Self {
        Bundle::One(tensor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expect_one() {
        let b = Bundle::One(Tensor::zeros(&[2]));
        assert!(b.expect_one().is_ok());
        assert!(b.expect_pair().is_err());
    }

    #[test]
    fn test_pair_round_trip() {
        let b = Bundle::pair(Tensor::zeros(&[2]).into(), Tensor::ones(&[3]).into());
        let (first, second) = b.expect_pair().unwrap();
        assert_eq!(first.expect_one().unwrap().numel(), 2);
        assert_eq!(second.expect_one().unwrap().numel(), 3);
        assert!(b.expect_one().is_err());
    }

    #[test]
    fn test_leaves_are_ordered() {
        let b = Bundle::pair(
            Tensor::filled(&[1], 1.0).into(),
            Bundle::pair(Tensor::filled(&[1], 2.0).into(), Tensor::filled(&[1], 3.0).into()),
        );
        let values: Vec<f32> = b.leaves().iter().map(|t| t.as_slice()[0]).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_ones_like_mirrors_structure() {
        let b = Bundle::pair(Tensor::rand(&[4]).into(), Tensor::rand(&[2, 2]).into());
        let seed = b.ones_like();
        let (first, second) = seed.expect_pair().unwrap();
        assert_eq!(first.expect_one().unwrap().shape(), &[4]);
        assert_eq!(second.expect_one().unwrap().shape(), &[2, 2]);
        assert!(seed.leaves().iter().all(|t| t.as_slice().iter().all(|&v| v == 1.0)));
    }

    #[test]
    fn test_total_bytes() {
        let b = Bundle::pair(Tensor::zeros(&[4]).into(), Tensor::zeros(&[2]).into());
        assert_eq!(b.total_bytes(), 6 * 4);
    }
}
