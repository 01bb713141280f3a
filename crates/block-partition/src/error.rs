// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the block partitioner.

/// Errors that can occur while partitioning a weight sequence.
#[derive(Debug, thiserror::Error)]
pub enum PartitionError {
    /// The requested partition count is zero.
    #[error("partition count must be positive, got {got}")]
    NonPositivePartitions { got: usize },

    /// The sequence is too short to form the requested number of
    /// non-empty contiguous groups. Includes the empty-sequence case.
    #[error("cannot split {len} element(s) into {partitions} non-empty contiguous group(s)")]
    TooFewElements { len: usize, partitions: usize },

    /// A weight is negative or not finite.
    #[error("weight at index {index} must be a non-negative finite number, got {value}")]
    InvalidWeight { index: usize, value: f64 },
}
