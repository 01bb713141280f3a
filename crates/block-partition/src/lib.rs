// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # block-partition
//!
//! Splits an ordered sequence of non-negative weights into exactly `k`
//! contiguous, non-empty groups so that the largest group sum is as small
//! as possible. This is the balancing primitive behind pipeline stage
//! assignment: one weight per layer, one group per stage, and no stage
//! becomes the bottleneck.
//!
//! The solver is exact, side-effect free, and deterministic: when several
//! partitionings achieve the same minimal maximum sum, extra splits are
//! pushed toward the *later* groups, so earlier stages come out fuller.
//!
//! # Example
//! ```
//! use block_partition::solve;
//!
//! let groups = solve(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2).unwrap();
//! assert_eq!(groups, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0]]);
//! ```

mod error;
mod solver;

pub use error::PartitionError;
pub use solver::{solve, validate_args};
