// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # cost-profiler
//!
//! Turns a live sequential network into a pipeline stage assignment.
//! Every layer is executed — forward and backward — inside the sandbox
//! to measure its real cost, then the block partitioner splits the cost
//! sequence into stages so no stage becomes the bottleneck.
//!
//! Two interchangeable cost metrics:
//! - [`balance_by_time`]: elapsed wall-clock time per layer, for
//!   throughput-bound pipelines;
//! - [`balance_by_size`]: peak activation/gradient bytes per layer,
//!   optionally blended with static parameter size, for memory-bound
//!   placement.
//!
//! Both return the stage assignment as layer counts and leave the
//! network's parameters, buffers, gradients, and mode flags untouched.
//!
//! # Example
//! ```
//! use cost_profiler::{balance_by_time, TimingOptions};
//! use model_core::layers::Linear;
//! use model_core::{Bundle, Layer, Sequential, Tensor};
//!
//! let mut model = Sequential::new(
//!     (0..4).map(|_| Box::new(Linear::new(8, 8)) as Box<dyn Layer>).collect(),
//! );
//! let sample = Bundle::One(Tensor::rand(&[1, 8]));
//!
//! let stages = balance_by_time(2, &mut model, &sample, &TimingOptions::default()).unwrap();
//! assert_eq!(stages.iter().sum::<usize>(), 4);
//! ```

mod by_size;
mod by_time;
mod error;

pub use by_size::{balance_by_size, SizeOptions};
pub use by_time::{balance_by_time, TimingOptions};
pub use error::ProfileError;

/// Hands a measured cost sequence to the partitioner and converts the
/// resulting grouping into per-stage layer counts.
fn balance_from_costs(costs: &[f64], partitions: usize) -> Result<Vec<usize>, ProfileError> {
    let groups = block_partition::solve(costs, partitions)?;
    let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
    tracing::info!(?sizes, partitions, "stage balance computed");
    Ok(sizes)
}
