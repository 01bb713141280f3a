// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the cost profiler.

use block_partition::PartitionError;
use sandbox_executor::SandboxError;

/// Errors surfaced by a balancing call.
///
/// Solver rejections and execution failures pass through transparently,
/// so the caller sees the original error, not a wrapper.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Invalid partition request (bad stage count, too few layers).
    #[error(transparent)]
    Partition(#[from] PartitionError),

    /// The sandboxed execution failed (layer error or broken isolation
    /// invariant). State was restored before this surfaced.
    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    /// The profiling options themselves are unusable.
    #[error("invalid profiling options: {0}")]
    InvalidOptions(String),
}
