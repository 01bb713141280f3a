// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the sandbox executor.

use model_core::ModelError;

/// Errors surfaced by a sandboxed execution.
#[derive(Debug, thiserror::Error)]
pub enum SandboxError {
    /// The wrapped execution itself failed. State was restored before
    /// this was surfaced, and the original error is passed through
    /// unmodified.
    #[error(transparent)]
    Execution(#[from] ModelError),

    /// Writing the snapshot back into the module failed. This is an
    /// internal invariant violation: the module no longer matches the
    /// state captured from it.
    #[error("snapshot restore failed, isolation guarantee broken: {0}")]
    RestoreFailed(ModelError),

    /// A mode flag did not survive restoration. Internal invariant
    /// violation: measurement must never flip training/evaluation mode.
    #[error(
        "mode flag {index} corrupted after restore: expected training={expected}, found training={found}"
    )]
    ModeCorrupted {
        index: usize,
        expected: bool,
        found: bool,
    },
}
