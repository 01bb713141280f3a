// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # sandbox-executor
//!
//! Runs a live, stateful network so that nothing observable survives the
//! run: parameters, accumulated gradients, buffers, and every
//! training/evaluation flag are bit-identical afterwards, whether the
//! execution returned normally or failed. This is what lets the profiler
//! execute real forward and backward passes for measurement without
//! corrupting the caller's network.
//!
//! The snapshot and restore form a guaranteed acquire/release pair
//! around the execution region: the snapshot is taken before the
//! operation runs, the restore happens on both the success and the error
//! path, and the operation's own error — if any — is re-raised unchanged
//! only after the state is back.
//!
//! # Example
//! ```
//! use model_core::{Bundle, Sequential, Tensor};
//! use model_core::layers::RunningNorm;
//! use sandbox_executor::{forward_backward, run_sandboxed};
//!
//! let mut model = Sequential::new(vec![Box::new(RunningNorm::new(3))]);
//! let input = Bundle::One(Tensor::rand(&[4, 3]));
//!
//! // Executes a buffer-mutating training forward, yet the running
//! // statistics are untouched afterwards.
//! let output = run_sandboxed(&mut model, |m| forward_backward(m, &input)).unwrap();
//! assert_eq!(output.expect_one().unwrap().shape(), &[4, 3]);
//! ```

mod error;
mod snapshot;

pub use error::SandboxError;
pub use snapshot::StateSnapshot;

use model_core::{Bundle, Layer, ModelError};

/// Runs `op` against `module` inside a snapshot/restore scope.
///
/// The restore runs on every exit path. If `op` fails, its error is
/// surfaced unmodified (wrapped transparently) *after* the module's
/// state is back; if the restore itself fails or a mode flag changed,
/// that invariant violation takes precedence, since it means the
/// isolation guarantee is broken.
pub fn run_sandboxed<L, T, F>(module: &mut L, op: F) -> Result<T, SandboxError>
where
    L: Layer + ?Sized,
    F: FnOnce(&mut L) -> Result<T, ModelError>,
{
    let snapshot = StateSnapshot::capture(module);
    let result = op(module);
    snapshot.restore(module)?;
    Ok(result?)
}

/// One measurement execution: forward pass, then a backward pass driven
/// by the synthetic scalar loss `sum(all output leaves)`. Returns the
/// forward output so callers can feed it to the next layer.
///
/// Only meaningful inside a sandbox scope — the backward pass deposits
/// gradients into the module.
pub fn forward_backward<L>(module: &mut L, input: &Bundle) -> Result<Bundle, ModelError>
where
    L: Layer + ?Sized,
{
    let output = module.forward(input)?;
    let seed = output.ones_like();
    module.backward(&seed)?;
    Ok(output)
}
