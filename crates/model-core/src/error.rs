// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for tensors, bundles, and layers.

/// Errors raised by tensor operations and layer execution.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Two shapes that must agree do not.
    #[error("shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A buffer does not hold the number of elements its shape implies.
    #[error("buffer size mismatch: shape implies {expected} element(s), got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    /// A bundle had the wrong structure for the consuming layer.
    #[error("bundle mismatch: expected {expected}, got {actual}")]
    BundleMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A state dict is missing an entry the module requires.
    #[error("missing state entry '{key}'")]
    MissingStateKey { key: String },

    /// A layer's own computation failed.
    #[error("layer '{layer}' failed: {detail}")]
    LayerFailed { layer: String, detail: String },
}
