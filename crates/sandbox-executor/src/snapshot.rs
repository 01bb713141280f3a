// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Point-in-time captures of a module's persistent state.
//!
//! A [`StateSnapshot`] is ephemeral by design: it exists for the
//! duration of one sandboxed measurement and is discarded as soon as the
//! module has been restored from it. It covers everything externally
//! observable — parameters, accumulated gradients, buffers, and the
//! training/evaluation flag of every sub-component.

use crate::SandboxError;
use model_core::{Layer, StateDict};

/// An exact copy of a module's persistent state and mode flags.
#[derive(Debug)]
pub struct StateSnapshot {
    state: StateDict,
    mode_flags: Vec<bool>,
}

impl StateSnapshot {
    /// Captures the module's full state dict and the mode flag of every
    /// sub-component.
    pub fn capture(module: &(impl Layer + ?Sized)) -> Self {
        let mut state = StateDict::new();
        module.state_dict("", &mut state);
        let mut mode_flags = Vec::new();
        module.mode_flags(&mut mode_flags);
        tracing::trace!(
            entries = state.len(),
            components = mode_flags.len(),
            "state snapshot captured"
        );
        Self { state, mode_flags }
    }

    /// Number of state entries captured.
    pub fn len(&self) -> usize {
        self.state.len()
    }

    /// Whether the snapshot holds no state entries (mode flags may still
    /// be present).
    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    /// Writes the captured state back into `module` and verifies that
    /// every mode flag matches the capture.
    ///
    /// # Errors
    /// - [`SandboxError::RestoreFailed`] if the module rejects the
    ///   snapshot (its state keys no longer line up).
    /// - [`SandboxError::ModeCorrupted`] if any sub-component's
    ///   training/evaluation flag changed. Restoration never writes mode
    ///   flags, so a mismatch means the measured execution flipped one —
    ///   a broken isolation guarantee, not a user error.
    pub fn restore(&self, module: &mut (impl Layer + ?Sized)) -> Result<(), SandboxError> {
        module
            .load_state_dict("", &self.state)
            .map_err(SandboxError::RestoreFailed)?;

        let mut current = Vec::with_capacity(self.mode_flags.len());
        module.mode_flags(&mut current);
        for (index, (&expected, &found)) in self.mode_flags.iter().zip(&current).enumerate() {
            if expected != found {
                return Err(SandboxError::ModeCorrupted {
                    index,
                    expected,
                    found,
                });
            }
        }
        tracing::trace!(entries = self.state.len(), "state snapshot restored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_core::layers::{Linear, RunningNorm};
    use model_core::{Bundle, Sequential, Tensor};

    fn model() -> Sequential {
        Sequential::new(vec![Box::new(Linear::new(3, 3)), Box::new(RunningNorm::new(3))])
    }

    #[test]
    fn test_capture_and_restore_round_trip() {
        let mut m = model();
        let snapshot = StateSnapshot::capture(&m);
        assert!(!snapshot.is_empty());

        let out = m.forward(&Bundle::One(Tensor::rand(&[4, 3]))).unwrap();
        m.backward(&out.ones_like()).unwrap();
        snapshot.restore(&mut m).unwrap();

        let after = StateSnapshot::capture(&m);
        assert_eq!(snapshot.len(), after.len());
        for (key, value) in &snapshot.state {
            assert!(
                after.state[key].allclose(value, 0.0),
                "state entry {key} drifted"
            );
        }
    }

    #[test]
    fn test_mode_flags_captured_per_component() {
        let mut m = model();
        m.eval();
        let snapshot = StateSnapshot::capture(&m);
        // Root plus two layers.
        assert_eq!(snapshot.mode_flags, vec![false, false, false]);
    }

    #[test]
    fn test_mode_corruption_detected() {
        let mut m = model();
        m.eval();
        let snapshot = StateSnapshot::capture(&m);
        m.train();
        let err = snapshot.restore(&mut m).unwrap_err();
        assert!(matches!(err, SandboxError::ModeCorrupted { index: 0, .. }));
    }
}
