// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The [`Layer`] trait and the [`Sequential`] container.
//!
//! A layer is anything that can produce an output bundle from an input
//! bundle and, on demand, propagate a gradient back through itself. The
//! trait is deliberately narrow — forward computation plus state
//! accessors — so any type satisfying it is profileable; there is no
//! class hierarchy.
//!
//! Persistent state is exposed through flat dotted-key state dicts
//! (`"0.weight"`, `"0.weight.grad"`, `"1.running_mean"`, …) covering
//! parameters, their accumulated gradients, and buffers. That is exactly
//! the set a sandbox must capture to make an execution unobservable.

use crate::{Bundle, ModelError, Tensor};
use std::collections::BTreeMap;

/// Flat mapping from dotted state keys to tensors.
pub type StateDict = BTreeMap<String, Tensor>;

/// A trainable value with its optionally accumulated gradient.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub value: Tensor,
    pub grad: Option<Tensor>,
}

impl Parameter {
    pub fn new(value: Tensor) -> Self {
        Self { value, grad: None }
    }

    /// Accumulates `grad` into this parameter's gradient, allocating it
    /// on first use (the usual lazy `.grad` behaviour).
    pub fn accumulate_grad(&mut self, grad: &Tensor) -> Result<(), ModelError> {
        match &mut self.grad {
            Some(existing) => existing.add_assign(grad),
            slot => {
                *slot = Some(grad.clone());
                Ok(())
            }
        }
    }

    /// Number of elements in the parameter value.
    pub fn numel(&self) -> usize {
        self.value.numel()
    }

    /// Writes `value` (and `value.grad`, when present) under `key`.
    pub fn write_state(&self, key: &str, out: &mut StateDict) {
        out.insert(key.to_string(), self.value.clone());
        if let Some(grad) = &self.grad {
            out.insert(format!("{key}.grad"), grad.clone());
        }
    }

    /// Restores `value` and `value.grad` from `state`.
    ///
    /// A missing gradient entry clears the accumulated gradient, so a
    /// parameter that was grad-free before a snapshot becomes grad-free
    /// again on restore.
    pub fn read_state(&mut self, key: &str, state: &StateDict) -> Result<(), ModelError> {
        self.value = state
            .get(key)
            .cloned()
            .ok_or_else(|| ModelError::MissingStateKey { key: key.to_string() })?;
        self.grad = state.get(&format!("{key}.grad")).cloned();
        Ok(())
    }
}

/// A unit of computation in a sequential network.
///
/// Stateless layers only implement [`forward`](Layer::forward); the
/// remaining methods default to "no state, identity gradient, always in
/// training mode".
pub trait Layer {
    /// Computes the output bundle for `input`.
    fn forward(&mut self, input: &Bundle) -> Result<Bundle, ModelError>;

    /// Propagates `grad` (structured like this layer's output) back to a
    /// gradient structured like its input, accumulating parameter
    /// gradients along the way.
    ///
    /// The default passes the gradient through unchanged, which is exact
    /// for any parameter-free layer whose Jacobian is the identity.
    fn backward(&mut self, grad: &Bundle) -> Result<Bundle, ModelError> {
        Ok(grad.clone())
    }

    /// Writes all persistent state (parameters, gradients, buffers) into
    /// `out`, with every key prefixed by `prefix`.
    fn state_dict(&self, prefix: &str, out: &mut StateDict) {
        let _ = (prefix, out);
    }

    /// Restores all persistent state previously written by
    /// [`state_dict`](Layer::state_dict) under the same prefix.
    fn load_state_dict(&mut self, prefix: &str, state: &StateDict) -> Result<(), ModelError> {
        let _ = (prefix, state);
        Ok(())
    }

    /// Switches between training and evaluation behaviour.
    fn set_training(&mut self, mode: bool) {
        let _ = mode;
    }

    /// Current mode flag.
    fn training(&self) -> bool {
        true
    }

    /// Appends the mode flag of this layer and every sub-layer, in a
    /// stable order. Containers override this to include their children.
    fn mode_flags(&self, out: &mut Vec<bool>) {
        out.push(self.training());
    }

    /// Total number of trainable parameter elements.
    fn parameter_elements(&self) -> usize {
        0
    }
}

/// An ordered composition of layers, itself a [`Layer`].
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
    training: bool,
}

impl Sequential {
    /// Builds a sequential network. Layers keep whatever mode they were
    /// constructed in until [`train`](Sequential::train) or
    /// [`eval`](Sequential::eval) is called.
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Self {
        Self {
            layers,
            training: true,
        }
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Whether the network has no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Mutable access to the layer at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of bounds.
    pub fn layer_mut(&mut self, index: usize) -> &mut dyn Layer {
        self.layers[index].as_mut()
    }

    /// Puts the network and every layer into training mode.
    pub fn train(&mut self) {
        self.set_training(true);
    }

    /// Puts the network and every layer into evaluation mode.
    pub fn eval(&mut self) {
        self.set_training(false);
    }
}

impl Layer for Sequential {
    fn forward(&mut self, input: &Bundle) -> Result<Bundle, ModelError> {
        let mut current = input.clone();
        for layer in &mut self.layers {
            current = layer.forward(&current)?;
        }
        Ok(current)
    }

    fn backward(&mut self, grad: &Bundle) -> Result<Bundle, ModelError> {
        let mut current = grad.clone();
        for layer in self.layers.iter_mut().rev() {
            current = layer.backward(&current)?;
        }
        Ok(current)
    }

    fn state_dict(&self, prefix: &str, out: &mut StateDict) {
        for (index, layer) in self.layers.iter().enumerate() {
            layer.state_dict(&format!("{prefix}{index}."), out);
        }
    }

    fn load_state_dict(&mut self, prefix: &str, state: &StateDict) -> Result<(), ModelError> {
        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.load_state_dict(&format!("{prefix}{index}."), state)?;
        }
        Ok(())
    }

    fn set_training(&mut self, mode: bool) {
        self.training = mode;
        for layer in &mut self.layers {
            layer.set_training(mode);
        }
    }

    fn training(&self) -> bool {
        self.training
    }

    fn mode_flags(&self, out: &mut Vec<bool>) {
        out.push(self.training);
        for layer in &self.layers {
            layer.mode_flags(out);
        }
    }

    fn parameter_elements(&self) -> usize {
        self.layers.iter().map(|l| l.parameter_elements()).sum()
    }
}

impl std::fmt::Debug for Sequential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequential")
            .field("layers", &self.layers.len())
            .field("training", &self.training)
            .finish()
    }
}
