// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Concrete layers: [`Linear`], [`Relu`], and [`RunningNorm`].
//!
//! These cover the three state classes the sandbox has to isolate:
//! trainable parameters with accumulated gradients (`Linear`), no state
//! at all (`Relu`), and buffers mutated by a training-mode forward pass
//! (`RunningNorm`'s running statistics).
//!
//! Backward passes are hand-written. `RunningNorm` treats its running
//! statistics as constants in the backward pass; the mean/var gradient
//! paths are not needed by anything in this workspace.

use crate::{Bundle, Layer, ModelError, Parameter, StateDict, Tensor};

/// Checks that `tensor` is 2-D with the given trailing dimension and
/// returns the leading (batch) dimension.
fn batch_of(tensor: &Tensor, features: usize) -> Result<usize, ModelError> {
    match tensor.shape() {
        &[batch, f] if f == features => Ok(batch),
        other => Err(ModelError::ShapeMismatch {
            expected: vec![0, features],
            actual: other.to_vec(),
        }),
    }
}

// ── Linear ─────────────────────────────────────────────────────

/// A fully connected layer: `y = x Wᵀ + b`.
#[derive(Debug)]
pub struct Linear {
    in_features: usize,
    out_features: usize,
    weight: Parameter,
    bias: Parameter,
    training: bool,
    cached_input: Option<Tensor>,
}

impl Linear {
    /// Creates a layer with uniform random weights in `[0, 1)`.
    pub fn new(in_features: usize, out_features: usize) -> Self {
        Self {
            in_features,
            out_features,
            weight: Parameter::new(Tensor::rand(&[out_features, in_features])),
            bias: Parameter::new(Tensor::zeros(&[out_features])),
            training: true,
            cached_input: None,
        }
    }
}

impl Layer for Linear {
    fn forward(&mut self, input: &Bundle) -> Result<Bundle, ModelError> {
        let x = input.expect_one()?;
        let batch = batch_of(x, self.in_features)?;

        let w = self.weight.value.as_slice();
        let b = self.bias.value.as_slice();
        let xs = x.as_slice();

        let mut out = vec![0.0f32; batch * self.out_features];
        for bi in 0..batch {
            for o in 0..self.out_features {
                let mut acc = b[o];
                let row = &w[o * self.in_features..(o + 1) * self.in_features];
                for (i, wv) in row.iter().enumerate() {
                    acc += xs[bi * self.in_features + i] * wv;
                }
                out[bi * self.out_features + o] = acc;
            }
        }

        self.cached_input = Some(x.clone());
        Ok(Bundle::One(Tensor::from_values(
            &[batch, self.out_features],
            out,
        )?))
    }

    fn backward(&mut self, grad: &Bundle) -> Result<Bundle, ModelError> {
        let g = grad.expect_one()?;
        let batch = batch_of(g, self.out_features)?;
        let x = self.cached_input.as_ref().ok_or_else(|| ModelError::LayerFailed {
            layer: "linear".into(),
            detail: "backward called before forward".into(),
        })?;
        let xs = x.as_slice();
        let gs = g.as_slice();
        let w = self.weight.value.as_slice();

        let mut grad_w = vec![0.0f32; self.out_features * self.in_features];
        let mut grad_b = vec![0.0f32; self.out_features];
        let mut grad_x = vec![0.0f32; batch * self.in_features];

        for bi in 0..batch {
            for o in 0..self.out_features {
                let gv = gs[bi * self.out_features + o];
                grad_b[o] += gv;
                for i in 0..self.in_features {
                    grad_w[o * self.in_features + i] += gv * xs[bi * self.in_features + i];
                    grad_x[bi * self.in_features + i] += gv * w[o * self.in_features + i];
                }
            }
        }

        self.weight.accumulate_grad(&Tensor::from_values(
            &[self.out_features, self.in_features],
            grad_w,
        )?)?;
        self.bias
            .accumulate_grad(&Tensor::from_values(&[self.out_features], grad_b)?)?;
        Ok(Bundle::One(Tensor::from_values(
            &[batch, self.in_features],
            grad_x,
        )?))
    }

    fn state_dict(&self, prefix: &str, out: &mut StateDict) {
        self.weight.write_state(&format!("{prefix}weight"), out);
        self.bias.write_state(&format!("{prefix}bias"), out);
    }

    fn load_state_dict(&mut self, prefix: &str, state: &StateDict) -> Result<(), ModelError> {
        self.weight.read_state(&format!("{prefix}weight"), state)?;
        self.bias.read_state(&format!("{prefix}bias"), state)?;
        Ok(())
    }

    fn set_training(&mut self, mode: bool) {
        self.training = mode;
    }

    fn training(&self) -> bool {
        self.training
    }

    fn parameter_elements(&self) -> usize {
        self.weight.numel() + self.bias.numel()
    }
}

// ── Relu ───────────────────────────────────────────────────────

/// Element-wise `max(0, x)`.
#[derive(Debug)]
pub struct Relu {
    training: bool,
    cached_mask: Option<Vec<bool>>,
}

impl Relu {
    pub fn new() -> Self {
        Self {
            training: true,
            cached_mask: None,
        }
    }
}

impl Default for Relu {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for Relu {
    fn forward(&mut self, input: &Bundle) -> Result<Bundle, ModelError> {
        let x = input.expect_one()?;
        let mask: Vec<bool> = x.as_slice().iter().map(|&v| v > 0.0).collect();
        let out = x
            .as_slice()
            .iter()
            .map(|&v| if v > 0.0 { v } else { 0.0 })
            .collect();
        self.cached_mask = Some(mask);
        Ok(Bundle::One(Tensor::from_values(x.shape(), out)?))
    }

    fn backward(&mut self, grad: &Bundle) -> Result<Bundle, ModelError> {
        let g = grad.expect_one()?;
        let mask = self.cached_mask.as_ref().ok_or_else(|| ModelError::LayerFailed {
            layer: "relu".into(),
            detail: "backward called before forward".into(),
        })?;
        if mask.len() != g.numel() {
            return Err(ModelError::BufferSizeMismatch {
                expected: mask.len(),
                actual: g.numel(),
            });
        }
        let out = g
            .as_slice()
            .iter()
            .zip(mask)
            .map(|(&v, &keep)| if keep { v } else { 0.0 })
            .collect();
        Ok(Bundle::One(Tensor::from_values(g.shape(), out)?))
    }

    fn set_training(&mut self, mode: bool) {
        self.training = mode;
    }

    fn training(&self) -> bool {
        self.training
    }
}

// ── RunningNorm ────────────────────────────────────────────────

/// Feature-wise normalisation with running statistics.
///
/// In training mode the forward pass normalises with the current batch's
/// mean and variance and folds them into the running buffers — the
/// classic "forward has side effects" case a measurement sandbox must
/// roll back. In evaluation mode the running buffers are used as-is and
/// nothing is mutated.
#[derive(Debug)]
pub struct RunningNorm {
    features: usize,
    momentum: f32,
    eps: f32,
    weight: Parameter,
    bias: Parameter,
    running_mean: Tensor,
    running_var: Tensor,
    training: bool,
    cached: Option<NormCache>,
}

#[derive(Debug)]
struct NormCache {
    x_hat: Tensor,
    denom: Vec<f32>,
}

impl RunningNorm {
    pub fn new(features: usize) -> Self {
        Self {
            features,
            momentum: 0.1,
            eps: 1e-5,
            weight: Parameter::new(Tensor::ones(&[features])),
            bias: Parameter::new(Tensor::zeros(&[features])),
            running_mean: Tensor::zeros(&[features]),
            running_var: Tensor::ones(&[features]),
            training: true,
            cached: None,
        }
    }

    /// Current running mean buffer (exposed for tests and inspection).
    pub fn running_mean(&self) -> &Tensor {
        &self.running_mean
    }

    /// Current running variance buffer.
    pub fn running_var(&self) -> &Tensor {
        &self.running_var
    }
}

impl Layer for RunningNorm {
    fn forward(&mut self, input: &Bundle) -> Result<Bundle, ModelError> {
        let x = input.expect_one()?;
        let batch = batch_of(x, self.features)?;
        if batch == 0 {
            return Err(ModelError::LayerFailed {
                layer: "running_norm".into(),
                detail: "empty batch".into(),
            });
        }
        let xs = x.as_slice();

        // Per-feature statistics to normalise with.
        let mut mean = vec![0.0f32; self.features];
        let mut var = vec![0.0f32; self.features];
        if self.training {
            for f in 0..self.features {
                let mut m = 0.0;
                for bi in 0..batch {
                    m += xs[bi * self.features + f];
                }
                m /= batch as f32;
                let mut v = 0.0;
                for bi in 0..batch {
                    let d = xs[bi * self.features + f] - m;
                    v += d * d;
                }
                v /= batch as f32;
                mean[f] = m;
                var[f] = v;
            }

            // Fold into the running buffers.
            {
                let rm = self.running_mean.as_mut_slice();
                let rv = self.running_var.as_mut_slice();
                for f in 0..self.features {
                    rm[f] = (1.0 - self.momentum) * rm[f] + self.momentum * mean[f];
                    rv[f] = (1.0 - self.momentum) * rv[f] + self.momentum * var[f];
                }
            }
        } else {
            mean.copy_from_slice(self.running_mean.as_slice());
            var.copy_from_slice(self.running_var.as_slice());
        }

        let denom: Vec<f32> = var.iter().map(|v| (v + self.eps).sqrt()).collect();
        let w = self.weight.value.as_slice();
        let b = self.bias.value.as_slice();

        let mut x_hat = vec![0.0f32; batch * self.features];
        let mut out = vec![0.0f32; batch * self.features];
        for bi in 0..batch {
            for f in 0..self.features {
                let idx = bi * self.features + f;
                let normalised = (xs[idx] - mean[f]) / denom[f];
                x_hat[idx] = normalised;
                out[idx] = w[f] * normalised + b[f];
            }
        }

        self.cached = Some(NormCache {
            x_hat: Tensor::from_values(&[batch, self.features], x_hat)?,
            denom,
        });
        Ok(Bundle::One(Tensor::from_values(
            &[batch, self.features],
            out,
        )?))
    }

    fn backward(&mut self, grad: &Bundle) -> Result<Bundle, ModelError> {
        let g = grad.expect_one()?;
        let batch = batch_of(g, self.features)?;
        let cache = self.cached.as_ref().ok_or_else(|| ModelError::LayerFailed {
            layer: "running_norm".into(),
            detail: "backward called before forward".into(),
        })?;
        let gs = g.as_slice();
        let x_hat = cache.x_hat.as_slice();
        let w = self.weight.value.as_slice();

        let mut grad_w = vec![0.0f32; self.features];
        let mut grad_b = vec![0.0f32; self.features];
        let mut grad_x = vec![0.0f32; batch * self.features];

        for bi in 0..batch {
            for f in 0..self.features {
                let idx = bi * self.features + f;
                grad_w[f] += gs[idx] * x_hat[idx];
                grad_b[f] += gs[idx];
                grad_x[idx] = gs[idx] * w[f] / cache.denom[f];
            }
        }

        self.weight
            .accumulate_grad(&Tensor::from_values(&[self.features], grad_w)?)?;
        self.bias
            .accumulate_grad(&Tensor::from_values(&[self.features], grad_b)?)?;
        Ok(Bundle::One(Tensor::from_values(
            &[batch, self.features],
            grad_x,
        )?))
    }

    fn state_dict(&self, prefix: &str, out: &mut StateDict) {
        self.weight.write_state(&format!("{prefix}weight"), out);
        self.bias.write_state(&format!("{prefix}bias"), out);
        out.insert(format!("{prefix}running_mean"), self.running_mean.clone());
        out.insert(format!("{prefix}running_var"), self.running_var.clone());
    }

    fn load_state_dict(&mut self, prefix: &str, state: &StateDict) -> Result<(), ModelError> {
        self.weight.read_state(&format!("{prefix}weight"), state)?;
        self.bias.read_state(&format!("{prefix}bias"), state)?;
        for (buffer, name) in [
            (&mut self.running_mean, "running_mean"),
            (&mut self.running_var, "running_var"),
        ] {
            let key = format!("{prefix}{name}");
            *buffer = state
                .get(&key)
                .cloned()
                .ok_or(ModelError::MissingStateKey { key })?;
        }
        Ok(())
    }

    fn set_training(&mut self, mode: bool) {
        self.training = mode;
    }

    fn training(&self) -> bool {
        self.training
    }

    fn parameter_elements(&self) -> usize {
        self.weight.numel() + self.bias.numel()
    }
}
