// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Size-based balancing.
//!
//! Each layer's latent cost is the peak growth of the allocation gauge
//! across one sandboxed forward + backward run — the activation and
//! gradient footprint attributable to that layer, with the input bundle
//! already counted in the baseline. Optionally a static term
//! proportional to the layer's trainable parameter bytes is added:
//!
//! ```text
//! cost = latent_bytes + param_scale * parameter_elements * 4
//! ```
//!
//! Both sides are in bytes, so `param_scale` is a dimensionless blend
//! knob: `0` ignores parameter size entirely, a large value makes the
//! static parameter footprint dominate the balancing decision.

use crate::{balance_from_costs, ProfileError};
use model_core::{alloc, Bundle, Layer, Sequential};
use sandbox_executor::{forward_backward, run_sandboxed};

/// Options for [`balance_by_size`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SizeOptions {
    /// Weight of the static parameter-size term. The default of `0.0`
    /// measures latent cost alone.
    pub param_scale: f64,
}

impl Default for SizeOptions {
    fn default() -> Self {
        Self { param_scale: 0.0 }
    }
}

/// Balances `model` into `partitions` stages by measured memory
/// footprint.
///
/// Returns one layer count per stage, in order, summing to
/// `model.len()`. The model's parameters, buffers, gradients, and mode
/// flags are exactly as before the call.
///
/// # Errors
/// Invalid `partitions` and option values are rejected before any
/// measurement work. A failure inside a layer's forward or backward pass
/// aborts profiling and propagates after state restoration.
pub fn balance_by_size(
    partitions: usize,
    model: &mut Sequential,
    sample: &Bundle,
    options: &SizeOptions,
) -> Result<Vec<usize>, ProfileError> {
    block_partition::validate_args(model.len(), partitions)?;
    if !options.param_scale.is_finite() || options.param_scale < 0.0 {
        return Err(ProfileError::InvalidOptions(format!(
            "param_scale must be a non-negative finite number, got {}",
            options.param_scale
        )));
    }

    let costs = run_sandboxed(model, |m| profile_sizes(m, sample, options))?;
    tracing::debug!(?costs, "per-layer size costs (bytes)");
    balance_from_costs(&costs, partitions)
}

fn profile_sizes(
    model: &mut Sequential,
    sample: &Bundle,
    options: &SizeOptions,
) -> Result<Vec<f64>, model_core::ModelError> {
    let mut costs = Vec::with_capacity(model.len());
    let mut input = sample.clone();

    for index in 0..model.len() {
        let layer = model.layer_mut(index);

        let baseline = alloc::current_bytes();
        alloc::reset_peak();
        let output = forward_backward(layer, &input)?;
        let latent_bytes = alloc::peak_bytes().saturating_sub(baseline);

        let param_bytes =
            layer.parameter_elements() as f64 * std::mem::size_of::<f32>() as f64;
        let cost = latent_bytes as f64 + options.param_scale * param_bytes;

        tracing::trace!(
            layer = index,
            latent_bytes,
            param_bytes,
            cost,
            "layer sized"
        );
        costs.push(cost);
        input = output;
    }

    Ok(costs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use block_partition::PartitionError;
    use model_core::layers::Linear;
    use model_core::Tensor;

    fn linear_stack(n: usize) -> Sequential {
        Sequential::new((0..n).map(|_| Box::new(Linear::new(4, 4)) as Box<dyn Layer>).collect())
    }

    #[test]
    fn test_sizes_sum_to_layer_count() {
        let mut model = linear_stack(6);
        let sample = Bundle::One(Tensor::rand(&[1, 4]));
        let sizes =
            balance_by_size(3, &mut model, &sample, &SizeOptions::default()).unwrap();
        assert_eq!(sizes.len(), 3);
        assert_eq!(sizes.iter().sum::<usize>(), 6);
        assert!(sizes.iter().all(|&s| s > 0));
    }

    #[test]
    fn test_invalid_partitions_fail_fast() {
        let mut model = linear_stack(2);
        let sample = Bundle::One(Tensor::rand(&[1, 4]));
        assert!(matches!(
            balance_by_size(0, &mut model, &sample, &SizeOptions::default()),
            Err(ProfileError::Partition(
                PartitionError::NonPositivePartitions { .. }
            ))
        ));
    }

    #[test]
    fn test_negative_param_scale_rejected() {
        let mut model = linear_stack(2);
        let sample = Bundle::One(Tensor::rand(&[1, 4]));
        let options = SizeOptions { param_scale: -1.0 };
        assert!(matches!(
            balance_by_size(1, &mut model, &sample, &options),
            Err(ProfileError::InvalidOptions(_))
        ));
    }
}
