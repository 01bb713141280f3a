// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Time-based balancing.
//!
//! Each layer is executed forward + backward several times inside the
//! sandbox; its cost is the minimum elapsed wall-clock time (the minimum
//! is the round least disturbed by the scheduler). A warm-up run is
//! discarded first so one-time setup cost does not skew the first layer.
//! The real output of each layer feeds the next, so later layers are
//! timed against realistic shapes and values.

use crate::{balance_from_costs, ProfileError};
use model_core::{Bundle, Sequential};
use sandbox_executor::{forward_backward, run_sandboxed};
use std::time::Instant;

/// Options for [`balance_by_time`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TimingOptions {
    /// Discarded runs per layer before timing starts.
    pub warmup: usize,
    /// Timed runs per layer; the minimum is the layer's cost.
    pub rounds: usize,
}

impl Default for TimingOptions {
    fn default() -> Self {
        Self {
            warmup: 1,
            rounds: 4,
        }
    }
}

/// Balances `model` into `partitions` stages by measured execution time.
///
/// Returns one layer count per stage, in order, summing to
/// `model.len()`. The model's parameters, buffers, gradients, and mode
/// flags are exactly as before the call.
///
/// # Errors
/// Invalid `partitions` and option values are rejected before any
/// measurement work. A failure inside a layer's forward or backward pass
/// aborts profiling and propagates after state restoration.
pub fn balance_by_time(
    partitions: usize,
    model: &mut Sequential,
    sample: &Bundle,
    options: &TimingOptions,
) -> Result<Vec<usize>, ProfileError> {
    block_partition::validate_args(model.len(), partitions)?;
    if options.rounds == 0 {
        return Err(ProfileError::InvalidOptions(
            "rounds must be at least 1".into(),
        ));
    }

    let costs = run_sandboxed(model, |m| profile_times(m, sample, options))?;
    tracing::debug!(?costs, "per-layer time costs (seconds)");
    balance_from_costs(&costs, partitions)
}

/// Measures every layer in order, feeding real outputs forward.
///
/// Runs inside one sandbox scope over the whole model, so the repeated
/// executions may freely mutate buffers and deposit gradients — all of
/// it is rolled back when the scope ends.
fn profile_times(
    model: &mut Sequential,
    sample: &Bundle,
    options: &TimingOptions,
) -> Result<Vec<f64>, model_core::ModelError> {
    let mut costs = Vec::with_capacity(model.len());
    let mut input = sample.clone();

    for index in 0..model.len() {
        let layer = model.layer_mut(index);

        for _ in 0..options.warmup {
            forward_backward(layer, &input)?;
        }

        let mut best = f64::INFINITY;
        let mut output = None;
        for _ in 0..options.rounds {
            let started = Instant::now();
            let out = forward_backward(layer, &input)?;
            let elapsed = started.elapsed().as_secs_f64();
            if elapsed < best {
                best = elapsed;
            }
            output = Some(out);
        }

        tracing::trace!(layer = index, seconds = best, "layer timed");
        costs.push(best);
        input = output.expect("rounds >= 1 was validated");
    }

    Ok(costs)
}
