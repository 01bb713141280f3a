// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-core
//!
//! The sequential-network abstraction the balancing pipeline runs
//! against: an owned `f32` [`Tensor`] with per-thread allocation
//! accounting, structured input/output [`Bundle`]s, the narrow [`Layer`]
//! capability trait, the [`Sequential`] container, and a small set of
//! concrete layers covering every class of persistent state a
//! measurement sandbox has to isolate.
//!
//! Nothing here knows about profiling or partitioning; this crate only
//! defines what a network *is* and how its state is captured and
//! restored.

pub mod alloc;
mod bundle;
mod error;
pub mod layers;
mod module;
mod tensor;

pub use bundle::Bundle;
pub use error::ModelError;
pub use module::{Layer, Parameter, Sequential, StateDict};
pub use tensor::Tensor;
