// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Per-thread tensor allocation gauge.
//!
//! Every [`Tensor`](crate::Tensor) registers its buffer size here on
//! construction and deregisters it on drop, giving a live picture of the
//! bytes held by tensors plus a peak high-water mark. The size-based
//! profiler measures a layer's latent footprint as the peak delta across
//! one sandboxed forward/backward run.
//!
//! The gauge is thread-local: profiling is strictly single-threaded, and
//! scoping the counters to the executing thread keeps concurrent test
//! runs and unrelated worker threads from polluting a measurement.
//! A tensor must therefore be dropped on the thread that created it for
//! the accounting to balance, which holds everywhere in this workspace.

use std::cell::Cell;

thread_local! {
    static CURRENT_BYTES: Cell<usize> = const { Cell::new(0) };
    static PEAK_BYTES: Cell<usize> = const { Cell::new(0) };
}

pub(crate) fn record_alloc(bytes: usize) {
    let current = CURRENT_BYTES.with(|c| {
        let next = c.get() + bytes;
        c.set(next);
        next
    });
    PEAK_BYTES.with(|p| {
        if current > p.get() {
            p.set(current);
        }
    });
}

pub(crate) fn record_free(bytes: usize) {
    CURRENT_BYTES.with(|c| c.set(c.get().saturating_sub(bytes)));
}

/// Bytes currently held by live tensors on this thread.
pub fn current_bytes() -> usize {
    CURRENT_BYTES.with(Cell::get)
}

/// High-water mark since the last [`reset_peak`] on this thread.
pub fn peak_bytes() -> usize {
    PEAK_BYTES.with(Cell::get)
}

/// Collapses the high-water mark down to the current live byte count.
///
/// Call at the start of a measurement window; `peak_bytes()` minus the
/// byte count at reset is then the window's latent footprint.
pub fn reset_peak() {
    let current = current_bytes();
    PEAK_BYTES.with(|p| p.set(current));
}

#[cfg(test)]
mod tests {
    use crate::Tensor;

    #[test]
    fn test_alloc_and_free_move_the_gauge() {
        let before = super::current_bytes();
        let t = Tensor::zeros(&[16, 16]);
        assert_eq!(super::current_bytes(), before + t.size_bytes());
        drop(t);
        assert_eq!(super::current_bytes(), before);
    }

    #[test]
    fn test_peak_tracks_transients() {
        let before = super::current_bytes();
        super::reset_peak();
        {
            let _a = Tensor::zeros(&[64]);
            let _b = Tensor::zeros(&[64]);
        }
        assert_eq!(super::current_bytes(), before);
        assert!(super::peak_bytes() >= before + 2 * 64 * 4);
    }

    #[test]
    fn test_clone_is_accounted() {
        let t = Tensor::ones(&[8]);
        let before = super::current_bytes();
        let c = t.clone();
        assert_eq!(super::current_bytes(), before + c.size_bytes());
    }

    #[test]
    fn test_reset_peak_collapses_to_current() {
        let _live = Tensor::zeros(&[32]);
        {
            let _transient = Tensor::zeros(&[1024]);
        }
        super::reset_peak();
        assert_eq!(super::peak_bytes(), super::current_bytes());
    }
}
