// Copyright (c) 2025
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The exact solver: binary search over candidate limits plus greedy
//! reconstruction.
//!
//! # Algorithm
//!
//! The optimal maximum group sum of any k-way contiguous partitioning is
//! always the sum of *some* contiguous segment, so the answer is searched
//! over the finite set of segment sums rather than a continuous range:
//!
//! 1. Enumerate every contiguous segment sum (by left-to-right sequential
//!    accumulation, so the floating-point sums are bit-identical to the
//!    running sums the greedy scan computes), keep those at least as
//!    large as the largest single weight, sort and deduplicate.
//! 2. Binary-search the smallest *feasible* candidate, where a limit is
//!    feasible when a greedy left-to-right scan packs the sequence into
//!    at most `partitions` groups without any group sum exceeding it.
//! 3. Reconstruct the grouping with a greedy right-to-left pass at the
//!    minimal limit, forcing exactly `partitions` non-empty groups, and
//!    reverse the group order.
//!
//! The right-to-left reconstruction is the tie-break policy: when several
//! partitionings share the minimal maximum sum, extra splits land in the
//! later groups, so earlier groups are biased toward being fuller.

use crate::PartitionError;

/// Validates a partition request without touching the weights.
///
/// Exposed separately so callers that still have expensive measurement
/// work ahead of them can reject a bad request up front.
pub fn validate_args(len: usize, partitions: usize) -> Result<(), PartitionError> {
    if partitions == 0 {
        return Err(PartitionError::NonPositivePartitions { got: partitions });
    }
    if len < partitions {
        return Err(PartitionError::TooFewElements { len, partitions });
    }
    Ok(())
}

/// Splits `weights` into exactly `partitions` contiguous non-empty groups
/// minimising the maximum group sum.
///
/// The concatenation of the returned groups reproduces `weights` exactly,
/// in order. Ties between equally optimal partitionings are broken
/// deterministically: later groups absorb the extra splits.
///
/// # Errors
/// - [`PartitionError::NonPositivePartitions`] if `partitions == 0`.
/// - [`PartitionError::TooFewElements`] if `weights.len() < partitions`.
/// - [`PartitionError::InvalidWeight`] if any weight is negative or not
///   finite.
///
/// # Examples
/// ```
/// let groups = block_partition::solve(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2).unwrap();
/// assert_eq!(groups, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0]]);
/// ```
pub fn solve(weights: &[f64], partitions: usize) -> Result<Vec<Vec<f64>>, PartitionError> {
    validate_args(weights.len(), partitions)?;
    for (index, &value) in weights.iter().enumerate() {
        if !value.is_finite() || value < 0.0 {
            return Err(PartitionError::InvalidWeight { index, value });
        }
    }

    let limit = minimal_feasible_limit(weights, partitions);
    tracing::debug!(
        limit,
        partitions,
        len = weights.len(),
        "minimal feasible group-sum limit found"
    );

    Ok(reconstruct(weights, limit, partitions))
}

/// Returns the number of groups a greedy left-to-right scan uses when no
/// group sum may exceed `limit`.
///
/// Every weight is placed even if it alone exceeds `limit`; such limits
/// simply report an over-count and are rejected by the search.
fn greedy_group_count(weights: &[f64], limit: f64) -> usize {
    let mut groups = 1;
    let mut sum = 0.0;
    for &w in weights {
        if sum + w > limit {
            groups += 1;
            sum = w;
        } else {
            sum += w;
        }
    }
    groups
}

/// Finds the smallest candidate limit for which the greedy scan needs at
/// most `partitions` groups.
fn minimal_feasible_limit(weights: &[f64], partitions: usize) -> f64 {
    let max_weight = weights.iter().cloned().fold(0.0, f64::max);

    // Candidate limits: all contiguous segment sums not below the largest
    // single weight. Sequential accumulation keeps them bit-identical to
    // the greedy scan's running sums.
    let mut candidates = Vec::with_capacity(weights.len() * (weights.len() + 1) / 2);
    for start in 0..weights.len() {
        let mut sum = 0.0;
        for &w in &weights[start..] {
            sum += w;
            if sum >= max_weight {
                candidates.push(sum);
            }
        }
    }
    candidates.sort_by(|a, b| a.partial_cmp(b).expect("weights are finite"));
    candidates.dedup();

    // Feasibility is monotone in the limit, so binary search applies.
    let mut lo = 0;
    let mut hi = candidates.len() - 1;
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if greedy_group_count(weights, candidates[mid]) <= partitions {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    candidates[lo]
}

/// Rebuilds the grouping at the minimal limit.
///
/// Scans right to left, extending the current group while its sum stays
/// within `limit` and enough elements remain for the groups still to be
/// formed. The leftmost group absorbs everything left over. Reversing the
/// collected groups yields the canonical left-to-right result.
fn reconstruct(weights: &[f64], limit: f64, partitions: usize) -> Vec<Vec<f64>> {
    let mut groups = Vec::with_capacity(partitions);
    let mut end = weights.len();

    for formed in 0..partitions {
        let groups_left = partitions - formed - 1;
        let mut start = end - 1;
        let mut sum = weights[start];

        while start > groups_left {
            let next = weights[start - 1];
            if groups_left > 0 && sum + next > limit {
                break;
            }
            sum += next;
            start -= 1;
        }

        groups.push(weights[start..end].to_vec());
        end = start;
    }

    groups.reverse();
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every k-way contiguous partitioning of `weights`, by brute force.
    fn brute_force_best_max(weights: &[f64], partitions: usize) -> f64 {
        fn recurse(weights: &[f64], partitions: usize, best: &mut f64, current_max: f64) {
            if partitions == 1 {
                let max = current_max.max(weights.iter().sum());
                if max < *best {
                    *best = max;
                }
                return;
            }
            // First group takes 1..=len-(partitions-1) elements.
            for take in 1..=(weights.len() - (partitions - 1)) {
                let head: f64 = weights[..take].iter().sum();
                recurse(&weights[take..], partitions - 1, best, current_max.max(head));
            }
        }
        let mut best = f64::INFINITY;
        recurse(weights, partitions, &mut best, 0.0);
        best
    }

    fn max_group_sum(groups: &[Vec<f64>]) -> f64 {
        groups
            .iter()
            .map(|g| g.iter().sum::<f64>())
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_deterministic_tie_break() {
        let groups = solve(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2).unwrap();
        assert_eq!(groups, vec![vec![1.0, 2.0, 3.0, 4.0], vec![5.0, 6.0]]);
    }

    #[test]
    fn test_reverse_ordering() {
        let groups = solve(&[6.0, 5.0, 4.0, 3.0, 2.0, 1.0], 2).unwrap();
        assert_eq!(groups, vec![vec![6.0, 5.0], vec![4.0, 3.0, 2.0, 1.0]]);
    }

    #[test]
    fn test_zeros() {
        let groups = solve(&[0.0, 0.0], 2).unwrap();
        assert_eq!(groups, vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn test_single_group() {
        let groups = solve(&[3.0, 1.0, 4.0], 1).unwrap();
        assert_eq!(groups, vec![vec![3.0, 1.0, 4.0]]);
    }

    #[test]
    fn test_one_group_per_element() {
        let groups = solve(&[5.0, 5.0, 5.0], 3).unwrap();
        assert_eq!(groups, vec![vec![5.0], vec![5.0], vec![5.0]]);
    }

    #[test]
    fn test_non_positive_partitions_rejected() {
        assert!(matches!(
            solve(&[42.0], 0),
            Err(PartitionError::NonPositivePartitions { got: 0 })
        ));
    }

    #[test]
    fn test_short_sequence_rejected() {
        assert!(matches!(
            solve(&[], 1),
            Err(PartitionError::TooFewElements { len: 0, partitions: 1 })
        ));
        assert!(matches!(
            solve(&[42.0], 2),
            Err(PartitionError::TooFewElements { len: 1, partitions: 2 })
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        assert!(matches!(
            solve(&[1.0, -2.0], 1),
            Err(PartitionError::InvalidWeight { index: 1, .. })
        ));
    }

    #[test]
    fn test_nan_weight_rejected() {
        assert!(matches!(
            solve(&[f64::NAN], 1),
            Err(PartitionError::InvalidWeight { index: 0, .. })
        ));
    }

    #[test]
    fn test_concatenation_reproduces_input() {
        let weights = [2.0, 7.0, 1.0, 8.0, 2.0, 8.0, 1.0, 8.0];
        for partitions in 1..=weights.len() {
            let groups = solve(&weights, partitions).unwrap();
            assert_eq!(groups.len(), partitions);
            assert!(groups.iter().all(|g| !g.is_empty()));
            let flat: Vec<f64> = groups.into_iter().flatten().collect();
            assert_eq!(flat, weights);
        }
    }

    #[test]
    fn test_optimal_against_brute_force() {
        let cases: [&[f64]; 6] = [
            &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            &[10.0, 1.0, 1.0, 1.0, 10.0],
            &[0.0, 0.0, 5.0, 0.0, 0.0],
            &[7.0, 7.0, 7.0, 7.0],
            &[1.0, 100.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            &[3.5, 0.25, 9.0, 2.75, 4.0, 1.5],
        ];
        for weights in cases {
            for partitions in 1..=weights.len() {
                let groups = solve(weights, partitions).unwrap();
                let expected = brute_force_best_max(weights, partitions);
                let got = max_group_sum(&groups);
                assert!(
                    (got - expected).abs() < 1e-9,
                    "weights {weights:?} k={partitions}: got max {got}, optimum {expected}"
                );
            }
        }
    }

    #[test]
    fn test_later_groups_absorb_slack() {
        // Max sum 7 is achievable many ways; extra splits must land on
        // the right: [7], [7], [3, 4] would put slack on the left.
        let groups = solve(&[3.0, 4.0, 7.0, 7.0], 3).unwrap();
        assert_eq!(groups, vec![vec![3.0, 4.0], vec![7.0], vec![7.0]]);
    }

    #[test]
    fn test_validate_args() {
        validate_args(4, 2).unwrap();
        validate_args(1, 1).unwrap();
        assert!(validate_args(4, 0).is_err());
        assert!(validate_args(1, 2).is_err());
        assert!(validate_args(0, 1).is_err());
    }
}
