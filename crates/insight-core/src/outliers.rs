//! Percentile-slice ranking of user activity.
//!
//! Sorts users by activity score and extracts the top and bottom `p`
//! fractions. Slicing is by rank, not by score threshold, so the result
//! size is a function of `N` alone and boundary ties are resolved by the
//! stable sort order.

use serde::{Deserialize, Serialize};

use crate::models::UserActivity;

// ── OutlierSlices ─────────────────────────────────────────────────────────────

/// Top and bottom percentile slices of the ranked user set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutlierSlices {
    /// The fraction of users each slice covers.
    pub percentile: f64,
    /// Most active users, highest score first.
    pub top: Vec<UserActivity>,
    /// Least active users, kept in ranked (descending) order.
    pub bottom: Vec<UserActivity>,
}

/// Rank `users` by activity score (descending, stable) and slice off the
/// top and bottom `ceil(percentile * N)` entries, minimum 1 when `N > 0`.
///
/// Ties at a slice boundary keep their original relative order; the same
/// input always produces the same slices. The caller validates
/// `percentile ∈ (0, 1)`.
pub fn rank_outliers(users: &[UserActivity], percentile: f64) -> OutlierSlices {
    if users.is_empty() {
        return OutlierSlices {
            percentile,
            ..OutlierSlices::default()
        };
    }

    let mut ranked: Vec<UserActivity> = users.to_vec();
    // sort_by is stable; equal scores keep input order.
    ranked.sort_by(|a, b| {
        b.activity_score
            .partial_cmp(&a.activity_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let slice_len = slice_size(users.len(), percentile);
    let top = ranked[..slice_len].to_vec();
    let bottom = ranked[ranked.len() - slice_len..].to_vec();

    OutlierSlices {
        percentile,
        top,
        bottom,
    }
}

/// `ceil(p * n)`, at least 1 for a non-empty input, never more than `n`.
fn slice_size(n: usize, percentile: f64) -> usize {
    ((percentile * n as f64).ceil() as usize).clamp(1, n)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
