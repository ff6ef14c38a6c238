//! Session aggregation into per-user and per-license metrics.
//!
//! Both reductions group via `BTreeMap` keyed by string, so output order
//! is deterministic (ascending user id / license type).

use std::collections::{BTreeMap, HashSet};

use insight_core::models::{LicenseUsage, Session, UserActivity};
use insight_core::scoring::activity_score;

// ── ActivityAggregator ────────────────────────────────────────────────────────

/// Stateless reducer over an immutable session set.
pub struct ActivityAggregator;

impl ActivityAggregator {
    /// Derive one [`UserActivity`] per distinct user id.
    pub fn user_activity(sessions: &[Session]) -> Vec<UserActivity> {
        let mut by_user: BTreeMap<String, Vec<&Session>> = BTreeMap::new();
        for session in sessions {
            by_user
                .entry(session.user_id.clone())
                .or_default()
                .push(session);
        }

        by_user
            .into_iter()
            .map(|(user_id, user_sessions)| {
                let total_minutes: f64 =
                    user_sessions.iter().map(|s| s.duration_minutes()).sum();
                let count = user_sessions.len();
                let average = if count == 0 {
                    0.0
                } else {
                    total_minutes / count as f64
                };
                let last_login = user_sessions
                    .iter()
                    .map(|s| s.start)
                    .max()
                    .expect("grouped users have at least one session");
                let total_hours = total_minutes / 60.0;

                UserActivity {
                    user_id,
                    total_hours,
                    average_session_minutes: average,
                    session_count: count,
                    last_login,
                    activity_score: activity_score(total_hours, count),
                    dominant_license_type: dominant_license(&user_sessions),
                }
            })
            .collect()
    }

    /// Derive one [`LicenseUsage`] per distinct license bucket.
    pub fn license_usage(sessions: &[Session]) -> Vec<LicenseUsage> {
        let mut by_license: BTreeMap<String, Vec<&Session>> = BTreeMap::new();
        for session in sessions {
            by_license
                .entry(session.license_bucket().to_string())
                .or_default()
                .push(session);
        }

        by_license
            .into_iter()
            .map(|(license_type, type_sessions)| {
                let total_minutes: f64 =
                    type_sessions.iter().map(|s| s.duration_minutes()).sum();
                let count = type_sessions.len();
                let average = if count == 0 {
                    0.0
                } else {
                    total_minutes / count as f64
                };
                let unique_users: HashSet<&str> = type_sessions
                    .iter()
                    .map(|s| s.user_id.as_str())
                    .collect();

                LicenseUsage {
                    license_type,
                    total_hours: total_minutes / 60.0,
                    unique_users: unique_users.len(),
                    average_session_minutes: average,
                    peak_concurrent_users: peak_concurrency(&type_sessions),
                }
            })
            .collect()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// License type with the largest summed duration, ties broken by the
/// first-seen type. `None` when no session carries a license.
fn dominant_license(sessions: &[&Session]) -> Option<String> {
    // Insertion-ordered accumulation; strictly-greater comparison keeps
    // the earliest type on ties.
    let mut totals: Vec<(String, f64)> = Vec::new();
    for session in sessions {
        let Some(license) = &session.license_type else {
            continue;
        };
        match totals.iter_mut().find(|(name, _)| name == license) {
            Some((_, minutes)) => *minutes += session.duration_minutes(),
            None => totals.push((license.clone(), session.duration_minutes())),
        }
    }

    let mut best: Option<(String, f64)> = None;
    for (name, minutes) in totals {
        match &best {
            Some((_, best_minutes)) if minutes <= *best_minutes => {}
            _ => best = Some((name, minutes)),
        }
    }
    best.map(|(name, _)| name)
}

/// Maximum number of simultaneously open sessions, by sweep-line.
///
/// Boundary events sorted by `(time, delta)` put ends (-1) before starts
/// (+1) at equal instants, giving half-open `[start, end)` semantics:
/// back-to-back sessions never double-count and a zero-duration session
/// contributes nothing. Never approximated by time buckets — sampling
/// misses short peaks.
fn peak_concurrency(sessions: &[&Session]) -> usize {
    let mut boundaries: Vec<(chrono::NaiveDateTime, i32)> = Vec::with_capacity(sessions.len() * 2);
    for session in sessions {
        boundaries.push((session.start, 1));
        boundaries.push((session.end, -1));
    }
    boundaries.sort();

    let mut current: i64 = 0;
    let mut peak: i64 = 0;
    for (_, delta) in boundaries {
        current += i64::from(delta);
        peak = peak.max(current);
    }
    peak.max(0) as usize
}

// ── Tests ─────────────────────────────────────────────────────────────────────
