//! Session reconstruction for license-insight.
//!
//! Pairs each user's timestamp-sorted login/logout events into closed
//! intervals. Real logs are messy: logouts go missing, logins overlap,
//! and truncated files start mid-session. The rules below are explicit
//! policy, not incidental behavior — changing them changes reported
//! totals:
//!
//! * A second login while a session is open closes the current session at
//!   the new login's timestamp (an unmatched login is an implicit logout)
//!   and immediately reopens.
//! * A timeout (default 30 minutes) caps any inferred closure at
//!   `start + timeout`, bounding the damage of a missing logout to a
//!   fixed duration instead of days.
//! * An observed logout always closes at its own timestamp — matched
//!   multi-day sessions are legitimate.
//! * A logout with no open session is an anomaly, counted and ignored:
//!   truncated logs routinely start mid-session.

use std::collections::BTreeMap;

use chrono::{NaiveDateTime, TimeDelta};
use insight_core::models::{EventAction, LogEvent, Session};
use tracing::debug;

/// Default session timeout in minutes.
pub const DEFAULT_TIMEOUT_MINUTES: i64 = 30;

// ── SessionStats ──────────────────────────────────────────────────────────────

/// Anomaly and heuristic-closure counters from one reconstruction pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Logouts observed with no open session; ignored, no session emitted.
    pub orphan_logouts: u64,
    /// Sessions closed by a second login (the missed-logout heuristic).
    pub implicit_closures: u64,
    /// Inferred closures where the timeout cap applied.
    pub timeout_closures: u64,
}

/// Sessions plus the counters describing how they were inferred.
#[derive(Debug, Clone, Default)]
pub struct ReconstructionOutcome {
    pub sessions: Vec<Session>,
    pub stats: SessionStats,
}

// ── SessionReconstructor ──────────────────────────────────────────────────────

/// Replays each user's event sequence through a two-state machine
/// (`IDLE` / `OPEN`) and emits sessions.
///
/// Fully deterministic for a given event sequence and timeout; only
/// timestamp order matters, never which source file an event came from.
pub struct SessionReconstructor {
    timeout: TimeDelta,
    global_end: Option<NaiveDateTime>,
}

impl SessionReconstructor {
    /// Create a reconstructor with the given timeout.
    pub fn new(timeout_minutes: i64) -> Self {
        Self {
            timeout: TimeDelta::minutes(timeout_minutes),
            global_end: None,
        }
    }

    /// End trailing open sessions at the stream's last timestamp (capped
    /// by the timeout) instead of the user's own last event.
    pub fn with_global_end(mut self, end: NaiveDateTime) -> Self {
        self.global_end = Some(end);
        self
    }

    /// Reconstruct sessions for every user in `events_by_user`.
    ///
    /// Each user's events must already be sorted by timestamp; the reader
    /// guarantees this.
    pub fn reconstruct(
        &self,
        events_by_user: &BTreeMap<String, Vec<LogEvent>>,
    ) -> ReconstructionOutcome {
        let mut outcome = ReconstructionOutcome::default();

        for (user_id, events) in events_by_user {
            let sessions = self.reconstruct_user(user_id, events, &mut outcome.stats);
            outcome.sessions.extend(sessions);
        }

        debug!(
            "Reconstructed {} sessions for {} users ({} orphan logouts, {} timeout closures)",
            outcome.sessions.len(),
            events_by_user.len(),
            outcome.stats.orphan_logouts,
            outcome.stats.timeout_closures,
        );
        outcome
    }

    // ── Per-user state machine ────────────────────────────────────────────

    fn reconstruct_user(
        &self,
        user_id: &str,
        events: &[LogEvent],
        stats: &mut SessionStats,
    ) -> Vec<Session> {
        let mut sessions = Vec::new();
        let mut open: Option<(NaiveDateTime, Option<String>)> = None;

        for event in events {
            match (&open, event.action) {
                (None, EventAction::Login) => {
                    open = Some((event.timestamp, event.license_type.clone()));
                }

                (Some((start, license)), EventAction::Login) => {
                    // Missed logout: close at the new login, capped by the
                    // timeout, then reopen at the new login.
                    let (end, capped) = self.capped_end(*start, event.timestamp);
                    stats.implicit_closures += 1;
                    if capped {
                        stats.timeout_closures += 1;
                    }
                    sessions.push(Session {
                        user_id: user_id.to_string(),
                        license_type: license.clone(),
                        start: *start,
                        end,
                        is_closed: false,
                    });
                    open = Some((event.timestamp, event.license_type.clone()));
                }

                (Some((start, license)), EventAction::Logout) => {
                    // An observed logout closes at its own timestamp,
                    // however long the span.
                    sessions.push(Session {
                        user_id: user_id.to_string(),
                        license_type: license.clone(),
                        start: *start,
                        end: event.timestamp,
                        is_closed: true,
                    });
                    open = None;
                }

                (None, EventAction::Logout) => {
                    stats.orphan_logouts += 1;
                    debug!(
                        "Orphan logout for user '{}' at {} ignored",
                        user_id, event.timestamp
                    );
                }
            }
        }

        // End of stream with a session still open. The user's last
        // observed event is the opening login itself (anything later would
        // have transitioned the machine), so without a global end this is
        // a zero-duration session.
        if let Some((start, license)) = open {
            let last_observed = events
                .last()
                .map(|e| e.timestamp)
                .unwrap_or(start)
                .max(start);
            let (end, capped) = match self.global_end {
                Some(global) => self.capped_end(start, global.max(start)),
                None => (last_observed, false),
            };
            if capped {
                stats.timeout_closures += 1;
            }
            sessions.push(Session {
                user_id: user_id.to_string(),
                license_type: license,
                start,
                end,
                is_closed: false,
            });
        }

        sessions
    }

    /// Inferred closure end: `candidate`, capped at `start + timeout`.
    /// Returns the end and whether the cap applied.
    fn capped_end(&self, start: NaiveDateTime, candidate: NaiveDateTime) -> (NaiveDateTime, bool) {
        let limit = start + self.timeout;
        if candidate > limit {
            (limit, true)
        } else {
            (candidate, false)
        }
    }
}

impl Default for SessionReconstructor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT_MINUTES)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
