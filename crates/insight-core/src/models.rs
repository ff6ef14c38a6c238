use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

/// Bucket name for sessions whose log format carried no license field.
pub const UNKNOWN_LICENSE: &str = "unknown";

/// Whether a log line records a login or a logout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventAction {
    Login,
    Logout,
}

impl EventAction {
    /// Short uppercase label used in log output.
    pub fn label(self) -> &'static str {
        match self {
            EventAction::Login => "LOGIN",
            EventAction::Logout => "LOGOUT",
        }
    }
}

/// A single parsed login/logout record.
///
/// Produced by the line parser and never mutated afterwards. Timestamps are
/// naive: log lines carry no zone and a run is assumed zone-consistent, so
/// no normalization is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    /// When the event happened, as written in the log line.
    pub timestamp: NaiveDateTime,
    /// The user the event belongs to.
    pub user_id: String,
    /// Login or logout.
    pub action: EventAction,
    /// License token from the licensing-server format; `None` for
    /// generic-format lines.
    pub license_type: Option<String>,
    /// The raw line the event was parsed from.
    pub source_line: String,
}

/// A continuous interval during which a user held a license.
///
/// `is_closed` is `true` only when the end was observed via a logout event;
/// inferred ends (second login, timeout, end of log) leave it `false`.
/// Invariant: `end >= start`. A session with `start == end` has zero
/// duration and is kept, not dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub license_type: Option<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub is_closed: bool,
}

impl Session {
    /// Length of the session.
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Length of the session in fractional minutes.
    pub fn duration_minutes(&self) -> f64 {
        self.duration().num_seconds() as f64 / 60.0
    }

    /// The license bucket this session aggregates under.
    pub fn license_bucket(&self) -> &str {
        self.license_type.as_deref().unwrap_or(UNKNOWN_LICENSE)
    }
}

/// Per-user activity metrics derived from the reconstructed session set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserActivity {
    /// The user these metrics describe.
    pub user_id: String,
    /// Sum of all session durations, in hours.
    pub total_hours: f64,
    /// Mean session length in minutes (0 when there are no sessions).
    pub average_session_minutes: f64,
    /// Number of reconstructed sessions.
    pub session_count: usize,
    /// Start of the most recent session.
    pub last_login: NaiveDateTime,
    /// Composite 0-100 index blending normalized duration and session count.
    pub activity_score: f64,
    /// License type with the largest summed duration for this user, ties
    /// broken by first-seen type. `None` when no session carried a license.
    pub dominant_license_type: Option<String>,
}

/// Per-license-type utilization metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LicenseUsage {
    /// The license type, or [`UNKNOWN_LICENSE`] for generic-format sessions.
    pub license_type: String,
    /// Sum of all session durations of this type, in hours.
    pub total_hours: f64,
    /// Distinct users with at least one session of this type.
    pub unique_users: usize,
    /// Mean session length in minutes over this type's sessions.
    pub average_session_minutes: f64,
    /// Maximum number of simultaneously open sessions of this type.
    pub peak_concurrent_users: usize,
}

/// Scalar quality metrics for one analysis run.
///
/// Recoverable conditions (rejected lines, orphan logouts, forced closures)
/// are aggregated here rather than raised per occurrence, so a run over a
/// large noisy log completes and reports what it skipped.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    /// Sources successfully opened and read.
    pub sources_read: usize,
    /// Sources skipped because they could not be read.
    pub sources_failed: usize,
    /// Lines parsed into events.
    pub lines_parsed: u64,
    /// Non-blank lines rejected by the parser.
    pub lines_rejected: u64,
    /// Total sessions reconstructed.
    pub sessions_reconstructed: usize,
    /// Sessions closed by an observed logout.
    pub closed_sessions: usize,
    /// Sessions whose end was inferred (`is_closed = false`).
    pub inferred_sessions: usize,
    /// Logouts with no open session, ignored as anomalies.
    pub orphan_logouts: u64,
    /// Sessions force-closed at `start + timeout`.
    pub timeout_closures: u64,
    /// Distinct user ids with at least one session.
    pub distinct_users: usize,
    /// Distinct license buckets observed.
    pub distinct_license_types: usize,
}
