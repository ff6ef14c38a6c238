//! Top-level analysis pipeline for license-insight.
//!
//! Orchestrates source resolution, parsing, session reconstruction,
//! aggregation and outlier ranking, returning an [`AnalysisResult`] ready
//! for the presentation layer.

use std::collections::HashSet;

use insight_core::error::{InsightError, Result};
use insight_core::models::{LicenseUsage, RunSummary, UserActivity};
use insight_core::outliers::{rank_outliers, OutlierSlices};
use tracing::info;

use crate::aggregator::ActivityAggregator;
use crate::reader::{read_sources, resolve_sources};
use crate::sessions::{SessionReconstructor, DEFAULT_TIMEOUT_MINUTES};

// ── Public types ──────────────────────────────────────────────────────────────

/// Tuning knobs for one analysis run.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Session timeout in minutes (bounds inferred closures).
    pub timeout_minutes: i64,
    /// Fraction of users in each outlier slice, exclusive `(0, 1)`.
    pub percentile: f64,
    /// End trailing open sessions at the stream's last timestamp instead
    /// of the user's own last event.
    pub use_global_end: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            percentile: 0.1,
            use_global_end: false,
        }
    }
}

/// The complete output of [`analyze`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct AnalysisResult {
    /// Per-user metrics, ordered by user id.
    pub users: Vec<UserActivity>,
    /// Per-license metrics, ordered by license type.
    pub licenses: Vec<LicenseUsage>,
    /// Top/bottom percentile slices by activity score.
    pub outliers: OutlierSlices,
    /// Quality metrics for the run.
    pub summary: RunSummary,
}

// ── Public function ───────────────────────────────────────────────────────────

/// Run the full pipeline over `sources`.
///
/// 1. Resolve patterns into concrete files.
/// 2. Stream and parse every line, grouping events per user.
/// 3. Reconstruct sessions per user.
/// 4. Aggregate per-user and per-license metrics.
/// 5. Rank outlier slices.
///
/// Zero parsed events is [`InsightError::EmptyResult`], not an empty
/// success: it almost always means a wrong path or a format mismatch.
pub fn analyze(sources: &[String], options: &AnalysisOptions) -> Result<AnalysisResult> {
    if options.percentile <= 0.0 || options.percentile >= 1.0 {
        return Err(InsightError::Config(format!(
            "percentile must be in (0, 1), got {}",
            options.percentile
        )));
    }
    if options.timeout_minutes <= 0 {
        return Err(InsightError::Config(format!(
            "timeout must be positive, got {} minutes",
            options.timeout_minutes
        )));
    }

    // ── Step 1 + 2: Resolve and read ──────────────────────────────────────
    let files = resolve_sources(sources)?;
    info!("Reading {} source file(s)", files.len());
    let event_log = read_sources(&files)?;

    if event_log.event_count() == 0 {
        return Err(InsightError::EmptyResult);
    }

    // ── Step 3: Reconstruct sessions ──────────────────────────────────────
    let mut reconstructor = SessionReconstructor::new(options.timeout_minutes);
    if options.use_global_end {
        if let Some(last) = event_log.last_timestamp() {
            reconstructor = reconstructor.with_global_end(last);
        }
    }
    let outcome = reconstructor.reconstruct(&event_log.events_by_user);

    // ── Step 4: Aggregate ─────────────────────────────────────────────────
    let users = ActivityAggregator::user_activity(&outcome.sessions);
    let licenses = ActivityAggregator::license_usage(&outcome.sessions);

    // ── Step 5: Outliers ──────────────────────────────────────────────────
    let outliers = rank_outliers(&users, options.percentile);

    let closed = outcome.sessions.iter().filter(|s| s.is_closed).count();
    let license_types: HashSet<&str> = outcome
        .sessions
        .iter()
        .map(|s| s.license_bucket())
        .collect();

    let summary = RunSummary {
        sources_read: event_log.stats.sources_read,
        sources_failed: event_log.stats.sources_failed,
        lines_parsed: event_log.stats.lines_parsed,
        lines_rejected: event_log.stats.lines_rejected,
        sessions_reconstructed: outcome.sessions.len(),
        closed_sessions: closed,
        inferred_sessions: outcome.sessions.len() - closed,
        orphan_logouts: outcome.stats.orphan_logouts,
        timeout_closures: outcome.stats.timeout_closures,
        distinct_users: users.len(),
        distinct_license_types: license_types.len(),
    };

    info!(
        "Analyzed {} sessions for {} users across {} license type(s)",
        summary.sessions_reconstructed, summary.distinct_users, summary.distinct_license_types
    );

    Ok(AnalysisResult {
        users,
        licenses,
        outliers,
        summary,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_log(dir: &Path, name: &str, lines: &[&str]) -> String {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        path.to_str().unwrap().to_string()
    }

    fn licensing_line(ts: &str, user: &str, direction: &str, license: Option<&str>) -> String {
        match (direction, license) {
            ("in", Some(lic)) => format!(
                "{ts} [exec-1] INFO  PolarionLicensing - User '{user}' logged in with named {lic}"
            ),
            _ => format!(
                "{ts} [exec-1] INFO  PolarionLicensing - User '{user}' logged {direction}"
            ),
        }
    }

    // ── Option validation ─────────────────────────────────────────────────

    #[test]
    fn test_percentile_out_of_range_rejected() {
        for bad in [0.0, 1.0, 1.5, -0.1] {
            let options = AnalysisOptions {
                percentile: bad,
                ..AnalysisOptions::default()
            };
            let result = analyze(&["ignored.log".to_string()], &options);
            assert!(
                matches!(result, Err(InsightError::Config(_))),
                "percentile {bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_non_positive_timeout_rejected() {
        let options = AnalysisOptions {
            timeout_minutes: 0,
            ..AnalysisOptions::default()
        };
        let result = analyze(&["ignored.log".to_string()], &options);
        assert!(matches!(result, Err(InsightError::Config(_))));
    }

    // ── Pipeline ──────────────────────────────────────────────────────────

    #[test]
    fn test_single_session_scenario() {
        let dir = TempDir::new().unwrap();
        let source = write_log(
            dir.path(),
            "server.log",
            &[
                &licensing_line("2025-08-05 09:00:00,000", "alice", "in", Some("ALM")),
                &licensing_line("2025-08-05 09:30:00,000", "alice", "out", None),
            ],
        );

        let result = analyze(&[source], &AnalysisOptions::default()).unwrap();

        assert_eq!(result.users.len(), 1);
        let alice = &result.users[0];
        assert!((alice.total_hours - 0.5).abs() < 1e-9);
        assert_eq!(alice.session_count, 1);
        assert_eq!(alice.dominant_license_type.as_deref(), Some("ALM"));
        assert!((alice.activity_score - 3.125).abs() < 1e-9);

        assert_eq!(result.licenses.len(), 1);
        assert_eq!(result.licenses[0].license_type, "ALM");
        assert_eq!(result.licenses[0].unique_users, 1);
        assert_eq!(result.licenses[0].peak_concurrent_users, 1);

        assert_eq!(result.summary.lines_parsed, 2);
        assert_eq!(result.summary.sessions_reconstructed, 1);
        assert_eq!(result.summary.closed_sessions, 1);
        assert_eq!(result.summary.distinct_users, 1);
        assert_eq!(result.summary.distinct_license_types, 1);
    }

    #[test]
    fn test_empty_sources_is_empty_result_error() {
        let dir = TempDir::new().unwrap();
        let source = write_log(dir.path(), "empty.log", &["no events here", "junk"]);
        let result = analyze(&[source], &AnalysisOptions::default());
        assert!(matches!(result, Err(InsightError::EmptyResult)));
    }

    #[test]
    fn test_rejected_lines_surface_in_summary() {
        let dir = TempDir::new().unwrap();
        let source = write_log(
            dir.path(),
            "noisy.log",
            &[
                "stack trace line one",
                &licensing_line("2025-08-05 09:00:00,000", "alice", "in", Some("ALM")),
                "stack trace line two",
                &licensing_line("2025-08-05 09:30:00,000", "alice", "out", None),
            ],
        );

        let result = analyze(&[source], &AnalysisOptions::default()).unwrap();
        assert_eq!(result.summary.lines_parsed, 2);
        assert_eq!(result.summary.lines_rejected, 2);
    }

    #[test]
    fn test_orphan_logout_counted_in_summary() {
        let dir = TempDir::new().unwrap();
        let source = write_log(
            dir.path(),
            "server.log",
            &[
                &licensing_line("2025-08-05 08:00:00,000", "alice", "out", None),
                &licensing_line("2025-08-05 09:00:00,000", "alice", "in", Some("ALM")),
                &licensing_line("2025-08-05 09:30:00,000", "alice", "out", None),
            ],
        );

        let result = analyze(&[source], &AnalysisOptions::default()).unwrap();
        assert_eq!(result.summary.orphan_logouts, 1);
        assert_eq!(result.summary.sessions_reconstructed, 1);
    }

    #[test]
    fn test_events_merge_chronologically_across_rotated_files() {
        let dir = TempDir::new().unwrap();
        // Rotation order reversed: the newer file sorts first by name.
        let newer = write_log(
            dir.path(),
            "a-newer.log",
            &[&licensing_line("2025-08-05 09:30:00,000", "alice", "out", None)],
        );
        let older = write_log(
            dir.path(),
            "b-older.log",
            &[&licensing_line(
                "2025-08-05 09:00:00,000",
                "alice",
                "in",
                Some("ALM"),
            )],
        );

        let result = analyze(&[newer, older], &AnalysisOptions::default()).unwrap();
        // Reordered into one clean closed session.
        assert_eq!(result.summary.sessions_reconstructed, 1);
        assert_eq!(result.summary.closed_sessions, 1);
        assert_eq!(result.summary.orphan_logouts, 0);
    }

    #[test]
    fn test_outlier_slices_present() {
        let dir = TempDir::new().unwrap();
        let mut lines: Vec<String> = Vec::new();
        for i in 0..10 {
            let user = format!("user{i}");
            // Increasing session counts give distinct scores.
            for j in 0..=i {
                lines.push(licensing_line(
                    &format!("2025-08-0{} 0{}:00:00,000", (j % 7) + 1, (j % 9)),
                    &user,
                    "in",
                    Some("ALM"),
                ));
                lines.push(licensing_line(
                    &format!("2025-08-0{} 0{}:10:00,000", (j % 7) + 1, (j % 9)),
                    &user,
                    "out",
                    None,
                ));
            }
        }
        let line_refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let source = write_log(dir.path(), "server.log", &line_refs);

        let result = analyze(&[source], &AnalysisOptions::default()).unwrap();
        assert_eq!(result.users.len(), 10);
        assert_eq!(result.outliers.top.len(), 1);
        assert_eq!(result.outliers.bottom.len(), 1);
        assert_eq!(result.outliers.top[0].user_id, "user9");
        assert_eq!(result.outliers.bottom[0].user_id, "user0");
    }

    #[test]
    fn test_global_end_option_extends_trailing_session() {
        let dir = TempDir::new().unwrap();
        let source = write_log(
            dir.path(),
            "server.log",
            &[
                &licensing_line("2025-08-05 09:00:00,000", "alice", "in", Some("ALM")),
                &licensing_line("2025-08-05 09:10:00,000", "bob", "in", Some("ALM")),
                &licensing_line("2025-08-05 09:20:00,000", "bob", "out", None),
            ],
        );

        let options = AnalysisOptions {
            use_global_end: true,
            ..AnalysisOptions::default()
        };
        let result = analyze(&[source], &options).unwrap();

        let alice = result.users.iter().find(|u| u.user_id == "alice").unwrap();
        // Alice's open session runs to the stream end at 09:20.
        assert!((alice.average_session_minutes - 20.0).abs() < 1e-9);
        assert_eq!(result.summary.inferred_sessions, 1);
    }

    #[test]
    fn test_result_serializes_to_json() {
        let dir = TempDir::new().unwrap();
        let source = write_log(
            dir.path(),
            "server.log",
            &[
                &licensing_line("2025-08-05 09:00:00,000", "alice", "in", Some("ALM")),
                &licensing_line("2025-08-05 09:30:00,000", "alice", "out", None),
            ],
        );

        let result = analyze(&[source], &AnalysisOptions::default()).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("users").is_some());
        assert!(json.get("licenses").is_some());
        assert!(json.get("summary").is_some());
    }
}
