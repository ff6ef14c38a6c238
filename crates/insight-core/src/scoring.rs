// ── Activity scoring ──────────────────────────────────────────────────────────

/// Total login hours at which the duration half of the score saturates.
pub const SCORE_SATURATION_HOURS: f64 = 40.0;

/// Session count at which the frequency half of the score saturates.
pub const SCORE_SATURATION_SESSIONS: f64 = 20.0;

/// Composite 0-100 activity score.
///
/// `100 * (0.5 * min(hours / 40, 1) + 0.5 * min(sessions / 20, 1))`.
///
/// The saturation points are fixed constants defining where each half of
/// the score maxes out, not statistical fits. The result is clamped to
/// `[0, 100]`.
pub fn activity_score(total_hours: f64, session_count: usize) -> f64 {
    let time_term = (total_hours / SCORE_SATURATION_HOURS).min(1.0);
    let session_term = (session_count as f64 / SCORE_SATURATION_SESSIONS).min(1.0);
    (100.0 * (0.5 * time_term + 0.5 * session_term)).clamp(0.0, 100.0)
}
