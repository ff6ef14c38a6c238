//! Log line parsing for license-insight.
//!
//! Converts one raw line into a typed [`LogEvent`] or a typed rejection.
//! Two grammars are recognised, tried in order: the licensing-server
//! format (millisecond timestamps, optional license token) and a generic
//! login/logout format (second timestamps, no license field).

use chrono::NaiveDateTime;
use insight_core::models::{EventAction, LogEvent};
use regex::Regex;
use thiserror::Error;

// ── ParseError ────────────────────────────────────────────────────────────────

/// Why a line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseReason {
    /// The line matches neither recognised grammar.
    #[error("line matches no known log format")]
    UnrecognizedFormat,
    /// The timestamp field could not be parsed.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),
    /// The quoted user id is empty or whitespace.
    #[error("empty user id")]
    EmptyUserId,
}

/// A rejected line together with the reason.
///
/// Rejections are counted and surfaced in the run summary; they never
/// abort a run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}: {line}")]
pub struct ParseError {
    pub reason: ParseReason,
    pub line: String,
}

// ── LineParser ────────────────────────────────────────────────────────────────

/// Parses raw log lines into [`LogEvent`]s.
///
/// Holds the compiled grammar patterns; construct once and reuse across
/// all lines of a run.
pub struct LineParser {
    licensing: Regex,
    generic: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        Self {
            // 2025-08-05 09:00:00,123 [worker-1] INFO  LicenseManager -
            //   User 'alice' logged in with named ALM
            licensing: Regex::new(
                r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d{3}).*?User '([^']+)' logged (in|out)(?: with (?:named|concurrent) ([A-Z0-9_]+))?",
            )
            .expect("regex is valid"),
            // 2025-08-05 09:00:00 User 'alice' logged in
            generic: Regex::new(
                r"^(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\b.*?User '([^']+)' logged (in|out)\b",
            )
            .expect("regex is valid"),
        }
    }

    /// Parse one line. Blank lines are the caller's concern; this function
    /// treats them as unrecognized.
    pub fn parse_line(&self, line: &str) -> Result<LogEvent, ParseError> {
        if let Some(caps) = self.licensing.captures(line) {
            let timestamp = parse_timestamp(&caps[1], "%Y-%m-%d %H:%M:%S,%3f", line)?;
            return build_event(
                timestamp,
                &caps[2],
                &caps[3],
                caps.get(4).map(|m| m.as_str().to_string()),
                line,
            );
        }

        if let Some(caps) = self.generic.captures(line) {
            let timestamp = parse_timestamp(&caps[1], "%Y-%m-%d %H:%M:%S", line)?;
            return build_event(timestamp, &caps[2], &caps[3], None, line);
        }

        Err(ParseError {
            reason: ParseReason::UnrecognizedFormat,
            line: line.to_string(),
        })
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn parse_timestamp(raw: &str, format: &str, line: &str) -> Result<NaiveDateTime, ParseError> {
    NaiveDateTime::parse_from_str(raw, format).map_err(|_| ParseError {
        reason: ParseReason::InvalidTimestamp(raw.to_string()),
        line: line.to_string(),
    })
}

fn build_event(
    timestamp: NaiveDateTime,
    user_id: &str,
    direction: &str,
    license_type: Option<String>,
    line: &str,
) -> Result<LogEvent, ParseError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ParseError {
            reason: ParseReason::EmptyUserId,
            line: line.to_string(),
        });
    }

    let action = if direction == "in" {
        EventAction::Login
    } else {
        EventAction::Logout
    };

    Ok(LogEvent {
        timestamp,
        user_id: user_id.to_string(),
        action,
        license_type,
        source_line: line.to_string(),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
