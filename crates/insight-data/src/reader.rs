//! Log source discovery and streaming for license-insight.
//!
//! Expands source patterns (files, globs, directories) into concrete
//! paths, then streams each file line-by-line through the [`LineParser`],
//! accumulating events per user id. Rotated files may enumerate in any
//! order, so each user's events are re-sorted by timestamp after all
//! sources are read; the sort is stable, ties keep encounter order.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use insight_core::error::{InsightError, Result};
use insight_core::models::LogEvent;
use tracing::{debug, warn};

use crate::parser::LineParser;

// ── Public types ──────────────────────────────────────────────────────────────

/// Line and source counters accumulated while reading.
#[derive(Debug, Clone, Default)]
pub struct IngestStats {
    pub sources_read: usize,
    pub sources_failed: usize,
    pub lines_parsed: u64,
    pub lines_rejected: u64,
}

/// Per-user, timestamp-sorted event sequences plus ingest counters.
#[derive(Debug, Default)]
pub struct EventLog {
    /// Events keyed by user id; each sequence sorted by timestamp.
    /// BTreeMap so downstream iteration order is deterministic.
    pub events_by_user: BTreeMap<String, Vec<LogEvent>>,
    pub stats: IngestStats,
}

impl EventLog {
    /// Total number of parsed events across all users.
    pub fn event_count(&self) -> usize {
        self.events_by_user.values().map(Vec::len).sum()
    }

    /// Latest timestamp across all users, if any events were parsed.
    pub fn last_timestamp(&self) -> Option<chrono::NaiveDateTime> {
        self.events_by_user
            .values()
            .flat_map(|events| events.iter().map(|e| e.timestamp))
            .max()
    }
}

// ── Source resolution ─────────────────────────────────────────────────────────

/// Expand each pattern into concrete file paths.
///
/// A pattern is, in order of checks: an existing directory (recursive scan
/// for `*.log` / `*.txt`, sorted by path), a glob expression, or a plain
/// file path. Returns [`InsightError::NoSources`] when nothing matches.
pub fn resolve_sources(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for pattern in patterns {
        let path = Path::new(pattern);
        if path.is_dir() {
            files.extend(find_log_files(path));
        } else if pattern.contains(['*', '?', '[']) {
            let matches =
                glob::glob(pattern).map_err(|source| InsightError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                })?;
            let mut expanded: Vec<PathBuf> = matches
                .filter_map(|entry| entry.ok())
                .filter(|p| p.is_file())
                .collect();
            expanded.sort();
            files.extend(expanded);
        } else {
            files.push(PathBuf::from(pattern));
        }
    }

    files.dedup();
    if files.is_empty() {
        return Err(InsightError::NoSources(patterns.join(", ")));
    }
    Ok(files)
}

/// Recursively collect `.log` and `.txt` files under `dir`, sorted by path.
fn find_log_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext == "log" || ext == "txt")
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

// ── Reading ───────────────────────────────────────────────────────────────────

/// Stream all `files` and build the per-user event log.
///
/// An unreadable file is fatal when it is the sole source; with multiple
/// sources it is logged and counted in `sources_failed` while the run
/// continues.
pub fn read_sources(files: &[PathBuf]) -> Result<EventLog> {
    let parser = LineParser::new();
    let mut log = EventLog::default();
    let sole_source = files.len() == 1;

    for path in files {
        match read_single_source(path, &parser, &mut log) {
            Ok(()) => log.stats.sources_read += 1,
            Err(source) => {
                if sole_source {
                    return Err(InsightError::SourceAccess {
                        path: path.clone(),
                        source,
                    });
                }
                warn!("Skipping unreadable source {}: {}", path.display(), source);
                log.stats.sources_failed += 1;
            }
        }
    }

    // Restore chronological order per user. Stable sort: events carrying
    // the same timestamp keep the order their sources were encountered in.
    for events in log.events_by_user.values_mut() {
        events.sort_by_key(|event| event.timestamp);
    }

    debug!(
        "Read {} events for {} users from {} sources ({} rejected lines)",
        log.event_count(),
        log.events_by_user.len(),
        log.stats.sources_read,
        log.stats.lines_rejected,
    );

    Ok(log)
}

/// Stream one file into `log`, line by line.
fn read_single_source(
    path: &Path,
    parser: &LineParser,
    log: &mut EventLog,
) -> std::io::Result<()> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);

    for line_result in reader.lines() {
        let line = match line_result {
            Ok(l) => l,
            Err(_) => continue,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match parser.parse_line(trimmed) {
            Ok(event) => {
                log.stats.lines_parsed += 1;
                log.events_by_user
                    .entry(event.user_id.clone())
                    .or_default()
                    .push(event);
            }
            Err(err) => {
                log.stats.lines_rejected += 1;
                debug!("Rejected line in {}: {}", path.display(), err);
            }
        }
    }

    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
