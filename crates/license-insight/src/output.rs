//! Plain-text, JSON and CSV rendering of analysis results.
//!
//! Pure functions from result structs to `String`; `main` decides where
//! the text goes. No algorithmic content lives here.

use insight_core::models::{LicenseUsage, RunSummary, UserActivity, UNKNOWN_LICENSE};
use insight_core::outliers::OutlierSlices;
use insight_data::analysis::AnalysisResult;

const USER_HEADERS: [&str; 7] = [
    "User ID",
    "Total Hours",
    "Avg Session (min)",
    "Sessions",
    "Activity Score",
    "License",
    "Last Login",
];

const LICENSE_HEADERS: [&str; 5] = [
    "License Type",
    "Total Hours",
    "Unique Users",
    "Avg Session (min)",
    "Peak Concurrent",
];

// ── Tables ────────────────────────────────────────────────────────────────────

/// Render the per-user activity table.
pub fn user_table(users: &[UserActivity]) -> String {
    if users.is_empty() {
        return "No user activity data to display\n".to_string();
    }
    let rows: Vec<Vec<String>> = users.iter().map(user_row).collect();
    render_table(&USER_HEADERS, &rows)
}

/// Render the per-license usage table.
pub fn license_table(licenses: &[LicenseUsage]) -> String {
    if licenses.is_empty() {
        return "No license usage data to display\n".to_string();
    }
    let rows: Vec<Vec<String>> = licenses.iter().map(license_row).collect();
    render_table(&LICENSE_HEADERS, &rows)
}

/// Render the run-quality summary block.
pub fn summary_text(summary: &RunSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Sources read: {} ({} failed)\n",
        summary.sources_read, summary.sources_failed
    ));
    out.push_str(&format!(
        "Lines parsed: {} ({} rejected)\n",
        summary.lines_parsed, summary.lines_rejected
    ));
    out.push_str(&format!(
        "Sessions: {} ({} closed, {} inferred, {} capped by timeout)\n",
        summary.sessions_reconstructed,
        summary.closed_sessions,
        summary.inferred_sessions,
        summary.timeout_closures
    ));
    out.push_str(&format!("Orphan logouts ignored: {}\n", summary.orphan_logouts));
    out.push_str(&format!(
        "Distinct users: {}, license types: {}\n",
        summary.distinct_users, summary.distinct_license_types
    ));
    out
}

/// Render the top/bottom outlier report.
pub fn outlier_report(outliers: &OutlierSlices) -> String {
    let percent = format_percent(outliers.percentile);
    let mut out = String::new();
    out.push_str(&format!("TOP {percent}% USERS BY ACTIVITY SCORE\n"));
    out.push_str(&outlier_table(&outliers.top));
    out.push_str(&format!("\nBOTTOM {percent}% USERS BY ACTIVITY SCORE\n"));
    out.push_str(&outlier_table(&outliers.bottom));
    out
}

/// `0.1` → `"10"`, `0.125` → `"12.5"`. Rounded to one decimal so binary
/// float noise never leaks into the report.
fn format_percent(fraction: f64) -> String {
    let percent = (fraction * 1000.0).round() / 10.0;
    if percent.fract() == 0.0 {
        format!("{percent:.0}")
    } else {
        format!("{percent:.1}")
    }
}

fn outlier_table(users: &[UserActivity]) -> String {
    const HEADERS: [&str; 4] = ["User ID", "Activity Score", "Total Hours", "Sessions"];
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.user_id.clone(),
                format!("{:.1}", u.activity_score),
                format!("{:.1}", u.total_hours),
                u.session_count.to_string(),
            ]
        })
        .collect();
    render_table(&HEADERS, &rows)
}

// ── JSON / CSV ────────────────────────────────────────────────────────────────

/// Render the whole result as pretty-printed JSON.
pub fn render_json(result: &AnalysisResult) -> String {
    serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
}

/// Render user activities and license usages as two CSV blocks.
pub fn render_csv(users: &[UserActivity], licenses: &[LicenseUsage]) -> String {
    let mut out = String::new();

    out.push_str("User Activities:\n");
    out.push_str(&csv_line(&USER_HEADERS.map(str::to_string)));
    for user in users {
        out.push_str(&csv_line(&user_row(user)));
    }

    out.push_str("\nLicense Usage:\n");
    out.push_str(&csv_line(&LICENSE_HEADERS.map(str::to_string)));
    for license in licenses {
        out.push_str(&csv_line(&license_row(license)));
    }

    out
}

// ── Row shaping ───────────────────────────────────────────────────────────────

fn user_row(user: &UserActivity) -> Vec<String> {
    vec![
        user.user_id.clone(),
        format!("{:.1}", user.total_hours),
        format!("{:.1}", user.average_session_minutes),
        user.session_count.to_string(),
        format!("{:.1}", user.activity_score),
        user.dominant_license_type
            .clone()
            .unwrap_or_else(|| UNKNOWN_LICENSE.to_string()),
        user.last_login.format("%Y-%m-%d %H:%M").to_string(),
    ]
}

fn license_row(license: &LicenseUsage) -> Vec<String> {
    vec![
        license.license_type.clone(),
        format!("{:.1}", license.total_hours),
        license.unique_users.to_string(),
        format!("{:.1}", license.average_session_minutes),
        license.peak_concurrent_users.to_string(),
    ]
}

// ── Primitive renderers ───────────────────────────────────────────────────────

/// Fixed-width text table with a header separator.
fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    push_row(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    push_row(&mut out, &rule, &widths);
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String], widths: &[usize]) {
    let formatted: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(formatted.join("  ").trim_end());
    out.push('\n');
}

fn csv_line(cells: &[String]) -> String {
    let escaped: Vec<String> = cells.iter().map(|c| csv_escape(c)).collect();
    format!("{}\n", escaped.join(","))
}

/// Quote a field when it contains a comma, quote or newline.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
