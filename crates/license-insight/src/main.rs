mod bootstrap;
mod output;

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use insight_core::models::UserActivity;
use insight_core::outliers::rank_outliers;
use insight_core::settings::Settings;
use insight_data::analysis::{analyze, AnalysisOptions};

fn main() -> Result<()> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("license-insight v{} starting", env!("CARGO_PKG_VERSION"));

    let options = AnalysisOptions {
        timeout_minutes: settings.timeout_minutes,
        percentile: settings.percentile,
        use_global_end: settings.global_end,
    };

    let mut result = analyze(&settings.sources, &options)?;
    result.users = shape_users(result.users, &settings);
    // The outlier report covers the listing actually shown, so re-rank
    // after filters and limit have been applied.
    result.outliers = rank_outliers(&result.users, settings.percentile);

    match settings.output.as_str() {
        "json" => print!("{}", output::render_json(&result)),
        "csv" => print!("{}", output::render_csv(&result.users, &result.licenses)),
        _ => {
            println!("USER ACTIVITY SUMMARY");
            print!("{}", output::user_table(&result.users));
            println!();
            println!("LICENSE USAGE SUMMARY");
            print!("{}", output::license_table(&result.licenses));
            println!();
            println!("OUTLIER ANALYSIS");
            print!("{}", output::outlier_report(&result.outliers));
            println!();
            println!("RUN SUMMARY");
            print!("{}", output::summary_text(&result.summary));
        }
    }

    Ok(())
}

// ── Presentation-side shaping ─────────────────────────────────────────────────

/// Apply the user filter, date window, sort key and limit to the listing.
///
/// Purely presentational: license metrics are computed upstream over the
/// unfiltered session set and are not affected.
fn shape_users(users: Vec<UserActivity>, settings: &Settings) -> Vec<UserActivity> {
    let mut shaped: Vec<UserActivity> = users
        .into_iter()
        .filter(|user| matches_filter(user, settings.filter_user.as_deref()))
        .filter(|user| within_window(user, settings.since, settings.until))
        .collect();

    sort_users(&mut shaped, &settings.sort_by);

    if let Some(limit) = settings.limit {
        shaped.truncate(limit);
    }
    shaped
}

fn matches_filter(user: &UserActivity, filter: Option<&str>) -> bool {
    match filter {
        Some(needle) => user
            .user_id
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        None => true,
    }
}

/// Keep users whose last login falls inside `[since, until]` (whole days,
/// `until` inclusive).
fn within_window(user: &UserActivity, since: Option<NaiveDate>, until: Option<NaiveDate>) -> bool {
    let login_date = user.last_login.date();
    if let Some(start) = since {
        if login_date < start {
            return false;
        }
    }
    if let Some(end) = until {
        if login_date > end {
            return false;
        }
    }
    true
}

fn sort_users(users: &mut [UserActivity], sort_by: &str) {
    match sort_by {
        "user_id" => users.sort_by(|a, b| a.user_id.cmp(&b.user_id)),
        "total_hours" => users.sort_by(|a, b| {
            b.total_hours
                .partial_cmp(&a.total_hours)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        "sessions" => users.sort_by(|a, b| b.session_count.cmp(&a.session_count)),
        _ => users.sort_by(|a, b| {
            b.activity_score
                .partial_cmp(&a.activity_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_user(user_id: &str, score: f64, hours: f64, day: u32) -> UserActivity {
        UserActivity {
            user_id: user_id.to_string(),
            total_hours: hours,
            average_session_minutes: 30.0,
            session_count: (score / 2.5) as usize,
            last_login: NaiveDate::from_ymd_opt(2025, 8, day)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            activity_score: score,
            dominant_license_type: None,
        }
    }

    fn settings_from(args: &[&str]) -> Settings {
        let mut full = vec!["license-insight", "server.log"];
        full.extend(args);
        Settings::parse_from(full)
    }

    #[test]
    fn test_default_sort_is_score_descending() {
        let users = vec![
            make_user("low", 10.0, 1.0, 1),
            make_user("high", 90.0, 30.0, 1),
            make_user("mid", 50.0, 10.0, 1),
        ];
        let shaped = shape_users(users, &settings_from(&[]));
        let ids: Vec<&str> = shaped.iter().map(|u| u.user_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_sort_by_user_id_ascending() {
        let users = vec![
            make_user("carol", 10.0, 1.0, 1),
            make_user("alice", 90.0, 30.0, 1),
        ];
        let shaped = shape_users(users, &settings_from(&["--sort-by", "user_id"]));
        assert_eq!(shaped[0].user_id, "alice");
    }

    #[test]
    fn test_filter_user_is_case_insensitive_substring() {
        let users = vec![
            make_user("Alice.Smith", 10.0, 1.0, 1),
            make_user("bob", 20.0, 2.0, 1),
        ];
        let shaped = shape_users(users, &settings_from(&["--filter-user", "alice"]));
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].user_id, "Alice.Smith");
    }

    #[test]
    fn test_limit_truncates_after_sorting() {
        let users = vec![
            make_user("low", 10.0, 1.0, 1),
            make_user("high", 90.0, 30.0, 1),
            make_user("mid", 50.0, 10.0, 1),
        ];
        let shaped = shape_users(users, &settings_from(&["--limit", "1"]));
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].user_id, "high");
    }

    #[test]
    fn test_date_window_filters_by_last_login() {
        let users = vec![
            make_user("early", 10.0, 1.0, 1),
            make_user("inside", 20.0, 2.0, 3),
            make_user("late", 30.0, 3.0, 6),
        ];
        let shaped = shape_users(
            users,
            &settings_from(&["--since", "2025-08-02", "--until", "2025-08-04"]),
        );
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped[0].user_id, "inside");
    }

    #[test]
    fn test_until_is_inclusive_of_the_whole_day() {
        let users = vec![make_user("edge", 10.0, 1.0, 4)];
        let shaped = shape_users(users, &settings_from(&["--until", "2025-08-04"]));
        assert_eq!(shaped.len(), 1);
    }
}
