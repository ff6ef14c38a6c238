use chrono::NaiveDate;
use clap::Parser;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// User activity and license utilization analysis for license-server logs
#[derive(Parser, Debug, Clone)]
#[command(
    name = "license-insight",
    about = "Analyze user activity and license utilization from login/logout logs",
    version
)]
pub struct Settings {
    /// Log sources: file paths, glob patterns, or directories
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Session timeout in minutes, bounding sessions without a matching logout
    #[arg(long, default_value = "30", value_parser = clap::value_parser!(i64).range(1..))]
    pub timeout_minutes: i64,

    /// Fraction of users in each outlier slice, exclusive (0, 1)
    #[arg(long, short = 'p', default_value = "0.1")]
    pub percentile: f64,

    /// Output format
    #[arg(long, short = 'o', default_value = "table", value_parser = ["table", "json", "csv"])]
    pub output: String,

    /// Sort key for the user activity listing
    #[arg(long, default_value = "activity_score",
          value_parser = ["activity_score", "user_id", "total_hours", "sessions"])]
    pub sort_by: String,

    /// Show at most this many users
    #[arg(long)]
    pub limit: Option<usize>,

    /// Only show users whose id contains this substring (case-insensitive)
    #[arg(long)]
    pub filter_user: Option<String>,

    /// Only show users whose last login is on or after this date (YYYY-MM-DD)
    #[arg(long)]
    pub since: Option<NaiveDate>,

    /// Only show users whose last login is before the end of this date (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<NaiveDate>,

    /// End trailing open sessions at the stream's last timestamp instead of
    /// the user's own last event
    #[arg(long)]
    pub global_end: bool,

    /// Logging level
    #[arg(long, default_value = "INFO",
          value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}
