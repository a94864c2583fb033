// src/cli.rs

use clap::Parser;
use std::path::{Path, PathBuf};

pub const ACTIVITY_CHART_FILE: &str = "commit_activity.svg";
pub const LANGUAGE_CHART_FILE: &str = "top_languages.svg";

/// Everything the run needs, resolved once from flags and environment.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// GitHub access token; without it requests are anonymous and heavily rate-limited
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Account whose repositories and commits are aggregated
    #[arg(short, long, env = "GH_USERNAME", default_value = "MushfiqPlabon")]
    pub username: String,

    /// Directory to save the generated SVG charts
    #[arg(short, long, env = "METRICS_OUTPUT_DIR", default_value = "assets")]
    pub output: PathBuf,

    /// README file whose marker sections get rewritten
    #[arg(short, long, env = "METRICS_README", default_value = "README.md")]
    pub readme: PathBuf,

    /// Base URL of the GitHub REST API
    #[arg(long, env = "GITHUB_API_URL", default_value = "https://api.github.com")]
    pub api_url: String,

    /// Size of the trailing commit window, in days (1 to 36500)
    #[arg(
        long,
        env = "METRICS_WINDOW_DAYS",
        default_value_t = 365,
        value_parser = clap::value_parser!(i64).range(1..=36500)
    )]
    pub window_days: i64,

    /// Stop listing a repository's commits after this many (unbounded when unset)
    #[arg(long, env = "MAX_COMMITS_PER_REPO")]
    pub max_commits_per_repo: Option<usize>,
}

impl Args {
    pub fn activity_chart_path(&self) -> PathBuf {
        self.output.join(ACTIVITY_CHART_FILE)
    }

    pub fn language_chart_path(&self) -> PathBuf {
        self.output.join(LANGUAGE_CHART_FILE)
    }
}

/// Renders a path the way README image links expect it, with forward slashes.
pub fn markup_path(path: &Path) -> String {
    path.to_string_lossy()
        .replace(std::path::MAIN_SEPARATOR, "/")
}
