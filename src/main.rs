// src/main.rs

mod analyzer;
mod cli;
mod error;
mod github;
mod model;
mod readme;
mod renderer;
mod summary;

use chrono::{DateTime, Duration, Utc};
use clap::Parser;
use cli::Args;
use github::{GitHubApi, GitHubClient};
use readme::Section;
use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    match run(&args) {
        Ok(()) => {
            info!("Total time: {:.2?}", start_time.elapsed());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error generating metrics: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> error::Result<()> {
    let token = args.token.as_deref().filter(|t| !t.trim().is_empty());
    if token.is_none() {
        error!("GITHUB_TOKEN is not set; falling back to anonymous, rate-limited requests.");
    }
    let client = GitHubClient::new(&args.api_url, token)?;

    generate(&client, args, Utc::now())
}

/// Collects the account's activity up to `now`, writes both charts and
/// rewrites the README sections.
fn generate<A: GitHubApi>(api: &A, args: &Args, now: DateTime<Utc>) -> error::Result<()> {
    fs::create_dir_all(&args.output).map_err(|e| error::Error::io(&args.output, e))?;

    let since = now - Duration::days(args.window_days);
    let collection = analyzer::analyze(api, &args.username, since, args.max_commits_per_repo)?;
    let data = &collection.dataset;

    let activity_path = args.activity_chart_path();
    let language_path = args.language_chart_path();
    renderer::render_commit_activity(&data.commits, &activity_path)?;
    renderer::render_language_chart(&data.languages, &language_path)?;

    let summary = summary::generate_summary(data, args.window_days);
    readme::update_file(
        &args.readme,
        &readme_sections(&summary, &activity_path, &language_path),
    )?;

    Ok(())
}

fn readme_sections(summary: &str, activity_chart: &Path, language_chart: &Path) -> [Section; 3] {
    [
        Section::named("metrics", summary.trim_end()),
        Section::named(
            "activity_chart",
            format!("<img src=\"{}\" width=\"800\">", cli::markup_path(activity_chart)),
        ),
        Section::named(
            "language_chart",
            format!("<img src=\"{}\" width=\"400\">", cli::markup_path(language_chart)),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    const README: &str = "# Me\n\
        <!--START_SECTION:metrics--><!--END_SECTION:metrics-->\n\
        <!--START_SECTION:activity_chart--><!--END_SECTION:activity_chart-->\n\
        <!--START_SECTION:language_chart--><!--END_SECTION:language_chart-->\n";

    /// Serves a fixed set of repositories, each with its commits and languages.
    struct StubApi {
        repos: Vec<(Repository, Vec<CommitRecord>, LanguageTally)>,
    }

    impl GitHubApi for StubApi {
        fn account(&self, login: &str) -> error::Result<Account> {
            Ok(Account {
                login: login.to_string(),
                name: None,
            })
        }

        fn repositories(&self, _login: &str) -> error::Result<Vec<Repository>> {
            Ok(self.repos.iter().map(|(r, _, _)| r.clone()).collect())
        }

        fn commits(
            &self,
            repo: &Repository,
            _author: &str,
            since: DateTime<Utc>,
            _limit: Option<usize>,
        ) -> error::Result<Vec<CommitRecord>> {
            Ok(self
                .repos
                .iter()
                .filter(|(r, _, _)| r == repo)
                .flat_map(|(_, commits, _)| commits.iter().filter(|c| c.timestamp >= since).cloned())
                .collect())
        }

        fn languages(&self, repo: &Repository) -> error::Result<LanguageTally> {
            Ok(self
                .repos
                .iter()
                .find(|(r, _, _)| r == repo)
                .map(|(_, _, languages)| languages.clone())
                .unwrap_or_default())
        }
    }

    fn args_in(dir: &Path) -> Args {
        let output = dir.join("assets");
        let readme = dir.join("README.md");
        Args::try_parse_from([
            "readme-metrics",
            "--username",
            "octocat",
            "--window-days",
            "365",
            "--output",
            output.to_str().unwrap(),
            "--readme",
            readme.to_str().unwrap(),
        ])
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn sections_point_at_chart_files() {
        let sections = readme_sections(
            "summary\n",
            &PathBuf::from("assets").join(cli::ACTIVITY_CHART_FILE),
            &PathBuf::from("assets").join(cli::LANGUAGE_CHART_FILE),
        );

        assert_eq!(sections[0], Section::named("metrics", "summary"));
        assert_eq!(sections[1].start, "<!--START_SECTION:activity_chart-->");
        assert_eq!(
            sections[1].content,
            "<img src=\"assets/commit_activity.svg\" width=\"800\">"
        );
        assert_eq!(sections[2].end, "<!--END_SECTION:language_chart-->");
        assert_eq!(
            sections[2].content,
            "<img src=\"assets/top_languages.svg\" width=\"400\">"
        );
    }

    #[test]
    fn no_repositories_leaves_charts_unwritten() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = args_in(dir.path());
        fs::write(&args.readme, README).unwrap();

        generate(&StubApi { repos: Vec::new() }, &args, now()).unwrap();

        assert!(args.output.is_dir());
        assert!(!args.activity_chart_path().exists());
        assert!(!args.language_chart_path().exists());
        let readme = fs::read_to_string(&args.readme).unwrap();
        assert!(readme.contains("I've made 0 commits"));
        assert!(!readme.contains("most used language"));
        assert!(readme.contains("commit_activity.svg\" width=\"800\">\n<!--END_SECTION:activity_chart-->"));
    }

    #[test]
    fn full_run_writes_charts_and_readme() {
        let dir = tempfile::TempDir::new().unwrap();
        let args = args_in(dir.path());
        fs::write(&args.readme, README).unwrap();
        let commit = |month: u32, day: u32| CommitRecord {
            timestamp: Utc.with_ymd_and_hms(2024, month, day, 9, 0, 0).unwrap(),
            repository: "site".to_string(),
            message: "update".to_string(),
        };
        let stale = CommitRecord {
            timestamp: Utc.with_ymd_and_hms(2022, 1, 1, 9, 0, 0).unwrap(),
            ..commit(1, 1)
        };
        let api = StubApi {
            repos: vec![
                (
                    Repository {
                        owner: "octocat".to_string(),
                        name: "site".to_string(),
                        fork: false,
                    },
                    vec![commit(3, 2), commit(3, 2), commit(5, 20), stale],
                    LanguageTally::from([("Go".to_string(), 300), ("Python".to_string(), 700)]),
                ),
                (
                    Repository {
                        owner: "octocat".to_string(),
                        name: "upstream".to_string(),
                        fork: true,
                    },
                    vec![commit(4, 4)],
                    LanguageTally::from([("C".to_string(), 10_000)]),
                ),
            ],
        };

        generate(&api, &args, now()).unwrap();

        let activity = fs::read_to_string(args.activity_chart_path()).unwrap();
        assert!(activity.contains(">Mar 02<"));
        let languages = fs::read_to_string(args.language_chart_path()).unwrap();
        assert!(languages.contains(">Python<"));
        assert!(!languages.contains(">C<"));

        let readme = fs::read_to_string(&args.readme).unwrap();
        assert!(readme.starts_with("# Me\n<!--START_SECTION:metrics-->\n### Recent Activity Summary"));
        assert!(readme.contains("I've made 3 commits"));
        assert!(readme.contains("My most used language is **Python** (70.0%)."));
    }
}
