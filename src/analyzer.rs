// src/analyzer.rs

use crate::error::{Error, Result};
use crate::github::GitHubApi;
use crate::model::*;
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt;
use tracing::{debug, info, warn};

/// Which per-repository query failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Commits,
    Languages,
}

impl fmt::Display for FetchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchKind::Commits => f.write_str("commits"),
            FetchKind::Languages => f.write_str("languages"),
        }
    }
}

/// What one repository yielded, each query kept as its own result
#[derive(Debug)]
pub struct RepoOutcome {
    pub repository: String,
    pub commits: Result<Vec<CommitRecord>>,
    pub languages: Result<LanguageTally>,
}

/// A query that contributed nothing because it failed
#[derive(Debug)]
pub struct RepoFailure {
    pub repository: String,
    pub kind: FetchKind,
    pub error: Error,
}

/// Collection result: the dataset built from successes, plus what failed
#[derive(Debug)]
pub struct Collection {
    pub dataset: UserDataset,
    pub failures: Vec<RepoFailure>,
}

/// Collects commits authored by `login` since `since` and the language mix
/// of every non-fork repository the account owns.
///
/// Only listing the account or its repositories is fatal. Failures inside a
/// single repository end up in [`Collection::failures`].
pub fn analyze<A: GitHubApi>(
    api: &A,
    login: &str,
    since: DateTime<Utc>,
    max_commits_per_repo: Option<usize>,
) -> Result<Collection> {
    let account = api.account(login)?;
    info!("Fetching data for user: {}", account.login);

    let repos: Vec<Repository> = api
        .repositories(&account.login)?
        .into_iter()
        .filter(|r| !r.fork)
        .collect();
    info!("Found {} non-fork repositories.", repos.len());

    let bar = ProgressBar::new(repos.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}") {
        bar.set_style(style);
    }

    let mut outcomes = Vec::with_capacity(repos.len());
    for repo in &repos {
        bar.set_message(repo.name.clone());
        outcomes.push(RepoOutcome {
            repository: repo.name.clone(),
            commits: api.commits(repo, &account.login, since, max_commits_per_repo),
            languages: api.languages(repo),
        });
        bar.inc(1);
    }
    bar.finish_and_clear();

    let collection = fold(account, outcomes);
    for failure in &collection.failures {
        warn!(
            "Could not fetch {} for {}: {}",
            failure.kind, failure.repository, failure.error
        );
    }
    info!("Fetched {} recent commits.", collection.dataset.commits.len());
    if let Some(latest) = collection.dataset.commits.last() {
        debug!(
            "Latest commit in {}: {}",
            latest.repository,
            latest.message.lines().next().unwrap_or_default()
        );
    }

    Ok(collection)
}

/// Folds per-repository outcomes into a dataset, setting failures aside.
pub fn fold(account: Account, outcomes: Vec<RepoOutcome>) -> Collection {
    let mut commits = Vec::new();
    let mut tally = LanguageTally::new();
    let mut failures = Vec::new();

    for outcome in outcomes {
        match outcome.commits {
            Ok(found) => commits.extend(found),
            Err(error) => failures.push(RepoFailure {
                repository: outcome.repository.clone(),
                kind: FetchKind::Commits,
                error,
            }),
        }
        match outcome.languages {
            Ok(languages) => {
                for (language, bytes) in languages {
                    *tally.entry(language).or_insert(0) += bytes;
                }
            }
            Err(error) => failures.push(RepoFailure {
                repository: outcome.repository,
                kind: FetchKind::Languages,
                error,
            }),
        }
    }

    // Stable sort keeps same-instant commits in fetch order
    commits.sort_by_key(|c| c.timestamp);

    Collection {
        dataset: UserDataset {
            account,
            commits,
            languages: language_percentages(&tally),
        },
        failures,
    }
}

/// Converts byte totals into percentages of the grand total.
/// An empty or all-zero tally gives an empty map.
pub fn language_percentages(tally: &LanguageTally) -> LanguageShares {
    let total: u64 = tally.values().sum();
    if total == 0 {
        return LanguageShares::new();
    }
    tally
        .iter()
        .map(|(language, &bytes)| (language.clone(), bytes as f64 / total as f64 * 100.0))
        .collect()
}
