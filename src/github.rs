// src/github.rs

use crate::error::{Error, Result};
use crate::model::{Account, CommitRecord, LanguageTally, Repository};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK};
use serde::de::DeserializeOwned;
use serde::Deserialize;

const PER_PAGE: &str = "100";
const API_VERSION: &str = "2022-11-28";

/// Read-only queries the collector needs from GitHub.
pub trait GitHubApi {
    fn account(&self, login: &str) -> Result<Account>;

    /// Repositories owned by `login`, forks included.
    fn repositories(&self, login: &str) -> Result<Vec<Repository>>;

    /// Commits in `repo` authored by `author` since `since`, newest first,
    /// at most `limit` of them when a limit is given.
    fn commits(
        &self,
        repo: &Repository,
        author: &str,
        since: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<CommitRecord>>;

    /// Source bytes per language for `repo`.
    fn languages(&self, repo: &Repository) -> Result<LanguageTally>;
}

/// Blocking REST client for the GitHub API
pub struct GitHubClient {
    http: Client,
    base_url: String,
}

impl GitHubClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        if let Some(token) = token {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| Error::InvalidToken)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetches one page and returns it with the URL of the page after it, if any.
    fn get_page<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<(T, Option<String>)> {
        let response = check_status(self.http.get(url).query(query).send()?)?;
        let next = response
            .headers()
            .get(LINK)
            .and_then(|v| v.to_str().ok())
            .and_then(next_page_link);
        Ok((response.json()?, next))
    }

    fn get_paginated<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        limit: Option<usize>,
    ) -> Result<Vec<T>> {
        let (mut items, mut next) = self.get_page::<Vec<T>>(&self.url(path), query)?;

        // The next-page URL already carries the original query string
        while let Some(url) = next.take() {
            if limit.is_some_and(|limit| items.len() >= limit) {
                break;
            }
            let (page, following) = self.get_page::<Vec<T>>(&url, &[])?;
            items.extend(page);
            next = following;
        }

        if let Some(limit) = limit {
            items.truncate(limit);
        }
        Ok(items)
    }
}

impl GitHubApi for GitHubClient {
    fn account(&self, login: &str) -> Result<Account> {
        let (user, _) = self.get_page::<UserWire>(&self.url(&format!("/users/{login}")), &[])?;
        Ok(Account {
            login: user.login,
            name: user.name,
        })
    }

    fn repositories(&self, login: &str) -> Result<Vec<Repository>> {
        let query = [("type", "owner".to_string()), ("per_page", PER_PAGE.to_string())];
        let repos: Vec<RepoWire> =
            self.get_paginated(&format!("/users/{login}/repos"), &query, None)?;
        Ok(repos.into_iter().map(Repository::from).collect())
    }

    fn commits(
        &self,
        repo: &Repository,
        author: &str,
        since: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<CommitRecord>> {
        let query = [
            ("author", author.to_string()),
            ("since", since.to_rfc3339_opts(SecondsFormat::Secs, true)),
            ("per_page", PER_PAGE.to_string()),
        ];
        let path = format!("/repos/{}/{}/commits", repo.owner, repo.name);
        let commits: Vec<CommitWire> = self.get_paginated(&path, &query, limit)?;
        Ok(commits
            .into_iter()
            .filter_map(|c| c.into_record(&repo.name))
            .collect())
    }

    fn languages(&self, repo: &Repository) -> Result<LanguageTally> {
        let path = format!("/repos/{}/{}/languages", repo.owner, repo.name);
        let (languages, _) = self.get_page::<LanguageTally>(&self.url(&path), &[])?;
        Ok(languages)
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let url = response.url().to_string();
    let body = response.text().unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        url,
        message: api_message(&body),
    })
}

/// Pulls the `message` field out of a GitHub error body, or returns the body as-is.
fn api_message(body: &str) -> String {
    serde_json::from_str::<ErrorWire>(body)
        .map(|e| e.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Extracts the `rel="next"` target from a `Link` header.
fn next_page_link(header: &str) -> Option<String> {
    header.split(',').find_map(|entry| {
        let mut parts = entry.split(';');
        let target = parts.next()?.trim();
        let is_next = parts.any(|p| p.trim() == r#"rel="next""#);
        is_next.then(|| {
            target
                .trim_start_matches('<')
                .trim_end_matches('>')
                .to_string()
        })
    })
}

#[derive(Deserialize)]
struct ErrorWire {
    message: String,
}

#[derive(Deserialize)]
struct UserWire {
    login: String,
    name: Option<String>,
}

#[derive(Deserialize)]
struct OwnerWire {
    login: String,
}

#[derive(Deserialize)]
struct RepoWire {
    name: String,
    #[serde(default)]
    fork: bool,
    owner: OwnerWire,
}

impl From<RepoWire> for Repository {
    fn from(wire: RepoWire) -> Self {
        Repository {
            owner: wire.owner.login,
            name: wire.name,
            fork: wire.fork,
        }
    }
}

#[derive(Deserialize)]
struct CommitWire {
    commit: CommitDetailWire,
}

#[derive(Deserialize)]
struct CommitDetailWire {
    author: Option<SignatureWire>,
    #[serde(default)]
    message: String,
}

#[derive(Deserialize)]
struct SignatureWire {
    date: Option<DateTime<Utc>>,
}

impl CommitWire {
    /// Commits without an author date can't be placed on the timeline.
    fn into_record(self, repository: &str) -> Option<CommitRecord> {
        let timestamp = self.commit.author.and_then(|a| a.date)?;
        Some(CommitRecord {
            timestamp,
            repository: repository.to_string(),
            message: self.commit.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn finds_next_link_among_relations() {
        let header = r#"<https://api.github.com/user/1/repos?page=2>; rel="next", <https://api.github.com/user/1/repos?page=5>; rel="last""#;
        assert_eq!(
            next_page_link(header).as_deref(),
            Some("https://api.github.com/user/1/repos?page=2")
        );
    }

    #[test]
    fn last_page_has_no_next_link() {
        let header = r#"<https://api.github.com/user/1/repos?page=1>; rel="first", <https://api.github.com/user/1/repos?page=4>; rel="prev""#;
        assert_eq!(next_page_link(header), None);
    }

    #[test]
    fn api_message_prefers_json_message_field() {
        let body = r#"{"message":"Git Repository is empty.","documentation_url":"https://docs.github.com"}"#;
        assert_eq!(api_message(body), "Git Repository is empty.");
        assert_eq!(api_message("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn commit_payload_becomes_record_with_author_date() {
        let payload = r#"[
            {"sha":"a1","commit":{"author":{"name":"Octo","date":"2024-01-03T10:15:00Z"},"message":"fix parser"}},
            {"sha":"b2","commit":{"author":null,"message":"orphan"}}
        ]"#;
        let commits: Vec<CommitWire> = serde_json::from_str(payload).unwrap();
        let records: Vec<CommitRecord> = commits
            .into_iter()
            .filter_map(|c| c.into_record("metrics"))
            .collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].repository, "metrics");
        assert_eq!(records[0].message, "fix parser");
        assert_eq!(
            records[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 3, 10, 15, 0).unwrap()
        );
    }

    #[test]
    fn repository_payload_keeps_fork_flag_and_owner() {
        let payload = r#"[
            {"name":"own","fork":false,"owner":{"login":"octocat"}},
            {"name":"borrowed","fork":true,"owner":{"login":"octocat"}}
        ]"#;
        let repos: Vec<Repository> = serde_json::from_str::<Vec<RepoWire>>(payload)
            .unwrap()
            .into_iter()
            .map(Repository::from)
            .collect();

        assert_eq!(repos[0].owner, "octocat");
        assert!(!repos[0].fork);
        assert!(repos[1].fork);
    }

    #[test]
    fn client_rejects_token_that_is_not_a_header_value() {
        let result = GitHubClient::new("https://api.github.com/", Some("bad\ntoken"));
        assert!(matches!(result, Err(Error::InvalidToken)));
    }
}
