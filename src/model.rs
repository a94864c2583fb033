// src/model.rs

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Accumulated source bytes per language name
pub type LanguageTally = BTreeMap<String, u64>;

/// Share of all observed source bytes per language, in percent (0-100)
pub type LanguageShares = BTreeMap<String, f64>;

/// The account whose activity is being summarized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub login: String,
    pub name: Option<String>,
}

impl Account {
    /// Display name, falling back to the login.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.login)
    }
}

/// A repository as listed for the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    pub fork: bool,
}

/// A single commit authored by the account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub timestamp: DateTime<Utc>,
    pub repository: String,
    pub message: String,
}

/// The hand-off from collection to rendering and summary generation
#[derive(Debug, Clone)]
pub struct UserDataset {
    pub account: Account,
    /// Sorted ascending by timestamp; duplicates kept
    pub commits: Vec<CommitRecord>,
    pub languages: LanguageShares,
}
