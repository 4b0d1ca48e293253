//! Release feed abstraction for livecheck queries.
//!
//! A feed answers "what releases exist upstream" for a repository slug.
//! Only the GitHub API is implemented; the trait keeps the livecheck
//! action testable and leaves room for other hosts.

mod github;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use github::GitHubFeed;

/// Repository slug (owner/repo), also parseable from a repository page URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoSlug {
    pub owner: String,
    pub repo: String,
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

impl FromStr for RepoSlug {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s
            .strip_prefix("https://github.com/")
            .or_else(|| s.strip_prefix("http://github.com/"))
            .unwrap_or(s)
            .trim_end_matches('/');
        let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);

        let parts: Vec<&str> = trimmed.split('/').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            anyhow::bail!(
                "Invalid repository reference '{}'. Expected 'owner/repo' or a GitHub URL.",
                s
            )
        } else {
            Ok(RepoSlug {
                owner: parts[0].to_string(),
                repo: parts[1].to_string(),
            })
        }
    }
}

/// A release visible in the upstream feed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FeedRelease {
    /// Version tag (e.g., "v1.0.0")
    pub tag: String,
    /// Release name/title
    pub name: Option<String>,
    /// Whether this is a pre-release
    pub prerelease: bool,
}

/// Trait for upstream release feeds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReleaseFeed: Send + Sync {
    /// Get the API base URL.
    fn api_url(&self) -> &str;

    /// Fetch the feed's designated latest release.
    async fn latest_release(&self, repo: &RepoSlug) -> Result<FeedRelease>;

    /// Fetch all releases for a repository.
    async fn releases(&self, repo: &RepoSlug) -> Result<Vec<FeedRelease>>;
}
