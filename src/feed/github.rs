//! GitHub release feed implementation.

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
#[cfg(test)]
use reqwest::Client;

use crate::http::HttpClient;

use super::{FeedRelease, ReleaseFeed, RepoSlug};

/// GitHub API response types (internal).
mod api {
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    pub struct Release {
        pub tag_name: String,
        pub name: Option<String>,
        pub prerelease: bool,
    }
}

/// Release feed backed by the GitHub REST API.
pub struct GitHubFeed {
    http_client: HttpClient,
    api_url: String,
}

impl GitHubFeed {
    /// Create a new GitHub feed with default API URL.
    /// Used primarily for testing.
    #[cfg(test)]
    pub fn new(client: Client) -> Self {
        Self::with_api_url(client, "https://api.github.com")
    }

    /// Create a new GitHub feed with custom API URL.
    /// Used primarily for testing.
    #[cfg(test)]
    pub fn with_api_url(client: Client, api_url: &str) -> Self {
        Self {
            http_client: HttpClient::new(client),
            api_url: api_url.to_string(),
        }
    }

    /// Create from an existing HttpClient.
    pub fn from_http_client(http_client: HttpClient, api_url: &str) -> Self {
        Self {
            http_client,
            api_url: api_url.to_string(),
        }
    }

    async fn fetch_latest(&self, repo: &RepoSlug) -> Result<api::Release> {
        let url = format!(
            "{}/repos/{}/{}/releases/latest",
            self.api_url, repo.owner, repo.repo
        );
        debug!("Fetching latest release from {}...", url);
        self.http_client.get_json(&url).await
    }

    async fn fetch_releases(&self, repo: &RepoSlug) -> Result<Vec<api::Release>> {
        let mut releases = Vec::new();
        let mut page = 1;

        // Limit to 10 pages (1000 releases) to prevent infinite loop
        while page <= 10 {
            let url = format!(
                "{}/repos/{}/{}/releases",
                self.api_url, repo.owner, repo.repo
            );
            debug!("Fetching releases page {} from {}...", page, url);

            let parsed: Vec<api::Release> = self
                .http_client
                .get_json_with_query(&url, &[("per_page", "100"), ("page", &page.to_string())])
                .await?;

            if parsed.is_empty() {
                break;
            }

            releases.extend(parsed);
            page += 1;
        }

        Ok(releases)
    }
}

#[async_trait]
impl ReleaseFeed for GitHubFeed {
    fn api_url(&self) -> &str {
        &self.api_url
    }

    async fn latest_release(&self, repo: &RepoSlug) -> Result<FeedRelease> {
        Ok(self.fetch_latest(repo).await?.into())
    }

    async fn releases(&self, repo: &RepoSlug) -> Result<Vec<FeedRelease>> {
        let releases = self.fetch_releases(repo).await?;
        Ok(releases.into_iter().map(|r| r.into()).collect())
    }
}

impl From<api::Release> for FeedRelease {
    fn from(r: api::Release) -> Self {
        FeedRelease {
            tag: r.tag_name,
            name: r.name,
            prerelease: r.prerelease,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_github_feed_api_url() {
        let feed = GitHubFeed::new(Client::new());
        assert_eq!(feed.api_url(), "https://api.github.com");

        let custom = GitHubFeed::with_api_url(Client::new(), "https://custom.api");
        assert_eq!(custom.api_url(), "https://custom.api");
    }

    #[test]
    fn test_release_conversion() {
        let api_release = api::Release {
            tag_name: "v1.0.0".into(),
            name: Some("Release 1.0".into()),
            prerelease: false,
        };

        let release: FeedRelease = api_release.into();
        assert_eq!(release.tag, "v1.0.0");
        assert_eq!(release.name, Some("Release 1.0".into()));
        assert!(!release.prerelease);
    }

    #[test_log::test(tokio::test)]
    async fn test_latest_release_queries_endpoint() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/repos/shawntz/cassh/releases/latest")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"tag_name": "v0.2.0", "name": "0.2.0", "prerelease": false}"#)
            .create_async()
            .await;

        let feed = GitHubFeed::with_api_url(Client::new(), &server.url());
        let slug: RepoSlug = "shawntz/cassh".parse().unwrap();
        let release = feed.latest_release(&slug).await.unwrap();

        mock.assert_async().await;
        assert_eq!(release.tag, "v0.2.0");
    }

    #[test_log::test(tokio::test)]
    async fn test_releases_paginates_until_empty() {
        let mut server = mockito::Server::new_async().await;

        let page1 = server
            .mock("GET", "/repos/owner/repo/releases?per_page=100&page=1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[{"tag_name": "v0.2.0", "name": null, "prerelease": false},
                    {"tag_name": "v0.1.0", "name": null, "prerelease": false}]"#,
            )
            .create_async()
            .await;
        let page2 = server
            .mock("GET", "/repos/owner/repo/releases?per_page=100&page=2")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let feed = GitHubFeed::with_api_url(Client::new(), &server.url());
        let slug: RepoSlug = "owner/repo".parse().unwrap();
        let releases = feed.releases(&slug).await.unwrap();

        page1.assert_async().await;
        page2.assert_async().await;
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag, "v0.2.0");
    }
}
