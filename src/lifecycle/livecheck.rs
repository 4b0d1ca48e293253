//! Livecheck action - reports the newest upstream version.
//!
//! Read-only by construction: the action holds a feed and nothing else,
//! so it cannot touch installed state.

use anyhow::{Context, Result};
use log::debug;
use semver::Version;

use crate::feed::{FeedRelease, ReleaseFeed, RepoSlug};
use crate::manifest::{LivecheckStrategy, Manifest};

/// Result of a livecheck query, ready for display.
#[derive(Debug)]
pub struct LivecheckResult {
    /// Package token the check was run for.
    pub package: String,
    /// Version the manifest declares.
    pub declared: String,
    /// Newest version visible upstream, if any.
    pub latest: Option<String>,
    /// Whether the upstream version is newer than the declared one.
    pub newer_available: bool,
}

/// Livecheck action - resolves the manifest's livecheck policy.
pub struct LivecheckAction<'a> {
    feed: &'a dyn ReleaseFeed,
}

impl<'a> LivecheckAction<'a> {
    /// Create a new livecheck action.
    pub fn new(feed: &'a dyn ReleaseFeed) -> Self {
        Self { feed }
    }

    /// Queries the upstream feed per the manifest's strategy.
    pub async fn run(&self, manifest: &Manifest) -> Result<LivecheckResult> {
        let policy = manifest
            .livecheck
            .as_ref()
            .with_context(|| format!("Manifest {} declares no livecheck policy", manifest.name))?;
        let slug: RepoSlug = policy.url.parse()?;

        let latest = match policy.strategy {
            LivecheckStrategy::GithubLatest => {
                let release = self.feed.latest_release(&slug).await?;
                debug!("Feed reports latest release {}", release.tag);
                Some(release.tag)
            }
            LivecheckStrategy::GithubReleases => {
                let releases = self.feed.releases(&slug).await?;
                debug!("Feed lists {} releases", releases.len());
                newest_stable_tag(&releases)
            }
        };

        let newer_available = latest
            .as_deref()
            .map(|tag| is_newer(tag, &manifest.version))
            .unwrap_or(false);

        Ok(LivecheckResult {
            package: manifest.name.clone(),
            declared: manifest.version.clone(),
            latest: latest.map(|tag| normalize(&tag).to_string()),
            newer_available,
        })
    }
}

/// Strips the conventional 'v' tag prefix.
fn normalize(tag: &str) -> &str {
    tag.strip_prefix('v').unwrap_or(tag)
}

fn parse_version(tag: &str) -> Option<Version> {
    Version::parse(normalize(tag)).ok()
}

/// Picks the highest stable version out of a release list. Prereleases
/// and unparseable tags are skipped.
fn newest_stable_tag(releases: &[FeedRelease]) -> Option<String> {
    releases
        .iter()
        .filter(|r| !r.prerelease)
        .filter_map(|r| parse_version(&r.tag).map(|v| (v, r.tag.clone())))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, tag)| tag)
}

/// Compares by semantic version, falling back to tag inequality when
/// either side does not parse.
fn is_newer(candidate: &str, declared: &str) -> bool {
    match (parse_version(candidate), parse_version(declared)) {
        (Some(c), Some(d)) => c > d,
        _ => normalize(candidate) != normalize(declared),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::MockReleaseFeed;
    use crate::manifest::LivecheckSpec;
    use crate::test_utils::sample_manifest;

    fn release(tag: &str, prerelease: bool) -> FeedRelease {
        FeedRelease {
            tag: tag.to_string(),
            name: None,
            prerelease,
        }
    }

    fn manifest_with_strategy(strategy: LivecheckStrategy) -> Manifest {
        let mut manifest = sample_manifest();
        manifest.livecheck = Some(LivecheckSpec {
            url: "https://github.com/shawntz/cassh".into(),
            strategy,
        });
        manifest
    }

    #[tokio::test]
    async fn test_livecheck_latest_strategy() {
        let mut feed = MockReleaseFeed::new();
        feed.expect_latest_release()
            .returning(|_| Ok(release("v0.2.0", false)));

        let manifest = manifest_with_strategy(LivecheckStrategy::GithubLatest);
        let result = LivecheckAction::new(&feed).run(&manifest).await.unwrap();

        assert_eq!(result.latest.as_deref(), Some("0.2.0"));
        assert!(result.newer_available);
        assert_eq!(result.declared, "0.1.0");
    }

    #[tokio::test]
    async fn test_livecheck_releases_strategy_picks_highest() {
        let mut feed = MockReleaseFeed::new();
        feed.expect_releases().returning(|_| {
            Ok(vec![
                release("v0.1.0", false),
                release("v0.2.0", false),
                release("v0.3.0-rc.1", true),
            ])
        });

        let manifest = manifest_with_strategy(LivecheckStrategy::GithubReleases);
        let result = LivecheckAction::new(&feed).run(&manifest).await.unwrap();

        // v0.3.0-rc.1 is a prerelease and must not win
        assert_eq!(result.latest.as_deref(), Some("0.2.0"));
        assert!(result.newer_available);
    }

    #[tokio::test]
    async fn test_livecheck_up_to_date() {
        let mut feed = MockReleaseFeed::new();
        feed.expect_latest_release()
            .returning(|_| Ok(release("v0.1.0", false)));

        let manifest = manifest_with_strategy(LivecheckStrategy::GithubLatest);
        let result = LivecheckAction::new(&feed).run(&manifest).await.unwrap();

        assert_eq!(result.latest.as_deref(), Some("0.1.0"));
        assert!(!result.newer_available);
    }

    #[tokio::test]
    async fn test_livecheck_empty_feed() {
        let mut feed = MockReleaseFeed::new();
        feed.expect_releases().returning(|_| Ok(Vec::new()));

        let manifest = manifest_with_strategy(LivecheckStrategy::GithubReleases);
        let result = LivecheckAction::new(&feed).run(&manifest).await.unwrap();

        assert_eq!(result.latest, None);
        assert!(!result.newer_available);
    }

    #[tokio::test]
    async fn test_livecheck_without_policy_fails() {
        let feed = MockReleaseFeed::new();
        let mut manifest = sample_manifest();
        manifest.livecheck = None;

        assert!(LivecheckAction::new(&feed).run(&manifest).await.is_err());
    }

    #[test]
    fn test_newest_stable_tag_orders_by_version_not_position() {
        let releases = vec![
            release("v0.2.0", false),
            release("v0.10.0", false),
            release("v0.9.0", false),
        ];
        assert_eq!(newest_stable_tag(&releases).as_deref(), Some("v0.10.0"));
    }

    #[test]
    fn test_newest_stable_tag_skips_unparseable() {
        let releases = vec![release("nightly", false), release("v1.0.0", false)];
        assert_eq!(newest_stable_tag(&releases).as_deref(), Some("v1.0.0"));
    }

    #[test]
    fn test_is_newer() {
        assert!(is_newer("v0.2.0", "0.1.0"));
        assert!(!is_newer("v0.1.0", "0.1.0"));
        assert!(!is_newer("0.0.9", "0.1.0"));
        // Unparseable candidate falls back to inequality
        assert!(is_newer("nightly", "0.1.0"));
    }
}
