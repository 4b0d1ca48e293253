//! Package manifest loading and validation.
//!
//! A manifest is an immutable, declarative description of how to fetch,
//! install, and remove one prebuilt application: version and checksum
//! metadata, a templated download locator, installer/uninstall identifiers,
//! zap paths, and a livecheck policy. It is parsed once per release; a
//! version bump produces a new manifest, never an in-place edit.

pub mod checksum;
pub mod template;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::runtime::Runtime;
use template::TemplateError;

/// Declarative package lifecycle descriptor.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Manifest {
    /// Package token (e.g. "cassh"). Identity is name + version.
    pub name: String,
    /// Semantic version of the release this manifest describes.
    pub version: String,
    /// Hex-encoded SHA-256 of the installer artifact.
    pub sha256: String,
    /// Download URL template; must reference `{version}`.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<DependsOn>,
    /// Installer artifact file name, optionally templated.
    pub pkg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uninstall: Option<UninstallSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zap: Option<ZapSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub livecheck: Option<LivecheckSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caveats: Option<String>,
}

/// Platform constraints the target system must satisfy before install.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DependsOn {
    /// Minimum macOS requirement, e.g. ">= 12" or ">= monterey".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub macos: Option<String>,
}

/// Identifiers consumed by the base uninstall. All steps are idempotent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UninstallSpec {
    /// Background service label to unload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launchctl: Option<String>,
    /// Package receipt id to forget from the platform registry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pkgutil: Option<String>,
    /// Absolute application path to delete.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<String>,
}

/// Paths purged on explicit user request, beyond the base uninstall.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ZapSpec {
    /// Literal or glob paths, `~/`-relative allowed, in purge order.
    #[serde(default)]
    pub trash: Vec<String>,
}

/// Upstream release feed query used to detect newer versions.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LivecheckSpec {
    /// Repository page or `owner/repo` slug of the upstream source.
    pub url: String,
    #[serde(default)]
    pub strategy: LivecheckStrategy,
}

/// How the upstream feed is interpreted.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LivecheckStrategy {
    /// Ask the hosting API for its designated latest release.
    #[default]
    GithubLatest,
    /// List all releases and pick the highest version.
    GithubReleases,
}

impl Manifest {
    /// Loads and validates a manifest from a JSON file.
    pub fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let raw = runtime
            .read_to_string(path)
            .with_context(|| format!("Failed to read manifest at {}", path.display()))?;
        let manifest: Manifest = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse manifest at {}", path.display()))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Checks the declared metadata for shape errors.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_token(&self.name) {
            anyhow::bail!(
                "Invalid package name '{}'. Expected letters, digits, '.', '_' or '-'.",
                self.name
            );
        }
        template::validate_version(&self.version)
            .with_context(|| format!("Manifest '{}' declares a bad version", self.name))?;
        if !checksum::is_digest_shaped(&self.sha256) {
            anyhow::bail!(
                "Invalid sha256 for '{}': expected 64 hex characters",
                self.name
            );
        }
        if !self.url.contains(template::VERSION_PLACEHOLDER) {
            anyhow::bail!(
                "Download URL for '{}' does not reference '{}'",
                self.name,
                template::VERSION_PLACEHOLDER
            );
        }
        if self.pkg.trim().is_empty() {
            anyhow::bail!("Manifest '{}' names no installer artifact", self.name);
        }
        if let Some(uninstall) = &self.uninstall {
            if let Some(delete) = &uninstall.delete {
                if !Path::new(delete).is_absolute() {
                    anyhow::bail!("Uninstall delete path '{}' must be absolute", delete);
                }
            }
        }
        if let Some(zap) = &self.zap {
            if zap.trash.iter().any(|p| p.trim().is_empty()) {
                anyhow::bail!("Zap path list for '{}' contains an empty entry", self.name);
            }
        }
        Ok(())
    }

    /// Produces the fully-qualified artifact URL for the declared version.
    pub fn resolve_download(&self) -> Result<String, TemplateError> {
        template::expand(&self.url, &self.version)
    }

    /// Produces the installer artifact file name for the declared version.
    pub fn pkg_file_name(&self) -> Result<String, TemplateError> {
        template::substitute(&self.pkg, &self.version)
    }

    /// "name version" label used in logs and reports.
    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.version)
    }
}

/// Package tokens and registry identifiers: letters, digits, '.', '_', '-'.
pub fn is_valid_token(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}
