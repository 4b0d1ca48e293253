//! Install action - download, verify, delegate to the native installer.
//!
//! The action owns none of the installed state: service registration and
//! receipts are written by the installer payload itself. What the action
//! guarantees is ordering - no unverified artifact ever reaches the
//! native installer.

use anyhow::{Context, Result};
use log::{debug, info};
use std::path::Path;

use crate::download;
use crate::http::HttpClient;
use crate::installer::PlatformInstaller;
use crate::manifest::{Manifest, checksum};
use crate::platform;
use crate::runtime::Runtime;

/// Install action - fetches and installs the artifact a manifest describes.
pub struct InstallAction<'a, R: Runtime> {
    runtime: &'a R,
    installer: &'a dyn PlatformInstaller,
    http_client: &'a HttpClient,
}

impl<'a, R: Runtime> InstallAction<'a, R> {
    /// Create a new install action.
    pub fn new(
        runtime: &'a R,
        installer: &'a dyn PlatformInstaller,
        http_client: &'a HttpClient,
    ) -> Self {
        Self {
            runtime,
            installer,
            http_client,
        }
    }

    /// Runs the full install flow for a manifest.
    pub async fn run(&self, manifest: &Manifest) -> Result<()> {
        if let Some(constraint) = manifest.depends_on.as_ref().and_then(|d| d.macos.as_ref()) {
            platform::require_macos(self.runtime, constraint)?;
        }

        let url = manifest.resolve_download()?;
        let pkg_name = manifest.pkg_file_name()?;

        let scratch = self
            .runtime
            .temp_dir()
            .join(format!("caskr-{}-{}", manifest.name, manifest.version));
        self.runtime.create_dir_all(&scratch)?;
        let pkg_path = scratch.join(&pkg_name);

        let result = self.fetch_verify_install(manifest, &url, &pkg_path).await;

        if let Err(e) = self.runtime.remove_dir_all(&scratch) {
            debug!("Could not clean scratch dir {}: {}", scratch.display(), e);
        }

        result
    }

    async fn fetch_verify_install(
        &self,
        manifest: &Manifest,
        url: &str,
        pkg_path: &Path,
    ) -> Result<()> {
        download::download_file(self.runtime, url, pkg_path, self.http_client).await?;

        info!("Verifying {}...", file_label(pkg_path));
        let reader = self.runtime.open(pkg_path)?;
        checksum::verify_reader(reader, &manifest.sha256).with_context(|| {
            format!(
                "Refusing to install unverified artifact for {}",
                manifest.display_name()
            )
        })?;

        info!("Installing {}...", manifest.display_name());
        self.installer.install(pkg_path)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
