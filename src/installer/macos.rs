//! macOS installer, receipt, and launchd invocations.

use anyhow::Result;
use log::{debug, warn};
use std::path::Path;
use std::process::Command;

use crate::manifest::is_valid_token;

use super::{InstallerError, Outcome};

/// Shells out to `installer`, `pkgutil`, and `launchctl`.
pub struct MacOsInstaller {
    /// Prefix privileged commands with sudo when not already root.
    use_sudo: bool,
}

impl MacOsInstaller {
    pub fn new(use_sudo: bool) -> Self {
        Self { use_sudo }
    }

    fn privileged(&self, program: &str) -> Command {
        if self.use_sudo {
            let mut cmd = Command::new("sudo");
            cmd.arg(program);
            cmd
        } else {
            Command::new(program)
        }
    }
}

impl super::PlatformInstaller for MacOsInstaller {
    #[tracing::instrument(skip(self))]
    fn install(&self, pkg: &Path) -> Result<()> {
        debug!("Running native installer for {}", pkg.display());
        let output = self
            .privileged("/usr/sbin/installer")
            .arg("-pkg")
            .arg(pkg)
            .arg("-target")
            .arg("/")
            .output()
            .map_err(|e| InstallerError {
                command: "installer".to_string(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            debug!("Native installer finished for {}", pkg.display());
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() {
                format!("exited with status {}", output.status)
            } else {
                stderr
            };
            Err(InstallerError {
                command: "installer".to_string(),
                detail,
            }
            .into())
        }
    }

    #[tracing::instrument(skip(self))]
    fn forget_receipt(&self, id: &str) -> Result<Outcome> {
        if !is_valid_token(id) {
            anyhow::bail!("Invalid pkgutil id '{}'", id);
        }
        debug!("Forgetting package receipt: {}", id);
        let output = self
            .privileged("pkgutil")
            .arg("--forget")
            .arg(id)
            .output()
            .map_err(|e| InstallerError {
                command: "pkgutil".to_string(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            debug!("Forgot package receipt {}", id);
            return Ok(Outcome::Done);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("No receipt for") || stderr.trim().is_empty() {
            debug!("Package receipt {} already forgotten or never existed", id);
            Ok(Outcome::AlreadyAbsent)
        } else {
            Err(InstallerError {
                command: "pkgutil --forget".to_string(),
                detail: stderr.trim().to_string(),
            }
            .into())
        }
    }

    #[tracing::instrument(skip(self))]
    fn unload_service(&self, label: &str) -> Result<Outcome> {
        if !is_valid_token(label) {
            anyhow::bail!("Invalid launchd label '{}'", label);
        }
        debug!("Unloading launchd service (if loaded): {}", label);
        let output = Command::new("launchctl")
            .arg("unload")
            .arg("-w")
            .arg(label)
            .output()
            .map_err(|e| InstallerError {
                command: "launchctl".to_string(),
                detail: e.to_string(),
            })?;

        if output.status.success() {
            debug!("Unloaded launchd service {}", label);
            return Ok(Outcome::Done);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains("Could not find specified service")
            || stderr.contains("service is not loaded")
            || stderr.trim().is_empty()
        {
            debug!("Launchd service {} already unloaded or not found", label);
            Ok(Outcome::AlreadyAbsent)
        } else {
            warn!("launchctl unload {} failed: {}", label, stderr.trim());
            Err(InstallerError {
                command: "launchctl unload".to_string(),
                detail: stderr.trim().to_string(),
            }
            .into())
        }
    }
}
