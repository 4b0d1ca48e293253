//! Uninstall action - idempotent base removal.
//!
//! Three steps, each declared by the manifest and each a no-op when its
//! target is already gone: unload the background service, forget the
//! package receipt, delete the application path. Running the action twice
//! leaves the system in the same state as running it once.

use anyhow::{Context, Result};
use log::{debug, info};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::installer::{Outcome, PlatformInstaller};
use crate::manifest::Manifest;
use crate::runtime::Runtime;

/// A target that was already absent. Logged and reported, never fatal.
#[derive(Debug, PartialEq, Eq)]
pub enum UninstallWarning {
    ServiceNotLoaded(String),
    ReceiptAbsent(String),
    PathAbsent(PathBuf),
}

impl fmt::Display for UninstallWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UninstallWarning::ServiceNotLoaded(label) => {
                write!(f, "service {} was not loaded", label)
            }
            UninstallWarning::ReceiptAbsent(id) => {
                write!(f, "no receipt registered for {}", id)
            }
            UninstallWarning::PathAbsent(path) => {
                write!(f, "{} was already absent", path.display())
            }
        }
    }
}

/// What the uninstall actually had to do.
#[derive(Debug, Default)]
pub struct UninstallReport {
    pub warnings: Vec<UninstallWarning>,
}

impl UninstallReport {
    /// True when every declared target existed and was removed.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }
}

/// Uninstall action - executes the manifest's uninstall identifiers.
pub struct UninstallAction<'a, R: Runtime> {
    runtime: &'a R,
    installer: &'a dyn PlatformInstaller,
}

impl<'a, R: Runtime> UninstallAction<'a, R> {
    /// Create a new uninstall action.
    pub fn new(runtime: &'a R, installer: &'a dyn PlatformInstaller) -> Self {
        Self { runtime, installer }
    }

    /// Runs the base uninstall for a manifest.
    pub fn run(&self, manifest: &Manifest) -> Result<UninstallReport> {
        let mut report = UninstallReport::default();

        let Some(spec) = &manifest.uninstall else {
            debug!("Manifest {} declares no uninstall actions", manifest.name);
            return Ok(report);
        };

        if let Some(label) = &spec.launchctl {
            match self.installer.unload_service(label)? {
                Outcome::Done => info!("Unloaded service {}", label),
                Outcome::AlreadyAbsent => {
                    report
                        .warnings
                        .push(UninstallWarning::ServiceNotLoaded(label.clone()));
                }
            }
        }

        if let Some(id) = &spec.pkgutil {
            match self.installer.forget_receipt(id)? {
                Outcome::Done => info!("Forgot receipt {}", id),
                Outcome::AlreadyAbsent => {
                    report
                        .warnings
                        .push(UninstallWarning::ReceiptAbsent(id.clone()));
                }
            }
        }

        if let Some(delete) = &spec.delete {
            let path = Path::new(delete);
            match self.remove_path(path)? {
                Outcome::Done => info!("Deleted {}", path.display()),
                Outcome::AlreadyAbsent => {
                    report
                        .warnings
                        .push(UninstallWarning::PathAbsent(path.to_path_buf()));
                }
            }
        }

        Ok(report)
    }

    /// Removes a file, directory tree, or symlink; absent is a no-op.
    fn remove_path(&self, path: &Path) -> Result<Outcome> {
        // A symlink to a directory is still removed with remove_file.
        if self.runtime.is_symlink(path) {
            self.runtime
                .remove_file(path)
                .with_context(|| format!("Failed to unlink {}", path.display()))?;
            return Ok(Outcome::Done);
        }
        if !self.runtime.exists(path) {
            debug!("{} not found, skipping removal", path.display());
            return Ok(Outcome::AlreadyAbsent);
        }
        if self.runtime.is_dir(path) {
            self.runtime
                .remove_dir_all(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        } else {
            self.runtime
                .remove_file(path)
                .with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(Outcome::Done)
    }
}
