//! Native installer integration.
//!
//! The engine never registers services or writes receipts itself; that
//! state is owned by the OS installer the artifact delegates to. This
//! module abstracts those invocations behind a trait so the lifecycle
//! actions stay unit-testable without touching a real installer.

mod macos;

use anyhow::Result;
use std::path::Path;

pub use macos::MacOsInstaller;

/// What an idempotent removal step actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The target existed and was acted on.
    Done,
    /// The target was already absent; a no-op, not an error.
    AlreadyAbsent,
}

/// The native installer reported failure; its output is preserved verbatim.
#[derive(Debug)]
pub struct InstallerError {
    pub command: String,
    pub detail: String,
}

impl std::fmt::Display for InstallerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.command, self.detail)
    }
}

impl std::error::Error for InstallerError {}

/// Operations delegated to the host operating system's installer facility.
#[cfg_attr(test, mockall::automock)]
pub trait PlatformInstaller: Send + Sync {
    /// Runs the native package installer on a verified artifact.
    fn install(&self, pkg: &Path) -> Result<()>;

    /// Forgets a package receipt. A receipt that never existed is
    /// [`Outcome::AlreadyAbsent`].
    fn forget_receipt(&self, id: &str) -> Result<Outcome>;

    /// Stops and unloads a background service by label. A service that is
    /// not loaded is [`Outcome::AlreadyAbsent`].
    fn unload_service(&self, label: &str) -> Result<Outcome>;
}
