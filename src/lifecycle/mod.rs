//! Lifecycle actions over a package manifest.
//!
//! One action per operation: install, uninstall, zap, livecheck. Actions
//! are stateless; everything they know comes from the manifest and the
//! injected runtime/installer/feed.

mod install;
mod livecheck;
mod uninstall;
mod zap;

pub use install::InstallAction;
pub use livecheck::{LivecheckAction, LivecheckResult};
pub use uninstall::{UninstallAction, UninstallReport, UninstallWarning};
pub use zap::{ZapAction, ZapFailure, ZapReport};
