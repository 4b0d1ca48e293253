//! Zap action - full purge of user state beyond the base uninstall.
//!
//! The configured paths are expanded to a concrete list first (tilde,
//! then glob), so the deletion report is precise: every removal and every
//! failure names a real path. One inaccessible path never aborts the
//! rest of the purge.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Component, Path, PathBuf};

use crate::manifest::Manifest;
use crate::runtime::Runtime;

/// One path the purge could not remove.
#[derive(Debug)]
pub struct ZapFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of a purge: what was deleted and what resisted.
#[derive(Debug, Default)]
pub struct ZapReport {
    pub removed: Vec<PathBuf>,
    pub failures: Vec<ZapFailure>,
}

impl ZapReport {
    /// True when nothing failed (an empty purge is clean).
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Zap action - purges the manifest's zap path set.
pub struct ZapAction<'a, R: Runtime> {
    runtime: &'a R,
}

impl<'a, R: Runtime> ZapAction<'a, R> {
    /// Create a new zap action.
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// Expands the configured path set to the concrete paths present on
    /// disk. Zero matches for a pattern is not an error. Patterns outside
    /// the allowed purge roots are dropped with a warning and show up as
    /// failures in [`run`](Self::run).
    pub fn expand_targets(&self, manifest: &Manifest) -> Result<Vec<PathBuf>> {
        let Some(zap) = &manifest.zap else {
            return Ok(Vec::new());
        };

        let home = self
            .runtime
            .home_dir()
            .context("Could not determine home directory")?;

        let mut targets = Vec::new();
        for raw in &zap.trash {
            let pattern = expand_tilde(raw, &home);
            if !is_safe_target(&pattern, &home) {
                continue;
            }
            let matches = self
                .runtime
                .glob(&pattern.to_string_lossy())
                .with_context(|| format!("Failed to expand '{}'", raw))?;
            if matches.is_empty() {
                debug!("Zap pattern '{}' matched nothing, skipping", raw);
            }
            for path in matches {
                if !targets.contains(&path) {
                    targets.push(path);
                }
            }
        }
        Ok(targets)
    }

    /// Purges the expanded path set, collecting per-path failures instead
    /// of aborting early.
    pub fn run(&self, manifest: &Manifest) -> Result<ZapReport> {
        let mut report = ZapReport::default();

        let Some(zap) = &manifest.zap else {
            return Ok(report);
        };

        let home = self
            .runtime
            .home_dir()
            .context("Could not determine home directory")?;

        // Unsafe patterns are reported, not silently dropped.
        for raw in &zap.trash {
            let pattern = expand_tilde(raw, &home);
            if !is_safe_target(&pattern, &home) {
                warn!("Skipping unsafe zap path {}", pattern.display());
                report.failures.push(ZapFailure {
                    path: pattern,
                    reason: "outside the allowed purge roots".to_string(),
                });
            }
        }

        for path in self.expand_targets(manifest)? {
            match self.remove_target(&path) {
                Ok(()) => {
                    debug!("Zapped {}", path.display());
                    report.removed.push(path);
                }
                Err(e) => {
                    warn!("Failed to zap {}: {:#}", path.display(), e);
                    report.failures.push(ZapFailure {
                        path,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        Ok(report)
    }

    fn remove_target(&self, path: &Path) -> Result<()> {
        // A symlink to a directory is still removed with remove_file.
        if !self.runtime.is_symlink(path) && self.runtime.is_dir(path) {
            self.runtime.remove_dir_all(path)
        } else {
            self.runtime.remove_file(path)
        }
    }
}

/// Expands a leading `~/` against the user's home directory.
fn expand_tilde(path_str: &str, home: &Path) -> PathBuf {
    if let Some(stripped) = path_str.strip_prefix("~/") {
        home.join(stripped)
    } else {
        PathBuf::from(path_str)
    }
}

/// Purge targets must be absolute, free of `..`, and strictly inside the
/// user's home, /Applications, or /Library.
fn is_safe_target(path: &Path, home: &Path) -> bool {
    if !path.is_absolute() {
        return false;
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return false;
    }
    let allowed_roots = [
        home.to_path_buf(),
        PathBuf::from("/Applications"),
        PathBuf::from("/Library"),
    ];
    allowed_roots
        .iter()
        .any(|root| path.starts_with(root) && path != root.as_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ZapSpec;
    use crate::runtime::MockRuntime;
    use crate::test_utils::{sample_manifest, test_home};
    use mockall::predicate::eq;

    fn zap_manifest(paths: &[&str]) -> Manifest {
        let mut manifest = sample_manifest();
        manifest.zap = Some(ZapSpec {
            trash: paths.iter().map(|s| s.to_string()).collect(),
        });
        manifest
    }

    fn home_runtime() -> MockRuntime {
        let mut runtime = MockRuntime::new();
        runtime.expect_home_dir().returning(|| Some(test_home()));
        runtime
    }

    #[test]
    fn test_expand_tilde() {
        let home = test_home();
        assert_eq!(
            expand_tilde("~/Library/Preferences/a.plist", &home),
            home.join("Library/Preferences/a.plist")
        );
        assert_eq!(
            expand_tilde("/Library/LaunchAgents/a.plist", &home),
            PathBuf::from("/Library/LaunchAgents/a.plist")
        );
    }

    #[test]
    fn test_is_safe_target() {
        let home = test_home();
        assert!(is_safe_target(&home.join(".ssh/cassh_ed25519"), &home));
        assert!(is_safe_target(
            &PathBuf::from("/Applications/cassh.app"),
            &home
        ));
        assert!(is_safe_target(
            &PathBuf::from("/Library/LaunchAgents/a.plist"),
            &home
        ));

        // The roots themselves and anything outside them are off limits
        assert!(!is_safe_target(&home, &home));
        assert!(!is_safe_target(&PathBuf::from("/Applications"), &home));
        assert!(!is_safe_target(&PathBuf::from("/usr/bin/ls"), &home));
        assert!(!is_safe_target(&PathBuf::from("relative/path"), &home));
        assert!(!is_safe_target(&home.join("Library/../../etc"), &home));
    }

    #[test]
    fn test_zap_zero_matches_is_clean_and_empty() {
        let mut runtime = home_runtime();
        runtime.expect_glob().returning(|_| Ok(Vec::new()));

        let manifest = zap_manifest(&["~/Library/Application Support/cassh", "~/.ssh/cassh_*"]);
        let action = ZapAction::new(&runtime);
        let report = action.run(&manifest).unwrap();

        assert!(report.is_clean());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_zap_removes_expanded_matches() {
        let home = test_home();
        let key = home.join(".ssh/cassh_ed25519");
        let key_pub = home.join(".ssh/cassh_ed25519.pub");

        let mut runtime = home_runtime();
        let expanded = home.join(".ssh/cassh_*");
        let matches = vec![key.clone(), key_pub.clone()];
        runtime
            .expect_glob()
            .with(eq(expanded.to_string_lossy().into_owned()))
            .returning(move |_| Ok(matches.clone()));
        runtime.expect_is_symlink().returning(|_| false);
        runtime.expect_is_dir().returning(|_| false);
        runtime.expect_remove_file().times(2).returning(|_| Ok(()));

        let manifest = zap_manifest(&["~/.ssh/cassh_*"]);
        let action = ZapAction::new(&runtime);
        let report = action.run(&manifest).unwrap();

        assert!(report.is_clean());
        assert_eq!(report.removed, vec![key, key_pub]);
    }

    #[test]
    fn test_zap_partial_failure_continues() {
        let home = test_home();
        let support = home.join("Library/Application Support/cassh");
        let plist = home.join("Library/Preferences/com.shawnschwartz.cassh.plist");

        let mut runtime = home_runtime();
        let support_clone = support.clone();
        let plist_clone = plist.clone();
        runtime.expect_glob().returning(move |pattern| {
            if pattern.contains("Application Support") {
                Ok(vec![support_clone.clone()])
            } else {
                Ok(vec![plist_clone.clone()])
            }
        });
        runtime.expect_is_symlink().returning(|_| false);
        let support_for_isdir = support.clone();
        runtime
            .expect_is_dir()
            .returning(move |p| p == support_for_isdir);
        runtime
            .expect_remove_dir_all()
            .returning(|_| Err(anyhow::anyhow!("operation not permitted")));
        runtime.expect_remove_file().times(1).returning(|_| Ok(()));

        let manifest = zap_manifest(&[
            "~/Library/Application Support/cassh",
            "~/Library/Preferences/com.shawnschwartz.cassh.plist",
        ]);
        let action = ZapAction::new(&runtime);
        let report = action.run(&manifest).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, support);
        assert!(report.failures[0].reason.contains("not permitted"));
        assert_eq!(report.removed, vec![plist]);
    }

    #[test]
    fn test_zap_reports_unsafe_pattern() {
        let mut runtime = home_runtime();
        runtime.expect_glob().returning(|_| Ok(Vec::new()));

        let manifest = zap_manifest(&["/etc/passwd", "~/.ssh/cassh_*"]);
        let action = ZapAction::new(&runtime);
        let report = action.run(&manifest).unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, PathBuf::from("/etc/passwd"));
        assert!(report.failures[0].reason.contains("purge roots"));
    }

    #[test]
    fn test_zap_without_spec_is_empty() {
        let runtime = MockRuntime::new();
        let mut manifest = sample_manifest();
        manifest.zap = None;

        let action = ZapAction::new(&runtime);
        let report = action.run(&manifest).unwrap();
        assert!(report.is_clean());
        assert!(report.removed.is_empty());
    }

    #[test]
    fn test_expand_targets_deduplicates() {
        let home = test_home();
        let plist = home.join("Library/Preferences/com.shawnschwartz.cassh.plist");

        let mut runtime = home_runtime();
        let plist_clone = plist.clone();
        runtime
            .expect_glob()
            .times(2)
            .returning(move |_| Ok(vec![plist_clone.clone()]));

        // Two patterns resolving to the same file yield one target.
        let manifest = zap_manifest(&[
            "~/Library/Preferences/com.shawnschwartz.cassh.plist",
            "~/Library/Preferences/com.shawnschwartz.*",
        ]);
        let action = ZapAction::new(&runtime);
        let targets = action.expand_targets(&manifest).unwrap();
        assert_eq!(targets, vec![plist]);
    }
}
