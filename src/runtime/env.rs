//! Environment and system information operations.

use anyhow::Result;
use std::env;
use std::path::PathBuf;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) fn env_var_impl(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn home_dir_impl(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn temp_dir_impl(&self) -> PathBuf {
        env::temp_dir()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn os_version_impl(&self) -> Result<String> {
        #[cfg(target_os = "macos")]
        {
            let output = std::process::Command::new("sw_vers")
                .arg("-productVersion")
                .output()
                .map_err(|e| anyhow::anyhow!("Failed to run sw_vers: {}", e))?;
            if !output.status.success() {
                anyhow::bail!("sw_vers exited with status {}", output.status);
            }
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        }

        #[cfg(not(target_os = "macos"))]
        {
            anyhow::bail!("OS version probe is only available on macOS")
        }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_privileged_impl(&self) -> bool {
        #[cfg(unix)]
        return nix::unistd::geteuid().as_raw() == 0;

        #[cfg(not(unix))]
        return false;
    }
}
