//! macOS platform constraint handling.
//!
//! Manifests may declare a minimum macOS, either numerically (">= 12")
//! or by release name (">= monterey"). The constraint is checked against
//! the runtime's OS version probe before any download starts.

use anyhow::{Context, Result};
use std::fmt;
use std::str::FromStr;

use crate::runtime::Runtime;

/// Minimum macOS version requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacOsRequirement {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for MacOsRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.minor == 0 {
            write!(f, "{}", self.major)
        } else {
            write!(f, "{}.{}", self.major, self.minor)
        }
    }
}

/// Maps a macOS release name to its major version.
fn named_release(name: &str) -> Option<u32> {
    match name {
        "big_sur" => Some(11),
        "monterey" => Some(12),
        "ventura" => Some(13),
        "sonoma" => Some(14),
        "sequoia" => Some(15),
        _ => None,
    }
}

impl FromStr for MacOsRequirement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ">=" is the only comparator a minimum constraint needs.
        let spec = s.trim().trim_start_matches(">=").trim().trim_start_matches(':');

        if let Some(major) = named_release(spec) {
            return Ok(MacOsRequirement { major, minor: 0 });
        }

        let mut parts = spec.split('.');
        let major = parts
            .next()
            .unwrap_or_default()
            .parse::<u32>()
            .with_context(|| format!("Invalid macOS requirement '{}'", s))?;
        let minor = match parts.next() {
            Some(m) => m
                .parse::<u32>()
                .with_context(|| format!("Invalid macOS requirement '{}'", s))?,
            None => 0,
        };
        Ok(MacOsRequirement { major, minor })
    }
}

impl MacOsRequirement {
    /// Checks an OS product version string (e.g. "14.5") against this minimum.
    pub fn satisfied_by(&self, os_version: &str) -> Result<bool> {
        let mut parts = os_version.trim().split('.');
        let major = parts
            .next()
            .unwrap_or_default()
            .parse::<u32>()
            .with_context(|| format!("Unparseable OS version '{}'", os_version))?;
        let minor = parts.next().and_then(|m| m.parse::<u32>().ok()).unwrap_or(0);

        Ok((major, minor) >= (self.major, self.minor))
    }
}

/// Aborts with an error unless the running system satisfies the constraint.
pub fn require_macos<R: Runtime>(runtime: &R, constraint: &str) -> Result<()> {
    let requirement: MacOsRequirement = constraint.parse()?;
    let os_version = runtime
        .os_version()
        .context("Could not determine the running macOS version")?;

    if requirement.satisfied_by(&os_version)? {
        Ok(())
    } else {
        anyhow::bail!(
            "macOS {} or newer is required (running {})",
            requirement,
            os_version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;

    #[test]
    fn test_parse_numeric() {
        let req: MacOsRequirement = ">= 12".parse().unwrap();
        assert_eq!(req, MacOsRequirement { major: 12, minor: 0 });

        let req: MacOsRequirement = ">= 12.3".parse().unwrap();
        assert_eq!(req, MacOsRequirement { major: 12, minor: 3 });

        let req: MacOsRequirement = "13".parse().unwrap();
        assert_eq!(req.major, 13);
    }

    #[test]
    fn test_parse_named_release() {
        let req: MacOsRequirement = ">= monterey".parse().unwrap();
        assert_eq!(req.major, 12);

        let req: MacOsRequirement = ">= :monterey".parse().unwrap();
        assert_eq!(req.major, 12);

        let req: MacOsRequirement = "sequoia".parse().unwrap();
        assert_eq!(req.major, 15);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!(">= nonsense".parse::<MacOsRequirement>().is_err());
        assert!("".parse::<MacOsRequirement>().is_err());
    }

    #[test]
    fn test_satisfied_by() {
        let req: MacOsRequirement = ">= 12".parse().unwrap();
        assert!(req.satisfied_by("12.0").unwrap());
        assert!(req.satisfied_by("14.5").unwrap());
        assert!(!req.satisfied_by("11.7").unwrap());

        let req: MacOsRequirement = ">= 12.3".parse().unwrap();
        assert!(!req.satisfied_by("12.2").unwrap());
        assert!(req.satisfied_by("12.3").unwrap());
    }

    #[test]
    fn test_satisfied_by_rejects_garbage() {
        let req: MacOsRequirement = ">= 12".parse().unwrap();
        assert!(req.satisfied_by("unknown").is_err());
    }

    #[test]
    fn test_require_macos_pass_and_fail() {
        let mut runtime = MockRuntime::new();
        runtime
            .expect_os_version()
            .returning(|| Ok("14.5".to_string()));
        assert!(require_macos(&runtime, ">= monterey").is_ok());

        let mut runtime = MockRuntime::new();
        runtime
            .expect_os_version()
            .returning(|| Ok("11.7".to_string()));
        let err = require_macos(&runtime, ">= monterey").unwrap_err();
        assert!(err.to_string().contains("12"));
    }
}
