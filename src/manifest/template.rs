//! Version substitution for templated manifest fields.
//!
//! Download URLs and installer artifact names carry a `{version}`
//! placeholder that is expanded against the manifest's declared version.

use semver::Version;

/// Placeholder expanded in templated manifest fields.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Errors raised while expanding a version template.
#[derive(Debug)]
pub enum TemplateError {
    /// The manifest declared no version.
    MissingVersion,
    /// The declared version is not a valid semantic version.
    InvalidVersion { version: String, reason: String },
    /// The template contains no `{version}` placeholder to substitute.
    MissingPlaceholder { template: String },
}

impl std::fmt::Display for TemplateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateError::MissingVersion => {
                write!(f, "Manifest declares no version to substitute")
            }
            TemplateError::InvalidVersion { version, reason } => {
                write!(f, "Invalid semantic version '{}': {}", version, reason)
            }
            TemplateError::MissingPlaceholder { template } => {
                write!(
                    f,
                    "Template '{}' contains no '{}' placeholder",
                    template, VERSION_PLACEHOLDER
                )
            }
        }
    }
}

impl std::error::Error for TemplateError {}

/// Validates that a version string is a well-formed semantic version.
pub fn validate_version(version: &str) -> Result<(), TemplateError> {
    if version.is_empty() {
        return Err(TemplateError::MissingVersion);
    }
    Version::parse(version).map_err(|e| TemplateError::InvalidVersion {
        version: version.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

/// Substitutes the version into every placeholder occurrence.
///
/// The template is not required to contain a placeholder; a literal
/// string passes through unchanged. The version is always validated.
pub fn substitute(template: &str, version: &str) -> Result<String, TemplateError> {
    validate_version(version)?;
    Ok(template.replace(VERSION_PLACEHOLDER, version))
}

/// Expands a template that must reference the version at least once.
///
/// Used for download URLs, where a placeholder-less template would
/// silently fetch the same artifact for every release.
pub fn expand(template: &str, version: &str) -> Result<String, TemplateError> {
    if !template.contains(VERSION_PLACEHOLDER) {
        return Err(TemplateError::MissingPlaceholder {
            template: template.to_string(),
        });
    }
    substitute(template, version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_single_placeholder() {
        let url = expand("https://example.com/download/v{version}/tool.pkg", "1.2.3").unwrap();
        assert_eq!(url, "https://example.com/download/v1.2.3/tool.pkg");
    }

    #[test]
    fn test_expand_every_occurrence() {
        let url = expand(
            "https://example.com/releases/download/v{version}/tool-{version}.pkg",
            "0.1.0",
        )
        .unwrap();
        assert_eq!(
            url,
            "https://example.com/releases/download/v0.1.0/tool-0.1.0.pkg"
        );
        assert!(!url.contains(VERSION_PLACEHOLDER));
    }

    #[test]
    fn test_expand_missing_placeholder() {
        let err = expand("https://example.com/tool.pkg", "1.0.0").unwrap_err();
        assert!(matches!(err, TemplateError::MissingPlaceholder { .. }));
    }

    #[test]
    fn test_expand_empty_version() {
        let err = expand("https://example.com/v{version}/tool.pkg", "").unwrap_err();
        assert!(matches!(err, TemplateError::MissingVersion));
    }

    #[test]
    fn test_expand_malformed_version() {
        for bad in ["not-a-version", "1", "1.2", "v1.2.3", "1.2.3.4"] {
            let err = expand("https://example.com/v{version}/tool.pkg", bad).unwrap_err();
            assert!(
                matches!(err, TemplateError::InvalidVersion { .. }),
                "expected InvalidVersion for '{}'",
                bad
            );
        }
    }

    #[test]
    fn test_substitute_literal_passthrough() {
        let name = substitute("tool.pkg", "1.0.0").unwrap();
        assert_eq!(name, "tool.pkg");
    }

    #[test]
    fn test_substitute_validates_version() {
        assert!(substitute("tool.pkg", "bogus").is_err());
    }

    #[test]
    fn test_prerelease_versions_are_valid() {
        let url = expand("https://example.com/v{version}/t.pkg", "1.0.0-rc.1").unwrap();
        assert!(url.contains("1.0.0-rc.1"));
    }
}
