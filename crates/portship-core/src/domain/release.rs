//! Release identity: tags, derived versions, and content hashes.

use serde::{Deserialize, Serialize};

/// A git release tag, e.g. `v1.2.3`.
///
/// Resolved once per run from the most recent tagged commit; guaranteed
/// non-empty by the resolver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseTag(String);

impl ReleaseTag {
    /// Wrap a resolved tag name.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The tag exactly as git reports it.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Semantic version derived from the tag: one leading `v` stripped,
    /// everything else unchanged.
    pub fn version(&self) -> &str {
        self.0.strip_prefix('v').unwrap_or(&self.0)
    }
}

impl std::fmt::Display for ReleaseTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// SHA512 of the release's source archive, as vcpkg verifies it.
///
/// The literal `"0"` placeholder is what the trial build installs with;
/// the mismatch failure it provokes is where the real hash comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHash(String);

impl ContentHash {
    /// The hash the trial build deliberately mismatches with.
    pub const PLACEHOLDER: &'static str = "0";

    /// Wrap a hex hash scraped from install diagnostics.
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// The trial-build placeholder value.
    pub fn placeholder() -> Self {
        Self(Self::PLACEHOLDER.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the trial-build placeholder rather than a real
    /// hash.
    pub fn is_placeholder(&self) -> bool {
        self.0 == Self::PLACEHOLDER
    }
}

impl std::fmt::Display for ContentHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_strips_leading_v() {
        let tag = ReleaseTag::new("v1.1.0");
        assert_eq!(tag.as_str(), "v1.1.0");
        assert_eq!(tag.version(), "1.1.0");
    }

    #[test]
    fn test_version_without_leading_v_unchanged() {
        let tag = ReleaseTag::new("2.0.0");
        assert_eq!(tag.version(), "2.0.0");
    }

    #[test]
    fn test_version_strips_only_one_v() {
        let tag = ReleaseTag::new("vv3.0.0");
        assert_eq!(tag.version(), "v3.0.0");
    }

    #[test]
    fn test_placeholder_hash() {
        let hash = ContentHash::placeholder();
        assert!(hash.is_placeholder());
        assert_eq!(hash.as_str(), "0");
    }

    #[test]
    fn test_real_hash_is_not_placeholder() {
        let hash = ContentHash::new("9f8e7d6c5b4a");
        assert!(!hash.is_placeholder());
        assert_eq!(hash.to_string(), "9f8e7d6c5b4a");
    }

    #[test]
    fn test_release_tag_serde_roundtrip() {
        let tag = ReleaseTag::new("v1.2.3");
        let json = serde_json::to_string(&tag).expect("serialize");
        let deserialized: ReleaseTag = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(tag, deserialized);
    }
}
