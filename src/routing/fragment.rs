//! Navigation fragments.
//!
//! # Responsibilities
//! - Canonicalize raw navigation input into `#/path` form
//! - Extract the path portion used for route comparison
//!
//! # Design Decisions
//! - Normalization is total: empty or absent input falls back to the root fragment
//! - Normalization is idempotent, so callers may normalize defensively
//! - No percent-decoding or case folding; paths compare byte-for-byte

use std::fmt;

use serde::Serialize;

/// The root fragment every empty input normalizes to.
pub const ROOT: &str = "#/";

/// A canonical navigation fragment of the form `"#/" + path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Fragment(String);

impl Fragment {
    /// The root fragment `#/`.
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Canonicalize raw input.
    ///
    /// Accepted shapes: `""` / `"#"` (root), `"about"`, `"#about"`, `"#/about"`
    /// and `"/about"`; all of the named forms become `#/about`.
    pub fn normalize(input: &str) -> Self {
        let raw = input.trim();
        if raw.is_empty() || raw == "#" {
            return Self::root();
        }
        if raw.starts_with(ROOT) {
            return Self(raw.to_string());
        }
        if let Some(rest) = raw.strip_prefix('#') {
            return Self(format!("{ROOT}{rest}"));
        }
        if raw.starts_with('/') {
            // "/about" gets the hash prefix, then goes through the rules again.
            return Self::normalize(&format!("#{raw}"));
        }
        Self(format!("{ROOT}{raw}"))
    }

    /// The full fragment, e.g. `#/about`.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fragment without its leading `#`, e.g. `/about`.
    pub fn path(&self) -> &str {
        &self.0[1..]
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }
}

impl Default for Fragment {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fragment {
    fn from(input: &str) -> Self {
        Self::normalize(input)
    }
}

/// Normalize possibly-absent input. Absent input is the root fragment.
pub fn normalize(input: Option<&str>) -> Fragment {
    input.map(Fragment::normalize).unwrap_or_default()
}

/// Normalize, then strip the leading `#`: `"about"` becomes `/about`.
pub fn path_from_fragment(input: Option<&str>) -> String {
    normalize(input).path().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_accepted_shapes() {
        assert_eq!(Fragment::normalize("about").as_str(), "#/about");
        assert_eq!(Fragment::normalize("#about").as_str(), "#/about");
        assert_eq!(Fragment::normalize("#/about").as_str(), "#/about");
        assert_eq!(Fragment::normalize("/about").as_str(), "#/about");
        assert_eq!(Fragment::normalize("users/42").as_str(), "#/users/42");
    }

    #[test]
    fn test_empty_input_is_root() {
        assert!(normalize(None).is_root());
        assert!(normalize(Some("")).is_root());
        assert!(normalize(Some("#")).is_root());
        assert!(normalize(Some("   ")).is_root());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for raw in ["", "#", "x", "#x", "#/x", "/x", "#//x", " a b "] {
            let once = Fragment::normalize(raw);
            let twice = Fragment::normalize(once.as_str());
            assert_eq!(once, twice, "input {raw:?}");
        }
    }

    #[test]
    fn test_path_from_fragment() {
        assert_eq!(path_from_fragment(Some("about")), "/about");
        assert_eq!(path_from_fragment(Some("#/a/b")), "/a/b");
        assert_eq!(path_from_fragment(None), "/");
    }
}
