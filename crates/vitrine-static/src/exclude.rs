//! Names that never reach the output directory.

use std::collections::BTreeSet;

/// Entries left out of every build: tooling, manifests, VCS and CI metadata,
/// documentation.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "public",
    "node_modules",
    ".git",
    ".gitignore",
    "package.json",
    "package-lock.json",
    "build.js",
    "deploy.yml",
    "README.md",
    "site.toml",
    "target",
    "Cargo.toml",
    "Cargo.lock",
];

/// Top-level entry names excluded from the output, matched exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    names: BTreeSet<String>,
}

impl ExclusionSet {
    /// Add a name to the set.
    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    /// Whether `name` must be skipped.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        DEFAULT_EXCLUDES.iter().copied().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for ExclusionSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.names.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_set_covers_tooling() {
        let set = ExclusionSet::default();

        for name in ["build.js", "package.json", ".git", "node_modules", "README.md"] {
            assert!(set.contains(name), "{} should be excluded", name);
        }
        assert!(!set.contains("index.html"));
    }

    #[test]
    fn matches_names_exactly() {
        let set = ExclusionSet::default();

        assert!(!set.contains("readme.md"));
        assert!(!set.contains("build.js.bak"));
    }

    #[test]
    fn extends_with_extra_names() {
        let mut set = ExclusionSet::default();
        set.extend(["drafts"]);

        assert!(set.contains("drafts"));
        assert!(set.contains("build.js"));
    }
}
