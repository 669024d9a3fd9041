//! Directory skip rules
//!
//! Rules are evaluated against a directory's path relative to the source
//! root, with `/` separators. A rule without glob metacharacters names one
//! directory by its relative path, so `node_modules` prunes the top level
//! `node_modules` but not `lib/node_modules`. Rules containing `*`, `?`, `[`
//! or `{` are globs: `**/node_modules` prunes every one of them.

use globset::{GlobBuilder, GlobMatcher};
use rome_types::{Error, Result};
use std::ffi::OsStr;
use std::path::{Component, Path, PathBuf};

const GLOB_METACHARACTERS: [char; 4] = ['*', '?', '[', '{'];

#[derive(Debug, Clone)]
enum SkipRule {
    /// Relative path split into components
    Prefix(Vec<String>),
    Glob(GlobMatcher),
}

impl SkipRule {
    fn compile(pattern: &str) -> Result<Self> {
        let trimmed = pattern.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(Error::InvalidSkipRule {
                pattern: pattern.to_string(),
                message: "rule is empty".to_string(),
            });
        }

        if trimmed.contains(GLOB_METACHARACTERS) {
            let glob = GlobBuilder::new(trimmed)
                .literal_separator(true)
                .backslash_escape(true)
                .build()
                .map_err(|e| Error::InvalidSkipRule {
                    pattern: pattern.to_string(),
                    message: e.to_string(),
                })?;
            return Ok(Self::Glob(glob.compile_matcher()));
        }

        let components = trimmed
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .map(str::to_string)
            .collect();
        Ok(Self::Prefix(components))
    }

    fn matches(&self, components: &[&OsStr], relative: &Path) -> bool {
        match self {
            Self::Prefix(rule) => {
                rule.len() == components.len()
                    && rule.iter().zip(components).all(|(a, b)| OsStr::new(a) == *b)
            }
            Self::Glob(matcher) => matcher.is_match(relative),
        }
    }
}

/// Compiled set of directory skip rules
#[derive(Debug, Clone, Default)]
pub struct SkipRules {
    rules: Vec<SkipRule>,
    patterns: Vec<String>,
}

impl SkipRules {
    /// Compile a list of rules; any invalid rule fails the whole set
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let mut rules = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            rules.push(SkipRule::compile(pattern.as_ref())?);
        }

        Ok(Self {
            rules,
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
        })
    }

    /// Rule set that skips nothing
    pub fn none() -> Self {
        Self::default()
    }

    /// Source patterns, as given
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Whether no rules are configured
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether the directory at `relative` (to the source root) is pruned
    ///
    /// The root itself (an empty relative path) is never skipped.
    pub fn is_skipped(&self, relative: &Path) -> bool {
        if self.rules.is_empty() {
            return false;
        }

        let components: Vec<&OsStr> = relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part),
                _ => None,
            })
            .collect();
        if components.is_empty() {
            return false;
        }

        // components are compared as raw OS strings, never lossily
        let normalized: PathBuf = components.iter().collect();
        self.rules
            .iter()
            .any(|rule| rule.matches(&components, &normalized))
    }
}
