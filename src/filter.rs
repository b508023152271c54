//! Glob-based exclusion of listed files.

use crate::error::{Error, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Drops listed paths matching any exclude pattern.
///
/// Patterns are matched against the root-relative path and each of its
/// ancestor directories, so `target` or `**/node_modules` exclude whole
/// subtrees.
#[derive(Debug, Clone)]
pub(crate) struct PathFilter {
    excludes: GlobSet,
    active: bool,
}

impl PathFilter {
    /// Compiles the exclude patterns.
    pub(crate) fn new(patterns: &[String]) -> Result<Self> {
        Ok(Self {
            excludes: Self::build_globset(patterns)?,
            active: !patterns.is_empty(),
        })
    }

    fn build_globset(patterns: &[String]) -> Result<GlobSet> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|e| Error::invalid_pattern(pattern, e.to_string()))?;
            builder.add(glob);
        }

        builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
    }

    /// Returns true if `relative` survives every exclude pattern.
    pub(crate) fn should_include(&self, relative: &str) -> bool {
        if !self.active {
            return true;
        }
        // ancestors() yields the path itself first, then each parent
        !Path::new(relative)
            .ancestors()
            .filter(|p| !p.as_os_str().is_empty())
            .any(|p| self.excludes.is_match(p))
    }
}
