//! Re-anchors repository-relative paths onto the working directory.

use crate::error::{Error, Result};
use std::{
    collections::HashMap,
    path::{Component, Path, PathBuf},
};
use tracing::{trace, warn};

/// A tracked file located relative to both the repository and the working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Absolute path to the file
    pub absolute_path: PathBuf,

    /// Path relative to the repository root, as reported by the lister
    pub root_relative: String,

    /// Path relative to the working directory, `/`-separated, possibly starting with `../`
    pub working_relative: String,
}

impl ResolvedFile {
    /// Returns true if the file lies outside the working directory's subtree.
    #[must_use]
    pub fn escapes_working_dir(&self) -> bool {
        self.working_relative == ".." || self.working_relative.starts_with("../")
    }
}

/// Maps root-relative paths to working-directory-relative ones.
///
/// The mapping is purely lexical: neither directory has to contain the
/// other, and nothing is looked up on disk.
#[derive(Debug, Clone)]
pub struct PathResolver {
    repo_root: PathBuf,
    working_dir: PathBuf,
}

impl PathResolver {
    /// Creates a resolver for the given repository root and working directory.
    ///
    /// Both paths must be absolute.
    #[must_use]
    pub fn new(repo_root: impl AsRef<Path>, working_dir: impl AsRef<Path>) -> Self {
        let (repo_root, working_dir) = (repo_root.as_ref(), working_dir.as_ref());
        debug_assert!(repo_root.is_absolute(), "repository root must be absolute");
        debug_assert!(working_dir.is_absolute(), "working directory must be absolute");

        Self {
            repo_root: normalize(repo_root),
            working_dir: normalize(working_dir),
        }
    }

    /// Resolves a single tracked path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedPath`] if `tracked` is empty, absolute,
    /// or contains an empty, `.` or `..` segment.
    pub fn resolve(&self, tracked: &str) -> Result<ResolvedFile> {
        check_tracked_path(tracked)?;

        let absolute_path = normalize(&self.repo_root.join(tracked));
        let working_relative = relative_label(&absolute_path, &self.working_dir)
            .ok_or_else(|| Error::unsupported_path(tracked, "cannot be expressed relative to the working directory"))?;

        trace!("Resolved {} -> {}", tracked, working_relative);

        Ok(ResolvedFile {
            absolute_path,
            root_relative: tracked.to_string(),
            working_relative,
        })
    }

    /// Resolves every tracked path, preserving input order.
    ///
    /// Paths that differ only by case are kept as distinct entries; a
    /// warning is logged because they collide on case-insensitive
    /// filesystems.
    ///
    /// # Errors
    ///
    /// Fails on the first unsupported path.
    pub fn resolve_all<I, S>(&self, tracked: I) -> Result<Vec<ResolvedFile>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut resolved = Vec::new();

        for path in tracked {
            let path = path.as_ref();
            if let Some(previous) = seen.insert(path.to_lowercase(), path.to_string()) {
                if previous != path {
                    warn!(
                        "Paths '{}' and '{}' differ only by case; they collide on case-insensitive filesystems",
                        previous, path
                    );
                }
            }
            resolved.push(self.resolve(path)?);
        }

        Ok(resolved)
    }

    /// The normalized repository root.
    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    /// The normalized working directory.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }
}

/// Lexically normalizes a path: drops `.` and folds `..` into the preceding segment.
///
/// `..` at the filesystem root is discarded, as the OS does.
#[must_use]
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Expresses `target` relative to `base` as a `/`-separated label.
///
/// Both paths are expected to be normalized. Returns `None` only when no
/// relative form exists (a relative `target` against an absolute `base`).
fn relative_label(target: &Path, base: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(target, base)?;
    let segments: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    Some(segments.join("/"))
}

fn check_tracked_path(tracked: &str) -> Result<()> {
    if tracked.is_empty() {
        return Err(Error::unsupported_path(tracked, "empty path"));
    }
    if tracked.starts_with('/') || Path::new(tracked).is_absolute() {
        return Err(Error::unsupported_path(tracked, "path is absolute"));
    }
    for segment in tracked.split('/') {
        match segment {
            "" => return Err(Error::unsupported_path(tracked, "empty path segment")),
            "." | ".." => {
                return Err(Error::unsupported_path(
                    tracked,
                    format!("'{segment}' segments are not supported"),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(tracked: &str, root: &str, cwd: &str) -> String {
        PathResolver::new(root, cwd)
            .resolve(tracked)
            .unwrap()
            .working_relative
    }

    #[test]
    fn test_working_dir_is_root() {
        assert_eq!(resolve("src/main.rs", "/repo", "/repo"), "src/main.rs");
        assert_eq!(resolve("a.txt", "/repo", "/repo"), "a.txt");
    }

    #[test]
    fn test_working_dir_is_descendant() {
        assert_eq!(resolve("sub/b.txt", "/repo", "/repo/sub"), "b.txt");
        assert_eq!(resolve("a.txt", "/repo", "/repo/sub"), "../a.txt");
    }

    #[test]
    fn test_working_dir_deeper_than_file() {
        assert_eq!(resolve("a.txt", "/repo", "/repo/x/y/z"), "../../../a.txt");
        assert_eq!(resolve("x/other/c.rs", "/repo", "/repo/x/y/z"), "../../other/c.rs");
    }

    #[test]
    fn test_working_dir_outside_repository() {
        assert_eq!(resolve("a.txt", "/home/u/repo", "/home/u/other"), "../repo/a.txt");
        assert_eq!(resolve("d/a.txt", "/srv/repo", "/tmp"), "../srv/repo/d/a.txt");
        assert_eq!(resolve("a.txt", "/repo", "/"), "repo/a.txt");
    }

    #[test]
    fn test_working_dir_above_root() {
        assert_eq!(resolve("src/lib.rs", "/home/u/repo", "/home/u"), "repo/src/lib.rs");
    }

    #[test]
    fn test_unnormalized_inputs() {
        assert_eq!(resolve("a.txt", "/repo/./x/..", "/repo/sub/."), "../a.txt");
    }

    #[test]
    fn test_opaque_segments() {
        assert_eq!(
            resolve("my docs/file (1).txt", "/repo", "/repo/other"),
            "../my docs/file (1).txt"
        );
        assert_eq!(resolve("..hidden/x", "/repo", "/repo"), "..hidden/x");
    }

    #[test]
    fn test_escape_detection() {
        let resolver = PathResolver::new("/repo", "/repo/sub");
        assert!(resolver.resolve("a.txt").unwrap().escapes_working_dir());
        assert!(!resolver.resolve("sub/b.txt").unwrap().escapes_working_dir());
        assert!(
            !PathResolver::new("/repo", "/repo")
                .resolve("..hidden/x")
                .unwrap()
                .escapes_working_dir()
        );
    }

    #[test]
    fn test_resolution_law() {
        let roots = ["/repo", "/home/u/repo", "/a/b/c"];
        let cwds = ["/", "/repo", "/repo/sub/deep", "/home/u", "/home/u/repo/x", "/a/b/c/d", "/z"];
        let tracked = ["f.txt", "sub/deep/g.rs", "x/y/z/h", "with space/é.md"];

        for root in roots {
            for cwd in cwds {
                let resolver = PathResolver::new(root, cwd);
                for path in tracked {
                    let resolved = resolver.resolve(path).unwrap();
                    let rejoined = normalize(&Path::new(cwd).join(&resolved.working_relative));
                    assert_eq!(rejoined, normalize(&Path::new(root).join(path)));
                    assert_eq!(rejoined, resolved.absolute_path);
                }
            }
        }
    }

    #[test]
    fn test_unsupported_paths_rejected() {
        let resolver = PathResolver::new("/repo", "/repo");
        for bad in ["", "/etc/passwd", "a/../b", "./a", "a//b", "a/"] {
            let err = resolver.resolve(bad).unwrap_err();
            assert!(matches!(err, Error::UnsupportedPath { .. }), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_resolve_all_preserves_order() {
        let resolver = PathResolver::new("/repo", "/repo/sub");
        let resolved = resolver.resolve_all(["z.txt", "sub/b.txt", "a.txt"]).unwrap();
        let labels: Vec<_> = resolved.iter().map(|r| r.working_relative.as_str()).collect();
        assert_eq!(labels, ["../z.txt", "b.txt", "../a.txt"]);
    }

    #[test]
    fn test_resolve_all_keeps_case_collisions() {
        let resolver = PathResolver::new("/repo", "/repo");
        let resolved = resolver.resolve_all(["README", "readme"]).unwrap();
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize(Path::new("../a")), PathBuf::from("../a"));
    }
}
