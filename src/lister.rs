//! File discovery: which files belong to the repository snapshot.
//!
//! [`GitLister`] asks `git` for tracked and untracked-but-not-ignored
//! files. [`WalkLister`] walks a directory honoring `.gitignore` rules and
//! is used when the caller overrides discovery outside a repository.

use crate::error::{Error, Result};
use ignore::{WalkBuilder, gitignore::Gitignore};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    process::{Command, Output},
};
use tracing::{debug, trace, warn};

/// Enumerates the files that make up a repository.
pub trait RepositoryLister {
    /// Finds the repository root containing `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if `dir` is not inside a repository.
    fn repo_root(&self, dir: &Path) -> Result<PathBuf>;

    /// Lists files relative to `root`, `/`-separated, tracked and
    /// untracked-but-not-ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Discovery`] if the listing cannot be obtained.
    fn list_tracked_paths(&self, root: &Path) -> Result<Vec<String>>;

    /// Returns true if `path` is inside the repository and not ignored.
    fn is_repo_path(&self, path: &Path) -> bool;
}

/// [`RepositoryLister`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitLister {
    program: PathBuf,
}

impl Default for GitLister {
    fn default() -> Self {
        Self {
            program: PathBuf::from("git"),
        }
    }
}

impl GitLister {
    /// Creates a lister invoking `git` from `PATH`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a specific `git` executable.
    #[must_use]
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn git(&self, dir: &Path, args: &[&str]) -> Result<Output> {
        trace!("Running git {} in {}", args.join(" "), dir.display());
        Command::new(&self.program)
            .current_dir(dir)
            .args(args)
            .output()
            .map_err(|e| Error::discovery(format!("failed to run {}: {e}", self.program.display())))
    }

    fn checked(output: Output, what: &str) -> Result<Vec<u8>> {
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim();
        Err(Error::discovery(if message.is_empty() {
            format!("{what} exited with {}", output.status)
        } else {
            format!("{what}: {message}")
        }))
    }
}

impl RepositoryLister for GitLister {
    fn repo_root(&self, dir: &Path) -> Result<PathBuf> {
        let stdout = Self::checked(
            self.git(dir, &["rev-parse", "--show-toplevel"])?,
            "git rev-parse",
        )?;
        let root = String::from_utf8_lossy(&stdout).trim_end_matches(['\r', '\n']).to_string();
        if root.is_empty() {
            return Err(Error::discovery(format!(
                "no repository work tree for {}",
                dir.display()
            )));
        }
        debug!("Repository root: {}", root);
        Ok(PathBuf::from(root))
    }

    fn list_tracked_paths(&self, root: &Path) -> Result<Vec<String>> {
        let stdout = Self::checked(
            self.git(root, &["ls-files", "--cached", "--others", "--exclude-standard", "-z"])?,
            "git ls-files",
        )?;
        let paths = parse_ls_files(&stdout);
        debug!("git reported {} files", paths.len());
        Ok(paths)
    }

    fn is_repo_path(&self, path: &Path) -> bool {
        let Some(dir) = path.parent() else {
            return false;
        };
        let Some(target) = path.to_str() else {
            return false;
        };
        // check-ignore exits 0 when ignored, 1 when not, 128 outside a repository
        self.git(dir, &["check-ignore", "-q", target])
            .is_ok_and(|output| output.status.code() == Some(1))
    }
}

/// Splits NUL-terminated `git ls-files -z` output.
///
/// Unmerged index entries appear once per stage; repeats are dropped while
/// keeping first-seen order. Non-UTF-8 paths are skipped with a warning.
fn parse_ls_files(stdout: &[u8]) -> Vec<String> {
    let mut seen = HashSet::new();
    stdout
        .split(|&b| b == 0)
        .filter(|raw| !raw.is_empty())
        .filter_map(|raw| match std::str::from_utf8(raw) {
            Ok(path) => Some(path.to_string()),
            Err(_) => {
                warn!("Skipping non UTF-8 path: {}", String::from_utf8_lossy(raw));
                None
            }
        })
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

/// [`RepositoryLister`] that walks a fixed root directory.
///
/// Honors `.gitignore`, `.ignore` and `.git/info/exclude` files below the
/// root without requiring a repository, includes hidden files and never
/// descends into `.git`.
#[derive(Debug)]
pub struct WalkLister {
    root: PathBuf,
    root_ignore: Gitignore,
}

impl WalkLister {
    /// Creates a lister rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let (root_ignore, error) = Gitignore::new(root.join(".gitignore"));
        if let Some(e) = error {
            if root.join(".gitignore").exists() {
                warn!("Failed to parse {}: {}", root.join(".gitignore").display(), e);
            }
        }
        Self { root, root_ignore }
    }
}

impl RepositoryLister for WalkLister {
    fn repo_root(&self, _dir: &Path) -> Result<PathBuf> {
        if self.root.is_dir() {
            Ok(self.root.clone())
        } else {
            Err(Error::discovery(format!(
                "walk root is not a directory: {}",
                self.root.display()
            )))
        }
    }

    fn list_tracked_paths(&self, root: &Path) -> Result<Vec<String>> {
        if !root.is_dir() {
            return Err(Error::discovery(format!(
                "walk root is not a directory: {}",
                root.display()
            )));
        }

        let walker = WalkBuilder::new(root)
            .hidden(false)
            .parents(false)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(|entry| entry.file_name() != ".git")
            .build();

        let mut paths = Vec::new();
        for result in walker {
            let entry = match result {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            match slash_path(relative) {
                Some(path) => paths.push(path),
                None => warn!("Skipping non UTF-8 path: {}", relative.display()),
            }
        }

        debug!("Walk found {} files under {}", paths.len(), root.display());
        Ok(paths)
    }

    fn is_repo_path(&self, path: &Path) -> bool {
        path.starts_with(&self.root)
            && !self
                .root_ignore
                .matched_path_or_any_parents(path, path.is_dir())
                .is_ignore()
    }
}

fn slash_path(relative: &Path) -> Option<String> {
    let segments = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn git_available() -> bool {
        Command::new("git")
            .arg("--version")
            .output()
            .is_ok_and(|o| o.status.success())
    }

    #[test]
    fn test_parse_ls_files() {
        let paths = parse_ls_files(b"src/main.rs\0README.md\0dir with space/a b.txt\0");
        assert_eq!(paths, ["src/main.rs", "README.md", "dir with space/a b.txt"]);
    }

    #[test]
    fn test_parse_ls_files_dedups_and_skips_invalid() {
        let paths = parse_ls_files(b"b.txt\0a.txt\0b.txt\0bad\xff\0\0");
        assert_eq!(paths, ["b.txt", "a.txt"]);
    }

    #[test]
    fn test_parse_ls_files_empty() {
        assert!(parse_ls_files(b"").is_empty());
    }

    #[test]
    fn test_git_lister_outside_repository() {
        let temp = assert_fs::TempDir::new().unwrap();
        let err = GitLister::new().repo_root(temp.path()).unwrap_err();
        assert!(err.is_discovery());
    }

    #[test]
    fn test_git_lister_missing_program() {
        let temp = assert_fs::TempDir::new().unwrap();
        let lister = GitLister::with_program(temp.path().join("no-such-git"));
        let err = lister.list_tracked_paths(temp.path()).unwrap_err();
        assert!(err.is_discovery());
    }

    #[test]
    fn test_git_lister_lists_untracked_not_ignored() {
        if !git_available() {
            return;
        }
        let temp = assert_fs::TempDir::new().unwrap();
        let status = Command::new("git")
            .args(["init", "-q"])
            .current_dir(temp.path())
            .status()
            .unwrap();
        assert!(status.success());

        temp.child(".gitignore").write_str("*.log\n").unwrap();
        temp.child("a.txt").write_str("a").unwrap();
        temp.child("sub/b.txt").write_str("b").unwrap();
        temp.child("debug.log").write_str("noise").unwrap();

        let lister = GitLister::new();
        let root = lister.repo_root(&temp.path().join("sub")).unwrap();
        let mut paths = lister.list_tracked_paths(&root).unwrap();
        paths.sort();

        assert_eq!(paths, [".gitignore", "a.txt", "sub/b.txt"]);
        assert!(lister.is_repo_path(&root.join("a.txt")));
        assert!(!lister.is_repo_path(&root.join("debug.log")));
    }

    #[test]
    fn test_walk_lister_respects_gitignore() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".gitignore").write_str("target/\n*.log\n").unwrap();
        temp.child(".git/HEAD").write_str("ref: refs/heads/main\n").unwrap();
        temp.child("src/main.rs").write_str("fn main() {}").unwrap();
        temp.child("src/debug.log").write_str("noise").unwrap();
        temp.child("target/out.bin").write_binary(&[0, 1]).unwrap();
        temp.child("b.txt").write_str("b").unwrap();
        temp.child(".env.example").write_str("KEY=").unwrap();

        let lister = WalkLister::new(temp.path());
        let root = lister.repo_root(temp.path()).unwrap();
        let paths = lister.list_tracked_paths(&root).unwrap();

        assert_eq!(paths, [".env.example", ".gitignore", "b.txt", "src/main.rs"]);
    }

    #[test]
    fn test_walk_lister_is_repo_path() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".gitignore").write_str("*.log\nbuild/\n").unwrap();

        let lister = WalkLister::new(temp.path());
        assert!(lister.is_repo_path(&temp.path().join("notes.txt")));
        assert!(!lister.is_repo_path(&temp.path().join("run.log")));
        assert!(!lister.is_repo_path(&temp.path().join("build/x.o")));
        assert!(!lister.is_repo_path(Path::new("/definitely/elsewhere.txt")));
    }

    #[test]
    fn test_walk_lister_missing_root() {
        let temp = assert_fs::TempDir::new().unwrap();
        let lister = WalkLister::new(temp.path().join("missing"));
        assert!(lister.repo_root(temp.path()).unwrap_err().is_discovery());
    }
}
