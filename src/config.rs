use crate::classify::MIN_SNIFF_BYTES;
use crate::error::{Error, Result};
use crate::filter::PathFilter;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

/// Default name of the output document written into the working directory.
pub const DEFAULT_OUTPUT_FILE: &str = "repo_digest.txt";

/// How the set of repository files is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscoveryMode {
    /// Ask `git` for tracked and untracked-but-not-ignored files
    #[default]
    Git,
    /// Walk the directory tree honoring ignore files; works outside a repository
    Walk,
}

/// Configuration for one repo-digest run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Directory the document is produced for; the process current directory when unset
    pub working_dir: Option<PathBuf>,

    /// Repository root override; discovered from the working directory when unset
    pub repo_root: Option<PathBuf>,

    /// File discovery strategy
    pub discovery: DiscoveryMode,

    /// Output file name, created inside the working directory
    pub output_file: String,

    /// Glob patterns for root-relative paths to leave out
    pub exclude_patterns: Vec<String>,

    /// Bytes sniffed for NUL when classifying binary files
    pub sniff_bytes: usize,

    /// Dry run mode (document is built but not written)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use repo_digest::Config;
    ///
    /// let config = Config::builder()
    ///     .output_file("context.txt")
    ///     .exclude("*.lock")
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The working directory or repository root override is not a directory
    /// - The output file name is not a single plain file name
    /// - The sniff size is below the minimum
    /// - An exclude pattern is not a valid glob
    pub fn validate(&self) -> Result<()> {
        for (what, dir) in [
            ("Working directory", &self.working_dir),
            ("Repository root", &self.repo_root),
        ] {
            if let Some(dir) = dir {
                if !dir.is_dir() {
                    return Err(Error::config(format!(
                        "{what} is not a directory: {}",
                        dir.display()
                    )));
                }
            }
        }

        let mut components = Path::new(&self.output_file).components();
        if !matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        ) {
            return Err(Error::config(format!(
                "output file must be a plain file name, got '{}'",
                self.output_file
            )));
        }

        if self.sniff_bytes < MIN_SNIFF_BYTES {
            return Err(Error::config(format!(
                "sniff_bytes ({}) must be at least {MIN_SNIFF_BYTES}",
                self.sniff_bytes
            )));
        }

        PathFilter::new(&self.exclude_patterns)?;

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            working_dir: None,
            repo_root: None,
            discovery: DiscoveryMode::Git,
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
            exclude_patterns: Vec::new(),
            sniff_bytes: MIN_SNIFF_BYTES,
            dry_run: false,
        }
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    working_dir: Option<PathBuf>,
    repo_root: Option<PathBuf>,
    discovery: Option<DiscoveryMode>,
    output_file: Option<String>,
    exclude_patterns: Vec<String>,
    sniff_bytes: Option<usize>,
    dry_run: bool,
}

impl ConfigBuilder {
    /// Sets the working directory instead of the process current directory.
    #[must_use]
    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    /// Overrides the repository root.
    #[must_use]
    pub fn repo_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.repo_root = Some(path.into());
        self
    }

    /// Sets the discovery strategy.
    #[must_use]
    pub fn discovery(mut self, mode: DiscoveryMode) -> Self {
        self.discovery = Some(mode);
        self
    }

    /// Sets the output file name.
    #[must_use]
    pub fn output_file(mut self, name: impl Into<String>) -> Self {
        self.output_file = Some(name.into());
        self
    }

    /// Adds an exclude glob pattern.
    #[must_use]
    pub fn exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_patterns.push(pattern.into());
        self
    }

    /// Replaces all exclude glob patterns.
    #[must_use]
    pub fn exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Sets how many leading bytes are sniffed for binary detection.
    #[must_use]
    pub fn sniff_bytes(mut self, bytes: usize) -> Self {
        self.sniff_bytes = Some(bytes);
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn build(self) -> Result<Config> {
        let config = Config {
            working_dir: self.working_dir,
            repo_root: self.repo_root,
            discovery: self.discovery.unwrap_or_default(),
            output_file: self
                .output_file
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string()),
            exclude_patterns: self.exclude_patterns,
            sniff_bytes: self.sniff_bytes.unwrap_or(MIN_SNIFF_BYTES),
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::builder().build().unwrap();

        assert_eq!(config.output_file, DEFAULT_OUTPUT_FILE);
        assert_eq!(config.discovery, DiscoveryMode::Git);
        assert_eq!(config.sniff_bytes, MIN_SNIFF_BYTES);
        assert!(!config.dry_run);
    }

    #[test]
    fn test_invalid_working_dir() {
        let result = Config::builder()
            .working_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_repo_root_must_be_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();

        assert!(Config::builder().repo_root(&file).build().is_err());
        assert!(Config::builder().repo_root(temp.path()).build().is_ok());
    }

    #[test]
    fn test_output_file_must_be_plain_name() {
        for bad in ["", "out/ctx.txt", "../ctx.txt", "/tmp/ctx.txt", "."] {
            assert!(
                Config::builder().output_file(bad).build().is_err(),
                "{bad:?} accepted"
            );
        }
        assert!(Config::builder().output_file("ctx.md").build().is_ok());
    }

    #[test]
    fn test_sniff_bytes_minimum() {
        assert!(Config::builder().sniff_bytes(512).build().is_err());
        assert_eq!(
            Config::builder().sniff_bytes(8192).build().unwrap().sniff_bytes,
            8192
        );
    }

    #[test]
    fn test_invalid_exclude_pattern() {
        let err = Config::builder().exclude("src/[").build().unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
    }
}
