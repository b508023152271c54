use crate::{
    assembler::ContentAssembler,
    classify::BinaryClassifier,
    config::{Config, DiscoveryMode},
    error::{Error, Result},
    filter::PathFilter,
    lister::RepositoryLister,
    resolver::{PathResolver, ResolvedFile, normalize},
    storage::{Storage, temp_path},
    tree::TreeBuilder,
};
use serde::Serialize;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};
use tracing::{Level, debug, info, instrument, warn};

/// Statistics collected during one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    /// How files were discovered
    pub discovery: DiscoveryMode,

    /// Files reported by the repository lister
    pub listed_files: usize,

    /// Files dropped by exclude patterns
    pub excluded_files: usize,

    /// Files with a content block in the document
    pub total_files: usize,

    /// Files included verbatim
    pub text_files: usize,

    /// Files skipped as binary
    pub binary_files: usize,

    /// Files that could not be read
    pub error_files: usize,

    /// Files outside the working directory (content only, not in the tree)
    pub outside_files: usize,

    /// Entries drawn in the directory tree
    pub tree_entries: usize,

    /// Size of the document in bytes
    pub document_bytes: usize,

    /// Path of the output document
    pub output_path: String,

    /// Whether the document was written (false in dry run mode)
    pub written: bool,

    /// Time spent asking the lister for files
    pub discovery_duration: Duration,

    /// Time spent resolving, classifying and reading files
    pub assemble_duration: Duration,

    /// Time spent writing the document
    pub write_duration: Duration,

    /// Total execution time
    pub duration: Duration,

    /// Generation timestamp
    pub generated_at: String,
}

impl RunStats {
    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                  repo-digest Summary                  ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ Files Listed:         {:>8}                        ║", self.listed_files);
        println!("║   - Excluded:         {:>8}                        ║", self.excluded_files);
        println!("║ Files Emitted:        {:>8}                        ║", self.total_files);
        println!("║   - Text files:       {:>8}                        ║", self.text_files);
        println!("║   - Binary files:     {:>8}                        ║", self.binary_files);
        println!("║   - Read errors:      {:>8}                        ║", self.error_files);
        println!("║   - Outside cwd:      {:>8}                        ║", self.outside_files);
        println!("║ Tree Entries:         {:>8}                        ║", self.tree_entries);
        println!("║ Document Size:        {:>8} bytes                  ║", self.document_bytes);
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Discovery:        {:>8.2}s                     ║",
            self.discovery_duration.as_secs_f64()
        );
        println!(
            "║   - Assembly:         {:>8.2}s                     ║",
            self.assemble_duration.as_secs_f64()
        );
        println!(
            "║   - Writing:          {:>8.2}s                     ║",
            self.write_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Drives one run: discovery, resolution, tree building, assembly and the single write.
pub struct Pipeline<'a> {
    config: Config,
    lister: &'a dyn RepositoryLister,
    storage: &'a dyn Storage,
    filter: PathFilter,
}

impl<'a> Pipeline<'a> {
    /// Creates a new pipeline with the given configuration and collaborators.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration validation fails.
    pub fn new(
        config: Config,
        lister: &'a dyn RepositoryLister,
        storage: &'a dyn Storage,
    ) -> Result<Self> {
        config.validate()?;
        let filter = PathFilter::new(&config.exclude_patterns)?;

        Ok(Self {
            config,
            lister,
            storage,
            filter,
        })
    }

    /// Executes the run and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Discover**: asks the lister for the repository root and its files
    /// 2. **Resolve**: re-anchors every path on the working directory
    /// 3. **Assemble**: builds the tree and the content blocks in memory
    /// 4. **Write**: persists the document with a single write
    ///
    /// # Errors
    ///
    /// Returns an error if discovery fails, the listing contains an
    /// unsupported path, or the final write fails. Unreadable files do not
    /// fail the run.
    #[instrument(skip(self), fields(output = %self.config.output_file))]
    pub fn run(&self) -> Result<RunStats> {
        let start_time = Instant::now();
        let working_dir = self.working_dir()?;

        info!("Stage 1/3: Discovering files...");
        let discovery_start = Instant::now();
        let repo_root = match &self.config.repo_root {
            Some(root) => absolutize(root, &working_dir),
            None => self.lister.repo_root(&working_dir)?,
        };
        let listed = self.lister.list_tracked_paths(&repo_root)?;
        let discovery_duration = discovery_start.elapsed();
        let listed_files = listed.len();

        let kept: Vec<String> = listed
            .into_iter()
            .filter(|path| self.filter.should_include(path))
            .collect();
        let excluded_files = listed_files - kept.len();

        info!(
            "✓ Found {} files under {} ({} excluded) in {:.2}s",
            listed_files,
            repo_root.display(),
            excluded_files,
            discovery_duration.as_secs_f64()
        );

        info!("Stage 2/3: Assembling document...");
        let assemble_start = Instant::now();
        let resolver = PathResolver::new(&repo_root, &working_dir);
        let output_path = resolver.working_dir().join(&self.config.output_file);
        let files = self.resolve(&resolver, &kept, &output_path)?;

        if files.is_empty() {
            warn!("No files to include under {}", repo_root.display());
        }

        let tree = TreeBuilder::build(
            files
                .iter()
                .filter(|f| !f.escapes_working_dir())
                .map(|f| f.working_relative.as_str()),
        )?;
        let assembler =
            ContentAssembler::new(self.storage, BinaryClassifier::new(self.config.sniff_bytes));
        let document = assembler.assemble(&files, &tree);
        let rendered = document.to_string();
        let assemble_duration = assemble_start.elapsed();

        info!(
            "✓ Assembled {} files ({} text, {} binary, {} unreadable) in {:.2}s",
            files.len(),
            document.text_count(),
            document.binary_count(),
            document.error_count(),
            assemble_duration.as_secs_f64()
        );

        let write_start = Instant::now();
        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file write");
        } else {
            info!("Stage 3/3: Writing {}...", output_path.display());
            self.storage
                .write(&output_path, rendered.as_bytes())
                .map_err(|e| {
                    if e.is_write() {
                        e
                    } else {
                        Error::write(&output_path, e.detail())
                    }
                })?;
        }
        let write_duration = write_start.elapsed();

        let stats = RunStats {
            discovery: self.config.discovery,
            listed_files,
            excluded_files,
            total_files: files.len(),
            text_files: document.text_count(),
            binary_files: document.binary_count(),
            error_files: document.error_count(),
            outside_files: files.iter().filter(|f| f.escapes_working_dir()).count(),
            tree_entries: tree.descendant_count(),
            document_bytes: rendered.len(),
            output_path: output_path.display().to_string(),
            written: !self.config.dry_run,
            discovery_duration,
            assemble_duration,
            write_duration,
            duration: start_time.elapsed(),
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };

        info!("✓ Completed in {:.2}s", stats.duration.as_secs_f64());
        Ok(stats)
    }

    /// Resolves listed paths and drops entries that cannot carry content.
    ///
    /// The output document and its staging file are never included, so
    /// repeated runs see the same file set. Missing files are kept and get
    /// an error marker.
    fn resolve(
        &self,
        resolver: &PathResolver,
        paths: &[String],
        output_path: &Path,
    ) -> Result<Vec<ResolvedFile>> {
        if tracing::enabled!(Level::DEBUG) && self.lister.is_repo_path(output_path) {
            debug!(
                "Output file {} is visible to the repository; consider ignoring it",
                output_path.display()
            );
        }

        let staging_path = temp_path(output_path);
        let mut files = resolver.resolve_all(paths)?;
        files.retain(|file| {
            if file.absolute_path == output_path || file.absolute_path == staging_path {
                debug!("Skipping previous output: {}", file.working_relative);
                return false;
            }
            if self.storage.is_special_file(&file.absolute_path) {
                debug!("Skipping non-regular file: {}", file.working_relative);
                return false;
            }
            true
        });
        Ok(files)
    }

    fn working_dir(&self) -> Result<PathBuf> {
        let cwd = self.storage.current_directory()?;
        Ok(match &self.config.working_dir {
            Some(dir) => absolutize(dir, &cwd),
            None => normalize(&cwd),
        })
    }
}

/// Anchors `path` on `base` unless it is already absolute, then normalizes it.
pub(crate) fn absolutize(path: &Path, base: &Path) -> PathBuf {
    normalize(&base.join(path))
}
