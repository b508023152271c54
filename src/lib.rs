//! # repo-digest
//!
//! Flattens a repository into one text file for language models: a
//! directory tree of the working directory followed by the content of every
//! repository file, labeled relative to where the tool was run.
//!
//! ## Quick Start
//!
//! ```no_run
//! use repo_digest::Config;
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .output_file("context.txt")
//!     .exclude("*.lock")
//!     .build()?;
//!
//! let stats = repo_digest::run(config)?;
//! println!("wrote {}", stats.output_path);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! 1. **Lister**: asks `git` (or an ignore-aware walk) for the repository files
//! 2. **Resolver**: re-anchors every root-relative path on the working directory
//! 3. **Tree**: folds the paths below the working directory into a tree and renders it
//! 4. **Assembler**: classifies and reads each file into a content block
//! 5. **Storage**: writes the finished document once

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod assembler;
mod classify;
mod config;
mod document;
mod error;
mod filter;
mod lister;
mod pipeline;
mod render;
mod resolver;
mod storage;
mod tree;

pub use assembler::ContentAssembler;
pub use classify::{BinaryClassifier, FileKind, MIN_SNIFF_BYTES};
pub use config::{Config, ConfigBuilder, DEFAULT_OUTPUT_FILE, DiscoveryMode};
pub use document::{BlockContent, ContentBlock, OutputDocument};
pub use error::{Error, Result};
pub use lister::{GitLister, RepositoryLister, WalkLister};
pub use pipeline::{Pipeline, RunStats};
pub use render::TreeRenderer;
pub use resolver::{PathResolver, ResolvedFile};
pub use storage::{FsStorage, Storage};
pub use tree::{TreeBuilder, TreeNode};

/// Runs one digest with the filesystem and the configured lister.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - The working directory is not inside a repository (git discovery)
/// - The repository listing contains an unsupported path
/// - The output document cannot be written
pub fn run(config: Config) -> Result<RunStats> {
    let storage = FsStorage::new();
    let lister: Box<dyn RepositoryLister> = match config.discovery {
        DiscoveryMode::Git => Box::new(GitLister::new()),
        DiscoveryMode::Walk => {
            let cwd = storage.current_directory()?;
            let root = config
                .repo_root
                .as_ref()
                .or(config.working_dir.as_ref())
                .map_or_else(|| resolver::normalize(&cwd), |dir| pipeline::absolutize(dir, &cwd));
            Box::new(WalkLister::new(root))
        }
    };

    Pipeline::new(config, lister.as_ref(), &storage)?.run()
}
