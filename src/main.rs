use anyhow::Context;
use clap::Parser;
use repo_digest::{Config, DEFAULT_OUTPUT_FILE, DiscoveryMode, MIN_SNIFF_BYTES};
use std::{path::PathBuf, process::ExitCode};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "repo-digest",
    version,
    author,
    about = "Flatten a repository into a single LLM-friendly text file",
    long_about = "Flatten a repository into a single LLM-friendly text file.\n\n\
    Writes a directory tree of the current directory followed by the content of \
    every tracked (or untracked but not ignored) file in the repository. Files \
    outside the current directory are labeled with ../ paths; binary files are \
    replaced by a marker.\n\n\
    USAGE EXAMPLES:\n  \
      # Digest the repository containing the current directory\n  \
      repo-digest\n\n  \
      # Digest a directory that is not a git repository\n  \
      repo-digest --walk\n\n  \
      # Skip lock files and vendored code\n  \
      repo-digest --exclude '*.lock' --exclude 'vendor'"
)]
struct Cli {
    /// Directory to produce the digest for (defaults to the current directory)
    #[arg(long, value_name = "PATH")]
    cwd: Option<PathBuf>,

    /// Repository root override (skips root discovery)
    #[arg(long, value_name = "PATH")]
    root: Option<PathBuf>,

    /// Walk the directory honoring .gitignore instead of asking git
    #[arg(long)]
    walk: bool,

    /// Output file name, written into the working directory
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE, value_name = "NAME")]
    output: String,

    /// Glob pattern of repository paths to leave out (repeatable)
    #[arg(short, long, value_name = "GLOB")]
    exclude: Vec<String>,

    /// Leading bytes inspected when detecting binary files
    #[arg(long, default_value_t = MIN_SNIFF_BYTES, value_name = "BYTES")]
    sniff_bytes: usize,

    /// Dry run (build the document but don't write it)
    #[arg(long)]
    dry_run: bool,

    /// Print run statistics as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Print a run summary table on stdout
    #[arg(long, conflicts_with = "json")]
    summary: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_tracing(cli.verbose);

    match try_main(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn try_main(cli: Cli) -> anyhow::Result<()> {
    let mut builder = Config::builder()
        .output_file(cli.output)
        .exclude_patterns(cli.exclude)
        .sniff_bytes(cli.sniff_bytes)
        .dry_run(cli.dry_run)
        .discovery(if cli.walk {
            DiscoveryMode::Walk
        } else {
            DiscoveryMode::Git
        });

    if let Some(cwd) = cli.cwd {
        builder = builder.working_dir(cwd);
    }

    if let Some(root) = cli.root {
        builder = builder.repo_root(root);
    }

    let config = builder.build().context("Failed to build configuration")?;

    let stats = repo_digest::run(config).context("Failed to produce digest")?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else if cli.summary {
        stats.print_summary();
    } else if stats.written {
        println!("{}", stats.output_path);
    }

    Ok(())
}

fn setup_tracing(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbosity {
        0 => EnvFilter::new("repo_digest=warn"),
        1 => EnvFilter::new("repo_digest=info"),
        2 => EnvFilter::new("repo_digest=debug"),
        _ => EnvFilter::new("repo_digest=trace"),
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false),
        )
        .init();
}
