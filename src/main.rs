//! Command-line front end for linkmap.
//!
//! Prints the `--path-mappings` argument for clangd for a symlink tree:
//! compact (comma-separated, no newline) by default, one mapping per line
//! with `--pretty`. Diagnostics go to stderr.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use linkmap::{Format, LinkmapError};

/// Exit status for a user interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

const INTERRUPTED_MESSAGE: &str = "Interrupted.";

#[derive(Parser, Debug)]
#[command(
    name = "linkmap",
    version,
    about = "Create the path-mappings argument for clangd by resolving symlinks",
    long_about = "Create the path-mappings argument for clangd by resolving symlinks.\n\n\
                  The provided path is walked recursively and every symlink encountered \
                  contributes a mapping. Where possible, the mappings within a directory are \
                  replaced by a single mapping for the directory, which keeps the argument \
                  list for clangd short.\n\n\
                  Examples:\n  \
                    clangd --path-mappings=\"$(linkmap build/include)\"\n  \
                    linkmap --pretty -e '**/test/**' third_party"
)]
struct Cli {
    /// Directory (or symlink) to walk
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Print one mapping per line without comma-separation
    #[arg(short, long)]
    pretty: bool,

    /// Symlinks to include: a symlink is kept if its source or target matches
    /// PATTERN. With no include pattern, all symlinks are kept
    #[arg(short, long, value_name = "PATTERN", num_args = 0..)]
    include: Vec<String>,

    /// Symlinks to exclude: a symlink is dropped if its source or target
    /// matches PATTERN. Exclude overrules include
    #[arg(short, long, value_name = "PATTERN", num_args = 0..)]
    exclude: Vec<String>,

    /// Collapse directories on a shared target parent even when link names
    /// differ from their targets' names
    #[arg(long)]
    no_verify_names: bool,

    /// Do not descend more than N directories below PATH
    #[arg(long, value_name = "N")]
    max_depth: Option<usize>,

    /// Log every collapse decision and a summary
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors (broken symlinks are not reported)
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logger(cli.verbose, cli.quiet);

    if let Err(e) = ctrlc::set_handler(|| {
        eprintln!("{INTERRUPTED_MESSAGE}");
        std::process::exit(EXIT_INTERRUPTED);
    }) {
        log::warn!("cannot install interrupt handler: {e}");
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Linkmap(#[from] LinkmapError),

    #[error("cannot write output: {0}")]
    Output(#[from] io::Error),
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut builder = linkmap::mappings()
        .root(cli.path)
        .include(cli.include)
        .exclude(cli.exclude)
        .verify_names(!cli.no_verify_names);
    if let Some(depth) = cli.max_depth {
        builder = builder.max_depth(depth);
    }
    let results = builder.run()?;

    let format = if cli.pretty { Format::Pretty } else { Format::Compact };
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match linkmap::write_mappings(&mut out, results.mappings(), format) {
        // The reader went away (`linkmap | head`); nothing left to report
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.map_err(CliError::from),
    }
}

fn init_logger(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else if quiet {
        builder.filter_level(log::LevelFilter::Error);
    }
    builder
        .format(|buf, record| {
            let level = record.level().as_str().to_lowercase();
            writeln!(buf, "linkmap: {level}: {}", record.args())
        })
        .init();
}
