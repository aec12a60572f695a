//! # linkmap
//!
//! Collapse a symlink-heavy tree into a minimal set of path mappings.
//!
//! Build systems that stage sources as symlink forests confuse indexers such
//! as clangd, which then report every header twice. linkmap walks a tree,
//! resolves every symlink to its real location and emits `TARGET=SOURCE`
//! pairs for `--path-mappings`. Wherever every entry of a directory is a link
//! into the same target directory, the directory is emitted as one mapping
//! instead of one per link, recursively, so the argument stays short.
//!
//! A directory is only collapsed when nothing in it would be remapped by
//! accident: a regular file, a filtered-out link or a non-collapsible
//! subdirectory keeps it (and its ancestors) split. Broken links are
//! reported and skipped without affecting their siblings.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let results = linkmap::mappings()
//!     .root("build/include")
//!     .exclude(["**/generated/**"])
//!     .run()
//!     .unwrap();
//!
//! print!("{}", linkmap::render(results.mappings(), linkmap::Format::Compact));
//! ```
//!
//! # Custom Resolvers and Matchers
//!
//! The walk only talks to the filesystem through [`Resolver`], and filters
//! through [`Matcher`]; implement either to walk something else or to filter
//! on something other than glob patterns.

#![forbid(unsafe_code)]

mod builder;
mod engine;
mod entry;
mod error;
mod filter;
mod output;
mod resolver;
mod results;
mod traits;

// ── Public re-exports ─────────────────────────────────────────────────────────

pub use builder::MappingBuilder;
pub use entry::{Entry, EntryKind};
pub use error::LinkmapError;
pub use filter::GlobMatcher;
pub use output::{render, write_mappings, Format};
pub use resolver::FsResolver;
pub use results::{Mapping, Results, ScanStats, WalkResult};
pub use traits::{Matcher, Resolver};

// ── Entry points ──────────────────────────────────────────────────────────────

/// Create a new [`MappingBuilder`] to configure and run a walk.
pub fn mappings() -> MappingBuilder {
    MappingBuilder::default()
}

/// Walk `root` on the real filesystem and return only its mappings.
///
/// Shorthand for the builder with default options.
///
/// # Errors
///
/// Fails only if a pattern does not compile.
pub fn get_mappings<I, E, S, T>(
    root: impl Into<std::path::PathBuf>,
    include: I,
    exclude: E,
) -> Result<Vec<Mapping>, LinkmapError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
    E: IntoIterator<Item = T>,
    T: Into<String>,
{
    Ok(mappings()
        .root(root)
        .include(include)
        .exclude(exclude)
        .run()?
        .into_mappings())
}
