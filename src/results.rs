use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::LinkmapError;

// ---------------------------------------------------------------------------
// Mapping
// ---------------------------------------------------------------------------

/// "`source` appears to the consumer as if it lived at `target`."
///
/// Displays as `TARGET=SOURCE`, the form clangd's `--path-mappings` expects.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mapping {
    pub target: PathBuf,
    pub source: PathBuf,
}

impl Mapping {
    pub fn new(target: impl Into<PathBuf>, source: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.target.display(), self.source.display())
    }
}

// ---------------------------------------------------------------------------
// WalkResult
// ---------------------------------------------------------------------------

/// Outcome of visiting one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkResult {
    /// The whole subtree is represented by one mapping whose source is the
    /// visited path.
    Collapsed(Mapping),

    /// Nothing to contribute and nothing in the way: an empty directory, a
    /// broken symlink, or a directory holding only such entries. Does not
    /// stop the parent from collapsing.
    Vacant,

    /// The subtree cannot be replaced by a single mapping. Carries the
    /// mappings of every descendant that did collapse.
    Split(Vec<Mapping>),
}

impl WalkResult {
    /// Whether the parent may still fold this result into its own mapping.
    pub fn collapsible(&self) -> bool {
        !matches!(self, WalkResult::Split(_))
    }

    pub fn mappings(&self) -> &[Mapping] {
        match self {
            WalkResult::Collapsed(m) => std::slice::from_ref(m),
            WalkResult::Vacant => &[],
            WalkResult::Split(v) => v,
        }
    }

    pub fn into_mappings(self) -> Vec<Mapping> {
        match self {
            WalkResult::Collapsed(m) => vec![m],
            WalkResult::Vacant => Vec::new(),
            WalkResult::Split(v) => v,
        }
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The output of a completed walk.
pub struct Results {
    /// What visiting the root produced. Use [`Results::mappings`] unless you
    /// care whether the root itself collapsed.
    pub outcome: WalkResult,

    /// Scan statistics.
    pub stats: ScanStats,

    /// Non-fatal errors encountered during the walk (broken symlinks,
    /// unreadable directories). Only populated if `.collect_errors(true)`
    /// was set on the builder; they are logged either way.
    pub errors: Vec<LinkmapError>,
}

impl Results {
    /// Mappings for the root, in walk order (children sorted by file name).
    pub fn mappings(&self) -> &[Mapping] {
        self.outcome.mappings()
    }

    pub fn into_mappings(self) -> Vec<Mapping> {
        self.outcome.into_mappings()
    }
}

/// Counters for a completed walk.
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Symlinks encountered, broken ones included.
    pub symlinks: usize,

    /// Directories descended into, the root included.
    pub dirs: usize,

    /// Regular files and other non-link, non-directory entries.
    pub others: usize,

    /// Symlinks that failed to resolve.
    pub broken: usize,

    /// Resolved symlinks dropped by include/exclude patterns.
    pub filtered: usize,

    /// Wall-clock time of the walk.
    pub duration: Duration,
}
