use std::path::{Path, PathBuf};

use crate::entry::{Entry, EntryKind};
use crate::error::LinkmapError;

/// The filesystem primitives the walker is built on.
///
/// [`FsResolver`](crate::FsResolver) implements this over the real
/// filesystem. Implement it yourself to walk anything else that has
/// directories and links, such as an in-memory tree in tests or a remote
/// snapshot.
///
/// # Error Handling
///
/// `children()` yields `Err` for entries it could not read rather than
/// stopping. The walker logs those, collects them when
/// `.collect_errors(true)` is set, and treats the directory as
/// non-collapsible.
///
/// # Example
///
/// ```rust
/// use std::io;
/// use std::path::{Path, PathBuf};
/// use linkmap::{Entry, EntryKind, LinkmapError, Resolver};
///
/// /// A tree containing a single dangling link.
/// struct Dangling;
///
/// impl Resolver for Dangling {
///     fn classify(&self, _path: &Path) -> io::Result<EntryKind> {
///         Ok(EntryKind::Symlink)
///     }
///     fn resolve(&self, _path: &Path) -> io::Result<PathBuf> {
///         Err(io::Error::new(io::ErrorKind::NotFound, "dangling"))
///     }
///     fn read_link(&self, _path: &Path) -> Option<PathBuf> {
///         Some(PathBuf::from("nowhere"))
///     }
///     fn children(
///         &self,
///         _dir: &Entry,
///     ) -> Box<dyn Iterator<Item = Result<Entry, LinkmapError>> + '_> {
///         Box::new(std::iter::empty())
///     }
/// }
///
/// let results = linkmap::mappings().root("link").resolver(Dangling).run().unwrap();
/// assert!(results.mappings().is_empty());
/// assert_eq!(results.stats.broken, 1);
/// ```
pub trait Resolver {
    /// Classify `path` without following it if it is itself a symlink.
    fn classify(&self, path: &Path) -> std::io::Result<EntryKind>;

    /// Resolve `path` to its real location, following every link on the way.
    ///
    /// Must fail, not loop, on cyclic links.
    fn resolve(&self, path: &Path) -> std::io::Result<PathBuf>;

    /// The raw, unresolved target of the link at `path`, for diagnostics.
    fn read_link(&self, path: &Path) -> Option<PathBuf>;

    /// List the immediate children of `dir`, one level only.
    ///
    /// Children carry `depth = dir.depth + 1`.
    fn children(
        &self,
        dir: &Entry,
    ) -> Box<dyn Iterator<Item = Result<Entry, LinkmapError>> + '_>;
}

/// Decides whether a path matches.
///
/// Include and exclude filters are both matchers; a symlink is tested through
/// its source path and its resolved target.
///
/// # Example
///
/// ```rust
/// use std::path::Path;
/// use linkmap::Matcher;
///
/// struct UnderDir(&'static str);
///
/// impl Matcher for UnderDir {
///     fn is_match(&self, path: &Path) -> bool {
///         path.starts_with(self.0)
///     }
/// }
///
/// assert!(UnderDir("/opt").is_match(Path::new("/opt/lib/a.h")));
/// ```
pub trait Matcher {
    /// Returns `true` if `path` matches.
    fn is_match(&self, path: &Path) -> bool;
}
