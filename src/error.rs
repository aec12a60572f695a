use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkmapError {
    // Traversal
    #[error("ignoring broken symlink: {} -> {} -- {source}", path.display(), link_display(link))]
    BrokenSymlink {
        path: PathBuf,
        link: Option<PathBuf>,
        #[source]
        source: std::io::Error,
    },

    #[error("permission denied: {}", .0.display())]
    PermissionDenied(PathBuf),

    #[error("path not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("depth limit reached, not descending into {}", .0.display())]
    DepthLimit(PathBuf),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Config
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    // Third-party extensibility
    #[error("resolver error: {0}")]
    Source(String),
}

fn link_display(link: &Option<PathBuf>) -> String {
    match link {
        Some(l) => l.display().to_string(),
        None => "?".to_string(),
    }
}

impl LinkmapError {
    /// The path this error occurred at, if applicable.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::BrokenSymlink { path: p, .. }
            | Self::PermissionDenied(p)
            | Self::NotFound(p)
            | Self::DepthLimit(p)
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the walk can continue after this error.
    ///
    /// Recoverable errors are logged and collected while the walk keeps going;
    /// the affected entry just contributes no mapping.
    ///
    /// Fatal errors (bad patterns) are returned from `run()` before any
    /// traversal happens.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::InvalidPattern { .. })
    }

    /// Map an I/O failure at `path` to the closest variant.
    pub(crate) fn from_io(path: PathBuf, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            std::io::ErrorKind::NotFound => Self::NotFound(path),
            _ => Self::Io { path, source: err },
        }
    }
}
