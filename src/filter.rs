use std::path::Path;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::error::LinkmapError;
use crate::traits::Matcher;

// ---------------------------------------------------------------------------
// GlobMatcher
// ---------------------------------------------------------------------------

/// A set of glob patterns matched against whole paths.
///
/// `*` and `?` never cross a `/`; `**` spans any number of components. The
/// pattern has to describe the full path, so `*.h` does not match `/inc/a.h`
/// but `/inc/*.h` and `**/*.h` do.
pub struct GlobMatcher {
    set: GlobSet,
}

impl GlobMatcher {
    /// Compile `patterns` into a single matcher.
    ///
    /// # Errors
    ///
    /// Returns [`LinkmapError::InvalidPattern`] for the first pattern that
    /// does not parse.
    pub fn new<I, S>(patterns: I) -> Result<Self, LinkmapError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let glob = GlobBuilder::new(pattern)
                .literal_separator(true)
                .build()
                .map_err(|source| LinkmapError::InvalidPattern {
                    pattern: pattern.to_string(),
                    source,
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| LinkmapError::InvalidPattern {
            pattern: String::new(),
            source,
        })?;
        Ok(Self { set })
    }
}

impl Matcher for GlobMatcher {
    fn is_match(&self, path: &Path) -> bool {
        self.set.is_match(path)
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Include/exclude decision for a resolved symlink.
///
/// An empty include side keeps everything; exclude always wins.
#[derive(Default)]
pub(crate) struct Filter {
    pub include: Vec<Box<dyn Matcher>>,
    pub exclude: Vec<Box<dyn Matcher>>,
}

impl Filter {
    /// Whether the link `source -> target` survives filtering.
    pub fn keep(&self, source: &Path, target: &Path) -> bool {
        let hit = |m: &Box<dyn Matcher>| m.is_match(source) || m.is_match(target);

        let included = self.include.is_empty() || self.include.iter().any(hit);
        included && !self.exclude.iter().any(hit)
    }
}
