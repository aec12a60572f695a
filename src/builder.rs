use std::path::PathBuf;

use crate::engine::{run, EngineOptions, WalkConfig};
use crate::error::LinkmapError;
use crate::filter::{Filter, GlobMatcher};
use crate::resolver::FsResolver;
use crate::results::Results;
use crate::traits::{Matcher, Resolver};

// ---------------------------------------------------------------------------
// MappingBuilder
// ---------------------------------------------------------------------------

/// Entry point for configuring and running a walk.
///
/// Created via [`linkmap::mappings()`](crate::mappings). Configure with
/// chained builder methods, then call [`run()`](MappingBuilder::run).
///
/// # Example
///
/// ```rust,no_run
/// let results = linkmap::mappings()
///     .root("third_party")
///     .include(["**/include/**"])
///     .exclude(["**/test/**"])
///     .collect_errors(true)
///     .run()?;
///
/// for m in results.mappings() {
///     println!("{m}");
/// }
/// # Ok::<(), linkmap::LinkmapError>(())
/// ```
pub struct MappingBuilder {
    root:             PathBuf,
    resolver:         Option<Box<dyn Resolver>>,
    include:          Vec<String>,
    exclude:          Vec<String>,
    include_matchers: Vec<Box<dyn Matcher>>,
    exclude_matchers: Vec<Box<dyn Matcher>>,
    verify_names:     bool,
    max_depth:        Option<usize>,
    collect_errors:   bool,
}

impl Default for MappingBuilder {
    fn default() -> Self {
        Self {
            root:             PathBuf::from("."),
            resolver:         None,
            include:          Vec::new(),
            exclude:          Vec::new(),
            include_matchers: Vec::new(),
            exclude_matchers: Vec::new(),
            verify_names:     true,
            max_depth:        None,
            collect_errors:   false,
        }
    }
}

impl MappingBuilder {
    // ── Source ────────────────────────────────────────────────────────────

    /// The path to walk. Defaults to `.`.
    ///
    /// Emitted sources are built from this path as given; it is not made
    /// absolute.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = path.into();
        self
    }

    /// Walk something other than the real filesystem.
    ///
    /// Defaults to [`FsResolver`].
    pub fn resolver(mut self, r: impl Resolver + 'static) -> Self {
        self.resolver = Some(Box::new(r));
        self
    }

    // ── Filters ───────────────────────────────────────────────────────────

    /// Keep only symlinks whose source or target matches one of `patterns`.
    ///
    /// Patterns are globs over the full path. With no include patterns at
    /// all, every symlink is kept.
    pub fn include<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Drop symlinks whose source or target matches one of `patterns`.
    ///
    /// A matching exclude pattern overrules a matching include pattern.
    pub fn exclude<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Add a custom include matcher alongside any include patterns.
    pub fn with_include_matcher(mut self, m: impl Matcher + 'static) -> Self {
        self.include_matchers.push(Box::new(m));
        self
    }

    /// Add a custom exclude matcher alongside any exclude patterns.
    pub fn with_exclude_matcher(mut self, m: impl Matcher + 'static) -> Self {
        self.exclude_matchers.push(Box::new(m));
        self
    }

    // ── Options ───────────────────────────────────────────────────────────

    /// Only collapse a directory when each collapsing child has the same
    /// file name as its target.
    ///
    /// A directory mapping `dir -> parent` is only sound if `dir/x` and
    /// `parent/x` are the same file for every child `x`. Enabled by default;
    /// disable to collapse on a shared target parent alone.
    pub fn verify_names(mut self, yes: bool) -> Self {
        self.verify_names = yes;
        self
    }

    /// Maximum directory depth to descend into. `0` means the root only.
    /// Directories below the limit are left unmapped and keep their
    /// ancestors from collapsing. Unlimited by default.
    pub fn max_depth(mut self, d: usize) -> Self {
        self.max_depth = Some(d);
        self
    }

    /// Collect non-fatal errors into [`Results::errors`].
    ///
    /// Disabled by default. Broken symlinks and unreadable directories are
    /// logged either way.
    pub fn collect_errors(mut self, yes: bool) -> Self {
        self.collect_errors = yes;
        self
    }

    // ── Execute ───────────────────────────────────────────────────────────

    /// Walk the root and return the results.
    ///
    /// # Errors
    ///
    /// Returns [`LinkmapError::InvalidPattern`] if an include or exclude
    /// pattern does not compile. Nothing is walked in that case. Errors met
    /// during the walk are never fatal.
    pub fn run(self) -> Result<Results, LinkmapError> {
        let mut filter = Filter::default();
        push_globs(&mut filter.include, &self.include)?;
        push_globs(&mut filter.exclude, &self.exclude)?;
        filter.include.extend(self.include_matchers);
        filter.exclude.extend(self.exclude_matchers);

        let resolver = self.resolver.unwrap_or_else(|| Box::new(FsResolver));

        let opts = EngineOptions {
            root: self.root,
            config: WalkConfig {
                max_depth:      self.max_depth,
                verify_names:   self.verify_names,
                collect_errors: self.collect_errors,
            },
            resolver,
            filter,
        };

        Ok(run(opts))
    }
}

fn push_globs(into: &mut Vec<Box<dyn Matcher>>, patterns: &[String]) -> Result<(), LinkmapError> {
    if patterns.is_empty() {
        return Ok(());
    }
    let matcher = GlobMatcher::new(patterns)?;
    into.push(Box::new(matcher));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_include_fails_before_walking() {
        let err = MappingBuilder::default()
            .root("/definitely/not/here")
            .include(["[unclosed"])
            .run()
            .err()
            .expect("pattern should not compile");
        assert!(matches!(err, LinkmapError::InvalidPattern { .. }));
    }

    #[test]
    fn empty_pattern_lists_add_no_matchers() {
        let mut matchers = Vec::new();
        push_globs(&mut matchers, &[]).unwrap();
        assert!(matchers.is_empty());

        push_globs(&mut matchers, &["/r/*".to_string()]).unwrap();
        assert_eq!(matchers.len(), 1);
    }
}
