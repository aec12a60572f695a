use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::entry::{Entry, EntryKind};
use crate::error::LinkmapError;
use crate::filter::Filter;
use crate::results::{Mapping, Results, ScanStats, WalkResult};
use crate::traits::Resolver;

// ---------------------------------------------------------------------------
// WalkConfig
// ---------------------------------------------------------------------------

/// Traversal parameters passed from the builder to the engine.
pub(crate) struct WalkConfig {
    pub max_depth:      Option<usize>,
    pub verify_names:   bool,
    pub collect_errors: bool,
}

// ---------------------------------------------------------------------------
// Engine options
// ---------------------------------------------------------------------------

/// Internal options passed from the builder to `run()`.
pub(crate) struct EngineOptions {
    pub root:     PathBuf,
    pub config:   WalkConfig,
    pub resolver: Box<dyn Resolver>,
    pub filter:   Filter,
}

// ---------------------------------------------------------------------------
// run()
// ---------------------------------------------------------------------------

/// Walk `opts.root` and return the mappings for it.
///
/// Called by `MappingBuilder::run()` after the patterns compiled.
pub(crate) fn run(opts: EngineOptions) -> Results {
    let start = Instant::now();

    // `inc/` would make the OS follow a symlinked root; classify `inc` itself
    let path: PathBuf = opts.root.components().collect();
    let kind = match opts.resolver.classify(&path) {
        Ok(kind) => kind,
        Err(e) => {
            log::warn!("cannot stat {}: {}", path.display(), e);
            EntryKind::Other
        }
    };
    let root = Entry {
        path,
        kind,
        depth: 0,
    };

    let mut walker = Walker {
        resolver: opts.resolver.as_ref(),
        filter:   &opts.filter,
        config:   &opts.config,
        stats:    ScanStats::default(),
        errors:   Vec::new(),
    };
    let outcome = walker.visit(&root);

    let mut stats = walker.stats;
    stats.duration = start.elapsed();
    log::info!(
        "{} mapping(s) from {} symlink(s) in {} dir(s) ({} broken, {} filtered) in {:.3}s",
        outcome.mappings().len(),
        stats.symlinks,
        stats.dirs,
        stats.broken,
        stats.filtered,
        stats.duration.as_secs_f64(),
    );

    Results {
        outcome,
        stats,
        errors: walker.errors,
    }
}

// ---------------------------------------------------------------------------
// Walker
// ---------------------------------------------------------------------------

struct Walker<'a> {
    resolver: &'a dyn Resolver,
    filter:   &'a Filter,
    config:   &'a WalkConfig,
    stats:    ScanStats,
    errors:   Vec<LinkmapError>,
}

impl Walker<'_> {
    fn visit(&mut self, entry: &Entry) -> WalkResult {
        match entry.kind {
            EntryKind::Symlink => self.visit_symlink(&entry.path),
            EntryKind::Dir => self.visit_dir(entry),
            EntryKind::Other => {
                self.stats.others += 1;
                WalkResult::Split(Vec::new())
            }
        }
    }

    fn visit_symlink(&mut self, path: &Path) -> WalkResult {
        self.stats.symlinks += 1;

        let target = match self.resolver.resolve(path) {
            Ok(t) => t,
            Err(source) => {
                // A dangling link is skipped without blocking its siblings
                self.stats.broken += 1;
                self.report(LinkmapError::BrokenSymlink {
                    path: path.to_path_buf(),
                    link: self.resolver.read_link(path),
                    source,
                });
                return WalkResult::Vacant;
            }
        };

        if self.filter.keep(path, &target) {
            WalkResult::Collapsed(Mapping::new(target, path))
        } else {
            // Still present under its parent, so the parent cannot be remapped wholesale
            log::debug!("filtered out {} -> {}", path.display(), target.display());
            self.stats.filtered += 1;
            WalkResult::Split(Vec::new())
        }
    }

    fn visit_dir(&mut self, dir: &Entry) -> WalkResult {
        if let Some(max) = self.config.max_depth {
            if dir.depth > max {
                self.report(LinkmapError::DepthLimit(dir.path.clone()));
                return WalkResult::Split(Vec::new());
            }
        }
        self.stats.dirs += 1;

        let mut mappings = Vec::new();
        let mut all_same = true;
        let mut target_parent: Option<PathBuf> = None;

        let resolver = self.resolver;
        for child in resolver.children(dir) {
            let child = match child {
                Ok(c) => c,
                Err(e) => {
                    // Whatever we could not list may not map to the common parent
                    self.report(e);
                    all_same = false;
                    continue;
                }
            };

            match self.visit(&child) {
                WalkResult::Collapsed(m) => {
                    if all_same {
                        all_same = self.joins(&m, &mut target_parent);
                    }
                    mappings.push(m);
                }
                other => {
                    all_same &= other.collapsible();
                    mappings.extend(other.into_mappings());
                }
            }
        }

        match target_parent {
            Some(parent) if all_same => {
                log::debug!(
                    "collapsed {} mapping(s) under {} onto {}",
                    mappings.len(),
                    dir.path.display(),
                    parent.display(),
                );
                WalkResult::Collapsed(Mapping::new(parent, dir.path.clone()))
            }
            // Uniform but nothing set a target parent, so nothing was accumulated either
            None if all_same => WalkResult::Vacant,
            _ => WalkResult::Split(mappings),
        }
    }

    /// Whether a collapsed child can be folded into the candidate parent,
    /// setting the candidate on first use.
    fn joins(&self, m: &Mapping, candidate: &mut Option<PathBuf>) -> bool {
        let Some(parent) = m.target.parent() else {
            return false;
        };
        if self.config.verify_names && m.source.file_name() != m.target.file_name() {
            log::debug!(
                "{} and {} differ in name, not collapsing their parent",
                m.source.display(),
                m.target.display(),
            );
            return false;
        }
        match candidate {
            Some(c) => c.as_path() == parent,
            None => {
                *candidate = Some(parent.to_path_buf());
                true
            }
        }
    }

    fn report(&mut self, err: LinkmapError) {
        log::warn!("{err}");
        if self.config.collect_errors {
            self.errors.push(err);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::io;

    use super::*;
    use crate::filter::GlobMatcher;

    /// An in-memory tree: directories, links to raw targets, and files.
    #[derive(Default)]
    struct MemTree {
        nodes: BTreeMap<PathBuf, Node>,
    }

    enum Node {
        Dir,
        File,
        Link(PathBuf),
        Unreadable,
    }

    impl MemTree {
        fn dir(mut self, p: &str) -> Self {
            self.nodes.insert(p.into(), Node::Dir);
            self
        }
        fn file(mut self, p: &str) -> Self {
            self.nodes.insert(p.into(), Node::File);
            self
        }
        fn link(mut self, p: &str, to: &str) -> Self {
            self.nodes.insert(p.into(), Node::Link(to.into()));
            self
        }
        /// An entry the listing reports as an error instead of a child.
        fn unreadable(mut self, p: &str) -> Self {
            self.nodes.insert(p.into(), Node::Unreadable);
            self
        }
    }

    impl Resolver for MemTree {
        fn classify(&self, path: &Path) -> io::Result<EntryKind> {
            match self.nodes.get(path) {
                Some(Node::Dir) => Ok(EntryKind::Dir),
                Some(Node::File) => Ok(EntryKind::Other),
                Some(Node::Link(_)) => Ok(EntryKind::Symlink),
                Some(Node::Unreadable) => {
                    Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                }
                None => Err(io::Error::new(io::ErrorKind::NotFound, "missing")),
            }
        }

        // Targets are absolute; links are followed up to a fixed number of hops.
        fn resolve(&self, path: &Path) -> io::Result<PathBuf> {
            let mut cur = path.to_path_buf();
            for _ in 0..8 {
                match self.nodes.get(&cur) {
                    Some(Node::Link(to)) => cur = to.clone(),
                    Some(Node::Unreadable) => {
                        return Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
                    }
                    Some(_) => return Ok(cur),
                    None => return Err(io::Error::new(io::ErrorKind::NotFound, "dangling")),
                }
            }
            Err(io::Error::new(io::ErrorKind::Other, "too many levels of symbolic links"))
        }

        fn read_link(&self, path: &Path) -> Option<PathBuf> {
            match self.nodes.get(path) {
                Some(Node::Link(to)) => Some(to.clone()),
                _ => None,
            }
        }

        fn children(
            &self,
            dir: &Entry,
        ) -> Box<dyn Iterator<Item = Result<Entry, LinkmapError>> + '_> {
            let parent = dir.path.clone();
            let depth = dir.depth + 1;
            Box::new(
                self.nodes
                    .iter()
                    .filter(move |(p, _)| p.parent() == Some(parent.as_path()))
                    .map(move |(p, node)| match node {
                        Node::Unreadable => Err(LinkmapError::PermissionDenied(p.clone())),
                        _ => Ok(Entry {
                            path: p.clone(),
                            kind: self.classify(p).unwrap_or(EntryKind::Other),
                            depth,
                        }),
                    }),
            )
        }
    }

    fn walk_with(tree: MemTree, root: &str, config: WalkConfig, filter: Filter) -> Results {
        run(EngineOptions {
            root: root.into(),
            config,
            resolver: Box::new(tree),
            filter,
        })
    }

    fn walk(tree: MemTree, root: &str) -> Vec<String> {
        let config = WalkConfig {
            max_depth: None,
            verify_names: true,
            collect_errors: true,
        };
        render(walk_with(tree, root, config, Filter::default()).mappings())
    }

    fn render(mappings: &[Mapping]) -> Vec<String> {
        mappings.iter().map(ToString::to_string).collect()
    }

    fn targets() -> MemTree {
        MemTree::default()
            .dir("/t")
            .file("/t/a")
            .file("/t/b")
            .dir("/t1")
            .file("/t1/a")
            .dir("/t2")
            .file("/t2/b")
    }

    fn excluding(patterns: &[&str]) -> Filter {
        let mut filter = Filter::default();
        filter.exclude.push(Box::new(GlobMatcher::new(patterns).unwrap()));
        filter
    }

    #[test]
    fn uniform_links_collapse_to_common_parent() {
        let tree = targets().dir("/r").link("/r/a", "/t/a").link("/r/b", "/t/b");
        assert_eq!(walk(tree, "/r"), vec!["/t=/r"]);
    }

    #[test]
    fn regular_file_blocks_collapse() {
        let tree = targets().dir("/r").link("/r/a", "/t/a").file("/r/f");
        assert_eq!(walk(tree, "/r"), vec!["/t/a=/r/a"]);
    }

    #[test]
    fn mixed_target_parents_stay_separate() {
        let tree = targets().dir("/r").link("/r/a", "/t1/a").link("/r/b", "/t2/b");
        assert_eq!(walk(tree, "/r"), vec!["/t1/a=/r/a", "/t2/b=/r/b"]);
    }

    #[test]
    fn excluded_link_blocks_collapse() {
        let tree = targets().dir("/r").link("/r/a", "/t/a").link("/r/b", "/t/b");
        let config = WalkConfig {
            max_depth: None,
            verify_names: true,
            collect_errors: false,
        };
        let results = walk_with(tree, "/r", config, excluding(&["/r/a"]));
        assert_eq!(render(results.mappings()), vec!["/t/b=/r/b"]);
        assert_eq!(results.stats.filtered, 1);
    }

    #[test]
    fn broken_link_is_neutral() {
        let tree = targets()
            .dir("/r")
            .link("/r/a", "/t/a")
            .link("/r/b", "/t/b")
            .link("/r/dead", "/nowhere/dead");
        let config = WalkConfig {
            max_depth: None,
            verify_names: true,
            collect_errors: true,
        };
        let results = walk_with(tree, "/r", config, Filter::default());

        assert_eq!(render(results.mappings()), vec!["/t=/r"]);
        assert_eq!(results.stats.broken, 1);
        assert_eq!(results.errors.len(), 1);
        match &results.errors[0] {
            LinkmapError::BrokenSymlink { path, link, .. } => {
                assert_eq!(path, Path::new("/r/dead"));
                assert_eq!(link.as_deref(), Some(Path::new("/nowhere/dead")));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn nested_collapse_reaches_the_top() {
        let tree = MemTree::default()
            .dir("/s")
            .dir("/s/inc")
            .file("/s/inc/a.h")
            .file("/s/inc/b.h")
            .dir("/s/lib")
            .file("/s/lib/x.so")
            .dir("/r")
            .dir("/r/inc")
            .link("/r/inc/a.h", "/s/inc/a.h")
            .link("/r/inc/b.h", "/s/inc/b.h")
            .dir("/r/lib")
            .link("/r/lib/x.so", "/s/lib/x.so");
        assert_eq!(walk(tree, "/r"), vec!["/s=/r"]);
    }

    #[test]
    fn collapsed_subtree_survives_blocked_parent() {
        let tree = MemTree::default()
            .dir("/s")
            .dir("/s/inc")
            .file("/s/inc/a.h")
            .dir("/r")
            .file("/r/README")
            .dir("/r/inc")
            .link("/r/inc/a.h", "/s/inc/a.h");
        assert_eq!(walk(tree, "/r"), vec!["/s/inc=/r/inc"]);
    }

    #[test]
    fn file_deep_down_blocks_every_ancestor() {
        let tree = targets()
            .dir("/r")
            .link("/r/a", "/t/a")
            .dir("/r/d")
            .dir("/r/d/e")
            .file("/r/d/e/plain");
        let results = walk(tree, "/r");
        assert_eq!(results, vec!["/t/a=/r/a"]);
    }

    #[test]
    fn empty_directory_neither_blocks_nor_maps() {
        let tree = targets().dir("/r").dir("/r/empty").link("/r/a", "/t/a");
        assert_eq!(walk(tree, "/r"), vec!["/t=/r"]);

        let tree = MemTree::default().dir("/r");
        assert!(walk(tree, "/r").is_empty());
    }

    #[test]
    fn root_symlink_maps_itself() {
        let tree = targets().link("/r", "/t/a");
        assert_eq!(walk(tree, "/r"), vec!["/t/a=/r"]);
    }

    #[test]
    fn missing_root_yields_nothing() {
        assert!(walk(MemTree::default(), "/nope").is_empty());
    }

    #[test]
    fn renamed_link_blocks_collapse_when_verifying() {
        let tree = targets().dir("/r").link("/r/a", "/t/a").link("/r/c", "/t/b");
        assert_eq!(walk(tree, "/r"), vec!["/t/a=/r/a", "/t/b=/r/c"]);
    }

    #[test]
    fn renamed_link_collapses_without_verification() {
        let tree = targets().dir("/r").link("/r/a", "/t/a").link("/r/c", "/t/b");
        let config = WalkConfig {
            max_depth: None,
            verify_names: false,
            collect_errors: false,
        };
        let results = walk_with(tree, "/r", config, Filter::default());
        assert_eq!(render(results.mappings()), vec!["/t=/r"]);
    }

    #[test]
    fn link_to_filesystem_root_never_collapses() {
        let tree = MemTree::default().dir("/").dir("/r").link("/r/up", "/");
        let config = WalkConfig {
            max_depth: None,
            verify_names: false,
            collect_errors: false,
        };
        let results = walk_with(tree, "/r", config, Filter::default());
        assert_eq!(render(results.mappings()), vec!["/=/r/up"]);
    }

    #[test]
    fn link_cycle_is_reported_as_broken() {
        let tree = targets()
            .dir("/r")
            .link("/r/a", "/t/a")
            .link("/r/x", "/r/y")
            .link("/r/y", "/r/x");
        let config = WalkConfig {
            max_depth: None,
            verify_names: true,
            collect_errors: true,
        };
        let results = walk_with(tree, "/r", config, Filter::default());
        assert_eq!(render(results.mappings()), vec!["/t=/r"]);
        assert_eq!(results.stats.broken, 2);
    }

    #[test]
    fn depth_limit_blocks_deeper_directories() {
        let tree = targets()
            .dir("/r")
            .link("/r/a", "/t/a")
            .dir("/r/d")
            .dir("/r/d/e")
            .link("/r/d/e/b", "/t/b");
        let config = WalkConfig {
            max_depth: Some(1),
            verify_names: true,
            collect_errors: true,
        };
        let results = walk_with(tree, "/r", config, Filter::default());
        assert_eq!(render(results.mappings()), vec!["/t/a=/r/a"]);
        assert!(matches!(results.errors[0], LinkmapError::DepthLimit(_)));
    }

    #[test]
    fn unlistable_entry_blocks_collapse_but_keeps_siblings() {
        let tree = targets()
            .dir("/r")
            .link("/r/a", "/t/a")
            .unreadable("/r/locked");
        let config = WalkConfig {
            max_depth: None,
            verify_names: true,
            collect_errors: true,
        };
        let results = walk_with(tree, "/r", config, Filter::default());

        assert_eq!(
            results.outcome,
            WalkResult::Split(vec![Mapping::new("/t/a", "/r/a")])
        );
        assert_eq!(results.errors.len(), 1);
        match &results.errors[0] {
            LinkmapError::PermissionDenied(p) => assert_eq!(p, Path::new("/r/locked")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unlistable_entry_is_not_collected_unless_asked() {
        let tree = targets().dir("/r").link("/r/a", "/t/a").unreadable("/r/locked");
        let config = WalkConfig {
            max_depth: None,
            verify_names: true,
            collect_errors: false,
        };
        let results = walk_with(tree, "/r", config, Filter::default());
        assert!(!results.outcome.collapsible());
        assert!(results.errors.is_empty());
    }

    #[test]
    fn root_is_reported_without_trailing_separator() {
        let tree = targets().dir("/r").link("/r/a", "/t/a");
        assert_eq!(walk(tree, "/r/"), vec!["/t=/r"]);
    }

    #[test]
    fn walking_twice_is_identical() {
        let build = || {
            targets()
                .dir("/r")
                .link("/r/a", "/t1/a")
                .link("/r/b", "/t2/b")
                .dir("/r/d")
                .link("/r/d/a", "/t/a")
                .link("/r/d/b", "/t/b")
        };
        assert_eq!(walk(build(), "/r"), walk(build(), "/r"));
        assert_eq!(walk(build(), "/r"), vec!["/t1/a=/r/a", "/t2/b=/r/b", "/t=/r/d"]);
    }
}
