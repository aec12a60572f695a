use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

use crate::entry::{Entry, EntryKind};
use crate::error::LinkmapError;
use crate::traits::Resolver;

/// [`Resolver`] over the real filesystem.
///
/// Links are resolved with [`fs::canonicalize`], which fails with an error
/// (rather than looping) on cyclic links. Directories are listed one level
/// deep with `ignore`, every filter disabled, never following links, sorted
/// by file name so repeated runs emit mappings in the same order.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsResolver;

impl Resolver for FsResolver {
    fn classify(&self, path: &Path) -> std::io::Result<EntryKind> {
        fs::symlink_metadata(path).map(|m| EntryKind::from_file_type(m.file_type()))
    }

    fn resolve(&self, path: &Path) -> std::io::Result<PathBuf> {
        fs::canonicalize(path)
    }

    fn read_link(&self, path: &Path) -> Option<PathBuf> {
        fs::read_link(path).ok()
    }

    fn children(
        &self,
        dir: &Entry,
    ) -> Box<dyn Iterator<Item = Result<Entry, LinkmapError>> + '_> {
        let parent = dir.path.clone();
        let depth = dir.depth + 1;

        let walker = WalkBuilder::new(&dir.path)
            .standard_filters(false)
            .hidden(false)
            .parents(false)
            .ignore(false)
            .follow_links(false)
            .max_depth(Some(1))
            .sort_by_file_name(|a, b| a.cmp(b))
            .build();

        Box::new(walker.filter_map(move |res| match res {
            // Skip the directory itself
            Ok(e) if e.depth() == 0 => None,
            Ok(e) => {
                let kind = e
                    .file_type()
                    .map(EntryKind::from_file_type)
                    .unwrap_or(EntryKind::Other);
                Some(Ok(Entry {
                    path: join_child(&parent, e.file_name()),
                    kind,
                    depth,
                }))
            }
            Err(err) => Some(Err(map_ignore_error(err, &parent))),
        }))
    }
}

/// `dir/name`, except that children of `.` are reported bare, the way a
/// shell user would type them.
fn join_child(dir: &Path, name: &OsStr) -> PathBuf {
    if dir == Path::new(".") {
        PathBuf::from(name)
    } else {
        dir.join(name)
    }
}

// ---------------------------------------------------------------------------
// Map ignore::Error to LinkmapError
// ---------------------------------------------------------------------------

fn map_ignore_error(e: ignore::Error, dir: &Path) -> LinkmapError {
    match e {
        ignore::Error::WithPath { path, err } => match *err {
            ignore::Error::Io(io_err) => LinkmapError::from_io(path, io_err),
            other => map_ignore_error(other, &path),
        },
        ignore::Error::WithDepth { err, .. } => map_ignore_error(*err, dir),
        ignore::Error::WithLineNumber { err, .. } => map_ignore_error(*err, dir),
        ignore::Error::Io(io_err) => LinkmapError::from_io(dir.to_path_buf(), io_err),
        other => LinkmapError::Source(other.to_string()),
    }
}
