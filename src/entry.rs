use std::path::PathBuf;

/// A single item produced by a [`Resolver`](crate::traits::Resolver) when
/// listing a directory.
///
/// `kind` is classified without following a trailing symlink, so a link to a
/// directory is reported as [`EntryKind::Symlink`], never as `Dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Full path to the entry, as it will appear in emitted mappings.
    pub path: PathBuf,

    /// What kind of entry this is.
    pub kind: EntryKind,

    /// How deep in the traversal this entry was found. Root = 0.
    pub depth: usize,
}

/// The kind of a traversed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A symbolic link, broken or not.
    Symlink,

    /// A directory.
    Dir,

    /// Anything else (regular files, device files, pipes, sockets,
    /// or an entry that vanished before it could be classified).
    Other,
}

impl EntryKind {
    /// Classify from a file type obtained without following links.
    pub fn from_file_type(ft: std::fs::FileType) -> Self {
        if ft.is_symlink() {
            EntryKind::Symlink
        } else if ft.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::Other
        }
    }
}
