//! An implementation of the metadata source backed by the host filesystem.

use std::fs::Metadata;
use std::io;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use super::{EntryKind, EntryMeta, EntryPerms, MetadataSource, SourceEntry};

/// Metadata source reading straight from the host filesystem.
///
/// Cache keys are resolved relative to a fixed root, so the cache's
/// normalized paths map onto a concrete directory tree.
#[derive(Debug, Clone)]
pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}

fn meta_from(md: &Metadata) -> EntryMeta {
    let kind = if md.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let mut perms = EntryPerms::READ;
    if !md.permissions().readonly() {
        perms |= EntryPerms::WRITE;
    }
    // Not every platform reports every timestamp; fall back along
    // modified -> epoch rather than failing the whole query.
    let modified = md.modified().unwrap_or(UNIX_EPOCH);
    EntryMeta {
        kind,
        perms,
        size: md.len(),
        accessed: md.accessed().unwrap_or(modified),
        modified,
        created: md.created().unwrap_or(modified),
    }
}

impl MetadataSource for LocalSource {
    fn enumerate(&self, dir: &str) -> io::Result<Vec<SourceEntry>> {
        let mut out = Vec::new();
        for entry in std::fs::read_dir(self.resolve(dir))? {
            let entry = entry?;
            let md = entry.metadata()?;
            out.push(SourceEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                meta: meta_from(&md),
            });
        }
        Ok(out)
    }

    fn stat(&self, path: &str) -> io::Result<EntryMeta> {
        let md = std::fs::symlink_metadata(self.resolve(path))?;
        Ok(meta_from(&md))
    }
}
