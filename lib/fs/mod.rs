//! Filesystem metadata model and caching layers.

/// Directory listing cache keyed by normalized, case-insensitive paths.
pub mod dircache;
/// Cached entry and listing-group model.
pub mod entry;
/// Host-filesystem metadata source.
pub mod local;
/// Change-notification feed driving active invalidation.
pub mod monitor;

pub use dircache::{CacheOptions, EnabledGuard, FsCache, ReadDir};
pub use entry::{FsEntry, ListingGroup};
pub use local::LocalSource;
pub use monitor::ChangeMonitor;

use std::io;
use std::time::SystemTime;

use bitflags::bitflags;
use thiserror::Error;

bitflags! {
    /// Coarse permission bits for a cached entry.
    ///
    /// The backing filesystems this layer targets only expose a read-only
    /// attribute, so anything finer-grained than read/write would be
    /// invented.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryPerms: u8 {
        /// Entry is readable.
        const READ = 1 << 0;
        /// Entry is writable.
        const WRITE = 1 << 1;
    }
}

/// The type of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A directory.
    Directory,
}

/// Portable stat-equivalent attributes for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryMeta {
    /// Whether this entry is a file or a directory.
    pub kind: EntryKind,
    /// Coarse permission bits.
    pub perms: EntryPerms,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// Last access time.
    pub accessed: SystemTime,
    /// Last modification time.
    pub modified: SystemTime,
    /// Creation time.
    pub created: SystemTime,
}

impl EntryMeta {
    /// Returns `true` if this entry is a directory.
    #[must_use]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// A single child produced by directory enumeration.
#[derive(Debug, Clone)]
pub struct SourceEntry {
    /// Name of the child within its directory, case preserved.
    pub name: String,
    /// Attributes reported by the enumeration.
    pub meta: EntryMeta,
}

/// Raw metadata access consumed by the cache.
///
/// Implementations are expected to be dumb: one blocking call per
/// operation, an error (never a stale success) for nonexistent or
/// inaccessible paths, and no caching of their own.
pub trait MetadataSource: Send + Sync {
    /// Enumerates `dir`, yielding every child with its attributes.
    fn enumerate(&self, dir: &str) -> io::Result<Vec<SourceEntry>>;

    /// Queries a single path's attributes, bypassing any cache.
    fn stat(&self, path: &str) -> io::Result<EntryMeta>;
}

impl<S: MetadataSource + ?Sized> MetadataSource for std::sync::Arc<S> {
    fn enumerate(&self, dir: &str) -> io::Result<Vec<SourceEntry>> {
        (**self).enumerate(dir)
    }

    fn stat(&self, path: &str) -> io::Result<EntryMeta> {
        (**self).stat(path)
    }
}

/// Errors surfaced by cache lookups.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The path does not exist, could not be normalized, or its directory
    /// could not be enumerated. These are deliberately indistinguishable:
    /// the next lookup retries population from scratch either way.
    #[error("path not found")]
    NotFound,

    /// An I/O failure from a direct metadata query, surfaced unchanged.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
