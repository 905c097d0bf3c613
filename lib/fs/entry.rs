//! Cached entry and listing-group model.
//!
//! A directory's contents are materialized as one [`ListingGroup`]: the
//! directory head plus every child from a single enumeration, sharing one
//! allocation lifetime. The cache index holds one record per head and one
//! per child, all pointing at the same group, so a group is unlinked from
//! the index as a unit and freed when the last handle drops.

use crate::hash;
use crate::sync::Arc;
use crate::sync::atomic::{AtomicU32, Ordering};
use crate::table::TableKey;

use super::EntryMeta;

/// One cached child of a directory listing.
#[derive(Debug, Clone)]
pub struct FsEntry {
    name: String,
    meta: EntryMeta,
}

impl FsEntry {
    pub(crate) fn new(name: String, meta: EntryMeta) -> Self {
        Self { name, meta }
    }

    /// Case-preserved name of this entry within its directory.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cached attributes of this entry.
    #[must_use]
    pub fn meta(&self) -> EntryMeta {
        self.meta
    }
}

/// A directory head plus every child from one enumeration.
///
/// Children keep enumeration order. The modification counter starts at
/// zero (clean) and, once the listing has been flagged as externally
/// modified, counts the validations performed against the live filesystem
/// since.
#[derive(Debug)]
pub struct ListingGroup {
    dir: String,
    dir_hash: u32,
    children: Vec<FsEntry>,
    modified: AtomicU32,
}

impl ListingGroup {
    pub(crate) fn new(dir: String, children: Vec<FsEntry>) -> Self {
        let dir_hash = hash::fnv32_ci(&dir);
        Self {
            dir,
            dir_hash,
            children,
            modified: AtomicU32::new(0),
        }
    }

    /// Normalized directory path this listing describes.
    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Children in enumeration order.
    #[must_use]
    pub fn children(&self) -> &[FsEntry] {
        &self.children
    }

    pub(crate) fn dir_hash(&self) -> u32 {
        self.dir_hash
    }

    /// Finds a child by ASCII-case-insensitive name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&FsEntry> {
        self.children
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Flags this listing as externally modified. Idempotent: re-marking
    /// an already-stale listing keeps its validation count.
    pub(crate) fn mark_modified(&self) {
        let _ = self
            .modified
            .compare_exchange(0, 1, Ordering::AcqRel, Ordering::Relaxed);
    }

    pub(crate) fn modification_count(&self) -> u32 {
        self.modified.load(Ordering::Acquire)
    }

    /// Counts one more validation against a stale listing, returning the
    /// new total.
    pub(crate) fn note_validation(&self) -> u32 {
        self.modified.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Hash of a child `name` under a listing whose own hash is `dir_hash`.
///
/// A separator is folded into the continuation so `("ab", "c")` and
/// `("a", "bc")` cannot alias.
fn child_hash(dir_hash: u32, name: &str) -> u32 {
    hash::fnv32_ci_seeded(hash::fnv32_ci_seeded(dir_hash, "/"), name)
}

/// One index record: a listing head (`child == None`) or one child.
#[derive(Debug, Clone)]
pub(crate) struct IndexEntry {
    hash: u32,
    group: Arc<ListingGroup>,
    child: Option<usize>,
}

impl IndexEntry {
    pub(crate) fn head(group: &Arc<ListingGroup>) -> Self {
        Self {
            hash: group.dir_hash(),
            group: Arc::clone(group),
            child: None,
        }
    }

    pub(crate) fn child(group: &Arc<ListingGroup>, index: usize) -> Self {
        let hash = child_hash(group.dir_hash(), group.children()[index].name());
        Self {
            hash,
            group: Arc::clone(group),
            child: Some(index),
        }
    }

    pub(crate) fn group(&self) -> &Arc<ListingGroup> {
        &self.group
    }

    /// The child this record indexes, or `None` for a listing head.
    pub(crate) fn entry(&self) -> Option<&FsEntry> {
        self.child.map(|i| &self.group.children()[i])
    }

    fn name(&self) -> Option<&str> {
        self.entry().map(FsEntry::name)
    }
}

impl TableKey<IndexEntry> for IndexEntry {
    fn hash(&self) -> u32 {
        self.hash
    }

    fn matches(&self, entry: &IndexEntry) -> bool {
        keys_equal(self.group.dir(), self.name(), entry.group.dir(), entry.name())
    }
}

/// Borrowed probe key for index queries; constructing one never allocates.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PathKey<'a> {
    dir: &'a str,
    name: Option<&'a str>,
    hash: u32,
}

impl<'a> PathKey<'a> {
    /// Key of the listing head for `dir`.
    pub(crate) fn head(dir: &'a str) -> Self {
        Self {
            dir,
            name: None,
            hash: hash::fnv32_ci(dir),
        }
    }

    /// Key of the child `name` within `dir`.
    pub(crate) fn child(dir: &'a str, name: &'a str) -> Self {
        Self {
            dir,
            name: Some(name),
            hash: child_hash(hash::fnv32_ci(dir), name),
        }
    }
}

impl TableKey<IndexEntry> for PathKey<'_> {
    fn hash(&self) -> u32 {
        self.hash
    }

    fn matches(&self, entry: &IndexEntry) -> bool {
        keys_equal(self.dir, self.name, entry.group.dir(), entry.name())
    }
}

/// Case-insensitive equality over (directory, name) pairs. Heads carry no
/// name and never match children.
fn keys_equal(dir_a: &str, name_a: Option<&str>, dir_b: &str, name_b: Option<&str>) -> bool {
    if !dir_a.eq_ignore_ascii_case(dir_b) {
        return false;
    }
    match (name_a, name_b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}
