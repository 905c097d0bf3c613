//! Directory listing cache keyed by normalized, case-insensitive paths.
//!
//! [`FsCache`] materializes a whole directory listing on the first query
//! that touches it, indexes the head and every child in one
//! [`ChainedTable`], and serves later per-entry queries from memory. One
//! bulk enumeration replaces many single-entry queries, which is the
//! winning trade on filesystems where per-entry metadata is expensive.
//!
//! Staleness is handled with a per-listing counter. An external signal
//! ([`FsCache::mark_changed`], fed manually or by a
//! [`ChangeMonitor`](super::monitor::ChangeMonitor)) flags a listing;
//! queries against a flagged listing are validated against the live
//! filesystem until the validation count passes the configured threshold,
//! at which point the whole listing is evicted and rebuilt on next access.
//! A stale listing is therefore never served past the threshold.

use std::sync::PoisonError;

use tracing::{debug, error};

use crate::path;
use crate::sync::{Arc, Mutex, MutexGuard};
use crate::table::ChainedTable;

use super::entry::{FsEntry, IndexEntry, ListingGroup, PathKey};
use super::{EntryMeta, LookupError, MetadataSource};

/// Tuning knobs for [`FsCache`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Validations tolerated against a stale listing before the whole
    /// listing is evicted and repopulated.
    ///
    /// The default of 8 is an empirical value carried over from the
    /// original tuning; there is no derivation behind it.
    pub stale_threshold: u32,
    /// Expected number of cached index records, used to size the index up
    /// front.
    pub expected_entries: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            stale_threshold: 8,
            expected_entries: 0,
        }
    }
}

struct IndexState {
    table: ChainedTable<IndexEntry>,
    /// Net enable nesting count; the index is live only while positive.
    enabled: u32,
}

/// Outcome of running the staleness protocol against one listing.
enum StaleAction {
    /// The listing is clean; serve from it.
    Fresh,
    /// The listing is stale but under the threshold; answer from the live
    /// filesystem instead.
    Bypass,
    /// The listing crossed the threshold and was evicted; repopulate.
    Evicted,
}

/// Process-local cache of directory listings and per-entry attributes.
///
/// All index mutation happens under one mutex with short critical
/// sections; the enumeration call that populates a fresh listing runs
/// outside the lock so unrelated lookups are not serialized behind real
/// I/O.
///
/// The cache starts disabled. While the net [`enable`](Self::enable) count
/// is zero every query goes straight to the metadata source.
pub struct FsCache<S> {
    source: S,
    stale_threshold: u32,
    state: Mutex<IndexState>,
}

impl<S: MetadataSource> FsCache<S> {
    /// Creates a disabled cache over `source` with default options.
    #[must_use]
    pub fn new(source: S) -> Self {
        Self::with_options(source, CacheOptions::default())
    }

    /// Creates a disabled cache over `source` with explicit options.
    #[must_use]
    pub fn with_options(source: S, options: CacheOptions) -> Self {
        Self {
            source,
            stale_threshold: options.stale_threshold,
            state: Mutex::new(IndexState {
                table: ChainedTable::with_expected_len(options.expected_entries),
                enabled: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, IndexState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Raises the enable nesting count.
    ///
    /// The cache serves from the index only while the net count is
    /// positive. Enabling an already-enabled cache just nests deeper.
    pub fn enable(&self) {
        let mut state = self.lock();
        state.enabled += 1;
    }

    /// Lowers the enable nesting count.
    ///
    /// Reaching zero clears the entire index and releases every listing
    /// group; no other path performs a bulk teardown. Groups with outstanding
    /// [`ReadDir`] handles stay readable through those handles until they
    /// drop.
    pub fn disable(&self) {
        let mut state = self.lock();
        match state.enabled.checked_sub(1) {
            Some(remaining) => {
                state.enabled = remaining;
                if remaining == 0 {
                    Self::clear_index(&mut state);
                }
            }
            None => {
                debug_assert!(false, "cache disabled more times than enabled");
                error!("cache disable without matching enable; ignoring");
            }
        }
    }

    /// Whether the cache is currently active.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled > 0
    }

    /// Enables the cache for the lifetime of the returned guard.
    #[must_use]
    pub fn enable_scope(&self) -> EnabledGuard<'_, S> {
        self.enable();
        EnabledGuard { cache: self }
    }

    /// Number of index records currently cached (heads and children).
    ///
    /// Intended for testing only.
    #[doc(hidden)]
    #[must_use]
    pub fn indexed_len(&self) -> usize {
        self.lock().table.len()
    }

    /// Looks up the attributes of `path`.
    ///
    /// While disabled, the query goes straight to the metadata source.
    /// While enabled, the parent directory's listing is materialized on
    /// first miss and the leaf is answered from memory afterwards.
    /// Unresolvable paths and enumeration failures surface as
    /// [`LookupError::NotFound`]; population is never retried within one
    /// call, the next lookup starts over.
    pub fn lookup(&self, path: &str) -> Result<EntryMeta, LookupError> {
        if !self.is_enabled() {
            return self.stat_direct(path);
        }
        let Some(normalized) = path::normalize(path) else {
            return Err(LookupError::NotFound);
        };
        let (dir, leaf) = path::split(&normalized);
        if leaf.is_empty() {
            return Err(LookupError::NotFound);
        }

        if let Some((group, meta)) = self.probe_child(dir, leaf) {
            match self.staleness_action(&group) {
                StaleAction::Fresh => return Ok(meta),
                StaleAction::Bypass => return self.stat_direct(&normalized),
                StaleAction::Evicted => {}
            }
        }

        // Miss (or just evicted): make sure the parent listing is cached.
        let group = self.lease_listing(dir)?;

        // The leased listing may predate this call and already be stale;
        // run the same protocol before trusting it.
        let group = match self.staleness_action(&group) {
            StaleAction::Fresh => group,
            StaleAction::Bypass => return self.stat_direct(&normalized),
            StaleAction::Evicted => self.lease_listing(dir)?,
        };

        // Re-probe the index (a racing repopulate may have produced newer
        // data); fall back to the leased listing, which stays answerable
        // even if a racing disable kept it out of the index.
        match self.probe_child(dir, leaf) {
            Some((_, meta)) => Ok(meta),
            None => group
                .find(leaf)
                .map(FsEntry::meta)
                .ok_or(LookupError::NotFound),
        }
    }

    /// Opens a cursor over the listing of `path`.
    ///
    /// The cursor leases the listing group: a later eviction or full clear
    /// only unlinks the group from the index, and the group stays readable
    /// through the cursor until it is dropped. While disabled, the listing
    /// is enumerated directly and never indexed.
    pub fn open_dir(&self, path: &str) -> Result<ReadDir, LookupError> {
        let Some(normalized) = path::normalize(path) else {
            return Err(LookupError::NotFound);
        };
        if !self.is_enabled() {
            let group = Arc::new(self.build_listing(&normalized)?);
            return Ok(ReadDir::new(group));
        }
        let group = self.lease_listing(&normalized)?;
        Ok(ReadDir::new(group))
    }

    /// Records that `raw_path` changed on the real filesystem.
    ///
    /// Marks the owning listing stale: the exact entry's listing if the
    /// path is a cached child, the path's own listing if it is a cached
    /// directory, or the parent directory's listing otherwise. Unknown
    /// paths are ignored; duplicate notifications are no-ops.
    pub fn mark_changed(&self, raw_path: &str) {
        let Some(normalized) = path::normalize(raw_path) else {
            return;
        };
        let (dir, leaf) = path::split(&normalized);
        let state = self.lock();
        let hit = if leaf.is_empty() {
            None
        } else {
            state.table.get(&PathKey::child(dir, leaf))
        };
        let hit = hit
            .or_else(|| state.table.get(&PathKey::head(&normalized)))
            .or_else(|| state.table.get(&PathKey::head(dir)));
        if let Some(entry) = hit {
            entry.group().mark_modified();
        }
    }

    /// Queries the source directly, folding `NotFound`-kind I/O errors into
    /// the cache's uniform not-found result.
    fn stat_direct(&self, path: &str) -> Result<EntryMeta, LookupError> {
        match self.source.stat(path) {
            Ok(meta) => Ok(meta),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(LookupError::NotFound),
            Err(e) => Err(LookupError::Io(e)),
        }
    }

    /// Probes the index for a child entry, returning its owning group and
    /// attributes.
    fn probe_child(&self, dir: &str, name: &str) -> Option<(Arc<ListingGroup>, EntryMeta)> {
        let state = self.lock();
        let entry = state.table.get(&PathKey::child(dir, name))?;
        let meta = entry.entry()?.meta();
        Some((Arc::clone(entry.group()), meta))
    }

    /// Applies the staleness protocol to `group`.
    ///
    /// A clean listing is served as-is. A flagged listing is validated
    /// against the live filesystem until the validation count passes the
    /// threshold, then the whole group is evicted so the next access
    /// repopulates it.
    fn staleness_action(&self, group: &Arc<ListingGroup>) -> StaleAction {
        if group.modification_count() == 0 {
            return StaleAction::Fresh;
        }
        if group.note_validation() > self.stale_threshold {
            debug!(dir = group.dir(), "stale listing crossed threshold; evicting");
            let mut state = self.lock();
            Self::evict_group(&mut state, group);
            StaleAction::Evicted
        } else {
            StaleAction::Bypass
        }
    }

    /// Returns the cached listing for `dir`, populating it on miss.
    ///
    /// The enumeration runs outside the index lock. The lock is retaken to
    /// insert, re-checking for a racing populate of the same directory:
    /// the first build to land wins and a redundant build is discarded. A
    /// populate that completes after the cache was disabled is handed to
    /// the caller without being indexed.
    fn lease_listing(&self, dir: &str) -> Result<Arc<ListingGroup>, LookupError> {
        {
            let state = self.lock();
            if let Some(entry) = state.table.get(&PathKey::head(dir)) {
                return Ok(Arc::clone(entry.group()));
            }
        }

        let group = Arc::new(self.build_listing(dir)?);

        let mut state = self.lock();
        if let Some(entry) = state.table.get(&PathKey::head(dir)) {
            return Ok(Arc::clone(entry.group()));
        }
        if state.enabled == 0 {
            return Ok(group);
        }
        Self::index_group(&mut state, &group);
        Ok(group)
    }

    /// Enumerates `dir` and materializes its listing group.
    fn build_listing(&self, dir: &str) -> Result<ListingGroup, LookupError> {
        let children = self.source.enumerate(dir).map_err(|e| {
            debug!(dir, error = %e, "directory enumeration failed");
            LookupError::NotFound
        })?;
        Ok(ListingGroup::new(
            dir.to_owned(),
            children
                .into_iter()
                .map(|c| FsEntry::new(c.name, c.meta))
                .collect(),
        ))
    }

    /// Inserts a group's head and every child into the index.
    fn index_group(state: &mut IndexState, group: &Arc<ListingGroup>) {
        state.table.put(IndexEntry::head(group));
        for i in 0..group.children().len() {
            state.table.put(IndexEntry::child(group, i));
        }
    }

    /// Unlinks `group` from the index if it is still the resident listing
    /// for its directory.
    ///
    /// The residency check guards against a race where another thread
    /// already evicted this group and indexed a fresh one under the same
    /// keys.
    fn evict_group(state: &mut IndexState, group: &Arc<ListingGroup>) {
        let resident = state
            .table
            .get(&PathKey::head(group.dir()))
            .is_some_and(|entry| Arc::ptr_eq(entry.group(), group));
        if resident {
            Self::remove_group(state, group);
        }
    }

    /// Removes a whole listing group (head and children) from the index.
    fn remove_group(state: &mut IndexState, group: &ListingGroup) {
        let dir = group.dir();
        state.table.remove(&PathKey::head(dir));
        for child in group.children() {
            state.table.remove(&PathKey::child(dir, child.name()));
        }
    }

    /// Removes every listing group from the index.
    ///
    /// Every index record belongs to exactly one group, so removing groups
    /// until none is found must empty the table; a leftover record is an
    /// invariant violation.
    fn clear_index(state: &mut IndexState) {
        loop {
            let Some(group) = state.table.iter().next().map(|e| Arc::clone(e.group())) else {
                break;
            };
            Self::remove_group(state, &group);
        }
        if !state.table.is_empty() {
            debug_assert!(false, "index not empty after removing every listing group");
            error!(
                leftover = state.table.len(),
                "index not empty after full clear; dropping leftovers"
            );
            state.table.clear();
        }
    }
}

/// RAII pairing of [`FsCache::enable`] and [`FsCache::disable`].
pub struct EnabledGuard<'a, S: MetadataSource> {
    cache: &'a FsCache<S>,
}

impl<S: MetadataSource> Drop for EnabledGuard<'_, S> {
    fn drop(&mut self) {
        self.cache.disable();
    }
}

/// Cursor over one directory listing, yielding children in enumeration
/// order.
///
/// Dropping the cursor releases its lease on the listing group.
pub struct ReadDir {
    group: Arc<ListingGroup>,
    pos: usize,
}

impl ReadDir {
    fn new(group: Arc<ListingGroup>) -> Self {
        Self { group, pos: 0 }
    }

    /// Advances to the next child.
    ///
    /// Returns `None` at the end of the listing; advancing past the end
    /// stays at `None`.
    pub fn advance(&mut self) -> Option<&FsEntry> {
        let entry = self.group.children().get(self.pos)?;
        self.pos += 1;
        Some(entry)
    }

    /// Normalized path of the directory this cursor iterates.
    #[must_use]
    pub fn dir(&self) -> &str {
        self.group.dir()
    }
}
