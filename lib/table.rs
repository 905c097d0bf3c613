//! Chained hash table with automatic growth and shrink.
//!
//! [`ChainedTable`] is a separate-chaining table over an index-based slot
//! arena: bucket chains are slot-index links rather than pointers, and
//! freed slots are recycled through a free list. Entries carry a
//! precomputed 32-bit hash that is compared before the full equality check,
//! so chain walks stay cheap even with an expensive key comparison.
//!
//! The bucket array is always a power of two, at least [`MIN_BUCKETS`]. It
//! quadruples once the live count exceeds 80% of the bucket count and
//! shrinks to a quarter once the live count falls below one sixth of it,
//! never dropping under the minimum.

/// Lookup key for entries of type `E`.
///
/// Stored entries implement `TableKey<Self>`: an entry is its own key.
/// Borrowed probe types can implement `TableKey<E>` too, so querying the
/// table never has to allocate an owned entry.
pub trait TableKey<E> {
    /// Precomputed 32-bit hash of this key.
    ///
    /// Keys that compare equal via [`matches`](Self::matches) must hash
    /// equally.
    fn hash(&self) -> u32;

    /// Full equality check against a stored entry. Only consulted when the
    /// 32-bit hashes already match.
    fn matches(&self, entry: &E) -> bool;
}

/// Smallest bucket count a table ever uses.
pub const MIN_BUCKETS: usize = 64;

/// Grow and shrink move the bucket count by two binary orders of magnitude.
const RESIZE_SHIFT: usize = 2;

/// Shrink once `len * SHRINK_AT` falls below the bucket count.
const SHRINK_AT: usize = 6;

/// Sentinel for "no slot" in bucket heads and chain links.
const NIL: usize = usize::MAX;

struct Slot<E> {
    hash: u32,
    /// Next slot in the same bucket chain, or the next free slot while this
    /// slot sits on the free list.
    next: usize,
    entry: Option<E>,
}

/// Separate-chaining hash table with pluggable key equality.
pub struct ChainedTable<E> {
    buckets: Vec<usize>,
    slots: Vec<Slot<E>>,
    free: usize,
    len: usize,
}

impl<E> Default for ChainedTable<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> ChainedTable<E> {
    /// Creates an empty table at the minimum bucket count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_expected_len(0)
    }

    /// Creates an empty table sized so that `expected` entries stay under
    /// the grow watermark.
    #[must_use]
    pub fn with_expected_len(expected: usize) -> Self {
        let mut buckets = MIN_BUCKETS;
        let target = expected + expected / 4;
        while target > buckets {
            buckets <<= RESIZE_SHIFT;
        }
        Self {
            buckets: vec![NIL; buckets],
            slots: Vec::new(),
            free: NIL,
            len: 0,
        }
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the table holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bucket count. Always a power of two, at least
    /// [`MIN_BUCKETS`].
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Drops every entry and resets the table to its minimum size.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.buckets.resize(MIN_BUCKETS, NIL);
        self.slots.clear();
        self.free = NIL;
        self.len = 0;
    }

    /// Looks up the first entry matching `key`.
    #[must_use]
    pub fn get<K>(&self, key: &K) -> Option<&E>
    where
        K: TableKey<E> + ?Sized,
    {
        self.find_slot(key)
            .and_then(|idx| self.slots[idx].entry.as_ref())
    }

    /// Inserts `entry`, replacing any resident entry equal to it.
    ///
    /// On replace the new entry takes the old one's chain position and the
    /// displaced entry is returned; the live count does not change. On a
    /// fresh insert the entry is prepended to its bucket chain and the
    /// table grows if the load watermark is crossed.
    pub fn put(&mut self, entry: E) -> Option<E>
    where
        E: TableKey<E>,
    {
        if let Some(idx) = self.find_slot(&entry) {
            return self.slots[idx].entry.replace(entry);
        }
        self.insert_new(entry);
        None
    }

    /// Inserts `entry` without checking for an equal resident entry.
    ///
    /// Callers that intentionally keep multiple entries per key use this;
    /// [`get`](Self::get) then returns the most recently added match.
    pub fn add(&mut self, entry: E)
    where
        E: TableKey<E>,
    {
        self.insert_new(entry);
    }

    /// Removes and returns the first entry matching `key`.
    ///
    /// Shrinks the table once the live count falls below the low
    /// watermark, never under the minimum bucket count.
    pub fn remove<K>(&mut self, key: &K) -> Option<E>
    where
        K: TableKey<E> + ?Sized,
    {
        let hash = key.hash();
        let bucket = self.bucket_of(hash);

        let mut prev = NIL;
        let mut idx = self.buckets[bucket];
        while idx != NIL {
            let slot = &self.slots[idx];
            if slot.hash == hash && slot.entry.as_ref().is_some_and(|e| key.matches(e)) {
                break;
            }
            prev = idx;
            idx = slot.next;
        }
        if idx == NIL {
            return None;
        }

        let next = self.slots[idx].next;
        if prev == NIL {
            self.buckets[bucket] = next;
        } else {
            self.slots[prev].next = next;
        }
        let entry = self.free_slot(idx);
        self.len -= 1;

        if self.buckets.len() > MIN_BUCKETS && self.len * SHRINK_AT < self.buckets.len() {
            let shrunk = self.buckets.len() >> RESIZE_SHIFT;
            self.resize(shrunk);
        }
        entry
    }

    /// Bucket-major iterator over live entries, chain order within a
    /// bucket.
    ///
    /// The iterator borrows the table, so mutation during iteration is
    /// rejected at compile time.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, E> {
        Iter {
            table: self,
            bucket: 0,
            idx: NIL,
        }
    }

    fn bucket_of(&self, hash: u32) -> usize {
        hash as usize & (self.buckets.len() - 1)
    }

    fn find_slot<K>(&self, key: &K) -> Option<usize>
    where
        K: TableKey<E> + ?Sized,
    {
        let hash = key.hash();
        let mut idx = self.buckets[self.bucket_of(hash)];
        while idx != NIL {
            let slot = &self.slots[idx];
            if slot.hash == hash && slot.entry.as_ref().is_some_and(|e| key.matches(e)) {
                return Some(idx);
            }
            idx = slot.next;
        }
        None
    }

    fn insert_new(&mut self, entry: E)
    where
        E: TableKey<E>,
    {
        let hash = entry.hash();
        let bucket = self.bucket_of(hash);
        let head = self.buckets[bucket];
        let idx = self.alloc_slot(hash, entry, head);
        self.buckets[bucket] = idx;
        self.len += 1;

        if self.len + self.len / 4 > self.buckets.len() {
            let grown = self.buckets.len() << RESIZE_SHIFT;
            self.resize(grown);
        }
    }

    fn alloc_slot(&mut self, hash: u32, entry: E, next: usize) -> usize {
        if self.free == NIL {
            self.slots.push(Slot {
                hash,
                next,
                entry: Some(entry),
            });
            self.slots.len() - 1
        } else {
            let idx = self.free;
            let slot = &mut self.slots[idx];
            self.free = slot.next;
            slot.hash = hash;
            slot.next = next;
            slot.entry = Some(entry);
            idx
        }
    }

    fn free_slot(&mut self, idx: usize) -> Option<E> {
        let slot = &mut self.slots[idx];
        let entry = slot.entry.take();
        slot.next = self.free;
        self.free = idx;
        entry
    }

    /// Relinks every entry into a bucket array of `new_len` buckets.
    ///
    /// Entries stay in their slots; only bucket heads and chain links are
    /// rewritten. Chains are appended tail-first, so entries that land in
    /// the same new bucket keep their relative order.
    fn resize(&mut self, new_len: usize) {
        let old_buckets = std::mem::replace(&mut self.buckets, vec![NIL; new_len]);
        let mut tails = vec![NIL; new_len];

        for head in old_buckets {
            let mut idx = head;
            while idx != NIL {
                let next = self.slots[idx].next;
                let bucket = self.slots[idx].hash as usize & (new_len - 1);
                self.slots[idx].next = NIL;
                if tails[bucket] == NIL {
                    self.buckets[bucket] = idx;
                } else {
                    let tail = tails[bucket];
                    self.slots[tail].next = idx;
                }
                tails[bucket] = idx;
                idx = next;
            }
        }
    }
}

impl<'a, E> IntoIterator for &'a ChainedTable<E> {
    type Item = &'a E;
    type IntoIter = Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`ChainedTable::iter`].
pub struct Iter<'a, E> {
    table: &'a ChainedTable<E>,
    bucket: usize,
    idx: usize,
}

impl<'a, E> Iterator for Iter<'a, E> {
    type Item = &'a E;

    fn next(&mut self) -> Option<&'a E> {
        loop {
            if self.idx != NIL {
                let slot = &self.table.slots[self.idx];
                self.idx = slot.next;
                if let Some(entry) = slot.entry.as_ref() {
                    return Some(entry);
                }
            }
            if self.bucket >= self.table.buckets.len() {
                return None;
            }
            self.idx = self.table.buckets[self.bucket];
            self.bucket += 1;
        }
    }
}
