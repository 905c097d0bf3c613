#![allow(dead_code, missing_docs, clippy::unwrap_used)]

use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fscache::fs::{EntryKind, EntryMeta, EntryPerms, MetadataSource, SourceEntry};

/// Fixed timestamp so attribute comparisons are deterministic.
pub fn ts(secs: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(secs)
}

pub fn file_meta(size: u64, secs: u64) -> EntryMeta {
    EntryMeta {
        kind: EntryKind::File,
        perms: EntryPerms::READ | EntryPerms::WRITE,
        size,
        accessed: ts(secs),
        modified: ts(secs),
        created: ts(secs),
    }
}

pub fn dir_meta(secs: u64) -> EntryMeta {
    EntryMeta {
        kind: EntryKind::Directory,
        perms: EntryPerms::READ | EntryPerms::WRITE,
        size: 0,
        accessed: ts(secs),
        modified: ts(secs),
        created: ts(secs),
    }
}

/// Scripted metadata source recording every call.
///
/// The directory tree is mutable so tests can change the "filesystem"
/// behind the cache's back.
#[derive(Default)]
pub struct MockSource {
    dirs: Mutex<HashMap<String, Vec<SourceEntry>>>,
    enumerate_calls: AtomicUsize,
    stat_calls: AtomicUsize,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defines (or replaces) the children of `dir`.
    pub fn set_dir(&self, dir: &str, children: Vec<(&str, EntryMeta)>) {
        self.dirs.lock().unwrap().insert(
            dir.to_owned(),
            children
                .into_iter()
                .map(|(name, meta)| SourceEntry {
                    name: name.to_owned(),
                    meta,
                })
                .collect(),
        );
    }

    pub fn enumerate_count(&self) -> usize {
        self.enumerate_calls.load(Ordering::SeqCst)
    }

    pub fn stat_count(&self) -> usize {
        self.stat_calls.load(Ordering::SeqCst)
    }
}

impl MetadataSource for MockSource {
    fn enumerate(&self, dir: &str) -> io::Result<Vec<SourceEntry>> {
        self.enumerate_calls.fetch_add(1, Ordering::SeqCst);
        self.dirs
            .lock()
            .unwrap()
            .get(dir)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such directory"))
    }

    fn stat(&self, path: &str) -> io::Result<EntryMeta> {
        self.stat_calls.fetch_add(1, Ordering::SeqCst);
        let dirs = self.dirs.lock().unwrap();
        if dirs.contains_key(path) {
            return Ok(dir_meta(0));
        }
        let (dir, leaf) = match path.rfind('/') {
            Some(0) => ("/", &path[1..]),
            Some(i) => (&path[..i], &path[i + 1..]),
            None => ("", path),
        };
        dirs.get(dir)
            .and_then(|children| children.iter().find(|c| c.name.eq_ignore_ascii_case(leaf)))
            .map(|c| c.meta)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such path"))
    }
}

/// Wrapper delaying every enumeration, to widen populate race windows.
pub struct SlowSource {
    pub inner: MockSource,
    pub delay: Duration,
}

impl SlowSource {
    pub fn new(inner: MockSource, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl MetadataSource for SlowSource {
    fn enumerate(&self, dir: &str) -> io::Result<Vec<SourceEntry>> {
        std::thread::sleep(self.delay);
        self.inner.enumerate(dir)
    }

    fn stat(&self, path: &str) -> io::Result<EntryMeta> {
        self.inner.stat(path)
    }
}
