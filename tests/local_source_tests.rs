#![allow(clippy::unwrap_used, missing_docs)]

use std::collections::BTreeSet;

use fscache::fs::{EntryKind, FsCache, LocalSource, LookupError, MetadataSource as _};

#[test]
fn enumerate_and_stat_a_real_directory() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("a.txt"), b"0123456789").unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();

    let src = LocalSource::new(tmp.path());

    let mut entries = src.enumerate("").unwrap();
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].name, "a.txt");
    assert_eq!(entries[0].meta.kind, EntryKind::File);
    assert_eq!(entries[0].meta.size, 10);
    assert_eq!(entries[1].name, "sub");
    assert_eq!(entries[1].meta.kind, EntryKind::Directory);

    let meta = src.stat("a.txt").unwrap();
    assert_eq!(meta.kind, EntryKind::File);
    assert_eq!(meta.size, 10);

    assert!(src.stat("missing").is_err());
    assert!(src.enumerate("missing_dir").is_err());
}

#[test]
fn cache_over_a_real_directory_end_to_end() {
    let tmp = tempfile::tempdir().unwrap();
    std::fs::write(tmp.path().join("a.txt"), b"0123456789").unwrap();
    std::fs::create_dir(tmp.path().join("sub")).unwrap();
    std::fs::write(tmp.path().join("sub").join("inner.txt"), b"abc").unwrap();

    let cache = FsCache::new(LocalSource::new(tmp.path()));
    cache.enable();

    let meta = cache.lookup("a.txt").unwrap();
    assert_eq!(meta.kind, EntryKind::File);
    assert_eq!(meta.size, 10);

    assert_eq!(cache.lookup("sub/inner.txt").unwrap().size, 3);

    assert!(matches!(cache.lookup("missing"), Err(LookupError::NotFound)));

    // Host enumeration order is arbitrary; compare as a set.
    let mut dir = cache.open_dir("").unwrap();
    let mut names = BTreeSet::new();
    while let Some(entry) = dir.advance() {
        names.insert(entry.name().to_owned());
    }
    assert_eq!(
        names,
        BTreeSet::from(["a.txt".to_owned(), "sub".to_owned()])
    );
}
