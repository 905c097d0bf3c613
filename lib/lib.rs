//! Process-local cache of filesystem metadata for a version-control
//! filesystem access layer.
//!
//! On some filesystems a single-entry metadata query costs nearly as much
//! as enumerating the whole containing directory. [`fs::FsCache`] exploits
//! that: it materializes complete directory listings on first touch,
//! indexes every child in a chained hash table, and answers repeated
//! attribute queries from memory until a listing is invalidated.

/// Filesystem metadata model and caching layers.
pub mod fs;
/// FNV-1 hashing for path keys.
pub mod hash;
pub mod path;
pub mod sync;
/// Chained hash table with automatic growth and shrink.
pub mod table;
