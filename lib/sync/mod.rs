//! Synchronization primitives.
//!
//! Shims between loom and std synchronization primitives.
pub mod atomic;

#[cfg(loom)]
pub use loom::sync::{Arc, Mutex, MutexGuard};

#[cfg(not(loom))]
pub use std::sync::{Arc, Mutex, MutexGuard};
