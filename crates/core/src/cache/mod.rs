//! Versioned response cache and offline submission queue.
//!
//! This module provides the storage side of the cache controller:
//!
//! - Namespaces of request/response pairs keyed by SHA-256 of method + URL
//! - A FIFO queue of submissions awaiting background sync
//! - The controller's lifecycle state per namespace, so restarts resume it
//! - A SQLite backend via tokio-rusqlite, with automatic schema migrations
//! - An in-memory backend sharing the same [`CacheStore`] interface

pub mod connection;
pub mod entries;
pub mod hash;
pub mod memory;
pub mod migrations;
pub mod state;
pub mod store;
pub mod submissions;

pub use crate::Error;

pub use connection::CacheDb;
pub use memory::MemoryStore;
pub use store::{CacheStore, CachedResponse, Lifecycle, NamespaceStats, PendingSubmission, ResponseType};
