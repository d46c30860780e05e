//! Core types and shared functionality for folio-sw.
//!
//! This crate provides:
//! - Cache store interface with SQLite and in-memory backends
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{
    CacheDb, CacheStore, CachedResponse, Lifecycle, MemoryStore, NamespaceStats, PendingSubmission, ResponseType,
};
pub use config::{AppConfig, ConfigError, OFFLINE_MESSAGE};
pub use error::Error;
