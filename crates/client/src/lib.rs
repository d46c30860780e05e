//! Client code for folio-sw.
//!
//! This crate provides the network layer and the offline cache controller
//! shared by the server.

pub mod controller;
pub mod fetch;

pub use controller::{
    CacheController, Event, EventOutcome, HandledEvent, Lifecycle, Notification, RequestClass, SubmitOutcome,
    SyncReport, WaitUntil,
};

pub use fetch::{Destination, FetchConfig, HttpNetwork, Network, NetworkError, Request, Response};

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
