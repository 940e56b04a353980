//! Record store abstraction and implementations.
//!
//! A record store is the key-value database the backend delegates to. It
//! enforces TTLs itself and offers no tag index, only a full scan of a
//! `(namespace, set)` collection.

use crate::error::Result;
use crate::key::RecordKey;
use crate::record::{Bins, Record};
use futures::stream::BoxStream;
use std::future::Future;
use std::time::Duration;

#[cfg(feature = "inmemory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

#[cfg(feature = "inmemory")]
pub use memory::InMemoryStore;

#[cfg(feature = "redis")]
pub use self::redis::RedisStore;

/// Capabilities the backend consumes from a key-value store.
///
/// Each call is independent; no cross-record atomicity is expected.
pub trait RecordStore: Send + Sync {
    /// Fetch a record. `Ok(None)` when absent or expired.
    fn get(&self, key: &RecordKey) -> impl Future<Output = Result<Option<Record>>> + Send;

    /// Create or replace a record. `ttl` of `None` stores it without expiry.
    fn put(
        &self,
        key: &RecordKey,
        bins: &Bins,
        ttl: Option<Duration>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Delete a record. Deleting an absent record is not an error.
    fn remove(&self, key: &RecordKey) -> impl Future<Output = Result<()>> + Send;

    /// Lazily stream every live record of a collection.
    ///
    /// Records written or removed while the stream is consumed may or may not
    /// be observed.
    fn scan<'a>(&'a self, namespace: &'a str, set: &'a str) -> BoxStream<'a, Result<Record>>;

    /// Release the underlying connection or session.
    fn close(&self);
}
