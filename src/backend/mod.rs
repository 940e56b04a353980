//! Host-facing backend interface.
//!
//! A caching framework drives its storage through [`CacheBackend`]. Every
//! method reports absence and failure the same way, as `None`, `false` or an
//! empty list, so hosts can probe freely without handling errors.

use crate::cleaning::CleaningMode;
use crate::record::Lifetime;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

mod store_backend;

pub use store_backend::StoreBackend;

/// Static capability descriptor a host reads to decide which features to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub automatic_cleaning: bool,
    pub tags: bool,
    pub expired_read: bool,
    pub priority: bool,
    pub infinite_lifetime: bool,
    pub get_list: bool,
}

/// Entry metadata reported by [`CacheBackend::get_metadatas`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Absolute expiry; `None` for entries that never expire.
    pub expire: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
    /// Last write time.
    pub mtime: DateTime<Utc>,
}

/// Backend contract expected by the host caching framework.
pub trait CacheBackend: Send + Sync {
    /// Payload of `id`, or `None` if absent or unreadable.
    fn load(&self, id: &str) -> impl Future<Output = Option<Vec<u8>>> + Send;

    /// Create or replace `id`. Tags replace any previous tag set.
    fn save(
        &self,
        data: &[u8],
        id: &str,
        tags: &[&str],
        lifetime: Lifetime,
    ) -> impl Future<Output = bool> + Send;

    /// Remove `id`. Removing an absent entry succeeds.
    fn remove(&self, id: &str) -> impl Future<Output = bool> + Send;

    /// Last write time of `id`, or `None` if absent.
    fn test(&self, id: &str) -> impl Future<Output = Option<DateTime<Utc>>> + Send;

    /// Extend the remaining lifetime of `id` by `extra`. `false` if absent.
    fn touch(&self, id: &str, extra: Duration) -> impl Future<Output = bool> + Send;

    /// Remove every entry selected by `mode` and `tags`.
    fn clean(&self, mode: CleaningMode, tags: &[&str]) -> impl Future<Output = bool> + Send;

    fn get_ids(&self) -> impl Future<Output = Vec<String>> + Send;

    fn get_ids_matching_any_tags(&self, tags: &[&str])
        -> impl Future<Output = Vec<String>> + Send;

    fn get_ids_matching_tags(&self, tags: &[&str]) -> impl Future<Output = Vec<String>> + Send;

    fn get_ids_not_matching_tags(&self, tags: &[&str])
        -> impl Future<Output = Vec<String>> + Send;

    /// Every known tag. `None` when the backend cannot list tags.
    fn get_tags(&self) -> impl Future<Output = Option<Vec<String>>> + Send {
        async { None }
    }

    /// Fill level in percent. `0` when the storage is unbounded or unknown.
    fn get_filling_percentage(&self) -> impl Future<Output = u8> + Send {
        async { 0 }
    }

    /// Expiry, tags and last write time of `id`, or `None` if absent.
    fn get_metadatas(&self, id: &str) -> impl Future<Output = Option<Metadata>> + Send;

    fn capabilities(&self) -> Capabilities;
}
