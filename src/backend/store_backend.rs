//! Backend adapter over a [`RecordStore`].

use super::{CacheBackend, Capabilities, Metadata};
use crate::builder::SaveBuilder;
use crate::cleaning::{CleaningMode, TagFilter};
use crate::config::BackendConfig;
use crate::error::Result;
use crate::key::RecordKey;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::record::{now_seconds, Bins, Lifetime, Record, MAX_TTL};
use crate::scan::{self, CleanReport};
use crate::store::RecordStore;
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};

const CAPABILITIES: Capabilities = Capabilities {
    automatic_cleaning: false,
    tags: true,
    expired_read: false,
    priority: false,
    infinite_lifetime: true,
    get_list: false,
};

/// Tag-aware cache backend over any [`RecordStore`].
///
/// Owns its store for its whole life: the store is closed exactly once, when
/// the backend is dropped.
///
/// The `try_*` methods expose the fallible core. The [`CacheBackend`] methods
/// wrap them and collapse every error into a negative result.
///
/// # Example
///
/// ```
/// # use tagstore::backend::{CacheBackend, StoreBackend};
/// # use tagstore::cleaning::CleaningMode;
/// # use tagstore::config::BackendConfig;
/// # use tagstore::record::Lifetime;
/// # async fn example() -> tagstore::Result<()> {
/// let backend = StoreBackend::in_memory(BackendConfig::default())?;
///
/// backend.save(b"<div>menu</div>", "block_menu", &["layout"], Lifetime::Default).await;
/// assert!(backend.load("block_menu").await.is_some());
///
/// backend.clean(CleaningMode::MatchingAnyTag, &["layout"]).await;
/// assert!(backend.load("block_menu").await.is_none());
/// # Ok(())
/// # }
/// ```
pub struct StoreBackend<S: RecordStore> {
    store: S,
    config: BackendConfig,
    metrics: Box<dyn CacheMetrics>,
}

impl<S: RecordStore> StoreBackend<S> {
    /// Wrap an open store.
    ///
    /// The backend closes `store` when dropped. Stores whose clones share a
    /// connection (such as `InMemoryStore` or a pooled store) are closed for
    /// every clone, so backends sharing one store must all be dropped together.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` if `config` fails validation. The store is
    /// closed before returning in that case.
    pub fn new(store: S, config: BackendConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            store.close();
            return Err(e);
        }

        info!(
            "✓ Tagged backend ready for {}:{}",
            config.namespace, config.set
        );

        Ok(StoreBackend {
            store,
            config,
            metrics: Box::new(NoOpMetrics),
        })
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Box<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Get store reference (for advanced use).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start a fluent save of `id`.
    pub fn entry<'a>(&'a self, id: &'a str) -> SaveBuilder<'a, S> {
        SaveBuilder::new(self, id)
    }

    fn key(&self, id: &str) -> Result<RecordKey> {
        RecordKey::new(&self.config.namespace, &self.config.set, id)
    }

    /// Fetch the full record for `id`.
    pub async fn try_fetch(&self, id: &str) -> Result<Option<Record>> {
        let key = self.key(id)?;
        self.store.get(&key).await
    }

    pub async fn try_load(&self, id: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.try_fetch(id).await?.map(|record| record.bins.data))
    }

    pub async fn try_save(
        &self,
        data: &[u8],
        id: &str,
        tags: &[&str],
        lifetime: Lifetime,
    ) -> Result<()> {
        let key = self.key(id)?;
        let ttl = lifetime.resolve(self.config.default_lifetime());
        self.store.put(&key, &Bins::new(id, data, tags), ttl).await
    }

    pub async fn try_remove(&self, id: &str) -> Result<()> {
        let key = self.key(id)?;
        self.store.remove(&key).await
    }

    /// Rewrite `id` with its remaining lifetime extended by `extra`.
    ///
    /// `Ok(false)` if the entry is absent. Entries without expiry stay that
    /// way. The rewrite is a full save, so the write time is refreshed.
    pub async fn try_touch(&self, id: &str, extra: Duration) -> Result<bool> {
        let Some(record) = self.try_fetch(id).await? else {
            return Ok(false);
        };

        let ttl = record
            .ttl
            .map(|remaining| remaining.saturating_add(extra).min(MAX_TTL));
        let bins = Bins {
            time: now_seconds(),
            ..record.bins
        };

        self.store.put(&record.key, &bins, ttl).await?;
        debug!("✓ Touched {} (TTL: {:?})", id, ttl);
        Ok(true)
    }

    /// Remove every entry selected by `mode` and `tags`.
    pub async fn try_clean(&self, mode: CleaningMode, tags: &[&str]) -> Result<CleanReport> {
        let filter = TagFilter::new(mode, tags);
        scan::remove_matching(&self.store, &self.config.namespace, &self.config.set, &filter)
            .await
    }

    /// Ids of every entry selected by `mode` and `tags`.
    pub async fn try_get_ids(&self, mode: CleaningMode, tags: &[&str]) -> Result<Vec<String>> {
        let filter = TagFilter::new(mode, tags);
        scan::collect_ids(&self.store, &self.config.namespace, &self.config.set, &filter).await
    }

    /// Turn a failed call into `None`, logging it and reporting it to metrics.
    fn collapse<T>(&self, operation: &str, id: &str, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("✗ {} failed for {}: {}", operation, id, e);
                self.metrics.record_error(operation, &e.to_string());
                None
            }
        }
    }

    async fn fetch(&self, operation: &str, id: &str) -> Option<Record> {
        let result = self.try_fetch(id).await;
        self.collapse(operation, id, result).flatten()
    }

    async fn ids(&self, mode: CleaningMode, tags: &[&str]) -> Vec<String> {
        let result = self.try_get_ids(mode, tags).await;
        self.collapse("get_ids", mode.as_str(), result)
            .unwrap_or_default()
    }
}

#[cfg(feature = "inmemory")]
impl StoreBackend<crate::store::InMemoryStore> {
    /// Backend over a fresh in-memory store.
    pub fn in_memory(config: BackendConfig) -> Result<Self> {
        Self::new(crate::store::InMemoryStore::new(), config)
    }
}

#[cfg(feature = "redis")]
impl StoreBackend<crate::store::RedisStore> {
    /// Connect to the first configured Redis host.
    ///
    /// # Errors
    /// Returns `Err` if the configuration is invalid or the pool cannot be built
    pub async fn connect(config: BackendConfig) -> Result<Self> {
        config.validate()?;
        let store = crate::store::RedisStore::connect(&config).await?;
        Self::new(store, config)
    }
}

impl<S: RecordStore> Drop for StoreBackend<S> {
    fn drop(&mut self) {
        self.store.close();
        debug!(
            "Tagged backend for {}:{} released its store",
            self.config.namespace, self.config.set
        );
    }
}

/// Absolute expiry for a remaining lifetime, measured from `now`.
fn expiry_from(now: DateTime<Utc>, ttl: Option<Duration>) -> Option<DateTime<Utc>> {
    let remaining = ttl?;
    let expire = chrono::Duration::from_std(remaining)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);
    Some(expire)
}

impl<S: RecordStore> CacheBackend for StoreBackend<S> {
    async fn load(&self, id: &str) -> Option<Vec<u8>> {
        let timer = Instant::now();

        match self.fetch("load", id).await {
            Some(record) => {
                self.metrics.record_hit(id, timer.elapsed());
                Some(record.bins.data)
            }
            None => {
                self.metrics.record_miss(id, timer.elapsed());
                None
            }
        }
    }

    async fn save(&self, data: &[u8], id: &str, tags: &[&str], lifetime: Lifetime) -> bool {
        let result = self.try_save(data, id, tags, lifetime).await;
        self.collapse("save", id, result).is_some()
    }

    async fn remove(&self, id: &str) -> bool {
        let result = self.try_remove(id).await;
        self.collapse("remove", id, result).is_some()
    }

    async fn test(&self, id: &str) -> Option<DateTime<Utc>> {
        self.fetch("test", id).await.map(|record| record.bins.time)
    }

    async fn touch(&self, id: &str, extra: Duration) -> bool {
        let result = self.try_touch(id, extra).await;
        self.collapse("touch", id, result).unwrap_or(false)
    }

    async fn clean(&self, mode: CleaningMode, tags: &[&str]) -> bool {
        let result = self.try_clean(mode, tags).await;
        match self.collapse("clean", mode.as_str(), result) {
            Some(report) => {
                self.metrics
                    .record_clean(mode, report.scanned, report.removed);
                if !report.is_complete() {
                    warn!(
                        "✗ clean ({}) left {} matching entries behind",
                        mode, report.failed
                    );
                }
                report.is_complete()
            }
            None => false,
        }
    }

    async fn get_ids(&self) -> Vec<String> {
        self.ids(CleaningMode::All, &[]).await
    }

    async fn get_ids_matching_any_tags(&self, tags: &[&str]) -> Vec<String> {
        self.ids(CleaningMode::MatchingAnyTag, tags).await
    }

    async fn get_ids_matching_tags(&self, tags: &[&str]) -> Vec<String> {
        self.ids(CleaningMode::MatchingTag, tags).await
    }

    async fn get_ids_not_matching_tags(&self, tags: &[&str]) -> Vec<String> {
        self.ids(CleaningMode::NotMatchingTag, tags).await
    }

    async fn get_metadatas(&self, id: &str) -> Option<Metadata> {
        let record = self.fetch("get_metadatas", id).await?;
        Some(Metadata {
            expire: expiry_from(Utc::now(), record.ttl),
            tags: record.bins.tags,
            mtime: record.bins.time,
        })
    }

    fn capabilities(&self) -> Capabilities {
        CAPABILITIES
    }
}
