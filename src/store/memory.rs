//! In-memory record store.

use super::RecordStore;
use crate::error::{Error, Result};
use crate::key::RecordKey;
use crate::record::{Bins, Record};
use crate::serialization::{decode_bins, encode_bins};
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Slot {
    bytes: Vec<u8>,
    expires_at: Option<Instant>,
}

impl Slot {
    fn remaining(&self, now: Instant) -> Option<Option<Duration>> {
        match self.expires_at {
            None => Some(None),
            Some(at) if at > now => Some(Some(at - now)),
            Some(_) => None,
        }
    }
}

/// Thread-safe in-memory store with lazy TTL expiry.
///
/// Clones share the same data and the same closed state: closing any clone
/// closes them all. Records are kept as encoded envelopes, so
/// reads go through the same decode path as networked stores.
///
/// # Example
///
/// ```
/// # use tagstore::store::{InMemoryStore, RecordStore};
/// # use tagstore::key::RecordKey;
/// # use tagstore::record::Bins;
/// # async fn example() -> tagstore::Result<()> {
/// let store = InMemoryStore::new();
/// let key = RecordKey::new("magento", "cache", "page")?;
/// store.put(&key, &Bins::new("page", b"<html>", &["cms"]), None).await?;
/// assert!(store.get(&key).await?.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    records: Arc<DashMap<RecordKey, Slot>>,
    closed: Arc<AtomicBool>,
    close_calls: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots held, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// How many times `close()` has been called on any clone.
    pub fn close_count(&self) -> usize {
        self.close_calls.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::StoreClosed);
        }
        Ok(())
    }

    fn decode(key: RecordKey, slot: &Slot, now: Instant) -> Option<Result<Record>> {
        let ttl = slot.remaining(now)?;
        Some(decode_bins(&slot.bytes).map(|bins| Record { key, bins, ttl }))
    }
}

impl RecordStore for InMemoryStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        self.ensure_open()?;
        let now = Instant::now();

        let found = self
            .records
            .get(key)
            .map(|slot| Self::decode(key.clone(), &slot, now));

        match found {
            Some(Some(record)) => {
                debug!("✓ Memory GET {} -> HIT", key);
                record.map(Some)
            }
            Some(None) => {
                self.records
                    .remove_if(key, |_, slot| slot.remaining(Instant::now()).is_none());
                debug!("✓ Memory GET {} -> EXPIRED", key);
                Ok(None)
            }
            None => {
                debug!("✓ Memory GET {} -> MISS", key);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &RecordKey, bins: &Bins, ttl: Option<Duration>) -> Result<()> {
        self.ensure_open()?;
        let bytes = encode_bins(bins)?;
        // A deadline past what `Instant` can represent never arrives
        let expires_at = ttl.and_then(|d| Instant::now().checked_add(d));

        self.records.insert(key.clone(), Slot { bytes, expires_at });

        if let Some(d) = ttl {
            debug!("✓ Memory PUT {} (TTL: {:?})", key, d);
        } else {
            debug!("✓ Memory PUT {}", key);
        }
        Ok(())
    }

    async fn remove(&self, key: &RecordKey) -> Result<()> {
        self.ensure_open()?;
        let existed = self.records.remove(key).is_some();
        debug!("✓ Memory REMOVE {} (existed: {})", key, existed);
        Ok(())
    }

    fn scan<'a>(&'a self, namespace: &'a str, set: &'a str) -> BoxStream<'a, Result<Record>> {
        if let Err(e) = self.ensure_open() {
            return stream::once(async move { Err(e) }).boxed();
        }

        // Snapshot first: callers remove records while consuming the stream,
        // and a live iterator would hold shard locks across those removals.
        let now = Instant::now();
        let snapshot: Vec<(RecordKey, Slot)> = self
            .records
            .iter()
            .filter(|entry| entry.key().in_collection(namespace, set))
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        debug!(
            "✓ Memory SCAN {}:{} ({} slots)",
            namespace,
            set,
            snapshot.len()
        );

        stream::iter(snapshot)
            .filter_map(move |(key, slot)| async move { Self::decode(key, &slot, now) })
            .boxed()
    }

    fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::AcqRel);
        if !self.closed.swap(true, Ordering::AcqRel) {
            info!("✓ In-memory store closed ({} records dropped)", self.len());
            self.records.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    fn key(id: &str) -> RecordKey {
        RecordKey::new("ns", "set", id).expect("Failed to build key")
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let store = InMemoryStore::new();
        let bins = Bins::new("a", b"value", &["x"]);

        store
            .put(&key("a"), &bins, None)
            .await
            .expect("Failed to put");
        let record = store
            .get(&key("a"))
            .await
            .expect("Failed to get")
            .expect("Record not found");
        assert_eq!(record.bins, bins);
        assert_eq!(record.ttl, None);

        store.remove(&key("a")).await.expect("Failed to remove");
        assert!(store.get(&key("a")).await.expect("Failed to get").is_none());

        // Removing again is fine
        store.remove(&key("a")).await.expect("Failed to remove");
    }

    #[tokio::test]
    async fn test_ttl_expiry() {
        let store = InMemoryStore::new();
        store
            .put(
                &key("short"),
                &Bins::new("short", b"v", &[]),
                Some(Duration::from_millis(20)),
            )
            .await
            .expect("Failed to put");

        let record = store
            .get(&key("short"))
            .await
            .expect("Failed to get")
            .expect("Record not found");
        assert!(record.ttl.expect("Missing ttl") <= Duration::from_millis(20));

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(store
            .get(&key("short"))
            .await
            .expect("Failed to get")
            .is_none());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_put_with_unrepresentable_ttl_never_expires() {
        let store = InMemoryStore::new();
        store
            .put(&key("a"), &Bins::new("a", b"v", &[]), Some(Duration::MAX))
            .await
            .expect("Failed to put");

        let record = store
            .get(&key("a"))
            .await
            .expect("Failed to get")
            .expect("Record not found");
        assert_eq!(record.ttl, None);
    }

    #[tokio::test]
    async fn test_scan_is_scoped_to_collection() {
        let store = InMemoryStore::new();
        store
            .put(&key("a"), &Bins::new("a", b"1", &[]), None)
            .await
            .expect("Failed to put");
        let other = RecordKey::new("ns", "other", "b").expect("Failed to build key");
        store
            .put(&other, &Bins::new("b", b"2", &[]), None)
            .await
            .expect("Failed to put");

        let records: Vec<Record> = store
            .scan("ns", "set")
            .try_collect()
            .await
            .expect("Scan failed");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].bins.id, "a");
    }

    #[tokio::test]
    async fn test_scan_allows_removal_while_streaming() {
        let store = InMemoryStore::new();
        for id in ["a", "b", "c"] {
            store
                .put(&key(id), &Bins::new(id, b"v", &[]), None)
                .await
                .expect("Failed to put");
        }

        let mut records = store.scan("ns", "set");
        while let Some(record) = records.try_next().await.expect("Scan failed") {
            store.remove(&record.key).await.expect("Failed to remove");
        }

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_closed_store_rejects_calls() {
        let store = InMemoryStore::new();
        store.close();
        store.close();

        assert!(store.is_closed());
        assert_eq!(store.close_count(), 2);
        assert!(matches!(store.get(&key("a")).await, Err(Error::StoreClosed)));

        let scanned: Vec<Result<Record>> = store.scan("ns", "set").collect().await;
        assert!(matches!(scanned.as_slice(), [Err(Error::StoreClosed)]));
    }
}
