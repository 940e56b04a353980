//! Builder pattern for tagged saves.

use crate::backend::{CacheBackend, StoreBackend};
use crate::error::Result;
use crate::record::Lifetime;
use crate::store::RecordStore;

/// Fluent builder for a single save.
///
/// Provides chainable methods to attach tags and a lifetime before writing.
///
/// # Example
///
/// ```ignore
/// use std::time::Duration;
///
/// // backend is a StoreBackend<S> instance
/// let saved = backend
///     .entry("product_42")
///     .with_tags(&["catalog", "product"])
///     .with_lifetime(Duration::from_secs(300))
///     .save(b"...")
///     .await;
/// ```
pub struct SaveBuilder<'a, S: RecordStore> {
    backend: &'a StoreBackend<S>,
    id: &'a str,
    tags: Vec<&'a str>,
    lifetime: Lifetime,
}

impl<'a, S: RecordStore> SaveBuilder<'a, S> {
    /// Create a new builder with no tags and the default lifetime.
    pub(crate) fn new(backend: &'a StoreBackend<S>, id: &'a str) -> Self {
        Self {
            backend,
            id,
            tags: Vec::new(),
            lifetime: Lifetime::Default,
        }
    }

    /// Replace the tag set.
    pub fn with_tags(mut self, tags: &[&'a str]) -> Self {
        self.tags = tags.to_vec();
        self
    }

    /// Add one tag.
    pub fn with_tag(mut self, tag: &'a str) -> Self {
        self.tags.push(tag);
        self
    }

    /// Override the lifetime for this save.
    ///
    /// # Example
    ///
    /// ```ignore
    /// builder.with_lifetime(Duration::from_secs(300))  // 5 minutes
    /// builder.with_lifetime(Lifetime::Infinite)
    /// ```
    pub fn with_lifetime(mut self, lifetime: impl Into<Lifetime>) -> Self {
        self.lifetime = lifetime.into();
        self
    }

    /// Write the entry, reporting failure as `false`.
    pub async fn save(self, data: &[u8]) -> bool {
        self.backend
            .save(data, self.id, &self.tags, self.lifetime)
            .await
    }

    /// Write the entry, propagating the store error.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidArgument`: empty id
    /// - `Error::SerializationError`: record could not be encoded
    /// - `Error::BackendError`: store unavailable
    pub async fn try_save(self, data: &[u8]) -> Result<()> {
        self.backend
            .try_save(data, self.id, &self.tags, self.lifetime)
            .await
    }
}

#[cfg(all(test, feature = "inmemory"))]
mod tests {
    use super::*;
    use crate::cleaning::CleaningMode;
    use crate::config::BackendConfig;
    use crate::store::InMemoryStore;
    use std::time::Duration;

    fn backend() -> StoreBackend<InMemoryStore> {
        StoreBackend::in_memory(BackendConfig::default()).expect("Failed to build backend")
    }

    #[tokio::test]
    async fn test_builder_basic() {
        let backend = backend();

        assert!(backend.entry("a").save(b"data").await);
        assert_eq!(backend.load("a").await, Some(b"data".to_vec()));

        let meta = backend.get_metadatas("a").await.expect("Missing metadata");
        assert!(meta.tags.is_empty());
    }

    #[tokio::test]
    async fn test_builder_with_tags() {
        let backend = backend();

        backend
            .entry("a")
            .with_tags(&["x"])
            .with_tag("y")
            .save(b"data")
            .await;

        let ids = backend.get_ids_matching_tags(&["x", "y"]).await;
        assert_eq!(ids, vec!["a".to_string()]);

        backend.clean(CleaningMode::MatchingTag, &["x", "y"]).await;
        assert!(backend.get_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_builder_with_lifetime() {
        let backend = backend();

        backend
            .entry("short")
            .with_lifetime(Duration::from_secs(30))
            .try_save(b"data")
            .await
            .expect("Failed to save");
        backend
            .entry("forever")
            .with_lifetime(Lifetime::Infinite)
            .try_save(b"data")
            .await
            .expect("Failed to save");

        let short = backend
            .try_fetch("short")
            .await
            .expect("Failed to fetch")
            .expect("Entry not found");
        assert!(short.ttl.expect("Missing ttl") <= Duration::from_secs(30));

        let forever = backend
            .try_fetch("forever")
            .await
            .expect("Failed to fetch")
            .expect("Entry not found");
        assert_eq!(forever.ttl, None);
    }

    #[tokio::test]
    async fn test_builder_try_save_rejects_empty_id() {
        let backend = backend();
        assert!(backend.entry("").try_save(b"data").await.is_err());
        assert!(!backend.entry("").save(b"data").await);
    }
}
