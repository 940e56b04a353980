//! Walkthrough of tagged saves, tag queries and group invalidation.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tagstore::{
    backend::StoreBackend,
    cleaning::CleaningMode,
    config::BackendConfig,
    error::Result,
    observability::CacheMetrics,
    record::Lifetime,
    CacheBackend,
};

/// Counts hits and misses so the demo can print them at the end.
#[derive(Clone, Default)]
struct CountingMetrics {
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
}

impl CacheMetrics for CountingMetrics {
    fn record_hit(&self, _id: &str, _duration: Duration) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self, _id: &str, _duration: Duration) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_clean(&self, mode: CleaningMode, scanned: usize, removed: usize) {
        println!(
            "   [metrics] clean {} scanned {} removed {}",
            mode, scanned, removed
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .try_init()
        .ok();

    println!("\n=== tagstore - Tagged Usage ===\n");

    // 1. Build a backend over the in-memory store
    println!("1. Initializing in-memory backend...");
    let metrics = CountingMetrics::default();
    let config = BackendConfig::default()
        .with_namespace("shop")
        .with_set("pages");
    let backend = StoreBackend::in_memory(config)?.with_metrics(Box::new(metrics.clone()));
    println!("   ✓ Backend ready: {:?}\n", backend.capabilities());

    // 2. Save a few tagged pages
    println!("2. Saving tagged pages:");
    backend
        .save(b"<h1>Laptop</h1>", "product_1", &["catalog", "product_1"], Lifetime::Default)
        .await;
    backend
        .save(b"<h1>Phone</h1>", "product_2", &["catalog", "product_2"], Lifetime::Default)
        .await;
    backend
        .entry("home")
        .with_tags(&["cms"])
        .with_lifetime(Lifetime::Infinite)
        .save(b"<h1>Welcome</h1>")
        .await;
    println!("   ✓ Stored ids: {:?}\n", backend.get_ids().await);

    // 3. Tag queries
    println!("3. Tag queries:");
    println!(
        "   catalog pages:     {:?}",
        backend.get_ids_matching_tags(&["catalog"]).await
    );
    println!(
        "   not catalog pages: {:?}\n",
        backend.get_ids_not_matching_tags(&["catalog"]).await
    );

    // 4. Metadata and touch
    println!("4. Metadata before and after touch:");
    if let Some(meta) = backend.get_metadatas("product_1").await {
        println!("   before: expire={:?} tags={:?}", meta.expire, meta.tags);
    }
    backend.touch("product_1", Duration::from_secs(600)).await;
    if let Some(meta) = backend.get_metadatas("product_1").await {
        println!("   after:  expire={:?}\n", meta.expire);
    }

    // 5. Invalidate one product
    println!("5. Product 2 changed, cleaning its tag:");
    backend
        .clean(CleaningMode::MatchingAnyTag, &["product_2"])
        .await;
    println!("   ✓ Remaining ids: {:?}\n", backend.get_ids().await);

    // 6. Loads
    println!("6. Loads:");
    for id in ["product_1", "product_2", "home"] {
        match backend.load(id).await {
            Some(data) => println!("   {} -> {}", id, String::from_utf8_lossy(&data)),
            None => println!("   {} -> miss", id),
        }
    }
    println!(
        "   hits={} misses={}\n",
        metrics.hits.load(Ordering::Relaxed),
        metrics.misses.load(Ordering::Relaxed)
    );

    // 7. Clean everything
    println!("7. Cleaning all:");
    backend.clean(CleaningMode::All, &[]).await;
    println!("   ✓ Remaining ids: {:?}\n", backend.get_ids().await);

    println!("=== Example Complete ===\n");

    Ok(())
}
