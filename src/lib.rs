//! # tagstore
//!
//! A tag-aware cache backend over key-value record stores.
//!
//! ## Features
//!
//! - **Tagged entries:** Every entry carries a tag set, replaced on each save
//! - **Group invalidation:** Clean or list entries by tag with four matching modes
//! - **Store Agnostic:** In-memory and Redis stores, or any `RecordStore`
//! - **Probe Friendly:** Absence and failure are negative results, never panics
//! - **Production Ready:** Built-in logging, metrics hooks, and typed errors
//!
//! Stores keep no tag index. Tag queries scan the whole configured
//! `(namespace, set)` collection once per call.
//!
//! ## Quick Start
//!
//! ```ignore
//! use tagstore::{
//!     backend::{CacheBackend, StoreBackend},
//!     cleaning::CleaningMode,
//!     config::BackendConfig,
//!     record::Lifetime,
//! };
//!
//! let backend = StoreBackend::in_memory(BackendConfig::default())?;
//!
//! backend.save(b"<nav/>", "block_nav", &["layout", "cms"], Lifetime::Default).await;
//! backend.save(b"<footer/>", "block_footer", &["layout"], Lifetime::Default).await;
//!
//! // Drop everything tagged "cms"
//! backend.clean(CleaningMode::MatchingAnyTag, &["cms"]).await;
//! assert_eq!(backend.get_ids().await, vec!["block_footer".to_string()]);
//! ```

#[macro_use]
extern crate log;

pub mod backend;
pub mod builder;
pub mod cleaning;
pub mod config;
pub mod error;
pub mod key;
pub mod observability;
pub mod record;
pub mod scan;
pub mod serialization;
pub mod store;

// Re-exports for convenience
pub use backend::{CacheBackend, Capabilities, Metadata, StoreBackend};
pub use builder::SaveBuilder;
pub use cleaning::CleaningMode;
pub use config::BackendConfig;
pub use error::{Error, Result};
pub use record::Lifetime;
pub use store::RecordStore;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
