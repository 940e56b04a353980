//! Stored record layout.

use crate::key::RecordKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The bins written for every cache entry.
///
/// `id` is stored alongside the payload because stores that hash keys cannot
/// hand the original id back during a scan.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bins {
    pub id: String,
    pub data: Vec<u8>,
    pub tags: Vec<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub time: DateTime<Utc>,
}

impl Bins {
    /// Build bins for a fresh write, stamped with the current time.
    ///
    /// Tags are deduplicated, keeping first-seen order.
    pub fn new(id: &str, data: &[u8], tags: &[&str]) -> Self {
        let mut owned: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !owned.iter().any(|t| t == tag) {
                owned.push((*tag).to_string());
            }
        }

        Bins {
            id: id.to_string(),
            data: data.to_vec(),
            tags: owned,
            time: now_seconds(),
        }
    }
}

/// A record as returned by a store: key, bins, and remaining lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    pub key: RecordKey,
    pub bins: Bins,
    /// Remaining time to live. `None` means the record never expires.
    pub ttl: Option<Duration>,
}

/// Longest TTL handed to a store. Longer lifetimes are clamped to it.
pub const MAX_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Lifetime requested for a save.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifetime {
    /// Use the backend's configured default lifetime.
    #[default]
    Default,
    /// Never expire.
    Infinite,
    /// Expire after the given duration. A zero duration means `Default`.
    Fixed(Duration),
}

impl Lifetime {
    /// Resolve to the TTL handed to the store, capped at [`MAX_TTL`].
    pub fn resolve(self, default: Option<Duration>) -> Option<Duration> {
        let ttl = match self {
            Lifetime::Default => default,
            Lifetime::Infinite => None,
            Lifetime::Fixed(d) if d.is_zero() => default,
            Lifetime::Fixed(d) => Some(d),
        };
        ttl.map(|d| d.min(MAX_TTL))
    }
}

impl From<Duration> for Lifetime {
    fn from(d: Duration) -> Self {
        Lifetime::Fixed(d)
    }
}

/// Current time truncated to whole seconds, the precision records keep.
pub(crate) fn now_seconds() -> DateTime<Utc> {
    DateTime::from_timestamp(Utc::now().timestamp(), 0).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bins_dedupe_tags() {
        let bins = Bins::new("a", b"payload", &["x", "y", "x"]);
        assert_eq!(bins.tags, vec!["x".to_string(), "y".to_string()]);
        assert_eq!(bins.data, b"payload".to_vec());
        assert_eq!(bins.time.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_lifetime_resolve() {
        let default = Some(Duration::from_secs(3600));

        assert_eq!(Lifetime::Default.resolve(default), default);
        assert_eq!(Lifetime::Default.resolve(None), None);
        assert_eq!(Lifetime::Infinite.resolve(default), None);
        assert_eq!(
            Lifetime::Fixed(Duration::from_secs(60)).resolve(default),
            Some(Duration::from_secs(60))
        );
        assert_eq!(Lifetime::Fixed(Duration::ZERO).resolve(default), default);
    }

    #[test]
    fn test_lifetime_resolve_clamps_huge_values() {
        assert_eq!(
            Lifetime::Fixed(Duration::MAX).resolve(None),
            Some(MAX_TTL)
        );
        assert_eq!(
            Lifetime::Default.resolve(Some(Duration::from_secs(u64::MAX))),
            Some(MAX_TTL)
        );
    }
}
