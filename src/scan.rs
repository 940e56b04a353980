//! Full-collection scan filter.
//!
//! Tags are stored inside each record, which stores cannot index, so every
//! tag query walks the whole `(namespace, set)` once: O(N) per call.

use crate::cleaning::TagFilter;
use crate::error::Result;
use crate::store::RecordStore;
use futures::TryStreamExt;

/// Outcome of a scan that removed matching records.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

impl CleanReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

/// Ids of every record in the collection selected by `filter`.
///
/// Read-only. Stops at the first scan error.
pub async fn collect_ids<S: RecordStore>(
    store: &S,
    namespace: &str,
    set: &str,
    filter: &TagFilter<'_>,
) -> Result<Vec<String>> {
    let mut ids = Vec::new();
    let mut records = store.scan(namespace, set);

    while let Some(record) = records.try_next().await? {
        if filter.matches(record.bins.tags.as_slice()) {
            ids.push(record.bins.id);
        }
    }

    debug!(
        "Scan {}:{} ({}) selected {} ids",
        namespace,
        set,
        filter.mode(),
        ids.len()
    );
    Ok(ids)
}

/// Remove every record in the collection selected by `filter`.
///
/// A failed removal is counted and the scan continues; a failed scan stops
/// and returns its error.
pub async fn remove_matching<S: RecordStore>(
    store: &S,
    namespace: &str,
    set: &str,
    filter: &TagFilter<'_>,
) -> Result<CleanReport> {
    let mut report = CleanReport::default();
    let mut records = store.scan(namespace, set);

    while let Some(record) = records.try_next().await? {
        report.scanned += 1;
        if !filter.matches(record.bins.tags.as_slice()) {
            continue;
        }

        match store.remove(&record.key).await {
            Ok(()) => report.removed += 1,
            Err(e) => {
                warn!("Failed to remove {} during clean: {}", record.key, e);
                report.failed += 1;
            }
        }
    }

    debug!(
        "Clean {}:{} ({}) scanned {} removed {} failed {}",
        namespace,
        set,
        filter.mode(),
        report.scanned,
        report.removed,
        report.failed
    );
    Ok(report)
}
