//! Record key construction.

use crate::error::{Error, Result};
use std::fmt;

/// Separator between key components in the flat key representation.
pub const KEY_SEPARATOR: char = ':';

/// Fully-qualified record key: `(namespace, set, id)`.
///
/// Stores that address records by a flat string use the `Display` form,
/// `"{namespace}:{set}:{id}"`. The id may itself contain `:`; namespace and
/// set may not (enforced by [`BackendConfig::validate`](crate::config::BackendConfig::validate)).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordKey {
    namespace: String,
    set: String,
    id: String,
}

impl RecordKey {
    /// Initialize a key for `id` within `namespace`/`set`.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` for an empty id.
    pub fn new(namespace: &str, set: &str, id: &str) -> Result<Self> {
        if id.is_empty() {
            return Err(Error::InvalidArgument("cache id must not be empty".to_string()));
        }

        Ok(RecordKey {
            namespace: namespace.to_string(),
            set: set.to_string(),
            id: id.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn set(&self) -> &str {
        &self.set
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Whether this key lives in the given collection.
    pub fn in_collection(&self, namespace: &str, set: &str) -> bool {
        self.namespace == namespace && self.set == set
    }

    /// Flat prefix shared by every key of a collection: `"{namespace}:{set}:"`.
    pub fn collection_prefix(namespace: &str, set: &str) -> String {
        format!("{}{}{}{}", namespace, KEY_SEPARATOR, set, KEY_SEPARATOR)
    }

    /// Rebuild a key from its flat form.
    ///
    /// Returns `None` when `raw` does not belong to the given collection.
    pub fn from_flat(namespace: &str, set: &str, raw: &str) -> Option<Self> {
        let prefix = Self::collection_prefix(namespace, set);
        raw.strip_prefix(&prefix)
            .filter(|id| !id.is_empty())
            .map(|id| RecordKey {
                namespace: namespace.to_string(),
                set: set.to_string(),
                id: id.to_string(),
            })
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            self.namespace, KEY_SEPARATOR, self.set, KEY_SEPARATOR, self.id
        )
    }
}
