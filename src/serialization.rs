//! Versioned envelope for stored records.
//!
//! # Format
//!
//! ```text
//! [MAGIC: 4 bytes] [VERSION: 4 bytes, LE] [POSTCARD PAYLOAD]
//! ```
//!
//! The envelope wraps the record bins, not the cached value: the payload
//! bytes inside `Bins::data` are opaque and stored as-is.

use crate::error::{Error, Result};
use crate::record::Bins;

/// Magic header identifying a tagstore record.
pub const MAGIC: [u8; 4] = *b"CTAG";

/// Current record schema version. Bump when `Bins` changes shape.
pub const SCHEMA_VERSION: u32 = 1;

const HEADER_LEN: usize = 8;

/// Encode bins into an envelope.
pub fn encode_bins(bins: &Bins) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(bins).map_err(|e| {
        Error::SerializationError(format!("Failed to encode record {}: {}", bins.id, e))
    })?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Decode an envelope back into bins.
///
/// # Errors
///
/// - `Error::InvalidCacheEntry`: too short or bad magic
/// - `Error::VersionMismatch`: written by another schema version
/// - `Error::DeserializationError`: corrupted payload
pub fn decode_bins(bytes: &[u8]) -> Result<Bins> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidCacheEntry(format!(
            "envelope too short: {} bytes",
            bytes.len()
        )));
    }

    let (header, payload) = bytes.split_at(HEADER_LEN);
    if header[..4] != MAGIC {
        return Err(Error::InvalidCacheEntry("bad magic header".to_string()));
    }

    let mut version = [0u8; 4];
    version.copy_from_slice(&header[4..]);
    let found = u32::from_le_bytes(version);
    if found != SCHEMA_VERSION {
        return Err(Error::VersionMismatch {
            expected: SCHEMA_VERSION,
            found,
        });
    }

    postcard::from_bytes(payload).map_err(|e| Error::DeserializationError(e.to_string()))
}
