//! Redis record store.

use super::RecordStore;
use crate::config::BackendConfig;
use crate::error::{Error, Result};
use crate::key::RecordKey;
use crate::record::{Bins, Record, MAX_TTL};
use crate::serialization::{decode_bins, encode_bins};
use deadpool_redis::redis::{cmd, pipe};
use deadpool_redis::{Config, Connection, Pool, PoolConfig, Runtime};
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::collections::{HashSet, VecDeque};
use std::time::Duration;

/// Redis-backed record store using a `deadpool-redis` connection pool.
///
/// Each record lives at the flat key `namespace:set:id` as an encoded
/// envelope. Expiry is left to Redis (`PX` on write, `PTTL` on read).
///
/// # Example
///
/// ```no_run
/// # use tagstore::config::BackendConfig;
/// # use tagstore::store::RedisStore;
/// # async fn example() -> tagstore::Result<()> {
/// let config = BackendConfig::default().with_host("127.0.0.1", 6379);
/// let store = RedisStore::connect(&config).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool,
    scan_count: usize,
}

struct ScanState {
    cursor: u64,
    started: bool,
    pending: VecDeque<String>,
    seen: HashSet<String>,
}

impl RedisStore {
    /// Build the connection pool from the first configured host.
    ///
    /// # Errors
    /// Returns `Err` if no host is configured or pool creation fails
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let host = config
            .hosts
            .first()
            .ok_or_else(|| Error::ConfigError("No store hosts specified".to_string()))?;

        if config.hosts.len() > 1 {
            warn!(
                "Redis store uses a single endpoint; ignoring {} additional host(s)",
                config.hosts.len() - 1
            );
        }

        let url = format!("redis://{}:{}", host.addr, host.port);
        let mut pool_config = Config::from_url(url.clone());
        pool_config.pool = Some(PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| Error::ConfigError(format!("Failed to create connection pool: {}", e)))?;

        info!(
            "✓ Redis store initialized with server: {} (pool size: {})",
            url, config.pool_size
        );

        Ok(RedisStore {
            pool,
            scan_count: config.scan_count,
        })
    }

    async fn connection(&self) -> Result<Connection> {
        if self.pool.is_closed() {
            return Err(Error::StoreClosed);
        }
        Ok(self.pool.get().await?)
    }

    /// Read a record by its flat key. `None` if missing, expired, or foreign.
    async fn get_flat(&self, namespace: &str, set: &str, flat: &str) -> Result<Option<Record>> {
        let Some(key) = RecordKey::from_flat(namespace, set, flat) else {
            return Ok(None);
        };
        self.get(&key).await
    }
}

/// Escape glob metacharacters so a collection prefix matches literally.
fn escape_glob(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `PX` argument for a TTL: at least 1 (PX rejects zero), at most `MAX_TTL`.
fn px_millis(ttl: Duration) -> u64 {
    let millis = ttl.min(MAX_TTL).as_millis().max(1);
    u64::try_from(millis).unwrap_or(u64::MAX)
}

/// Map a `PTTL` reply to a remaining lifetime. `None` means the key is gone.
fn ttl_from_pttl(pttl: i64) -> Option<Option<Duration>> {
    match pttl {
        -2 => None,
        -1 => Some(None),
        ms if ms >= 0 => Some(Some(Duration::from_millis(ms as u64))),
        _ => None,
    }
}

impl RecordStore for RedisStore {
    async fn get(&self, key: &RecordKey) -> Result<Option<Record>> {
        let flat = key.to_string();
        let mut conn = self.connection().await?;

        let (bytes, pttl): (Option<Vec<u8>>, i64) = pipe()
            .atomic()
            .cmd("GET")
            .arg(&flat)
            .cmd("PTTL")
            .arg(&flat)
            .query_async(&mut conn)
            .await?;

        match (bytes, ttl_from_pttl(pttl)) {
            (Some(bytes), Some(ttl)) => {
                debug!("✓ Redis GET {} -> HIT", flat);
                let bins = decode_bins(&bytes)?;
                Ok(Some(Record {
                    key: key.clone(),
                    bins,
                    ttl,
                }))
            }
            _ => {
                debug!("✓ Redis GET {} -> MISS", flat);
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &RecordKey, bins: &Bins, ttl: Option<Duration>) -> Result<()> {
        let flat = key.to_string();
        let bytes = encode_bins(bins)?;
        let mut conn = self.connection().await?;

        let mut command = cmd("SET");
        command.arg(&flat).arg(bytes);
        if let Some(d) = ttl {
            command.arg("PX").arg(px_millis(d));
        }
        let _: () = command.query_async(&mut conn).await?;

        if let Some(d) = ttl {
            debug!("✓ Redis SET {} (TTL: {:?})", flat, d);
        } else {
            debug!("✓ Redis SET {}", flat);
        }
        Ok(())
    }

    async fn remove(&self, key: &RecordKey) -> Result<()> {
        let flat = key.to_string();
        let mut conn = self.connection().await?;

        let removed: i64 = cmd("DEL").arg(&flat).query_async(&mut conn).await?;
        debug!("✓ Redis DEL {} (removed: {})", flat, removed);
        Ok(())
    }

    fn scan<'a>(&'a self, namespace: &'a str, set: &'a str) -> BoxStream<'a, Result<Record>> {
        let pattern = format!(
            "{}*",
            escape_glob(&RecordKey::collection_prefix(namespace, set))
        );
        let count = self.scan_count;

        let state = ScanState {
            cursor: 0,
            started: false,
            pending: VecDeque::new(),
            seen: HashSet::new(),
        };

        let flat_keys = stream::try_unfold(state, move |mut state| {
            let pattern = pattern.clone();
            async move {
                loop {
                    if let Some(flat) = state.pending.pop_front() {
                        return Ok::<_, Error>(Some((flat, state)));
                    }
                    if state.started && state.cursor == 0 {
                        return Ok::<_, Error>(None);
                    }

                    let mut conn = self.connection().await?;
                    let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                        .arg(state.cursor)
                        .arg("MATCH")
                        .arg(&pattern)
                        .arg("COUNT")
                        .arg(count)
                        .query_async(&mut conn)
                        .await?;

                    debug!("✓ Redis SCAN {} -> {} keys (cursor {})", pattern, keys.len(), next);
                    state.started = true;
                    state.cursor = next;

                    // SCAN may return a key more than once
                    for key in keys {
                        if state.seen.insert(key.clone()) {
                            state.pending.push_back(key);
                        }
                    }
                }
            }
        });

        flat_keys
            .and_then(move |flat| async move { self.get_flat(namespace, set, &flat).await })
            .try_filter_map(|record| async move { Ok(record) })
            .boxed()
    }

    fn close(&self) {
        self.pool.close();
        info!("✓ Redis store pool closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_glob() {
        assert_eq!(escape_glob("ns:set:"), "ns:set:");
        assert_eq!(escape_glob("a*b?[c]\\"), "a\\*b\\?\\[c\\]\\\\");
    }

    #[test]
    fn test_px_millis_is_clamped() {
        assert_eq!(px_millis(Duration::ZERO), 1);
        assert_eq!(px_millis(Duration::from_micros(10)), 1);
        assert_eq!(px_millis(Duration::from_secs(2)), 2000);
        assert_eq!(px_millis(Duration::MAX), MAX_TTL.as_millis() as u64);
    }

    #[test]
    fn test_ttl_from_pttl() {
        assert_eq!(ttl_from_pttl(-2), None);
        assert_eq!(ttl_from_pttl(-1), Some(None));
        assert_eq!(
            ttl_from_pttl(1500),
            Some(Some(Duration::from_millis(1500)))
        );
    }
}
