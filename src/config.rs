//! Backend configuration.

use crate::error::{Error, Result};
use crate::key::KEY_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default connection pool size.
/// Override with TAGSTORE_POOL_SIZE environment variable
const DEFAULT_POOL_SIZE: usize = 16;

/// Keys requested per scan round-trip. A hint, not a result limit.
const DEFAULT_SCAN_COUNT: usize = 100;

/// Default entry lifetime in seconds.
const DEFAULT_LIFETIME_SECS: u64 = 3600;

/// A store endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    pub addr: String,
    pub port: u16,
}

impl HostConfig {
    pub fn new(addr: impl Into<String>, port: u16) -> Self {
        HostConfig {
            addr: addr.into(),
            port,
        }
    }
}

/// Options recognized by the backend.
///
/// Unknown option names are rejected when parsed from a host option map.
///
/// # Example
///
/// ```
/// use tagstore::config::BackendConfig;
/// use serde_json::json;
///
/// let config = BackendConfig::from_options(json!({
///     "hosts": [{ "addr": "10.0.0.5", "port": 3000 }],
///     "namespace": "shop",
/// })).unwrap();
///
/// assert_eq!(config.set, "cache");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub hosts: Vec<HostConfig>,
    pub namespace: String,
    pub set: String,
    /// Default lifetime in seconds; `None` stores entries without expiry.
    pub lifetime: Option<u64>,
    pub pool_size: usize,
    pub scan_count: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            hosts: vec![HostConfig::new("127.0.0.1", 3000)],
            namespace: "magento".to_string(),
            set: "cache".to_string(),
            lifetime: Some(DEFAULT_LIFETIME_SECS),
            pool_size: DEFAULT_POOL_SIZE,
            scan_count: DEFAULT_SCAN_COUNT,
        }
    }
}

impl BackendConfig {
    /// Parse a host-supplied option map. Missing options take their defaults.
    ///
    /// # Errors
    /// Returns `Error::ConfigError` for unknown options, wrong types, or a
    /// configuration that fails [`validate`](Self::validate)
    pub fn from_options(options: serde_json::Value) -> Result<Self> {
        let config: BackendConfig = serde_json::from_value(options)
            .map_err(|e| Error::ConfigError(format!("Invalid backend options: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overlaid with `TAGSTORE_*` environment variables.
    ///
    /// - `TAGSTORE_HOSTS`: `host:port,host:port`
    /// - `TAGSTORE_NAMESPACE`, `TAGSTORE_SET`
    /// - `TAGSTORE_LIFETIME`: seconds, or `infinite`
    /// - `TAGSTORE_POOL_SIZE`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = BackendConfig::default();

        if let Some(hosts) = lookup("TAGSTORE_HOSTS") {
            config.hosts = hosts
                .split(',')
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .map(parse_host)
                .collect::<Result<Vec<_>>>()?;
        }
        if let Some(namespace) = lookup("TAGSTORE_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(set) = lookup("TAGSTORE_SET") {
            config.set = set;
        }
        if let Some(lifetime) = lookup("TAGSTORE_LIFETIME") {
            config.lifetime = match lifetime.as_str() {
                "infinite" => None,
                secs => Some(secs.parse::<u64>().map_err(|_| {
                    Error::ConfigError(format!("Invalid TAGSTORE_LIFETIME: {}", secs))
                })?),
            };
        }
        if let Some(size) = lookup("TAGSTORE_POOL_SIZE") {
            config.pool_size = size
                .parse()
                .map_err(|_| Error::ConfigError(format!("Invalid TAGSTORE_POOL_SIZE: {}", size)))?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Replace the endpoint list with a single host.
    pub fn with_host(mut self, addr: impl Into<String>, port: u16) -> Self {
        self.hosts = vec![HostConfig::new(addr, port)];
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_set(mut self, set: impl Into<String>) -> Self {
        self.set = set.into();
        self
    }

    /// Set the default lifetime; `None` means entries never expire.
    ///
    /// Lifetimes are kept in whole seconds, rounded up.
    pub fn with_lifetime(mut self, lifetime: Option<Duration>) -> Self {
        self.lifetime = lifetime.map(|d| {
            let partial = u64::from(d.subsec_nanos() > 0);
            d.as_secs().saturating_add(partial)
        });
        self
    }

    pub fn default_lifetime(&self) -> Option<Duration> {
        self.lifetime.map(Duration::from_secs)
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.hosts.is_empty() {
            return Err(Error::ConfigError("No store hosts specified".to_string()));
        }
        for (option, value) in [("namespace", &self.namespace), ("set", &self.set)] {
            if value.is_empty() {
                return Err(Error::ConfigError(format!("{} must not be empty", option)));
            }
            if value.contains(KEY_SEPARATOR) {
                return Err(Error::ConfigError(format!(
                    "{} must not contain '{}': {}",
                    option, KEY_SEPARATOR, value
                )));
            }
        }
        if self.lifetime == Some(0) {
            return Err(Error::ConfigError(
                "lifetime must be positive, or null for no expiry".to_string(),
            ));
        }
        if self.pool_size == 0 {
            return Err(Error::ConfigError("pool_size must be positive".to_string()));
        }
        if self.scan_count == 0 {
            return Err(Error::ConfigError("scan_count must be positive".to_string()));
        }
        Ok(())
    }
}

fn parse_host(raw: &str) -> Result<HostConfig> {
    let (addr, port) = raw
        .rsplit_once(':')
        .ok_or_else(|| Error::ConfigError(format!("Host must be addr:port, got {}", raw)))?;
    let port = port
        .parse::<u16>()
        .map_err(|_| Error::ConfigError(format!("Invalid port in host {}", raw)))?;
    Ok(HostConfig::new(addr, port))
}
