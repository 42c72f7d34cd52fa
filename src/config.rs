//! Routing dialer configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::diagnostics::Diagnostics;
use crate::dialer::{Dialer, RoutingDialer, TcpDialer};
use crate::error::{Error, Result};
use crate::resolver::{CachedResolver, DEFAULT_CACHE_CAPACITY};

/// Configuration for a [`RoutingDialer`] with a direct TCP primary.
///
/// Read from JSON; every field is optional:
///
/// ```json
/// {
///   "ip_list": "/etc/ipfilter/direct.txt.gz",
///   "resolver_cache_capacity": 4096,
///   "connect_timeout_ms": 5000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingConfig {
    /// IP list file; `None` disables filtering
    pub ip_list: Option<PathBuf>,
    /// Hostnames kept by the resolver cache (0 disables caching)
    pub resolver_cache_capacity: usize,
    /// Connect timeout for the primary TCP dialer
    pub connect_timeout_ms: Option<u64>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            ip_list: None,
            resolver_cache_capacity: DEFAULT_CACHE_CAPACITY,
            connect_timeout_ms: None,
        }
    }
}

impl RoutingConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Get the connect timeout.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    /// Build the TCP dialer used for addresses inside the list.
    pub fn primary_dialer(&self) -> TcpDialer {
        match self.connect_timeout() {
            Some(timeout) => TcpDialer::new().with_timeout(timeout),
            None => TcpDialer::new(),
        }
    }

    /// Build the resolver.
    pub fn resolver(&self) -> CachedResolver {
        CachedResolver::with_capacity(self.resolver_cache_capacity)
    }

    /// Build a routing dialer that connects directly for addresses in the
    /// list and hands everything else to `secondary`.
    pub fn build<S>(
        &self,
        secondary: S,
        diag: Diagnostics,
    ) -> Result<RoutingDialer<TcpDialer, S, CachedResolver>>
    where
        S: Dialer<Conn = TcpStream>,
    {
        RoutingDialer::with_diagnostics(
            self.primary_dialer(),
            secondary,
            self.resolver(),
            self.ip_list.as_deref(),
            diag,
        )
    }
}
