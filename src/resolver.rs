//! Hostname resolution.

use quick_cache::sync::Cache;
use std::net::{IpAddr, ToSocketAddrs};
use std::sync::Arc;

use crate::error::ResolveError;

/// Default number of cached hostnames.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Resolver turns a hostname into a single IP address.
///
/// Implementations are shared between concurrent dials and must not
/// require external locking.
pub trait Resolver: Send + Sync {
    /// Resolve `host` to an IP address.
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolveError>;
}

impl<R: Resolver + ?Sized> Resolver for &R {
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolveError> {
        (**self).resolve(host)
    }
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolveError> {
        (**self).resolve(host)
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolveError> {
        (**self).resolve(host)
    }
}

/// System resolver with an in-memory cache.
///
/// IP literals are returned as-is without touching the cache. Hostnames
/// are looked up through the system resolver and the first address
/// returned is cached.
///
/// # Examples
/// ```
/// use ipfilter::{CachedResolver, Resolver};
///
/// let resolver = CachedResolver::new();
/// let ip = resolver.resolve("127.0.0.1").unwrap();
/// assert!(ip.is_loopback());
/// ```
pub struct CachedResolver {
    cache: Option<Cache<String, IpAddr>>,
}

impl CachedResolver {
    /// Create a resolver with the default cache capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Create a resolver caching up to `capacity` hostnames.
    ///
    /// A capacity of 0 disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        let cache = if capacity > 0 {
            Some(Cache::new(capacity))
        } else {
            None
        };
        Self { cache }
    }

    /// Get the number of cached hostnames.
    pub fn cached_len(&self) -> usize {
        self.cache.as_ref().map_or(0, |cache| cache.len())
    }

    /// Drop all cached entries.
    pub fn clear(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    fn lookup(host: &str) -> Result<IpAddr, ResolveError> {
        // Port is irrelevant, ToSocketAddrs just needs one
        let mut addrs = (host, 0u16).to_socket_addrs()?;
        addrs
            .next()
            .map(|addr| addr.ip())
            .ok_or_else(|| ResolveError::NoAddress(host.to_string()))
    }
}

impl Default for CachedResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver for CachedResolver {
    fn resolve(&self, host: &str) -> Result<IpAddr, ResolveError> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        let host = host.to_lowercase();
        let cache = match self.cache {
            Some(ref cache) => cache,
            None => return Self::lookup(&host),
        };

        if let Some(ip) = cache.get(&host) {
            log::trace!("resolver cache hit: {} -> {}", host, ip);
            return Ok(ip);
        }

        let ip = Self::lookup(&host)?;
        cache.insert(host, ip);
        Ok(ip)
    }
}
