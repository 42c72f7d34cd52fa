//! Routing dialer: picks one of two dialers by destination IP.

use std::path::Path;

use super::Dialer;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::iplist::IpRangeList;
use crate::resolver::Resolver;
use crate::route::Route;

/// RoutingDialer sends each connection to `primary` or `secondary`.
///
/// The host of every dialed address is resolved and tested against the IP
/// list: addresses inside the list go to `primary`, everything else goes to
/// `secondary`. Without a list (or with an empty one) every connection goes
/// to `primary`.
///
/// The dialer is immutable after construction and can be shared between
/// threads; each `dial` is an independent decision.
///
/// # Examples
/// ```ignore
/// use ipfilter::{CachedResolver, Dialer, RoutingDialer, TcpDialer};
/// use std::path::Path;
///
/// let dialer = RoutingDialer::new(
///     TcpDialer::new(),          // in the list: connect directly
///     relay_dialer,              // outside the list
///     CachedResolver::new(),
///     Some(Path::new("/etc/ipfilter/direct.txt.gz")),
/// )?;
///
/// let conn = dialer.dial("tcp", "example.com:443")?;
/// ```
pub struct RoutingDialer<P, S, R> {
    primary: P,
    secondary: S,
    resolver: R,
    iplist: Option<IpRangeList>,
    diag: Diagnostics,
}

impl<P, S, R> RoutingDialer<P, S, R>
where
    P: Dialer,
    S: Dialer<Conn = P::Conn>,
    R: Resolver,
{
    /// Create a routing dialer, loading the IP list from `ip_list` if given.
    ///
    /// Fails if the list cannot be loaded; there is no partially
    /// configured dialer.
    pub fn new(primary: P, secondary: S, resolver: R, ip_list: Option<&Path>) -> Result<Self> {
        Self::with_diagnostics(primary, secondary, resolver, ip_list, Diagnostics::global())
    }

    /// Like [`new`](Self::new), logging through `diag`.
    pub fn with_diagnostics(
        primary: P,
        secondary: S,
        resolver: R,
        ip_list: Option<&Path>,
        diag: Diagnostics,
    ) -> Result<Self> {
        let iplist = match ip_list {
            Some(path) => Some(IpRangeList::load_with(path, diag.clone())?),
            None => None,
        };
        Ok(Self::from_list(primary, secondary, resolver, iplist, diag))
    }

    /// Create a routing dialer from a list already in memory.
    pub fn from_list(
        primary: P,
        secondary: S,
        resolver: R,
        iplist: Option<IpRangeList>,
        diag: Diagnostics,
    ) -> Self {
        let iplist = match iplist {
            Some(list) if list.is_empty() => {
                diag.warn(format_args!("iplist is empty, all connections use primary"));
                None
            }
            Some(list) => Some(list),
            None => {
                diag.info(format_args!("no iplist configured, all connections use primary"));
                None
            }
        };

        Self {
            primary,
            secondary,
            resolver,
            iplist,
            diag,
        }
    }

    /// Get the IP list, `None` when filtering is disabled.
    pub fn iplist(&self) -> Option<&IpRangeList> {
        self.iplist.as_ref()
    }

    /// Get the dialer used for addresses inside the list.
    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Get the dialer used for addresses outside the list.
    pub fn secondary(&self) -> &S {
        &self.secondary
    }

    /// Decide which dialer `address` would use, without dialing.
    pub fn route(&self, address: &str) -> Result<Route> {
        let iplist = match self.iplist {
            Some(ref list) => list,
            None => return Ok(Route::Primary),
        };

        let (host, _port) = split_host_port(address).map_err(|e| {
            self.diag.error(format_args!("{}", e));
            e
        })?;

        let ip = self.resolver.resolve(host).map_err(|source| {
            self.diag.error(format_args!("resolve {}: {}", host, source));
            Error::ResolutionFailed {
                host: host.to_string(),
                source,
            }
        })?;

        Ok(Route::from_match(iplist.contains(ip)))
    }
}

impl<P, S, R> Dialer for RoutingDialer<P, S, R>
where
    P: Dialer,
    S: Dialer<Conn = P::Conn>,
    R: Resolver,
{
    type Conn = P::Conn;

    fn dial(&self, network: &str, address: &str) -> Result<Self::Conn> {
        self.diag.debug(format_args!("address: {}", address));

        match self.route(address)? {
            Route::Primary => self.primary.dial(network, address),
            Route::Secondary => self.secondary.dial(network, address),
        }
    }
}

/// Split `host:port` at the last colon.
///
/// Brackets around an IPv6 host (`[::1]:443`) are removed.
pub fn split_host_port(address: &str) -> Result<(&str, &str)> {
    let idx = address
        .rfind(':')
        .ok_or_else(|| Error::InvalidAddress(address.to_string()))?;
    let (host, port) = (&address[..idx], &address[idx + 1..]);

    let host = host
        .strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host);

    Ok((host, port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::tests::MemoryLog;
    use crate::error::ResolveError;
    use crate::NetworkRange;
    use log::Level;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::net::IpAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Dialer that records calls and returns its own name.
    struct NamedDialer {
        name: &'static str,
        calls: AtomicUsize,
        fail: bool,
    }

    impl NamedDialer {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                fail: true,
                ..Self::new(name)
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl Dialer for NamedDialer {
        type Conn = &'static str;

        fn dial(&self, _network: &str, address: &str) -> Result<Self::Conn> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::UnsupportedNetwork(format!("{} {}", self.name, address)));
            }
            Ok(self.name)
        }
    }

    /// Resolver backed by a fixed table; IP literals resolve to themselves.
    #[derive(Default)]
    struct TableResolver {
        hosts: HashMap<String, IpAddr>,
        lookups: Mutex<Vec<String>>,
    }

    impl TableResolver {
        fn with(host: &str, ip: &str) -> Self {
            let mut resolver = Self::default();
            resolver.hosts.insert(host.to_string(), ip.parse().unwrap());
            resolver
        }
    }

    impl Resolver for TableResolver {
        fn resolve(&self, host: &str) -> std::result::Result<IpAddr, ResolveError> {
            self.lookups.lock().push(host.to_string());
            if let Ok(ip) = host.parse() {
                return Ok(ip);
            }
            self.hosts
                .get(host)
                .copied()
                .ok_or_else(|| ResolveError::NoAddress(host.to_string()))
        }
    }

    fn ten_slash_eight() -> IpRangeList {
        IpRangeList::from_ranges([NetworkRange::new(
            "10.0.0.0".parse().unwrap(),
            "255.0.0.0".parse().unwrap(),
        )
        .unwrap()])
    }

    type TestDialer<'a> = RoutingDialer<&'a NamedDialer, &'a NamedDialer, TableResolver>;

    fn routing<'a>(
        a: &'a NamedDialer,
        b: &'a NamedDialer,
        resolver: TableResolver,
        list: Option<IpRangeList>,
    ) -> TestDialer<'a> {
        RoutingDialer::from_list(a, b, resolver, list, Diagnostics::global())
    }

    #[test]
    fn test_match_goes_to_primary() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = routing(&a, &b, TableResolver::default(), Some(ten_slash_eight()));

        assert_eq!(dialer.dial("tcp", "10.5.5.5:80").unwrap(), "A");
        assert_eq!((a.calls(), b.calls()), (1, 0));
    }

    #[test]
    fn test_miss_goes_to_secondary() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = routing(&a, &b, TableResolver::default(), Some(ten_slash_eight()));

        assert_eq!(dialer.dial("tcp", "11.0.0.1:80").unwrap(), "B");
        assert_eq!((a.calls(), b.calls()), (0, 1));
    }

    #[test]
    fn test_hostname_is_resolved() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let resolver = TableResolver::with("intranet.local", "10.1.2.3");
        let dialer = routing(&a, &b, resolver, Some(ten_slash_eight()));

        assert_eq!(dialer.dial("tcp", "intranet.local:443").unwrap(), "A");
        assert_eq!(*dialer.resolver.lookups.lock(), vec!["intranet.local".to_string()]);
    }

    #[test]
    fn test_missing_port_separator() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = routing(&a, &b, TableResolver::default(), Some(ten_slash_eight()));

        let err = dialer.dial("tcp", "badaddress").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress(ref addr) if addr == "badaddress"));
        assert_eq!((a.calls(), b.calls()), (0, 0));
        assert!(dialer.resolver.lookups.lock().is_empty());
    }

    #[test]
    fn test_resolution_failure_invokes_neither() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = routing(&a, &b, TableResolver::default(), Some(ten_slash_eight()));

        let err = dialer.dial("tcp", "unknown.example:80").unwrap_err();
        assert!(matches!(
            err,
            Error::ResolutionFailed { ref host, source: ResolveError::NoAddress(_) }
                if host == "unknown.example"
        ));
        assert_eq!((a.calls(), b.calls()), (0, 0));
    }

    #[test]
    fn test_no_list_always_primary() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = routing(&a, &b, TableResolver::default(), None);

        assert!(dialer.iplist().is_none());
        assert_eq!(dialer.dial("tcp", "11.0.0.1:80").unwrap(), "A");
        // Filtering is off, so the address is never inspected
        assert_eq!(dialer.dial("tcp", "badaddress").unwrap(), "A");
        assert_eq!((a.calls(), b.calls()), (2, 0));
        assert!(dialer.resolver.lookups.lock().is_empty());
    }

    #[test]
    fn test_empty_list_always_primary() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = routing(&a, &b, TableResolver::default(), Some(IpRangeList::default()));

        assert!(dialer.iplist().is_none());
        assert_eq!(dialer.dial("tcp", "11.0.0.1:80").unwrap(), "A");
    }

    #[test]
    fn test_empty_list_logs_warning() {
        let sink = Arc::new(MemoryLog::default());
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let _dialer = RoutingDialer::from_list(
            &a,
            &b,
            TableResolver::default(),
            Some(IpRangeList::default()),
            Diagnostics::new(sink.clone()),
        );

        let warnings = sink.messages(Level::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("empty"));
    }

    #[test]
    fn test_delegate_error_returned_unchanged() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::failing("B"));
        let dialer = routing(&a, &b, TableResolver::default(), Some(ten_slash_eight()));

        let err = dialer.dial("tcp", "8.8.8.8:53").unwrap_err();
        assert!(matches!(err, Error::UnsupportedNetwork(ref msg) if msg == "B 8.8.8.8:53"));
        // No fallback to the other dialer
        assert_eq!((a.calls(), b.calls()), (0, 1));
    }

    #[test]
    fn test_route_without_dialing() {
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = routing(&a, &b, TableResolver::default(), Some(ten_slash_eight()));

        assert_eq!(dialer.route("10.0.0.1:22").unwrap(), Route::Primary);
        assert_eq!(dialer.route("[::1]:22").unwrap(), Route::Secondary);
        assert_eq!((a.calls(), b.calls()), (0, 0));
    }

    #[test]
    fn test_failures_are_logged() {
        let sink = Arc::new(MemoryLog::default());
        let (a, b) = (NamedDialer::new("A"), NamedDialer::new("B"));
        let dialer = RoutingDialer::from_list(
            &a,
            &b,
            TableResolver::default(),
            Some(ten_slash_eight()),
            Diagnostics::new(sink.clone()),
        );

        assert!(dialer.dial("tcp", "badaddress").is_err());
        assert!(dialer.dial("tcp", "nowhere:80").is_err());

        let errors = sink.messages(Level::Error);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("badaddress"));
        assert!(errors[1].contains("nowhere"));
    }

    #[test]
    fn test_concurrent_dials() {
        let a = Arc::new(NamedDialer::new("A"));
        let b = Arc::new(NamedDialer::new("B"));
        let dialer = Arc::new(RoutingDialer::from_list(
            a.clone(),
            b.clone(),
            TableResolver::default(),
            Some(ten_slash_eight()),
            Diagnostics::global(),
        ));

        std::thread::scope(|scope| {
            for i in 0..8 {
                let dialer = dialer.clone();
                scope.spawn(move || {
                    for j in 0..50u8 {
                        let addr = if (i + j as usize) % 2 == 0 {
                            format!("10.0.{}.{}:80", i, j)
                        } else {
                            format!("172.16.{}.{}:80", i, j)
                        };
                        let expected = if addr.starts_with("10.") { "A" } else { "B" };
                        assert_eq!(dialer.dial("tcp", &addr).unwrap(), expected);
                    }
                });
            }
        });

        assert_eq!(a.calls() + b.calls(), 400);
        assert_eq!(a.calls(), 200);
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("example.com:80").unwrap(), ("example.com", "80"));
        assert_eq!(split_host_port("[2001:db8::1]:443").unwrap(), ("2001:db8::1", "443"));
        assert_eq!(split_host_port("::1:443").unwrap(), ("::1", "443"));
        assert_eq!(split_host_port(":80").unwrap(), ("", "80"));
        assert!(matches!(
            split_host_port("badaddress"),
            Err(Error::InvalidAddress(_))
        ));
    }
}
