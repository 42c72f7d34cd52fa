//! Network range (base address plus netmask).

use ipnet::IpNet;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// NetworkRange is a `(base, mask)` pair.
///
/// The mask is used bitwise as given: it is not required to be a
/// contiguous run of leading ones, so a mask like `255.0.255.0` is
/// accepted and matched literally.
///
/// # Examples
/// ```
/// use ipfilter::NetworkRange;
/// use std::net::IpAddr;
///
/// let base: IpAddr = "10.0.0.0".parse().unwrap();
/// let mask: IpAddr = "255.0.0.0".parse().unwrap();
/// let range = NetworkRange::new(base, mask).unwrap();
///
/// assert!(range.contains("10.5.5.5".parse().unwrap()));
/// assert!(!range.contains("11.0.0.1".parse().unwrap()));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkRange {
    base: IpAddr,
    mask: IpAddr,
}

impl NetworkRange {
    /// Create a range. Returns `None` when `base` and `mask` belong to
    /// different address families.
    ///
    /// An IPv4-mapped IPv6 base (`::ffff:10.0.0.0`) is stored as IPv4. If
    /// its mask is IPv6, the low 32 bits of the mask are used.
    pub fn new(base: IpAddr, mask: IpAddr) -> Option<Self> {
        let (base, mask) = normalize(base, mask);
        if base.is_ipv4() != mask.is_ipv4() {
            return None;
        }
        Some(Self { base, mask })
    }

    /// Get the base address.
    pub fn base(&self) -> IpAddr {
        self.base
    }

    /// Get the mask.
    pub fn mask(&self) -> IpAddr {
        self.mask
    }

    /// Check if `ip & mask == base & mask`.
    ///
    /// IPv4-mapped IPv6 addresses are compared as IPv4. Any other family
    /// mismatch never matches.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match (self.base, self.mask, ip.to_canonical()) {
            (IpAddr::V4(base), IpAddr::V4(mask), IpAddr::V4(ip)) => {
                let mask = u32::from(mask);
                u32::from(ip) & mask == u32::from(base) & mask
            }
            (IpAddr::V6(base), IpAddr::V6(mask), IpAddr::V6(ip)) => {
                let mask = u128::from(mask);
                u128::from(ip) & mask == u128::from(base) & mask
            }
            _ => false,
        }
    }
}

impl From<IpNet> for NetworkRange {
    fn from(net: IpNet) -> Self {
        let (base, mask) = normalize(net.network(), net.netmask());
        Self { base, mask }
    }
}

/// Fold an IPv4-mapped base, and a v6 mask paired with it, down to IPv4.
fn normalize(base: IpAddr, mask: IpAddr) -> (IpAddr, IpAddr) {
    match (base.to_canonical(), mask) {
        (IpAddr::V4(v4), IpAddr::V6(mask)) if base.is_ipv6() => {
            (IpAddr::V4(v4), IpAddr::V4(Ipv4Addr::from(u128::from(mask) as u32)))
        }
        (canonical, mask) => (canonical, mask),
    }
}

/// Formats as a list file line without the newline: `<base> <mask>`.
impl fmt::Display for NetworkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.base, self.mask)
    }
}
