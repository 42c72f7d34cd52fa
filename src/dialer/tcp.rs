//! Plain TCP dialer.

use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use super::Dialer;
use crate::error::{Error, Result};

/// TcpDialer connects directly with `std::net::TcpStream`.
///
/// Accepts the networks `tcp`, `tcp4` and `tcp6`. The family-specific
/// names only try addresses of that family.
#[derive(Debug, Clone, Default)]
pub struct TcpDialer {
    connect_timeout: Option<Duration>,
}

impl TcpDialer {
    /// Create a dialer without a connect timeout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a timeout applied to each connect attempt.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Get the connect timeout.
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }
}

impl Dialer for TcpDialer {
    type Conn = TcpStream;

    fn dial(&self, network: &str, address: &str) -> Result<TcpStream> {
        let family: fn(&std::net::SocketAddr) -> bool = match network {
            "tcp" => |_| true,
            "tcp4" => |addr| addr.is_ipv4(),
            "tcp6" => |addr| addr.is_ipv6(),
            other => return Err(Error::UnsupportedNetwork(other.to_string())),
        };

        let dial_err = |source| Error::Dial {
            address: address.to_string(),
            source,
        };

        let addrs = address.to_socket_addrs().map_err(dial_err)?;
        let mut last_err = None;

        for addr in addrs.filter(family) {
            let attempt = match self.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Ok(stream),
                Err(e) => {
                    log::debug!("connect {} failed: {}", addr, e);
                    last_err = Some(e);
                }
            }
        }

        Err(dial_err(last_err.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrNotAvailable,
                format!("no {} address for {}", network, address),
            )
        })))
    }
}
