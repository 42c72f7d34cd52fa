//! Dialer trait and implementations.

mod routing;
mod tcp;

pub use routing::{split_host_port, RoutingDialer};
pub use tcp::TcpDialer;

use std::sync::Arc;

use crate::Result;

/// Dialer establishes a connection to a network address.
///
/// `network` names the transport (for example `tcp`) and `address` is a
/// `host:port` string. Dialers are shared between concurrent connection
/// attempts and must be safe to call without external locking.
pub trait Dialer: Send + Sync {
    /// Connection type produced by this dialer.
    type Conn;

    /// Connect to `address` over `network`.
    fn dial(&self, network: &str, address: &str) -> Result<Self::Conn>;
}

impl<D: Dialer + ?Sized> Dialer for &D {
    type Conn = D::Conn;

    fn dial(&self, network: &str, address: &str) -> Result<Self::Conn> {
        (**self).dial(network, address)
    }
}

impl<D: Dialer + ?Sized> Dialer for Arc<D> {
    type Conn = D::Conn;

    fn dial(&self, network: &str, address: &str) -> Result<Self::Conn> {
        (**self).dial(network, address)
    }
}

impl<D: Dialer + ?Sized> Dialer for Box<D> {
    type Conn = D::Conn;

    fn dial(&self, network: &str, address: &str) -> Result<Self::Conn> {
        (**self).dial(network, address)
    }
}
