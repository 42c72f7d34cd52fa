//! ipfilter - IP-range based connection routing.
//!
//! This crate decides which of two dialers completes a connection, based
//! on whether the destination's resolved IP address falls inside a
//! configured list of network ranges. A typical use is sending local or
//! whitelisted networks directly while everything else goes through a
//! relay.
//!
//! # Quick Start
//!
//! ```ignore
//! use ipfilter::{CachedResolver, Dialer, RoutingDialer, TcpDialer};
//! use std::path::Path;
//!
//! let dialer = RoutingDialer::new(
//!     TcpDialer::new(),   // primary: destination is in the list
//!     relay,              // secondary: destination is not in the list
//!     CachedResolver::new(),
//!     Some(Path::new("direct.txt.gz")),
//! )?;
//!
//! let stream = dialer.dial("tcp", "example.com:443")?;
//! ```
//!
//! # IP List Format
//!
//! One `<base-ip> <mask-ip>` entry per line, optionally gzip compressed
//! when the file name ends in `.gz`:
//!
//! ```text
//! 10.0.0.0 255.0.0.0
//! 172.16.0.0 255.240.0.0
//! fc00:: fe00::
//! ```
//!
//! Any malformed line fails the load. Use [`converter::CidrParser`] to
//! produce a list from CIDR notation.
//!
//! # Routing
//!
//! - No list configured, or an empty list: always the primary dialer
//! - Resolved address inside the list: primary dialer
//! - Otherwise: secondary dialer
//!
//! Resolution failures and addresses without a port fail the dial
//! without touching either dialer.

mod config;
mod diagnostics;
mod error;
mod iplist;
mod range;
mod resolver;
mod route;

pub mod converter;
pub mod dialer;

// Re-export core types
pub use error::{Error, ResolveError, Result};
pub use iplist::IpRangeList;
pub use range::NetworkRange;
pub use route::Route;

// Re-export collaborators
pub use diagnostics::{Diagnostics, DEFAULT_TARGET};
pub use dialer::{split_host_port, Dialer, RoutingDialer, TcpDialer};
pub use resolver::{CachedResolver, Resolver, DEFAULT_CACHE_CAPACITY};

// Re-export configuration
pub use config::RoutingConfig;
