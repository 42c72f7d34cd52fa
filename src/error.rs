//! Error types for ipfilter.

use thiserror::Error;

/// Error type for ipfilter operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error while opening, reading or decompressing a list file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of an IP list file could not be parsed
    #[error("malformed entry at line {line}: {reason}")]
    MalformedEntry { line: usize, reason: String },

    /// Dial address without a `host:port` separator
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Hostname could not be resolved
    #[error("failed to resolve {host}: {source}")]
    ResolutionFailed {
        host: String,
        #[source]
        source: ResolveError,
    },

    /// Connection attempt failed
    #[error("dial {address} failed: {source}")]
    Dial {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Network name not understood by the dialer
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// Invalid CIDR pattern
    #[error("invalid CIDR pattern: {0}")]
    InvalidCidrPattern(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for ipfilter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for address resolution.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// Lookup succeeded but returned no addresses
    #[error("no address found for {0}")]
    NoAddress(String),

    /// System lookup failed
    #[error("lookup failed: {0}")]
    Lookup(#[from] std::io::Error),
}
