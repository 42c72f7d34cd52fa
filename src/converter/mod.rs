//! Format converters for IP list files.

mod cidr;

pub use cidr::CidrParser;
