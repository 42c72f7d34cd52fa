//! CIDR text parser.

use ipnet::IpNet;
use std::io::{BufRead, BufReader, Read};

use crate::{Error, IpRangeList, NetworkRange, Result};

/// Parses CIDR notation into an [`IpRangeList`].
///
/// Input has one `network/prefix` entry per line. `#` starts a comment and
/// blank lines are skipped:
///
/// ```text
/// # private ranges
/// 10.0.0.0/8
/// 192.168.0.0/16   # home
/// fc00::/7
/// ```
pub struct CidrParser;

impl CidrParser {
    /// Parse CIDR lines from a reader.
    pub fn parse<R: Read>(reader: R) -> Result<IpRangeList> {
        let mut ranges = Vec::new();

        for line in BufReader::new(reader).lines() {
            let line = line?;

            // Remove comments
            let line = match line.find('#') {
                Some(idx) => &line[..idx],
                None => &line,
            };
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            let net: IpNet = line
                .parse()
                .map_err(|_| Error::InvalidCidrPattern(line.to_string()))?;
            ranges.push(NetworkRange::from(net));
        }

        log::debug!("parsed {} CIDR range(s)", ranges.len());
        Ok(IpRangeList::from_ranges(ranges))
    }
}
