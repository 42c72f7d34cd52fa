//! IP range list: loading, membership and serialization.
//!
//! List files are plain text, optionally gzip compressed (`.gz` suffix),
//! with one `<base-ip> <mask-ip>` entry per line:
//!
//! ```text
//! 10.0.0.0 255.0.0.0
//! 192.168.0.0 255.255.0.0
//! fc00:: fe00::
//! ```

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::net::IpAddr;
use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::range::NetworkRange;

/// Ordered, immutable list of network ranges.
///
/// Entries keep file line order. Order has no effect on membership,
/// only on which entry is reported in the debug log when several match.
#[derive(Debug, Clone, Default)]
pub struct IpRangeList {
    ranges: Vec<NetworkRange>,
    diag: Diagnostics,
}

impl IpRangeList {
    /// Create a list from ranges already in memory.
    pub fn from_ranges<I>(ranges: I) -> Self
    where
        I: IntoIterator<Item = NetworkRange>,
    {
        Self {
            ranges: ranges.into_iter().collect(),
            diag: Diagnostics::global(),
        }
    }

    /// Replace the logging sink used by [`contains`](Self::contains).
    pub fn with_diagnostics(mut self, diag: Diagnostics) -> Self {
        self.diag = diag;
        self
    }

    /// Load a list file, logging through the global logger.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, Diagnostics::global())
    }

    /// Load a list file.
    ///
    /// Paths ending in `.gz` are decompressed while reading, including
    /// files made of several concatenated gzip members. Any malformed line
    /// fails the whole load; no partial list is returned.
    pub fn load_with(path: impl AsRef<Path>, diag: Diagnostics) -> Result<Self> {
        let path = path.as_ref();
        diag.info(format_args!("load iplist from file {}", path.display()));

        let file = File::open(path).map_err(|e| {
            diag.error(format_args!("open {}: {}", path.display(), e));
            Error::Io(e)
        })?;

        if is_gzip(path) {
            Self::from_reader_with(MultiGzDecoder::new(file), diag)
        } else {
            Self::from_reader_with(file, diag)
        }
    }

    /// Parse a list from a reader, logging through the global logger.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with(reader, Diagnostics::global())
    }

    /// Parse a list from a reader.
    pub fn from_reader_with<R: Read>(reader: R, diag: Diagnostics) -> Result<Self> {
        let mut reader = BufReader::new(reader);
        let mut ranges = Vec::new();
        let mut line = Vec::new();
        let mut line_no = 0;

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line).map_err(|e| {
                diag.error(format_args!("read iplist: {}", e));
                Error::Io(e)
            })?;
            // A zero-length read is the true end of stream; a final line
            // without a newline still arrives with read > 0.
            if read == 0 {
                break;
            }
            line_no += 1;

            let parsed = std::str::from_utf8(&line)
                .map_err(|e| format!("not valid UTF-8: {}", e))
                .and_then(parse_entry);
            match parsed {
                Ok(range) => ranges.push(range),
                Err(reason) => {
                    diag.error(format_args!("iplist line {}: {}", line_no, reason));
                    return Err(Error::MalformedEntry {
                        line: line_no,
                        reason,
                    });
                }
            }
        }

        diag.info(format_args!("iplist loaded {} record(s).", ranges.len()));
        Ok(Self { ranges, diag })
    }

    /// Check if `ip` lies inside any range.
    pub fn contains(&self, ip: IpAddr) -> bool {
        match self.ranges.iter().find(|range| range.contains(ip)) {
            Some(range) => {
                self.diag.debug(format_args!("[{}] matched {}", range, ip));
                true
            }
            None => {
                self.diag.debug(format_args!("{} not matched", ip));
                false
            }
        }
    }

    /// Get the ranges in file order.
    pub fn ranges(&self) -> &[NetworkRange] {
        &self.ranges
    }

    /// Iterate over the ranges in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, NetworkRange> {
        self.ranges.iter()
    }

    /// Get the number of ranges.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the list has no ranges.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Write the list in text format, one entry per line.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        for range in &self.ranges {
            writeln!(writer, "{}", range)?;
        }
        Ok(())
    }

    /// Save the list to a file, gzip compressed if the path ends in `.gz`.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.write_file(path).map_err(|e| {
            self.diag.error(format_args!("save {}: {}", path.display(), e));
            e
        })?;

        self.diag.info(format_args!(
            "saved {} record(s) to {}",
            self.ranges.len(),
            path.display()
        ));
        Ok(())
    }

    fn write_file(&self, path: &Path) -> Result<()> {
        let file = BufWriter::new(File::create(path)?);

        if is_gzip(path) {
            let mut encoder = GzEncoder::new(file, Compression::default());
            self.write_to(&mut encoder)?;
            encoder.finish()?.flush()?;
        } else {
            let mut file = file;
            self.write_to(&mut file)?;
            file.flush()?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a IpRangeList {
    type Item = &'a NetworkRange;
    type IntoIter = std::slice::Iter<'a, NetworkRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

/// Check for the gzip file suffix.
fn is_gzip(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "gz")
}

/// Parse one `<base> <mask>` line.
fn parse_entry(line: &str) -> std::result::Result<NetworkRange, String> {
    let line = line.trim_matches(|c| matches!(c, '\r' | '\n' | ' '));
    let mut tokens = line.split(' ');

    let (base, mask) = match (tokens.next(), tokens.next()) {
        (Some(base), Some(mask)) => (base, mask),
        _ => return Err(format!("expected `<base> <mask>`, got {:?}", line)),
    };

    let base: IpAddr = base
        .parse()
        .map_err(|_| format!("invalid base address {:?}", base))?;
    let mask: IpAddr = mask
        .parse()
        .map_err(|_| format!("invalid mask {:?}", mask))?;

    NetworkRange::new(base, mask)
        .ok_or_else(|| format!("mask {} is not the same address family as {}", mask, base))
}
