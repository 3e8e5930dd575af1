use serde::Serialize;
use std::fmt;

/// How a file is turned into a frame. The choice is an optimization only:
/// both strategies yield the same frame for the same content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStrategy {
    /// One-pass parse of the whole file
    Direct,
    /// Count pass, sample pass, then a segment-by-segment parse that is
    /// concatenated in file order
    Chunked,
}

impl LoadStrategy {
    /// Fixed size policy: files at or above `threshold_bytes` are chunked.
    /// This is a plain constant, not an estimate of available memory.
    pub fn select(file_size: u64, threshold_bytes: u64) -> Self {
        if file_size >= threshold_bytes {
            Self::Chunked
        } else {
            Self::Direct
        }
    }
}

impl fmt::Display for LoadStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Chunked => f.write_str("chunked"),
        }
    }
}

/// Total row count as reported by the count pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RowCount {
    Known(usize),
    /// The count pass failed; the load itself still went ahead
    Unknown,
}

impl fmt::Display for RowCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(n) => write!(f, "{n}"),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}
