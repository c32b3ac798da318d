//! Request trace loading.
//!
//! A trace is a JSON Lines file, one request per line:
//!
//! ```text
//! # warm the line, then hit it
//! {"op": "write", "addr": 64, "data": 7}
//! {"op": "read", "addr": 68}
//! {"op": "read", "x": 10, "y": 6, "mip": 1}
//! {"op": "flush"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::common::{CacheKey, Request};

/// Trace parsing failure.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be read.
    #[error("cannot read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A line is not a valid trace object.
    #[error("line {line}: {source}")]
    Json {
        /// 1-based line number.
        line: usize,
        /// Parser error.
        #[source]
        source: serde_json::Error,
    },

    /// A line has no usable key.
    #[error("line {line}: {reason}")]
    Key {
        /// 1-based line number; 0 for entries built in code.
        line: usize,
        /// What is wrong with the key fields.
        reason: &'static str,
    },
}

/// Operation of a trace entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceOp {
    /// Read request.
    Read,
    /// Write request.
    Write,
    /// Flush of all dirty lines.
    Flush,
}

/// One line of a trace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceEntry {
    /// Operation.
    pub op: TraceOp,
    /// Byte address, for linear caches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub addr: Option<u64>,
    /// Pixel column, for tile caches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<u32>,
    /// Pixel row, for tile caches.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<u32>,
    /// Mip level, for tile caches.
    #[serde(default)]
    pub mip: u8,
    /// Value to write.
    #[serde(default)]
    pub data: u32,
    /// Source line, filled in by the parser.
    #[serde(skip)]
    pub line: usize,
}

/// What the simulator should do for an entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceAction {
    /// Submit a request.
    Access(Request),
    /// Flush the cache.
    Flush,
}

impl TraceEntry {
    /// Linear read entry.
    pub const fn read(addr: u64) -> Self {
        Self::linear(TraceOp::Read, addr, 0)
    }

    /// Linear write entry.
    pub const fn write(addr: u64, data: u32) -> Self {
        Self::linear(TraceOp::Write, addr, data)
    }

    /// Flush entry.
    pub const fn flush() -> Self {
        Self {
            op: TraceOp::Flush,
            addr: None,
            x: None,
            y: None,
            mip: 0,
            data: 0,
            line: 0,
        }
    }

    const fn linear(op: TraceOp, addr: u64, data: u32) -> Self {
        Self {
            op,
            addr: Some(addr),
            x: None,
            y: None,
            mip: 0,
            data,
            line: 0,
        }
    }

    /// Key named by the entry.
    ///
    /// # Errors
    ///
    /// [`TraceError::Key`] unless exactly one of `addr` or the `x`/`y` pair is given.
    pub fn key(&self) -> Result<CacheKey, TraceError> {
        let reason = match (self.addr, self.x, self.y) {
            (Some(addr), None, None) => return Ok(CacheKey::linear(addr)),
            (None, Some(x), Some(y)) => return Ok(CacheKey::texel(x, y, self.mip)),
            (Some(_), _, _) => "addr cannot be combined with x/y",
            (None, None, None) => "missing addr or x/y",
            (None, _, _) => "x and y must be given together",
        };
        Err(TraceError::Key {
            line: self.line,
            reason,
        })
    }

    /// Converts the entry into a simulator action.
    ///
    /// # Errors
    ///
    /// As [`TraceEntry::key`] for reads and writes.
    pub fn action(&self) -> Result<TraceAction, TraceError> {
        Ok(match self.op {
            TraceOp::Read => TraceAction::Access(Request::read(self.key()?)),
            TraceOp::Write => TraceAction::Access(Request::write(self.key()?, self.data)),
            TraceOp::Flush => TraceAction::Flush,
        })
    }
}

/// Parses a JSON Lines trace.
///
/// # Errors
///
/// [`TraceError::Json`] or [`TraceError::Key`] naming the first bad line.
pub fn parse(text: &str) -> Result<Vec<TraceEntry>, TraceError> {
    let mut entries = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let raw = raw.trim();
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        let mut entry: TraceEntry =
            serde_json::from_str(raw).map_err(|source| TraceError::Json { line, source })?;
        entry.line = line;
        let _ = entry.action()?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Reads and parses a trace file.
///
/// # Errors
///
/// [`TraceError::Io`] if the file cannot be read, otherwise as [`parse`].
pub fn load(path: impl AsRef<Path>) -> Result<Vec<TraceEntry>, TraceError> {
    parse(&fs::read_to_string(path)?)
}
