//! Requests and responses exchanged with the requester.
//!
//! This module defines the transaction vocabulary of a cache engine:
//! 1. **Access Kind:** Whether the requester reads or writes a word/pixel.
//! 2. **Requests:** What the requester submits; captured by the engine at admission.
//! 3. **Responses:** What the engine delivers once the request completes, tagged with its id.

use std::fmt;

use super::addr::CacheKey;

/// Type of cache access.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Returns the word or pixel stored at the key.
    Read,
    /// Stores a word or pixel at the key and marks the line dirty.
    Write,
}

/// A single read or write issued by the requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Request {
    /// Read or write.
    pub kind: AccessKind,
    /// Address or tile coordinate.
    pub key: CacheKey,
    /// Value to store; ignored for reads.
    pub data: u32,
}

impl Request {
    /// Creates a read request.
    pub const fn read(key: CacheKey) -> Self {
        Self {
            kind: AccessKind::Read,
            key,
            data: 0,
        }
    }

    /// Creates a write request.
    pub const fn write(key: CacheKey, data: u32) -> Self {
        Self {
            kind: AccessKind::Write,
            key,
            data,
        }
    }
}

/// Identifier handed out by `submit` and echoed in the matching response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Completion delivered to the requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Response {
    /// A read or write finished.
    Access {
        /// Id returned by `submit`.
        id: RequestId,
        /// Kind of the original request.
        kind: AccessKind,
        /// Whether the key was resident when the request was checked.
        hit: bool,
        /// Value read, or the value written (masked to the word width).
        data: u32,
    },
    /// A flush finished; every dirty line has been written back.
    Flushed {
        /// Id returned by `flush`.
        id: RequestId,
        /// Number of lines written back.
        lines_written: u32,
    },
}

impl Response {
    /// Returns the id of the request this response completes.
    pub const fn id(&self) -> RequestId {
        match self {
            Self::Access { id, .. } | Self::Flushed { id, .. } => *id,
        }
    }

    /// Returns the payload value for an access response.
    pub const fn data(&self) -> Option<u32> {
        match self {
            Self::Access { data, .. } => Some(*data),
            Self::Flushed { .. } => None,
        }
    }

    /// Returns `true` if this is an access response that hit.
    pub const fn is_hit(&self) -> bool {
        matches!(self, Self::Access { hit: true, .. })
    }
}
