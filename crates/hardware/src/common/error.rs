//! Error and diagnostic definitions.
//!
//! The cache distinguishes four classes of failure:
//! 1. **Configuration:** Invalid geometry; the engine cannot be constructed.
//! 2. **Submission:** The requester broke the single-flight rule or sent the wrong key kind.
//! 3. **Protocol:** The memory collaborator delivered something nobody asked for.
//!    These are non-fatal; the engine discards the unit and keeps going.
//! 4. **Invariant:** Metadata reached a state the commit logic must never produce. Fatal.

use thiserror::Error;

use super::data::RequestId;

/// Invalid cache or memory configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A count that indexes by bit slicing is not a power of two.
    #[error("{field} must be a non-zero power of two (got {value})")]
    NotPowerOfTwo {
        /// Configuration field name.
        field: &'static str,
        /// Rejected value.
        value: usize,
    },

    /// A line or tile dimension is zero.
    #[error("{field} must be non-zero")]
    ZeroLength {
        /// Configuration field name.
        field: &'static str,
    },

    /// Unsupported word or pixel width.
    #[error("word_bits must be 8, 16 or 32 (got {0})")]
    WordWidth(u32),

    /// A line is smaller than one word.
    #[error("line_bytes ({line_bytes}) is smaller than one {word_bytes}-byte word")]
    LineTooNarrow {
        /// Configured line size.
        line_bytes: usize,
        /// Size of one word.
        word_bytes: usize,
    },

    /// The address space cannot hold the offset and index fields.
    #[error("address_bits ({address_bits}) must be between {needed} and 64")]
    AddressBits {
        /// Configured address width.
        address_bits: u32,
        /// Bits consumed by offset and index.
        needed: u32,
    },

    /// A tile tag field is too narrow or the packed tag is too wide.
    #[error("tag field {field} has unusable width {bits}")]
    TagWidth {
        /// Tag field name.
        field: &'static str,
        /// Rejected width in bits.
        bits: u32,
    },

    /// Tile backing addresses (`tag * tile_bytes`) do not fit in 64 bits.
    #[error("tile tag ({tag_bits} bits) and offset ({offset_bits} bits) exceed 64 address bits")]
    TileAddressBits {
        /// Packed tag width.
        tag_bits: u32,
        /// `ceil(log2(tile_bytes))`.
        offset_bits: u32,
    },

    /// Malformed JSON configuration.
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),

    /// Configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejection of a request at admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SubmitError {
    /// Another request is still in flight.
    #[error("request {in_flight} is still in flight")]
    Busy {
        /// Id of the outstanding request.
        in_flight: RequestId,
    },

    /// The key kind does not match the cache's addressing mode.
    #[error("{expected} cache cannot accept this key")]
    KeyMismatch {
        /// Addressing mode of the cache (`"linear"` or `"tile"`).
        expected: &'static str,
    },
}

/// Unsolicited traffic from the memory collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// A burst beat arrived while no fill was outstanding.
    #[error("burst beat {data:#x} arrived with no outstanding fetch")]
    UnexpectedBeat {
        /// Discarded beat payload.
        data: u32,
        /// Whether the beat carried the last flag.
        last: bool,
    },

    /// A write acknowledgement arrived while no writeback was outstanding.
    #[error("write acknowledged with no outstanding writeback")]
    UnexpectedWriteAck,
}

/// Broken metadata invariant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    /// Two valid ways of one set hold the same tag.
    #[error("set {set} holds tag {tag:#x} in ways {first} and {second}")]
    DuplicateTag {
        /// Set index.
        set: usize,
        /// Duplicated tag.
        tag: u64,
        /// First matching way.
        first: usize,
        /// Second matching way.
        second: usize,
    },
}

/// Fatal error raised by a cache tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum CacheError {
    /// Metadata invariant broken.
    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}
