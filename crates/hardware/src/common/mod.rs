//! Common types shared by every cache component.
//!
//! This module provides the vocabulary used across the crate:
//! 1. **Keys:** Linear addresses and tile coordinates, plus their resolved `(set, tag, offset)` form.
//! 2. **Transactions:** Requests, request ids, and responses.
//! 3. **Errors:** Configuration, submission, protocol, and invariant failures.

/// Request keys and resolved coordinates.
pub mod addr;

/// Request and response types.
pub mod data;

/// Error and diagnostic types.
pub mod error;

pub use addr::{CacheKey, ResolvedKey};
pub use data::{AccessKind, Request, RequestId, Response};
pub use error::{
    CacheError, ConfigError, InvariantViolation, ProtocolViolation, SubmitError,
};
