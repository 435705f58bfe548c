//! PostgreSQL wire-envelope decoding.
//!
//! Only the two client messages the cache needs: the startup packet
//! (which names the target database) and the simple-protocol `Query`
//! message (which carries SQL text). Server messages are never decoded
//! here; the proxy host hands their interesting fields over as
//! attributes.
//!
//! Framing: every regular message is a type byte followed by a
//! big-endian `i32` length that counts itself but not the type byte.
//! The startup packet alone has no type byte.

mod query;
mod startup;

pub use query::simple_query_text;
pub use startup::StartupPacket;

use thiserror::Error;

/// Wire decoding errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    /// Message shorter than its fixed header
    #[error("message truncated: {0} bytes")]
    Truncated(usize),

    /// Length field disagrees with the buffer
    #[error("message length {length} exceeds buffer of {available} bytes")]
    BadLength { length: usize, available: usize },

    /// Unexpected message type byte
    #[error("unexpected message type {0:#04x}")]
    UnexpectedType(u8),

    /// A string field was not valid UTF-8
    #[error("non-UTF-8 string in message")]
    InvalidString,
}

/// Reads the big-endian `i32` at `offset`, as an unsigned value.
pub(crate) fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, WireError> {
    let end = offset + 4;
    if bytes.len() < end {
        return Err(WireError::Truncated(bytes.len()));
    }
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&bytes[offset..end]);
    Ok(u32::from_be_bytes(raw))
}
