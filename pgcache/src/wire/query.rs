//! Simple-protocol `Query` message decoding.

use super::{read_u32, WireError};

/// Type byte of a simple-protocol query message.
const QUERY_TYPE: u8 = b'Q';

/// Extracts the SQL text from a wire `Query` message.
///
/// Layout: `'Q'`, big-endian `i32` length (counting itself), then the
/// SQL as a NUL-terminated string.
pub fn simple_query_text(bytes: &[u8]) -> Result<String, WireError> {
    if bytes.len() < 5 {
        return Err(WireError::Truncated(bytes.len()));
    }
    if bytes[0] != QUERY_TYPE {
        return Err(WireError::UnexpectedType(bytes[0]));
    }

    let length = read_u32(bytes, 1)? as usize;
    let end = 1 + length;
    if length < 4 || end > bytes.len() {
        return Err(WireError::BadLength {
            length,
            available: bytes.len(),
        });
    }

    let mut body = &bytes[5..end];
    if body.last() == Some(&0) {
        body = &body[..body.len() - 1];
    }
    std::str::from_utf8(body)
        .map(str::to_string)
        .map_err(|_| WireError::InvalidString)
}
