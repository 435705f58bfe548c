//! Startup packet decoding.

use super::{read_u32, WireError};
use std::collections::HashMap;

/// Protocol version 3.0 (`3 << 16`).
const PROTOCOL_VERSION_3: u32 = 196_608;

/// Magic code of an SSL negotiation request.
const SSL_REQUEST_CODE: u32 = 80_877_103;

/// Magic code of a query-cancel request.
const CANCEL_REQUEST_CODE: u32 = 80_877_102;

/// First packet of a client connection.
///
/// Only [`StartupPacket::Startup`] names a database; the other variants
/// are recognized so callers can tell "no database yet" apart from a
/// malformed packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartupPacket {
    /// Protocol v3 startup with its parameter list (`user`, `database`, ...)
    Startup {
        protocol_version: u32,
        parameters: HashMap<String, String>,
    },
    /// SSL negotiation probe; the real startup follows on the same stream
    SslRequest,
    /// Out-of-band cancellation of a running query
    CancelRequest { process_id: u32, secret_key: u32 },
    /// SASL authentication continuation
    SaslInitialResponse,
}

impl StartupPacket {
    /// Decodes the first packet of a connection.
    ///
    /// The startup packet has no type byte: a big-endian `i32` length
    /// (counting itself) is followed by a version or magic code. A `p`
    /// byte instead marks a SASL initial response.
    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        if bytes.first() == Some(&b'p') {
            return Ok(StartupPacket::SaslInitialResponse);
        }

        if bytes.len() < 8 {
            return Err(WireError::Truncated(bytes.len()));
        }

        let length = read_u32(bytes, 0)? as usize;
        if length < 8 || length > bytes.len() {
            return Err(WireError::BadLength {
                length,
                available: bytes.len(),
            });
        }

        match read_u32(bytes, 4)? {
            SSL_REQUEST_CODE => Ok(StartupPacket::SslRequest),
            CANCEL_REQUEST_CODE => {
                if length < 16 {
                    return Err(WireError::BadLength {
                        length,
                        available: bytes.len(),
                    });
                }
                Ok(StartupPacket::CancelRequest {
                    process_id: read_u32(bytes, 8)?,
                    secret_key: read_u32(bytes, 12)?,
                })
            }
            version => Ok(StartupPacket::Startup {
                protocol_version: version,
                parameters: parse_parameters(&bytes[8..length])?,
            }),
        }
    }

    /// The `database` startup parameter, when this packet carries one.
    pub fn database(&self) -> Option<&str> {
        match self {
            StartupPacket::Startup { parameters, .. } => parameters
                .get("database")
                .map(String::as_str)
                .filter(|db| !db.is_empty()),
            _ => None,
        }
    }
}

/// Parses the NUL-terminated key/value pairs of a v3 startup body.
///
/// The list ends at an empty key; a missing terminator just ends the
/// list (some clients omit the final NUL).
fn parse_parameters(body: &[u8]) -> Result<HashMap<String, String>, WireError> {
    let mut parameters = HashMap::new();
    let mut rest = body;

    loop {
        let (key, after_key) = match take_cstr(rest)? {
            Some(pair) => pair,
            None => break,
        };
        if key.is_empty() {
            break;
        }
        let (value, after_value) = match take_cstr(after_key)? {
            Some(pair) => pair,
            None => break,
        };
        parameters.insert(key, value);
        rest = after_value;
    }

    Ok(parameters)
}

/// Splits the leading NUL-terminated string off `bytes`.
fn take_cstr(bytes: &[u8]) -> Result<Option<(String, &[u8])>, WireError> {
    if bytes.is_empty() {
        return Ok(None);
    }
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = std::str::from_utf8(&bytes[..end])
        .map_err(|_| WireError::InvalidString)?
        .to_string();
    let rest = if end < bytes.len() {
        &bytes[end + 1..]
    } else {
        &[]
    };
    Ok(Some((text, rest)))
}
