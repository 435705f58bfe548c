//! Session-key shape validation.
//!
//! The keyspace mixes session keys (`address:port`, exactly one colon)
//! with response and index keys (two or more colons). The sweeper must
//! only ever touch keys whose *syntax* is an address; it never tries to
//! read meaning out of compound keys.

use std::net::Ipv4Addr;

/// True when `candidate` looks like `host:port` or `IPv4:port`.
pub fn is_session_address(candidate: &str) -> bool {
    validate_host_port(candidate) || validate_address_port(candidate)
}

/// Validates an `IPv4:port` string.
pub fn validate_address_port(candidate: &str) -> bool {
    let Some((host, port)) = split_host_port(candidate) else {
        return false;
    };
    host.parse::<Ipv4Addr>().is_ok() && port_in_range(port)
}

/// Validates a `host:port` string. There is little to check on the
/// host side beyond non-emptiness.
pub fn validate_host_port(candidate: &str) -> bool {
    let Some((host, port)) = split_host_port(candidate) else {
        return false;
    };
    !host.is_empty() && port_in_range(port)
}

/// Splits on the single `:`; more or fewer colons is not an address.
fn split_host_port(candidate: &str) -> Option<(&str, &str)> {
    let mut parts = candidate.split(':');
    let host = parts.next()?;
    let port = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    Some((host, port))
}

fn port_in_range(port: &str) -> bool {
    matches!(port.parse::<u16>(), Ok(port) if port > 0)
}
