//! Host header classification
//!
//! Splitting follows the usual `host:port` grammar: IPv6 literals must be
//! bracketed when a port is present, and an address without any port is
//! reported separately so callers can fall back to the whole string.

use crate::{Result, SharingError};
use std::fmt;

/// Why a `host:port` string could not be split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostPortError {
    /// No `:port` suffix
    MissingPort,
    /// Unbracketed host contains a colon
    TooManyColons,
    /// `[` without a matching `]`
    MissingCloseBracket,
    /// `[` after the start of the address
    UnexpectedOpenBracket,
    /// `]` outside the host part
    UnexpectedCloseBracket,
}

impl fmt::Display for HostPortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MissingPort => "missing port in address",
            Self::TooManyColons => "too many colons in address",
            Self::MissingCloseBracket => "missing ']' in address",
            Self::UnexpectedOpenBracket => "unexpected '[' in address",
            Self::UnexpectedCloseBracket => "unexpected ']' in address",
        };
        f.write_str(reason)
    }
}

/// Split `host:port` or `[host]:port` into host and port
///
/// An empty port (`host:`) is not an error.
pub fn split_host_port(hostport: &str) -> std::result::Result<(&str, &str), HostPortError> {
    let Some(colon) = hostport.rfind(':') else {
        return Err(HostPortError::MissingPort);
    };

    let (host, host_start, host_end) = if hostport.starts_with('[') {
        let Some(close) = hostport.find(']') else {
            return Err(HostPortError::MissingCloseBracket);
        };
        if close + 1 == hostport.len() {
            return Err(HostPortError::MissingPort);
        }
        if close + 1 != colon {
            if hostport.as_bytes()[close + 1] == b':' {
                return Err(HostPortError::TooManyColons);
            }
            return Err(HostPortError::MissingPort);
        }
        (&hostport[1..close], 1, close + 1)
    } else {
        let host = &hostport[..colon];
        if host.contains(':') {
            return Err(HostPortError::TooManyColons);
        }
        (host, 0, 0)
    };

    if hostport[host_start..].contains('[') {
        return Err(HostPortError::UnexpectedOpenBracket);
    }
    if hostport[host_end..].contains(']') {
        return Err(HostPortError::UnexpectedCloseBracket);
    }

    Ok((host, &hostport[colon + 1..]))
}

/// Strip the port from a Host header value
///
/// A value without a port is returned as is, minus IPv6 brackets.
pub fn bare_host(host: &str) -> Result<&str> {
    match split_host_port(host) {
        Ok((bare, _)) => Ok(bare),
        Err(HostPortError::MissingPort) => Ok(host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)),
        Err(e) => Err(SharingError::MalformedHost {
            host: host.to_string(),
            reason: e.to_string(),
        }),
    }
}

/// Compare two hosts ignoring ports
pub fn compare_hosts(a: &str, b: &str) -> Result<bool> {
    Ok(bare_host(a)? == bare_host(b)?)
}
