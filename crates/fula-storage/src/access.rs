//! Access grants and their base58check wire format
//!
//! A serialized access is `base58(version || payload || checksum)` where the
//! checksum is the first four bytes of `sha256(sha256(version || payload))`.
//! Version 0 is an ordinary access grant; other versions are reserved for
//! tokens that only look like one (see [`ACCESS_KEY_ID_VERSION`]).

use crate::{Result, StorageError};
use base58::{FromBase58, ToBase58};
use sha2::{Digest, Sha256};
use std::fmt;

/// Version byte of a self-contained access grant
pub const ACCESS_GRANT_VERSION: u8 = 0;

/// Version byte of an access key id issued by the auth service
pub const ACCESS_KEY_ID_VERSION: u8 = 1;

const CHECKSUM_LEN: usize = 4;

fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let first = Sha256::digest(data);
    let second = Sha256::digest(first);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&second[..CHECKSUM_LEN]);
    out
}

/// Decode a base58check string into its version byte and payload
pub fn check_decode(input: &str) -> Result<(u8, Vec<u8>)> {
    let decoded = input
        .from_base58()
        .map_err(|e| StorageError::InvalidAccess(format!("invalid base58: {:?}", e)))?;

    if decoded.len() < 1 + CHECKSUM_LEN {
        return Err(StorageError::InvalidAccess("input too short".to_string()));
    }

    let (body, sum) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if checksum(body).as_slice() != sum {
        return Err(StorageError::InvalidAccess("checksum mismatch".to_string()));
    }

    Ok((body[0], body[1..].to_vec()))
}

/// Encode a version byte and payload as base58check
pub fn check_encode(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);
    let sum = checksum(&data);
    data.extend_from_slice(&sum);
    data.to_base58()
}

/// A parsed access grant
///
/// The grant is scoped to exactly one project. It keeps its serialized form
/// so it can be handed back to clients (for example in listing links).
#[derive(Clone, PartialEq, Eq)]
pub struct AccessGrant {
    serialized: String,
    project: String,
}

impl AccessGrant {
    /// Create a grant for a project
    pub fn new(project: impl Into<String>) -> Self {
        let project = project.into();
        let serialized = check_encode(ACCESS_GRANT_VERSION, project.as_bytes());
        Self { serialized, project }
    }

    /// Parse a serialized access grant
    pub fn parse(serialized: &str) -> Result<Self> {
        let (version, payload) = check_decode(serialized)?;
        if version != ACCESS_GRANT_VERSION {
            return Err(StorageError::InvalidAccess(format!(
                "unexpected version {}",
                version
            )));
        }

        let project = String::from_utf8(payload)
            .map_err(|_| StorageError::InvalidAccess("project is not utf-8".to_string()))?;
        if project.is_empty() {
            return Err(StorageError::InvalidAccess("empty project".to_string()));
        }

        Ok(Self {
            serialized: serialized.to_string(),
            project,
        })
    }

    /// The serialized form of this grant
    pub fn serialize(&self) -> &str {
        &self.serialized
    }

    /// The project this grant opens
    pub fn project(&self) -> &str {
        &self.project
    }
}

impl fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The serialized form is a bearer credential; keep it out of logs.
        f.debug_struct("AccessGrant")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}
