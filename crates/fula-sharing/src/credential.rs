//! Credential decoding
//!
//! A credential in a share URL is either a serialized access grant
//! (base58check version 0) or an access key id (version 1) that the auth
//! service turns into a grant.

use crate::authservice::AccessKeyResolver;
use crate::{Result, SharingError};
use fula_storage::{check_decode, AccessGrant, ObjectStorage, ACCESS_GRANT_VERSION, ACCESS_KEY_ID_VERSION};
use std::borrow::Cow;
use std::sync::Arc;
use tracing::debug;

/// Which grants an access key id may resolve to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Reject grants the auth service does not flag as public
    PublicOnly,
    /// Accept private grants as well
    AllowPrivate,
}

/// Turns credential tokens into access grants
pub struct CredentialDecoder {
    storage: Arc<dyn ObjectStorage>,
    resolver: Arc<dyn AccessKeyResolver>,
}

impl CredentialDecoder {
    /// Create a decoder over a storage parser and an access key resolver
    pub fn new(storage: Arc<dyn ObjectStorage>, resolver: Arc<dyn AccessKeyResolver>) -> Self {
        Self { storage, resolver }
    }

    /// Decode a credential token
    pub async fn decode(&self, token: &str, policy: AccessPolicy) -> Result<AccessGrant> {
        let (version, _) = check_decode(token).map_err(|_| SharingError::InvalidCredential)?;

        let serialized: Cow<'_, str> = match version {
            ACCESS_KEY_ID_VERSION => {
                let resolved = self.resolver.resolve(token).await?;
                if !resolved.public && policy == AccessPolicy::PublicOnly {
                    return Err(SharingError::NonPublicCredential);
                }
                Cow::Owned(resolved.access_grant)
            }
            ACCESS_GRANT_VERSION => Cow::Borrowed(token),
            other => return Err(SharingError::UnsupportedCredentialVersion(other)),
        };

        self.storage.parse_access(&serialized).map_err(|e| {
            debug!(error = %e, "Failed to parse access grant");
            SharingError::InvalidCredential
        })
    }
}
