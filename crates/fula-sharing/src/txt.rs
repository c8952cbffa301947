//! Custom domain TXT records
//!
//! A custom domain publishes two TXT records:
//!
//! ```text
//! storj-access:<serialized access or access key id>
//! storj-root:<bucket>[/<prefix>]
//! ```
//!
//! Resolved records are kept in a [`TxtRecordCache`] for a fixed TTL.

use crate::credential::{AccessPolicy, CredentialDecoder};
use crate::dns::TxtResolver;
use crate::{Result, SharingError};
use dashmap::DashMap;
use fula_storage::AccessGrant;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, instrument};

/// Tag of the record holding the credential
pub const ACCESS_TAG: &str = "storj-access";

/// Tag of the record holding the storage root
pub const ROOT_TAG: &str = "storj-root";

/// The link sharing records found among a domain's TXT records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxtRecordSet {
    /// Credential token
    pub access: String,
    /// `bucket` or `bucket/prefix`
    pub root: String,
}

impl TxtRecordSet {
    /// Pick the tagged records out of a domain's TXT records
    ///
    /// Tags and values are separated by `:` or `=`. The first occurrence
    /// of each tag wins. Returns `None` unless both tags carry a value.
    pub fn parse<S: AsRef<str>>(records: &[S]) -> Option<Self> {
        let mut access = None;
        let mut root = None;

        for record in records {
            let Some((tag, value)) = record.as_ref().split_once([':', '=']) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            match tag.trim() {
                ACCESS_TAG if access.is_none() => access = Some(value.to_string()),
                ROOT_TAG if root.is_none() => root = Some(value.to_string()),
                _ => {}
            }
        }

        let root = root.filter(|r| !r.starts_with('/'))?;
        Some(Self { access: access?, root })
    }
}

/// A resolved custom domain
#[derive(Debug)]
pub struct TxtRecordEntry {
    /// Decoded grant
    pub access: AccessGrant,
    /// Storage root the domain maps to
    pub root: String,
    /// When the records were fetched
    pub fetched_at: Instant,
}

/// TTL cache of resolved custom domains, keyed by host
///
/// Entries are replaced as a whole on refresh. Expired entries are swept
/// at most once per TTL.
#[derive(Debug)]
pub struct TxtRecordCache {
    ttl: Duration,
    entries: DashMap<String, Arc<TxtRecordEntry>>,
    next_sweep: Mutex<Instant>,
}

impl TxtRecordCache {
    /// Create an empty cache
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            next_sweep: Mutex::new(Instant::now() + ttl),
        }
    }

    /// Entry lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the entry for `host` if it has not expired
    pub fn get(&self, host: &str) -> Option<Arc<TxtRecordEntry>> {
        let entry = self.entries.get(host)?;
        if entry.fetched_at.elapsed() < self.ttl {
            Some(Arc::clone(entry.value()))
        } else {
            None
        }
    }

    /// Store an entry, replacing any previous one
    pub fn insert(&self, host: impl Into<String>, entry: TxtRecordEntry) -> Arc<TxtRecordEntry> {
        let entry = Arc::new(entry);
        self.entries.insert(host.into(), Arc::clone(&entry));
        entry
    }

    /// Drop expired entries, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| entry.fetched_at.elapsed() < self.ttl);
        before.saturating_sub(self.entries.len())
    }

    /// Sweep expired entries if a TTL has passed since the last sweep
    ///
    /// Returns whether a sweep ran.
    pub fn purge_if_due(&self) -> bool {
        let now = Instant::now();
        {
            let mut next = self.next_sweep.lock();
            if now < *next {
                return false;
            }
            *next = now + self.ttl;
        }
        let removed = self.purge_expired();
        debug!(removed, remaining = self.entries.len(), "Swept TXT cache");
        true
    }

    /// Number of entries, expired ones included
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Resolves custom domains into grants and storage roots
pub struct CustomDomainResolver {
    cache: Arc<TxtRecordCache>,
    dns: Arc<dyn TxtResolver>,
    decoder: Arc<CredentialDecoder>,
    policy: AccessPolicy,
}

impl CustomDomainResolver {
    /// Create a resolver
    pub fn new(
        cache: Arc<TxtRecordCache>,
        dns: Arc<dyn TxtResolver>,
        decoder: Arc<CredentialDecoder>,
        policy: AccessPolicy,
    ) -> Self {
        Self {
            cache,
            dns,
            decoder,
            policy,
        }
    }

    /// The shared cache
    pub fn cache(&self) -> &Arc<TxtRecordCache> {
        &self.cache
    }

    /// Return the grant and storage root for a custom domain
    ///
    /// Served from the cache while the entry is live, otherwise looked up
    /// in DNS and decoded again.
    #[instrument(skip(self))]
    pub async fn fetch_access_for_host(&self, host: &str) -> Result<Arc<TxtRecordEntry>> {
        if let Some(entry) = self.cache.get(host) {
            debug!("TXT cache hit");
            return Ok(entry);
        }

        let records = self.dns.lookup_txt(host).await?;
        let set = TxtRecordSet::parse(&records)
            .ok_or_else(|| SharingError::CustomDomainNotConfigured(host.to_string()))?;

        let access = self.decoder.decode(&set.access, self.policy).await?;
        debug!(root = %set.root, "TXT records resolved");

        self.cache.purge_if_due();
        Ok(self.cache.insert(
            host,
            TxtRecordEntry {
                access,
                root: set.root,
                fetched_at: Instant::now(),
            },
        ))
    }
}
