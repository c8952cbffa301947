//! # Fula Sharing
//!
//! Routing and access resolution for the Fula link sharing gateway.
//!
//! A link sharing request is either addressed to the gateway's own host,
//! carrying its credential in the path, or to a custom domain whose DNS TXT
//! records name a credential and a storage root.
//!
//! ## Architecture
//!
//! ```text
//!                ┌──────────────┐
//!   request ───► │ ShareRouter  │
//!                └──────┬───────┘
//!        same host      │      other host
//!      ┌────────────────┴────────────────┐
//!      ▼                                 ▼
//! ┌──────────────────┐        ┌──────────────────────┐
//! │ TraditionalPath  │        │ CustomDomainResolver │
//! └────────┬─────────┘        │  TxtRecordCache      │
//!          │                  │  TxtResolver (DNS)   │
//!          │                  └──────────┬───────────┘
//!          ▼                             ▼
//! ┌─────────────────────────────────────────────────┐
//! │ CredentialDecoder  (AccessKeyResolver for ids)  │
//! └────────────────────────┬────────────────────────┘
//!                          ▼
//!               ObjectStorage / Project
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use fula_sharing::{ShareRouter, Resolution};
//!
//! match router.resolve(&Method::GET, host, path).await? {
//!     Resolution::Object { object, project, .. } => { /* serve bytes */ }
//!     Resolution::Listing { listing, project, .. } => { /* render */ }
//!     Resolution::Redirect { location, permanent } => { /* 301/302 */ }
//! }
//! ```

pub mod authservice;
pub mod credential;
pub mod dns;
pub mod error;
pub mod host;
pub mod mapper;
pub mod path;
pub mod router;
pub mod txt;

pub use authservice::{
    AccessKeyResolver, AuthServiceClient, AuthServiceConfig, AuthServiceError, NoAuthService,
    ResolvedAccess,
};
pub use credential::{AccessPolicy, CredentialDecoder};
pub use dns::{DnsError, HickoryTxtResolver, TxtResolver};
pub use error::{Result, SharingError};
pub use host::{bare_host, compare_hosts, split_host_port, HostPortError};
pub use mapper::determine_bucket_and_key;
pub use path::TraditionalPath;
pub use router::{
    close_project, encode_path, make_location, parse_url_base, Breadcrumb, Listing, Mode, Resolution,
    RoutingResult, ShareRouter, DEFAULT_REQUEST_TIMEOUT,
};
pub use txt::{CustomDomainResolver, TxtRecordCache, TxtRecordEntry, TxtRecordSet};
