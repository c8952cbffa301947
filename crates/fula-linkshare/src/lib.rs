//! # Fula Link Sharing
//!
//! HTTP gateway that serves shared objects from Fula storage.
//!
//! This crate provides:
//! - **Share URLs**: `/{access}/{bucket}/{key}` pages, downloads, and listings
//! - **Raw URLs**: `/raw/{access}/{bucket}/{key}` byte serving
//! - **Custom domains**: hosting driven by `storj-access`/`storj-root` TXT records
//! - **Rate Limiting**: Per-client request throttling
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Browsers / curl                     │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                 Fula Link Sharing                   │
//! ├─────────────────────────────────────────────────────┤
//! │  Request ID │ Logging │ Rate Limiter │ CORS         │
//! ├─────────────────────────────────────────────────────┤
//! │        Share handler (pages, listings, bytes)       │
//! ├─────────────────────────────────────────────────────┤
//! │                    fula-sharing                     │
//! │     (hosts, credentials, TXT records, routing)      │
//! ├─────────────────────────────────────────────────────┤
//! │                    fula-storage                     │
//! │           (access grants, projects)                 │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod content;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use server::run_server;
pub use state::AppState;
