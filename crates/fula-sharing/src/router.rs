//! Request routing
//!
//! Decides, for a method, `Host` header and path, which object or listing a
//! request refers to:
//!
//! ```text
//! Host == base host ──► /{access}/{bucket}/{key}      (Traditional)
//!                   └─► /raw/{access}/{bucket}/{key}  (Raw)
//! Host != base host ──► TXT records ─► root + path    (CustomDomain)
//! ```

use crate::credential::{AccessPolicy, CredentialDecoder};
use crate::host::{bare_host, compare_hosts};
use crate::mapper::determine_bucket_and_key;
use crate::path::TraditionalPath;
use crate::txt::CustomDomainResolver;
use crate::{Result, SharingError};
use fula_storage::{AccessGrant, ObjectInfo, ObjectStorage, Project, StorageError};
use http::Method;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use url::Url;

/// Default deadline for routing a request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How a request addressed its content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// `/{access}/{bucket}/{key}` on the base host
    Traditional { serialized_access: String },
    /// `/raw/{access}/{bucket}/{key}` on the base host
    Raw { serialized_access: String },
    /// Any path on a host with link sharing TXT records
    CustomDomain { host: String },
}

/// What a request resolved to
#[derive(Debug, Clone)]
pub struct RoutingResult {
    pub mode: Mode,
    pub access: AccessGrant,
    pub bucket: String,
    /// Object key, or listing prefix (empty or ending in `/`)
    pub key: String,
}

/// One link in a listing's navigation trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breadcrumb {
    /// Display name
    pub prefix: String,
    /// Absolute path of the link
    pub url: String,
}

/// A prefix listing to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Page title
    pub title: String,
    /// First breadcrumb
    pub root: Breadcrumb,
    /// Prefix listed in storage
    pub prefix: String,
    /// Prefix as the visitor sees it in the URL
    pub visible_prefix: String,
}

impl Listing {
    /// Navigation trail from the root down to the visible prefix
    pub fn breadcrumbs(&self) -> Vec<Breadcrumb> {
        let mut crumbs = vec![self.root.clone()];
        if self.visible_prefix.is_empty() {
            return crumbs;
        }
        for segment in self.visible_prefix.trim_end_matches('/').split('/') {
            let parent = crumbs.last().map(|c| c.url.as_str()).unwrap_or("/");
            let url = format!("{}{}/", parent, segment);
            crumbs.push(Breadcrumb {
                prefix: segment.to_string(),
                url,
            });
        }
        crumbs
    }
}

/// Outcome of routing a request
///
/// `Object` and `Listing` carry the open project handle; the caller serves
/// the content and then closes it with [`close_project`].
pub enum Resolution {
    Object {
        route: RoutingResult,
        object: ObjectInfo,
        project: Arc<dyn Project>,
    },
    Listing {
        route: RoutingResult,
        listing: Listing,
        project: Arc<dyn Project>,
    },
    Redirect {
        location: String,
        /// 301 when true, 302 otherwise
        permanent: bool,
    },
}

impl std::fmt::Debug for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Object { route, object, .. } => f
                .debug_struct("Object")
                .field("route", route)
                .field("object", object)
                .finish_non_exhaustive(),
            Self::Listing { route, listing, .. } => f
                .debug_struct("Listing")
                .field("route", route)
                .field("listing", listing)
                .finish_non_exhaustive(),
            Self::Redirect {
                location,
                permanent,
            } => f
                .debug_struct("Redirect")
                .field("location", location)
                .field("permanent", permanent)
                .finish(),
        }
    }
}

/// Validate the public base URL of the gateway
pub fn parse_url_base(s: &str) -> Result<Url> {
    let url = Url::parse(s).map_err(|e| SharingError::Configuration(e.to_string()))?;

    let reason = if url.scheme() != "http" && url.scheme() != "https" {
        Some("URL base must be http:// or https://")
    } else if url.host_str().map_or(true, str::is_empty) {
        Some("URL base must contain host")
    } else if !url.username().is_empty() || url.password().is_some() {
        Some("URL base must not contain user info")
    } else if url.query().is_some_and(|q| !q.is_empty()) {
        Some("URL base must not contain query values")
    } else if url.fragment().is_some_and(|f| !f.is_empty()) {
        Some("URL base must not contain a fragment")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(SharingError::Configuration(reason.to_string())),
        None => Ok(url),
    }
}

/// Host and port of a URL as they appear in a `Host` header
fn url_host(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    }
}

/// Lexically clean a rooted path: collapse slashes, resolve `.` and `..`,
/// and drop any trailing slash
fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            s => parts.push(s),
        }
    }
    format!("/{}", parts.join("/"))
}

/// Percent-encode each segment of a path, keeping the slashes
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Canonical absolute URL for a request path under the base URL
pub fn make_location(base: &Url, request_path: &str) -> String {
    let mut location = base.clone();
    let joined = clean_path(&format!("{}/{}", base.path(), request_path));
    location.set_path(&joined);
    location.to_string()
}

/// Release a project handle, logging failures
pub async fn close_project(project: &Arc<dyn Project>) {
    if let Err(e) = project.close().await {
        warn!(error = %e, "Unable to close project");
    }
}

/// Stat an object, closing the project when it fails
async fn stat_or_close(project: &Arc<dyn Project>, bucket: &str, key: &str) -> Result<ObjectInfo> {
    match project.stat_object(bucket, key).await {
        Ok(info) => Ok(info),
        Err(e) => {
            close_project(project).await;
            Err(e.into())
        }
    }
}

/// Routes link sharing requests
pub struct ShareRouter {
    base: Url,
    base_host: String,
    storage: Arc<dyn ObjectStorage>,
    decoder: Arc<CredentialDecoder>,
    domains: Arc<CustomDomainResolver>,
    timeout: Duration,
}

impl ShareRouter {
    /// Create a router for the given base URL
    pub fn new(
        base: Url,
        storage: Arc<dyn ObjectStorage>,
        decoder: Arc<CredentialDecoder>,
        domains: Arc<CustomDomainResolver>,
    ) -> Self {
        let base_host = url_host(&base);
        Self {
            base,
            base_host,
            storage,
            decoder,
            domains,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the routing deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The public base URL
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The custom domain resolver
    pub fn domains(&self) -> &Arc<CustomDomainResolver> {
        &self.domains
    }

    /// Route a request
    #[instrument(skip(self), fields(mode = tracing::field::Empty))]
    pub async fn resolve(&self, method: &Method, host: &str, path: &str) -> Result<Resolution> {
        match tokio::time::timeout(self.timeout, self.resolve_inner(method, host, path)).await {
            Ok(result) => result,
            Err(_) => Err(SharingError::Timeout),
        }
    }

    async fn resolve_inner(&self, method: &Method, host: &str, path: &str) -> Result<Resolution> {
        if !compare_hosts(host, &self.base_host)? {
            tracing::Span::current().record("mode", "custom");
            return self.resolve_custom_domain(host, path).await;
        }
        tracing::Span::current().record("mode", "traditional");

        let location_only = match *method {
            Method::GET => false,
            Method::HEAD => true,
            _ => return Err(SharingError::MethodNotAllowed(method.to_string())),
        };
        self.resolve_traditional(path, location_only).await
    }

    async fn resolve_traditional(&self, path: &str, location_only: bool) -> Result<Resolution> {
        let parsed = TraditionalPath::parse(path)?;
        let access = self
            .decoder
            .decode(&parsed.access, AccessPolicy::PublicOnly)
            .await?;
        let project = self.storage.open_project(&access).await?;

        let mode = if parsed.raw {
            Mode::Raw {
                serialized_access: parsed.access.clone(),
            }
        } else {
            Mode::Traditional {
                serialized_access: parsed.access.clone(),
            }
        };
        let route = RoutingResult {
            mode,
            access,
            bucket: parsed.bucket,
            key: parsed.key,
        };

        if route.key.is_empty() || route.key.ends_with('/') {
            if !path.ends_with('/') {
                close_project(&project).await;
                return Ok(Resolution::Redirect {
                    location: format!("{}/", encode_path(path)),
                    permanent: true,
                });
            }
            let listing = Listing {
                title: route.bucket.clone(),
                root: Breadcrumb {
                    prefix: route.bucket.clone(),
                    url: format!("/{}/{}/", parsed.access, route.bucket),
                },
                prefix: route.key.clone(),
                visible_prefix: route.key.clone(),
            };
            return Ok(Resolution::Listing {
                route,
                listing,
                project,
            });
        }

        let object = stat_or_close(&project, &route.bucket, &route.key).await?;

        if location_only {
            close_project(&project).await;
            return Ok(Resolution::Redirect {
                location: make_location(&self.base, path),
                permanent: false,
            });
        }

        Ok(Resolution::Object {
            route,
            object,
            project,
        })
    }

    async fn resolve_custom_domain(&self, host: &str, path: &str) -> Result<Resolution> {
        let host = bare_host(host)?;
        let entry = self.domains.fetch_access_for_host(host).await?;
        let project = self.storage.open_project(&entry.access).await?;

        let (bucket, key) = determine_bucket_and_key(&entry.root, path);
        let mut route = RoutingResult {
            mode: Mode::CustomDomain {
                host: host.to_string(),
            },
            access: entry.access.clone(),
            bucket,
            key,
        };

        // There are no objects with the empty key.
        if !route.key.is_empty() {
            match project.stat_object(&route.bucket, &route.key).await {
                Ok(object) => {
                    return Ok(Resolution::Object {
                        route,
                        object,
                        project,
                    })
                }
                Err(StorageError::ObjectNotFound { .. }) if route.key.ends_with('/') => {}
                Err(e) => {
                    close_project(&project).await;
                    return Err(e.into());
                }
            }
        }

        let index_key = format!("{}index.html", route.key);
        match project.stat_object(&route.bucket, &index_key).await {
            Ok(object) => {
                debug!(key = %index_key, "Serving index document");
                route.key = index_key;
                Ok(Resolution::Object {
                    route,
                    object,
                    project,
                })
            }
            Err(StorageError::ObjectNotFound { .. }) => {
                let listing = Listing {
                    title: host.to_string(),
                    root: Breadcrumb {
                        prefix: host.to_string(),
                        url: "/".to_string(),
                    },
                    prefix: route.key.clone(),
                    visible_prefix: path.strip_prefix('/').unwrap_or(path).to_string(),
                };
                Ok(Resolution::Listing {
                    route,
                    listing,
                    project,
                })
            }
            Err(e) => {
                close_project(&project).await;
                Err(e.into())
            }
        }
    }
}
