//! Share URL and custom domain handler

use crate::content::{self, Disposition};
use crate::{render, ApiError, AppState};
use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use futures::TryStreamExt;
use fula_sharing::{close_project, Listing, Mode, Resolution, RoutingResult, SharingError};
use fula_storage::{ListItem, ObjectInfo, Project};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;

/// Presentation flags from the query string
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct QueryFlags {
    /// `?download`: send bytes as an attachment
    pub download: bool,
    /// `?view`: send bytes inline
    pub view: bool,
}

impl QueryFlags {
    /// Read the flags from a raw query string; values are ignored
    pub fn from_query(query: Option<&str>) -> Self {
        let mut flags = Self::default();
        for pair in query.unwrap_or_default().split('&') {
            match pair.split_once('=').map_or(pair, |(name, _)| name) {
                "download" => flags.download = true,
                "view" => flags.view = true,
                _ => {}
            }
        }
        flags
    }
}

fn request_host<'a>(headers: &'a HeaderMap, uri: &'a Uri) -> Result<&'a str, ApiError> {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .ok_or_else(|| ApiError::BadRequest("missing host"))
}

/// Run the storage half of a request against the request deadline
async fn until<F>(deadline: Instant, fut: F) -> Result<Response, ApiError>
where
    F: Future<Output = Result<Response, ApiError>>,
{
    tokio::time::timeout_at(deadline, fut)
        .await
        .unwrap_or_else(|_| Err(SharingError::Timeout.into()))
}

/// Serve any link sharing request
///
/// Routing, listing and download share one deadline.
pub async fn serve(
    State(state): State<Arc<AppState>>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
) -> Result<Response, ApiError> {
    let host = request_host(&headers, &uri)?;
    let path = urlencoding::decode(uri.path())
        .map_err(|_| ApiError::BadRequest("path is not valid UTF-8"))?;
    let flags = QueryFlags::from_query(uri.query());
    let deadline = Instant::now() + state.router.timeout();

    match state.router.resolve(&method, host, &path).await? {
        Resolution::Redirect {
            location,
            permanent,
        } => redirect(&location, permanent),
        Resolution::Listing {
            route,
            listing,
            project,
        } => {
            let result = until(deadline, serve_listing(&project, &route, &listing)).await;
            close_project(&project).await;
            result
        }
        Resolution::Object {
            route,
            object,
            project,
        } => {
            let result = until(
                deadline,
                serve_object(&project, &route, &object, &headers, flags),
            )
            .await;
            close_project(&project).await;
            result
        }
    }
}

fn redirect(location: &str, permanent: bool) -> Result<Response, ApiError> {
    let status = if permanent {
        StatusCode::MOVED_PERMANENTLY
    } else {
        StatusCode::FOUND
    };
    Response::builder()
        .status(status)
        .header(header::LOCATION, location)
        .body(Body::empty())
        .map_err(|e| ApiError::Internal(e.to_string()))
}

async fn serve_listing(
    project: &Arc<dyn Project>,
    route: &RoutingResult,
    listing: &Listing,
) -> Result<Response, ApiError> {
    let items: Vec<ListItem> = project
        .list_objects(&route.bucket, &listing.prefix)
        .try_collect()
        .await?;
    Ok(Html(render::listing_page(listing, &items)).into_response())
}

async fn serve_object(
    project: &Arc<dyn Project>,
    route: &RoutingResult,
    object: &ObjectInfo,
    headers: &HeaderMap,
    flags: QueryFlags,
) -> Result<Response, ApiError> {
    match route.mode {
        Mode::Traditional { .. } if !flags.download && !flags.view => {
            Ok(Html(render::object_page(&object.key, object.size)).into_response())
        }
        Mode::Traditional { .. } | Mode::Raw { .. } => {
            let disposition = if flags.download {
                Disposition::attachment_for(&route.key)
            } else {
                Disposition::Inline
            };
            content::serve_object(project, &route.bucket, object, headers, disposition).await
        }
        Mode::CustomDomain { .. } => {
            content::serve_object(project, &route.bucket, object, headers, Disposition::Inline)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, false, false)]
    #[case(Some(""), false, false)]
    #[case(Some("download"), true, false)]
    #[case(Some("download=1"), true, false)]
    #[case(Some("view"), false, true)]
    #[case(Some("a=b&view&download="), true, true)]
    #[case(Some("downloads"), false, false)]
    fn test_query_flags(#[case] query: Option<&str>, #[case] download: bool, #[case] view: bool) {
        assert_eq!(
            QueryFlags::from_query(query),
            QueryFlags { download, view }
        );
    }

    #[test]
    fn test_request_host() {
        let mut headers = HeaderMap::new();
        let uri: Uri = "http://authority.example.com/path".parse().unwrap();
        assert_eq!(request_host(&headers, &uri).unwrap(), "authority.example.com");

        headers.insert(header::HOST, "share.example.com:8080".parse().unwrap());
        assert_eq!(request_host(&headers, &uri).unwrap(), "share.example.com:8080");

        let headers = HeaderMap::new();
        let uri: Uri = "/path".parse().unwrap();
        assert!(request_host(&headers, &uri).is_err());
    }
}
