//! Object byte serving with range and conditional request support

use crate::ApiError;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use fula_storage::{ObjectInfo, Project};
use std::sync::Arc;

const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// How the browser should present the bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// No Content-Disposition header
    Inline,
    /// `attachment; filename="..."`
    Attachment(String),
}

impl Disposition {
    /// Attachment named after the last segment of `key`
    pub fn attachment_for(key: &str) -> Self {
        let name = key.rsplit('/').next().unwrap_or(key);
        Self::Attachment(name.replace('"', "\\\""))
    }
}

/// Parse Range header (e.g., "bytes=0-1023" or "bytes=500-" or "bytes=-500")
fn parse_range_header(range: &str, total_size: u64) -> Result<(u64, u64), ()> {
    let range = range.strip_prefix("bytes=").ok_or(())?;
    if total_size == 0 {
        return Err(());
    }

    if let Some((start_str, end_str)) = range.split_once('-') {
        if start_str.is_empty() {
            // Suffix range: bytes=-500 means last 500 bytes
            let suffix_len: u64 = end_str.parse().map_err(|_| ())?;
            if suffix_len == 0 {
                return Err(());
            }
            let start = total_size.saturating_sub(suffix_len);
            Ok((start, total_size - 1))
        } else if end_str.is_empty() {
            // Range from start to end: bytes=500-
            let start: u64 = start_str.parse().map_err(|_| ())?;
            if start >= total_size {
                return Err(());
            }
            Ok((start, total_size - 1))
        } else {
            // Normal range: bytes=0-1023
            let start: u64 = start_str.parse().map_err(|_| ())?;
            let end: u64 = end_str.parse().map_err(|_| ())?;
            if start > end || start >= total_size {
                return Err(());
            }
            Ok((start, end.min(total_size - 1)))
        }
    } else {
        Err(())
    }
}

/// Whether the client's cached copy is still current
fn not_modified(headers: &HeaderMap, etag: &str, object: &ObjectInfo) -> bool {
    if let Some(if_none_match) = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
    {
        return if_none_match
            .split(',')
            .map(str::trim)
            .any(|tag| tag == etag || tag == "*");
    }

    headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| chrono::DateTime::parse_from_rfc2822(v).ok())
        .is_some_and(|since| object.created.timestamp() <= since.timestamp())
}

fn content_type(object: &ObjectInfo) -> String {
    object.content_type.clone().unwrap_or_else(|| {
        mime_guess::from_path(&object.key)
            .first_or_octet_stream()
            .to_string()
    })
}

/// Serve an object's bytes
pub async fn serve_object(
    project: &Arc<dyn Project>,
    bucket: &str,
    object: &ObjectInfo,
    headers: &HeaderMap,
    disposition: Disposition,
) -> Result<Response, ApiError> {
    let etag = format!("\"{}\"", object.etag);
    let last_modified = object.created.format(HTTP_DATE).to_string();

    if not_modified(headers, &etag, object) {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, &etag)
            .header(header::LAST_MODIFIED, &last_modified)
            .body(Body::empty())
            .map_err(|e| ApiError::Internal(e.to_string()));
    }

    let total_size = object.size;
    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let (status, start, end) = match range_header {
        Some(range) => match parse_range_header(range, total_size) {
            Ok((start, end)) => (StatusCode::PARTIAL_CONTENT, start, Some(end)),
            Err(_) => return Err(ApiError::RangeNotSatisfiable { size: total_size }),
        },
        None => (StatusCode::OK, 0, None),
    };

    let length = end.map(|end| end - start + 1);
    let data = project.download(bucket, &object.key, start, length).await?;

    let mut response = Response::builder()
        .status(status)
        .header(header::ETAG, &etag)
        .header(header::CONTENT_LENGTH, data.len().to_string())
        .header(header::LAST_MODIFIED, &last_modified)
        .header(header::ACCEPT_RANGES, "bytes")
        .header(header::CONTENT_TYPE, content_type(object));

    if let Some(end) = end {
        response = response.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, total_size),
        );
    }

    if let Disposition::Attachment(name) = &disposition {
        let value = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", name))
            .unwrap_or_else(|_| HeaderValue::from_static("attachment"));
        response = response.header(header::CONTENT_DISPOSITION, value);
    }

    response
        .body(Body::from(data))
        .map_err(|e| ApiError::Internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fula_storage::{AccessGrant, MemoryStorage, ObjectStorage};

    #[test]
    fn test_parse_range_header() {
        assert_eq!(parse_range_header("bytes=0-3", 10), Ok((0, 3)));
        assert_eq!(parse_range_header("bytes=5-", 10), Ok((5, 9)));
        assert_eq!(parse_range_header("bytes=-4", 10), Ok((6, 9)));
        assert_eq!(parse_range_header("bytes=-40", 10), Ok((0, 9)));
        assert_eq!(parse_range_header("bytes=8-100", 10), Ok((8, 9)));
        assert!(parse_range_header("bytes=10-", 10).is_err());
        assert!(parse_range_header("bytes=4-2", 10).is_err());
        assert!(parse_range_header("bytes=-0", 10).is_err());
        assert!(parse_range_header("bytes=0-0", 0).is_err());
        assert!(parse_range_header("items=0-1", 10).is_err());
        assert!(parse_range_header("bytes=a-b", 10).is_err());
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(
            Disposition::attachment_for("dir/sub/report.pdf"),
            Disposition::Attachment("report.pdf".to_string())
        );
        assert_eq!(
            Disposition::attachment_for("plain"),
            Disposition::Attachment("plain".to_string())
        );
    }

    async fn setup() -> (Arc<dyn Project>, ObjectInfo) {
        let storage = MemoryStorage::new();
        let info = storage.put_object("demo", "files", "notes/hello.txt", &b"hello world"[..]);
        let project = storage.open_project(&AccessGrant::new("demo")).await.unwrap();
        (project, info)
    }

    #[tokio::test]
    async fn test_serve_full_object() {
        let (project, info) = setup().await;

        let response = serve_object(&project, "files", &info, &HeaderMap::new(), Disposition::Inline)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "11");
        assert!(response.headers().get(header::CONTENT_DISPOSITION).is_none());

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"hello world");
    }

    #[tokio::test]
    async fn test_serve_range_and_attachment() {
        let (project, info) = setup().await;
        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_static("bytes=6-"));

        let response = serve_object(
            &project,
            "files",
            &info,
            &headers,
            Disposition::attachment_for(&info.key),
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(response.headers()[header::CONTENT_RANGE], "bytes 6-10/11");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"hello.txt\""
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"world");
    }

    #[tokio::test]
    async fn test_conditional_requests() {
        let (project, info) = setup().await;

        let mut headers = HeaderMap::new();
        headers.insert(
            header::IF_NONE_MATCH,
            HeaderValue::from_str(&format!("\"{}\"", info.etag)).unwrap(),
        );
        let response = serve_object(&project, "files", &info, &headers, Disposition::Inline)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let mut headers = HeaderMap::new();
        let later = (info.created + chrono::Duration::seconds(5)).format(HTTP_DATE).to_string();
        headers.insert(header::IF_MODIFIED_SINCE, HeaderValue::from_str(&later).unwrap());
        let response = serve_object(&project, "files", &info, &headers, Disposition::Inline)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

        let mut headers = HeaderMap::new();
        headers.insert(header::IF_NONE_MATCH, HeaderValue::from_static("\"stale\""));
        let response = serve_object(&project, "files", &info, &headers, Disposition::Inline)
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unsatisfiable_range() {
        let (project, info) = setup().await;
        let mut headers = HeaderMap::new();
        headers.insert(header::RANGE, HeaderValue::from_static("bytes=50-60"));

        let err = serve_object(&project, "files", &info, &headers, Disposition::Inline)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::RangeNotSatisfiable { size: 11 }));
    }
}
