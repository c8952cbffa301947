//! Storage root to bucket/key mapping for custom domains

/// Map a storage root and a request path to a bucket and object key
///
/// The root is `bucket` or `bucket/prefix`. A non-empty prefix always ends up
/// with a trailing slash so a domain cannot reach keys that merely share the
/// prefix's leading characters. Exactly one leading slash is removed from the
/// request path; any other doubled slashes are kept.
///
/// With root `bucket1/prefix1/` and path `/prefix2/index.html` the result is
/// bucket `bucket1` and key `prefix1/prefix2/index.html`.
pub fn determine_bucket_and_key(root: &str, url_path: &str) -> (String, String) {
    let (bucket, prefix) = root.split_once('/').unwrap_or((root, ""));

    let mut key = prefix.to_string();
    if !key.is_empty() && !key.ends_with('/') {
        key.push('/');
    }
    key.push_str(url_path.strip_prefix('/').unwrap_or(url_path));

    (bucket.to_string(), key)
}
