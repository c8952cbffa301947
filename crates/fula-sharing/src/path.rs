//! Share URL path parsing
//!
//! Traditional share URLs look like `/{access}/{bucket}/{key...}` or
//! `/raw/{access}/{bucket}/{key...}`.

use crate::{Result, SharingError};

/// The pieces of a traditional share URL path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraditionalPath {
    /// Serve bytes directly instead of the object page
    pub raw: bool,
    /// Credential token as it appeared in the path
    pub access: String,
    /// Bucket name
    pub bucket: String,
    /// Object key or listing prefix, possibly empty
    pub key: String,
}

impl TraditionalPath {
    /// Split a request path into credential, bucket and key
    ///
    /// The credential is not decoded here.
    pub fn parse(path: &str) -> Result<Self> {
        let path = path.strip_prefix('/').unwrap_or(path);

        let mut segments: Vec<String> = path.splitn(4, '/').map(str::to_string).collect();
        let mut raw = false;
        if segments.len() == 4 {
            if segments[0] == "raw" {
                raw = true;
                segments.remove(0);
            } else {
                // Keys may contain slashes; fold the tail back into one key.
                let tail = segments.pop().unwrap_or_default();
                segments[2] = format!("{}/{}", segments[2], tail);
            }
        }

        if segments.len() == 1 {
            if segments[0].is_empty() {
                return Err(SharingError::MissingCredential);
            }
            return Err(SharingError::MissingBucket);
        }

        let mut segments = segments.into_iter();
        let access = segments.next().unwrap_or_default();
        let bucket = segments.next().unwrap_or_default();
        let key = segments.next().unwrap_or_default();

        if bucket.is_empty() {
            return Err(SharingError::MissingBucket);
        }

        Ok(Self {
            raw,
            access,
            bucket,
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/ACCESS/bucket/a/b.jpg", false, "ACCESS", "bucket", "a/b.jpg")]
    #[case("/raw/ACCESS/bucket/a/b.jpg", true, "ACCESS", "bucket", "a/b.jpg")]
    #[case("/ACCESS/bucket/a/b/c/d.jpg", false, "ACCESS", "bucket", "a/b/c/d.jpg")]
    #[case("/raw/ACCESS/bucket/a/b/c.jpg", true, "ACCESS", "bucket", "a/b/c.jpg")]
    #[case("/ACCESS/bucket/file.txt", false, "ACCESS", "bucket", "file.txt")]
    #[case("/ACCESS/bucket", false, "ACCESS", "bucket", "")]
    #[case("/ACCESS/bucket/", false, "ACCESS", "bucket", "")]
    #[case("/ACCESS/bucket/dir/", false, "ACCESS", "bucket", "dir/")]
    #[case("/raw/ACCESS/bucket/", true, "ACCESS", "bucket", "")]
    #[case("ACCESS/bucket/key", false, "ACCESS", "bucket", "key")]
    // Three segments starting with "raw" are an ordinary URL.
    #[case("/raw/ACCESS/bucket", false, "raw", "ACCESS", "bucket")]
    fn test_parse(
        #[case] input: &str,
        #[case] raw: bool,
        #[case] access: &str,
        #[case] bucket: &str,
        #[case] key: &str,
    ) {
        let parsed = TraditionalPath::parse(input).unwrap();
        assert_eq!(
            parsed,
            TraditionalPath {
                raw,
                access: access.to_string(),
                bucket: bucket.to_string(),
                key: key.to_string(),
            }
        );
    }

    #[test]
    fn test_missing_credential() {
        assert!(matches!(
            TraditionalPath::parse("/"),
            Err(SharingError::MissingCredential)
        ));
        assert!(matches!(
            TraditionalPath::parse(""),
            Err(SharingError::MissingCredential)
        ));
    }

    #[test]
    fn test_missing_bucket() {
        for path in ["/ACCESS", "/ACCESS/", "/raw/ACCESS//key/x"] {
            assert!(
                matches!(TraditionalPath::parse(path), Err(SharingError::MissingBucket)),
                "{}",
                path
            );
        }
    }
}
