//! Object store client: produces stable, canonical URLs for uploaded
//! source PDFs and fetches bytes back by URL.
//!
//! Canonicalization is enforced by construction: `ObjectUrl::parse` is
//! the only way to obtain one, and both `to_s3`/`to_https` accessors
//! derive from the same `(bucket, key)` pair, so the round-trip holds
//! for any value that made it past construction.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ObjectStoreError;

/// A canonicalized reference to an object, backed by `(bucket, key)`.
///
/// Accepts either the internal `s3://bucket/key` form or the
/// browser-facing `https://bucket.s3.amazonaws.com/key` form on parse,
/// and can render either on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectUrl {
    bucket: String,
    key: String,
}

impl ObjectUrl {
    /// Builds an `ObjectUrl` directly from its parts.
    #[must_use]
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parses either canonical form into an `ObjectUrl`.
    pub fn parse(url: &str) -> Result<Self, ObjectStoreError> {
        if let Some(rest) = url.strip_prefix("s3://") {
            let (bucket, key) = rest
                .split_once('/')
                .ok_or_else(|| ObjectStoreError::InvalidUrl(url.to_string()))?;
            if bucket.is_empty() || key.is_empty() {
                return Err(ObjectStoreError::InvalidUrl(url.to_string()));
            }
            return Ok(Self::new(bucket, key));
        }

        if let Some(rest) = url.strip_prefix("https://") {
            let (host, key) = rest
                .split_once('/')
                .ok_or_else(|| ObjectStoreError::InvalidUrl(url.to_string()))?;
            let bucket = host
                .strip_suffix(".s3.amazonaws.com")
                .ok_or_else(|| ObjectStoreError::InvalidUrl(url.to_string()))?;
            if bucket.is_empty() || key.is_empty() {
                return Err(ObjectStoreError::InvalidUrl(url.to_string()));
            }
            return Ok(Self::new(bucket, key));
        }

        Err(ObjectStoreError::InvalidUrl(url.to_string()))
    }

    /// Renders the internal `s3://bucket/key` form.
    #[must_use]
    pub fn to_s3(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }

    /// Renders the browser-facing HTTPS form.
    #[must_use]
    pub fn to_https(&self) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket, self.key)
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Abstraction over the object-storage backend. Implementations must
/// guarantee that `download(upload(path, key))` returns the bytes at
/// `path` unchanged, so `document_url` always resolves to a fetchable
/// object.
pub trait ObjectStore: Send + Sync {
    /// Uploads the file at `local_path` under `logical_key` and returns
    /// its canonical URL.
    fn upload(&self, local_path: &Path, logical_key: &str) -> Result<ObjectUrl, ObjectStoreError>;

    /// Fetches the raw bytes referenced by `url`.
    fn download(&self, url: &ObjectUrl) -> Result<Vec<u8>, ObjectStoreError>;
}

/// Local-filesystem-backed object store. Mirrors objects under a root
/// directory as `<root>/<bucket>/<key>`. Used as the default backend;
/// a production deployment swaps in a networked implementation of
/// `ObjectStore` without touching callers, since only the trait is
/// load-bearing.
pub struct LocalFsObjectStore {
    root: PathBuf,
    bucket: String,
}

impl LocalFsObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: bucket.into(),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(&self.bucket).join(key)
    }
}

impl ObjectStore for LocalFsObjectStore {
    fn upload(&self, local_path: &Path, logical_key: &str) -> Result<ObjectUrl, ObjectStoreError> {
        let dest = self.path_for(logical_key);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)
                .map_err(|source| ObjectStoreError::UploadFailed(source.to_string()))?;
        }
        fs::copy(local_path, &dest)
            .map_err(|source| ObjectStoreError::UploadFailed(source.to_string()))?;
        Ok(ObjectUrl::new(self.bucket.clone(), logical_key.to_string()))
    }

    fn download(&self, url: &ObjectUrl) -> Result<Vec<u8>, ObjectStoreError> {
        let path = self.root.join(url.bucket()).join(url.key());
        fs::read(&path)
            .map_err(|source| ObjectStoreError::DownloadFailed(format!("{}: {source}", url.to_s3())))
    }
}

/// Canonicalizes a raw URL string to its internal `s3://` form,
/// validating it parses as an `ObjectUrl` along the way.
pub fn canonicalize(url: &str) -> Result<String, ObjectStoreError> {
    Ok(ObjectUrl::parse(url)?.to_s3())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_parse_s3_form() {
        let url = ObjectUrl::parse("s3://cases-bucket/state-v-singh.pdf").unwrap();
        assert_eq!(url.bucket(), "cases-bucket");
        assert_eq!(url.key(), "state-v-singh.pdf");
    }

    #[test]
    fn test_parse_https_form() {
        let url =
            ObjectUrl::parse("https://cases-bucket.s3.amazonaws.com/state-v-singh.pdf").unwrap();
        assert_eq!(url.bucket(), "cases-bucket");
        assert_eq!(url.key(), "state-v-singh.pdf");
    }

    #[test]
    fn test_round_trip_law() {
        // canonicalize(to_https(canonicalize(url))) == canonicalize(url)
        let original = "s3://cases-bucket/a/b/state-v-singh.pdf";
        let first = canonicalize(original).unwrap();
        let https = ObjectUrl::parse(&first).unwrap().to_https();
        let second = canonicalize(&https).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_malformed_url_rejected() {
        assert!(ObjectUrl::parse("ftp://nope").is_err());
        assert!(ObjectUrl::parse("s3://bucket-only").is_err());
        assert!(ObjectUrl::parse("https://not-s3-host.example.com/key").is_err());
    }

    #[test]
    fn test_local_fs_store_round_trips_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsObjectStore::new(dir.path(), "cases-bucket");

        let src = dir.path().join("source.pdf");
        let mut file = fs::File::create(&src).unwrap();
        file.write_all(b"%PDF-1.4 test bytes").unwrap();

        let url = store.upload(&src, "state-v-singh.pdf").unwrap();
        assert_eq!(url.to_s3(), "s3://cases-bucket/state-v-singh.pdf");

        let bytes = store.download(&url).unwrap();
        assert_eq!(bytes, b"%PDF-1.4 test bytes");
    }

    #[test]
    fn test_local_fs_store_missing_object_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFsObjectStore::new(dir.path(), "cases-bucket");
        let missing = ObjectUrl::new("cases-bucket", "ghost.pdf");
        assert!(store.download(&missing).is_err());
    }
}
