//! In-memory storage backend for testing and development

use crate::{AccessGrant, ListItem, ListStream, ObjectInfo, ObjectStorage, Project, Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Clone)]
struct StoredObject {
    data: Bytes,
    created: DateTime<Utc>,
    content_type: Option<String>,
    etag: String,
}

impl StoredObject {
    fn info(&self, key: &str) -> ObjectInfo {
        ObjectInfo {
            key: key.to_string(),
            size: self.data.len() as u64,
            created: self.created,
            content_type: self.content_type.clone(),
            etag: self.etag.clone(),
        }
    }
}

type Buckets = BTreeMap<String, BTreeMap<String, StoredObject>>;

/// An in-memory storage network
///
/// Projects are created on first use. Every grant for the same project name
/// sees the same buckets.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    projects: Arc<DashMap<String, Arc<RwLock<Buckets>>>>,
    open_handles: Arc<AtomicUsize>,
}

impl MemoryStorage {
    /// Create a new empty storage network
    pub fn new() -> Self {
        Self::default()
    }

    fn project(&self, name: &str) -> Arc<RwLock<Buckets>> {
        Arc::clone(self.projects.entry(name.to_string()).or_default().value())
    }

    /// Create an empty bucket
    pub fn create_bucket(&self, project: &str, bucket: &str) {
        self.project(project)
            .write()
            .entry(bucket.to_string())
            .or_default();
    }

    /// Store an object, creating the bucket if needed
    pub fn put_object(
        &self,
        project: &str,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
    ) -> ObjectInfo {
        self.put_object_with_type(project, bucket, key, data, None)
    }

    /// Store an object with an explicit content type
    pub fn put_object_with_type(
        &self,
        project: &str,
        bucket: &str,
        key: &str,
        data: impl Into<Bytes>,
        content_type: Option<String>,
    ) -> ObjectInfo {
        let data = data.into();
        let digest = format!("{:x}", Sha256::digest(&data));
        let object = StoredObject {
            data,
            created: Utc::now(),
            content_type,
            etag: digest[..32].to_string(),
        };
        let info = object.info(key);

        self.project(project)
            .write()
            .entry(bucket.to_string())
            .or_default()
            .insert(key.to_string(), object);

        info
    }

    /// Number of project handles opened and not yet closed
    pub fn open_handles(&self) -> usize {
        self.open_handles.load(Ordering::SeqCst)
    }

    /// Load a local directory into a project
    ///
    /// Every top-level directory becomes a bucket and every file below it an
    /// object keyed by its `/`-separated relative path. Top-level files are
    /// skipped. Returns the number of objects stored.
    pub async fn load_dir(&self, project: &str, dir: &Path) -> Result<usize> {
        let mut loaded = 0;
        let mut entries = tokio::fs::read_dir(dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !entry.file_type().await?.is_dir() {
                warn!(file = %name, "Skipping top-level file, only directories become buckets");
                continue;
            }

            self.create_bucket(project, &name);
            let mut pending: Vec<(PathBuf, String)> = vec![(entry.path(), String::new())];
            while let Some((path, prefix)) = pending.pop() {
                let mut children = tokio::fs::read_dir(&path).await?;
                while let Some(child) = children.next_entry().await? {
                    let child_name = child.file_name().to_string_lossy().into_owned();
                    let key = format!("{}{}", prefix, child_name);
                    if child.file_type().await?.is_dir() {
                        pending.push((child.path(), format!("{}/", key)));
                    } else {
                        let data = tokio::fs::read(child.path()).await?;
                        debug!(bucket = %name, key = %key, size = data.len(), "Loaded object");
                        self.put_object(project, &name, &key, data);
                        loaded += 1;
                    }
                }
            }
        }

        Ok(loaded)
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn open_project(&self, access: &AccessGrant) -> Result<Arc<dyn Project>> {
        self.open_handles.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MemoryProject {
            buckets: self.project(access.project()),
            open_handles: Arc::clone(&self.open_handles),
            closed: AtomicBool::new(false),
        }))
    }
}

struct MemoryProject {
    buckets: Arc<RwLock<Buckets>>,
    open_handles: Arc<AtomicUsize>,
    closed: AtomicBool,
}

impl MemoryProject {
    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StorageError::ProjectClosed);
        }
        Ok(())
    }

    fn lookup(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        self.ensure_open()?;
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::ObjectNotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            })
    }

    fn collect_listing(&self, bucket: &str, prefix: &str) -> Result<Vec<ListItem>> {
        self.ensure_open()?;
        let buckets = self.buckets.read();
        let objects = buckets
            .get(bucket)
            .ok_or_else(|| StorageError::BucketNotFound(bucket.to_string()))?;

        let mut items: Vec<ListItem> = Vec::new();
        for (key, object) in objects.range(prefix.to_string()..) {
            let Some(rest) = key.strip_prefix(prefix) else {
                break;
            };
            match rest.find('/') {
                Some(idx) => {
                    let collapsed = format!("{}{}", prefix, &rest[..=idx]);
                    if items.last().map(|last| last.key.as_str()) != Some(collapsed.as_str()) {
                        items.push(ListItem {
                            key: collapsed,
                            is_prefix: true,
                            size: 0,
                        });
                    }
                }
                None => items.push(ListItem {
                    key: key.clone(),
                    is_prefix: false,
                    size: object.data.len() as u64,
                }),
            }
        }

        Ok(items)
    }
}

#[async_trait]
impl Project for MemoryProject {
    async fn stat_object(&self, bucket: &str, key: &str) -> Result<ObjectInfo> {
        self.lookup(bucket, key).map(|object| object.info(key))
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> ListStream {
        let items: Vec<Result<ListItem>> = match self.collect_listing(bucket, prefix) {
            Ok(items) => items.into_iter().map(Ok).collect(),
            Err(e) => vec![Err(e)],
        };
        Box::pin(futures::stream::iter(items))
    }

    async fn download(
        &self,
        bucket: &str,
        key: &str,
        offset: u64,
        length: Option<u64>,
    ) -> Result<Bytes> {
        let object = self.lookup(bucket, key)?;
        let size = object.data.len() as u64;
        if offset > size {
            return Err(StorageError::InvalidRange { offset, size });
        }

        let end = match length {
            Some(length) => offset.saturating_add(length).min(size),
            None => size,
        };
        Ok(object.data.slice(offset as usize..end as usize))
    }

    async fn close(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(StorageError::ProjectClosed);
        }
        self.open_handles.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;

    async fn open(storage: &MemoryStorage, project: &str) -> Arc<dyn Project> {
        storage.open_project(&AccessGrant::new(project)).await.unwrap()
    }

    #[tokio::test]
    async fn test_stat_and_download() {
        let storage = MemoryStorage::new();
        storage.put_object("demo", "photos", "cats/tom.jpg", &b"0123456789"[..]);

        let project = open(&storage, "demo").await;
        let info = project.stat_object("photos", "cats/tom.jpg").await.unwrap();
        assert_eq!(info.size, 10);
        assert_eq!(info.etag.len(), 32);

        let all = project.download("photos", "cats/tom.jpg", 0, None).await.unwrap();
        assert_eq!(&all[..], b"0123456789");

        let part = project.download("photos", "cats/tom.jpg", 2, Some(3)).await.unwrap();
        assert_eq!(&part[..], b"234");

        let tail = project.download("photos", "cats/tom.jpg", 8, Some(100)).await.unwrap();
        assert_eq!(&tail[..], b"89");

        assert!(matches!(
            project.download("photos", "cats/tom.jpg", 11, None).await,
            Err(StorageError::InvalidRange { .. })
        ));
    }

    #[tokio::test]
    async fn test_not_found_kinds() {
        let storage = MemoryStorage::new();
        storage.create_bucket("demo", "empty");
        let project = open(&storage, "demo").await;

        assert!(matches!(
            project.stat_object("missing", "a").await,
            Err(StorageError::BucketNotFound(_))
        ));
        let err = project.stat_object("empty", "a").await.unwrap_err();
        assert!(matches!(err, StorageError::ObjectNotFound { .. }));
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_projects_are_isolated() {
        let storage = MemoryStorage::new();
        storage.put_object("alice", "docs", "a.txt", "alice");

        let project = open(&storage, "bob").await;
        assert!(project.stat_object("docs", "a.txt").await.is_err());
    }

    #[tokio::test]
    async fn test_listing_collapses_prefixes() {
        let storage = MemoryStorage::new();
        storage.put_object("demo", "site", "index.html", "home");
        storage.put_object("demo", "site", "css/a.css", "a");
        storage.put_object("demo", "site", "css/b.css", "b");
        storage.put_object("demo", "site", "img/x/y.png", "y");
        storage.put_object("demo", "site", "imgs.txt", "z");

        let project = open(&storage, "demo").await;
        let root: Vec<ListItem> = project.list_objects("site", "").try_collect().await.unwrap();
        let keys: Vec<(&str, bool)> = root.iter().map(|i| (i.key.as_str(), i.is_prefix)).collect();
        assert_eq!(
            keys,
            vec![
                ("css/", true),
                ("img/", true),
                ("imgs.txt", false),
                ("index.html", false),
            ]
        );

        let css: Vec<ListItem> = project.list_objects("site", "css/").try_collect().await.unwrap();
        assert_eq!(css.len(), 2);
        assert_eq!(css[0].key, "css/a.css");
        assert_eq!(css[0].size, 1);
    }

    #[tokio::test]
    async fn test_listing_missing_bucket() {
        let storage = MemoryStorage::new();
        let project = open(&storage, "demo").await;
        let result: Result<Vec<ListItem>> = project.list_objects("nope", "").try_collect().await;
        assert!(matches!(result, Err(StorageError::BucketNotFound(_))));
    }

    #[tokio::test]
    async fn test_close_tracks_handles() {
        let storage = MemoryStorage::new();
        let project = open(&storage, "demo").await;
        assert_eq!(storage.open_handles(), 1);

        project.close().await.unwrap();
        assert_eq!(storage.open_handles(), 0);
        assert!(matches!(project.close().await, Err(StorageError::ProjectClosed)));
        assert!(matches!(
            project.stat_object("b", "k").await,
            Err(StorageError::ProjectClosed)
        ));
    }

    #[tokio::test]
    async fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("site/css")).unwrap();
        std::fs::write(dir.path().join("site/index.html"), "<h1>hi</h1>").unwrap();
        std::fs::write(dir.path().join("site/css/main.css"), "body{}").unwrap();
        std::fs::write(dir.path().join("README"), "skipped").unwrap();

        let storage = MemoryStorage::new();
        let loaded = storage.load_dir("demo", dir.path()).await.unwrap();
        assert_eq!(loaded, 2);

        let project = open(&storage, "demo").await;
        assert!(project.stat_object("site", "index.html").await.is_ok());
        assert!(project.stat_object("site", "css/main.css").await.is_ok());
    }
}
