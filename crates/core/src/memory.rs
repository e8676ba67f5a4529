//! In-memory object store.
//!
//! Keeps objects in an ordered map so listings come back in lexicographic
//! key order, paginates like S3 `ListObjectsV2`, and counts requests so the
//! batching and pagination behaviour of callers can be observed. Primarily
//! useful for testing; data does not persist between runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::path::ObjectPath;
use crate::traits::{DeleteOutcome, KeyError, ListOptions, ListResult, ObjectInfo, ObjectStore};

const DEFAULT_PAGE: usize = 1000;

/// Request counters
#[derive(Debug, Default)]
struct Counters {
    list: AtomicUsize,
    head: AtomicUsize,
    get: AtomicUsize,
    bulk_delete: AtomicUsize,
}

/// In-memory object store keyed by `(bucket, key)`
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
    deny_head: AtomicBool,
    fail_delete_keys: Mutex<BTreeSet<String>>,
    counters: Counters,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every HEAD request with `AccessDenied`, as a policy that
    /// grants `GetObject` but forbids metadata requests would
    pub fn deny_head_requests(&self, deny: bool) {
        self.deny_head.store(deny, Ordering::SeqCst);
    }

    /// Report `key` as failed in every bulk-delete response
    pub fn fail_delete_of(&self, key: impl Into<String>) {
        self.lock_failures().insert(key.into());
    }

    /// Insert an object directly
    pub fn insert(&self, bucket: &str, key: &str, data: impl Into<Vec<u8>>) {
        self.lock()
            .insert((bucket.to_string(), key.to_string()), data.into());
    }

    /// Number of objects stored in `bucket` under `prefix`
    pub fn count(&self, bucket: &str, prefix: &str) -> usize {
        self.lock()
            .keys()
            .filter(|(b, k)| b == bucket && k.starts_with(prefix))
            .count()
    }

    /// Raw bytes of an object, if present
    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    /// Number of list requests served
    pub fn list_requests(&self) -> usize {
        self.counters.list.load(Ordering::SeqCst)
    }

    /// Number of HEAD requests served
    pub fn head_requests(&self) -> usize {
        self.counters.head.load(Ordering::SeqCst)
    }

    /// Number of GET requests served
    pub fn get_requests(&self) -> usize {
        self.counters.get.load(Ordering::SeqCst)
    }

    /// Number of bulk-delete requests served
    pub fn bulk_delete_requests(&self) -> usize {
        self.counters.bulk_delete.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), Vec<u8>>> {
        // A poisoned map is still structurally valid
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_failures(&self) -> std::sync::MutexGuard<'_, BTreeSet<String>> {
        self.fail_delete_keys
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn info_of(&self, path: &ObjectPath) -> Result<ObjectInfo> {
        let objects = self.lock();
        let data = objects
            .get(&(path.bucket.clone(), path.key.clone()))
            .ok_or_else(|| Error::NotFound(path.to_string()))?;
        Ok(ObjectInfo::file(&path.key, data.len() as i64))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn list_objects(&self, bucket: &str, options: ListOptions) -> Result<ListResult> {
        self.counters.list.fetch_add(1, Ordering::SeqCst);

        let page = options
            .max_keys
            .map(|n| n.max(1) as usize)
            .unwrap_or(DEFAULT_PAGE)
            .min(DEFAULT_PAGE);
        let start_after = options.continuation_token.clone().unwrap_or_default();

        let objects = self.lock();
        let mut items = Vec::new();
        let mut seen_prefixes = BTreeSet::new();
        let mut last_key = None;
        let mut truncated = false;

        let candidates = objects
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(&options.prefix))
            .filter(|((_, k), _)| start_after.is_empty() || k.as_str() > start_after.as_str());

        for ((_, key), data) in candidates {
            let rest = &key[options.prefix.len()..];
            let common = options.delimiter.as_deref().and_then(|delimiter| {
                rest.find(delimiter)
                    .map(|pos| format!("{}{}", options.prefix, &rest[..pos + delimiter.len()]))
            });

            // keys folded into an already-listed prefix do not start a new entry
            if let Some(common) = &common {
                if seen_prefixes.contains(common) {
                    last_key = Some(key.clone());
                    continue;
                }
            }

            if items.len() == page {
                truncated = true;
                break;
            }

            last_key = Some(key.clone());
            match common {
                Some(common) => {
                    seen_prefixes.insert(common.clone());
                    items.push(ObjectInfo::dir(common));
                }
                None => items.push(ObjectInfo::file(key, data.len() as i64)),
            }
        }

        Ok(ListResult {
            items,
            truncated,
            continuation_token: if truncated { last_key } else { None },
        })
    }

    async fn head_object(&self, path: &ObjectPath) -> Result<ObjectInfo> {
        self.counters.head.fetch_add(1, Ordering::SeqCst);
        if self.deny_head.load(Ordering::SeqCst) {
            return Err(Error::AccessDenied(path.to_string()));
        }
        self.info_of(path)
    }

    async fn fetch_object_info(&self, path: &ObjectPath) -> Result<ObjectInfo> {
        self.counters.get.fetch_add(1, Ordering::SeqCst);
        self.info_of(path)
    }

    async fn get_object(&self, path: &ObjectPath) -> Result<Vec<u8>> {
        self.counters.get.fetch_add(1, Ordering::SeqCst);
        self.object(&path.bucket, &path.key)
            .ok_or_else(|| Error::NotFound(path.to_string()))
    }

    async fn put_object(&self, path: &ObjectPath, data: Vec<u8>) -> Result<ObjectInfo> {
        let size = data.len() as i64;
        self.insert(&path.bucket, &path.key, data);
        let mut info = ObjectInfo::file(&path.key, size);
        info.last_modified = Some(jiff::Timestamp::now());
        Ok(info)
    }

    async fn delete_object(&self, path: &ObjectPath) -> Result<()> {
        self.lock()
            .remove(&(path.bucket.clone(), path.key.clone()));
        Ok(())
    }

    async fn delete_objects(&self, bucket: &str, keys: Vec<String>) -> Result<DeleteOutcome> {
        self.counters.bulk_delete.fetch_add(1, Ordering::SeqCst);
        if keys.len() > DEFAULT_PAGE {
            return Err(Error::General(format!(
                "MalformedXML: {} keys exceeds the {DEFAULT_PAGE}-key limit",
                keys.len()
            )));
        }

        let failing = self.lock_failures().clone();
        let mut objects = self.lock();
        let mut outcome = DeleteOutcome::default();
        for key in keys {
            if failing.contains(&key) {
                outcome.errors.push(KeyError {
                    key,
                    code: Some("AccessDenied".into()),
                    message: Some("Access Denied".into()),
                });
                continue;
            }
            objects.remove(&(bucket.to_string(), key.clone()));
            outcome.deleted.push(key);
        }
        Ok(outcome)
    }

    async fn copy_object(&self, src: &ObjectPath, dst: &ObjectPath) -> Result<()> {
        let data = self
            .object(&src.bucket, &src.key)
            .ok_or_else(|| Error::NotFound(src.to_string()))?;
        self.insert(&dst.bucket, &dst.key, data);
        Ok(())
    }

    async fn download_to_file(&self, src: &ObjectPath, dst: &Path) -> Result<u64> {
        let data = self.get_object(src).await?;
        tokio::fs::write(dst, &data).await?;
        Ok(data.len() as u64)
    }

    async fn upload_from_file(&self, src: &Path, dst: &ObjectPath) -> Result<()> {
        let data = tokio::fs::read(src).await?;
        self.insert(&dst.bucket, &dst.key, data);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Protocol;

    fn seeded(n: usize) -> MemoryStore {
        let store = MemoryStore::new();
        for i in 0..n {
            store.insert("bkt", &format!("data/{i:04}.csv"), b"x".to_vec());
        }
        store
    }

    #[tokio::test]
    async fn test_list_paginates_in_key_order() {
        let store = seeded(5);
        let first = store
            .list_objects(
                "bkt",
                ListOptions {
                    prefix: "data/".into(),
                    max_keys: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(first.truncated);
        assert_eq!(first.items[0].key, "data/0000.csv");
        assert_eq!(first.items[1].key, "data/0001.csv");

        let second = store
            .list_objects(
                "bkt",
                ListOptions {
                    prefix: "data/".into(),
                    max_keys: Some(10),
                    continuation_token: first.continuation_token,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!second.truncated);
        assert_eq!(second.items.len(), 3);
        assert_eq!(store.list_requests(), 2);
    }

    #[tokio::test]
    async fn test_list_with_delimiter_groups_prefixes() {
        let store = MemoryStore::new();
        store.insert("bkt", "data/x.csv", b"1".to_vec());
        store.insert("bkt", "data/y/z.csv", b"2".to_vec());
        store.insert("bkt", "data/y/w.csv", b"3".to_vec());

        let page = store
            .list_objects(
                "bkt",
                ListOptions {
                    prefix: "data/".into(),
                    delimiter: Some("/".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let keys: Vec<_> = page.items.iter().map(|i| (i.key.as_str(), i.is_dir)).collect();
        assert_eq!(keys, vec![("data/x.csv", false), ("data/y/", true)]);
    }

    #[tokio::test]
    async fn test_head_denied_is_access_denied() {
        let store = seeded(1);
        store.deny_head_requests(true);
        let path = ObjectPath::new(Protocol::S3, "bkt", "data/0000.csv");
        assert!(matches!(
            store.head_object(&path).await,
            Err(Error::AccessDenied(_))
        ));
        assert_eq!(store.fetch_object_info(&path).await.unwrap().size(), 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_reports_per_key_errors() {
        let store = seeded(3);
        store.fail_delete_of("data/0001.csv");
        let outcome = store
            .delete_objects(
                "bkt",
                vec![
                    "data/0000.csv".into(),
                    "data/0001.csv".into(),
                    "data/0002.csv".into(),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome.deleted.len(), 2);
        assert_eq!(outcome.errors[0].key, "data/0001.csv");
        assert_eq!(store.count("bkt", "data/"), 1);
    }

    #[tokio::test]
    async fn test_bulk_delete_rejects_oversized_batch() {
        let store = MemoryStore::new();
        let keys = (0..1001).map(|i| format!("k{i}")).collect();
        assert!(store.delete_objects("bkt", keys).await.is_err());
    }
}
