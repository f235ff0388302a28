use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::name;
use crate::provider::{SidecarStore, StoreFuture};

/// In-memory sidecar store for tests and dry runs.
///
/// Cloning shares the same contents, so a test can keep one handle for
/// inspection while the packer owns another. All futures complete on the
/// first poll.
///
/// # Example
///
/// ```
/// use scenepack_store::{MemoryStore, SidecarStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let store = MemoryStore::new();
/// store.write("g0.bin", vec![1, 2, 3]).await.unwrap();
/// assert_eq!(store.get("g0.bin"), Some(vec![1, 2, 3]));
/// # }
/// ```
#[derive(Clone, Default)]
pub struct MemoryStore {
    files: Arc<RwLock<BTreeMap<String, Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a file directly, bypassing name validation.
    pub fn insert(&self, name: impl Into<String>, data: Vec<u8>) {
        self.files.write().insert(name.into(), data);
    }

    /// Copy of a file's contents, if present.
    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.files.read().get(name).cloned()
    }

    /// Whether a file with this name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.files.read().contains_key(name)
    }

    /// Sorted names of all stored files.
    pub fn names(&self) -> Vec<String> {
        self.files.read().keys().cloned().collect()
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    /// Whether the store holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl SidecarStore for MemoryStore {
    fn read(&self, name: &str) -> StoreFuture<Vec<u8>> {
        let files = self.files.clone();
        let name = name.to_owned();
        Box::pin(async move {
            name::validate(&name)?;
            let map = files.read();
            map.get(&name).cloned().ok_or(StoreError::NotFound(name))
        })
    }

    fn list(&self) -> StoreFuture<Vec<String>> {
        let files = self.files.clone();
        Box::pin(async move { Ok(files.read().keys().cloned().collect()) })
    }

    fn location(&self, name: &str) -> String {
        format!("memory://{name}")
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, name: &str, data: Vec<u8>) -> StoreFuture<()> {
        let files = self.files.clone();
        let name = name.to_owned();
        Box::pin(async move {
            name::validate(&name)?;
            files.write().insert(name, data);
            Ok(())
        })
    }

    fn remove(&self, name: &str) -> StoreFuture<()> {
        let files = self.files.clone();
        let name = name.to_owned();
        Box::pin(async move {
            name::validate(&name)?;
            files
                .write()
                .remove(&name)
                .ok_or(StoreError::NotFound(name))?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_and_read() {
        let store = MemoryStore::new();
        store.write("g0.bin", b"data".to_vec()).await.unwrap();
        assert_eq!(store.read("g0.bin").await.unwrap(), b"data");
    }

    #[tokio::test]
    async fn read_missing() {
        let store = MemoryStore::new();
        let result = store.read("nope.bin").await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn write_overwrites() {
        let store = MemoryStore::new();
        store.write("g0.bin", vec![1]).await.unwrap();
        store.write("g0.bin", vec![2, 3]).await.unwrap();
        assert_eq!(store.get("g0.bin"), Some(vec![2, 3]));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn write_rejects_nested_name() {
        let store = MemoryStore::new();
        let result = store.write("sub/g0.bin", vec![]).await;
        assert!(matches!(result, Err(StoreError::InvalidName(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let store = MemoryStore::new();
        store.insert("b.bin", vec![]);
        store.insert("a.bin", vec![]);
        assert_eq!(store.list().await.unwrap(), vec!["a.bin", "b.bin"]);
    }

    #[tokio::test]
    async fn remove_existing_and_missing() {
        let store = MemoryStore::new();
        store.insert("g0.bin", vec![]);
        store.remove("g0.bin").await.unwrap();
        assert!(!store.contains("g0.bin"));
        assert!(store.remove("g0.bin").await.is_err());
    }

    #[tokio::test]
    async fn clones_share_contents() {
        let store = MemoryStore::new();
        let other = store.clone();
        other.write("g0.bin", vec![7]).await.unwrap();
        assert_eq!(store.get("g0.bin"), Some(vec![7]));
    }

    #[test]
    fn is_not_read_only() {
        assert!(!MemoryStore::new().is_read_only());
    }
}
