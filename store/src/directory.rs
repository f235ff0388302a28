use std::path::{Path, PathBuf};

use crate::name;
use crate::provider::{SidecarStore, StoreFuture};

/// Sidecar store backed by a directory on disk.
///
/// All IO goes through `tokio::fs`, so the returned futures must run inside a
/// tokio runtime. The directory is created on first write.
///
/// Writes go to `<name>.part` first and are renamed into place once the data
/// is on disk; a failed write removes the partial file.
///
/// # Example
///
/// ```ignore
/// let store = DirectoryStore::new("public/scene/geometries");
/// store.write("g0.babylonbinarymeshdata", bytes).await?;
/// ```
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at the given directory.
    ///
    /// The directory does not need to exist yet.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The directory this store writes into.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl SidecarStore for DirectoryStore {
    fn read(&self, file_name: &str) -> StoreFuture<Vec<u8>> {
        let root = self.root.clone();
        let file_name = file_name.to_owned();
        Box::pin(async move {
            name::validate(&file_name)?;
            Ok(tokio::fs::read(root.join(file_name)).await?)
        })
    }

    fn list(&self) -> StoreFuture<Vec<String>> {
        let root = self.root.clone();
        Box::pin(async move {
            if !tokio::fs::metadata(&root)
                .await
                .is_ok_and(|meta| meta.is_dir())
            {
                return Ok(Vec::new());
            }
            let mut entries = Vec::new();
            let mut dir = tokio::fs::read_dir(&root).await?;
            while let Some(entry) = dir.next_entry().await? {
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                if let Some(file_name) = entry.file_name().to_str() {
                    entries.push(file_name.to_owned());
                }
            }
            entries.sort();
            Ok(entries)
        })
    }

    fn location(&self, file_name: &str) -> String {
        self.root.join(file_name).to_string_lossy().into_owned()
    }

    fn is_read_only(&self) -> bool {
        false
    }

    fn write(&self, file_name: &str, data: Vec<u8>) -> StoreFuture<()> {
        let root = self.root.clone();
        let file_name = file_name.to_owned();
        Box::pin(async move {
            name::validate(&file_name)?;
            tokio::fs::create_dir_all(&root).await?;

            let final_path = root.join(&file_name);
            let part_path = root.join(format!("{file_name}.part"));
            let result = async {
                tokio::fs::write(&part_path, &data).await?;
                tokio::fs::rename(&part_path, &final_path).await
            }
            .await;

            if let Err(err) = result {
                if let Err(cleanup) = tokio::fs::remove_file(&part_path).await
                    && cleanup.kind() != std::io::ErrorKind::NotFound
                {
                    log::warn!(
                        "Failed to remove partial sidecar {}: {cleanup}",
                        part_path.display()
                    );
                }
                return Err(err.into());
            }
            Ok(())
        })
    }

    fn remove(&self, file_name: &str) -> StoreFuture<()> {
        let root = self.root.clone();
        let file_name = file_name.to_owned();
        Box::pin(async move {
            name::validate(&file_name)?;
            tokio::fs::remove_file(root.join(file_name)).await?;
            Ok(())
        })
    }
}
