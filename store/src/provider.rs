use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::StoreError;

/// A boxed, `Send` future returning a `Result`.
///
/// All [`SidecarStore`] methods return this type. The futures are
/// `Send + 'static` so the packer can spawn them on a tokio `JoinSet`.
pub type StoreFuture<T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send>>;

/// Backend that holds sidecar files.
///
/// The returned futures do NOT drive themselves; await them on an async
/// runtime.
///
/// # Read vs Write
///
/// `read` and `list` are required. `write` and `remove` default to
/// [`StoreError::ReadOnly`]; writable stores override them and return `false`
/// from [`is_read_only()`](SidecarStore::is_read_only).
///
/// # Name Contract
///
/// Names are plain file names without separators. Implementations validate
/// them with [`name::validate`](crate::name::validate) and fail the returned
/// future with [`StoreError::InvalidName`] otherwise.
pub trait SidecarStore: Send + Sync + 'static {
    /// Read the full contents of a sidecar.
    fn read(&self, name: &str) -> StoreFuture<Vec<u8>>;

    /// List the names of all files in the store, sorted.
    ///
    /// A store whose backing location does not exist yet lists as empty.
    fn list(&self) -> StoreFuture<Vec<String>>;

    /// Human-readable location of a sidecar, used in reports and logs.
    fn location(&self, name: &str) -> String {
        name.to_owned()
    }

    /// Whether this store rejects writes.
    fn is_read_only(&self) -> bool {
        true
    }

    /// Write a sidecar, replacing any previous content.
    ///
    /// The future resolves only once the data is fully stored; a failed
    /// write must not leave a partially written sidecar behind.
    fn write(&self, _name: &str, _data: Vec<u8>) -> StoreFuture<()> {
        Box::pin(async { Err(StoreError::ReadOnly) })
    }

    /// Remove a sidecar.
    fn remove(&self, _name: &str) -> StoreFuture<()> {
        Box::pin(async { Err(StoreError::ReadOnly) })
    }
}

impl<S: SidecarStore + ?Sized> SidecarStore for Arc<S> {
    fn read(&self, name: &str) -> StoreFuture<Vec<u8>> {
        (**self).read(name)
    }

    fn list(&self) -> StoreFuture<Vec<String>> {
        (**self).list()
    }

    fn location(&self, name: &str) -> String {
        (**self).location(name)
    }

    fn is_read_only(&self) -> bool {
        (**self).is_read_only()
    }

    fn write(&self, name: &str, data: Vec<u8>) -> StoreFuture<()> {
        (**self).write(name, data)
    }

    fn remove(&self, name: &str) -> StoreFuture<()> {
        (**self).remove(name)
    }
}
