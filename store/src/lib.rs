//! Sidecar storage for the scenepack geometry packer.
//!
//! Sidecar files live in one flat namespace per store: a directory on disk
//! or an in-memory map. Every operation goes through the [`SidecarStore`]
//! trait and returns a boxed `Send + 'static` future, so the packer can hand
//! writes to a task pool without borrowing the store.
//!
//! # Stores
//!
//! - [`DirectoryStore`]: native directory, tokio file IO (requires the
//!   `directory` feature, enabled by default)
//! - [`MemoryStore`]: in-memory map for tests and dry runs
//!
//! Names passed to a store are single file names. Anything that would
//! escape the store root (separators, `..`) is rejected with
//! [`StoreError::InvalidName`] before it reaches a backend.
//!
//! ```ignore
//! let store = DirectoryStore::new("public/scene/geometries");
//! store.write("g0.babylonbinarymeshdata", bytes).await?;
//! ```

#[cfg(feature = "directory")]
mod directory;
mod error;
mod memory;
pub mod name;
mod provider;

#[cfg(feature = "directory")]
pub use directory::DirectoryStore;
pub use error::StoreError;
pub use memory::MemoryStore;
pub use provider::{SidecarStore, StoreFuture};
