//! Error types for packing and reading geometry sidecars.

use scenepack_store::StoreError;
use thiserror::Error;

use crate::descriptor::DataType;

/// Errors that can occur while packing a scene document or reading a sidecar.
#[derive(Error, Debug)]
pub enum PackError {
    #[error("invalid scene document: {0}")]
    InvalidDocument(String),
    #[error("geometry id '{0}' cannot be used as a sidecar file name")]
    InvalidGeometryId(String),
    #[error("malformed geometry '{geometry_id}': {source}")]
    MalformedGeometry {
        geometry_id: String,
        source: serde_json::Error,
    },
    #[error("geometry '{geometry_id}' has attribute '{attribute}', which sidecars cannot hold")]
    UnsupportedAttribute {
        geometry_id: String,
        attribute: String,
    },
    #[error("malformed subMeshes on mesh '{mesh}': {source}")]
    MalformedSubMeshes {
        mesh: String,
        source: serde_json::Error,
    },
    #[error("attribute '{attribute}' has {len} values, not a multiple of {stride}")]
    MisalignedAttribute {
        attribute: &'static str,
        len: usize,
        stride: usize,
    },
    #[error("attribute '{attribute}' is too large for a sidecar ({len} values)")]
    AttributeTooLarge { attribute: &'static str, len: usize },
    #[error("attribute '{attribute}' expects {expected:?} data, descriptor says {found:?}")]
    UnexpectedDataType {
        attribute: &'static str,
        expected: DataType,
        found: DataType,
    },
    #[error("attribute '{attribute}' reads {len} bytes at offset {offset}, sidecar has {available}")]
    Truncated {
        attribute: &'static str,
        offset: u64,
        len: u64,
        available: usize,
    },
    #[error("mesh '{mesh}' shares geometry '{geometry_id}' but has different subMeshes")]
    SharedGeometryConflict { mesh: String, geometry_id: String },
    #[error("sidecar store error: {0}")]
    Store(#[from] StoreError),
    #[error("write task failed: {0}")]
    TaskFailed(String),
}
