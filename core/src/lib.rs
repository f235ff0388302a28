//! # scenepack core
//!
//! Incremental geometry packing for serialized scene documents.
//!
//! A scene document stores each mesh's geometry as inline JSON arrays. The
//! [`GeometryPacker`] moves that data into one binary sidecar per geometry,
//! `<geometryId>.babylonbinarymeshdata`, and rewrites the mesh with a
//! `delayLoadingFile` reference and a `_binaryInfo` descriptor table so the
//! loader can fetch geometry on demand.
//!
//! ```ignore
//! let mut document = SceneDocument::from_json(&text)?;
//! let report = export_incremental_geometries("out/geometries", &mut document, true, None).await?;
//! for path in report.written_paths() {
//!     println!("{path}");
//! }
//! ```
//!
//! The sidecar layout is described in [`encode`]; [`decode_geometry`] reads it
//! back.

mod attribute;
mod bounds;
mod cleanup;
mod decode;
mod descriptor;
mod document;
pub mod encode;
mod error;
mod geometry;
mod packer;
mod registry;
mod report;

pub use attribute::AttributeKind;
pub use bounds::{Aabb, MeshBoundsSource, NoRuntimeScene};
pub use cleanup::clean_stale_sidecars;
pub use decode::{DecodedGeometry, decode_geometry, unpack_bone_indices};
pub use descriptor::{BinaryAttributeDescriptor, BinaryInfo, DataType};
pub use document::{SceneDocument, mesh_label};
pub use encode::{EncodedGeometry, SIDECAR_EXTENSION, encode_geometry, sidecar_file_name};
pub use error::PackError;
pub use geometry::{GeometryRecord, SubMeshRecord};
pub use packer::{
    DEFAULT_MAX_CONCURRENT_WRITES, GeometryPacker, PackOptions, export_incremental_geometries,
};
pub use registry::{EngineResource, ResourceRegistry};
pub use report::{ExportReport, GeometryFailure, SkipReason, SkippedMesh, WrittenSidecar};
