//! Outcome of one export run.

use std::fmt;

use crate::error::PackError;

/// What an export did, per geometry and per skipped mesh.
#[derive(Debug, Default)]
pub struct ExportReport {
    /// Sidecars written, in document order of their first mesh.
    pub written: Vec<WrittenSidecar>,
    /// Geometries that could not be packed. Their meshes stay inline.
    pub failed: Vec<GeometryFailure>,
    /// Meshes that were not eligible for packing.
    pub skipped: Vec<SkippedMesh>,
}

impl ExportReport {
    /// Locations of all written sidecars.
    pub fn written_paths(&self) -> Vec<&str> {
        self.written.iter().map(|w| w.location.as_str()).collect()
    }

    /// File names of all written sidecars.
    pub fn written_files(&self) -> impl Iterator<Item = &str> {
        self.written.iter().map(|w| w.file_name.as_str())
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenSidecar {
    pub geometry_id: String,
    pub file_name: String,
    /// Where the store put the file, e.g. a full path for a directory store.
    pub location: String,
    pub byte_len: usize,
    /// Meshes rewritten to load from this sidecar.
    pub mesh_count: usize,
}

#[derive(Debug)]
pub struct GeometryFailure {
    pub geometry_id: String,
    pub mesh_ids: Vec<String>,
    pub error: PackError,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedMesh {
    pub mesh: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    NoGeometryId,
    MissingGeometry(String),
    KeptInline,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoGeometryId => write!(f, "no geometry id"),
            SkipReason::MissingGeometry(id) => write!(f, "geometry '{id}' not found"),
            SkipReason::KeptInline => write!(f, "geometry kept inline"),
        }
    }
}
