//! The incremental geometry packer.
//!
//! [`GeometryPacker::pack`] moves the geometry of every eligible mesh into a
//! sidecar and rewrites the mesh to load it lazily. It runs in three steps:
//!
//! 1. Walk the meshes in document order. Skip the ones that are not
//!    eligible, encode the rest and hand each sidecar to a write task.
//!    Geometries shared by several meshes are encoded and written once.
//! 2. Wait for every write task.
//! 3. Rewrite the meshes whose sidecar was stored, again in document order,
//!    then drop the geometry records they consumed.
//!
//! A failure only affects the geometry it happened on: its meshes keep their
//! inline data, its record stays in `geometries.vertexData`, and the failure
//! is listed in [`ExportReport::failed`].

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use scenepack_store::{DirectoryStore, SidecarStore, StoreError};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::bounds::{Aabb, MeshBoundsSource, NoRuntimeScene};
use crate::document::{self, SceneDocument};
use crate::encode::{encode_geometry, sidecar_file_name};
use crate::error::PackError;
use crate::geometry::{self, GeometryRecord, SubMeshRecord};
use crate::report::{ExportReport, GeometryFailure, SkipReason, SkippedMesh, WrittenSidecar};

/// Default cap on sidecar writes in flight.
pub const DEFAULT_MAX_CONCURRENT_WRITES: usize = 16;

/// Settings for one export run.
#[derive(Debug, Clone)]
pub struct PackOptions {
    /// Final exports honor `metadata.keepGeometryInline`.
    pub is_final_export: bool,
    /// Prepended verbatim to the sidecar file name in `delayLoadingFile`.
    pub path_prefix: String,
    /// Encoded sidecars alive at once. Values below 1 are treated as 1.
    pub max_concurrent_writes: usize,
    /// Derive bounds from positions when the bounds source has none.
    pub compute_missing_bounds: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            is_final_export: false,
            path_prefix: String::new(),
            max_concurrent_writes: DEFAULT_MAX_CONCURRENT_WRITES,
            compute_missing_bounds: false,
        }
    }
}

impl PackOptions {
    pub fn with_final_export(mut self, is_final_export: bool) -> Self {
        self.is_final_export = is_final_export;
        self
    }

    pub fn with_path_prefix(mut self, path_prefix: impl Into<String>) -> Self {
        self.path_prefix = path_prefix.into();
        self
    }

    pub fn with_max_concurrent_writes(mut self, max_concurrent_writes: usize) -> Self {
        self.max_concurrent_writes = max_concurrent_writes;
        self
    }

    pub fn with_compute_missing_bounds(mut self, compute_missing_bounds: bool) -> Self {
        self.compute_missing_bounds = compute_missing_bounds;
        self
    }
}

/// Packs scene geometry into sidecars held by a [`SidecarStore`].
pub struct GeometryPacker<S: SidecarStore> {
    store: S,
    options: PackOptions,
}

/// A mesh that will be rewritten once its sidecar is stored.
struct PlannedMesh {
    index: usize,
    label: String,
    bounds: Option<Aabb>,
}

/// One sidecar, possibly shared by several meshes.
struct WriteJob {
    geometry_id: String,
    file_name: String,
    binary_info: Value,
    byte_len: usize,
    sub_meshes: Vec<SubMeshRecord>,
    position_bounds: Option<Aabb>,
    meshes: Vec<PlannedMesh>,
    outcome: Option<Result<(), StoreError>>,
}

impl WriteJob {
    fn first_mesh(&self) -> usize {
        self.meshes.first().map_or(usize::MAX, |m| m.index)
    }

    fn mesh_labels(&self) -> Vec<String> {
        self.meshes.iter().map(|m| m.label.clone()).collect()
    }
}

/// What happened to a geometry id seen earlier in the document.
enum Slot {
    Writing(usize),
    Failed(usize),
}

impl<S: SidecarStore> GeometryPacker<S> {
    pub fn new(store: S, options: PackOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &PackOptions {
        &self.options
    }

    /// Pack every eligible mesh of `document` and rewrite it in place.
    ///
    /// Only fails if the document itself cannot be walked (root not an
    /// object, `meshes` not an array). Per-geometry problems are reported in
    /// the returned [`ExportReport`].
    pub async fn pack<B>(
        &self,
        document: &mut SceneDocument,
        bounds: &B,
    ) -> Result<ExportReport, PackError>
    where
        B: MeshBoundsSource + ?Sized,
    {
        let mut report = ExportReport::default();
        let mut jobs: Vec<WriteJob> = Vec::new();
        let mut failures: Vec<(usize, GeometryFailure)> = Vec::new();
        let mut slots: HashMap<String, Slot> = HashMap::new();
        // Geometry ids still referenced by meshes that keep inline data.
        let mut inline_ids: HashSet<String> = HashSet::new();

        let semaphore = Arc::new(Semaphore::new(self.options.max_concurrent_writes.max(1)));
        let mut tasks = JoinSet::new();

        let meshes = document.meshes()?;
        let records = document.geometry_records();

        for (index, mesh) in meshes.iter().enumerate() {
            let label = document::mesh_label(mesh, index);

            let Some(geometry_id) = document::geometry_id(mesh) else {
                report.skipped.push(SkippedMesh {
                    mesh: label,
                    reason: SkipReason::NoGeometryId,
                });
                continue;
            };
            if self.options.is_final_export && document::keeps_geometry_inline(mesh) {
                inline_ids.insert(geometry_id.to_owned());
                report.skipped.push(SkippedMesh {
                    mesh: label,
                    reason: SkipReason::KeptInline,
                });
                continue;
            }
            let Some(record) = records.get(geometry_id) else {
                log::warn!("Mesh '{label}' references missing geometry '{geometry_id}'");
                report.skipped.push(SkippedMesh {
                    mesh: label,
                    reason: SkipReason::MissingGeometry(geometry_id.to_owned()),
                });
                continue;
            };

            let planned = PlannedMesh {
                index,
                bounds: document::mesh_id(mesh).and_then(|id| bounds.mesh_bounds(id)),
                label,
            };

            match slots.get(geometry_id) {
                Some(Slot::Writing(job_index)) => {
                    let job = &mut jobs[*job_index];
                    let error = match read_sub_meshes(mesh, &planned.label) {
                        Ok(sub_meshes) if sub_meshes == job.sub_meshes => {
                            job.meshes.push(planned);
                            continue;
                        }
                        Ok(_) => PackError::SharedGeometryConflict {
                            mesh: planned.label.clone(),
                            geometry_id: geometry_id.to_owned(),
                        },
                        Err(error) => error,
                    };
                    log::warn!("Keeping mesh '{}' inline: {error}", planned.label);
                    inline_ids.insert(geometry_id.to_owned());
                    failures.push((
                        index,
                        GeometryFailure {
                            geometry_id: geometry_id.to_owned(),
                            mesh_ids: vec![planned.label],
                            error,
                        },
                    ));
                    continue;
                }
                Some(Slot::Failed(failure_index)) => {
                    failures[*failure_index].1.mesh_ids.push(planned.label);
                    continue;
                }
                None => {}
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|err| PackError::TaskFailed(err.to_string()))?;

            match prepare_job(geometry_id, record, mesh, &planned.label, &self.options) {
                Ok((mut job, bytes)) => {
                    let job_index = jobs.len();
                    let write = self.store.write(&job.file_name, bytes);
                    tasks.spawn(async move {
                        let _permit = permit;
                        (job_index, write.await)
                    });
                    job.meshes.push(planned);
                    slots.insert(geometry_id.to_owned(), Slot::Writing(job_index));
                    jobs.push(job);
                }
                Err(error) => {
                    log::warn!("Failed to pack geometry '{geometry_id}': {error}");
                    slots.insert(geometry_id.to_owned(), Slot::Failed(failures.len()));
                    failures.push((
                        index,
                        GeometryFailure {
                            geometry_id: geometry_id.to_owned(),
                            mesh_ids: vec![planned.label],
                            error,
                        },
                    ));
                }
            }
        }

        let mut join_errors = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((job_index, outcome)) => jobs[job_index].outcome = Some(outcome),
                Err(err) => {
                    log::error!("Sidecar write task failed: {err}");
                    join_errors.push(err.to_string());
                }
            }
        }

        let mut written_ids = HashSet::new();
        for mut job in jobs {
            match job.outcome.take() {
                Some(Ok(())) => {
                    let delay_loading_file = format!("{}{}", self.options.path_prefix, job.file_name);
                    for planned in &job.meshes {
                        let Some(entry) = document.mesh_mut(planned.index) else {
                            continue;
                        };
                        let aabb = planned
                            .bounds
                            .or(job.position_bounds)
                            .unwrap_or(Aabb::ZERO);
                        document::strip_inline_geometry(entry);
                        entry.insert(
                            "delayLoadingFile".to_owned(),
                            Value::String(delay_loading_file.clone()),
                        );
                        entry.insert("boundingBoxMinimum".to_owned(), json!(aabb.min_array()));
                        entry.insert("boundingBoxMaximum".to_owned(), json!(aabb.max_array()));
                        entry.insert("_binaryInfo".to_owned(), job.binary_info.clone());
                    }

                    let location = self.store.location(&job.file_name);
                    log::debug!(
                        "Wrote {location} ({} bytes, {} mesh(es))",
                        job.byte_len,
                        job.meshes.len()
                    );
                    written_ids.insert(job.geometry_id.clone());
                    report.written.push(WrittenSidecar {
                        geometry_id: job.geometry_id,
                        file_name: job.file_name,
                        location,
                        byte_len: job.byte_len,
                        mesh_count: job.meshes.len(),
                    });
                }
                Some(Err(err)) => {
                    log::warn!("Failed to write sidecar '{}': {err}", job.file_name);
                    failures.push((
                        job.first_mesh(),
                        GeometryFailure {
                            mesh_ids: job.mesh_labels(),
                            geometry_id: job.geometry_id,
                            error: PackError::Store(err),
                        },
                    ));
                }
                None => {
                    let reason = if join_errors.is_empty() {
                        "write task did not complete".to_owned()
                    } else {
                        join_errors.join("; ")
                    };
                    failures.push((
                        job.first_mesh(),
                        GeometryFailure {
                            mesh_ids: job.mesh_labels(),
                            geometry_id: job.geometry_id,
                            error: PackError::TaskFailed(reason),
                        },
                    ));
                }
            }
        }

        let consumed: HashSet<String> = written_ids.difference(&inline_ids).cloned().collect();
        document.remove_geometries(&consumed);
        document.prune_geometries();

        failures.sort_by_key(|(index, _)| *index);
        report.failed = failures.into_iter().map(|(_, failure)| failure).collect();

        log::info!(
            "Exported {} geometry sidecar(s): {} failed, {} mesh(es) skipped",
            report.written.len(),
            report.failed.len(),
            report.skipped.len()
        );
        Ok(report)
    }
}

/// Pack `document` into `<output_dir>/<geometryId>.babylonbinarymeshdata`
/// files with default options and no live scene.
///
/// `path_prefix` is prepended to each file name in `delayLoadingFile`; the
/// default is no prefix.
pub async fn export_incremental_geometries(
    output_dir: impl AsRef<Path>,
    document: &mut SceneDocument,
    is_final_export: bool,
    path_prefix: Option<&str>,
) -> Result<ExportReport, PackError> {
    let store = DirectoryStore::new(output_dir.as_ref());
    let options = PackOptions::default()
        .with_final_export(is_final_export)
        .with_path_prefix(path_prefix.unwrap_or_default());
    GeometryPacker::new(store, options)
        .pack(document, &NoRuntimeScene)
        .await
}

fn read_sub_meshes(mesh: &Value, label: &str) -> Result<Vec<SubMeshRecord>, PackError> {
    match mesh.get("subMeshes") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => {
            Vec::<SubMeshRecord>::deserialize(value).map_err(|source| {
                PackError::MalformedSubMeshes {
                    mesh: label.to_owned(),
                    source,
                }
            })
        }
    }
}

/// Encode one geometry. Returns the job (without meshes) and the sidecar bytes.
fn prepare_job(
    geometry_id: &str,
    record: &Value,
    mesh: &Value,
    label: &str,
    options: &PackOptions,
) -> Result<(WriteJob, Vec<u8>), PackError> {
    let file_name = sidecar_file_name(geometry_id)?;
    let sub_meshes = read_sub_meshes(mesh, label)?;
    if let Some(attribute) = geometry::unsupported_attribute(record) {
        return Err(PackError::UnsupportedAttribute {
            geometry_id: geometry_id.to_owned(),
            attribute: attribute.to_owned(),
        });
    }
    let geometry =
        GeometryRecord::deserialize(record).map_err(|source| PackError::MalformedGeometry {
            geometry_id: geometry_id.to_owned(),
            source,
        })?;

    let encoded = encode_geometry(&geometry, &sub_meshes)?;
    let binary_info = serde_json::to_value(&encoded.info)
        .map_err(|err| PackError::InvalidDocument(err.to_string()))?;

    let position_bounds = if options.compute_missing_bounds {
        geometry.positions.as_deref().and_then(Aabb::from_positions)
    } else {
        None
    };

    let job = WriteJob {
        geometry_id: geometry_id.to_owned(),
        file_name,
        binary_info,
        byte_len: encoded.bytes.len(),
        sub_meshes,
        position_bounds,
        meshes: Vec::new(),
        outcome: None,
    };
    Ok((job, encoded.bytes))
}

#[cfg(test)]
mod tests {
    use scenepack_store::MemoryStore;
    use serde_json::json;

    use super::*;

    fn cube_document() -> SceneDocument {
        SceneDocument::new(json!({
            "meshes": [{
                "id": "m0",
                "geometryId": "g0",
                "subMeshes": [{
                    "materialIndex": 0,
                    "verticesStart": 0,
                    "verticesCount": 3,
                    "indexStart": 0,
                    "indexCount": 3
                }]
            }],
            "geometries": { "vertexData": [{
                "id": "g0",
                "positions": [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 2.0, 0.0],
                "indices": [0, 1, 2]
            }]}
        }))
    }

    #[tokio::test]
    async fn packs_a_single_mesh() {
        let store = MemoryStore::new();
        let packer = GeometryPacker::new(store.clone(), PackOptions::default());
        let mut doc = cube_document();

        let report = packer.pack(&mut doc, &NoRuntimeScene).await.unwrap();
        assert!(report.is_success());
        assert_eq!(report.written.len(), 1);
        assert_eq!(report.written[0].byte_len, 36 + 12 + 20);

        let mesh = &doc.as_value()["meshes"][0];
        assert_eq!(mesh["delayLoadingFile"], json!("g0.babylonbinarymeshdata"));
        assert_eq!(mesh["boundingBoxMinimum"], json!([0.0, 0.0, 0.0]));
        assert_eq!(mesh["_binaryInfo"]["subMeshesAttrDesc"]["count"], json!(1));
        assert!(mesh.get("subMeshes").is_none());
        assert!(doc.as_value().get("geometries").is_none());

        let bytes = store.read("g0.babylonbinarymeshdata").await.unwrap();
        assert_eq!(bytes.len(), 68);
    }

    #[tokio::test]
    async fn computes_bounds_from_positions() {
        let packer = GeometryPacker::new(
            MemoryStore::new(),
            PackOptions::default()
                .with_compute_missing_bounds(true)
                .with_path_prefix("scene/"),
        );
        let mut doc = cube_document();
        packer.pack(&mut doc, &NoRuntimeScene).await.unwrap();

        let mesh = &doc.as_value()["meshes"][0];
        assert_eq!(mesh["boundingBoxMaximum"], json!([1.0, 2.0, 0.0]));
        assert_eq!(
            mesh["delayLoadingFile"],
            json!("scene/g0.babylonbinarymeshdata")
        );
    }

    #[tokio::test]
    async fn runtime_bounds_win() {
        let packer = GeometryPacker::new(
            MemoryStore::new(),
            PackOptions::default().with_compute_missing_bounds(true),
        );
        let mut runtime = HashMap::new();
        runtime.insert(
            "m0".to_owned(),
            Aabb::new(glam::Vec3::splat(-1.0), glam::Vec3::splat(5.0)),
        );
        let mut doc = cube_document();
        packer.pack(&mut doc, &runtime).await.unwrap();

        let mesh = &doc.as_value()["meshes"][0];
        assert_eq!(mesh["boundingBoxMinimum"], json!([-1.0, -1.0, -1.0]));
        assert_eq!(mesh["boundingBoxMaximum"], json!([5.0, 5.0, 5.0]));
    }

    #[tokio::test]
    async fn root_must_be_an_object() {
        let packer = GeometryPacker::new(MemoryStore::new(), PackOptions::default());
        let mut doc = SceneDocument::new(json!("scene"));
        assert!(matches!(
            packer.pack(&mut doc, &NoRuntimeScene).await,
            Err(PackError::InvalidDocument(_))
        ));
    }

    #[tokio::test]
    async fn malformed_geometry_stays_inline() {
        let store = MemoryStore::new();
        let packer = GeometryPacker::new(store.clone(), PackOptions::default());
        let mut doc = SceneDocument::new(json!({
            "meshes": [{ "id": "m0", "geometryId": "g0" }],
            "geometries": { "vertexData": [{ "id": "g0", "positions": "oops" }] }
        }));

        let report = packer.pack(&mut doc, &NoRuntimeScene).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].error,
            PackError::MalformedGeometry { .. }
        ));
        assert!(store.is_empty());
        assert!(doc.as_value()["meshes"][0].get("delayLoadingFile").is_none());
        assert_eq!(doc.as_value()["geometries"]["vertexData"][0]["id"], json!("g0"));
    }
}
