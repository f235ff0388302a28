//! The serialized scene document and the few keys the packer interprets.
//!
//! Only `meshes` and `geometries.vertexData` are read or written; every
//! other key of the document passes through untouched.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::attribute::INLINE_GEOMETRY_KEYS;
use crate::error::PackError;

/// A scene document as produced by the engine's scene serializer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(transparent)]
pub struct SceneDocument(Value);

impl SceneDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json(text: &str) -> Result<Self, PackError> {
        serde_json::from_str(text)
            .map(Self)
            .map_err(|err| PackError::InvalidDocument(err.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, PackError> {
        serde_json::to_string_pretty(&self.0)
            .map_err(|err| PackError::InvalidDocument(err.to_string()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// The `meshes` array. A document without meshes has an empty slice.
    pub fn meshes(&self) -> Result<&[Value], PackError> {
        let root = self
            .0
            .as_object()
            .ok_or_else(|| PackError::InvalidDocument("root is not an object".into()))?;
        match root.get("meshes") {
            None | Some(Value::Null) => Ok(&[][..]),
            Some(Value::Array(meshes)) => Ok(meshes.as_slice()),
            Some(_) => Err(PackError::InvalidDocument("'meshes' is not an array".into())),
        }
    }

    pub(crate) fn mesh_mut(&mut self, index: usize) -> Option<&mut Map<String, Value>> {
        self.0
            .get_mut("meshes")?
            .as_array_mut()?
            .get_mut(index)?
            .as_object_mut()
    }

    /// Entries of `geometries.vertexData`, by id. The first entry wins when
    /// ids repeat.
    pub fn geometry_records(&self) -> HashMap<&str, &Value> {
        let mut records = HashMap::new();
        for record in self.vertex_data() {
            if let Some(id) = record.get("id").and_then(Value::as_str) {
                records.entry(id).or_insert(record);
            }
        }
        records
    }

    fn vertex_data(&self) -> &[Value] {
        self.0
            .get("geometries")
            .and_then(|g| g.get("vertexData"))
            .and_then(Value::as_array)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Remove every `geometries.vertexData` entry whose id is in `ids`.
    pub(crate) fn remove_geometries(&mut self, ids: &HashSet<String>) {
        let Some(vertex_data) = self
            .0
            .get_mut("geometries")
            .and_then(|g| g.get_mut("vertexData"))
            .and_then(Value::as_array_mut)
        else {
            return;
        };
        vertex_data.retain(|record| {
            record
                .get("id")
                .and_then(Value::as_str)
                .is_none_or(|id| !ids.contains(id))
        });
    }

    /// Drop `geometries.vertexData` if it is empty, then `geometries` if
    /// nothing else is left in it.
    pub(crate) fn prune_geometries(&mut self) {
        let Some(root) = self.0.as_object_mut() else {
            return;
        };
        let Some(geometries) = root.get_mut("geometries").and_then(Value::as_object_mut) else {
            return;
        };
        let empty_vertex_data = geometries
            .get("vertexData")
            .and_then(Value::as_array)
            .is_some_and(Vec::is_empty);
        if empty_vertex_data {
            geometries.remove("vertexData");
        }
        if geometries.is_empty() {
            root.remove("geometries");
        }
    }
}

impl From<Value> for SceneDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// `geometryId` of a mesh entry, if it has a non-empty one.
pub(crate) fn geometry_id(mesh: &Value) -> Option<&str> {
    mesh.get("geometryId")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
}

/// `id` of a mesh entry.
pub(crate) fn mesh_id(mesh: &Value) -> Option<&str> {
    mesh.get("id").and_then(Value::as_str)
}

/// Whether the mesh asked to keep its geometry in the document.
pub(crate) fn keeps_geometry_inline(mesh: &Value) -> bool {
    mesh.get("metadata")
        .and_then(|m| m.get("keepGeometryInline"))
        .and_then(Value::as_bool)
        .unwrap_or(false)
}

/// Name used for a mesh in reports: its id, else its name, else `#<index>`.
pub fn mesh_label(mesh: &Value, index: usize) -> String {
    mesh_id(mesh)
        .or_else(|| mesh.get("name").and_then(Value::as_str))
        .map_or_else(|| format!("#{index}"), str::to_owned)
}

/// Remove inline geometry arrays from a mesh entry.
pub(crate) fn strip_inline_geometry(mesh: &mut Map<String, Value>) {
    for key in INLINE_GEOMETRY_KEYS {
        mesh.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meshes_must_be_an_array() {
        let doc = SceneDocument::new(json!({ "meshes": {} }));
        assert!(matches!(doc.meshes(), Err(PackError::InvalidDocument(_))));

        let doc = SceneDocument::new(json!([]));
        assert!(doc.meshes().is_err());

        let doc = SceneDocument::new(json!({ "lights": [] }));
        assert!(doc.meshes().unwrap().is_empty());
    }

    #[test]
    fn first_geometry_record_wins() {
        let doc = SceneDocument::new(json!({
            "geometries": { "vertexData": [
                { "id": "g0", "positions": [1] },
                { "id": "g0", "positions": [2] },
                { "positions": [3] },
            ]}
        }));
        let records = doc.geometry_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records["g0"]["positions"], json!([1]));
    }

    #[test]
    fn remove_and_prune() {
        let mut doc = SceneDocument::new(json!({
            "geometries": {
                "vertexData": [{ "id": "g0" }, { "id": "g0" }, { "id": "g1" }],
                "boxes": []
            }
        }));
        doc.remove_geometries(&HashSet::from(["g0".to_owned()]));
        doc.prune_geometries();
        assert_eq!(
            doc.as_value()["geometries"],
            json!({ "vertexData": [{ "id": "g1" }], "boxes": [] })
        );

        doc.remove_geometries(&HashSet::from(["g1".to_owned()]));
        doc.prune_geometries();
        assert_eq!(doc.as_value()["geometries"], json!({ "boxes": [] }));
    }

    #[test]
    fn prune_removes_empty_geometries() {
        let mut doc = SceneDocument::new(json!({
            "geometries": { "vertexData": [] },
            "meshes": []
        }));
        doc.prune_geometries();
        assert_eq!(doc.as_value(), &json!({ "meshes": [] }));
    }

    #[test]
    fn mesh_helpers() {
        let mesh = json!({
            "name": "Cube",
            "geometryId": "g0",
            "metadata": { "keepGeometryInline": true }
        });
        assert_eq!(geometry_id(&mesh), Some("g0"));
        assert!(keeps_geometry_inline(&mesh));
        assert_eq!(mesh_label(&mesh, 3), "Cube");
        assert_eq!(mesh_label(&json!({ "id": "m0", "name": "Cube" }), 0), "m0");
        assert_eq!(mesh_label(&json!({}), 3), "#3");
        assert_eq!(geometry_id(&json!({ "geometryId": "" })), None);
    }

    #[test]
    fn strip_removes_both_uv2_spellings() {
        let mut mesh = json!({
            "id": "m0",
            "positions": [],
            "uv2s": [],
            "uvs2": [],
            "subMeshes": [],
        });
        strip_inline_geometry(mesh.as_object_mut().unwrap());
        assert_eq!(mesh, json!({ "id": "m0" }));
    }
}
