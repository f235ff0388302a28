//! Typed views of the geometry data found in a serialized scene.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::attribute::{AttributeKind, INLINE_GEOMETRY_KEYS};

/// One entry of `geometries.vertexData`.
///
/// Every attribute is optional; absent or empty arrays are not exported.
/// Scalar keys the packer does not know about are ignored. Unknown arrays
/// are caught by [`unsupported_attribute`] before a record is packed.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeometryRecord {
    pub id: Option<String>,
    pub positions: Option<Vec<f32>>,
    pub normals: Option<Vec<f32>>,
    pub uvs: Option<Vec<f32>>,
    #[serde(alias = "uv2s")]
    pub uvs2: Option<Vec<f32>>,
    pub tangents: Option<Vec<f32>>,
    pub colors: Option<Vec<f32>>,
    /// Bone indices, 4 per vertex, each expected to fit in a byte.
    pub matrices_indices: Option<Vec<u32>>,
    pub matrices_weights: Option<Vec<f32>>,
    pub indices: Option<Vec<i32>>,
}

impl GeometryRecord {
    /// Float stream for `kind`, if it is a float attribute and present.
    pub fn floats(&self, kind: AttributeKind) -> Option<&[f32]> {
        let values = match kind {
            AttributeKind::Positions => &self.positions,
            AttributeKind::Normals => &self.normals,
            AttributeKind::Uvs => &self.uvs,
            AttributeKind::Uvs2 => &self.uvs2,
            AttributeKind::Tangents => &self.tangents,
            AttributeKind::Colors => &self.colors,
            AttributeKind::MatricesWeights => &self.matrices_weights,
            _ => return None,
        };
        values.as_deref()
    }
}

/// First non-empty array in a `vertexData` record that has no sidecar slot,
/// e.g. `uvs3` or `matricesIndicesExtra`.
///
/// Packing such a record would drop the array along with the record.
pub(crate) fn unsupported_attribute(record: &Value) -> Option<&str> {
    record.as_object()?.iter().find_map(|(key, value)| {
        let non_empty = value.as_array().is_some_and(|values| !values.is_empty());
        (non_empty && !INLINE_GEOMETRY_KEYS.contains(&key.as_str())).then_some(key.as_str())
    })
}

/// A contiguous draw range within a mesh's shared buffers.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubMeshRecord {
    pub material_index: i32,
    pub vertices_start: i32,
    pub vertices_count: i32,
    pub index_start: i32,
    pub index_count: i32,
}

impl SubMeshRecord {
    pub fn to_array(self) -> [i32; 5] {
        [
            self.material_index,
            self.vertices_start,
            self.vertices_count,
            self.index_start,
            self.index_count,
        ]
    }

    pub fn from_array(values: [i32; 5]) -> Self {
        Self {
            material_index: values[0],
            vertices_start: values[1],
            vertices_count: values[2],
            index_start: values[3],
            index_count: values[4],
        }
    }
}
