//! The fixed set of geometry attributes a sidecar can hold.

use crate::descriptor::DataType;

/// One attribute stream of a packed geometry.
///
/// Variants are declared in sidecar order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeKind {
    Positions,
    Normals,
    Uvs,
    Uvs2,
    Tangents,
    Colors,
    MatricesIndices,
    MatricesWeights,
    Indices,
    SubMeshes,
}

impl AttributeKind {
    /// Every attribute, in the order its bytes appear in a sidecar.
    pub const ORDER: [AttributeKind; 10] = [
        AttributeKind::Positions,
        AttributeKind::Normals,
        AttributeKind::Uvs,
        AttributeKind::Uvs2,
        AttributeKind::Tangents,
        AttributeKind::Colors,
        AttributeKind::MatricesIndices,
        AttributeKind::MatricesWeights,
        AttributeKind::Indices,
        AttributeKind::SubMeshes,
    ];

    /// Key of the inline array in the serialized scene.
    pub fn json_key(self) -> &'static str {
        match self {
            Self::Positions => "positions",
            Self::Normals => "normals",
            Self::Uvs => "uvs",
            Self::Uvs2 => "uvs2",
            Self::Tangents => "tangents",
            Self::Colors => "colors",
            Self::MatricesIndices => "matricesIndices",
            Self::MatricesWeights => "matricesWeights",
            Self::Indices => "indices",
            Self::SubMeshes => "subMeshes",
        }
    }

    /// Key of this attribute's descriptor inside `_binaryInfo`.
    pub fn descriptor_key(self) -> &'static str {
        match self {
            Self::Positions => "positionsAttrDesc",
            Self::Normals => "normalsAttrDesc",
            Self::Uvs => "uvsAttrDesc",
            Self::Uvs2 => "uvs2AttrDesc",
            // Spelled the way the scene loader reads it.
            Self::Tangents => "tangetsAttrDesc",
            Self::Colors => "colorsAttrDesc",
            Self::MatricesIndices => "matricesIndicesAttrDesc",
            Self::MatricesWeights => "matricesWeightsAttrDesc",
            Self::Indices => "indicesAttrDesc",
            Self::SubMeshes => "subMeshesAttrDesc",
        }
    }

    /// Inverse of [`descriptor_key`](Self::descriptor_key).
    pub fn from_descriptor_key(key: &str) -> Option<Self> {
        Self::ORDER
            .into_iter()
            .find(|kind| kind.descriptor_key() == key)
    }

    /// Element type written to the sidecar.
    pub fn data_type(self) -> DataType {
        match self {
            Self::MatricesIndices | Self::Indices | Self::SubMeshes => DataType::Int32,
            _ => DataType::Float32,
        }
    }

    /// Components per element in the source arrays.
    ///
    /// Bone indices arrive as 4 components per vertex and are usually packed
    /// into a single int32 on write; `matricesWeights` uses the host engine's
    /// reduced 2-per-vertex layout.
    pub fn input_stride(self) -> usize {
        match self {
            Self::Positions | Self::Normals => 3,
            Self::Uvs | Self::Uvs2 => 2,
            Self::Tangents | Self::Colors => 4,
            Self::MatricesIndices => 4,
            Self::MatricesWeights => 2,
            Self::Indices => 1,
            Self::SubMeshes => 5,
        }
    }
}

/// Mesh keys that hold inline geometry and are dropped once it is packed.
pub(crate) const INLINE_GEOMETRY_KEYS: [&str; 11] = [
    "positions",
    "normals",
    "uvs",
    "uvs2",
    "uv2s",
    "tangents",
    "colors",
    "matricesIndices",
    "matricesWeights",
    "indices",
    "subMeshes",
];
