//! Packing geometry attributes into sidecar bytes.
//!
//! A sidecar is the concatenation of attribute buffers in
//! [`AttributeKind::ORDER`], each a flat little-endian array of 4-byte floats
//! or 4-byte signed integers. There is no header; the [`BinaryInfo`] produced
//! alongside the bytes is required to read them back.

use scenepack_store::name;

use crate::attribute::AttributeKind;
use crate::descriptor::{BinaryAttributeDescriptor, BinaryInfo};
use crate::error::PackError;
use crate::geometry::{GeometryRecord, SubMeshRecord};

/// File extension of geometry sidecars.
pub const SIDECAR_EXTENSION: &str = "babylonbinarymeshdata";

/// Sidecar file name for a geometry id: `<geometryId>.babylonbinarymeshdata`.
pub fn sidecar_file_name(geometry_id: &str) -> Result<String, PackError> {
    name::validate(geometry_id)
        .map_err(|_| PackError::InvalidGeometryId(geometry_id.to_owned()))?;
    Ok(format!("{geometry_id}.{SIDECAR_EXTENSION}"))
}

/// Sidecar bytes together with the descriptors needed to read them.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedGeometry {
    pub bytes: Vec<u8>,
    pub info: BinaryInfo,
}

/// Encode every present attribute of `geometry`, plus `sub_meshes`, into one
/// sidecar buffer.
///
/// Offsets start at zero and grow in attribute order. Empty arrays are
/// treated as absent.
pub fn encode_geometry(
    geometry: &GeometryRecord,
    sub_meshes: &[SubMeshRecord],
) -> Result<EncodedGeometry, PackError> {
    let mut writer = SidecarWriter::default();

    for kind in AttributeKind::ORDER {
        match kind {
            AttributeKind::MatricesIndices => {
                if let Some(indices) = non_empty(geometry.matrices_indices.as_deref()) {
                    writer.push_bone_indices(indices)?;
                }
            }
            AttributeKind::Indices => {
                if let Some(indices) = non_empty(geometry.indices.as_deref()) {
                    writer.push_ints(kind, indices, 1, false)?;
                }
            }
            AttributeKind::SubMeshes => {
                if !sub_meshes.is_empty() {
                    writer.push_ints(kind, &flatten_sub_meshes(sub_meshes), 5, false)?;
                }
            }
            _ => {
                if let Some(values) = non_empty(geometry.floats(kind)) {
                    writer.push_floats(kind, values)?;
                }
            }
        }
    }

    Ok(writer.finish())
}

/// Pack bone index quads into one int32 per vertex:
/// `(b3 << 24) | (b2 << 16) | (b1 << 8) | b0`.
///
/// Returns `None` if any index does not fit in a byte. Trailing values that
/// do not form a full quad are ignored.
pub fn pack_bone_indices(indices: &[u32]) -> Option<Vec<i32>> {
    if indices.iter().any(|&index| index > 0xff) {
        return None;
    }
    Some(
        indices
            .chunks_exact(4)
            .map(|quad| {
                let packed = (quad[3] << 24) | (quad[2] << 16) | (quad[1] << 8) | quad[0];
                packed as i32
            })
            .collect(),
    )
}

/// Flatten submeshes to 5 ints each, in field order.
pub fn flatten_sub_meshes(sub_meshes: &[SubMeshRecord]) -> Vec<i32> {
    sub_meshes.iter().flat_map(|sub| sub.to_array()).collect()
}

fn non_empty<T>(values: Option<&[T]>) -> Option<&[T]> {
    values.filter(|v| !v.is_empty())
}

#[derive(Default)]
struct SidecarWriter {
    bytes: Vec<u8>,
    info: BinaryInfo,
}

impl SidecarWriter {
    fn push_floats(&mut self, kind: AttributeKind, values: &[f32]) -> Result<(), PackError> {
        let stride = kind.input_stride();
        let count = element_count(kind, values.len(), stride)?;
        self.record(kind, count, stride, false);
        self.bytes.reserve(values.len() * 4);
        for value in values {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn push_ints(
        &mut self,
        kind: AttributeKind,
        values: &[i32],
        stride: usize,
        is_expanded: bool,
    ) -> Result<(), PackError> {
        let count = element_count(kind, values.len(), stride)?;
        self.record(kind, count, stride, is_expanded);
        self.bytes.reserve(values.len() * 4);
        for value in values {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        Ok(())
    }

    fn push_bone_indices(&mut self, indices: &[u32]) -> Result<(), PackError> {
        let kind = AttributeKind::MatricesIndices;
        element_count(kind, indices.len(), kind.input_stride())?;

        if let Some(packed) = pack_bone_indices(indices) {
            return self.push_ints(kind, &packed, 1, false);
        }

        // Some index does not fit in a byte: keep all four components.
        let expanded = indices
            .iter()
            .map(|&index| i32::try_from(index))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| PackError::AttributeTooLarge {
                attribute: kind.json_key(),
                len: indices.len(),
            })?;
        self.push_ints(kind, &expanded, 4, true)
    }

    fn record(&mut self, kind: AttributeKind, count: u32, stride: usize, is_expanded: bool) {
        self.info.insert(
            kind,
            BinaryAttributeDescriptor {
                count,
                stride: stride as u32,
                offset: self.bytes.len() as u64,
                data_type: kind.data_type(),
                is_expanded,
            },
        );
    }

    fn finish(self) -> EncodedGeometry {
        EncodedGeometry {
            bytes: self.bytes,
            info: self.info,
        }
    }
}

fn element_count(kind: AttributeKind, len: usize, stride: usize) -> Result<u32, PackError> {
    if len % stride != 0 {
        return Err(PackError::MisalignedAttribute {
            attribute: kind.json_key(),
            len,
            stride,
        });
    }
    u32::try_from(len / stride).map_err(|_| PackError::AttributeTooLarge {
        attribute: kind.json_key(),
        len,
    })
}

/// Data type check shared with the reader.
pub(crate) fn expect_data_type(
    kind: AttributeKind,
    descriptor: &BinaryAttributeDescriptor,
) -> Result<(), PackError> {
    let expected = kind.data_type();
    if descriptor.data_type != expected {
        return Err(PackError::UnexpectedDataType {
            attribute: kind.json_key(),
            expected,
            found: descriptor.data_type,
        });
    }
    Ok(())
}
