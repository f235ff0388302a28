//! Reading a sidecar back into attribute arrays.
//!
//! This mirrors what the scene loader does when it resolves a
//! `delayLoadingFile`: each descriptor in `_binaryInfo` is sliced out of the
//! sidecar bytes and reinterpreted as little-endian values.

use crate::attribute::AttributeKind;
use crate::descriptor::{BinaryAttributeDescriptor, BinaryInfo};
use crate::encode::expect_data_type;
use crate::error::PackError;
use crate::geometry::SubMeshRecord;

/// Attribute arrays recovered from a sidecar.
///
/// Bone indices are returned unpacked, 4 per vertex, whatever layout they
/// were stored in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedGeometry {
    pub positions: Option<Vec<f32>>,
    pub normals: Option<Vec<f32>>,
    pub uvs: Option<Vec<f32>>,
    pub uvs2: Option<Vec<f32>>,
    pub tangents: Option<Vec<f32>>,
    pub colors: Option<Vec<f32>>,
    pub matrices_indices: Option<Vec<u32>>,
    pub matrices_weights: Option<Vec<f32>>,
    pub indices: Option<Vec<i32>>,
    pub sub_meshes: Option<Vec<SubMeshRecord>>,
}

impl DecodedGeometry {
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

    fn set_floats(&mut self, kind: AttributeKind, values: Vec<f32>) {
        let slot = match kind {
            AttributeKind::Positions => &mut self.positions,
            AttributeKind::Normals => &mut self.normals,
            AttributeKind::Uvs => &mut self.uvs,
            AttributeKind::Uvs2 => &mut self.uvs2,
            AttributeKind::Tangents => &mut self.tangents,
            AttributeKind::Colors => &mut self.colors,
            AttributeKind::MatricesWeights => &mut self.matrices_weights,
            _ => return,
        };
        *slot = Some(values);
    }
}

/// Decode every attribute `info` describes out of `bytes`.
pub fn decode_geometry(bytes: &[u8], info: &BinaryInfo) -> Result<DecodedGeometry, PackError> {
    let mut decoded = DecodedGeometry::default();

    for (kind, desc) in info.iter() {
        expect_data_type(kind, desc)?;
        let raw = slice(bytes, kind, desc)?;

        match kind {
            AttributeKind::MatricesIndices => {
                let ints = read_i32s(raw);
                decoded.matrices_indices = Some(if desc.is_expanded {
                    ints.into_iter().map(|i| i as u32).collect()
                } else {
                    unpack_bone_indices(&ints)
                });
            }
            AttributeKind::Indices => decoded.indices = Some(read_i32s(raw)),
            AttributeKind::SubMeshes => {
                let subs = read_i32s(raw)
                    .chunks_exact(5)
                    .map(|c| SubMeshRecord::from_array([c[0], c[1], c[2], c[3], c[4]]))
                    .collect();
                decoded.sub_meshes = Some(subs);
            }
            _ => decoded.set_floats(kind, read_f32s(raw)),
        }
    }

    Ok(decoded)
}

/// Inverse of [`pack_bone_indices`](crate::encode::pack_bone_indices).
pub fn unpack_bone_indices(packed: &[i32]) -> Vec<u32> {
    packed
        .iter()
        .flat_map(|&value| {
            let value = value as u32;
            [
                value & 0xff,
                (value >> 8) & 0xff,
                (value >> 16) & 0xff,
                value >> 24,
            ]
        })
        .collect()
}

fn slice<'a>(
    bytes: &'a [u8],
    kind: AttributeKind,
    desc: &BinaryAttributeDescriptor,
) -> Result<&'a [u8], PackError> {
    let truncated = || PackError::Truncated {
        attribute: kind.json_key(),
        offset: desc.offset,
        len: desc.byte_len().unwrap_or(u64::MAX),
        available: bytes.len(),
    };
    let end = desc.end().ok_or_else(truncated)?;
    let start = usize::try_from(desc.offset).map_err(|_| truncated())?;
    let end = usize::try_from(end).map_err(|_| truncated())?;
    bytes.get(start..end).ok_or_else(truncated)
}

fn read_f32s(raw: &[u8]) -> Vec<f32> {
    raw.chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

fn read_i32s(raw: &[u8]) -> Vec<i32> {
    raw.chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::DataType;
    use crate::encode::{encode_geometry, pack_bone_indices};
    use crate::geometry::GeometryRecord;

    #[test]
    fn unpack_matches_pack() {
        let indices = vec![1, 2, 3, 4, 0, 0, 255, 17];
        let packed = pack_bone_indices(&indices).unwrap();
        assert_eq!(unpack_bone_indices(&packed), indices);
    }

    #[test]
    fn skinned_geometry() {
        let geometry = GeometryRecord {
            positions: Some(vec![0.0; 6]),
            matrices_indices: Some(vec![0, 1, 2, 3, 4, 5, 6, 7]),
            matrices_weights: Some(vec![0.5, 0.5, 1.0, 0.0]),
            ..Default::default()
        };
        let encoded = encode_geometry(&geometry, &[]).unwrap();
        let decoded = decode_geometry(&encoded.bytes, &encoded.info).unwrap();
        assert_eq!(decoded.matrices_indices, geometry.matrices_indices);
        assert_eq!(decoded.matrices_weights, geometry.matrices_weights);
        assert!(decoded.normals.is_none());
    }

    #[test]
    fn expanded_bone_indices() {
        let geometry = GeometryRecord {
            matrices_indices: Some(vec![0, 511, 2, 3]),
            ..Default::default()
        };
        let encoded = encode_geometry(&geometry, &[]).unwrap();
        let decoded = decode_geometry(&encoded.bytes, &encoded.info).unwrap();
        assert_eq!(decoded.matrices_indices, Some(vec![0, 511, 2, 3]));
    }

    #[test]
    fn truncated_sidecar() {
        let geometry = GeometryRecord {
            positions: Some(vec![1.0, 2.0, 3.0]),
            indices: Some(vec![0]),
            ..Default::default()
        };
        let encoded = encode_geometry(&geometry, &[]).unwrap();
        let err = decode_geometry(&encoded.bytes[..14], &encoded.info).unwrap_err();
        assert!(matches!(
            err,
            PackError::Truncated {
                attribute: "indices",
                offset: 12,
                len: 4,
                available: 14
            }
        ));
    }

    #[test]
    fn offset_near_u64_max_is_truncated() {
        let mut info = BinaryInfo::new();
        info.insert(
            AttributeKind::Positions,
            BinaryAttributeDescriptor {
                count: 1,
                stride: 3,
                offset: u64::MAX - 4,
                data_type: DataType::Float32,
                is_expanded: false,
            },
        );
        let err = decode_geometry(&[0; 12], &info).unwrap_err();
        assert!(matches!(
            err,
            PackError::Truncated {
                attribute: "positions",
                len: 12,
                available: 12,
                ..
            }
        ));
    }

    #[test]
    fn oversized_count_is_truncated() {
        let mut info = BinaryInfo::new();
        info.insert(
            AttributeKind::Indices,
            BinaryAttributeDescriptor {
                count: u32::MAX,
                stride: u32::MAX,
                offset: 0,
                data_type: DataType::Int32,
                is_expanded: false,
            },
        );
        assert!(matches!(
            decode_geometry(&[0; 4], &info),
            Err(PackError::Truncated { len: u64::MAX, .. })
        ));
    }

    #[test]
    fn wrong_data_type() {
        let mut info = BinaryInfo::new();
        info.insert(
            AttributeKind::Indices,
            BinaryAttributeDescriptor {
                count: 1,
                stride: 1,
                offset: 0,
                data_type: DataType::Float32,
                is_expanded: false,
            },
        );
        let err = decode_geometry(&[0; 4], &info).unwrap_err();
        assert!(matches!(
            err,
            PackError::UnexpectedDataType {
                attribute: "indices",
                ..
            }
        ));
    }

    #[test]
    fn sub_meshes_decode_to_records() {
        let subs = [SubMeshRecord::from_array([2, 0, 3, 0, 3])];
        let encoded = encode_geometry(&GeometryRecord::default(), &subs).unwrap();
        let decoded = decode_geometry(&encoded.bytes, &encoded.info).unwrap();
        assert_eq!(decoded.sub_meshes, Some(subs.to_vec()));
    }
}
