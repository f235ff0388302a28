//! Descriptors locating attribute bytes inside a sidecar.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_repr::{Deserialize_repr, Serialize_repr};

use crate::attribute::AttributeKind;

/// Element encoding of an attribute, serialized as `0` / `1`.
#[derive(Serialize_repr, Deserialize_repr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DataType {
    Int32 = 0,
    Float32 = 1,
}

impl DataType {
    pub const BYTES_PER_ELEMENT: u64 = 4;
}

/// Where one attribute lives in a sidecar.
///
/// `count` elements of `stride` components each, starting at byte `offset`.
/// The attribute occupies `count * stride * 4` bytes. Descriptors read from
/// a document are untrusted, so the byte range is computed with checked
/// arithmetic.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BinaryAttributeDescriptor {
    pub count: u32,
    pub stride: u32,
    pub offset: u64,
    pub data_type: DataType,
    /// Bone indices stored one int32 per component instead of packed quads.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_expanded: bool,
}

impl BinaryAttributeDescriptor {
    /// Number of scalar values described.
    pub fn value_count(&self) -> u64 {
        u64::from(self.count) * u64::from(self.stride)
    }

    /// Size of the attribute in bytes, `None` if it does not fit in a `u64`.
    pub fn byte_len(&self) -> Option<u64> {
        self.value_count().checked_mul(DataType::BYTES_PER_ELEMENT)
    }

    /// First byte past the attribute, `None` on overflow.
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(self.byte_len()?)
    }
}

/// The `_binaryInfo` table of a packed mesh.
///
/// Serializes as a JSON object keyed by descriptor name
/// (`positionsAttrDesc`, ...). Entries are kept in sidecar order; unknown keys
/// are ignored when reading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinaryInfo {
    entries: Vec<(AttributeKind, BinaryAttributeDescriptor)>,
}

impl BinaryInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the descriptor for `kind`, keeping sidecar order.
    pub fn insert(&mut self, kind: AttributeKind, descriptor: BinaryAttributeDescriptor) {
        match self.entries.binary_search_by_key(&kind, |(k, _)| *k) {
            Ok(pos) => self.entries[pos].1 = descriptor,
            Err(pos) => self.entries.insert(pos, (kind, descriptor)),
        }
    }

    pub fn get(&self, kind: AttributeKind) -> Option<&BinaryAttributeDescriptor> {
        self.entries
            .binary_search_by_key(&kind, |(k, _)| *k)
            .ok()
            .map(|pos| &self.entries[pos].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (AttributeKind, &BinaryAttributeDescriptor)> {
        self.entries.iter().map(|(kind, desc)| (*kind, desc))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total bytes covered, i.e. the end of the furthest attribute.
    ///
    /// `None` if any descriptor's range overflows.
    pub fn byte_len(&self) -> Option<u64> {
        self.entries
            .iter()
            .map(|(_, desc)| desc.end())
            .try_fold(0, |furthest, end| Some(furthest.max(end?)))
    }
}

impl Serialize for BinaryInfo {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (kind, desc) in &self.entries {
            map.serialize_entry(kind.descriptor_key(), desc)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for BinaryInfo {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BinaryInfoVisitor;

        impl<'de> Visitor<'de> for BinaryInfoVisitor {
            type Value = BinaryInfo;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of attribute descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<BinaryInfo, A::Error> {
                let mut info = BinaryInfo::new();
                while let Some(key) = access.next_key::<String>()? {
                    match AttributeKind::from_descriptor_key(&key) {
                        Some(kind) => {
                            let desc = access.next_value::<BinaryAttributeDescriptor>()?;
                            info.insert(kind, desc);
                        }
                        None => {
                            access.next_value::<serde::de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(info)
            }
        }

        deserializer.deserialize_map(BinaryInfoVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn desc(count: u32, stride: u32, offset: u64, data_type: DataType) -> BinaryAttributeDescriptor {
        BinaryAttributeDescriptor {
            count,
            stride,
            offset,
            data_type,
            is_expanded: false,
        }
    }

    #[test]
    fn descriptor_json_shape() {
        let value = serde_json::to_value(desc(2, 5, 48, DataType::Int32)).unwrap();
        assert_eq!(
            value,
            json!({ "count": 2, "stride": 5, "offset": 48, "dataType": 0 })
        );
    }

    #[test]
    fn expanded_flag_serialized_only_when_set() {
        let mut d = desc(1, 4, 0, DataType::Int32);
        d.is_expanded = true;
        let value = serde_json::to_value(d).unwrap();
        assert_eq!(value["isExpanded"], json!(true));
    }

    #[test]
    fn byte_range() {
        let d = desc(4, 3, 16, DataType::Float32);
        assert_eq!(d.byte_len(), Some(48));
        assert_eq!(d.end(), Some(64));
    }

    #[test]
    fn byte_range_overflow() {
        let d = desc(1, 3, u64::MAX - 4, DataType::Float32);
        assert_eq!(d.byte_len(), Some(12));
        assert_eq!(d.end(), None);

        let d = desc(u32::MAX, u32::MAX, 0, DataType::Float32);
        assert_eq!(d.byte_len(), None);
    }

    #[test]
    fn insert_keeps_sidecar_order() {
        let mut info = BinaryInfo::new();
        info.insert(AttributeKind::Indices, desc(3, 1, 36, DataType::Int32));
        info.insert(AttributeKind::Positions, desc(3, 3, 0, DataType::Float32));
        let kinds: Vec<_> = info.iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![AttributeKind::Positions, AttributeKind::Indices]);
        assert_eq!(info.byte_len(), Some(48));
    }

    #[test]
    fn deserialize_ignores_unknown_keys() {
        let value = json!({
            "positionsAttrDesc": { "count": 1, "stride": 3, "offset": 0, "dataType": 1 },
            "uvs3AttrDesc": { "count": 1, "stride": 2, "offset": 12, "dataType": 1 },
        });
        let info: BinaryInfo = serde_json::from_value(value).unwrap();
        assert_eq!(info.len(), 1);
        assert_eq!(info.get(AttributeKind::Positions).unwrap().stride, 3);
    }

    #[test]
    fn serialize_uses_descriptor_keys() {
        let mut info = BinaryInfo::new();
        info.insert(AttributeKind::Tangents, desc(1, 4, 0, DataType::Float32));
        let value = serde_json::to_value(&info).unwrap();
        assert!(value.get("tangetsAttrDesc").is_some());
    }
}
