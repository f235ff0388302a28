//! Axis-aligned bounds written next to packed meshes.

use std::collections::HashMap;
use std::hash::BuildHasher;

use glam::Vec3;

/// Axis-aligned bounding box in mesh local space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// The degenerate box at the origin, used when no bounds are known.
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Bounds of a flat `xyz` position array. `None` for fewer than 3 values.
    pub fn from_positions(positions: &[f32]) -> Option<Self> {
        let mut points = positions
            .chunks_exact(3)
            .map(|p| Vec3::new(p[0], p[1], p[2]));
        let first = points.next()?;
        Some(points.fold(Self::new(first, first), |aabb, p| {
            Self::new(aabb.min.min(p), aabb.max.max(p))
        }))
    }

    pub fn min_array(&self) -> [f32; 3] {
        self.min.to_array()
    }

    pub fn max_array(&self) -> [f32; 3] {
        self.max.to_array()
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Live bounds of the meshes in the running scene, looked up by mesh id.
pub trait MeshBoundsSource {
    fn mesh_bounds(&self, mesh_id: &str) -> Option<Aabb>;
}

/// Bounds source for exports run without a live scene.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRuntimeScene;

impl MeshBoundsSource for NoRuntimeScene {
    fn mesh_bounds(&self, _mesh_id: &str) -> Option<Aabb> {
        None
    }
}

impl<S: BuildHasher> MeshBoundsSource for HashMap<String, Aabb, S> {
    fn mesh_bounds(&self, mesh_id: &str) -> Option<Aabb> {
        self.get(mesh_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_of_positions() {
        let aabb = Aabb::from_positions(&[1.0, -2.0, 0.5, -1.0, 4.0, 0.0, 0.0, 0.0, 3.0]).unwrap();
        assert_eq!(aabb.min_array(), [-1.0, -2.0, 0.0]);
        assert_eq!(aabb.max_array(), [1.0, 4.0, 3.0]);
    }

    #[test]
    fn no_positions_no_bounds() {
        assert!(Aabb::from_positions(&[]).is_none());
        assert!(Aabb::from_positions(&[1.0, 2.0]).is_none());
    }

    #[test]
    fn map_lookup() {
        let mut map = HashMap::new();
        map.insert("m0".to_owned(), Aabb::new(Vec3::ONE, Vec3::splat(2.0)));
        assert_eq!(map.mesh_bounds("m0").unwrap().max_array(), [2.0; 3]);
        assert!(map.mesh_bounds("m1").is_none());
        assert!(NoRuntimeScene.mesh_bounds("m0").is_none());
    }
}
