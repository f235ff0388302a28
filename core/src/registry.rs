//! Table of live engine resources owned by the editor.
//!
//! The editor keeps one [`ResourceRegistry`] per resource kind (meshes,
//! materials, ...) and hands it to the packer as a [`MeshBoundsSource`].
//! Resources are disposed when they are replaced, removed, or when the
//! registry itself is dropped.

use std::collections::{BTreeMap, BTreeSet};

use crate::bounds::{Aabb, MeshBoundsSource};

/// Capabilities the editor needs from an engine object.
pub trait EngineResource {
    /// Serialized form of the resource, as it appears in a scene document.
    fn serialize(&self) -> serde_json::Value;

    /// Names of the textures this resource currently samples.
    fn active_textures(&self) -> Vec<String>;

    /// Release engine-side data. Called exactly once per registered resource.
    fn dispose(&mut self);

    /// Local bounds, for resources that have a spatial extent.
    fn bounding_box(&self) -> Option<Aabb> {
        None
    }
}

/// Entity id to resource table.
pub struct ResourceRegistry<R: EngineResource> {
    entries: BTreeMap<String, R>,
}

impl<R: EngineResource> ResourceRegistry<R> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register `resource` under `id`. A resource already registered under
    /// the same id is disposed.
    pub fn register(&mut self, id: impl Into<String>, resource: R) {
        if let Some(mut previous) = self.entries.insert(id.into(), resource) {
            previous.dispose();
        }
    }

    /// Dispose and remove the resource registered under `id`.
    ///
    /// Returns `false` if nothing was registered.
    pub fn dispose(&mut self, id: &str) -> bool {
        match self.entries.remove(id) {
            Some(mut resource) => {
                resource.dispose();
                true
            }
            None => false,
        }
    }

    /// Dispose and remove every resource.
    pub fn dispose_all(&mut self) {
        let entries = std::mem::take(&mut self.entries);
        for (id, mut resource) in entries {
            log::debug!("Disposing resource '{id}'");
            resource.dispose();
        }
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.entries.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut R> {
        self.entries.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Serialized form of every resource, sorted by id.
    pub fn serialize_all(&self) -> Vec<serde_json::Value> {
        self.entries.values().map(EngineResource::serialize).collect()
    }

    /// Union of the textures referenced by all resources.
    pub fn referenced_textures(&self) -> BTreeSet<String> {
        self.entries
            .values()
            .flat_map(EngineResource::active_textures)
            .collect()
    }
}

impl<R: EngineResource> Default for ResourceRegistry<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: EngineResource> Drop for ResourceRegistry<R> {
    fn drop(&mut self) {
        self.dispose_all();
    }
}

impl<R: EngineResource> MeshBoundsSource for ResourceRegistry<R> {
    fn mesh_bounds(&self, mesh_id: &str) -> Option<Aabb> {
        self.get(mesh_id).and_then(EngineResource::bounding_box)
    }
}
