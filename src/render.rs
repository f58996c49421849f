//! The renderer boundary.
//!
//! The scene core hands the whole registry plus the camera to a [`Renderer`]
//! once per tick. Upload and disposal of GPU resources are entirely the
//! renderer's business; [`crate::context::GpuRenderer`] is the wgpu one.

use std::{collections::HashMap, sync::Arc};

use crate::{
    camera::Camera,
    data_structures::{
        geometry::Geometry, instance::InstanceRaw, material::MatcapMaterial,
        scene_graph::SceneRegistry,
    },
    error::Result,
};

pub trait Renderer {
    /// Draw one frame of `scene` as seen by `camera`.
    fn render(&mut self, scene: &SceneRegistry, camera: &Camera) -> Result<()>;

    /// The output surface changed size (physical pixels).
    fn resize(&mut self, width: u32, height: u32);
}

/// One instanced draw: every node sharing a geometry and a material.
pub struct Batch<'a> {
    pub geometry: &'a Arc<Geometry>,
    pub material: &'a Arc<MatcapMaterial>,
    pub instances: Vec<InstanceRaw>,
}

/// Group the registry into instanced draws, in first-seen order.
///
/// Nodes whose geometry has no triangles are left out; GPU buffers cannot be
/// empty.
pub fn collect_batches(scene: &SceneRegistry) -> Vec<Batch<'_>> {
    let mut index: HashMap<(usize, usize), usize> = HashMap::new();
    let mut batches: Vec<Batch<'_>> = Vec::new();
    for node in scene.iter().filter(|node| !node.geometry.is_empty()) {
        let key = (
            Arc::as_ptr(&node.geometry) as usize,
            Arc::as_ptr(&node.material) as usize,
        );
        let slot = *index.entry(key).or_insert_with(|| {
            batches.push(Batch {
                geometry: &node.geometry,
                material: &node.material,
                instances: Vec::new(),
            });
            batches.len() - 1
        });
        batches[slot].instances.push(node.transform.to_raw());
    }
    batches
}
