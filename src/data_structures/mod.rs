//! Engine data structures: geometry, materials, textures, scene registry, and instances.
//!
//! - `geometry` holds CPU triangle meshes (torus builder, centering, bounds)
//! - `instance` holds per-instance transformation data and its GPU packing
//! - `material` is the shared matcap material with its late-bound texture
//! - `scene_graph` is the append-only registry of tagged scene nodes
//! - `texture` holds decoded matcaps and GPU texture wrappers

pub mod geometry;
pub mod instance;
pub mod material;
pub mod scene_graph;
pub mod texture;
