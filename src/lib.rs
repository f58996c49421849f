//! matcap-flow
//!
//! A procedurally populated matcap scene for native and WASM targets: one
//! extruded text mesh surrounded by a field of randomly placed tori that
//! share a single geometry and material. Assets load asynchronously and the
//! per-frame loop only starts once the font is in.
//!
//! High-level modules
//! - `config`: TOML scene configuration with defaults for every knob
//! - `resources`: asset loading, typeface parsing and text extrusion
//! - `generate`: random sources and the instance generator
//! - `data_structures`: geometry, instances, materials and the scene registry
//! - `schedule`: load gate and frame scheduler
//! - `session`: the per-scene context object tying everything together
//! - `camera`: perspective camera, orbit controller and uniforms
//! - `debug`: labeled fields for an external inspector
//! - `render` / `context` / `pipelines`: the renderer boundary and its wgpu side
//! - `flow`: the winit event loop host
//!

pub mod camera;
pub mod config;
pub mod context;
pub mod data_structures;
pub mod debug;
pub mod error;
pub mod flow;
pub mod generate;
pub mod pipelines;
pub mod render;
pub mod resources;
pub mod schedule;
pub mod session;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use config::SceneConfig;
pub use error::{Result, SceneError};
pub use flow::{run, run_frames};
pub use session::SceneSession;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
