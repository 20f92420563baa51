//! modelport
//!
//! A single-asset 3D viewport for native and WASM targets. One model at a
//! time is loaded asynchronously from glTF (.gltf/.glb) or Wavefront OBJ
//! files, framed automatically so it fills the view, and presented over a
//! ground grid with orbit camera controls. The crate exposes a small surface
//! for embedding the viewport in native applications or the web.
//!
//! High-level modules
//! - `camera`: orbit camera, controller and uniforms for view/projection
//! - `context`: central GPU and window context that owns device/queue/pipelines
//! - `data_structures`: viewer data models (node graphs, meshes, textures)
//! - `fit`: bounding-volume measurement and camera auto-framing
//! - `pipelines`: definitions for the model and grid render pipelines
//! - `resources`: format detection and asynchronous model loading
//! - `scene`: persistent fixtures and the single mutable model slot
//! - `session`: viewport lifecycle, load tracking and the event loop
//! - `viewport`: resize handling for the drawable surface
//!

pub mod camera;
pub mod context;
pub mod data_structures;
pub mod fit;
pub mod pipelines;
pub mod resources;
pub mod scene;
pub mod session;
pub mod viewport;

pub use resources::{AssetFormat, FileHandle, LoadError, MemoryHandle, TransientBytes};
#[cfg(not(target_arch = "wasm32"))]
pub use resources::PathHandle;
pub use session::{run, LoadStatus, StatusObserver, Viewer, ViewerHandle, ViewportSession};
#[cfg(not(target_arch = "wasm32"))]
pub use session::run_with_model;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath::*;
pub use winit::event::DeviceEvent;
pub use winit::event::WindowEvent;
