//! # Crystal
//!
//! **Orbit a model with the mouse, rotate it with quaternions, and turn its
//! polygons into GPU buffers.**
//!
//! - [`Quaternion`] - Unit quaternion rotations with a cached rotation matrix
//! - [`OrbitCamera`] - Trackball spin, vertical slide and cursor-anchored zoom
//! - [`Mesh`] - Polygons and materials, fanned into per-material index buffers
//! - [`GpuMesh`] - Uploads [`MeshBuffers`] through wgpu
//!
//! ## Quick Start
//!
//! ```
//! use crystal::*;
//!
//! let mut mesh = Mesh::cube(2.0);
//! let buffers = mesh.load_buffers::<Vertex>().unwrap();
//! mesh.free_arrays();
//! assert_eq!(mesh.ibo_sizes(), &[36]);
//!
//! let mut orbit = OrbitCamera::from_config(&ViewerConfig::default());
//! orbit.handle_event(InteractionEvent::ButtonDown { button: MouseButton::Left, x: 400.0, y: 300.0 });
//! orbit.handle_event(InteractionEvent::Motion { x: 520.0, y: 300.0 });
//! orbit.collapse();
//!
//! let mvp = orbit.projection_matrix() * orbit.model_matrix();
//! # let _ = (buffers, mvp);
//! ```

mod camera;
pub mod cli;
mod config;
mod face;
mod geometry;
mod gpu;
mod input;
mod material;
mod mesh;
mod orbit_camera;
mod quaternion;
mod trackball;

pub use camera::Camera;
pub use config::ViewerConfig;
pub use face::{Face, FaceFormat, face_normal};
pub use geometry::{GeometryError, SceneData, SubMesh};
pub use gpu::{GpuMesh, GpuPartition};
pub use input::{DepthSampler, InteractionEvent, Key, ScrollDirection, WindowEventTranslator};
pub use material::Material;
pub use mesh::{
    BufferSummary, IndexPartition, MaterialVertex, Mesh, MeshBuffers, MeshError, MeshOptions,
    SkippedFace, Vertex, VertexRecord,
};
pub use orbit_camera::OrbitCamera;
pub use quaternion::{
    AngleUnit, Axis, NORMALIZE_TOLERANCE, Quaternion, Representation, RotationError,
    TRACE_TOLERANCE,
};
pub use trackball::Trackball;

// Re-export glam math types for convenience
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};

// Re-export commonly used winit types for convenience
pub use winit::event::MouseButton;
pub use winit::keyboard::KeyCode;
