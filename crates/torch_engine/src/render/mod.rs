//! Rendering system
//!
//! The public surface is [`Renderer`] plus the scene types it consumes:
//! [`Camera`], [`Model`], and the GLFW-backed [`Window`]. The Vulkan backend
//! lives in [`vulkan`] and is re-exported for applications that need raw
//! access.

pub mod camera;
pub mod lighting;
pub mod mesh;
pub mod model;
pub mod renderer;
pub mod vulkan;
pub mod window;

pub use camera::Camera;
pub use lighting::SceneLighting;
pub use mesh::{MeshData, Vertex};
pub use model::{Model, ModelSpawn, Orientation};
pub use renderer::{RenderError, RenderResult, Renderer};
pub use window::Window;
