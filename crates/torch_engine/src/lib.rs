//! # torch_engine
//!
//! A minimal real-time 3D scene renderer built directly on Vulkan.
//!
//! The engine loads textured OBJ models from disk, positions them in a flat
//! scene list, and renders them each frame with ambient/spotlight Phong
//! lighting, depth testing, and a first-person camera driven by keyboard and
//! mouse input.
//!
//! Subsystems:
//! - [`render`] — the renderer, its Vulkan backend, camera, lighting, models
//! - [`assets`] — image decoding and OBJ/MTL model loading
//! - [`config`] — renderer configuration (window, shader paths, texture dir)
//! - [`foundation`] — math types shared across the engine

/// Foundation utilities (math types)
pub mod foundation;

/// Renderer configuration
pub mod config;

/// Asset loading (images, models)
pub mod assets;

/// Rendering system (renderer, Vulkan backend, scene types)
pub mod render;

pub use config::RendererConfig;
pub use render::{Camera, Model, ModelSpawn, Orientation, Renderer, Window};
