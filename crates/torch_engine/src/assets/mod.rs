//! Asset loading
//!
//! Decodes images into raw pixel buffers and OBJ/MTL files into mesh data
//! ready for GPU upload. The renderer consumes the decoded forms only; file
//! format details stay inside this module.

pub mod image_loader;
pub mod model_loader;

pub use image_loader::ImageData;
pub use model_loader::{LoadedModel, MeshData};

use thiserror::Error;

/// Asset loading errors
#[derive(Error, Debug)]
pub enum AssetError {
    /// File could not be read or decoded
    #[error("asset load failed: {0}")]
    LoadFailed(String),

    /// File contents are structurally invalid
    #[error("invalid asset data: {0}")]
    InvalidData(String),
}
