//! Renderer configuration
//!
//! Configuration for the window, shader bytecode paths, and texture lookup
//! directory. Values come from an optional TOML file; every field has a
//! sensible default so applications can run without one.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Window creation parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 900,
            title: "torchlight".to_string(),
        }
    }
}

/// Shader bytecode locations
///
/// The renderer consumes prebuilt SPIR-V; compiling GLSL is out of scope.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Path to the vertex shader SPIR-V file
    pub vertex_spv: String,
    /// Path to the fragment shader SPIR-V file
    pub fragment_spv: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            vertex_spv: "shaders/vert.spv".to_string(),
            fragment_spv: "shaders/frag.spv".to_string(),
        }
    }
}

/// Top-level renderer configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name reported to the Vulkan driver
    pub app_name: AppName,
    /// Window parameters
    pub window: WindowConfig,
    /// Shader bytecode paths
    pub shaders: ShaderConfig,
    /// Directory searched for texture files referenced by model materials
    pub texture_dir: TextureDir,
}

/// Application name newtype so `#[serde(default)]` can supply one
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct AppName(pub String);

impl Default for AppName {
    fn default() -> Self {
        Self("torchlight".to_string())
    }
}

/// Texture directory newtype with a default of `textures/`
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct TextureDir(pub String);

impl Default for TextureDir {
    fn default() -> Self {
        Self("textures".to_string())
    }
}

impl RendererConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = toml::from_str(&text)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults when the
    /// file does not exist
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::debug!("no config file at {:?}, using defaults", path.as_ref());
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_layout() {
        let config = RendererConfig::default();
        assert_eq!(config.window.width, 1600);
        assert_eq!(config.window.height, 900);
        assert_eq!(config.shaders.vertex_spv, "shaders/vert.spv");
        assert_eq!(config.shaders.fragment_spv, "shaders/frag.spv");
        assert_eq!(config.texture_dir.0, "textures");
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let config: RendererConfig = toml::from_str(
            r#"
            [window]
            width = 800
            height = 600
            "#,
        )
        .expect("valid config");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.window.title, "torchlight");
        assert_eq!(config.shaders.vertex_spv, "shaders/vert.spv");
    }
}
