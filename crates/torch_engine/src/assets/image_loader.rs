//! Image loading utilities for texture data
//!
//! Decodes PNG/JPEG files into tightly-packed RGBA8 buffers for GPU upload.

use crate::assets::AssetError;
use std::path::Path;

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel data, `width * height * 4` bytes
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
}

impl ImageData {
    /// Load and decode an image from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        let img = image::open(path_ref).map_err(|e| {
            AssetError::LoadFailed(format!("failed to load image {:?}: {}", path_ref, e))
        })?;

        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("loaded image {}x{} from {:?}", width, height, path_ref);

        Ok(Self {
            data: rgba_img.into_raw(),
            width,
            height,
        })
    }

    /// Create a solid color image, used for the default fallback texture
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);

        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }

        Self {
            data,
            width,
            height,
        }
    }

    /// Size of the pixel buffer in bytes
    pub fn byte_size(&self) -> u64 {
        self.data.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_color_fills_every_pixel() {
        let img = ImageData::solid_color(2, 3, [255, 0, 128, 255]);
        assert_eq!(img.width, 2);
        assert_eq!(img.height, 3);
        assert_eq!(img.byte_size(), 2 * 3 * 4);
        for pixel in img.data.chunks_exact(4) {
            assert_eq!(pixel, [255, 0, 128, 255]);
        }
    }
}
