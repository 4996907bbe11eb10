use image::GenericImageView;

use crate::errors::{ImportError, Result};

/// Decoded RGBA8 image data attached to a material channel.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub name: String,
    pub width: u32,
    pub height: u32,
    /// Tightly packed RGBA8 pixels, row-major.
    pub pixels: Vec<u8>,
}

impl TextureData {
    /// Decodes an encoded image (PNG, JPEG) into RGBA8.
    pub fn decode(name: &str, bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| ImportError::format(format!("failed to decode image '{name}': {e}")))?;
        let (width, height) = img.dimensions();
        Ok(Self {
            name: name.to_string(),
            width,
            height,
            pixels: img.into_rgba8().into_raw(),
        })
    }
}
