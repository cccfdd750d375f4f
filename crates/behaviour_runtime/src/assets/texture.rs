//! CPU-side texture data
//!
//! Decoded RGBA8 pixels for sprite drawing. Decoding goes through the `image`
//! crate; PNG is the enabled format.

use std::fmt;
use std::path::Path;

use super::{Asset, AssetError};

/// Decoded RGBA8 image
#[derive(Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Texture {
    /// Load a texture from a file path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path_ref = path.as_ref();

        let img = image::open(path_ref)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to load image {:?}: {}", path_ref, e)))?;
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Loaded texture {}x{} from {:?}", width, height, path_ref);

        Ok(Self {
            width,
            height,
            pixels: rgba_img.into_raw(),
        })
    }

    /// Decode a texture from encoded image bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("Failed to decode image: {}", e)))?;
        let rgba_img = img.to_rgba8();
        let (width, height) = rgba_img.dimensions();

        log::debug!("Decoded texture {}x{} from memory", width, height);

        Ok(Self {
            width,
            height,
            pixels: rgba_img.into_raw(),
        })
    }

    /// Texture filled with one color
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut pixels = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            pixels.extend_from_slice(&color);
        }

        Self { width, height, pixels }
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA8 pixels, row-major
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Pixel data size in bytes
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}

impl Asset for Texture {
    fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        Texture::from_bytes(bytes)
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_color_texture() {
        let texture = Texture::solid_color(4, 2, [255, 0, 0, 255]);
        assert_eq!(texture.width(), 4);
        assert_eq!(texture.height(), 2);
        assert_eq!(texture.size_bytes(), 4 * 2 * 4);
        assert_eq!(&texture.pixels()[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_png_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("red.png");
        image::RgbaImage::from_pixel(3, 5, image::Rgba([200, 10, 10, 255]))
            .save(&path)
            .unwrap();

        let texture = Texture::from_file(&path).unwrap();
        assert_eq!((texture.width(), texture.height()), (3, 5));
        assert_eq!(&texture.pixels()[0..4], &[200, 10, 10, 255]);

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(Texture::from_bytes(&bytes).unwrap(), texture);
    }

    #[test]
    fn test_garbage_bytes_fail_to_decode() {
        assert!(matches!(Texture::from_bytes(b"not an image"), Err(AssetError::LoadFailed(_))));
    }
}
