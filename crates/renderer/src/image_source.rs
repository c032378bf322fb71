//! Decodes still images into the premultiplied BGRA layout the surface
//! backend uploads directly.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::DecodeError;

/// Memory layout of a [`PixelBuffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8 bits per channel, B-G-R-A byte order, colour pre-scaled by alpha.
    Bgra8Premultiplied,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Bgra8Premultiplied => 4,
        }
    }
}

/// Tightly packed, row-major pixels with explicit dimensions.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Wraps already premultiplied BGRA bytes. Returns `None` when the byte
    /// count does not match the dimensions.
    pub fn from_bgra_premultiplied(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        let format = PixelFormat::Bgra8Premultiplied;
        let expected = width as usize * height as usize * format.bytes_per_pixel() as usize;
        (data.len() == expected).then_some(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Converts straight-alpha RGBA bytes, premultiplying and swizzling in place.
    pub fn from_rgba_straight(width: u32, height: u32, mut data: Vec<u8>) -> Option<Self> {
        premultiply_to_bgra_in_place(&mut data);
        Self::from_bgra_premultiplied(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row.
    pub fn stride(&self) -> u32 {
        self.width * self.format.bytes_per_pixel()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Stateless decoder bound to one asset path.
///
/// The same source is asked to decode again whenever the surface is rebuilt,
/// so a replaced file on disk is picked up by the next recovery.
#[derive(Debug, Clone)]
pub struct ImageSource {
    path: PathBuf,
}

impl ImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn decode(&self) -> Result<PixelBuffer, DecodeError> {
        decode(&self.path)
    }
}

/// Reads and decodes `path`. No partial buffer is ever returned.
pub fn decode(path: &Path) -> Result<PixelBuffer, DecodeError> {
    let bytes = fs::read(path).map_err(|source| DecodeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|source| DecodeError::Codec {
        path: path.to_path_buf(),
        source,
    })?;

    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::Empty {
            path: path.to_path_buf(),
            width,
            height,
        });
    }

    let buffer = PixelBuffer::from_rgba_straight(width, height, rgba.into_raw())
        .ok_or_else(|| DecodeError::Empty {
            path: path.to_path_buf(),
            width,
            height,
        })?;
    tracing::debug!(path = %path.display(), width, height, "decoded image");
    Ok(buffer)
}

fn premultiply_to_bgra_in_place(pixels: &mut [u8]) {
    for px in pixels.chunks_exact_mut(4) {
        let a = px[3] as u16;
        let (r, g, b) = (px[0] as u16, px[1] as u16, px[2] as u16);
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((b * a + 127) / 255) as u8;
        px[1] = ((g * a + 127) / 255) as u8;
        px[2] = ((r * a + 127) / 255) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    #[test]
    fn decodes_png_into_premultiplied_bgra() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sprite.png");
        let mut img = RgbaImage::from_pixel(3, 2, Rgba([200, 100, 50, 255]));
        img.put_pixel(1, 0, Rgba([255, 0, 0, 128]));
        img.put_pixel(2, 1, Rgba([10, 20, 30, 0]));
        img.save(&path).unwrap();

        let buffer = ImageSource::new(&path).decode().unwrap();
        assert_eq!(buffer.dimensions(), (3, 2));
        assert_eq!(buffer.format(), PixelFormat::Bgra8Premultiplied);
        assert_eq!(buffer.stride(), 12);
        assert_eq!(buffer.as_bytes().len(), 24);

        let bytes = buffer.as_bytes();
        assert_eq!(&bytes[0..4], &[50, 100, 200, 255]);
        assert_eq!(&bytes[4..8], &[0, 0, 128, 128]);
        assert_eq!(&bytes[20..24], &[0, 0, 0, 0]);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.png");
        let err = decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Io { .. }));
        assert!(err.to_string().contains("absent.png"));
    }

    #[test]
    fn corrupt_file_reports_codec_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\nthis is not a png").unwrap();
        let err = decode(&path).unwrap_err();
        assert!(matches!(err, DecodeError::Codec { .. }));
    }

    #[test]
    fn buffer_rejects_mismatched_length() {
        assert!(PixelBuffer::from_bgra_premultiplied(2, 2, vec![0; 15]).is_none());
        assert!(PixelBuffer::from_bgra_premultiplied(2, 2, vec![0; 16]).is_some());
    }
}
