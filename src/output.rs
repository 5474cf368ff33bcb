//! # Output
//!
//! Writes finished frames to disk. The format follows the file extension:
//!
//! - `.png`: the 8-bit frame exactly as rendered (no gamma step; the
//!   quantizer already produced display values)
//! - `.exr`: linear f32 RGB, one channel per color, no tone mapping

use std::path::{Path, PathBuf};

use exr::prelude::write_rgb_file;
use image::{ImageBuffer, Rgb, RgbImage};
use log::info;
use thiserror::Error;

use crate::render::CHANNELS;

/// Failures while writing a frame.
#[derive(Error, Debug)]
pub enum OutputError {
    /// Extension is neither `.png` nor `.exr`
    #[error("unsupported output extension for {0} (expected .png or .exr)")]
    UnsupportedExtension(PathBuf),

    /// Byte buffer does not match the stated size
    #[error("frame holds {actual} bytes, expected {expected} for {width}x{height}")]
    FrameSize {
        /// Frame width
        width: u32,
        /// Frame height
        height: u32,
        /// `width * height * 3`
        expected: usize,
        /// Bytes supplied
        actual: usize,
    },

    /// PNG encoding or I/O failure
    #[error("failed to write PNG: {0}")]
    Png(#[from] image::ImageError),

    /// EXR encoding or I/O failure
    #[error("failed to write EXR: {0}")]
    Exr(#[from] exr::error::Error),
}

/// File format chosen from an output path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// 8-bit RGB
    Png,
    /// Linear f32 RGB
    Exr,
}

impl OutputFormat {
    /// Format for `path`, by case-insensitive extension.
    pub fn from_path(path: &Path) -> Result<Self, OutputError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => Ok(Self::Png),
            "exr" => Ok(Self::Exr),
            _ => Err(OutputError::UnsupportedExtension(path.to_path_buf())),
        }
    }
}

/// Save an 8-bit RGB frame (`width * height * 3` bytes, top row first) as PNG.
pub fn save_png(frame: &[u8], width: u32, height: u32, path: &Path) -> Result<(), OutputError> {
    let expected = width as usize * height as usize * CHANNELS;
    let image: RgbImage = ImageBuffer::from_raw(width, height, frame.to_vec()).ok_or(OutputError::FrameSize {
        width,
        height,
        expected,
        actual: frame.len(),
    })?;
    image.save(path)?;
    info!("Image saved as {}", path.display());
    Ok(())
}

/// Save a linear f32 RGB image as EXR.
pub fn save_exr(image: &ImageBuffer<Rgb<f32>, Vec<f32>>, path: &Path) -> Result<(), OutputError> {
    write_rgb_file(path, image.width() as usize, image.height() as usize, |x, y| {
        let p = image.get_pixel(x as u32, y as u32);
        (p[0], p[1], p[2])
    })?;
    info!("Linear image saved as EXR: {}", path.display());
    Ok(())
}
