//! Software frame synthesis.
//!
//! One synchronous, single-threaded pass per frame over an owned snapshot.
//! [`SoftwareRenderer`] keeps the last buffer and only recomputes it when the
//! source reports a change or the requested size differs.

use std::time::Instant;

use image::{ImageBuffer, Rgb};
use log::{debug, info};

use crate::camera::Camera;
use crate::ray::Color;
use crate::scene::{Scene, SceneSource};
use crate::tracer::{trace, MAX_DEPTH};

/// Bytes per pixel in rendered buffers (interleaved R, G, B).
pub const CHANNELS: usize = 3;

/// 8-bit value of one linear color channel.
pub fn quantize(channel: f64) -> u8 {
    (255.999 * channel).round().clamp(0.0, 255.0) as u8
}

/// Normalized image coordinate of pixel index `i` along an axis of `n` pixels.
///
/// Single-pixel axes sample the center of the image plane.
pub fn axis_coordinate(i: u32, n: u32) -> f64 {
    if n <= 1 {
        0.5
    } else {
        f64::from(i) / f64::from(n - 1)
    }
}

/// Image-plane `(u, v)` of pixel `(i, j)`. Row 0 is the top of the image.
pub fn pixel_uv(i: u32, j: u32, width: u32, height: u32) -> (f64, f64) {
    let u = axis_coordinate(i, width);
    let v = if height <= 1 {
        0.5
    } else {
        axis_coordinate(height - 1 - j, height)
    };
    (u, v)
}

/// Linear color of pixel `(i, j)`.
pub fn pixel_color(scene: &Scene, camera: &Camera, i: u32, j: u32, width: u32, height: u32, max_depth: u32) -> Color {
    let (u, v) = pixel_uv(i, j, width, height);
    trace(&camera.ray(u, v), scene, max_depth)
}

/// Render into `buffer` (resized to `width * height * 3`), calling `on_row`
/// after every completed row.
pub fn render_rows(
    scene: &Scene,
    camera: &Camera,
    width: u32,
    height: u32,
    max_depth: u32,
    buffer: &mut Vec<u8>,
    mut on_row: impl FnMut(u32),
) {
    buffer.clear();
    buffer.reserve(width as usize * height as usize * CHANNELS);

    let basis = camera.basis();
    for j in 0..height {
        for i in 0..width {
            let (u, v) = pixel_uv(i, j, width, height);
            let color = trace(&camera.ray_with_basis(&basis, u, v), scene, max_depth);
            buffer.extend_from_slice(&[quantize(color.x), quantize(color.y), quantize(color.z)]);
        }
        on_row(j);
    }
}

/// Render a full frame: `width * height * 3` bytes, row-major, top row first.
pub fn render_frame(scene: &Scene, camera: &Camera, width: u32, height: u32, max_depth: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    render_rows(scene, camera, width, height, max_depth, &mut buffer, |_| {});
    buffer
}

/// Render a full frame without quantizing, for linear (EXR) output.
pub fn render_linear(scene: &Scene, camera: &Camera, width: u32, height: u32, max_depth: u32) -> ImageBuffer<Rgb<f32>, Vec<f32>> {
    let basis = camera.basis();
    ImageBuffer::from_fn(width, height, |i, j| {
        let (u, v) = pixel_uv(i, j, width, height);
        let c = trace(&camera.ray_with_basis(&basis, u, v), scene, max_depth);
        Rgb([c.x as f32, c.y as f32, c.z as f32])
    })
}

/// Quantize a linear image into the 8-bit frame layout.
pub fn quantize_image(image: &ImageBuffer<Rgb<f32>, Vec<f32>>) -> Vec<u8> {
    image.iter().map(|&c| quantize(f64::from(c))).collect()
}

/// Dirty-flag cached software renderer.
#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    max_depth: u32,
    pixels: Vec<u8>,
    size: Option<(u32, u32)>,
    passes: u64,
}

impl Default for SoftwareRenderer {
    fn default() -> Self {
        Self::new(MAX_DEPTH)
    }
}

impl SoftwareRenderer {
    /// Empty cache; the first request always renders.
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            pixels: Vec::new(),
            size: None,
            passes: 0,
        }
    }

    /// Bounce budget handed to the tracer.
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Number of full passes run so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Current frame for `source`, re-rendering only if it is stale.
    pub fn render_frame<S: SceneSource + ?Sized>(&mut self, source: &mut S, width: u32, height: u32) -> &[u8] {
        self.render_frame_with_progress(source, width, height, |_| {})
    }

    /// [`SoftwareRenderer::render_frame`] reporting each finished row.
    pub fn render_frame_with_progress<S: SceneSource + ?Sized>(
        &mut self,
        source: &mut S,
        width: u32,
        height: u32,
        on_row: impl FnMut(u32),
    ) -> &[u8] {
        if !source.is_dirty() && self.size == Some((width, height)) {
            debug!("Frame cache hit ({width}x{height})");
            return &self.pixels;
        }

        let scene = source.scene_snapshot();
        let camera = source.camera_snapshot();
        debug!(
            "Rendering {}x{} with {} spheres, {} lights",
            width,
            height,
            scene.spheres.len(),
            scene.lights.len()
        );

        let start = Instant::now();
        render_rows(&scene, &camera, width, height, self.max_depth, &mut self.pixels, on_row);
        self.size = Some((width, height));
        self.passes += 1;
        source.clear_dirty();
        info!("Software frame rendered in {:.2?}", start.elapsed());

        &self.pixels
    }
}
