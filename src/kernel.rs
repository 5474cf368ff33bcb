//! # Fragment kernel
//!
//! The data-parallel execution backend: a per-pixel color function evaluated
//! in single precision with the iterative form of the tracer. It is the CPU
//! transcription of `shaders/compute/raytracing.glsl`, and both read the
//! scene from the same packed, std430-compatible structs defined here.
//!
//! ```text
//! Scene + Camera snapshot → GpuSphere[N] / GpuLight[M] / GpuRenderParams
//!                              ↓                          ↓
//!                  FragmentKernel::shade (rayon)   raytracing.glsl (Vulkan)
//! ```
//!
//! Unlike the software renderer there is no dirty flag: every call evaluates
//! every pixel. Output must agree with the software path to within float
//! precision for the same snapshot.

use bytemuck::{Pod, Zeroable};
use glam::Vec3A;
use image::{ImageBuffer, Rgb};
use rayon::prelude::*;

use crate::camera::{Camera, ASPECT};
use crate::light::LightKind;
use crate::render::{pixel_uv, quantize_image, CHANNELS};
use crate::scene::Scene;

const EPSILON: f32 = 1e-3;
const SKY_WHITE: Vec3A = Vec3A::new(1.0, 1.0, 1.0);
const SKY_BLUE: Vec3A = Vec3A::new(0.5, 0.7, 1.0);

/// GPU-compatible sphere. 32 bytes, 16-byte aligned fields.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuSphere {
    /// Center (xyz) and radius (w)
    pub center_radius: [f32; 4],
    /// Albedo (rgb) and reflectivity (a)
    pub albedo_reflectivity: [f32; 4],
}

/// GPU-compatible light. Only enabled lights are packed.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// Position (w = 1) or direction of travel (w = 0)
    pub vector: [f32; 4],
    /// Diffuse weight in x; yzw unused
    pub weight: [f32; 4],
}

/// Per-frame parameters, laid out for a std430 storage buffer.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuRenderParams {
    /// Output width in pixels
    pub image_width: u32,
    /// Output height in pixels
    pub image_height: u32,
    /// Bounce budget
    pub max_depth: u32,
    /// Entries used in the sphere buffer
    pub sphere_count: u32,
    /// Entries used in the light buffer
    pub light_count: u32,
    /// Padding to 16 bytes
    pub padding: [u32; 3],
    /// Camera position (xyz)
    pub camera_position: [f32; 4],
    /// Camera right vector (xyz)
    pub camera_right: [f32; 4],
    /// Camera up vector (xyz)
    pub camera_up: [f32; 4],
    /// Camera forward vector (xyz)
    pub camera_forward: [f32; 4],
    /// tan(fov / 2), aspect, diffuse scale, ambient
    pub projection_shading: [f32; 4],
    /// Shadow attenuation, surface epsilon, unused, unused
    pub shadow: [f32; 4],
}

fn pack3(v: glam::DVec3, w: f32) -> [f32; 4] {
    [v.x as f32, v.y as f32, v.z as f32, w]
}

fn unpack3(v: &[f32; 4]) -> Vec3A {
    Vec3A::new(v[0], v[1], v[2])
}

struct FragmentHit {
    point: Vec3A,
    normal: Vec3A,
    albedo: Vec3A,
    reflectivity: f32,
}

/// Packed snapshot plus the CPU evaluation of the per-fragment function.
#[derive(Debug, Clone)]
pub struct FragmentKernel {
    params: GpuRenderParams,
    spheres: Vec<GpuSphere>,
    lights: Vec<GpuLight>,
}

impl FragmentKernel {
    /// Pack a scene and camera snapshot for a `width` x `height` frame.
    pub fn new(scene: &Scene, camera: &Camera, width: u32, height: u32, max_depth: u32) -> Self {
        let spheres: Vec<GpuSphere> = scene
            .spheres
            .iter()
            .map(|s| GpuSphere {
                center_radius: pack3(s.center, s.radius as f32),
                albedo_reflectivity: pack3(s.albedo, s.reflectivity as f32),
            })
            .collect();

        let lights: Vec<GpuLight> = scene
            .lights
            .iter()
            .filter(|l| l.enabled)
            .map(|l| {
                let vector = match l.kind {
                    LightKind::Point { position } => pack3(position, 1.0),
                    LightKind::Directional { direction } => pack3(direction, 0.0),
                };
                GpuLight {
                    vector,
                    weight: [l.weight as f32, 0.0, 0.0, 0.0],
                }
            })
            .collect();

        let basis = camera.basis();
        let scale = (camera.fov.to_radians() / 2.0).tan();
        let shading = &scene.shading;
        let params = GpuRenderParams {
            image_width: width,
            image_height: height,
            max_depth,
            sphere_count: spheres.len() as u32,
            light_count: lights.len() as u32,
            padding: [0; 3],
            camera_position: pack3(camera.position, 0.0),
            camera_right: pack3(basis.right, 0.0),
            camera_up: pack3(basis.up, 0.0),
            camera_forward: pack3(basis.forward, 0.0),
            projection_shading: [
                scale as f32,
                ASPECT as f32,
                shading.diffuse_scale as f32,
                shading.ambient as f32,
            ],
            shadow: [shading.shadow_attenuation as f32, EPSILON, 0.0, 0.0],
        };

        Self { params, spheres, lights }
    }

    /// Frame parameters as uploaded to the device.
    pub fn params(&self) -> &GpuRenderParams {
        &self.params
    }

    /// Packed spheres as uploaded to the device.
    pub fn spheres(&self) -> &[GpuSphere] {
        &self.spheres
    }

    /// Packed enabled lights as uploaded to the device.
    pub fn lights(&self) -> &[GpuLight] {
        &self.lights
    }

    /// Linear color at image-plane coordinates `(u, v)`.
    pub fn shade(&self, u: f32, v: f32) -> Vec3A {
        let [scale, aspect, ..] = self.params.projection_shading;
        let x = (2.0 * u - 1.0) * aspect * scale;
        let y = (v - 0.5) * scale;

        let right = unpack3(&self.params.camera_right);
        let up = unpack3(&self.params.camera_up);
        let forward = unpack3(&self.params.camera_forward);
        let direction = (right * x + up * y + forward).normalize();

        self.trace(unpack3(&self.params.camera_position), direction)
    }

    /// Linear color of pixel `(i, j)`, row 0 at the top.
    pub fn shade_pixel(&self, i: u32, j: u32) -> Vec3A {
        let (u, v) = pixel_uv(i, j, self.params.image_width, self.params.image_height);
        self.shade(u as f32, v as f32)
    }

    /// Evaluate every pixel in parallel into a linear f32 image.
    pub fn render_linear(&self) -> ImageBuffer<Rgb<f32>, Vec<f32>> {
        let mut image: ImageBuffer<Rgb<f32>, Vec<f32>> =
            ImageBuffer::new(self.params.image_width, self.params.image_height);

        image.enumerate_pixels_mut().par_bridge().for_each(|(i, j, pixel)| {
            let c = self.shade_pixel(i, j);
            *pixel = Rgb([c.x, c.y, c.z]);
        });

        image
    }

    /// Evaluate every pixel into the same 8-bit layout the software path produces.
    pub fn render(&self) -> Vec<u8> {
        quantize_image(&self.render_linear())
    }

    fn nearest_hit(&self, origin: Vec3A, direction: Vec3A, t_min: f32, t_max: f32) -> Option<FragmentHit> {
        let mut closest = t_max;
        let mut found: Option<&GpuSphere> = None;

        for sphere in &self.spheres {
            if let Some(t) = hit_sphere(sphere, origin, direction, t_min, closest) {
                closest = t;
                found = Some(sphere);
            }
        }

        found.map(|s| {
            let point = origin + closest * direction;
            let center = unpack3(&s.center_radius);
            FragmentHit {
                point,
                normal: (point - center) / s.center_radius[3],
                albedo: unpack3(&s.albedo_reflectivity),
                reflectivity: s.albedo_reflectivity[3],
            }
        })
    }

    fn occluded(&self, origin: Vec3A, direction: Vec3A, t_max: f32) -> bool {
        self.spheres
            .iter()
            .any(|s| hit_sphere(s, origin, direction, EPSILON, t_max).is_some())
    }

    fn shade_hit(&self, hit: &FragmentHit) -> Vec3A {
        let [_, _, diffuse_scale, ambient] = self.params.projection_shading;
        let origin = hit.point + hit.normal * EPSILON;
        let mut diffuse = 0.0;
        let mut shadowed = false;

        for light in &self.lights {
            let (to_light, distance) = if light.vector[3] > 0.5 {
                let delta = unpack3(&light.vector) - hit.point;
                let distance = delta.length();
                (delta / distance, distance)
            } else {
                (-unpack3(&light.vector), f32::INFINITY)
            };
            diffuse += light.weight[0] * hit.normal.dot(to_light).max(0.0);
            if !shadowed {
                shadowed = self.occluded(origin, to_light, distance);
            }
        }

        let base = hit.albedo * diffuse * diffuse_scale + hit.albedo * ambient;
        if shadowed {
            base * self.params.shadow[0]
        } else {
            base
        }
    }

    fn trace(&self, mut origin: Vec3A, mut direction: Vec3A) -> Vec3A {
        let mut color = Vec3A::ZERO;
        let mut energy = 1.0f32;

        for _ in 0..self.params.max_depth {
            let Some(hit) = self.nearest_hit(origin, direction, EPSILON, f32::INFINITY) else {
                let a = 0.5 * (direction.y + 1.0);
                color += energy * ((1.0 - a) * SKY_WHITE + a * SKY_BLUE);
                break;
            };

            color += energy * (1.0 - hit.reflectivity) * self.shade_hit(&hit);
            energy *= hit.reflectivity;
            if energy <= 0.0 {
                break;
            }

            origin = hit.point + hit.normal * EPSILON;
            direction = direction - 2.0 * direction.dot(hit.normal) * hit.normal;
        }

        color
    }
}

fn hit_sphere(sphere: &GpuSphere, origin: Vec3A, direction: Vec3A, t_min: f32, t_max: f32) -> Option<f32> {
    let radius = sphere.center_radius[3];
    let oc = origin - unpack3(&sphere.center_radius);
    let a = direction.dot(direction);
    let b = 2.0 * oc.dot(direction);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - 4.0 * a * c;
    if disc <= 0.0 {
        return None;
    }

    let sqrtd = disc.sqrt();
    let t0 = (-b - sqrtd) / (2.0 * a);
    if t_min < t0 && t0 < t_max {
        return Some(t0);
    }
    let t1 = (-b + sqrtd) / (2.0 * a);
    (t_min < t1 && t1 < t_max).then_some(t1)
}

/// Per-channel disagreement between two 8-bit RGB buffers of equal size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Divergence {
    /// Largest absolute channel difference
    pub max_delta: u8,
    /// Pixels with any channel differing by more than the tolerance
    pub pixels_over: usize,
}

/// Compare two buffers channel by channel.
///
/// `None` if the buffers differ in length.
pub fn divergence(a: &[u8], b: &[u8], tolerance: u8) -> Option<Divergence> {
    if a.len() != b.len() {
        return None;
    }
    let mut out = Divergence::default();
    for (pa, pb) in a.chunks_exact(CHANNELS).zip(b.chunks_exact(CHANNELS)) {
        let delta = pa.iter().zip(pb).map(|(x, y)| x.abs_diff(*y)).max().unwrap_or(0);
        out.max_delta = out.max_delta.max(delta);
        if delta > tolerance {
            out.pixels_over += 1;
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::render::pixel_color;
    use crate::tracer::MAX_DEPTH;

    fn facing_camera() -> Camera {
        Camera { yaw: std::f64::consts::PI, ..Camera::default() }
    }

    #[test]
    fn packed_layout_sizes() {
        assert_eq!(std::mem::size_of::<GpuSphere>(), 32);
        assert_eq!(std::mem::size_of::<GpuLight>(), 32);
        assert_eq!(std::mem::size_of::<GpuRenderParams>(), 32 + 6 * 16);
    }

    #[test]
    fn disabled_lights_are_not_packed() {
        let mut scene = Scene::reference();
        scene.lights[1].enabled = false;
        let kernel = FragmentKernel::new(&scene, &facing_camera(), 8, 4, MAX_DEPTH);
        assert_eq!(kernel.lights().len(), 1);
        assert_eq!(kernel.params().light_count, 1);
        assert_eq!(kernel.params().sphere_count, 8);
        assert_eq!(kernel.lights()[0].vector, [5.0, 5.0, -3.0, 1.0]);
    }

    #[test]
    fn zero_depth_is_black() {
        let kernel = FragmentKernel::new(&Scene::reference(), &facing_camera(), 8, 4, 0);
        assert_eq!(kernel.shade(0.5, 0.5), Vec3A::ZERO);
    }

    #[test]
    fn empty_scene_shows_sky() {
        let kernel = FragmentKernel::new(&Scene::default(), &Camera::default(), 8, 4, MAX_DEPTH);
        let c = kernel.shade(0.5, 0.5);
        let expected = 0.5 * (SKY_WHITE + SKY_BLUE);
        assert!((c - expected).length() < 1e-6);
    }

    #[test]
    fn matches_software_tracer_per_pixel() {
        let scene = Scene::reference();
        let camera = facing_camera();
        let (w, h) = (40, 20);
        let kernel = FragmentKernel::new(&scene, &camera, w, h, MAX_DEPTH);
        for j in (0..h).step_by(3) {
            for i in (0..w).step_by(3) {
                let sw = pixel_color(&scene, &camera, i, j, w, h, MAX_DEPTH);
                let fr = kernel.shade_pixel(i, j);
                let fr = DVec3::new(fr.x.into(), fr.y.into(), fr.z.into());
                assert!((sw - fr).abs().max_element() < 1e-3, "pixel ({i}, {j}): {sw} vs {fr}");
            }
        }
    }

    #[test]
    fn divergence_counts_pixels_over_tolerance() {
        let a = [10, 10, 10, 200, 200, 200];
        let b = [12, 10, 10, 200, 180, 200];
        assert_eq!(divergence(&a, &b, 2), Some(Divergence { max_delta: 20, pixels_over: 1 }));
        assert_eq!(divergence(&a, &a, 0), Some(Divergence::default()));
    }

    #[test]
    fn divergence_of_mismatched_buffers_is_none() {
        assert_eq!(divergence(&[0; 6], &[0; 3], 0), None);
    }
}
