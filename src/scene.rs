//! Scene model and the mutable state collaborators edit.
//!
//! Renderers never read [`SceneState`] directly. They ask a [`SceneSource`]
//! for an owned [`Scene`] and [`Camera`] snapshot at the start of a pass, so
//! edits made while a frame is in flight cannot tear it.

use glam::DVec3;
use log::debug;
use rand::Rng;
use thiserror::Error;

use crate::camera::Camera;
use crate::light::{unit_direction, Light, LightKind};
use crate::ray::Color;
use crate::sphere::Sphere;

/// Rejected scene edits.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    /// Radius must be finite and strictly positive
    #[error("sphere radius must be positive, got {0}")]
    InvalidRadius(f64),

    /// Reflectivity must lie in [0, 1]
    #[error("reflectivity must be within [0, 1], got {0}")]
    InvalidReflectivity(f64),

    /// Direction vector too short to normalize
    #[error("direction vector has zero length")]
    ZeroDirection,

    /// No sphere at this index
    #[error("no sphere at index {0}")]
    SphereIndex(usize),

    /// No light at this index
    #[error("no light at index {0}")]
    LightIndex(usize),
}

/// Fixed terms of the lighting law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadingParams {
    /// Scale applied to the weighted diffuse sum
    pub diffuse_scale: f64,
    /// Flat ambient fraction of albedo, added unconditionally
    pub ambient: f64,
    /// Multiplier applied once when any enabled light is occluded
    pub shadow_attenuation: f64,
}

impl Default for ShadingParams {
    fn default() -> Self {
        Self {
            diffuse_scale: 0.8,
            ambient: 0.2,
            shadow_attenuation: 0.3,
        }
    }
}

/// Immutable snapshot handed to a renderer for one frame.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    /// Spheres; order has no semantic meaning
    pub spheres: Vec<Sphere>,
    /// Lights in weight order
    pub lights: Vec<Light>,
    /// Lighting law constants
    pub shading: ShadingParams,
}

impl Scene {
    /// The reference eight-sphere scene under its two point lights.
    pub fn reference() -> Self {
        Self {
            spheres: reference_spheres(),
            lights: reference_lights().iter().map(LightControl::to_light).collect(),
            shading: ShadingParams::default(),
        }
    }
}

/// Read side of the scene/camera state, as seen by a renderer.
pub trait SceneSource {
    /// Owned copy of the scene as of this call.
    fn scene_snapshot(&self) -> Scene;
    /// Owned copy of the camera as of this call.
    fn camera_snapshot(&self) -> Camera;
    /// True if anything changed since the last completed render.
    fn is_dirty(&self) -> bool;
    /// Called by the renderer after a completed pass.
    fn clear_dirty(&mut self);
}

/// Editor-facing light state.
///
/// Keeps both a position and a direction so toggling between point and
/// directional mode restores the last value edited in that mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightControl {
    /// Light contributes when set
    pub enabled: bool,
    /// Use `direction` instead of `position`
    pub directional: bool,
    /// Point-mode position
    pub position: DVec3,
    /// Directional-mode direction of travel, unit length
    pub direction: DVec3,
    /// Editor color
    pub color: Color,
    /// Diffuse weight
    pub weight: f64,
}

impl LightControl {
    /// The light this control currently describes.
    pub fn to_light(&self) -> Light {
        let kind = if self.directional {
            LightKind::Directional { direction: self.direction }
        } else {
            LightKind::Point { position: self.position }
        };
        Light {
            enabled: self.enabled,
            kind,
            color: self.color,
            weight: self.weight,
        }
    }
}

/// Mutable scene and camera owned by the editing and input collaborators.
///
/// Every mutation sets the dirty flag; there is no other way to invalidate
/// a cached frame.
#[derive(Debug, Clone)]
pub struct SceneState {
    spheres: Vec<Sphere>,
    lights: Vec<LightControl>,
    shading: ShadingParams,
    camera: Camera,
    dirty: bool,
}

impl Default for SceneState {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneState {
    /// Reference scene, default camera, dirty so the first frame renders.
    pub fn new() -> Self {
        Self {
            spheres: reference_spheres(),
            lights: reference_lights().to_vec(),
            shading: ShadingParams::default(),
            camera: Camera::default(),
            dirty: true,
        }
    }

    /// Current spheres.
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    /// Current light controls.
    pub fn lights(&self) -> &[LightControl] {
        &self.lights
    }

    /// Current camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    fn touch(&mut self) {
        self.dirty = true;
    }

    /// Append a validated sphere and return its index.
    pub fn add_sphere(&mut self, sphere: Sphere) -> Result<usize, SceneError> {
        sphere.validate()?;
        self.spheres.push(sphere);
        self.touch();
        Ok(self.spheres.len() - 1)
    }

    /// Replace the sphere at `index`.
    pub fn update_sphere(&mut self, index: usize, sphere: Sphere) -> Result<(), SceneError> {
        sphere.validate()?;
        let slot = self.spheres.get_mut(index).ok_or(SceneError::SphereIndex(index))?;
        *slot = sphere;
        self.touch();
        Ok(())
    }

    /// Append a copy of the sphere at `index`; returns the copy's index.
    pub fn duplicate_sphere(&mut self, index: usize) -> Result<usize, SceneError> {
        let copy = *self.spheres.get(index).ok_or(SceneError::SphereIndex(index))?;
        self.spheres.push(copy);
        self.touch();
        Ok(self.spheres.len() - 1)
    }

    /// Remove and return the sphere at `index`.
    pub fn remove_sphere(&mut self, index: usize) -> Result<Sphere, SceneError> {
        if index >= self.spheres.len() {
            return Err(SceneError::SphereIndex(index));
        }
        let removed = self.spheres.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Drop every sphere.
    pub fn clear_spheres(&mut self) {
        self.spheres.clear();
        self.touch();
    }

    /// Restore the reference spheres. Lights and camera are left alone.
    pub fn reset(&mut self) {
        self.spheres = reference_spheres();
        self.touch();
    }

    /// Give the sphere at `index` a random placement and material.
    pub fn randomize_sphere<R: Rng + ?Sized>(&mut self, index: usize, rng: &mut R) -> Result<(), SceneError> {
        let slot = self.spheres.get_mut(index).ok_or(SceneError::SphereIndex(index))?;
        *slot = random_sphere(rng);
        debug!("Randomized sphere {index}: {slot:?}");
        self.touch();
        Ok(())
    }

    /// Replace the light control at `index`.
    ///
    /// The direction is normalized; a zero direction is rejected even when
    /// the light is currently in point mode.
    pub fn set_light(&mut self, index: usize, mut control: LightControl) -> Result<(), SceneError> {
        control.direction = unit_direction(control.direction)?;
        let slot = self.lights.get_mut(index).ok_or(SceneError::LightIndex(index))?;
        *slot = control;
        self.touch();
        Ok(())
    }

    /// Switch the light at `index` on or off.
    pub fn set_light_enabled(&mut self, index: usize, enabled: bool) -> Result<(), SceneError> {
        let slot = self.lights.get_mut(index).ok_or(SceneError::LightIndex(index))?;
        slot.enabled = enabled;
        self.touch();
        Ok(())
    }

    /// Switch the light at `index` between point and directional mode.
    pub fn set_light_directional(&mut self, index: usize, directional: bool) -> Result<(), SceneError> {
        let slot = self.lights.get_mut(index).ok_or(SceneError::LightIndex(index))?;
        slot.directional = directional;
        self.touch();
        Ok(())
    }

    /// Replace the lighting law constants.
    pub fn set_shading(&mut self, shading: ShadingParams) {
        self.shading = shading;
        self.touch();
    }

    /// Replace the camera. Clamping is the caller's responsibility.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
        self.touch();
    }
}

impl SceneSource for SceneState {
    fn scene_snapshot(&self) -> Scene {
        Scene {
            spheres: self.spheres.clone(),
            lights: self.lights.iter().map(LightControl::to_light).collect(),
            shading: self.shading,
        }
    }

    fn camera_snapshot(&self) -> Camera {
        self.camera
    }

    fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

/// Random sphere in front of the default camera.
pub fn random_sphere<R: Rng + ?Sized>(rng: &mut R) -> Sphere {
    Sphere {
        center: DVec3::new(
            rng.random::<f64>() * 4.0 - 2.0,
            rng.random::<f64>() * 2.0 - 1.0,
            -1.0 - rng.random::<f64>() * 4.0,
        ),
        radius: 0.2 + rng.random::<f64>() * 1.2,
        albedo: DVec3::new(rng.random(), rng.random(), rng.random()),
        reflectivity: rng.random(),
    }
}

fn reference_spheres() -> Vec<Sphere> {
    let sphere = |center: [f64; 3], radius: f64, albedo: [f64; 3], reflectivity: f64| Sphere {
        center: DVec3::from_array(center),
        radius,
        albedo: DVec3::from_array(albedo),
        reflectivity,
    };
    vec![
        sphere([0.0, 0.0, -1.0], 0.5, [1.0, 0.0, 0.0], 0.5),
        sphere([1.0, 0.0, -2.0], 0.5, [0.0, 1.0, 0.0], 0.2),
        sphere([-1.0, 0.0, -2.0], 0.5, [0.0, 0.0, 1.0], 0.8),
        // Ground
        sphere([0.0, -100.5, -1.0], 100.0, [1.0, 1.0, 0.0], 0.0),
        sphere([2.0, 0.5, -3.0], 0.5, [1.0, 0.0, 1.0], 0.6),
        sphere([-2.0, 0.5, -3.0], 0.5, [0.0, 1.0, 1.0], 0.3),
        sphere([0.0, 1.5, -2.5], 0.3, [1.0, 0.5, 0.0], 0.1),
        sphere([0.0, -0.5, -3.5], 0.7, [0.5, 0.25, 1.0], 0.7),
    ]
}

fn reference_lights() -> [LightControl; 2] {
    [
        LightControl {
            enabled: true,
            directional: false,
            position: DVec3::new(5.0, 5.0, -3.0),
            direction: DVec3::new(0.0, -1.0, -1.0).normalize(),
            color: DVec3::ONE,
            weight: 0.6,
        },
        LightControl {
            enabled: true,
            directional: false,
            position: DVec3::new(-5.0, 6.0, -2.0),
            direction: DVec3::new(0.0, -1.0, 1.0).normalize(),
            color: DVec3::new(0.7, 0.7, 1.0),
            weight: 0.4,
        },
    ]
}
