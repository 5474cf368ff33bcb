//! Yaw/pitch camera and primary ray generation.
//!
//! The image plane has a fixed 2:1 aspect and a vertical extent of half the
//! horizontal one per unit of `scale`; both backends frame the scene this way
//! and it is reproduced as-is.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::ray::Ray;

/// Horizontal stretch of the image plane.
pub const ASPECT: f64 = 2.0;

/// Largest pitch magnitude input handlers should allow (just under 90°).
pub const PITCH_LIMIT: f64 = 1.55;

/// Field of view range input handlers should allow, in degrees.
pub const FOV_RANGE: (f64, f64) = (30.0, 120.0);

/// Camera state snapshot.
///
/// The render core never clamps these; see [`Camera::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Camera {
    /// Eye position in world space
    pub position: DVec3,
    /// Rotation about +Y in radians
    pub yaw: f64,
    /// Rotation about the camera's right axis in radians
    pub pitch: f64,
    /// Field of view in degrees
    pub fov: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            fov: 90.0,
        }
    }
}

/// Orthonormal camera frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBasis {
    /// Screen +x
    pub right: DVec3,
    /// Screen +y
    pub up: DVec3,
    /// View direction; +Z at yaw = pitch = 0
    pub forward: DVec3,
}

impl Camera {
    /// Copy with pitch and field of view pulled into the supported range.
    pub fn clamped(self) -> Self {
        Self {
            pitch: self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT),
            fov: self.fov.clamp(FOV_RANGE.0, FOV_RANGE.1),
            ..self
        }
    }

    /// Frame derived from yaw and pitch.
    ///
    /// Rows of a rotation matrix, so the vectors stay unit length and mutually
    /// orthogonal at any pitch, poles included.
    pub fn basis(&self) -> CameraBasis {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        CameraBasis {
            right: DVec3::new(cy, 0.0, -sy),
            up: DVec3::new(sy * sp, cp, cy * sp),
            forward: DVec3::new(sy * cp, -sp, cy * cp),
        }
    }

    /// Primary ray through image-plane coordinates `(u, v)` in [0, 1]²,
    /// u left to right, v bottom to top.
    pub fn ray(&self, u: f64, v: f64) -> Ray {
        let basis = self.basis();
        self.ray_with_basis(&basis, u, v)
    }

    /// Same as [`Camera::ray`] with the frame computed once by the caller.
    pub fn ray_with_basis(&self, basis: &CameraBasis, u: f64, v: f64) -> Ray {
        let scale = (self.fov.to_radians() / 2.0).tan();
        let x = (2.0 * u - 1.0) * ASPECT * scale;
        let y = (v - 0.5) * scale;

        let d = DVec3::new(x, y, -1.0);
        let direction = basis.right * d.x + basis.up * d.y - basis.forward * d.z;
        Ray::new(self.position, direction.normalize())
    }
}
