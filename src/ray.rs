//! Ray representation for the software tracer.
//!
//! A ray is defined as r(t) = origin + t * direction. The software path works
//! in double precision; the fragment kernel has its own f32 transcription.

use glam::DVec3;

/// RGB color in linear, unclamped [0, 1] convention.
pub type Color = DVec3;

/// Ray in 3D space defined by origin and direction.
///
/// Mathematical representation: r(t) = origin + t * direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Starting point of the ray in world coordinates.
    pub origin: DVec3,

    /// Direction of travel.
    ///
    /// Every ray the tracer builds carries a unit direction; the sky gradient
    /// and the reflection formula both rely on it.
    pub direction: DVec3,
}

impl Ray {
    /// Create a new ray with origin and direction.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self { origin, direction }
    }

    /// Compute a point at parameter t along the ray.
    pub fn at(&self, t: f64) -> DVec3 {
        self.origin + t * self.direction
    }
}

/// Mirror `v` about the surface normal `n`.
pub fn reflect(v: DVec3, n: DVec3) -> DVec3 {
    v - 2.0 * v.dot(n) * n
}
