//! Sphere primitive for ray tracing.
//!
//! Intersection solves the full quadratic |O + tD - C|² = r² so the software
//! path and the GLSL kernel share exactly the same arithmetic.

use glam::DVec3;

use crate::hittable::{HitRecord, Hittable};
use crate::interval::Interval;
use crate::ray::{Color, Ray};
use crate::scene::SceneError;

/// Sphere primitive defined by center, radius, and surface material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center point of the sphere in world coordinates.
    pub center: DVec3,
    /// Radius, strictly positive.
    pub radius: f64,
    /// Base color under full illumination.
    pub albedo: Color,
    /// Fraction of outgoing color taken from the reflected ray (0 = matte, 1 = mirror).
    pub reflectivity: f64,
}

impl Sphere {
    /// Create a new sphere.
    ///
    /// Rejects non-positive or non-finite radii and reflectivity outside [0, 1];
    /// the intersector and tracer assume neither occurs.
    pub fn new(center: DVec3, radius: f64, albedo: Color, reflectivity: f64) -> Result<Self, SceneError> {
        let sphere = Self { center, radius, albedo, reflectivity };
        sphere.validate()?;
        Ok(sphere)
    }

    /// Check the invariants `new` enforces, for spheres built field by field.
    pub fn validate(&self) -> Result<(), SceneError> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(SceneError::InvalidRadius(self.radius));
        }
        if !(0.0..=1.0).contains(&self.reflectivity) {
            return Err(SceneError::InvalidReflectivity(self.reflectivity));
        }
        Ok(())
    }
}

impl Hittable for Sphere {
    fn hit(&self, r: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let oc = r.origin - self.center;

        let a = r.direction.dot(r.direction);
        let b = 2.0 * oc.dot(r.direction);
        let c = oc.dot(oc) - self.radius * self.radius;

        // Tangent rays count as misses
        let discriminant = b * b - 4.0 * a * c;
        if discriminant <= 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();

        // Nearest root inside the range, else the far one
        let mut root = (-b - sqrtd) / (2.0 * a);
        if !ray_t.surrounds(root) {
            root = (-b + sqrtd) / (2.0 * a);
            if !ray_t.surrounds(root) {
                return None;
            }
        }

        let p = r.at(root);
        Some(HitRecord {
            t: root,
            point: p,
            normal: (p - self.center) / self.radius,
            albedo: self.albedo,
            reflectivity: self.reflectivity,
        })
    }
}
