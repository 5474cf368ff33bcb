//! Ray-object intersection.
//!
//! Defines the Hittable trait, the HitRecord it produces, and the nearest-hit
//! query the shader and tracer run against a scene's spheres.

use glam::DVec3;

use crate::interval::Interval;
use crate::ray::{Color, Ray};
use crate::sphere::Sphere;

/// Ray-object intersection information.
///
/// Transient: produced by a query and consumed immediately by shading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Ray parameter at the intersection
    pub t: f64,
    /// Point where the ray intersects the object
    pub point: DVec3,
    /// Unit surface normal, pointing away from the sphere center
    pub normal: DVec3,
    /// Albedo of the surface that was hit
    pub albedo: Color,
    /// Reflectivity of the surface that was hit
    pub reflectivity: f64,
}

/// Trait for objects that can be intersected by rays.
///
/// Must be thread-safe so scene snapshots can be shared by worker threads.
pub trait Hittable: Sync + Send {
    /// Test for ray intersection strictly inside `ray_t`.
    fn hit(&self, r: &Ray, ray_t: Interval) -> Option<HitRecord>;
}

/// Linear scan keeping the closest hit. List order carries no priority.
impl Hittable for [Sphere] {
    fn hit(&self, r: &Ray, ray_t: Interval) -> Option<HitRecord> {
        let mut closest: Option<HitRecord> = None;
        let mut closest_so_far = ray_t.max;

        for sphere in self {
            if let Some(rec) = sphere.hit(r, ray_t.with_max(closest_so_far)) {
                closest_so_far = rec.t;
                closest = Some(rec);
            }
        }

        closest
    }
}

/// Nearest hit of `ray` against `spheres` with `t` in (t_min, t_max).
pub fn nearest_hit(ray: &Ray, spheres: &[Sphere], t_min: f64, t_max: f64) -> Option<HitRecord> {
    spheres.hit(ray, Interval::new(t_min, t_max))
}

/// True if anything in `spheres` blocks `ray` before `t_max`.
pub fn occluded(ray: &Ray, spheres: &[Sphere], t_min: f64, t_max: f64) -> bool {
    let ray_t = Interval::new(t_min, t_max);
    spheres.iter().any(|s| s.hit(ray, ray_t).is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sphere(z: f64, radius: f64) -> Sphere {
        Sphere::new(DVec3::new(0.0, 0.0, z), radius, DVec3::splat(z.abs()), 0.0).unwrap()
    }

    #[test]
    fn picks_smallest_t_regardless_of_order() {
        let far_first = [sphere(-10.0, 1.0), sphere(-4.0, 1.0)];
        let near_first = [sphere(-4.0, 1.0), sphere(-10.0, 1.0)];
        let r = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0));

        for spheres in [&far_first[..], &near_first[..]] {
            let rec = nearest_hit(&r, spheres, 1e-3, f64::INFINITY).unwrap();
            assert!((rec.t - 3.0).abs() < 1e-12);
            assert_eq!(rec.albedo, DVec3::splat(4.0));
        }
    }

    #[test]
    fn empty_scene_never_hits() {
        let r = Ray::new(DVec3::ZERO, DVec3::X);
        assert!(nearest_hit(&r, &[], 1e-3, f64::INFINITY).is_none());
        assert!(!occluded(&r, &[], 1e-3, f64::INFINITY));
    }

    #[test]
    fn occlusion_respects_upper_bound() {
        let spheres = [sphere(-4.0, 1.0)];
        let r = Ray::new(DVec3::ZERO, DVec3::new(0.0, 0.0, -1.0));
        assert!(occluded(&r, &spheres, 1e-3, 10.0));
        // Front surface sits at t = 3, back at t = 5
        assert!(!occluded(&r, &spheres, 1e-3, 3.0));
        assert!(occluded(&r, &spheres, 1e-3, 3.5));
    }
}
