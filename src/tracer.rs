//! Depth-bounded recursive tracer for the software path.

use crate::hittable::nearest_hit;
use crate::ray::{reflect, Color, Ray};
use crate::scene::Scene;
use crate::shading::{shade, SURFACE_EPSILON};

/// Bounce budget used by both backends.
pub const MAX_DEPTH: u32 = 3;

/// Horizon color of the sky gradient.
pub const SKY_WHITE: Color = Color::new(1.0, 1.0, 1.0);

/// Zenith color of the sky gradient.
pub const SKY_BLUE: Color = Color::new(0.5, 0.7, 1.0);

/// Background seen by a ray that escapes the scene.
///
/// `direction` must be unit length: y = -1 gives white, y = 1 gives sky blue.
pub fn sky(direction: glam::DVec3) -> Color {
    let a = 0.5 * (direction.y + 1.0);
    (1.0 - a) * SKY_WHITE + a * SKY_BLUE
}

/// Color carried back along `r`.
///
/// A depth of zero gathers no light. Surfaces with zero reflectivity return
/// their local shading without spending any of the depth budget; mirrors
/// blend `(1 - ρ)·shaded + ρ·trace(reflected, depth - 1)`.
pub fn trace(r: &Ray, scene: &Scene, depth: u32) -> Color {
    if depth == 0 {
        return Color::ZERO;
    }

    let Some(hit) = nearest_hit(r, &scene.spheres, SURFACE_EPSILON, f64::INFINITY) else {
        return sky(r.direction);
    };

    let shaded = shade(&hit, scene);
    if hit.reflectivity <= 0.0 {
        return shaded;
    }

    let reflected = Ray::new(
        hit.point + hit.normal * SURFACE_EPSILON,
        reflect(r.direction, hit.normal),
    );
    let bounced = trace(&reflected, scene, depth - 1);
    (1.0 - hit.reflectivity) * shaded + hit.reflectivity * bounced
}
