//! Local lighting at a hit point.
//!
//! `base = albedo * Σ(weight·max(0, n·L)) * diffuse_scale + albedo * ambient`,
//! then scaled once by `shadow_attenuation` if any enabled light is blocked.
//! The reference two-light setup (weights 0.6/0.4, scale 0.8, ambient 0.2,
//! shadow 0.3) is just the default scene's data.

use crate::hittable::{occluded, HitRecord};
use crate::ray::{Color, Ray};
use crate::scene::Scene;

/// Offset along the normal for rays leaving a surface.
pub const SURFACE_EPSILON: f64 = 1e-3;

/// Shaded color of `hit` under the scene's lights, shadows included.
pub fn shade(hit: &HitRecord, scene: &Scene) -> Color {
    let mut diffuse = 0.0;
    let mut shadowed = false;
    let origin = hit.point + hit.normal * SURFACE_EPSILON;

    for light in scene.lights.iter().filter(|l| l.enabled) {
        let (to_light, distance) = light.toward(hit.point);
        diffuse += light.weight * hit.normal.dot(to_light).max(0.0);

        if !shadowed {
            let shadow_ray = Ray::new(origin, to_light);
            shadowed = occluded(&shadow_ray, &scene.spheres, SURFACE_EPSILON, distance);
        }
    }

    let params = &scene.shading;
    let base = hit.albedo * diffuse * params.diffuse_scale + hit.albedo * params.ambient;
    if shadowed {
        base * params.shadow_attenuation
    } else {
        base
    }
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::light::Light;
    use crate::scene::ShadingParams;
    use crate::sphere::Sphere;

    fn floor_hit() -> HitRecord {
        HitRecord {
            t: 1.0,
            point: DVec3::ZERO,
            normal: DVec3::Y,
            albedo: DVec3::new(1.0, 0.5, 0.25),
            reflectivity: 0.0,
        }
    }

    fn scene_with(lights: Vec<Light>, spheres: Vec<Sphere>) -> Scene {
        Scene { spheres, lights, shading: ShadingParams::default() }
    }

    #[test]
    fn reference_weights_reproduce_two_light_law() {
        // Light 1 straight above (diff 1), light 2 at 60° off the normal (diff 0.5)
        let l2_dir = DVec3::new(3f64.sqrt() / 2.0, 0.5, 0.0);
        let scene = scene_with(
            vec![
                Light::point(DVec3::new(0.0, 10.0, 0.0), DVec3::ONE, 0.6),
                Light::point(l2_dir * 10.0, DVec3::ONE, 0.4),
            ],
            vec![],
        );
        let hit = floor_hit();
        let expected = hit.albedo * (0.6 * 1.0 + 0.4 * 0.5) * 0.8 + hit.albedo * 0.2;
        assert!((shade(&hit, &scene) - expected).length() < 1e-12);
    }

    #[test]
    fn no_lights_leaves_ambient_only() {
        let hit = floor_hit();
        let got = shade(&hit, &scene_with(vec![], vec![]));
        assert!((got - hit.albedo * 0.2).length() < 1e-12);
    }

    #[test]
    fn light_below_horizon_adds_nothing() {
        let hit = floor_hit();
        let scene = scene_with(vec![Light::point(DVec3::new(0.0, -5.0, 0.0), DVec3::ONE, 1.0)], vec![]);
        assert!((shade(&hit, &scene) - hit.albedo * 0.2).length() < 1e-12);
    }

    #[test]
    fn occluder_between_point_and_light_attenuates() {
        let hit = floor_hit();
        let light = Light::point(DVec3::new(0.0, 10.0, 0.0), DVec3::ONE, 1.0);
        let blocker = Sphere::new(DVec3::new(0.0, 5.0, 0.0), 1.0, DVec3::ONE, 0.0).unwrap();

        let lit = shade(&hit, &scene_with(vec![light], vec![]));
        let dark = shade(&hit, &scene_with(vec![light], vec![blocker]));
        assert!((dark - lit * 0.3).length() < 1e-12);
    }

    #[test]
    fn occluder_beyond_light_casts_no_shadow() {
        let hit = floor_hit();
        let light = Light::point(DVec3::new(0.0, 3.0, 0.0), DVec3::ONE, 1.0);
        let beyond = Sphere::new(DVec3::new(0.0, 6.0, 0.0), 1.0, DVec3::ONE, 0.0).unwrap();

        let lit = shade(&hit, &scene_with(vec![light], vec![]));
        let got = shade(&hit, &scene_with(vec![light], vec![beyond]));
        assert_eq!(got, lit);
    }

    #[test]
    fn directional_light_shadows_regardless_of_distance() {
        let hit = floor_hit();
        let sun = Light::directional(DVec3::new(0.0, -1.0, 0.0), DVec3::ONE, 1.0).unwrap();
        let far = Sphere::new(DVec3::new(0.0, 500.0, 0.0), 10.0, DVec3::ONE, 0.0).unwrap();

        let lit = shade(&hit, &scene_with(vec![sun], vec![]));
        assert!((lit - hit.albedo).length() < 1e-12);
        let dark = shade(&hit, &scene_with(vec![sun], vec![far]));
        assert!((dark - lit * 0.3).length() < 1e-12);
    }

    #[test]
    fn attenuation_applies_once_for_multiple_blocked_lights() {
        let hit = floor_hit();
        let a = Light::point(DVec3::new(0.0, 10.0, 0.0), DVec3::ONE, 0.5);
        let b = Light::point(DVec3::new(0.0, 20.0, 0.0), DVec3::ONE, 0.5);
        let blocker = Sphere::new(DVec3::new(0.0, 5.0, 0.0), 1.0, DVec3::ONE, 0.0).unwrap();

        let lit = shade(&hit, &scene_with(vec![a, b], vec![]));
        let dark = shade(&hit, &scene_with(vec![a, b], vec![blocker]));
        assert!((dark - lit * 0.3).length() < 1e-12);
    }

    #[test]
    fn disabled_light_neither_lights_nor_shadows() {
        let hit = floor_hit();
        let mut light = Light::point(DVec3::new(0.0, 10.0, 0.0), DVec3::ONE, 1.0);
        light.enabled = false;
        let blocker = Sphere::new(DVec3::new(0.0, 5.0, 0.0), 1.0, DVec3::ONE, 0.0).unwrap();

        let got = shade(&hit, &scene_with(vec![light], vec![blocker]));
        assert!((got - hit.albedo * 0.2).length() < 1e-12);
    }
}
