use std::f64::consts::{FRAC_1_SQRT_2, PI};

use glam::DVec3;

use dualtrace::camera::Camera;
use dualtrace::hittable::Hittable;
use dualtrace::interval::Interval;
use dualtrace::light::Light;
use dualtrace::ray::{Color, Ray};
use dualtrace::render::{render_frame, SoftwareRenderer};
use dualtrace::scene::{Scene, SceneSource, SceneState, ShadingParams};
use dualtrace::sphere::Sphere;
use dualtrace::tracer::{sky, trace, MAX_DEPTH, SKY_BLUE, SKY_WHITE};

const GREY: Color = Color::new(0.5, 0.5, 0.5);

fn facing_spheres() -> Camera {
    Camera { yaw: PI, ..Camera::default() }
}

/// Matte ground whose top touches the origin, lit from straight above.
fn ground_scene(light_height: f64, extra: Option<Sphere>) -> Scene {
    let mut spheres = vec![Sphere::new(DVec3::new(0.0, -100.0, 0.0), 100.0, GREY, 0.0).unwrap()];
    spheres.extend(extra);
    Scene {
        spheres,
        lights: vec![Light::point(DVec3::new(0.0, light_height, 0.0), DVec3::ONE, 1.0)],
        shading: ShadingParams::default(),
    }
}

/// Oblique ray landing on the origin, clear of anything on the y axis.
fn ray_to_origin() -> Ray {
    Ray::new(DVec3::new(3.0, 3.0, 0.0), DVec3::new(-FRAC_1_SQRT_2, -FRAC_1_SQRT_2, 0.0))
}

#[test]
fn head_on_hit_reports_distance_and_normal() {
    for radius in [0.25, 1.0, 2.0] {
        let sphere = Sphere::new(DVec3::ZERO, radius, DVec3::ONE, 0.0).unwrap();
        let r = Ray::new(DVec3::new(0.0, 0.0, 5.0), DVec3::NEG_Z);
        let hit = sphere.hit(&r, Interval::new(1e-3, f64::INFINITY)).unwrap();
        assert!((hit.t - (5.0 - radius)).abs() < 1e-12);
        assert!((hit.normal - DVec3::Z).length() < 1e-12);
    }
}

#[test]
fn sky_runs_white_to_blue() {
    assert!((sky(DVec3::NEG_Y) - SKY_WHITE).length() < 1e-12);
    assert!((sky(DVec3::Y) - SKY_BLUE).length() < 1e-12);
}

#[test]
fn lit_ground_under_overhead_light() {
    // n·L = 1: albedo * 0.8 + albedo * 0.2
    let got = trace(&ray_to_origin(), &ground_scene(10.0, None), MAX_DEPTH);
    assert!((got - GREY).length() < 1e-9);
}

#[test]
fn occluder_scales_by_exactly_shadow_factor() {
    let blocker = Sphere::new(DVec3::new(0.0, 5.0, 0.0), 1.0, DVec3::ONE, 0.0).unwrap();
    let lit = trace(&ray_to_origin(), &ground_scene(10.0, None), MAX_DEPTH);
    let dark = trace(&ray_to_origin(), &ground_scene(10.0, Some(blocker)), MAX_DEPTH);
    assert!((dark - lit * 0.3).length() < 1e-12);
}

#[test]
fn occluder_past_the_light_is_ignored() {
    let beyond = Sphere::new(DVec3::new(0.0, 6.0, 0.0), 1.0, DVec3::ONE, 0.0).unwrap();
    let lit = trace(&ray_to_origin(), &ground_scene(3.0, None), MAX_DEPTH);
    let got = trace(&ray_to_origin(), &ground_scene(3.0, Some(beyond)), MAX_DEPTH);
    assert_eq!(got, lit);
}

#[test]
fn zero_depth_frame_is_black() {
    let frame = render_frame(&Scene::reference(), &facing_spheres(), 16, 8, 0);
    assert!(frame.iter().all(|&b| b == 0));
}

#[test]
fn mirror_hall_terminates() {
    let mirror = |z: f64| Sphere::new(DVec3::new(0.0, 0.0, z), 1.0, DVec3::ONE, 1.0).unwrap();
    let scene = Scene {
        spheres: vec![mirror(-3.0), mirror(3.0)],
        lights: vec![],
        shading: ShadingParams::default(),
    };
    let r = Ray::new(DVec3::ZERO, DVec3::NEG_Z);
    assert_eq!(trace(&r, &scene, 64), Color::ZERO);
}

#[test]
fn toggling_a_light_off_and_on_restores_the_frame() {
    let mut state = SceneState::new();
    state.set_camera(facing_spheres());
    let mut renderer = SoftwareRenderer::default();

    let before = renderer.render_frame(&mut state, 40, 20).to_vec();

    state.set_light_enabled(1, false).unwrap();
    assert!(state.is_dirty());
    let without = renderer.render_frame(&mut state, 40, 20).to_vec();
    assert_ne!(before, without);

    state.set_light_enabled(1, true).unwrap();
    let after = renderer.render_frame(&mut state, 40, 20).to_vec();
    assert_eq!(before, after);
    assert_eq!(renderer.passes(), 3);
}

#[test]
fn disabling_every_light_leaves_ambient_only() {
    let mut state = SceneState::new();
    state.set_light_enabled(0, false).unwrap();
    state.set_light_enabled(1, false).unwrap();
    let scene = state.scene_snapshot();

    // Down and forward onto the matte yellow ground, clear of the other spheres
    let r = Ray::new(DVec3::ZERO, DVec3::new(0.0, -1.0, -1.0).normalize());
    let got = trace(&r, &scene, MAX_DEPTH);
    assert!((got - Color::new(0.2, 0.2, 0.0)).length() < 1e-12);
}

#[test]
fn directional_mode_changes_the_frame() {
    let mut state = SceneState::new();
    state.set_camera(facing_spheres());
    let point = render_frame(&state.scene_snapshot(), &facing_spheres(), 24, 12, MAX_DEPTH);

    state.set_light_directional(0, true).unwrap();
    let scene = state.scene_snapshot();
    assert!(scene.lights[0].is_directional());
    let directional = render_frame(&scene, &facing_spheres(), 24, 12, MAX_DEPTH);
    assert_ne!(point, directional);

    state.set_light_directional(0, false).unwrap();
    assert_eq!(render_frame(&state.scene_snapshot(), &facing_spheres(), 24, 12, MAX_DEPTH), point);
}
