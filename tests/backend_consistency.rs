use std::f64::consts::PI;

use glam::DVec3;
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use dualtrace::camera::Camera;
use dualtrace::kernel::{divergence, FragmentKernel};
use dualtrace::render::{pixel_color, render_frame};
use dualtrace::scene::{Scene, SceneSource, SceneState};
use dualtrace::tracer::MAX_DEPTH;

const WIDTH: u32 = 80;
const HEIGHT: u32 = 40;

/// Every pixel must agree to within one quantization step.
fn assert_backends_agree(scene: &Scene, camera: &Camera) {
    let software = render_frame(scene, camera, WIDTH, HEIGHT, MAX_DEPTH);
    let fragment = FragmentKernel::new(scene, camera, WIDTH, HEIGHT, MAX_DEPTH).render();
    assert_eq!(software.len(), fragment.len());

    let d = divergence(&software, &fragment, 1).unwrap();
    assert_eq!(d.pixels_over, 0, "{d:?}");
    assert!(d.max_delta <= 1);
}

fn facing_spheres() -> Camera {
    Camera { yaw: PI, ..Camera::default() }
}

#[test]
fn reference_scene() {
    assert_backends_agree(&Scene::reference(), &facing_spheres());
}

#[test]
fn reference_scene_at_default_resolution() {
    let (w, h) = (400, 200);
    let software = render_frame(&Scene::reference(), &facing_spheres(), w, h, MAX_DEPTH);
    let fragment = FragmentKernel::new(&Scene::reference(), &facing_spheres(), w, h, MAX_DEPTH).render();
    let d = divergence(&software, &fragment, 1).unwrap();
    assert_eq!(d.pixels_over, 0, "{d:?}");
}

#[test]
fn reference_scene_from_other_viewpoints() {
    let cameras = [
        Camera { position: DVec3::new(0.5, 1.0, 1.0), yaw: PI, pitch: 0.3, fov: 70.0 },
        Camera { position: DVec3::new(-3.0, 0.5, -2.0), yaw: PI / 2.0, pitch: 0.1, fov: 110.0 },
    ];
    for camera in cameras {
        assert_backends_agree(&Scene::reference(), &camera);
    }
}

#[test]
fn light_edits() {
    let mut state = SceneState::new();
    state.set_light_enabled(1, false).unwrap();
    state.set_light_directional(0, true).unwrap();
    assert_backends_agree(&state.scene_snapshot(), &facing_spheres());
}

#[test]
fn randomized_spheres() {
    let mut rng = ChaCha20Rng::seed_from_u64(7);
    let mut state = SceneState::new();
    for index in 0..state.spheres().len() {
        if index != 3 {
            state.randomize_sphere(index, &mut rng).unwrap();
        }
    }
    assert_backends_agree(&state.scene_snapshot(), &facing_spheres());
}

#[test]
fn empty_scene_is_pure_sky() {
    let camera = facing_spheres();
    let software = render_frame(&Scene::default(), &camera, WIDTH, HEIGHT, MAX_DEPTH);
    let fragment = FragmentKernel::new(&Scene::default(), &camera, WIDTH, HEIGHT, MAX_DEPTH).render();
    assert_eq!(divergence(&software, &fragment, 1).unwrap().pixels_over, 0);
}

#[test]
fn zero_depth_is_black_on_both() {
    let scene = Scene::reference();
    let camera = facing_spheres();
    assert!(render_frame(&scene, &camera, 16, 8, 0).iter().all(|&b| b == 0));
    assert!(FragmentKernel::new(&scene, &camera, 16, 8, 0).render().iter().all(|&b| b == 0));
}

#[test]
fn center_pixel_linear_colors_agree() {
    let scene = Scene::reference();
    let camera = facing_spheres();
    let kernel = FragmentKernel::new(&scene, &camera, 9, 5, MAX_DEPTH);
    let sw = pixel_color(&scene, &camera, 4, 2, 9, 5, MAX_DEPTH);
    let fr = kernel.shade_pixel(4, 2);
    assert!((sw.x - f64::from(fr.x)).abs() < 1e-4);
    assert!((sw.y - f64::from(fr.y)).abs() < 1e-4);
    assert!((sw.z - f64::from(fr.z)).abs() < 1e-4);
}

#[test]
fn parallel_evaluation_is_deterministic() {
    let kernel = FragmentKernel::new(&Scene::reference(), &facing_spheres(), WIDTH, HEIGHT, MAX_DEPTH);
    assert_eq!(kernel.render(), kernel.render());
}
