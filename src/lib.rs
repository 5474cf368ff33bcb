//! dualtrace: a Whitted-style sphere ray tracer with two backends.
//!
//! The software path ([`render::SoftwareRenderer`]) runs a recursive f64
//! tracer on one thread and caches the last frame until the scene changes.
//! The fragment kernel ([`kernel::FragmentKernel`]) evaluates an iterative
//! f32 version of the same optical model per pixel, in parallel on the CPU
//! or, with the `gpu` feature, on a Vulkan device. Both read owned
//! [`scene::Scene`] snapshots taken from a [`scene::SceneSource`].

#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod camera;
pub mod config;
pub mod hittable;
pub mod interval;
pub mod kernel;
pub mod light;
pub mod output;
pub mod ray;
pub mod render;
pub mod scene;
pub mod shading;
pub mod sphere;
pub mod tracer;

#[cfg(feature = "gpu")]
pub mod gpu_compute;
#[cfg(feature = "gpu")]
mod shaders;
