//! Precompiled SPIR-V for the GPU backend.
//!
//! `build.rs` compiles `shaders/compute/raytracing.glsl` with glslc when the
//! `gpu` feature is on; nothing is compiled at runtime.

use std::sync::Arc;

use vulkano::{
    device::Device,
    shader::{ShaderModule, ShaderModuleCreateInfo},
};

const RAYTRACING_SPIRV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/shaders/compute/raytracing.spv"));

/// Load the fragment kernel compute shader.
pub fn load_raytracing(device: Arc<Device>) -> Result<Arc<ShaderModule>, Box<dyn std::error::Error>> {
    load_shader_from_spirv(device, RAYTRACING_SPIRV, "raytracing compute")
}

fn load_shader_from_spirv(
    device: Arc<Device>,
    spirv_bytes: &[u8],
    shader_name: &str,
) -> Result<Arc<ShaderModule>, Box<dyn std::error::Error>> {
    if spirv_bytes.len() % 4 != 0 {
        return Err(format!("invalid SPIR-V for {shader_name}: length not a multiple of 4").into());
    }

    let words: Vec<u32> = spirv_bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    log::debug!("Loading {} shader ({} bytes SPIR-V)", shader_name, spirv_bytes.len());

    // SAFETY: the words come from glslc output produced by build.rs
    let shader = unsafe { ShaderModule::new(device, ShaderModuleCreateInfo::new(&words))? };
    Ok(shader)
}
