use std::fs;
use std::path::Path;
use std::process::Command;

const KERNEL_SOURCE: &str = "shaders/compute/raytracing.glsl";

fn main() {
    let git_hash = git(&["rev-parse", "--short", "HEAD"]);
    let git_date = git(&["log", "-1", "--format=%ci"]);
    println!("cargo:rustc-env=GIT_HASH={git_hash}");
    println!("cargo:rustc-env=GIT_DATE={git_date}");

    if std::env::var_os("CARGO_FEATURE_GPU").is_some() {
        compile_kernel();
    }
}

fn git(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn compile_kernel() {
    println!("cargo:rerun-if-changed={KERNEL_SOURCE}");

    let out_dir = std::env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    let shader_out_dir = Path::new(&out_dir).join("shaders/compute");
    fs::create_dir_all(&shader_out_dir).expect("failed to create shader output dir");
    let output = shader_out_dir.join("raytracing.spv");

    let status = Command::new("glslc")
        .arg("-fshader-stage=compute")
        .arg("-O")
        .arg("--target-env=vulkan1.2")
        .arg(KERNEL_SOURCE)
        .arg("-o")
        .arg(&output)
        .status()
        .expect("failed to execute glslc; the gpu feature needs it in PATH");

    if !status.success() {
        panic!("shader compilation failed for {KERNEL_SOURCE}");
    }
    if !output.exists() {
        panic!("expected output file not created: {}", output.display());
    }
}
