use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use image::{ImageBuffer, Rgb};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use dualtrace::config::RenderConfig;
use dualtrace::kernel::{divergence, FragmentKernel};
use dualtrace::output::{save_exr, save_png, OutputFormat};
use dualtrace::render::{quantize_image, render_frame, render_linear, SoftwareRenderer};
use dualtrace::scene::{SceneSource, SceneState};

mod cli;
mod logger;

use cli::{Args, Backend};
use logger::init_logger;

/// Channel difference tolerated by `--compare` before a pixel counts as divergent.
const COMPARE_TOLERANCE: u8 = 1;

type LinearImage = ImageBuffer<Rgb<f32>, Vec<f32>>;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.debug_level.into());

    info!("dualtrace - Git Version {} ({})", env!("GIT_HASH"), env!("GIT_DATE"));

    let mut config = RenderConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;
    args.apply(&mut config);
    let (width, height, max_depth) = (config.render.width, config.render.height, config.render.max_depth);
    info!("Image resolution: {width}x{height}, max depth: {max_depth}");

    let mut state = config.scene_state()?;
    if let Some(index) = args.randomize {
        let mut rng = ChaCha20Rng::seed_from_u64(args.seed);
        state
            .randomize_sphere(index, &mut rng)
            .with_context(|| format!("randomizing sphere {index}"))?;
    }

    if args.compare {
        compare_backends(&state, width, height, max_depth);
    }

    let format = OutputFormat::from_path(&args.output)?;
    info!("Using {:?} backend", args.backend);
    let start = Instant::now();

    match format {
        OutputFormat::Png => {
            let frame = match args.backend {
                Backend::Software => software_pass(&mut state, width, height, max_depth)?,
                Backend::Kernel => kernel_for(&state, width, height, max_depth).render(),
                Backend::Gpu => {
                    let kernel = kernel_for(&state, width, height, max_depth);
                    match gpu_linear(&kernel) {
                        Some(image) => quantize_image(&image),
                        None => kernel.render(),
                    }
                }
            };
            info!("Frame ready in {:.2?}", start.elapsed());
            save_png(&frame, width, height, &args.output)?;
        }
        OutputFormat::Exr => {
            let image = match args.backend {
                Backend::Software => {
                    render_linear(&state.scene_snapshot(), &state.camera_snapshot(), width, height, max_depth)
                }
                Backend::Kernel => kernel_for(&state, width, height, max_depth).render_linear(),
                Backend::Gpu => {
                    let kernel = kernel_for(&state, width, height, max_depth);
                    gpu_linear(&kernel).unwrap_or_else(|| kernel.render_linear())
                }
            };
            info!("Frame ready in {:.2?}", start.elapsed());
            save_exr(&image, &args.output)?;
        }
    }

    Ok(())
}

fn kernel_for(state: &SceneState, width: u32, height: u32, max_depth: u32) -> FragmentKernel {
    FragmentKernel::new(&state.scene_snapshot(), &state.camera_snapshot(), width, height, max_depth)
}

/// Cached software pass with a per-row progress bar.
fn software_pass(state: &mut SceneState, width: u32, height: u32, max_depth: u32) -> Result<Vec<u8>> {
    let pb = ProgressBar::new(u64::from(height));
    pb.set_style(ProgressStyle::default_bar().template("{bar:40} {pos}/{len} rows ETA: {eta}")?);

    let mut renderer = SoftwareRenderer::new(max_depth);
    let frame = renderer
        .render_frame_with_progress(state, width, height, |_| pb.inc(1))
        .to_vec();
    pb.finish_and_clear();
    Ok(frame)
}

/// Render one snapshot with both CPU backends and log how far they diverge.
fn compare_backends(state: &SceneState, width: u32, height: u32, max_depth: u32) {
    let scene = state.scene_snapshot();
    let camera = state.camera_snapshot();

    let start = Instant::now();
    let software = render_frame(&scene, &camera, width, height, max_depth);
    let software_time = start.elapsed();

    let start = Instant::now();
    let fragment = FragmentKernel::new(&scene, &camera, width, height, max_depth).render();
    let fragment_time = start.elapsed();

    let Some(d) = divergence(&software, &fragment, COMPARE_TOLERANCE) else {
        warn!("Backends produced frames of different sizes");
        return;
    };
    info!("Software: {software_time:.2?}, fragment kernel: {fragment_time:.2?}");
    info!(
        "Max channel difference {}, {} of {} pixels over {}",
        d.max_delta,
        d.pixels_over,
        width as usize * height as usize,
        COMPARE_TOLERANCE
    );
    if d.pixels_over > 0 {
        warn!("Backends diverge beyond float precision on {} pixels", d.pixels_over);
    }
}

#[cfg(feature = "gpu")]
fn gpu_linear(kernel: &FragmentKernel) -> Option<LinearImage> {
    use dualtrace::gpu_compute::VulkanRenderer;

    match VulkanRenderer::new().and_then(|renderer| renderer.render(kernel)) {
        Ok(image) => Some(image),
        Err(e) => {
            error!("GPU rendering failed: {e}, falling back to the CPU fragment kernel");
            None
        }
    }
}

#[cfg(not(feature = "gpu"))]
fn gpu_linear(_kernel: &FragmentKernel) -> Option<LinearImage> {
    error!("Built without the gpu feature, falling back to the CPU fragment kernel");
    None
}
