use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use log::LevelFilter;

use dualtrace::config::RenderConfig;

/// Log levels accepted by `--debug-level`
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Execution backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Recursive f64 tracer, single-threaded, cached
    Software,
    /// Fragment kernel evaluated on the CPU with rayon
    Kernel,
    /// Fragment kernel on a Vulkan device (needs the `gpu` feature)
    Gpu,
}

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "dualtrace")]
#[command(about = "Whitted-style sphere ray tracer with software and fragment-kernel backends")]
pub struct Args {
    /// TOML configuration file; a missing file means defaults
    #[arg(short, long, default_value = "dualtrace.toml")]
    pub config: PathBuf,

    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub debug_level: LogLevel,

    /// Image width in pixels (overrides config)
    #[arg(long)]
    pub width: Option<u32>,

    /// Image height in pixels (overrides config)
    #[arg(long)]
    pub height: Option<u32>,

    /// Bounce budget (overrides config)
    #[arg(long)]
    pub max_depth: Option<u32>,

    /// Rendering backend
    #[arg(short, long, value_enum, default_value = "software")]
    pub backend: Backend,

    /// Output file path (.png for the 8-bit frame, .exr for linear color)
    #[arg(short, long, default_value = "output.png")]
    pub output: PathBuf,

    /// Render with both CPU backends and report how far they diverge
    #[arg(long)]
    pub compare: bool,

    /// Randomize the sphere at this index before rendering
    #[arg(long)]
    pub randomize: Option<usize>,

    /// Seed for --randomize
    #[arg(long, default_value = "0")]
    pub seed: u64,
}

impl Args {
    /// Apply command-line overrides on top of a loaded config.
    pub fn apply(&self, config: &mut RenderConfig) {
        if let Some(width) = self.width {
            config.render.width = width;
        }
        if let Some(height) = self.height {
            config.render.height = height;
        }
        if let Some(max_depth) = self.max_depth {
            config.render.max_depth = max_depth;
        }
    }
}
