use log::LevelFilter;

/// Install the global `env_logger` at `level`.
///
/// Vulkan loader chatter stays at warn regardless of the chosen level.
pub fn init_logger(level: LevelFilter) {
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .filter_module("vulkano", LevelFilter::Warn)
        .format_timestamp_millis()
        .init();
}
