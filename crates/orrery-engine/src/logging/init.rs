use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info", "warn",
/// "orrery_engine=debug,wgpu=warn").
///
/// `write_style` controls ANSI coloring behavior.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub write_style: env_logger::WriteStyle,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            write_style: env_logger::WriteStyle::Auto,
        }
    }
}

impl LoggingConfig {
    /// Config with an explicit filter string, ignoring `RUST_LOG`.
    pub fn with_filter(filter: impl Into<String>) -> Self {
        Self {
            env_filter: Some(filter.into()),
            ..Self::default()
        }
    }
}

/// wgpu is chatty at info level; keep it quiet unless asked for.
const DEFAULT_FILTER: &str = "info,wgpu_core=warn,wgpu_hal=warn,naga=warn";

static INIT: Once = Once::new();

/// Initializes the global logger once.
///
/// Filter precedence: `config.env_filter`, then `RUST_LOG`, then a default
/// of `info` for the engine with wgpu internals at `warn`.
///
/// Subsequent calls are ignored. Call early in `main`.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        let filter = config
            .env_filter
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        builder.parse_filters(&filter);

        builder.write_style(config.write_style);
        builder.format_timestamp_millis();

        // A host application may already own the global logger.
        if let Err(e) = builder.try_init() {
            eprintln!("orrery: logger already initialized ({e})");
            return;
        }

        log::debug!("logging initialized (filter: {filter})");
    });
}
