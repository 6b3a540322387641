use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str = "pixelmagic=info";

/// Filter used when `RUST_LOG` is unset; `-v` raises the crate level.
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => DEFAULT_FILTER,
        1 => "pixelmagic=debug",
        _ => "pixelmagic=trace",
    }
}

/// Installs the global fmt subscriber. Safe to call more than once.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));
    let result = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
