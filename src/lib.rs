pub mod api;
pub mod app;
pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod logging;
pub mod notification;
pub mod preview;
pub mod session;
pub use error::{AppError, AppResult};

use clap::Parser;

/// Entrypoint used by the `pixelmagic` binary.
pub async fn run() -> anyhow::Result<()> {
    let cli = app::Cli::parse();
    logging::init(cli.verbose);
    tracing::info!("starting PixelMagic");

    let config = app::resolve_config(&cli)?;
    tracing::debug!(api = %config.api_base_url, "configuration resolved");
    let app = app::App::from_config(config)?;
    if let Some(path) = app.run(cli.command).await? {
        println!("{}", path.display());
    }
    Ok(())
}
