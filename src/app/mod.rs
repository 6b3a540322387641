//! Command-line front end: one tool session per invocation.

mod cli;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use image::DynamicImage;

use crate::api::{HttpImageApi, ImageApi};
use crate::config::{self, AppConfig};
use crate::crop::{CropEditor, ManualCropInput};
use crate::geometry::DisplaySize;
use crate::notification::{Notifier, Toast, TracingNotifier};
use crate::preview::{self, BackgroundOverlay, DEFAULT_PREVIEW_EDGE};
use crate::session::{
    Completion, Crop, CropParams, ImageTool, LocalImage, RemoveBackground, RemoveBackgroundParams,
    Resize, ResizeParams, SessionError, SourceImage, ToolSession, Upscale, UpscaleParams,
};

pub use cli::{Cli, Command, CropArgs, IoArgs, RemoveBgArgs, ResizeArgs, UpscaleArgs};
pub use output::resolve_output_path;

/// Resolves configuration from the CLI flags, config file and environment.
pub fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_app_config(),
    };
    if let Some(url) = &cli.api_url {
        config.api_base_url = url.clone();
    }
    Ok(config)
}

pub struct App<A: ImageApi = HttpImageApi, N: Notifier = TracingNotifier> {
    api: A,
    config: AppConfig,
    notifier: N,
}

impl App {
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let api = HttpImageApi::new(&config.api_base_url, config.request_timeout())
            .with_context(|| format!("invalid api url {}", config.api_base_url))?;
        Ok(Self::new(api, config, TracingNotifier))
    }
}

impl<A: ImageApi, N: Notifier> App<A, N> {
    pub fn new(api: A, config: AppConfig, notifier: N) -> Self {
        Self {
            api,
            config,
            notifier,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Runs one subcommand. Returns the written file, if any.
    pub async fn run(&self, command: Command) -> Result<Option<PathBuf>> {
        match command {
            Command::Health => {
                let status = self
                    .api
                    .health()
                    .await
                    .context("api health check failed")?;
                self.notifier.notify(&Toast::info(format!(
                    "{} (version {})",
                    status.message,
                    status.version.as_deref().unwrap_or("unknown")
                )));
                Ok(None)
            }
            Command::RemoveBg(args) => self.remove_background(args).await.map(Some),
            Command::Crop(args) => self.crop(args).await.map(Some),
            Command::Resize(args) => self.resize(args).await.map(Some),
            Command::Upscale(args) => self.upscale(args).await.map(Some),
        }
    }

    async fn remove_background(&self, args: RemoveBgArgs) -> Result<PathBuf> {
        let mut session = ToolSession::<RemoveBackground>::new();
        let overlay = args
            .background
            .map_or(BackgroundOverlay::Transparent, BackgroundOverlay::Solid);
        session.configure(RemoveBackgroundParams {
            softness: args.softness,
            feather: args.feather,
            overlay,
        })?;
        self.upload(&mut session, &args.io.input).await?;
        self.process(&mut session).await?;

        if let Some(path) = &args.preview {
            let rendered = session
                .overlay_preview()
                .ok_or_else(|| anyhow!("no result to preview"))??;
            output::write_preview(path, &DynamicImage::ImageRgba8(rendered))?;
        }
        self.download(&mut session, args.io.output.as_deref()).await
    }

    async fn crop(&self, args: CropArgs) -> Result<PathBuf> {
        let mut session = ToolSession::<Crop>::new();
        let source = self.upload(&mut session, &args.io.input).await?;

        // Source pixels are the display space here, so the transform scale is 1.
        let display = DisplaySize::new(
            f64::from(source.dimensions.width),
            f64::from(source.dimensions.height),
        );
        let mut editor = CropEditor::new(source.dimensions, display, args.aspect)?;
        if args.has_manual_fields() {
            let field = |value: &Option<String>| value.clone().unwrap_or_default();
            let input = ManualCropInput::parse(
                &field(&args.x),
                &field(&args.y),
                &field(&args.width),
                &field(&args.height),
            );
            editor.apply_manual(display, input)?;
        }
        let region = editor.source_region(display)?;
        tracing::info!(?region, aspect = args.aspect.label(), "crop region resolved");

        if let Some(path) = &args.preview {
            let image = image::open(&args.io.input)
                .with_context(|| format!("failed to decode {}", args.io.input.display()))?;
            let rendered =
                preview::render_editor_preview(&image, &mut editor, display, DEFAULT_PREVIEW_EDGE)?;
            output::write_preview(path, &rendered)?;
        }

        session.configure(CropParams {
            region: Some(region),
        })?;
        self.process(&mut session).await?;
        self.download(&mut session, args.io.output.as_deref()).await
    }

    async fn resize(&self, args: ResizeArgs) -> Result<PathBuf> {
        let mut session = ToolSession::<Resize>::new();
        let source = self.upload(&mut session, &args.io.input).await?;
        let mut params = ResizeParams {
            mode: args.mode,
            format: args.format,
            quality: args.quality,
            ..*session.params()
        };
        match (args.width, args.height) {
            (Some(width), Some(height)) => {
                params.width = width;
                params.height = height;
            }
            (Some(width), None) => params.lock_width(width, source.dimensions),
            (None, Some(height)) => params.lock_height(height, source.dimensions),
            (None, None) => bail!("resize needs --width, --height or both"),
        }
        session.configure(params)?;
        self.process(&mut session).await?;
        self.download(&mut session, args.io.output.as_deref()).await
    }

    async fn upscale(&self, args: UpscaleArgs) -> Result<PathBuf> {
        let mut session = ToolSession::<Upscale>::new();
        session.configure(UpscaleParams { scale: args.scale })?;
        self.upload(&mut session, &args.io.input).await?;
        if session.params().scale != args.scale {
            self.notifier.notify(&Toast::info(format!(
                "{}x would exceed the size limit, using {}x",
                args.scale.factor(),
                session.params().scale.factor()
            )));
        }
        self.process(&mut session).await?;
        self.download(&mut session, args.io.output.as_deref()).await
    }

    async fn upload<T: ImageTool>(
        &self,
        session: &mut ToolSession<T>,
        input: &Path,
    ) -> Result<SourceImage> {
        let image = LocalImage::from_path(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
        let completion = session.upload(&self.api, image).await;
        let source = self.settle(completion)?;
        tracing::info!(file = %input.display(), asset = %source.asset, "uploaded");
        Ok(source)
    }

    async fn process<T: ImageTool>(&self, session: &mut ToolSession<T>) -> Result<()> {
        let completion = session.process(&self.api).await;
        self.settle(completion)?;
        self.notifier.notify(&Toast::processed(T::KIND));
        Ok(())
    }

    async fn download<T: ImageTool>(
        &self,
        session: &mut ToolSession<T>,
        output: Option<&Path>,
    ) -> Result<PathBuf> {
        let file = match session.download(&self.api).await {
            Ok(file) => file,
            Err(err) => return Err(self.report(err)),
        };
        let path = resolve_output_path(
            output,
            self.config.download_dir.as_deref(),
            &file.file_name,
        );
        output::write_file(&path, &file.bytes)?;
        self.notifier
            .notify(&Toast::success(format!("saved {}", path.display())));
        Ok(path)
    }

    fn settle<R>(&self, completion: Result<Completion<R>, SessionError>) -> Result<R> {
        match completion {
            Ok(Completion::Applied(value)) => Ok(value),
            Ok(Completion::Stale) => bail!("session changed while the request was in flight"),
            Err(err) => Err(self.report(err)),
        }
    }

    fn report(&self, err: SessionError) -> anyhow::Error {
        self.notifier.notify(&Toast::from_session_error(&err));
        err.into()
    }
}
