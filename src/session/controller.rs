use std::marker::PhantomData;

use image::{GenericImageView, RgbaImage};

use super::error::{SessionError, SessionResult, ValidationError};
use super::machine::SessionMachine;
use super::state::{PhaseTransition, SessionEvent, SessionPhase};
use super::tools::{self, ImageTool, RemoveBackground, Upscale};
use super::upload::{validate_upload, LocalImage, SourceImage, ValidatedUpload};
use super::ToolKind;
use crate::api::{ApiResult, AssetRef, ImageApi, ProcessRequest, ScaleFactor, UploadedAsset};
use crate::geometry::PixelSize;
use crate::preview::{self, PreviewError};

/// Processed image held by a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultAsset {
    pub asset: AssetRef,
    pub image_url: String,
    pub dimensions: PixelSize,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Outcome of a guarded completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    Applied(T),
    /// The session moved on while the request was in flight.
    Stale,
}

impl<T> Completion<T> {
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Stale => None,
        }
    }
}

#[derive(Debug)]
pub struct PendingUpload {
    generation: u64,
    upload: ValidatedUpload,
}

impl PendingUpload {
    pub fn upload(&self) -> &ValidatedUpload {
        &self.upload
    }
}

#[derive(Debug)]
pub struct PendingProcess {
    generation: u64,
    request: ProcessRequest,
}

impl PendingProcess {
    pub fn request(&self) -> &ProcessRequest {
        &self.request
    }
}

/// One tool's upload, configure, process and download flow.
#[derive(Debug)]
pub struct ToolSession<T: ImageTool> {
    machine: SessionMachine,
    params: T::Params,
    source: Option<SourceImage>,
    result: Option<ResultAsset>,
    generation: u64,
    last_error: Option<String>,
    tool: PhantomData<T>,
}

impl<T: ImageTool> Default for ToolSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ImageTool> ToolSession<T> {
    pub fn new() -> Self {
        Self {
            machine: SessionMachine::new(),
            params: T::Params::default(),
            source: None,
            result: None,
            generation: 0,
            last_error: None,
            tool: PhantomData,
        }
    }

    pub fn kind(&self) -> ToolKind {
        T::KIND
    }

    pub fn phase(&self) -> SessionPhase {
        self.machine.phase()
    }

    pub fn history(&self) -> &[PhaseTransition] {
        self.machine.history()
    }

    pub fn params(&self) -> &T::Params {
        &self.params
    }

    pub fn source(&self) -> Option<&SourceImage> {
        self.source.as_ref()
    }

    pub fn result(&self) -> Option<&ResultAsset> {
        self.result.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Message of the last failed network request, verbatim.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn is_busy(&self) -> bool {
        self.machine.phase().is_processing()
    }

    fn ensure_idle(&self) -> SessionResult<()> {
        if self.is_busy() {
            tracing::warn!(tool = %T::KIND, "request rejected while processing");
            return Err(SessionError::Busy { tool: T::KIND });
        }
        Ok(())
    }

    fn record_failure(&mut self, err: &SessionError) {
        tracing::warn!(tool = %T::KIND, error = %err, "request failed");
        self.last_error = Some(err.to_string());
    }

    pub fn begin_upload(&mut self, image: LocalImage) -> SessionResult<PendingUpload> {
        self.ensure_idle()?;
        let upload = validate_upload(image)?;
        tracing::debug!(
            tool = %T::KIND,
            file = %upload.file.file_name,
            bytes = upload.file.bytes.len(),
            "upload validated"
        );
        Ok(PendingUpload {
            generation: self.generation,
            upload,
        })
    }

    pub fn complete_upload(
        &mut self,
        pending: PendingUpload,
        outcome: ApiResult<UploadedAsset>,
    ) -> SessionResult<Completion<SourceImage>> {
        if pending.generation != self.generation {
            tracing::debug!(tool = %T::KIND, "discarding stale upload response");
            return Ok(Completion::Stale);
        }
        let uploaded = match outcome {
            Ok(uploaded) => uploaded,
            Err(err) => {
                let err = SessionError::from(err);
                self.record_failure(&err);
                return Err(err);
            }
        };
        self.ensure_idle()?;

        let ValidatedUpload { file, dimensions } = pending.upload;
        if let (Some(width), Some(height)) = (uploaded.width, uploaded.height) {
            if PixelSize::new(width, height) != dimensions {
                tracing::debug!(width, height, ?dimensions, "server reported different dimensions");
            }
        }
        let source = SourceImage {
            asset: uploaded.filename,
            file_name: file.file_name,
            mime: file.mime,
            byte_len: file.bytes.len() as u64,
            dimensions,
        };

        self.machine.transition(SessionEvent::UploadCompleted)?;
        self.generation += 1;
        self.result = None;
        self.last_error = None;
        T::on_source_loaded(&mut self.params, dimensions);
        self.source = Some(source.clone());
        tracing::info!(
            tool = %T::KIND,
            asset = %source.asset,
            width = dimensions.width,
            height = dimensions.height,
            "source uploaded"
        );
        Ok(Completion::Applied(source))
    }

    pub async fn upload<A>(
        &mut self,
        api: &A,
        image: LocalImage,
    ) -> SessionResult<Completion<SourceImage>>
    where
        A: ImageApi + ?Sized,
    {
        let pending = self.begin_upload(image)?;
        let outcome = api.upload(&pending.upload.file).await;
        self.complete_upload(pending, outcome)
    }

    /// Replaces the tool parameters. Before an upload they are stored for later.
    pub fn configure(&mut self, params: T::Params) -> SessionResult<()> {
        self.update_params(|current| *current = params)
    }

    pub fn update_params(&mut self, update: impl FnOnce(&mut T::Params)) -> SessionResult<()> {
        self.ensure_idle()?;
        update(&mut self.params);
        if self.machine.phase().has_source() {
            self.machine.transition(SessionEvent::Configure)?;
        }
        tracing::debug!(tool = %T::KIND, params = ?self.params, "parameters updated");
        Ok(())
    }

    pub fn begin_process(&mut self) -> SessionResult<PendingProcess> {
        self.ensure_idle()?;
        let source = self
            .source
            .as_ref()
            .ok_or(ValidationError::NoSourceImage)?;
        T::validate(&self.params, source)?;
        let request = T::request(source.asset.clone(), &self.params);

        self.machine.transition(SessionEvent::Process)?;
        tracing::debug!(
            tool = %T::KIND,
            endpoint = request.endpoint(),
            asset = %request.asset(),
            generation = self.generation,
            "process request issued"
        );
        Ok(PendingProcess {
            generation: self.generation,
            request,
        })
    }

    pub fn complete_process(
        &mut self,
        pending: PendingProcess,
        outcome: SessionResult<ResultAsset>,
    ) -> SessionResult<Completion<ResultAsset>> {
        if pending.generation != self.generation || !self.is_busy() {
            tracing::debug!(
                tool = %T::KIND,
                issued = pending.generation,
                current = self.generation,
                "discarding stale process response"
            );
            return Ok(Completion::Stale);
        }

        let result = match outcome {
            Ok(result) => result,
            Err(err) => {
                self.record_failure(&err);
                self.machine.transition(SessionEvent::ProcessFailed)?;
                return Err(err);
            }
        };

        self.machine.transition(SessionEvent::ProcessSucceeded)?;
        self.last_error = None;
        if T::CHAINS_SOURCE {
            if let Some(source) = self.source.as_mut() {
                source.asset = result.asset.clone();
                source.byte_len = result.bytes.len() as u64;
                source.dimensions = result.dimensions;
                T::on_source_loaded(&mut self.params, result.dimensions);
            }
        }
        self.result = Some(result.clone());
        tracing::info!(
            tool = %T::KIND,
            asset = %result.asset,
            width = result.dimensions.width,
            height = result.dimensions.height,
            "processing finished"
        );
        Ok(Completion::Applied(result))
    }

    pub async fn process<A>(&mut self, api: &A) -> SessionResult<Completion<ResultAsset>>
    where
        A: ImageApi + ?Sized,
    {
        let pending = self.begin_process()?;
        let outcome = execute_process(api, &pending.request).await;
        self.complete_process(pending, outcome)
    }

    pub async fn download<A>(&mut self, api: &A) -> SessionResult<DownloadedFile>
    where
        A: ImageApi + ?Sized,
    {
        self.ensure_idle()?;
        let asset = self
            .result
            .as_ref()
            .map(|result| result.asset.clone())
            .ok_or(ValidationError::NoResult)?;
        let generation = self.generation;

        let bytes = match api.download(&asset).await {
            Ok(bytes) => bytes,
            Err(err) => {
                let err = SessionError::from(err);
                self.record_failure(&err);
                return Err(err);
            }
        };
        if generation == self.generation && self.machine.can_transition(SessionEvent::Download) {
            self.machine.transition(SessionEvent::Download)?;
        }
        tracing::info!(tool = %T::KIND, asset = %asset, bytes = bytes.len(), "result downloaded");
        Ok(DownloadedFile {
            file_name: asset.as_str().to_string(),
            bytes,
        })
    }

    pub fn reset(&mut self) {
        if let Err(err) = self.machine.transition(SessionEvent::Reset) {
            tracing::warn!(tool = %T::KIND, error = %err, "reset transition rejected");
        }
        self.generation += 1;
        self.source = None;
        self.result = None;
        self.last_error = None;
        self.params = T::Params::default();
        tracing::debug!(tool = %T::KIND, generation = self.generation, "session reset");
    }
}

impl ToolSession<RemoveBackground> {
    /// Result composited over the configured backdrop.
    pub fn overlay_preview(&self) -> Option<Result<RgbaImage, PreviewError>> {
        let result = self.result.as_ref()?;
        Some(
            preview::decode_image(&result.bytes)
                .map(|image| preview::composite_overlay(&image, self.params.overlay)),
        )
    }
}

impl ToolSession<Upscale> {
    /// Scale choices for the current source; all enabled before an upload.
    pub fn scale_options(&self) -> [(ScaleFactor, bool); 3] {
        match &self.source {
            Some(source) => tools::scale_options(source.dimensions),
            None => ScaleFactor::ALL.map(|scale| (scale, true)),
        }
    }
}

/// Runs a processing request and loads the produced image.
pub async fn execute_process<A>(api: &A, request: &ProcessRequest) -> SessionResult<ResultAsset>
where
    A: ImageApi + ?Sized,
{
    let processed = api.process(request).await?;
    let asset_load = |message: String| SessionError::AssetLoad { message };
    let bytes = api
        .fetch_asset(&processed.image_url)
        .await
        .map_err(|err| asset_load(err.to_string()))?;
    let image = preview::decode_image(&bytes).map_err(|err| asset_load(err.to_string()))?;
    let (width, height) = image.dimensions();
    Ok(ResultAsset {
        asset: processed.filename,
        image_url: processed.image_url,
        dimensions: PixelSize::new(width, height),
        bytes,
    })
}
