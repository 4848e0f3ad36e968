use crate::features::error::{CameraError, MediaError};
use crate::features::geolocation::PermissionState;
use crate::features::media::MediaAcquirer;
use crate::session::{Generation, GenerationClock};
use crate::structs::{MediaArtifact, Provenance};
use crate::utils::lock;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

const JPEG_QUALITY: u8 = 92;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FacingMode {
    /// Rear camera on phones.
    Environment,
    User,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamConstraints {
    /// Preferred, not required: hosts fall back to any camera.
    pub facing: FacingMode,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            facing: FacingMode::Environment,
        }
    }
}

/// A still frame at source resolution, packed RGB8.
#[derive(Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// An open camera stream.
pub trait CameraStream: Send + Sync + 'static {
    /// Resolves once the stream delivers frames.
    ///
    /// Need not resolve after [`stop`](Self::stop); the acquirer stops waiting on its own.
    fn ready(&self) -> impl Future<Output = Result<(), CameraError>> + Send;

    /// Grabs the current frame.
    fn snapshot(&self) -> Result<Frame, CameraError>;

    /// Stops every track of the stream. Must be idempotent.
    fn stop(&self);
}

/// The host's camera access.
pub trait CameraProvider: Send + Sync + 'static {
    type Stream: CameraStream;

    /// Idempotent check of the cached grant. Never prompts.
    fn permission_state(&self) -> impl Future<Output = PermissionState> + Send {
        async { PermissionState::Prompt }
    }

    fn open_stream(
        &self,
        constraints: &StreamConstraints,
    ) -> impl Future<Output = Result<Self::Stream, CameraError>> + Send;
}

struct ActiveStream<S> {
    generation: Generation,
    stream: Arc<S>,
    // Dropped with the slot, which wakes any `produce` still waiting on `ready`.
    released: watch::Sender<()>,
}

/// Live-capture variant of [`MediaAcquirer`].
///
/// Holds at most one open stream. Installing a stream stops the previous one, and a stream
/// whose generation went stale while it was opening is stopped on arrival.
pub struct LiveCaptureAcquirer<C: CameraProvider> {
    camera: C,
    constraints: StreamConstraints,
    clock: Arc<GenerationClock>,
    active: Mutex<Option<ActiveStream<C::Stream>>>,
}

impl<C: CameraProvider> LiveCaptureAcquirer<C> {
    pub fn new(camera: C, constraints: StreamConstraints, clock: Arc<GenerationClock>) -> Self {
        Self {
            camera,
            constraints,
            clock,
            active: Mutex::new(None),
        }
    }

    pub async fn permission_state(&self) -> PermissionState {
        self.camera.permission_state().await
    }

    pub fn has_open_stream(&self) -> bool {
        lock(&self.active).is_some()
    }

    fn install(&self, generation: Generation, stream: C::Stream) -> Result<(), MediaError> {
        let mut active = lock(&self.active);
        if !self.clock.is_current(generation) {
            debug!(?generation, "Camera stream opened for a stale capture, stopping it");
            stream.stop();
            return Err(MediaError::Superseded);
        }
        if let Some(previous) = active.take() {
            debug!(generation = ?previous.generation, "Stopping previous camera stream");
            previous.stream.stop();
        }
        let (released, _) = watch::channel(());
        *active = Some(ActiveStream {
            generation,
            stream: Arc::new(stream),
            released,
        });
        Ok(())
    }

    fn stream_for(
        &self,
        generation: Generation,
    ) -> Result<(Arc<C::Stream>, watch::Receiver<()>), MediaError> {
        match lock(&self.active).as_ref() {
            Some(active) if active.generation == generation => {
                Ok((Arc::clone(&active.stream), active.released.subscribe()))
            }
            _ => Err(MediaError::Superseded),
        }
    }

    /// Stops the stream and clears the slot if it still belongs to `generation`.
    fn close(&self, generation: Generation, stream: &C::Stream) {
        stream.stop();
        let mut active = lock(&self.active);
        if active.as_ref().is_some_and(|a| a.generation == generation) {
            *active = None;
        }
    }
}

impl<C: CameraProvider> MediaAcquirer for LiveCaptureAcquirer<C> {
    async fn open(&self, generation: Generation) -> Result<(), MediaError> {
        if self.camera.permission_state().await == PermissionState::Denied {
            return Err(CameraError::PermissionDenied.into());
        }
        debug!(?generation, facing = ?self.constraints.facing, "Opening camera stream");
        let stream = self.camera.open_stream(&self.constraints).await.map_err(|err| {
            warn!(?generation, error = %err, "Camera stream could not be opened");
            err
        })?;
        self.install(generation, stream)
    }

    async fn produce(&self, generation: Generation) -> Result<MediaArtifact, MediaError> {
        let (stream, mut released) = self.stream_for(generation)?;
        let ready = tokio::select! {
            ready = stream.ready() => Some(ready),
            _ = released.changed() => None,
        };

        let result = match ready {
            None => {
                debug!(?generation, "Camera stream released while warming up");
                Err(MediaError::Superseded)
            }
            Some(Ok(())) if !self.clock.is_current(generation) => Err(MediaError::Superseded),
            Some(Ok(())) => stream
                .snapshot()
                .map_err(MediaError::from)
                .and_then(encode_frame),
            Some(Err(err)) => Err(err.into()),
        };
        self.close(generation, &stream);

        let data = result?;
        debug!(?generation, bytes = data.len(), "Camera frame captured");
        Ok(MediaArtifact::new(data, "image/jpeg", Provenance::Camera))
    }

    fn release(&self) {
        if let Some(active) = lock(&self.active).take() {
            debug!(generation = ?active.generation, "Releasing camera stream");
            active.stream.stop();
        }
    }
}

fn encode_frame(frame: Frame) -> Result<Vec<u8>, MediaError> {
    let Frame { width, height, rgb } = frame;
    let buffer =
        RgbImage::from_raw(width, height, rgb).ok_or(MediaError::FrameSize { width, height })?;
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(buffer)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))?;
    Ok(bytes)
}
