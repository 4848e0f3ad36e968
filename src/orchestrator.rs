use crate::config::CaptureConfig;
use crate::error::{CaptureError, CaptureFailure, ErrorKind};
use crate::features::data_url::preview_of;
use crate::features::error::MediaError;
use crate::features::geolocation::{
    GeolocationAcquirer, GeolocationProvider, PermissionState,
};
use crate::features::media::{
    CameraProvider, FilePicker, FileSelectionAcquirer, LiveCaptureAcquirer, MediaAcquirer,
};
use crate::features::simulation::{SimulatedCapture, SimulationFallback};
use crate::session::{
    CapturePhase, CaptureSession, CaptureSource, Generation, GenerationClock, TransitionError,
};
use crate::structs::{Coordinate, MediaArtifact, MediaPreview, ValidationResult};
use crate::utils::lock;
use bon::bon;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Receives the artifact and coordinate of every terminal transition, exactly once each.
/// Both are `None` when the attempt failed.
pub type ResultCallback = Box<dyn Fn(Option<MediaArtifact>, Option<Coordinate>) + Send + Sync>;

/// What a single call to [`CaptureOrchestrator::capture`] ended with.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureOutcome {
    Succeeded {
        validation: ValidationResult,
        preview: MediaPreview,
    },
    Failed(CaptureFailure),
    /// A newer capture or a reset took over. Nothing was recorded or reported.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Permissions {
    pub camera: PermissionState,
    pub geolocation: PermissionState,
}

struct Inner<C: CameraProvider, P, G> {
    config: CaptureConfig,
    clock: Arc<GenerationClock>,
    live: LiveCaptureAcquirer<C>,
    files: FileSelectionAcquirer<P>,
    locator: GeolocationAcquirer<G>,
    simulator: Mutex<SimulationFallback<StdRng>>,
    session: Mutex<CaptureSession>,
    on_result: Option<ResultCallback>,
}

/// Drives capture attempts from request to a single terminal result.
///
/// Cheap to clone; clones share one session. A capture started while another is pending
/// supersedes it, and [`reset`](Self::reset) abandons whatever is in flight.
///
/// ```rust,no_run
/// # use geo_capture::{AnchorLocation, CaptureConfig, CaptureError, CaptureOrchestrator, CaptureSource};
/// # use geo_capture::providers::{FixedPosition, NoCamera, PathFilePicker};
/// # #[tokio::main]
/// # async fn main() -> Result<(), CaptureError> {
/// let config = CaptureConfig {
///     anchor_location: Some(AnchorLocation::new("Depot", 19.1136, 72.8697)),
///     ..CaptureConfig::default()
/// };
/// let orchestrator = CaptureOrchestrator::builder()
///     .camera(NoCamera)
///     .file_picker(PathFilePicker::new("photo.jpg"))
///     .geolocation(FixedPosition::new(19.1136, 72.8697, 10.0))
///     .config(config)
///     .build()?;
///
/// let outcome = orchestrator.capture(CaptureSource::File).await;
/// println!("{outcome:?}");
/// # Ok(())
/// # }
/// ```
pub struct CaptureOrchestrator<C: CameraProvider, P, G> {
    inner: Arc<Inner<C, P, G>>,
}

impl<C: CameraProvider, P, G> Clone for CaptureOrchestrator<C, P, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[bon]
impl<C, P, G> CaptureOrchestrator<C, P, G>
where
    C: CameraProvider,
    P: FilePicker,
    G: GeolocationProvider,
{
    /// Constructs an orchestrator via a builder.
    ///
    /// # Builder Arguments
    ///
    /// * `camera`, `file_picker`, `geolocation` - Host providers.
    /// * `config: CaptureConfig` - (Default: no anchor, 100 m, simulation off) Form settings.
    /// * `on_result: Option<ResultCallback>` - Called once per terminal transition.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    #[builder]
    pub fn new(
        camera: C,
        file_picker: P,
        geolocation: G,
        #[builder(default)] config: CaptureConfig,
        on_result: Option<ResultCallback>,
    ) -> Result<Self, CaptureError> {
        config.validate()?;

        let clock = Arc::new(GenerationClock::new());
        let simulator = match config.simulation_seed {
            Some(seed) => SimulationFallback::seeded(seed),
            None => SimulationFallback::from_os_rng(),
        };
        let session = CaptureSession::idle(clock.current());

        Ok(Self {
            inner: Arc::new(Inner {
                live: LiveCaptureAcquirer::new(
                    camera,
                    config.stream_constraints(),
                    Arc::clone(&clock),
                ),
                files: FileSelectionAcquirer::new(file_picker, Arc::clone(&clock)),
                locator: GeolocationAcquirer::new(geolocation, config.geolocation.clone()),
                simulator: Mutex::new(simulator),
                session: Mutex::new(session),
                config,
                clock,
                on_result,
            }),
        })
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.inner.config
    }

    /// Snapshot of the current session.
    pub fn session(&self) -> CaptureSession {
        lock(&self.inner.session).clone()
    }

    pub fn phase(&self) -> CapturePhase {
        lock(&self.inner.session).phase
    }

    /// Whether the form's `required` flag is met.
    pub fn is_satisfied(&self) -> bool {
        if !self.inner.config.required {
            return true;
        }
        let session = lock(&self.inner.session);
        session.phase == CapturePhase::Succeeded
            && session.validation.as_ref().is_some_and(|v| v.is_valid)
    }

    /// Cached permission grants. Never prompts.
    pub async fn permissions(&self) -> Permissions {
        Permissions {
            camera: self.inner.live.permission_state().await,
            geolocation: self.inner.locator.permission_state().await,
        }
    }

    /// Abandons the current attempt and returns to `Idle`.
    ///
    /// Any open camera stream is stopped before this returns. Results still in flight for
    /// the abandoned attempt are ignored when they arrive.
    pub fn reset(&self) {
        let mut session = lock(&self.inner.session);
        let generation = self.inner.clock.advance();
        self.release_media();
        *session = CaptureSession::idle(generation);
        info!(?generation, "Capture session reset");
    }

    /// Runs one capture attempt from `source` to a terminal result.
    ///
    /// The media source is opened first. Once it is open, the position is requested while
    /// the media is produced, and validation runs when both are in. If opening fails, no
    /// position is requested at all.
    pub async fn capture(&self, source: CaptureSource) -> CaptureOutcome {
        let generation = self.begin(source);
        info!(?generation, ?source, "Capture started");

        match source {
            CaptureSource::Camera => self.acquire(generation, &self.inner.live).await,
            CaptureSource::File => self.acquire(generation, &self.inner.files).await,
            CaptureSource::Simulated => self.simulate(generation),
        }
    }

    fn begin(&self, source: CaptureSource) -> Generation {
        let mut session = lock(&self.inner.session);
        let generation = self.inner.clock.advance();
        // One stream per session: whatever the previous attempt held goes first.
        self.release_media();
        *session = CaptureSession::start(generation, source);
        generation
    }

    fn release_media(&self) {
        self.inner.live.release();
        self.inner.files.release();
    }

    async fn acquire<M: MediaAcquirer>(&self, generation: Generation, media: &M) -> CaptureOutcome {
        if let Err(err) = media.open(generation).await {
            return self.media_failed(generation, &err);
        }

        let produced = media.produce(generation);
        let located = self.inner.locator.acquire(generation);
        tokio::pin!(produced, located);

        let mut location = None;
        let artifact = loop {
            tokio::select! {
                result = &mut produced => match result {
                    Ok(artifact) => break artifact,
                    Err(err) => return self.media_failed(generation, &err),
                },
                tagged = &mut located, if location.is_none() => location = Some(tagged),
            }
        };

        let location = match location {
            Some(tagged) => tagged,
            None => {
                if self.advance(generation, CapturePhase::RequestingLocation).is_err() {
                    return CaptureOutcome::Superseded;
                }
                located.await
            }
        };
        if !self.inner.clock.is_current(location.generation) {
            debug!(?generation, "Dropping position of a superseded capture");
            return CaptureOutcome::Superseded;
        }

        let coordinate = match location.value {
            Ok(coordinate) => Some(coordinate),
            Err(err) if self.inner.config.anchor_location.is_none() => {
                debug!(?generation, error = %err, "No anchor set, continuing without a position");
                None
            }
            Err(err) => return self.fail(generation, err.into()),
        };

        self.finish(generation, artifact, coordinate)
    }

    fn simulate(&self, generation: Generation) -> CaptureOutcome {
        if !self.inner.config.allow_simulation {
            return self.fail(generation, CaptureFailure::simulation_disabled());
        }

        let config = &self.inner.config;
        let simulated = lock(&self.inner.simulator)
            .simulate(config.anchor_location.as_ref(), config.max_distance_meters);
        let SimulatedCapture {
            coordinate,
            artifact,
        } = match simulated {
            Ok(capture) => capture,
            Err(err) => {
                warn!(?generation, error = %err, "Simulated artifact could not be rendered");
                return self.fail(
                    generation,
                    CaptureFailure::new(ErrorKind::Unknown, "Simulated capture failed."),
                );
            }
        };
        warn!(?generation, "Using simulated capture, result is not genuine evidence");

        if self.advance(generation, CapturePhase::RequestingLocation).is_err() {
            return CaptureOutcome::Superseded;
        }
        self.finish(generation, artifact, Some(coordinate))
    }

    fn finish(
        &self,
        generation: Generation,
        artifact: MediaArtifact,
        coordinate: Option<Coordinate>,
    ) -> CaptureOutcome {
        if self.advance(generation, CapturePhase::Validating).is_err() {
            return CaptureOutcome::Superseded;
        }

        if !self.inner.clock.is_current(generation) {
            debug!(?generation, "Capture superseded before validation");
            return CaptureOutcome::Superseded;
        }

        let config = &self.inner.config;
        let validation = ValidationResult::evaluate(
            config.anchor_location.as_ref(),
            coordinate,
            config.max_distance_meters,
        );
        let preview = preview_of(&artifact, config.preview_max_size);

        let committed = lock(&self.inner.session).succeed(
            generation,
            preview.clone(),
            validation.clone(),
        );
        if let Err(err) = committed {
            debug!(?generation, error = %err, "Dropping validated result");
            return CaptureOutcome::Superseded;
        }

        info!(
            ?generation,
            is_valid = validation.is_valid,
            distance_meters = validation.distance_meters,
            simulated = artifact.is_simulated(),
            "Capture succeeded"
        );
        self.notify(Some(artifact), validation.coordinate.clone());
        CaptureOutcome::Succeeded {
            validation,
            preview,
        }
    }

    fn media_failed(&self, generation: Generation, err: &MediaError) -> CaptureOutcome {
        if matches!(err, MediaError::Superseded) {
            debug!(?generation, "Media acquisition superseded");
            return CaptureOutcome::Superseded;
        }
        self.fail(generation, err.into())
    }

    fn fail(&self, generation: Generation, failure: CaptureFailure) -> CaptureOutcome {
        let committed = lock(&self.inner.session).fail(generation, failure.clone());
        if let Err(err) = committed {
            debug!(?generation, error = %err, "Dropping failure");
            return CaptureOutcome::Superseded;
        }

        warn!(?generation, kind = ?failure.kind, hint = %failure.hint, "Capture failed");
        self.notify(None, None);
        CaptureOutcome::Failed(failure)
    }

    fn advance(&self, generation: Generation, next: CapturePhase) -> Result<(), TransitionError> {
        let result = lock(&self.inner.session).advance(generation, next);
        match &result {
            Ok(()) => debug!(?generation, phase = ?next, "Capture phase changed"),
            Err(err) => debug!(?generation, error = %err, "Ignoring stale transition"),
        }
        result
    }

    fn notify(&self, artifact: Option<MediaArtifact>, coordinate: Option<Coordinate>) {
        if let Some(on_result) = &self.inner.on_result {
            on_result(artifact, coordinate);
        }
    }
}
