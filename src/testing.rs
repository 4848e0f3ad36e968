//! In-crate fakes for the host providers.
//!
//! Each fake counts what it was asked to do and can hold a call open on a oneshot gate,
//! which is how tests line up overlapping captures.
use crate::features::error::{CameraError, GeolocationError, PickerError};
use crate::features::geolocation::{GeolocationProvider, PermissionState, PositionOptions};
use crate::features::media::{
    CameraProvider, CameraStream, FacingMode, FilePicker, Frame, PickedFile, StreamConstraints,
};
use crate::structs::Coordinate;
use crate::utils::lock;
use image::{ImageFormat, Rgb, RgbImage};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([200, 120, 40]));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

async fn wait(gate: Option<oneshot::Receiver<()>>) {
    if let Some(gate) = gate {
        let _ = gate.await;
    }
}

// --- Camera ---

struct CameraState {
    failure: Option<CameraError>,
    permission: PermissionState,
    open_streams: AtomicUsize,
    opened: AtomicUsize,
    open_gate: Mutex<Option<oneshot::Receiver<()>>>,
    ready_gate: Mutex<Option<oneshot::Receiver<()>>>,
    last_facing: Mutex<Option<FacingMode>>,
}

#[derive(Clone)]
pub(crate) struct FakeCamera {
    state: Arc<CameraState>,
}

impl FakeCamera {
    pub(crate) fn new() -> Self {
        Self::build(None, PermissionState::Granted)
    }

    pub(crate) fn failing(err: CameraError) -> Self {
        Self::build(Some(err), PermissionState::Prompt)
    }

    fn build(failure: Option<CameraError>, permission: PermissionState) -> Self {
        Self {
            state: Arc::new(CameraState {
                failure,
                permission,
                open_streams: AtomicUsize::new(0),
                opened: AtomicUsize::new(0),
                open_gate: Mutex::new(None),
                ready_gate: Mutex::new(None),
                last_facing: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn with_permission(self, permission: PermissionState) -> Self {
        Self::build(self.state.failure.clone(), permission)
    }

    /// Holds the next `open_stream` call until the sender fires or drops.
    pub(crate) fn gate_open(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *lock(&self.state.open_gate) = Some(rx);
        tx
    }

    /// Holds the next opened stream's `ready` until the sender fires or drops.
    pub(crate) fn gate_ready(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *lock(&self.state.ready_gate) = Some(rx);
        tx
    }

    /// Streams opened and not yet stopped.
    pub(crate) fn open_streams(&self) -> usize {
        self.state.open_streams.load(Ordering::SeqCst)
    }

    /// Total successful `open_stream` calls.
    pub(crate) fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn last_facing(&self) -> Option<FacingMode> {
        *lock(&self.state.last_facing)
    }
}

pub(crate) struct FakeStream {
    camera: Arc<CameraState>,
    stopped: AtomicBool,
    ready_gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl CameraStream for FakeStream {
    async fn ready(&self) -> Result<(), CameraError> {
        let gate = lock(&self.ready_gate).take();
        wait(gate).await;
        Ok(())
    }

    fn snapshot(&self) -> Result<Frame, CameraError> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(CameraError::Unknown("stream stopped".to_string()));
        }
        let (width, height) = (32, 24);
        Ok(Frame {
            width,
            height,
            rgb: vec![90; (width * height * 3) as usize],
        })
    }

    fn stop(&self) {
        if !self.stopped.swap(true, Ordering::SeqCst) {
            self.camera.open_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl CameraProvider for FakeCamera {
    type Stream = FakeStream;

    async fn permission_state(&self) -> PermissionState {
        self.state.permission
    }

    async fn open_stream(&self, constraints: &StreamConstraints) -> Result<FakeStream, CameraError> {
        *lock(&self.state.last_facing) = Some(constraints.facing);
        let gate = lock(&self.state.open_gate).take();
        wait(gate).await;

        if let Some(err) = &self.state.failure {
            return Err(err.clone());
        }
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.open_streams.fetch_add(1, Ordering::SeqCst);
        let ready_gate = lock(&self.state.ready_gate).take();
        Ok(FakeStream {
            camera: Arc::clone(&self.state),
            stopped: AtomicBool::new(false),
            ready_gate: Mutex::new(ready_gate),
        })
    }
}

// --- Geolocation ---

type Position = Result<(f64, f64), GeolocationError>;

struct Step {
    position: Position,
    gate: Option<oneshot::Receiver<()>>,
}

struct GeolocationState {
    supported: bool,
    permission: Mutex<PermissionState>,
    fallback: Position,
    script: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
}

/// Answers position requests from a script, then from a fallback.
#[derive(Clone)]
pub(crate) struct ScriptedGeolocation {
    state: Arc<GeolocationState>,
}

impl ScriptedGeolocation {
    fn build(supported: bool, fallback: Position) -> Self {
        Self {
            state: Arc::new(GeolocationState {
                supported,
                permission: Mutex::new(PermissionState::Granted),
                fallback,
                script: Mutex::new(VecDeque::new()),
                calls: AtomicUsize::new(0),
            }),
        }
    }

    pub(crate) fn fixed(latitude: f64, longitude: f64) -> Self {
        Self::build(true, Ok((latitude, longitude)))
    }

    pub(crate) fn failing(err: GeolocationError) -> Self {
        Self::build(true, Err(err))
    }

    pub(crate) fn unsupported() -> Self {
        Self::build(false, Err(GeolocationError::Unsupported))
    }

    /// Every call hangs until the returned sender fires.
    pub(crate) fn gated(latitude: f64, longitude: f64) -> (Self, oneshot::Sender<()>) {
        let provider = Self::fixed(latitude, longitude);
        let gate = provider.then_gated(latitude, longitude);
        (provider, gate)
    }

    pub(crate) fn with_permission(self, permission: PermissionState) -> Self {
        *lock(&self.state.permission) = permission;
        self
    }

    /// Queues an answer that is held until the returned sender fires.
    pub(crate) fn then_gated(&self, latitude: f64, longitude: f64) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        lock(&self.state.script).push_back(Step {
            position: Ok((latitude, longitude)),
            gate: Some(rx),
        });
        tx
    }

    pub(crate) fn calls(&self) -> usize {
        self.state.calls.load(Ordering::SeqCst)
    }
}

impl GeolocationProvider for ScriptedGeolocation {
    fn is_supported(&self) -> bool {
        self.state.supported
    }

    async fn permission_state(&self) -> PermissionState {
        *lock(&self.state.permission)
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        self.state.calls.fetch_add(1, Ordering::SeqCst);
        let step = lock(&self.state.script).pop_front();
        let (position, gate) = match step {
            Some(step) => (step.position, step.gate),
            None => (self.state.fallback, None),
        };
        wait(gate).await;
        position.map(|(latitude, longitude)| Coordinate::now(latitude, longitude, 8.0))
    }
}

// --- Files ---

#[derive(Clone)]
pub(crate) struct FakePicker {
    result: Result<PickedFile, ()>,
    picks: Arc<AtomicUsize>,
}

impl FakePicker {
    pub(crate) fn image() -> Self {
        Self::file(PickedFile {
            name: "evidence.png".to_string(),
            declared_mime: Some("image/png".to_string()),
            data: png_bytes(48, 32),
        })
    }

    pub(crate) fn text() -> Self {
        Self::file(PickedFile {
            name: "notes.txt".to_string(),
            declared_mime: Some("text/plain".to_string()),
            data: b"not a photo".to_vec(),
        })
    }

    pub(crate) fn cancelled() -> Self {
        Self {
            result: Err(()),
            picks: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn file(file: PickedFile) -> Self {
        Self {
            result: Ok(file),
            picks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn picks(&self) -> usize {
        self.picks.load(Ordering::SeqCst)
    }
}

impl FilePicker for FakePicker {
    async fn pick(&self) -> Result<PickedFile, PickerError> {
        self.picks.fetch_add(1, Ordering::SeqCst);
        self.result.clone().map_err(|()| PickerError::Cancelled)
    }
}
