//! Ready-made host providers.
//!
//! Real camera and geolocation access live in the embedding host. These cover the cases
//! that need no hardware: reading a file from disk, a known fixed position, and hosts
//! where access is blocked outright (the situation the simulation fallback exists for).
use crate::features::error::{CameraError, GeolocationError, PickerError};
use crate::features::geolocation::{GeolocationProvider, PermissionState, PositionOptions};
use crate::features::media::{CameraProvider, CameraStream, FilePicker, Frame, PickedFile, StreamConstraints};
use crate::structs::Coordinate;
use std::path::PathBuf;
use tracing::debug;

/// A host without a usable camera.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

/// Stream type of [`NoCamera`]. Cannot be constructed.
#[derive(Debug)]
pub enum NoStream {}

impl CameraStream for NoStream {
    async fn ready(&self) -> Result<(), CameraError> {
        match *self {}
    }

    fn snapshot(&self) -> Result<Frame, CameraError> {
        match *self {}
    }

    fn stop(&self) {
        match *self {}
    }
}

impl CameraProvider for NoCamera {
    type Stream = NoStream;

    async fn open_stream(&self, _constraints: &StreamConstraints) -> Result<NoStream, CameraError> {
        Err(CameraError::DeviceNotFound)
    }
}

/// A host without location services.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoGeolocation;

impl GeolocationProvider for NoGeolocation {
    fn is_supported(&self) -> bool {
        false
    }

    async fn permission_state(&self) -> PermissionState {
        PermissionState::Denied
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        Err(GeolocationError::Unsupported)
    }
}

/// Reports the same position every time, e.g. a manually entered location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedPosition {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
}

impl FixedPosition {
    pub fn new(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
        }
    }
}

impl GeolocationProvider for FixedPosition {
    async fn permission_state(&self) -> PermissionState {
        PermissionState::Granted
    }

    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinate, GeolocationError> {
        Ok(Coordinate::now(self.latitude, self.longitude, self.accuracy))
    }
}

/// "Picks" a file that was chosen up front, e.g. from the command line.
#[derive(Debug, Clone)]
pub struct PathFilePicker {
    path: PathBuf,
}

impl PathFilePicker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FilePicker for PathFilePicker {
    async fn pick(&self) -> Result<PickedFile, PickerError> {
        debug!(path = %self.path.display(), "Reading selected file");
        let data = tokio::fs::read(&self.path).await?;
        let name = self
            .path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        Ok(PickedFile {
            name,
            declared_mime: None,
            data,
        })
    }
}
