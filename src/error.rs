use crate::features::error::{CameraError, GeolocationError, MediaError, PickerError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The primary error type for the geo-capture crate.
///
/// Acquisition problems never show up here: they become a [`CaptureFailure`] on the
/// session. This type covers setting the pipeline up.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Capture configuration could not be parsed: {0}")]
    Config(#[from] serde_json::Error),

    #[error("maxDistanceMeters must be finite and non-negative, got {0}")]
    InvalidMaxDistance(f64),

    #[error("Anchor location '{0}' has coordinates outside the valid range")]
    InvalidAnchor(String),

    #[error("Geolocation timeout must be greater than zero")]
    InvalidTimeout,
}

/// Why a capture attempt ended in `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    PermissionDenied,
    DeviceUnavailable,
    DeviceBusy,
    InsecureContext,
    Timeout,
    PositionUnavailable,
    InvalidInput,
    Cancelled,
    Unknown,
}

/// A terminal failure: the kind plus a remediation hint for display.
#[derive(Error, Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
#[error("{kind:?}: {hint}")]
pub struct CaptureFailure {
    pub kind: ErrorKind,
    pub hint: String,
}

impl CaptureFailure {
    pub fn new(kind: ErrorKind, hint: impl Into<String>) -> Self {
        Self {
            kind,
            hint: hint.into(),
        }
    }

    pub(crate) fn simulation_disabled() -> Self {
        Self::new(
            ErrorKind::InvalidInput,
            "Simulated capture is disabled for this form.",
        )
    }
}

impl From<&CameraError> for CaptureFailure {
    fn from(err: &CameraError) -> Self {
        let kind = match err {
            CameraError::PermissionDenied => ErrorKind::PermissionDenied,
            CameraError::DeviceNotFound => ErrorKind::DeviceUnavailable,
            CameraError::DeviceBusy => ErrorKind::DeviceBusy,
            CameraError::InsecureContext => ErrorKind::InsecureContext,
            CameraError::Unknown(_) => ErrorKind::Unknown,
        };
        Self::new(kind, err.hint())
    }
}

impl From<GeolocationError> for CaptureFailure {
    fn from(err: GeolocationError) -> Self {
        let kind = match err {
            GeolocationError::PermissionDenied => ErrorKind::PermissionDenied,
            GeolocationError::PositionUnavailable => ErrorKind::PositionUnavailable,
            GeolocationError::Timeout => ErrorKind::Timeout,
            GeolocationError::Unsupported => ErrorKind::DeviceUnavailable,
        };
        Self::new(kind, err.hint())
    }
}

impl From<&MediaError> for CaptureFailure {
    fn from(err: &MediaError) -> Self {
        match err {
            MediaError::Camera(camera) => camera.into(),
            MediaError::Picker(PickerError::Cancelled) => {
                Self::new(ErrorKind::Cancelled, "No photo was selected.")
            }
            MediaError::Picker(PickerError::Io(_)) => Self::new(
                ErrorKind::Unknown,
                "The selected file could not be read. Try another photo.",
            ),
            MediaError::UnsupportedFileType(_) => Self::new(
                ErrorKind::InvalidInput,
                "Only image files can be submitted as evidence.",
            ),
            MediaError::Encoding(_) | MediaError::FrameSize { .. } => Self::new(
                ErrorKind::Unknown,
                "The captured frame could not be processed. Try again.",
            ),
            MediaError::Superseded => Self::new(
                ErrorKind::Unknown,
                "The capture was replaced by a newer attempt.",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_errors_map_to_kinds_with_hints() {
        let busy = CaptureFailure::from(&CameraError::DeviceBusy);
        assert_eq!(busy.kind, ErrorKind::DeviceBusy);
        assert!(busy.hint.contains("already in use"));

        let insecure = CaptureFailure::from(&CameraError::InsecureContext);
        assert_eq!(insecure.kind, ErrorKind::InsecureContext);
        assert!(insecure.hint.contains("secure"));

        let missing = CaptureFailure::from(&CameraError::DeviceNotFound);
        assert_eq!(missing.kind, ErrorKind::DeviceUnavailable);
    }

    #[test]
    fn test_geolocation_unsupported_is_device_unavailable() {
        let failure = CaptureFailure::from(GeolocationError::Unsupported);
        assert_eq!(failure.kind, ErrorKind::DeviceUnavailable);
        assert!(!failure.hint.is_empty());
    }

    #[test]
    fn test_non_image_file_is_invalid_input() {
        let err = MediaError::UnsupportedFileType("text/plain".to_string());
        assert_eq!(CaptureFailure::from(&err).kind, ErrorKind::InvalidInput);
    }

    #[test]
    fn test_cancelled_picker_is_cancelled() {
        let err = MediaError::Picker(PickerError::Cancelled);
        assert_eq!(CaptureFailure::from(&err).kind, ErrorKind::Cancelled);
    }

    #[test]
    fn test_host_names_map_onto_camera_taxonomy() {
        assert_eq!(
            CameraError::from_host_name("NotReadableError", "in use"),
            CameraError::DeviceBusy
        );
        assert_eq!(
            CameraError::from_host_name("NotAllowedError", ""),
            CameraError::PermissionDenied
        );
        assert_eq!(
            CameraError::from_host_name("SecurityError", ""),
            CameraError::InsecureContext
        );
        assert!(matches!(
            CameraError::from_host_name("WeirdError", "boom"),
            CameraError::Unknown(msg) if msg.contains("boom")
        ));
    }

    #[test]
    fn test_platform_codes_map_onto_geolocation_taxonomy() {
        assert_eq!(GeolocationError::from_code(1), GeolocationError::PermissionDenied);
        assert_eq!(GeolocationError::from_code(2), GeolocationError::PositionUnavailable);
        assert_eq!(GeolocationError::from_code(3), GeolocationError::Timeout);
    }
}
