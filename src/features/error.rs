use thiserror::Error;

/// Failures of a live capture stream, normalized from whatever the host reports.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera permission was denied")]
    PermissionDenied,

    #[error("No camera device was found")]
    DeviceNotFound,

    #[error("The camera is already in use")]
    DeviceBusy,

    #[error("Camera access requires a secure context")]
    InsecureContext,

    #[error("Camera failure: {0}")]
    Unknown(String),
}

impl CameraError {
    /// Maps a host error name (as raised by `getUserMedia`-style APIs) onto the taxonomy.
    pub fn from_host_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" => Self::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                Self::DeviceNotFound
            }
            "NotReadableError" | "TrackStartError" | "AbortError" => Self::DeviceBusy,
            "SecurityError" => Self::InsecureContext,
            _ => Self::Unknown(format!("{name}: {message}")),
        }
    }

    /// Text the caller can show next to the failure.
    pub fn hint(&self) -> &'static str {
        match self {
            Self::PermissionDenied => {
                "Allow camera access in your browser or system settings, then try again."
            }
            Self::DeviceNotFound => "No camera was detected. Connect one or upload a photo instead.",
            Self::DeviceBusy => {
                "The camera is already in use by another application. Close it and try again."
            }
            Self::InsecureContext => {
                "Camera access needs a secure connection. Enable HTTPS or use localhost."
            }
            Self::Unknown(_) => "The camera could not be started. Try uploading a photo instead.",
        }
    }
}

/// Failures of a single position request.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Location permission was denied")]
    PermissionDenied,

    #[error("The device position is unavailable")]
    PositionUnavailable,

    #[error("Timed out waiting for the device position")]
    Timeout,

    #[error("Geolocation is not supported on this device")]
    Unsupported,
}

impl GeolocationError {
    /// Maps a platform numeric error code (1 = denied, 2 = unavailable, 3 = timeout).
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            3 => Self::Timeout,
            _ => Self::PositionUnavailable,
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Allow location access so the photo can be verified.",
            Self::PositionUnavailable => {
                "Your position could not be determined. Move to an open area and retry."
            }
            Self::Timeout => "Getting your location took too long. Check GPS signal and retry.",
            Self::Unsupported => "This device cannot report its location.",
        }
    }
}

/// Failures of the user file chooser.
#[derive(Error, Debug)]
pub enum PickerError {
    #[error("No file was selected")]
    Cancelled,

    #[error("I/O error while reading the selected file")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by either media acquirer variant.
#[derive(Error, Debug)]
pub enum MediaError {
    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Picker(#[from] PickerError),

    #[error("Selected file is not an image: {0}")]
    UnsupportedFileType(String),

    #[error("Failed to encode the captured frame")]
    Encoding(#[from] image::ImageError),

    #[error("Frame buffer does not match its {width}x{height} dimensions")]
    FrameSize { width: u32, height: u32 },

    /// The acquisition belongs to a generation that is no longer current.
    #[error("Acquisition was superseded by a newer capture")]
    Superseded,
}

#[derive(Error, Debug)]
pub enum DataUrlError {
    #[error("Unsupported media type for data URL generation: {0}")]
    UnsupportedFileType(String),

    #[error("Image processing failed")]
    ImageProcessing(#[from] image::ImageError),
}
