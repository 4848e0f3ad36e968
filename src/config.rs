use crate::error::CaptureError;
use crate::features::geolocation::PositionOptions;
use crate::features::media::{FacingMode, StreamConstraints};
use crate::structs::AnchorLocation;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Caller-supplied settings for a capture form.
///
/// Deserializes from camelCase JSON; every field has a default, so `{}` is a valid config
/// with no location requirement.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaptureConfig {
    /// Where the photo should be taken. `None` means no location requirement.
    pub anchor_location: Option<AnchorLocation>,
    pub max_distance_meters: f64,
    /// Whether the form needs a successful, valid capture before it can be submitted.
    pub required: bool,
    /// Whether the caller may fall back to synthetic captures.
    pub allow_simulation: bool,
    pub geolocation: PositionOptions,
    pub prefer_rear_camera: bool,
    /// Bounding box of the preview thumbnail kept on the session.
    pub preview_max_size: (u32, u32),
    /// Seeds the simulation random source. Unseeded runs draw from the OS.
    pub simulation_seed: Option<u64>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            anchor_location: None,
            max_distance_meters: 100.0,
            required: false,
            allow_simulation: false,
            geolocation: PositionOptions::default(),
            prefer_rear_camera: true,
            preview_max_size: (64, 64),
            simulation_seed: None,
        }
    }
}

impl CaptureConfig {
    pub fn from_json(json: &str) -> Result<Self, CaptureError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, CaptureError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), CaptureError> {
        if !self.max_distance_meters.is_finite() || self.max_distance_meters < 0.0 {
            return Err(CaptureError::InvalidMaxDistance(self.max_distance_meters));
        }
        if let Some(anchor) = &self.anchor_location {
            let lat_ok = anchor.latitude.is_finite() && anchor.latitude.abs() <= 90.0;
            let lon_ok = anchor.longitude.is_finite() && anchor.longitude.abs() <= 180.0;
            if !lat_ok || !lon_ok {
                return Err(CaptureError::InvalidAnchor(anchor.name.clone()));
            }
        }
        if self.geolocation.timeout_ms == 0 {
            return Err(CaptureError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn stream_constraints(&self) -> StreamConstraints {
        StreamConstraints {
            facing: if self.prefer_rear_camera {
                FacingMode::Environment
            } else {
                FacingMode::User
            },
        }
    }
}
