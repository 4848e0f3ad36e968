use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A device-reported position. Produced once by an acquirer and never mutated.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius in meters, as reported by the provider.
    pub accuracy: f64,
    pub captured_at: DateTime<Utc>,
}

impl Coordinate {
    /// Builds a coordinate stamped with the current time.
    pub fn now(latitude: f64, longitude: f64, accuracy: f64) -> Self {
        Self {
            latitude,
            longitude,
            accuracy,
            captured_at: Utc::now(),
        }
    }
}

/// The place a captured artifact is expected to be taken at.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl AnchorLocation {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }
}

/// Outcome of comparing a captured coordinate against the anchor.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Great-circle distance to the anchor. Always `>= 0`; `0` when there is no anchor.
    ///
    /// Infinite when no distance could be measured. JSON has no infinity, so that case is
    /// written as `null` and read back as infinite.
    #[serde(deserialize_with = "null_as_unmeasured")]
    pub distance_meters: f64,
    pub coordinate: Option<Coordinate>,
}

fn null_as_unmeasured<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
}

/// Where an artifact came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Provenance {
    Camera,
    FileSelection,
    /// Synthetic output of the simulation fallback. Never genuine evidence.
    Simulated,
}

/// Raw image bytes produced by a media acquirer.
#[derive(Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaArtifact {
    pub data: Vec<u8>,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
    pub provenance: Provenance,
}

impl MediaArtifact {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            data,
            mime_type: mime_type.into(),
            created_at: Utc::now(),
            provenance,
        }
    }

    pub fn is_simulated(&self) -> bool {
        self.provenance == Provenance::Simulated
    }
}

// The payload can be megabytes, so only its length is printed.
impl std::fmt::Debug for MediaArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaArtifact")
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .field("mime_type", &self.mime_type)
            .field("created_at", &self.created_at)
            .field("provenance", &self.provenance)
            .finish()
    }
}

/// What a session keeps of an artifact once the caller owns the artifact itself.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPreview {
    /// Small base64 JPEG for display. `None` if the artifact could not be decoded.
    pub data_url: Option<String>,
    pub mime_type: String,
    pub byte_length: usize,
    pub created_at: DateTime<Utc>,
    pub provenance: Provenance,
}
