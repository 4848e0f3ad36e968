use crate::features::error::GeolocationError;
use crate::session::{Generation, Tagged};
use crate::structs::Coordinate;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Host-cached permission state for a capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum PermissionState {
    Granted,
    Denied,
    /// The host will ask the user on first use.
    Prompt,
}

/// Options for a single position request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u64,
    /// Oldest cached position the provider may return.
    pub maximum_age_ms: u64,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 10_000,
            maximum_age_ms: 0,
        }
    }
}

impl PositionOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// The device's location service.
pub trait GeolocationProvider: Send + Sync + 'static {
    fn is_supported(&self) -> bool {
        true
    }

    /// Idempotent check of the cached grant. Never prompts.
    fn permission_state(&self) -> impl Future<Output = PermissionState> + Send {
        async { PermissionState::Prompt }
    }

    /// Resolves the current position. May prompt the user on first use.
    fn current_position(
        &self,
        options: &PositionOptions,
    ) -> impl Future<Output = Result<Coordinate, GeolocationError>> + Send;
}

/// Issues one position request per call and tags the answer with its generation.
///
/// There is no retry, and an in-flight request cannot be cancelled; callers drop stale
/// answers by comparing the tag.
pub struct GeolocationAcquirer<G> {
    provider: G,
    options: PositionOptions,
}

impl<G: GeolocationProvider> GeolocationAcquirer<G> {
    pub fn new(provider: G, options: PositionOptions) -> Self {
        Self { provider, options }
    }

    pub async fn permission_state(&self) -> PermissionState {
        if !self.provider.is_supported() {
            return PermissionState::Denied;
        }
        self.provider.permission_state().await
    }

    pub async fn acquire(
        &self,
        generation: Generation,
    ) -> Tagged<Result<Coordinate, GeolocationError>> {
        Tagged::new(generation, self.locate(generation).await)
    }

    async fn locate(&self, generation: Generation) -> Result<Coordinate, GeolocationError> {
        if !self.provider.is_supported() {
            return Err(GeolocationError::Unsupported);
        }
        if self.provider.permission_state().await == PermissionState::Denied {
            debug!(?generation, "Location permission already denied, skipping request");
            return Err(GeolocationError::PermissionDenied);
        }

        debug!(?generation, options = ?self.options, "Requesting device position");
        // Providers are asked to honor the timeout; this bound holds even if one does not.
        match tokio::time::timeout(
            self.options.timeout(),
            self.provider.current_position(&self.options),
        )
        .await
        {
            Ok(Ok(coordinate)) => {
                debug!(
                    ?generation,
                    latitude = coordinate.latitude,
                    longitude = coordinate.longitude,
                    accuracy = coordinate.accuracy,
                    "Device position acquired"
                );
                Ok(coordinate)
            }
            Ok(Err(err)) => {
                warn!(?generation, error = %err, "Device position request failed");
                Err(err)
            }
            Err(_) => {
                warn!(?generation, timeout_ms = self.options.timeout_ms, "Device position request timed out");
                Err(GeolocationError::Timeout)
            }
        }
    }
}
