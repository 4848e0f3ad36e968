//! # Geo Capture
//!
//! Capture a photo together with the device position, and check that it was taken close
//! enough to where it was supposed to be.
//!
//! This crate provides the state machine behind a "take a photo here" form field. The
//! host supplies camera, file-picker and geolocation access; the crate sequences them,
//! measures the great-circle distance to an anchor location and reports exactly one
//! result per attempt.
//!
//! ## Key Features
//!
//! - **Live capture**: Snapshot of a camera stream, rear camera preferred.
//! - **File selection**: Any image the user picks, type checked by content.
//! - **Distance validation**: Haversine distance against a configurable radius.
//! - **Simulation**: Opt-in synthetic captures for hosts that block camera or location.
//! - **Race safety**: A new capture or a reset makes every older result inert.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use geo_capture::providers::{FixedPosition, NoCamera, PathFilePicker};
//! use geo_capture::{CaptureConfig, CaptureOrchestrator, CaptureOutcome, CaptureSource};
//!
//! #[tokio::main]
//! async fn main() -> color_eyre::Result<()> {
//!     let config = CaptureConfig::from_json(
//!         r#"{ "anchorLocation": { "name": "Depot", "latitude": 52.09, "longitude": 5.12 } }"#,
//!     )?;
//!
//!     let orchestrator = CaptureOrchestrator::builder()
//!         .camera(NoCamera)
//!         .file_picker(PathFilePicker::new("assets/site.jpg"))
//!         .geolocation(FixedPosition::new(52.0901, 5.1201, 15.0))
//!         .config(config)
//!         .build()?;
//!
//!     if let CaptureOutcome::Succeeded { validation, .. } =
//!         orchestrator.capture(CaptureSource::File).await
//!     {
//!         println!("Valid: {}, {:.0} m away", validation.is_valid, validation.distance_meters);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod orchestrator;
pub mod providers;
pub mod session;
pub mod structs;
#[cfg(test)]
pub(crate) mod testing;
pub(crate) mod utils;

pub use config::CaptureConfig;
pub use error::{CaptureError, CaptureFailure, ErrorKind};
pub use orchestrator::{CaptureOrchestrator, CaptureOutcome, Permissions, ResultCallback};
pub use session::{CapturePhase, CaptureSession, CaptureSource, Generation};
pub use structs::{AnchorLocation, Coordinate, MediaArtifact, MediaPreview, Provenance, ValidationResult};
