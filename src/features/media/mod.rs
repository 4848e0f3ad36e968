//! Media acquisition: one contract, two variants.
//!
//! - [`live`]: snapshot of a live camera stream.
//! - [`file`]: an image chosen by the user.
//!
//! Both are two-step. `open` readies the source, which is where permission prompts and
//! device errors surface; `produce` then yields the artifact. The orchestrator only asks
//! for a position once `open` has succeeded.
pub mod file;
pub mod live;

use crate::features::error::MediaError;
use crate::session::Generation;
use crate::structs::MediaArtifact;
use std::future::Future;

pub use file::{FilePicker, FileSelectionAcquirer, PickedFile};
pub use live::{
    CameraProvider, CameraStream, FacingMode, Frame, LiveCaptureAcquirer, StreamConstraints,
};

pub trait MediaAcquirer: Send + Sync {
    /// Readies the source for `generation`.
    fn open(&self, generation: Generation) -> impl Future<Output = Result<(), MediaError>> + Send;

    /// Produces the artifact from a source opened for the same generation.
    fn produce(
        &self,
        generation: Generation,
    ) -> impl Future<Output = Result<MediaArtifact, MediaError>> + Send;

    /// Synchronously releases whatever the acquirer holds. Idempotent.
    fn release(&self);
}
