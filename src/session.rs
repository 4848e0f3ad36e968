//! Session state for one capture attempt, and the generation tags that keep overlapping
//! attempts apart.
use crate::error::{CaptureFailure, ErrorKind};
use crate::structs::{MediaPreview, ValidationResult};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Identifies one capture attempt. Strictly increasing over the orchestrator's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub struct Generation(pub u64);

/// Source of generation tags, shared between the orchestrator and its acquirers.
#[derive(Debug, Default)]
pub struct GenerationClock {
    current: AtomicU64,
}

impl GenerationClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new generation, invalidating every earlier one.
    pub fn advance(&self) -> Generation {
        Generation(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self) -> Generation {
        Generation(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, generation: Generation) -> bool {
        self.current() == generation
    }
}

/// A value produced on behalf of a specific generation.
#[derive(Debug, Clone, PartialEq)]
pub struct Tagged<T> {
    pub generation: Generation,
    pub value: T,
}

impl<T> Tagged<T> {
    pub fn new(generation: Generation, value: T) -> Self {
        Self { generation, value }
    }
}

/// How the caller asked for media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureSource {
    Camera,
    File,
    Simulated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CapturePhase {
    Idle,
    RequestingMedia,
    RequestingLocation,
    Validating,
    Succeeded,
    Failed(ErrorKind),
}

impl CapturePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }

    pub fn is_pending(self) -> bool {
        matches!(
            self,
            Self::RequestingMedia | Self::RequestingLocation | Self::Validating
        )
    }

    fn can_advance_to(self, next: Self) -> bool {
        use CapturePhase::*;
        match (self, next) {
            (RequestingMedia, RequestingLocation | Validating) => true,
            (RequestingLocation, Validating) => true,
            (Validating, Succeeded) => true,
            (from, Failed(_)) => !from.is_terminal(),
            _ => false,
        }
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionError {
    #[error("generation {0:?} is no longer current")]
    Stale(Generation),

    #[error("cannot move from {from:?} to {to:?}")]
    Illegal { from: CapturePhase, to: CapturePhase },
}

/// One end-to-end attempt to produce a validated, located artifact.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    pub generation: Generation,
    pub phase: CapturePhase,
    pub source: Option<CaptureSource>,
    pub preview: Option<MediaPreview>,
    pub validation: Option<ValidationResult>,
    pub failure: Option<CaptureFailure>,
}

impl CaptureSession {
    pub fn idle(generation: Generation) -> Self {
        Self {
            generation,
            phase: CapturePhase::Idle,
            source: None,
            preview: None,
            validation: None,
            failure: None,
        }
    }

    pub(crate) fn start(generation: Generation, source: CaptureSource) -> Self {
        Self {
            phase: CapturePhase::RequestingMedia,
            source: Some(source),
            ..Self::idle(generation)
        }
    }

    fn check(&self, generation: Generation, next: CapturePhase) -> Result<(), TransitionError> {
        if self.generation != generation {
            return Err(TransitionError::Stale(generation));
        }
        if !self.phase.can_advance_to(next) {
            return Err(TransitionError::Illegal {
                from: self.phase,
                to: next,
            });
        }
        Ok(())
    }

    /// Moves a pending session forward without touching its results.
    pub(crate) fn advance(
        &mut self,
        generation: Generation,
        next: CapturePhase,
    ) -> Result<(), TransitionError> {
        self.check(generation, next)?;
        self.phase = next;
        Ok(())
    }

    pub(crate) fn succeed(
        &mut self,
        generation: Generation,
        preview: MediaPreview,
        validation: ValidationResult,
    ) -> Result<(), TransitionError> {
        self.check(generation, CapturePhase::Succeeded)?;
        self.phase = CapturePhase::Succeeded;
        self.preview = Some(preview);
        self.validation = Some(validation);
        Ok(())
    }

    pub(crate) fn fail(
        &mut self,
        generation: Generation,
        failure: CaptureFailure,
    ) -> Result<(), TransitionError> {
        let next = CapturePhase::Failed(failure.kind);
        self.check(generation, next)?;
        self.phase = next;
        self.failure = Some(failure);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::Provenance;
    use chrono::Utc;

    fn preview() -> MediaPreview {
        MediaPreview {
            data_url: None,
            mime_type: "image/jpeg".to_string(),
            byte_length: 3,
            created_at: Utc::now(),
            provenance: Provenance::Camera,
        }
    }

    fn valid() -> ValidationResult {
        ValidationResult {
            is_valid: true,
            distance_meters: 0.0,
            coordinate: None,
        }
    }

    #[test]
    fn test_clock_is_monotonic() {
        let clock = GenerationClock::new();
        let first = clock.advance();
        let second = clock.advance();
        assert!(second > first);
        assert!(clock.is_current(second));
        assert!(!clock.is_current(first));
    }

    #[test]
    fn test_happy_path_transitions() {
        let g = Generation(1);
        let mut session = CaptureSession::start(g, CaptureSource::Camera);
        session.advance(g, CapturePhase::RequestingLocation).unwrap();
        session.advance(g, CapturePhase::Validating).unwrap();
        session.succeed(g, preview(), valid()).unwrap();
        assert_eq!(session.phase, CapturePhase::Succeeded);
        assert!(session.validation.is_some());
    }

    #[test]
    fn test_only_one_terminal_phase_per_generation() {
        let g = Generation(4);
        let mut session = CaptureSession::start(g, CaptureSource::File);
        session
            .fail(g, CaptureFailure::new(ErrorKind::DeviceBusy, "busy"))
            .unwrap();

        let again = session.fail(g, CaptureFailure::new(ErrorKind::Timeout, "slow"));
        assert!(matches!(again, Err(TransitionError::Illegal { .. })));
        assert_eq!(session.phase, CapturePhase::Failed(ErrorKind::DeviceBusy));

        let late_success = session.succeed(g, preview(), valid());
        assert!(late_success.is_err());
        assert!(session.validation.is_none());
    }

    #[test]
    fn test_stale_generation_is_rejected() {
        let mut session = CaptureSession::start(Generation(2), CaptureSource::Camera);
        let result = session.advance(Generation(1), CapturePhase::Validating);
        assert_eq!(result, Err(TransitionError::Stale(Generation(1))));
        assert_eq!(session.phase, CapturePhase::RequestingMedia);
    }

    #[test]
    fn test_cannot_succeed_without_validating() {
        let g = Generation(1);
        let mut session = CaptureSession::start(g, CaptureSource::Camera);
        assert!(session.succeed(g, preview(), valid()).is_err());
    }

    #[test]
    fn test_idle_session_cannot_validate_but_can_fail() {
        let g = Generation(0);
        let mut session = CaptureSession::idle(g);
        assert!(session.advance(g, CapturePhase::Validating).is_err());
        session
            .fail(g, CaptureFailure::new(ErrorKind::Unknown, "x"))
            .unwrap();
        assert_eq!(session.phase, CapturePhase::Failed(ErrorKind::Unknown));
    }

    #[test]
    fn test_terminal_phases_accept_no_further_transition() {
        for terminal in [CapturePhase::Succeeded, CapturePhase::Failed(ErrorKind::Timeout)] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_advance_to(CapturePhase::Failed(ErrorKind::Unknown)));
            assert!(!terminal.can_advance_to(CapturePhase::Validating));
        }
        assert!(!CapturePhase::Idle.is_terminal());
        assert!(CapturePhase::Validating.can_advance_to(CapturePhase::Failed(ErrorKind::Unknown)));
    }
}
