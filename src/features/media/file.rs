use crate::features::error::{MediaError, PickerError};
use crate::features::media::MediaAcquirer;
use crate::session::{Generation, GenerationClock};
use crate::structs::{MediaArtifact, Provenance};
use crate::utils::lock;
use mime_guess::MimeGuess;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// A single file returned by the host chooser.
#[derive(Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    /// Content type as reported by the host, if any.
    pub declared_mime: Option<String>,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for PickedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PickedFile")
            .field("name", &self.name)
            .field("declared_mime", &self.declared_mime)
            .field("data", &format_args!("<{} bytes>", self.data.len()))
            .finish()
    }
}

/// The host's native file chooser. Waits on the user, so it has no timeout.
pub trait FilePicker: Send + Sync + 'static {
    fn pick(&self) -> impl Future<Output = Result<PickedFile, PickerError>> + Send;
}

/// Works out the image MIME type of a picked file.
///
/// The declared type wins, then the file extension, then the leading bytes. Anything that
/// does not resolve to `image/*` is rejected.
pub fn resolve_image_mime(file: &PickedFile) -> Result<String, MediaError> {
    let declared = file
        .declared_mime
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty() && *m != "application/octet-stream");

    if let Some(mime) = declared {
        return if mime.starts_with("image/") {
            Ok(mime.to_string())
        } else {
            Err(MediaError::UnsupportedFileType(mime.to_string()))
        };
    }

    if let Some(guess) = MimeGuess::from_path(&file.name).first() {
        return if guess.type_() == "image" {
            Ok(guess.to_string())
        } else {
            Err(MediaError::UnsupportedFileType(guess.to_string()))
        };
    }

    image::guess_format(&file.data)
        .map(|format| format.to_mime_type().to_string())
        .map_err(|_| MediaError::UnsupportedFileType("application/octet-stream".to_string()))
}

struct PendingFile {
    generation: Generation,
    mime_type: String,
    data: Vec<u8>,
}

/// File-selection variant of [`MediaAcquirer`].
pub struct FileSelectionAcquirer<P> {
    picker: P,
    clock: Arc<GenerationClock>,
    pending: Mutex<Option<PendingFile>>,
}

impl<P: FilePicker> FileSelectionAcquirer<P> {
    pub fn new(picker: P, clock: Arc<GenerationClock>) -> Self {
        Self {
            picker,
            clock,
            pending: Mutex::new(None),
        }
    }
}

impl<P: FilePicker> MediaAcquirer for FileSelectionAcquirer<P> {
    async fn open(&self, generation: Generation) -> Result<(), MediaError> {
        debug!(?generation, "Waiting for the user to choose a file");
        let file = self.picker.pick().await?;
        let mime_type = resolve_image_mime(&file).map_err(|err| {
            warn!(?generation, name = %file.name, error = %err, "Rejected selected file");
            err
        })?;

        let mut pending = lock(&self.pending);
        if !self.clock.is_current(generation) {
            return Err(MediaError::Superseded);
        }
        debug!(?generation, name = %file.name, %mime_type, bytes = file.data.len(), "File selected");
        *pending = Some(PendingFile {
            generation,
            mime_type,
            data: file.data,
        });
        Ok(())
    }

    async fn produce(&self, generation: Generation) -> Result<MediaArtifact, MediaError> {
        let mut pending = lock(&self.pending);
        match pending.take() {
            Some(file) if file.generation == generation => Ok(MediaArtifact::new(
                file.data,
                file.mime_type,
                Provenance::FileSelection,
            )),
            other => {
                *pending = other;
                Err(MediaError::Superseded)
            }
        }
    }

    fn release(&self) {
        lock(&self.pending).take();
    }
}
