use crate::features::error::DataUrlError;
use crate::structs::{MediaArtifact, MediaPreview};
use base64::{Engine as _, engine::general_purpose};
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::warn;

/// Renders an image artifact as a small JPEG data URL.
pub fn artifact_to_data_url(
    artifact: &MediaArtifact,
    thumbnail_max_size: (u32, u32),
) -> Result<String, DataUrlError> {
    if !artifact.mime_type.starts_with("image/") {
        return Err(DataUrlError::UnsupportedFileType(artifact.mime_type.clone()));
    }

    let img = image::load_from_memory(&artifact.data)?;
    let thumbnail = img.thumbnail(thumbnail_max_size.0, thumbnail_max_size.1);
    // JPEG has no alpha channel.
    let thumbnail = DynamicImage::ImageRgb8(thumbnail.to_rgb8());
    let mut bytes = Cursor::new(Vec::new());
    thumbnail.write_to(&mut bytes, ImageFormat::Jpeg)?;
    let b64 = general_purpose::STANDARD.encode(bytes.into_inner());
    Ok(format!("data:image/jpeg;base64,{b64}"))
}

/// Builds the preview a session keeps once the artifact itself goes to the caller.
///
/// Formats the decoder cannot read (HEIC, for one) still get a preview, without a data URL.
pub fn preview_of(artifact: &MediaArtifact, thumbnail_max_size: (u32, u32)) -> MediaPreview {
    let data_url = artifact_to_data_url(artifact, thumbnail_max_size)
        .map_err(|err| {
            warn!(mime_type = %artifact.mime_type, error = %err, "Could not render preview");
            err
        })
        .ok();

    MediaPreview {
        data_url,
        mime_type: artifact.mime_type.clone(),
        byte_length: artifact.data.len(),
        created_at: artifact.created_at,
        provenance: artifact.provenance,
    }
}
