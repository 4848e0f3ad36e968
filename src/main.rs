use color_eyre::eyre::{WrapErr, bail};
use geo_capture::logging::{default_directive, init_logging};
use geo_capture::providers::{NoCamera, NoGeolocation, PathFilePicker};
use geo_capture::{
    CaptureConfig, CaptureOrchestrator, CaptureOutcome, CaptureSource, Coordinate, MediaArtifact,
};
use std::path::PathBuf;
use tracing::info;

/// Runs one file capture on a host without camera or location services.
///
/// Usage: `geo-capture <image> [config.json]`
///
/// With `"allowSimulation": true` in the config, a failed capture is retried as a
/// simulated one, the way a form falls back when access is blocked.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    init_logging(default_directive())?;

    let mut args = std::env::args_os().skip(1);
    let Some(image) = args.next().map(PathBuf::from) else {
        bail!("usage: geo-capture <image> [config.json]");
    };
    let config = match args.next() {
        Some(path) => CaptureConfig::from_file(&path)
            .wrap_err_with(|| format!("reading config {}", PathBuf::from(&path).display()))?,
        None => CaptureConfig::default(),
    };
    let allow_simulation = config.allow_simulation;

    let orchestrator = CaptureOrchestrator::builder()
        .camera(NoCamera)
        .file_picker(PathFilePicker::new(&image))
        .geolocation(NoGeolocation)
        .config(config)
        .on_result(Box::new(|artifact: Option<MediaArtifact>, coordinate: Option<Coordinate>| {
            info!(
                bytes = artifact.as_ref().map(|a| a.data.len()),
                latitude = coordinate.as_ref().map(|c| c.latitude),
                longitude = coordinate.as_ref().map(|c| c.longitude),
                "Result delivered"
            );
        }))
        .build()?;

    let outcome = orchestrator.capture(CaptureSource::File).await;
    if matches!(outcome, CaptureOutcome::Failed(_)) && allow_simulation {
        info!("Falling back to a simulated capture");
        orchestrator.capture(CaptureSource::Simulated).await;
    }

    println!("{}", serde_json::to_string_pretty(&orchestrator.session())?);
    println!("satisfied: {}", orchestrator.is_satisfied());

    Ok(())
}
