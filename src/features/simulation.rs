//! Synthetic captures for environments where camera or location access is blocked.
//!
//! Output has the same shape as a real acquisition, so validation treats it identically.
//! The artifact is marked [`Provenance::Simulated`] so it can never pass as genuine evidence.
use crate::features::distance::EARTH_RADIUS_M;
use crate::structs::{AnchorLocation, Coordinate, MediaArtifact, Provenance};
use image::{ImageFormat, Rgb, RgbImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Cursor;
use std::ops::RangeInclusive;

/// Offsets that land inside a `max_distance_meters` radius: 10 to 50 m for the default
/// 100 m, scaled down for tighter radii.
pub fn near_offsets(max_distance_meters: f64) -> RangeInclusive<f64> {
    let max = max_distance_meters.max(0.0);
    (max * 0.1).min(10.0)..=(max * 0.5).min(50.0)
}

/// Offsets that land well outside the radius: 1 to 5 km, scaled up for wider radii.
pub fn far_offsets(max_distance_meters: f64) -> RangeInclusive<f64> {
    let max = max_distance_meters.max(0.0);
    (max * 2.0).max(1_000.0)..=(max * 10.0).max(5_000.0)
}

const ARTIFACT_SIZE: (u32, u32) = (64, 48);

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedCapture {
    pub coordinate: Coordinate,
    pub artifact: MediaArtifact,
}

pub struct SimulationFallback<R> {
    rng: R,
}

impl SimulationFallback<StdRng> {
    /// Reproducible sequence, for tests and demos.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> SimulationFallback<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn simulate(
        &mut self,
        anchor: Option<&AnchorLocation>,
        max_distance_meters: f64,
    ) -> Result<SimulatedCapture, image::ImageError> {
        let coordinate = self.simulate_coordinate(anchor, max_distance_meters);
        let artifact = self.simulate_artifact()?;
        Ok(SimulatedCapture {
            coordinate,
            artifact,
        })
    }

    /// Half of the time inside `max_distance_meters` of the anchor, half of the time well
    /// outside it.
    pub fn simulate_coordinate(
        &mut self,
        anchor: Option<&AnchorLocation>,
        max_distance_meters: f64,
    ) -> Coordinate {
        let accuracy = self.rng.random_range(5.0..=30.0);
        let Some(anchor) = anchor else {
            let latitude = self.rng.random_range(-60.0..=60.0);
            let longitude = self.rng.random_range(-180.0..=180.0);
            return Coordinate::now(latitude, longitude, accuracy);
        };

        let distance = if self.rng.random_bool(0.5) {
            self.rng.random_range(near_offsets(max_distance_meters))
        } else {
            self.rng.random_range(far_offsets(max_distance_meters))
        };
        let bearing = self.rng.random_range(0.0..360.0);
        let (latitude, longitude) =
            offset_position((anchor.latitude, anchor.longitude), distance, bearing);
        Coordinate::now(latitude, longitude, accuracy)
    }

    fn simulate_artifact(&mut self) -> Result<MediaArtifact, image::ImageError> {
        let tint: [u8; 3] = [self.rng.random(), self.rng.random(), self.rng.random()];
        let (width, height) = ARTIFACT_SIZE;
        let img = RgbImage::from_fn(width, height, |x, y| {
            let shade = ((x + y) * 2) as u8;
            Rgb([tint[0] ^ shade, tint[1], tint[2] ^ shade])
        });

        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png)?;
        Ok(MediaArtifact::new(
            bytes.into_inner(),
            "image/png",
            Provenance::Simulated,
        ))
    }
}

/// Destination reached from `origin` after `distance_m` along `bearing_deg`, on the same
/// sphere the distance validator uses.
pub fn offset_position(origin: (f64, f64), distance_m: f64, bearing_deg: f64) -> (f64, f64) {
    let phi1 = origin.0.to_radians();
    let lambda1 = origin.1.to_radians();
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let longitude = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    (phi2.to_degrees(), longitude)
}
