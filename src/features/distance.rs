use crate::structs::{AnchorLocation, Coordinate, ValidationResult};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two `(latitude, longitude)` pairs in degrees, using the
/// haversine formula.
///
/// Non-finite input yields a non-finite result rather than a panic.
///
/// ```
/// use geo_capture::features::distance::distance_meters;
///
/// let d = distance_meters((0.0, 0.0), (0.0009, 0.0));
/// assert!((d - 100.0).abs() < 1.0);
/// ```
pub fn distance_meters(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = a;
    let (lat2, lon2) = b;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let h = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Inclusive threshold check. `NaN` is never within.
pub fn is_within(distance: f64, max_distance: f64) -> bool {
    distance <= max_distance
}

impl ValidationResult {
    /// Validates a captured coordinate against an optional anchor.
    ///
    /// Without an anchor there is no location requirement: the result is valid with a
    /// distance of zero, and the coordinate (if any) is kept for display.
    pub fn evaluate(
        anchor: Option<&AnchorLocation>,
        coordinate: Option<Coordinate>,
        max_distance_meters: f64,
    ) -> Self {
        let Some(anchor) = anchor else {
            return Self {
                is_valid: true,
                distance_meters: 0.0,
                coordinate,
            };
        };
        let Some(position) = coordinate.as_ref() else {
            return Self {
                is_valid: false,
                distance_meters: f64::INFINITY,
                coordinate,
            };
        };

        let distance = distance_meters(
            (anchor.latitude, anchor.longitude),
            (position.latitude, position.longitude),
        );
        if !distance.is_finite() {
            return Self {
                is_valid: false,
                distance_meters: f64::INFINITY,
                coordinate,
            };
        }

        Self {
            is_valid: is_within(distance, max_distance_meters),
            distance_meters: distance,
            coordinate,
        }
    }
}
