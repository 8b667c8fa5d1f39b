//! Coordinate module - WGS84 latitude/longitude pairs

use std::fmt;

/// A point on the Earth's surface in decimal degrees
///
/// Coordinates are immutable values. Construct them with [`Coordinate::new`],
/// which rejects out-of-range or non-finite input, or with
/// [`Coordinate::new_unchecked`] when the values were already validated
/// (for example when loaded back from storage).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in degrees, within [-90, 90]
    pub latitude: f64,

    /// Longitude in degrees, within [-180, 180]
    pub longitude: f64,
}

impl Coordinate {
    /// Create a validated coordinate
    ///
    /// # Examples
    ///
    /// ```
    /// use geoping_domain::Coordinate;
    ///
    /// let london = Coordinate::new(51.5, -0.12).unwrap();
    /// assert_eq!(london.latitude, 51.5);
    ///
    /// assert!(Coordinate::new(91.0, 0.0).is_err());
    /// assert!(Coordinate::new(0.0, f64::NAN).is_err());
    /// ```
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(format!("Latitude out of range [-90, 90]: {}", latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!("Longitude out of range [-180, 180]: {}", longitude));
        }
        Ok(Self { latitude, longitude })
    }

    /// Create a coordinate without range checks
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude in radians
    pub fn latitude_radians(&self) -> f64 {
        self.latitude.to_radians()
    }

    /// Longitude in radians
    pub fn longitude_radians(&self) -> f64 {
        self.longitude.to_radians()
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}
