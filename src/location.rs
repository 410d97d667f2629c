//! Location module.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use tracing::error;

use crate::error;

/// A location fix reported by the platform.
///
/// Coordinates are kept exactly as the platform reported them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    latitude: f64,
    longitude: f64,
    accuracy: Option<f32>,
    time: DateTime<Utc>,
}

impl Fix {
    /// Creates a new fix, checking that the coordinates are valid WGS84 degrees.
    pub fn new(latitude: f64, longitude: f64, time: DateTime<Utc>) -> Result<Self, error::Fix> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(error::Fix::InvalidLatitude { latitude });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(error::Fix::InvalidLongitude { longitude });
        }

        Ok(Self {
            latitude,
            longitude,
            accuracy: None,
            time,
        })
    }

    /// Sets the horizontal accuracy radius of the fix, in meters.
    #[must_use]
    pub fn with_accuracy(mut self, accuracy: f32) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Gets the latitude of the fix, in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Gets the longitude of the fix, in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Gets the horizontal accuracy of the fix, in meters, if the platform reported one.
    pub fn accuracy(&self) -> Option<f32> {
        self.accuracy
    }

    /// Gets the time at which the platform obtained the fix.
    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }
}

impl fmt::Display for Fix {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Lat: {} Lon: {}", self.latitude, self.longitude)?;
        if let Some(accuracy) = self.accuracy {
            write!(f, " (±{accuracy} m)")?;
        }
        Ok(())
    }
}

/// Shared handle to the current location.
///
/// Other screens read the last delivered fix from here. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct LocationCache {
    current: Arc<Mutex<Option<Fix>>>,
}

impl LocationCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the given fix as the current location.
    pub fn store(&self, fix: Fix) {
        *self.lock() = Some(fix);
    }

    /// Gets the current location, if one has been delivered.
    pub fn current(&self) -> Option<Fix> {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Fix>> {
        match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                error!("The location cache mutex was poisoned.");
                poisoned.into_inner()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 11, 3, 10, 30, 0).unwrap()
    }

    #[test]
    fn fix_new() {
        let fix = Fix::new(34.056_4, -117.195_6, time()).unwrap();

        assert_eq!(fix.latitude(), 34.056_4);
        assert_eq!(fix.longitude(), -117.195_6);
        assert_eq!(fix.accuracy(), None);
        assert_eq!(fix.time(), time());

        // Boundaries are valid.
        assert!(Fix::new(90.0, 180.0, time()).is_ok());
        assert!(Fix::new(-90.0, -180.0, time()).is_ok());
    }

    #[test]
    fn fix_invalid() {
        assert_eq!(
            Fix::new(90.5, 0.0, time()),
            Err(error::Fix::InvalidLatitude { latitude: 90.5 })
        );
        assert_eq!(
            Fix::new(0.0, -181.0, time()),
            Err(error::Fix::InvalidLongitude { longitude: -181.0 })
        );
        assert!(Fix::new(f64::NAN, 0.0, time()).is_err());
        assert!(Fix::new(0.0, f64::INFINITY, time()).is_err());
    }

    #[test]
    fn fix_display() {
        let fix = Fix::new(34.5, -117.25, time()).unwrap();
        assert_eq!(format!("{fix}"), "Lat: 34.5 Lon: -117.25");
        assert_eq!(
            format!("{}", fix.with_accuracy(12.5)),
            "Lat: 34.5 Lon: -117.25 (±12.5 m)"
        );
    }

    #[test]
    fn cache_is_shared() {
        let cache = LocationCache::new();
        let other = cache.clone();
        assert_eq!(cache.current(), None);

        let fix = Fix::new(40.416_8, -3.703_8, time()).unwrap();
        other.store(fix);
        assert_eq!(cache.current(), Some(fix));
    }
}
