use serde::{Deserialize, Serialize};
use std::fmt;

/// Map center used before the user's position is known (Tel Aviv).
pub const DEFAULT_CENTER: Coordinates = Coordinates {
    latitude: 32.0853,
    longitude: 34.7818,
};

/// Where a resolved [`Location`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationSource {
    /// The platform's high-accuracy position source.
    Gps,
    /// IP-based geolocation; accurate to a city at best.
    Ip,
}

impl fmt::Display for LocationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationSource::Gps => write!(f, "GPS"),
            LocationSource::Ip => write!(f, "IP"),
        }
    }
}

/// A bare latitude/longitude pair in decimal degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5}, {:.5}", self.latitude, self.longitude)
    }
}

/// The user's position as produced by the location resolver.
///
/// A `Location` is replaced wholesale on every resolution; nothing mutates
/// one in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub source: LocationSource,
}

impl Location {
    pub fn new(coordinates: Coordinates, source: LocationSource) -> Self {
        Self {
            latitude: coordinates.latitude,
            longitude: coordinates.longitude,
            source,
        }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// True when the position came from the IP fallback.
    pub fn is_approximate(&self) -> bool {
        self.source == LocationSource::Ip
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.coordinates(), self.source)
    }
}
