//! Coordinates and bounds shared by the map picker, the geolocation provider
//! and the submission payload.

use serde::{Deserialize, Serialize};

use crate::error::MapError;

/// A single coordinate chosen for a new story.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectedLocation {
    pub lat: f64,
    pub lon: f64,
}

impl SelectedLocation {
    /// Build a location, rejecting non-finite or out-of-range values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, MapError> {
        if Self::is_valid_pair(lat, lon) {
            Ok(Self { lat, lon })
        } else {
            Err(MapError::InvalidCoordinates { lat, lon })
        }
    }

    pub fn is_valid_pair(lat: f64, lon: f64) -> bool {
        lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon)
    }

    pub fn is_valid(&self) -> bool {
        Self::is_valid_pair(self.lat, self.lon)
    }
}

impl std::fmt::Display for SelectedLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.lat, self.lon)
    }
}

/// Axis-aligned box enclosing a set of coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south_west: SelectedLocation,
    pub north_east: SelectedLocation,
}

impl LatLngBounds {
    /// Smallest bounds containing every point, `None` for an empty set.
    pub fn enclosing<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = SelectedLocation>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self {
            south_west: first,
            north_east: first,
        };
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: SelectedLocation) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lon = self.south_west.lon.min(point.lon);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lon = self.north_east.lon.max(point.lon);
    }

    pub fn center(&self) -> SelectedLocation {
        SelectedLocation {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lon: (self.south_west.lon + self.north_east.lon) / 2.0,
        }
    }

    pub fn contains(&self, point: SelectedLocation) -> bool {
        (self.south_west.lat..=self.north_east.lat).contains(&point.lat)
            && (self.south_west.lon..=self.north_east.lon).contains(&point.lon)
    }
}
