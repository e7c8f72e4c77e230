//! Locations, coordinates and distance rows

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identifier of a location in the reference network.
pub type LocationId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Whether the point can be sent to the geo distance service.
    /// Rejects the 0/0 placeholder and out-of-range values.
    pub fn is_routable(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat.abs() <= 90.0
            && self.lng.abs() <= 180.0
            && !(self.lat == 0.0 && self.lng == 0.0)
    }
}

/// Location row as stored in the reference network.
#[derive(Debug, Clone, FromRow)]
pub struct LocationRecord {
    pub location_id: LocationId,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

impl LocationRecord {
    pub fn coordinates(&self) -> Option<Coordinates> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(Coordinates { lat, lng }),
            _ => None,
        }
    }
}

/// Stored travel time and distance between two locations. Direction
/// agnostic; the oracle canonicalizes the key order.
#[derive(Debug, Clone, FromRow)]
pub struct DistanceRow {
    pub origin: LocationId,
    pub destination: LocationId,
    pub travel_time: i64,
    pub kilometers: f64,
}
