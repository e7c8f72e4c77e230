//! Trip records at their successive pipeline stages

use chrono::NaiveDateTime;
use sqlx::FromRow;

use crate::types::location::LocationId;

/// One historical movement exactly as the trip store returns it.
/// Every field the source system may leave empty is optional here;
/// parsing decides what is usable.
#[derive(Debug, Clone, FromRow)]
pub struct RawTrip {
    pub trip_id: i64,
    pub origin: Option<LocationId>,
    pub destination: Option<LocationId>,
    pub start_date_code: Option<String>,
    pub start_time_text: Option<String>,
    pub end_date_code: Option<String>,
    pub end_time_text: Option<String>,
    pub vehicle_id: Option<String>,
    pub truck_type: Option<String>,
}

/// A trip whose date/time fields resolved into real instants.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrip {
    pub trip_id: i64,
    pub origin: LocationId,
    pub destination: LocationId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub vehicle_id: Option<String>,
    pub truck_type: String,
}

/// A parsed trip confirmed against the analysis window and the known
/// location set, with its offsets from the window start resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedTrip {
    pub trip_id: i64,
    pub origin: LocationId,
    pub destination: LocationId,
    pub start_minutes: i64,
    pub end_minutes: i64,
    pub start_day_offset: i64,
    pub end_day_offset: i64,
    pub vehicle_id: Option<String>,
    pub truck_type: String,
}

impl ValidatedTrip {
    /// Elapsed whole minutes the trip actually took.
    pub fn observed_minutes(&self) -> i64 {
        self.end_minutes - self.start_minutes
    }
}
