//! Route log legs

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::types::location::LocationId;

/// One origin to destination movement in the cumulative route log.
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub origin_id: LocationId,
    pub destination_id: LocationId,
    pub origin_lat: Option<f64>,
    pub origin_long: Option<f64>,
    pub destination_lat: Option<f64>,
    pub destination_long: Option<f64>,
    pub vehicle_id: String,
    pub truck_type: String,
    #[serde(with = "timestamp")]
    pub start_time: NaiveDateTime,
    #[serde(with = "timestamp")]
    pub end_time: NaiveDateTime,
    pub minutes: i64,
    pub calculated_minutes: i64,
    pub calculated_kms: f64,
    pub loaded: u8,
}

/// Serde adapter for the `%Y-%m-%d %H:%M:%S` timestamps used across the
/// route log and fleet state snapshots.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&text, FORMAT).map_err(serde::de::Error::custom)
    }
}
