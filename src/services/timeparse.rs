//! Free-text date/time parsing for raw trip records

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::PlanError;
use crate::types::trip::{ParsedTrip, RawTrip};

/// Clock shape the source system emits: `H:MM:SS a.m.` / `p.m.`.
static TIME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d{1,2}):(\d{1,2}):(\d{1,2})\s([ap])\.m\.$").unwrap());

/// Parse a 12-hour clock text into a time of day. Seconds must be
/// present and valid but are discarded; downstream math works on whole
/// minutes.
pub fn parse_clock(text: &str) -> Result<NaiveTime, PlanError> {
    let malformed = || PlanError::MalformedTime(format!("time text {text:?}"));

    let caps = TIME_PATTERN.captures(text).ok_or_else(malformed)?;
    let hour: u32 = caps[1].parse().map_err(|_| malformed())?;
    let minute: u32 = caps[2].parse().map_err(|_| malformed())?;
    let second: u32 = caps[3].parse().map_err(|_| malformed())?;

    if !(1..=12).contains(&hour) || minute > 59 || second > 59 {
        return Err(malformed());
    }

    let meridiem = caps[4].to_ascii_lowercase();
    let hour24 = match (hour, meridiem.as_str()) {
        (12, "a") => 0,
        (12, "p") => 12,
        (h, "a") => h,
        (h, _) => h + 12,
    };

    NaiveTime::from_hms_opt(hour24, minute, 0).ok_or_else(malformed)
}

/// Parse a `YYYYMMDD` date code into a calendar date.
pub fn parse_date_code(code: &str) -> Result<NaiveDate, PlanError> {
    let malformed = || PlanError::MalformedTime(format!("date code {code:?}"));

    if code.len() != 8 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }
    let year: i32 = code[0..4].parse().map_err(|_| malformed())?;
    let month: u32 = code[4..6].parse().map_err(|_| malformed())?;
    let day: u32 = code[6..8].parse().map_err(|_| malformed())?;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
}

fn parse_instant(date_code: &str, time_text: &str) -> Result<NaiveDateTime, PlanError> {
    let date = parse_date_code(date_code)?;
    let time = parse_clock(time_text)?;
    Ok(date.and_time(time))
}

/// Resolve a raw trip record into absolute start/end instants.
///
/// Any missing required field, unparseable text, or a start that is not
/// strictly before the end drops the record. Callers log and move on;
/// one bad trip never aborts a batch.
pub fn parse_trip(raw: &RawTrip) -> Result<ParsedTrip, PlanError> {
    let missing =
        |field: &str| PlanError::MalformedTime(format!("trip {}: {field} missing", raw.trip_id));

    let origin = raw.origin.ok_or_else(|| missing("origin"))?;
    let destination = raw.destination.ok_or_else(|| missing("destination"))?;
    let truck_type = raw.truck_type.clone().ok_or_else(|| missing("truck type"))?;
    let start_date = raw.start_date_code.as_deref().ok_or_else(|| missing("start date"))?;
    let start_time = raw.start_time_text.as_deref().ok_or_else(|| missing("start time"))?;
    let end_date = raw.end_date_code.as_deref().ok_or_else(|| missing("end date"))?;
    let end_time = raw.end_time_text.as_deref().ok_or_else(|| missing("end time"))?;

    let start = parse_instant(start_date, start_time)?;
    let end = parse_instant(end_date, end_time)?;
    if start >= end {
        return Err(PlanError::MalformedTime(format!(
            "trip {}: start {start} is not before end {end}",
            raw.trip_id
        )));
    }

    Ok(ParsedTrip {
        trip_id: raw.trip_id,
        origin,
        destination,
        start,
        end,
        vehicle_id: raw.vehicle_id.clone(),
        truck_type,
    })
}
