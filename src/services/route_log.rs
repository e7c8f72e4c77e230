//! Cumulative route log

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::{Context, Result};
use parking_lot::Mutex;

use crate::types::leg::RouteLeg;

/// Append-only CSV of every planned leg across the whole run. The
/// header is written once, when the file is created or still empty.
/// Legs that do not move (origin equals destination) are not recorded.
pub struct RouteLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RouteLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// Append legs in order; returns how many were written.
    pub fn append(&self, legs: &[RouteLeg]) -> Result<usize> {
        let _guard = self.lock.lock();

        let needs_header = match std::fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening route log {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(needs_header).from_writer(file);

        let mut written = 0;
        for leg in legs {
            if leg.origin_id == leg.destination_id {
                continue;
            }
            writer.serialize(leg)?;
            written += 1;
        }
        writer.flush()?;
        Ok(written)
    }

    /// Read the whole log back, e.g. for deviation analysis.
    pub fn read_all(&self) -> Result<Vec<RouteLeg>> {
        let _guard = self.lock.lock();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .with_context(|| format!("opening route log {}", self.path.display()))?;
        let mut legs = Vec::new();
        for row in reader.deserialize::<RouteLeg>() {
            legs.push(row.with_context(|| format!("reading {}", self.path.display()))?);
        }
        Ok(legs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn temp_log() -> RouteLog {
        let path =
            std::env::temp_dir().join(format!("route-log-test-{}.csv", uuid::Uuid::new_v4()));
        RouteLog::new(path)
    }

    fn leg(origin: i64, destination: i64) -> RouteLeg {
        let day = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        RouteLeg {
            origin_id: origin,
            destination_id: destination,
            origin_lat: None,
            origin_long: None,
            destination_lat: None,
            destination_long: None,
            vehicle_id: "U-100".into(),
            truck_type: "T1".into(),
            start_time: day.and_hms_opt(7, 30, 0).unwrap(),
            end_time: day.and_hms_opt(9, 10, 0).unwrap(),
            minutes: 100,
            calculated_minutes: 96,
            calculated_kms: 87.5,
            loaded: 1,
        }
    }

    #[test]
    fn test_header_written_once_across_appends() {
        let log = temp_log();
        assert_eq!(log.append(&[leg(10, 20)]).unwrap(), 1);
        assert_eq!(log.append(&[leg(20, 30), leg(30, 10)]).unwrap(), 2);

        let text = std::fs::read_to_string(&log.path).unwrap();
        let headers = text.lines().filter(|l| l.starts_with("origin_id,")).count();
        assert_eq!(headers, 1);
        assert_eq!(text.lines().count(), 4);

        let legs = log.read_all().unwrap();
        assert_eq!(legs.len(), 3);
        assert_eq!(legs[2].origin_id, 30);

        std::fs::remove_file(&log.path).ok();
    }

    #[test]
    fn test_motionless_legs_are_skipped() {
        let log = temp_log();
        assert_eq!(log.append(&[leg(10, 10), leg(10, 20)]).unwrap(), 1);
        assert_eq!(log.read_all().unwrap().len(), 1);
        std::fs::remove_file(&log.path).ok();
    }
}
