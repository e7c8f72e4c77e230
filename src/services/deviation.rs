//! Deviation analysis between observed and modeled travel times

use std::fmt;

use crate::types::leg::RouteLeg;

const BUCKET_LABELS: [&str; 5] = [
    "50 minutes or less",
    "50 to 100 minutes",
    "100 to 500 minutes",
    "500 to 1000 minutes",
    "over 1000 minutes",
];

/// Max, min and averages of one deviation series. `avg_negative` is 0
/// when no negative value exists; `avg_magnitude` averages absolute
/// values across the whole series.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Spread {
    pub max: f64,
    pub min: f64,
    pub avg_positive: f64,
    pub avg_negative: f64,
    pub avg_magnitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DurationBucket {
    pub label: &'static str,
    pub trips: usize,
    pub avg_absolute: f64,
    pub avg_relative: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviationReport {
    pub total: usize,
    /// Legs whose observed duration exceeds the modeled one.
    pub valid: usize,
    pub valid_percent: f64,
    /// Observed minus modeled minutes, over every leg.
    pub absolute: Spread,
    /// Signed percentage of the observed duration, over legs with a
    /// nonzero observed duration.
    pub relative: Spread,
    pub buckets: Vec<DurationBucket>,
}

/// Compares observed leg durations against the modeled travel times.
/// Buckets cover only the legs that ran over the model, grouped by
/// observed duration.
pub fn analyze(legs: &[RouteLeg]) -> DeviationReport {
    let mut absolute_all = Vec::with_capacity(legs.len());
    let mut relative_all = Vec::new();
    let mut bucket_absolute: [Vec<f64>; 5] = Default::default();
    let mut bucket_relative: [Vec<f64>; 5] = Default::default();
    let mut valid = 0usize;

    for leg in legs {
        let observed = leg.minutes;
        let deviation = (observed - leg.calculated_minutes) as f64;
        absolute_all.push(deviation);

        let relative = if observed != 0 {
            let r = round2(deviation * 100.0 / observed as f64);
            relative_all.push(r);
            Some(r)
        } else {
            None
        };

        if observed > leg.calculated_minutes {
            valid += 1;
            let i = bucket_index(observed);
            bucket_absolute[i].push(deviation);
            if let Some(r) = relative {
                bucket_relative[i].push(r);
            }
        }
    }

    let buckets = bucket_absolute
        .iter()
        .zip(bucket_relative.iter())
        .zip(BUCKET_LABELS)
        .map(|((absolute, relative), label)| DurationBucket {
            label,
            trips: absolute.len(),
            avg_absolute: mean(absolute),
            avg_relative: mean(relative),
        })
        .collect();

    DeviationReport {
        total: legs.len(),
        valid,
        valid_percent: if legs.is_empty() {
            0.0
        } else {
            round2(valid as f64 * 100.0 / legs.len() as f64)
        },
        absolute: spread(&absolute_all),
        relative: spread(&relative_all),
        buckets,
    }
}

fn bucket_index(observed: i64) -> usize {
    match observed {
        o if o <= 50 => 0,
        o if o <= 100 => 1,
        o if o <= 500 => 2,
        o if o <= 1000 => 3,
        _ => 4,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn spread(values: &[f64]) -> Spread {
    if values.is_empty() {
        return Spread::default();
    }

    let positive: Vec<f64> = values.iter().copied().filter(|v| *v >= 0.0).collect();
    let negative: Vec<f64> = values.iter().copied().filter(|v| *v < 0.0).collect();
    let magnitudes: Vec<f64> = values.iter().map(|v| v.abs()).collect();

    Spread {
        max: values.iter().copied().fold(f64::MIN, f64::max),
        min: values.iter().copied().fold(f64::MAX, f64::min),
        avg_positive: mean(&positive),
        avg_negative: mean(&negative),
        avg_magnitude: mean(&magnitudes),
    }
}

impl fmt::Display for DeviationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Deviation report over {} legs", self.total)?;
        writeln!(f, "Legs above the modeled time: {} ({:.2}%)", self.valid, self.valid_percent)?;
        writeln!(f)?;
        writeln!(f, "Absolute deviation (minutes)")?;
        writeln!(f, "  max: {:.0}  min: {:.0}", self.absolute.max, self.absolute.min)?;
        writeln!(
            f,
            "  avg positive: {:.2}  avg negative: {:.2}  avg overall: {:.2}",
            self.absolute.avg_positive, self.absolute.avg_negative, self.absolute.avg_magnitude
        )?;
        writeln!(f)?;
        writeln!(f, "Relative deviation (% of observed)")?;
        writeln!(f, "  max: {:.2}  min: {:.2}", self.relative.max, self.relative.min)?;
        writeln!(
            f,
            "  avg positive: {:.2}  avg negative: {:.2}  avg overall: {:.2}",
            self.relative.avg_positive, self.relative.avg_negative, self.relative.avg_magnitude
        )?;
        writeln!(f)?;
        writeln!(f, "Legs above the modeled time, by observed duration")?;
        for bucket in &self.buckets {
            writeln!(
                f,
                "  {:<22} {:>6} legs  avg {:>8.2} min  avg {:>7.2}%",
                bucket.label, bucket.trips, bucket.avg_absolute, bucket.avg_relative
            )?;
        }
        Ok(())
    }
}
