//! Default values and planning policy constants

/// First serviceable minute of a working day, counted from midnight (07:00).
pub const WORKING_HOURS_START: i64 = 420;

/// Last serviceable minute of a working day, counted from midnight (18:00).
pub const WORKING_HOURS_END: i64 = 1080;

/// Minutes in one calendar day.
pub const MINUTES_PER_DAY: i64 = 1440;

/// Stand-in travel time for pairs recorded with zero minutes. Keeps the
/// pair maximally disfavored instead of free.
pub const UNKNOWN_DISTANCE_SENTINEL: i64 = 99_999;

/// Empirical calibration factor applied to stored travel times.
pub const TRAVEL_TIME_FACTOR: f64 = 1.6;

/// Observed durations under this share of the expected time are rejected.
pub const PLAUSIBLE_RATIO_MIN: f64 = 0.5;

/// Observed durations at or over this multiple of the expected time are
/// rejected.
pub const PLAUSIBLE_RATIO_MAX: f64 = 2.0;

/// Upper bound for time windows with no real deadline.
pub const OPEN_END_MINUTE: i64 = 9_999_999;

/// Wall-clock budget handed to the routing engine per partition.
pub const DEFAULT_SOLVE_BUDGET_SECS: u64 = 1200;

/// Attempts per store call before the failure is escalated.
pub const STORE_RETRY_ATTEMPTS: u32 = 3;

/// Initial backoff between store retries, doubled per attempt.
pub const STORE_RETRY_BASE_MS: u64 = 250;

/// Default number of concurrent distance sync requests.
pub const DEFAULT_SYNC_WORKERS: usize = 4;

/// Tunable knobs of the model construction pipeline. Every field
/// defaults to the constants above; tests and calibration runs may
/// override individual values.
#[derive(Debug, Clone, Copy)]
pub struct PlanningPolicy {
    pub working_hours_start: i64,
    pub working_hours_end: i64,
    pub travel_time_factor: f64,
    pub plausible_ratio_min: f64,
    pub plausible_ratio_max: f64,
}

impl Default for PlanningPolicy {
    fn default() -> Self {
        Self {
            working_hours_start: WORKING_HOURS_START,
            working_hours_end: WORKING_HOURS_END,
            travel_time_factor: TRAVEL_TIME_FACTOR,
            plausible_ratio_min: PLAUSIBLE_RATIO_MIN,
            plausible_ratio_max: PLAUSIBLE_RATIO_MAX,
        }
    }
}

impl PlanningPolicy {
    /// Minute at which the working day with the given offset opens.
    pub fn day_open(&self, day_offset: i64) -> i64 {
        self.working_hours_start + day_offset * MINUTES_PER_DAY
    }

    /// Minute at which the working day with the given offset closes.
    pub fn day_close(&self, day_offset: i64) -> i64 {
        self.working_hours_end + day_offset * MINUTES_PER_DAY
    }

    /// Extra days granted to a delivery window for a trip expected to
    /// take `expected_minutes`. Empirical tuning formula carried over
    /// from production calibration, not derived.
    pub fn delivery_inflation_days(&self, expected_minutes: f64) -> i64 {
        ((expected_minutes / MINUTES_PER_DAY as f64).ceil() as i64 + 1) * 2
    }
}
