//! Observed-duration plausibility filtering

use tracing::debug;

use crate::defaults::PlanningPolicy;
use crate::services::distance::DistanceOracle;
use crate::types::trip::ValidatedTrip;

/// Rejects trips whose observed duration is out of line with the
/// expected travel time for their pair. Filters data-entry errors and
/// telemetry anomalies; rejection is silent, not an error.
pub struct TripValidator<'a> {
    oracle: &'a DistanceOracle,
    policy: &'a PlanningPolicy,
}

impl<'a> TripValidator<'a> {
    pub fn new(oracle: &'a DistanceOracle, policy: &'a PlanningPolicy) -> Self {
        Self { oracle, policy }
    }

    /// Accepts iff observed minutes fall in
    /// `[ratio_min x expected, ratio_max x expected)`. A pair the
    /// oracle does not know rejects the trip outright.
    pub fn accept(&self, trip: &ValidatedTrip) -> bool {
        let Ok(expected) = self.oracle.lookup(trip.origin, trip.destination) else {
            return false;
        };
        let observed = trip.observed_minutes() as f64;
        observed >= expected.minutes * self.policy.plausible_ratio_min
            && observed < expected.minutes * self.policy.plausible_ratio_max
    }

    pub fn retain_plausible(&self, trips: Vec<ValidatedTrip>) -> Vec<ValidatedTrip> {
        let before = trips.len();
        let kept: Vec<ValidatedTrip> = trips.into_iter().filter(|t| self.accept(t)).collect();
        if kept.len() < before {
            debug!("Plausibility filter kept {} of {} trips", kept.len(), before);
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::location::DistanceRow;

    fn trip_with_observed(observed: i64) -> ValidatedTrip {
        ValidatedTrip {
            trip_id: 1,
            origin: 10,
            destination: 20,
            start_minutes: 450,
            end_minutes: 450 + observed,
            start_day_offset: 0,
            end_day_offset: 0,
            vehicle_id: Some("U-100".into()),
            truck_type: "T1".into(),
        }
    }

    /// Expected minutes come out at 100 x 1.6 = 160.
    fn validator_fixture() -> (DistanceOracle, PlanningPolicy) {
        let rows = vec![DistanceRow { origin: 10, destination: 20, travel_time: 100, kilometers: 80.0 }];
        let policy = PlanningPolicy::default();
        (DistanceOracle::from_rows(&rows, &policy), policy)
    }

    #[test]
    fn test_band_boundaries() {
        let (oracle, policy) = validator_fixture();
        let validator = TripValidator::new(&oracle, &policy);

        // expected 160: band is [80, 320)
        assert!(!validator.accept(&trip_with_observed(79)));
        assert!(validator.accept(&trip_with_observed(80)));
        assert!(validator.accept(&trip_with_observed(160)));
        assert!(validator.accept(&trip_with_observed(319)));
        assert!(!validator.accept(&trip_with_observed(320)));
    }

    #[test]
    fn test_boundary_ratios() {
        let (oracle, policy) = validator_fixture();
        let validator = TripValidator::new(&oracle, &policy);

        for (ratio, expected_accept) in [(0.49, false), (0.5, true), (1.99, true), (2.0, false)] {
            let observed = (160.0 * ratio) as i64;
            assert_eq!(
                validator.accept(&trip_with_observed(observed)),
                expected_accept,
                "ratio {ratio} observed {observed}"
            );
        }
    }

    #[test]
    fn test_unknown_pair_rejected() {
        let (oracle, policy) = validator_fixture();
        let validator = TripValidator::new(&oracle, &policy);
        let mut trip = trip_with_observed(160);
        trip.destination = 99;
        assert!(!validator.accept(&trip));
    }

    #[test]
    fn test_retain_plausible_preserves_order() {
        let (oracle, policy) = validator_fixture();
        let validator = TripValidator::new(&oracle, &policy);
        let kept = validator.retain_plausible(vec![
            trip_with_observed(100),
            trip_with_observed(500),
            trip_with_observed(200),
        ]);
        assert_eq!(kept.iter().map(|t| t.observed_minutes()).collect::<Vec<_>>(), vec![100, 200]);
    }
}
