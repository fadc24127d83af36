//! Distance and rating computations for fountain data.
//!
//! Everything here is pure: no I/O, no shared state. The state crate calls
//! into these functions when it annotates the working set with distances and
//! when it applies an optimistic rating overlay.

/// Great-circle distance and its user-facing formatting.
pub mod distance {
    use berez_api::fountain::Fountain;
    use berez_api::location::{Coordinates, Location};

    /// Mean Earth radius in meters.
    pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

    /// Distances below this many meters are shown in meters, above in km.
    pub const KILOMETER_THRESHOLD: f64 = 1000.0;

    /// Anything with a latitude and longitude in decimal degrees.
    pub trait GeoPoint {
        fn latitude(&self) -> f64;
        fn longitude(&self) -> f64;
    }

    impl GeoPoint for Coordinates {
        fn latitude(&self) -> f64 {
            self.latitude
        }
        fn longitude(&self) -> f64 {
            self.longitude
        }
    }

    impl GeoPoint for Location {
        fn latitude(&self) -> f64 {
            self.latitude
        }
        fn longitude(&self) -> f64 {
            self.longitude
        }
    }

    impl GeoPoint for Fountain {
        fn latitude(&self) -> f64 {
            self.latitude
        }
        fn longitude(&self) -> f64 {
            self.longitude
        }
    }

    impl GeoPoint for (f64, f64) {
        fn latitude(&self) -> f64 {
            self.0
        }
        fn longitude(&self) -> f64 {
            self.1
        }
    }

    /// Haversine distance between two points, in meters.
    pub fn haversine<A: GeoPoint + ?Sized, B: GeoPoint + ?Sized>(a: &A, b: &B) -> f64 {
        let phi_a = a.latitude().to_radians();
        let phi_b = b.latitude().to_radians();
        let delta_phi = (b.latitude() - a.latitude()).to_radians();
        let delta_lambda = (b.longitude() - a.longitude()).to_radians();

        let h = (delta_phi / 2.0).sin().powi(2)
            + phi_a.cos() * phi_b.cos() * (delta_lambda / 2.0).sin().powi(2);
        // Rounding can push h a hair past 1 for antipodal points.
        2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
    }

    /// Format a distance: whole meters below 1 km, kilometers with one
    /// decimal from 1 km up.
    pub fn format_distance(meters: f64) -> String {
        if meters < KILOMETER_THRESHOLD {
            format!("{} m", meters.round() as i64)
        } else {
            format!("{:.1} km", meters / 1000.0)
        }
    }

    /// Sort fountains nearest-first from `origin`. Equal distances keep the
    /// server's order.
    pub fn sort_by_distance<P: GeoPoint + ?Sized>(fountains: &mut [Fountain], origin: &P) {
        fountains.sort_by(|a, b| haversine(origin, a).total_cmp(&haversine(origin, b)));
    }

    /// Walking directions link offered on each fountain card.
    pub fn directions_url<P: GeoPoint + ?Sized>(destination: &P) -> String {
        format!(
            "https://www.google.com/maps/dir/?api=1&destination={},{}",
            destination.latitude(),
            destination.longitude()
        )
    }

}

/// Optimistic rating aggregation.
///
/// When a review is accepted locally the displayed average is recomputed
/// right away as an exact incremental mean. The value is stored unrounded;
/// only [`format_rating`] rounds. The next full refetch replaces the result
/// with the backend's authoritative numbers.
pub mod rating {
    use berez_api::fountain::Fountain;
    use thiserror::Error;

    pub const MIN_RATING: u8 = 1;
    pub const MAX_RATING: u8 = 5;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum RatingError {
        #[error("rating {0} is out of range (1-5)")]
        OutOfRange(u8),

        #[error("fountain {0} already holds the maximum number of ratings")]
        CountOverflow(i64),
    }

    /// Incremental weighted mean of `count` ratings averaging `average`
    /// plus one more rating.
    pub fn incremental_mean(average: f64, count: u32, rating: u8) -> f64 {
        let count = f64::from(count);
        (average * count + f64::from(rating)) / (count + 1.0)
    }

    /// Fold one new general rating into a fountain's aggregate.
    ///
    /// Returns the updated fountain; the input is left untouched.
    pub fn apply_optimistic(fountain: &Fountain, rating: u8) -> Result<Fountain, RatingError> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(RatingError::OutOfRange(rating));
        }
        // An unrated fountain carries average 0; treat it as empty.
        let (average, count) = if fountain.number_of_ratings == 0 {
            (0.0, 0)
        } else {
            (fountain.average_general_rating, fountain.number_of_ratings)
        };
        let next_count = count
            .checked_add(1)
            .ok_or(RatingError::CountOverflow(fountain.id))?;
        let updated = Fountain {
            average_general_rating: incremental_mean(average, count, rating),
            number_of_ratings: next_count,
            ..fountain.clone()
        };
        log::debug!(
            "[Berez] rating: fountain {} {:.3} ({}) -> {:.3} ({})",
            fountain.id,
            fountain.average_general_rating,
            fountain.number_of_ratings,
            updated.average_general_rating,
            updated.number_of_ratings
        );
        Ok(updated)
    }

    /// Display form of an average: one decimal, or a dash when unrated.
    pub fn format_rating(fountain: &Fountain) -> String {
        if fountain.number_of_ratings == 0 {
            "-".to_string()
        } else {
            format!("{:.1}", fountain.average_general_rating)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        fn fountain(average: f64, count: u32) -> Fountain {
            Fountain {
                id: 1,
                address: "Dizengoff Square".to_string(),
                latitude: 32.086,
                longitude: 34.782,
                dog_friendly: true,
                bottle_refill: false,
                fountain_type: Default::default(),
                average_general_rating: average,
                number_of_ratings: count,
                status: Default::default(),
                last_updated: None,
            }
        }

        #[test]
        fn test_apply_optimistic_example() {
            let updated = apply_optimistic(&fountain(4.0, 3), 5).unwrap();
            assert!((updated.average_general_rating - 4.25).abs() < 1e-12);
            assert_eq!(updated.number_of_ratings, 4);
            assert_eq!(updated.address, "Dizengoff Square");
        }

        #[test]
        fn test_apply_optimistic_first_rating() {
            let updated = apply_optimistic(&fountain(0.0, 0), 3).unwrap();
            assert_eq!(updated.average_general_rating, 3.0);
            assert_eq!(updated.number_of_ratings, 1);
        }

        #[test]
        fn test_apply_optimistic_stays_between_old_and_new() {
            for count in [0u32, 1, 2, 7, 100, 10_000] {
                for tenths in 0..=50 {
                    let average = if count == 0 { 0.0 } else { f64::from(tenths) / 10.0 };
                    for rating in MIN_RATING..=MAX_RATING {
                        let updated = apply_optimistic(&fountain(average, count), rating).unwrap();
                        let low = average.min(f64::from(rating));
                        let high = average.max(f64::from(rating));
                        let got = updated.average_general_rating;
                        assert!(
                            got >= low - 1e-9 && got <= high + 1e-9,
                            "avg {} count {} rating {} -> {}",
                            average,
                            count,
                            rating,
                            got
                        );
                        assert_eq!(updated.number_of_ratings, count + 1);
                    }
                }
            }
        }

        #[test]
        fn test_apply_optimistic_matches_batch_mean() {
            let ratings = [5u8, 3, 4, 1, 5, 2];
            let mut current = fountain(0.0, 0);
            for r in ratings {
                current = apply_optimistic(&current, r).unwrap();
            }
            let mean = ratings.iter().map(|r| f64::from(*r)).sum::<f64>() / ratings.len() as f64;
            assert!((current.average_general_rating - mean).abs() < 1e-12);
        }

        #[test]
        fn test_apply_optimistic_rejects_out_of_range() {
            let original = fountain(4.0, 3);
            assert_eq!(
                apply_optimistic(&original, 0),
                Err(RatingError::OutOfRange(0))
            );
            assert_eq!(
                apply_optimistic(&original, 6),
                Err(RatingError::OutOfRange(6))
            );
        }

        #[test]
        fn test_apply_optimistic_rejects_count_overflow() {
            assert_eq!(
                apply_optimistic(&fountain(4.0, u32::MAX), 5),
                Err(RatingError::CountOverflow(1))
            );
            let near_max = apply_optimistic(&fountain(4.0, u32::MAX - 1), 5).unwrap();
            assert_eq!(near_max.number_of_ratings, u32::MAX);
        }

        #[test]
        fn test_format_rating() {
            assert_eq!(format_rating(&fountain(0.0, 0)), "-");
            assert_eq!(format_rating(&fountain(4.26, 4)), "4.3");
            assert_eq!(format_rating(&fountain(4.0, 3)), "4.0");
        }
    }
}
