//! Price-per-kilometer ranking

use crate::{Fare, RankedResult};

/// Returns `(price_per_km, price, distance_km)`.
///
/// A fare with no positive distance is infinitely expensive per kilometer, so
/// it sorts after every real fare without special cases in the comparator.
/// A ratio that is not a number is treated the same way.
pub fn rank_per_km(fare: &Fare) -> (f64, f64, f64) {
    let price = fare.price;
    let distance = fare.distance_km;
    let per_km = if distance > 0.0 {
        price / distance
    } else {
        f64::INFINITY
    };
    let per_km = if per_km.is_nan() { f64::INFINITY } else { per_km };
    (per_km, price, distance)
}

/// Lowest price per km wins; the earliest entry wins ties.
pub fn select_best(results: &[RankedResult]) -> Option<&RankedResult> {
    let mut iter = results.iter();
    let mut best = iter.next()?;
    for result in iter {
        if result.price_per_km < best.price_per_km {
            best = result;
        }
    }
    Some(best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Location;

    fn ranked(code: &str, price: f64, distance: f64) -> RankedResult {
        RankedResult::new(Location::new(code, code), Fare::new(price, distance))
    }

    #[test]
    fn test_price_per_km_normal() {
        let (per_km, price, distance) = rank_per_km(&Fare::new(100.0, 500.0));
        assert_eq!(price, 100.0);
        assert_eq!(distance, 500.0);
        assert!((per_km - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_price_per_km_zero_distance() {
        let (per_km, price, distance) = rank_per_km(&Fare::new(50.0, 0.0));
        assert_eq!(price, 50.0);
        assert_eq!(distance, 0.0);
        assert_eq!(per_km, f64::INFINITY);

        let (per_km, _, _) = rank_per_km(&Fare::new(0.0, 0.0));
        assert_eq!(per_km, f64::INFINITY);
    }

    #[test]
    fn test_select_best_picks_minimum() {
        let results = vec![ranked("A", 150.0, 500.0), ranked("B", 80.0, 400.0)];
        let best = select_best(&results).unwrap();
        assert_eq!(best.destination.code, "B");
    }

    #[test]
    fn test_select_best_first_wins_ties() {
        let results = vec![
            ranked("A", 100.0, 500.0),
            ranked("B", 40.0, 200.0),
            ranked("C", 20.0, 100.0),
        ];
        assert_eq!(select_best(&results).unwrap().destination.code, "A");
    }

    #[test]
    fn test_select_best_zero_distance_sorts_last() {
        let results = vec![ranked("FREE", 0.0, 0.0), ranked("PAID", 500.0, 100.0)];
        assert_eq!(select_best(&results).unwrap().destination.code, "PAID");

        let only_zero = vec![ranked("X", 10.0, 0.0), ranked("Y", 5.0, 0.0)];
        assert_eq!(select_best(&only_zero).unwrap().destination.code, "X");
    }

    #[test]
    fn test_price_per_km_never_nan() {
        let (per_km, _, _) = rank_per_km(&Fare::new(f64::NAN, 400.0));
        assert_eq!(per_km, f64::INFINITY);

        let (per_km, _, _) = rank_per_km(&Fare::new(100.0, f64::NAN));
        assert_eq!(per_km, f64::INFINITY);
    }

    #[test]
    fn test_select_best_ignores_unrankable_fares() {
        let results = vec![ranked("XXX", f64::NAN, 400.0), ranked("PAR", 80.0, 400.0)];
        assert_eq!(select_best(&results).unwrap().destination.code, "PAR");

        let results = vec![ranked("PAR", 80.0, 400.0), ranked("XXX", f64::NAN, 400.0)];
        assert_eq!(select_best(&results).unwrap().destination.code, "PAR");
    }

    #[test]
    fn test_select_best_empty() {
        assert!(select_best(&[]).is_none());
    }
}
