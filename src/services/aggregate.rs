//! Dashboard aggregates

use std::collections::HashSet;
use std::hash::Hash;

/// Sum of an integer field, saturating at the `i64` bounds
pub fn sum<T>(items: &[T], value: impl Fn(&T) -> i64) -> i64 {
    items.iter().map(value).fold(0_i64, i64::saturating_add)
}

pub fn count_where<T>(items: &[T], predicate: impl Fn(&T) -> bool) -> usize {
    items.iter().filter(|item| predicate(*item)).count()
}

/// Number of distinct keys, ignoring items without one
pub fn distinct_non_null<T, K: Eq + Hash>(items: &[T], key: impl Fn(&T) -> Option<K>) -> usize {
    items.iter().filter_map(key).collect::<HashSet<_>>().len()
}

/// Mean of the present values; `None` when there are none
pub fn average<T>(items: &[T], value: impl Fn(&T) -> Option<f64>) -> Option<f64> {
    let values: Vec<f64> = items.iter().filter_map(value).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// `part` as a percentage of `whole`, rounded to two decimals; 0 when `whole` is 0
pub fn rate(part: i64, whole: i64) -> f64 {
    if whole <= 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 10_000.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_sum_of_amounts() {
        let amounts = [500_i64, 1000, 2000];
        assert_eq!(sum(&amounts, |a| *a), 3500);
        assert_eq!(sum(&[] as &[i64], |a| *a), 0);
    }

    #[test]
    fn test_sum_saturates_instead_of_overflowing() {
        assert_eq!(sum(&[i64::MAX, 1, 1], |a| *a), i64::MAX);
        assert_eq!(sum(&[i64::MIN, -1], |a| *a), i64::MIN);
    }

    #[test]
    fn test_distinct_non_null() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let hostel_ids = [Some(a), Some(a), Some(b), None];
        assert_eq!(distinct_non_null(&hostel_ids, |id| *id), 2);
    }

    #[test]
    fn test_count_average_rate() {
        let scores = [Some(80.0), None, Some(90.0)];
        assert_eq!(count_where(&scores, Option::is_some), 2);
        assert_eq!(average(&scores, |s| *s), Some(85.0));
        assert_eq!(average(&[None::<f64>], |s| *s), None);

        assert_eq!(rate(45, 120), 37.5);
        assert_eq!(rate(1, 3), 33.33);
        assert_eq!(rate(5, 0), 0.0);
    }
}
