/// Streak thresholds and their multipliers in percent, highest first
const MULTIPLIER_TABLE: [(i64, i64); 4] = [(30, 250), (14, 200), (7, 150), (3, 125)];

/// Streak multiplier as an integer percentage (100 = x1.0)
pub fn multiplier_percent(streak_days: i64) -> i64 {
    MULTIPLIER_TABLE
        .iter()
        .find(|(threshold, _)| streak_days >= *threshold)
        .map(|(_, percent)| *percent)
        .unwrap_or(100)
}

pub fn multiplier(streak_days: i64) -> f64 {
    multiplier_percent(streak_days) as f64 / 100.0
}

/// `floor(points * multiplier)` in integer arithmetic, `None` on overflow
pub fn apply_multiplier(points: i64, streak_days: i64) -> Option<i64> {
    points
        .checked_mul(multiplier_percent(streak_days))
        .map(|scaled| scaled.div_euclid(100))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_boundaries() {
        assert_eq!(multiplier(1), 1.0);
        assert_eq!(multiplier(2), 1.0);
        assert_eq!(multiplier(3), 1.25);
        assert_eq!(multiplier(6), 1.25);
        assert_eq!(multiplier(7), 1.5);
        assert_eq!(multiplier(14), 2.0);
        assert_eq!(multiplier(29), 2.0);
        assert_eq!(multiplier(30), 2.5);
        assert_eq!(multiplier(365), 2.5);
    }

    #[test]
    fn test_non_decreasing_in_streak() {
        let mut previous = multiplier_percent(0);
        for streak in 1..=400 {
            let current = multiplier_percent(streak);
            assert!(current >= previous, "multiplier dropped at streak {}", streak);
            previous = current;
        }
    }

    #[test]
    fn test_result_is_floored() {
        assert_eq!(apply_multiplier(10, 3), Some(12));
        assert_eq!(apply_multiplier(15, 7), Some(22));
        assert_eq!(apply_multiplier(5, 30), Some(12));
        assert_eq!(apply_multiplier(0, 30), Some(0));
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(apply_multiplier(i64::MAX / 50, 1), None);
        assert_eq!(apply_multiplier(i64::MAX / 300, 30), Some((i64::MAX / 300) * 250 / 100));
        assert_eq!(apply_multiplier(i64::MAX / 200, 30), None);
    }
}
