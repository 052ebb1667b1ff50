use carepoints_core::{ActivityType, Result};
use carepoints_persistence::sqlite::activity_days;
use chrono::{Duration, NaiveDate};
use sqlx::SqliteConnection;

/// Streak the user will have once an activity is recorded on `as_of`.
///
/// `days` holds distinct activity dates, newest first. Walks backward from the
/// day before `as_of` and counts consecutive days, inspecting at most
/// `max_days` days. A record already present on `as_of` does not add to the
/// count, so a second award on the same day holds the streak.
pub fn projected_streak(days: &[NaiveDate], as_of: NaiveDate, max_days: u32) -> i64 {
    let cap = i64::from(max_days.max(1));
    let mut streak = 1;
    let mut cursor = as_of - Duration::days(1);

    for day in days.iter().copied().filter(|d| *d < as_of) {
        if streak >= cap {
            break;
        }
        if day == cursor {
            streak += 1;
            cursor -= Duration::days(1);
        } else if day < cursor {
            break;
        }
    }

    streak
}

/// Streak as it stands on `as_of` without a new award.
///
/// Still alive if the last activity was today or yesterday, zero otherwise.
pub fn live_streak(days: &[NaiveDate], as_of: NaiveDate, max_days: u32) -> i64 {
    let yesterday = as_of - Duration::days(1);
    if days.contains(&as_of) {
        projected_streak(days, as_of, max_days)
    } else if days.contains(&yesterday) {
        projected_streak(days, yesterday, max_days)
    } else {
        0
    }
}

/// Activity dates inside the lookback window ending at `as_of`
pub async fn recent_days(
    conn: &mut SqliteConnection,
    user_id: &str,
    types: &[ActivityType],
    as_of: NaiveDate,
    max_days: u32,
) -> Result<Vec<NaiveDate>> {
    let from = as_of - Duration::days(i64::from(max_days));
    activity_days(&mut *conn, user_id, types, from, as_of).await
}

/// Projected streak for the next award of the given types on `as_of`
pub async fn current_streak(
    conn: &mut SqliteConnection,
    user_id: &str,
    types: &[ActivityType],
    as_of: NaiveDate,
    max_days: u32,
) -> Result<i64> {
    let days = recent_days(conn, user_id, types, as_of, max_days).await?;
    Ok(projected_streak(&days, as_of, max_days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap() + Duration::days(i64::from(n))
    }

    fn history(offsets: &[u32]) -> Vec<NaiveDate> {
        let mut days: Vec<NaiveDate> = offsets.iter().map(|n| day(*n)).collect();
        days.sort_by(|a, b| b.cmp(a));
        days
    }

    #[test]
    fn test_no_history_starts_at_one() {
        assert_eq!(projected_streak(&[], day(10), 365), 1);
        assert_eq!(live_streak(&[], day(10), 365), 0);
    }

    #[test]
    fn test_one_day_gap_continues() {
        let days = history(&[7, 8, 9]);
        assert_eq!(projected_streak(&days, day(10), 365), 4);
    }

    #[test]
    fn test_same_day_holds() {
        // Already active on day 10 after days 8 and 9
        let days = history(&[8, 9, 10]);
        assert_eq!(projected_streak(&days, day(10), 365), 3);
    }

    #[test]
    fn test_two_day_gap_resets() {
        let days = history(&[5, 6, 7, 8]);
        assert_eq!(projected_streak(&days, day(10), 365), 1);
        assert_eq!(live_streak(&days, day(10), 365), 0);
    }

    #[test]
    fn test_stops_at_first_gap() {
        let days = history(&[1, 2, 3, 5, 6, 8, 9]);
        assert_eq!(projected_streak(&days, day(10), 365), 3);
    }

    #[test]
    fn test_walk_is_capped() {
        let offsets: Vec<u32> = (0..400).collect();
        let days = history(&offsets);
        assert_eq!(projected_streak(&days, day(400), 365), 365);
        assert_eq!(projected_streak(&days, day(400), 30), 30);
    }

    #[test]
    fn test_live_streak_survives_until_end_of_next_day() {
        let days = history(&[7, 8, 9]);
        assert_eq!(live_streak(&days, day(9), 365), 3);
        assert_eq!(live_streak(&days, day(10), 365), 3);
        assert_eq!(live_streak(&days, day(11), 365), 0);
    }
}
