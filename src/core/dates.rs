//! Challenge date arithmetic.
//!
//! All day and week numbering is relative to the cohort start date. Day 1 is the start
//! date itself, week 1 covers days 1-7, and a cohort may start on any weekday.
//!
//! The challenge day is kept in its raw, unclamped form (zero or negative before the
//! start). Callers that display it clamp explicitly with [`display_challenge_day`].

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Days in a challenge week
pub const DAYS_PER_WEEK: i64 = 7;

/// Kitchen lead time: a week's meals must be chosen this many days before it starts
pub const DEADLINE_LEAD_DAYS: i64 = 3;

/// Challenge length used when a cohort does not carry a usable duration
pub const DEFAULT_DURATION_WEEKS: u32 = 3;

/// Deadline and timing details for one challenge week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeWeekInfo {
    /// 1-based week number
    pub week_number: u32,
    /// First challenge day of the week (1, 8, 15, ...)
    pub week_start_day: u32,
    /// Last challenge day of the week (7, 14, 21, ...)
    pub week_end_day: u32,
    /// Last instant at which the week's meals may be chosen
    pub deadline: NaiveDateTime,
    /// Whether `deadline` is already behind us
    pub is_deadline_passed: bool,
    /// Whole days until the deadline, never negative
    pub days_until_deadline: i64,
    /// Whole hours until the deadline, never negative
    pub hours_until_deadline: i64,
    /// Deadline is still ahead but less than 24 hours away
    pub is_less_than_24_hours: bool,
}

/// Normalizes a stored cohort duration, falling back to [`DEFAULT_DURATION_WEEKS`].
#[must_use]
pub fn total_weeks(duration_weeks: i32) -> u32 {
    u32::try_from(duration_weeks)
        .ok()
        .filter(|weeks| *weeks > 0)
        .unwrap_or(DEFAULT_DURATION_WEEKS)
}

/// Week containing `challenge_day`, capped at `total_weeks`.
///
/// Days before the start (zero or negative) belong to week 1, which is the week whose
/// deadline matters before the clock starts.
#[must_use]
pub fn challenge_week(challenge_day: i64, total_weeks: u32) -> u32 {
    if challenge_day <= 0 {
        return 1;
    }
    let week = (challenge_day + DAYS_PER_WEEK - 1) / DAYS_PER_WEEK;
    u32::try_from(week).unwrap_or(u32::MAX).min(total_weeks)
}

/// Raw challenge day for `now`: 1 on the start date, zero or negative before it.
#[must_use]
pub fn challenge_day(cohort_start: NaiveDate, now: NaiveDateTime) -> i64 {
    challenge_day_for_date(cohort_start, now.date())
}

/// Raw challenge day for a calendar date.
#[must_use]
pub fn challenge_day_for_date(cohort_start: NaiveDate, date: NaiveDate) -> i64 {
    (date - cohort_start).num_days() + 1
}

/// Clamps a raw challenge day into `[1, total_weeks * 7]` for display.
#[must_use]
pub fn display_challenge_day(raw_day: i64, total_weeks: u32) -> u32 {
    let total_days = i64::from(total_weeks) * DAYS_PER_WEEK;
    let clamped = raw_day.clamp(1, total_days.max(1));
    u32::try_from(clamped).unwrap_or(1)
}

/// Calendar date on which `week` begins.
#[must_use]
pub fn week_start_date(cohort_start: NaiveDate, week: u32) -> NaiveDate {
    cohort_start + Duration::days(DAYS_PER_WEEK * (i64::from(week) - 1))
}

/// Meal-selection deadline for `week`: 23:59:59.999 local time, three days before the
/// week starts.
#[must_use]
pub fn week_deadline(cohort_start: NaiveDate, week: u32) -> NaiveDateTime {
    let deadline_day = week_start_date(cohort_start, week) - Duration::days(DEADLINE_LEAD_DAYS);
    end_of_day(deadline_day)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    (date + Duration::days(1)).and_time(NaiveTime::MIN) - Duration::milliseconds(1)
}

/// Calendar date of `day_of_week` (1-7) within challenge `week`.
#[must_use]
pub fn date_for_challenge_day(cohort_start: NaiveDate, week: u32, day_of_week: u32) -> NaiveDate {
    let offset = DAYS_PER_WEEK * (i64::from(week) - 1) + i64::from(day_of_week) - 1;
    cohort_start + Duration::days(offset)
}

/// Real weekday of a challenge-relative day. Day 1 of week 1 is whatever weekday the
/// cohort started on.
#[must_use]
pub fn weekday_for_challenge_day(cohort_start: NaiveDate, week: u32, day_of_week: u32) -> Weekday {
    date_for_challenge_day(cohort_start, week, day_of_week).weekday()
}

/// English weekday name of a challenge-relative day.
#[must_use]
pub fn weekday_name_for_challenge_day(
    cohort_start: NaiveDate,
    week: u32,
    day_of_week: u32,
) -> &'static str {
    weekday_name(weekday_for_challenge_day(cohort_start, week, day_of_week))
}

/// English name of a weekday.
#[must_use]
pub const fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Sunday that starts the calendar week containing `date`.
#[must_use]
pub fn week_start_sunday(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// True while `now` is before the cohort start date.
#[must_use]
pub fn is_before_challenge_start(cohort_start: NaiveDate, now: NaiveDateTime) -> bool {
    now < cohort_start.and_time(NaiveTime::MIN)
}

/// Countdown copy for a number of whole hours until a deadline.
#[must_use]
pub fn format_countdown(hours: i64) -> String {
    match hours {
        h if h < 0 => "deadline passed".to_string(),
        0 => "less than 1 hour".to_string(),
        1 => "1 hour remaining".to_string(),
        h if h < 24 => format!("{h} hours remaining"),
        h if h < 48 => format!("1 day, {} hours remaining", h - 24),
        h => format!("{} days remaining", h / 24),
    }
}

/// Countdown copy for `deadline` as seen from `now`.
///
/// Reports "deadline passed" as soon as `now` is past the deadline, even when less than a
/// whole hour has elapsed.
#[must_use]
pub fn deadline_countdown(deadline: NaiveDateTime, now: NaiveDateTime) -> String {
    if now > deadline {
        return format_countdown(-1);
    }
    format_countdown((deadline - now).num_hours())
}

/// Deadline rendered for display, e.g. `Friday 13 Jun at 23:59`.
#[must_use]
pub fn format_deadline(deadline: NaiveDateTime) -> String {
    deadline.format("%A %-d %b at %H:%M").to_string()
}

/// Timing details for `week` as seen from `now`.
#[must_use]
pub fn week_info(cohort_start: NaiveDate, week: u32, now: NaiveDateTime) -> ChallengeWeekInfo {
    let deadline = week_deadline(cohort_start, week);
    let remaining = deadline - now;
    let week_end_day = week.saturating_mul(7);

    ChallengeWeekInfo {
        week_number: week,
        week_start_day: week_end_day.saturating_sub(6),
        week_end_day,
        deadline,
        is_deadline_passed: deadline < now,
        days_until_deadline: remaining.num_days().max(0),
        hours_until_deadline: remaining.num_hours().max(0),
        is_less_than_24_hours: remaining > Duration::zero() && remaining < Duration::hours(24),
    }
}

/// Weeks still open for selection: week 1 before the start, otherwise the current week
/// through the last one.
#[must_use]
pub fn weeks_needing_selection(raw_day: i64, total_weeks: u32) -> Vec<u32> {
    if raw_day <= 0 {
        return vec![1];
    }
    (challenge_week(raw_day, total_weeks)..=total_weeks).collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    #[test]
    fn test_challenge_week_boundaries() {
        assert_eq!(challenge_week(1, 3), 1);
        assert_eq!(challenge_week(7, 3), 1);
        assert_eq!(challenge_week(8, 3), 2);
        assert_eq!(challenge_week(21, 3), 3);
        // Capped at the last week
        assert_eq!(challenge_week(40, 3), 3);
        // Before the start counts as week 1
        assert_eq!(challenge_week(0, 3), 1);
        assert_eq!(challenge_week(-5, 4), 1);
    }

    #[test]
    fn test_week_deadline_is_three_days_before_week_start() {
        let start = date(2025, 6, 9);
        let deadline = week_deadline(start, 2);
        assert_eq!(week_start_date(start, 2), date(2025, 6, 16));
        assert_eq!(
            deadline,
            date(2025, 6, 13).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn test_week_one_deadline_precedes_start() {
        let start = date(2025, 6, 9);
        assert_eq!(
            week_deadline(start, 1),
            date(2025, 6, 6).and_hms_milli_opt(23, 59, 59, 999).unwrap()
        );
    }

    #[test]
    fn test_challenge_day_raw_and_display() {
        let start = date(2025, 6, 9);
        assert_eq!(challenge_day(start, at(2025, 6, 9, 0, 0)), 1);
        assert_eq!(challenge_day(start, at(2025, 6, 9, 23, 59)), 1);
        assert_eq!(challenge_day(start, at(2025, 6, 15, 12, 0)), 7);
        assert_eq!(challenge_day(start, at(2025, 6, 8, 23, 0)), 0);
        assert_eq!(challenge_day(start, at(2025, 6, 5, 8, 0)), -3);

        assert_eq!(display_challenge_day(-3, 3), 1);
        assert_eq!(display_challenge_day(10, 3), 10);
        assert_eq!(display_challenge_day(30, 3), 21);
    }

    #[test]
    fn test_total_weeks_defaults_on_bad_duration() {
        assert_eq!(total_weeks(4), 4);
        assert_eq!(total_weeks(0), DEFAULT_DURATION_WEEKS);
        assert_eq!(total_weeks(-2), DEFAULT_DURATION_WEEKS);
    }

    #[test]
    fn test_weekday_for_challenge_day_follows_cohort_start() {
        // 2025-06-07 is a Saturday
        let start = date(2025, 6, 7);
        assert_eq!(weekday_for_challenge_day(start, 1, 1), Weekday::Sat);
        assert_eq!(weekday_name_for_challenge_day(start, 1, 2), "Sunday");
        assert_eq!(weekday_name_for_challenge_day(start, 2, 3), "Monday");
        assert_eq!(date_for_challenge_day(start, 2, 3), date(2025, 6, 16));
    }

    #[test]
    fn test_week_start_sunday() {
        assert_eq!(week_start_sunday(date(2025, 6, 15)), date(2025, 6, 15));
        assert_eq!(week_start_sunday(date(2025, 6, 18)), date(2025, 6, 15));
        assert_eq!(week_start_sunday(date(2025, 6, 21)), date(2025, 6, 15));
    }

    #[test]
    fn test_format_countdown_ranges() {
        assert_eq!(format_countdown(-3), "deadline passed");
        assert_eq!(format_countdown(0), "less than 1 hour");
        assert_eq!(format_countdown(1), "1 hour remaining");
        assert_eq!(format_countdown(5), "5 hours remaining");
        assert_eq!(format_countdown(23), "23 hours remaining");
        assert_eq!(format_countdown(24), "1 day, 0 hours remaining");
        assert_eq!(format_countdown(30), "1 day, 6 hours remaining");
        assert_eq!(format_countdown(48), "2 days remaining");
        assert_eq!(format_countdown(100), "4 days remaining");
    }

    #[test]
    fn test_deadline_countdown_reports_passed_within_first_hour() {
        let deadline = week_deadline(date(2025, 6, 9), 2);
        let just_after = deadline + Duration::minutes(20);
        assert_eq!(deadline_countdown(deadline, just_after), "deadline passed");

        let evening = at(2025, 6, 13, 20, 0);
        assert_eq!(deadline_countdown(deadline, evening), "3 hours remaining");
    }

    #[test]
    fn test_week_info_flags() {
        let start = date(2025, 6, 9);
        let info = week_info(start, 2, at(2025, 6, 13, 8, 0));
        assert_eq!(info.week_start_day, 8);
        assert_eq!(info.week_end_day, 14);
        assert!(!info.is_deadline_passed);
        assert!(info.is_less_than_24_hours);
        assert_eq!(info.hours_until_deadline, 15);
        assert_eq!(info.days_until_deadline, 0);

        let later = week_info(start, 2, at(2025, 6, 14, 0, 30));
        assert!(later.is_deadline_passed);
        assert!(!later.is_less_than_24_hours);
        assert_eq!(later.hours_until_deadline, 0);
    }

    #[test]
    fn test_weeks_needing_selection() {
        assert_eq!(weeks_needing_selection(-2, 4), vec![1]);
        assert_eq!(weeks_needing_selection(9, 4), vec![2, 3, 4]);
        assert_eq!(weeks_needing_selection(28, 4), vec![4]);
    }

    #[test]
    fn test_is_before_challenge_start() {
        let start = date(2025, 6, 9);
        assert!(is_before_challenge_start(start, at(2025, 6, 8, 23, 59)));
        assert!(!is_before_challenge_start(start, at(2025, 6, 9, 0, 0)));
    }

    #[test]
    fn test_format_deadline() {
        let deadline = week_deadline(date(2025, 6, 9), 2);
        assert_eq!(format_deadline(deadline), "Friday 13 Jun at 23:59");
    }
}
