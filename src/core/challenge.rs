//! Challenge lifecycle projection.
//!
//! Derives the cohort status, current challenge day and remaining days from a cohort and
//! the current time. Pure: nothing here touches the store.

use crate::{
    core::dates::{self, DAYS_PER_WEEK},
    entities::cohort,
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the user stands relative to their cohort's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeStatus {
    /// No cohort assigned
    NotEnrolled,
    /// Cohort has not started yet
    Pending,
    /// Cohort is running
    Active,
    /// Cohort end date is behind us
    Ended,
}

impl ChallengeStatus {
    /// Stable snake-case identifier
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotEnrolled => "not_enrolled",
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Ended => "ended",
        }
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a user's challenge timeline at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeState {
    /// Lifecycle status
    pub status: ChallengeStatus,
    /// Unclamped challenge day (zero or negative before the start, 0 when not enrolled)
    pub raw_day: i64,
    /// Challenge day clamped to `[1, total_days]`, 0 when not enrolled
    pub current_day: u32,
    /// Number of weeks in the challenge
    pub total_weeks: u32,
    /// Number of days in the challenge
    pub total_days: u32,
    /// Days left after today while active, otherwise 0
    pub days_remaining: u32,
    /// Cohort start date, if enrolled
    pub start_date: Option<NaiveDate>,
}

impl ChallengeState {
    /// Projects `cohort` onto `now`.
    #[must_use]
    pub fn evaluate(cohort: Option<&cohort::Model>, now: NaiveDateTime) -> Self {
        let Some(cohort) = cohort else {
            return Self {
                status: ChallengeStatus::NotEnrolled,
                raw_day: 0,
                current_day: 0,
                total_weeks: 0,
                total_days: 0,
                days_remaining: 0,
                start_date: None,
            };
        };

        let total_weeks = dates::total_weeks(cohort.duration_weeks);
        let total_days = total_weeks.saturating_mul(7);
        let today = now.date();

        let status = if today < cohort.start_date {
            ChallengeStatus::Pending
        } else if today > cohort.end_date {
            ChallengeStatus::Ended
        } else {
            ChallengeStatus::Active
        };

        let raw_day = dates::challenge_day(cohort.start_date, now);
        let current_day = dates::display_challenge_day(raw_day, total_weeks);
        let days_remaining = if status == ChallengeStatus::Active {
            total_days.saturating_sub(current_day)
        } else {
            0
        };

        Self {
            status,
            raw_day,
            current_day,
            total_weeks,
            total_days,
            days_remaining,
            start_date: Some(cohort.start_date),
        }
    }

    /// Whether the user belongs to a cohort.
    #[must_use]
    pub fn is_enrolled(&self) -> bool {
        self.status != ChallengeStatus::NotEnrolled
    }

    /// Whether the cohort has not started yet.
    #[must_use]
    pub fn is_before_start(&self) -> bool {
        self.is_enrolled() && self.raw_day <= 0
    }

    /// Current challenge week, or 0 when not enrolled or before the start.
    #[must_use]
    pub fn current_week(&self) -> u32 {
        if !self.is_enrolled() || self.raw_day <= 0 {
            return 0;
        }
        dates::challenge_week(self.raw_day, self.total_weeks)
    }

    /// Whether the day view may show `date`: from the cohort start up to today.
    #[must_use]
    pub fn can_view_date(&self, date: NaiveDate, today: NaiveDate) -> bool {
        self.start_date
            .is_some_and(|start| date >= start && date <= today)
    }

    /// Last day of the challenge, if enrolled.
    #[must_use]
    pub fn last_day(&self) -> Option<NaiveDate> {
        self.start_date.map(|start| {
            start + chrono::Duration::days(i64::from(self.total_days) - 1)
                .max(chrono::Duration::zero())
        })
    }

    /// Whole weeks completed so far.
    #[must_use]
    pub fn completed_weeks(&self) -> u32 {
        if self.raw_day <= 0 {
            return 0;
        }
        let done = (self.raw_day - 1) / DAYS_PER_WEEK;
        u32::try_from(done).unwrap_or(0).min(self.total_weeks)
    }
}
