//! Dashboard gating.
//!
//! Decides whether the dashboard must be replaced by a meal-selection screen, and whether
//! a deadline banner is shown instead. The decision is a pure function of the challenge
//! status, the week-1 lock check and the next week still waiting for a selection.

use crate::core::{
    access,
    challenge::{ChallengeState, ChallengeStatus},
    dates::{self, ChallengeWeekInfo},
};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;

/// Why the dashboard is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    /// Week 1 must be locked before the dashboard opens
    FirstSelectionRequired,
    /// A week's deadline passed and it was never locked
    DeadlinePassedWithoutSelection,
}

/// How loudly the deadline banner (or block) is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerUrgency {
    Normal,
    /// Deadline under 24 hours away
    Urgent,
    /// Dashboard is blocked
    Blocking,
}

/// Everything the gating decision depends on.
#[derive(Debug, Clone)]
pub struct GatingInput<'a> {
    /// Challenge lifecycle status
    pub status: ChallengeStatus,
    /// Whether now is before the cohort start
    pub is_before_start: bool,
    /// Week-1 lock as reported by the store; `None` while the check is still running
    pub week1_locked_remote: Option<bool>,
    /// Locally known locked weeks
    pub locked_weeks: &'a BTreeSet<u32>,
    /// Next week still waiting for a selection
    pub next_week: Option<ChallengeWeekInfo>,
}

/// Result of the gating decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatingDecision {
    pub should_block_dashboard: bool,
    pub blocking_reason: Option<BlockingReason>,
    pub week_needing_selection: Option<u32>,
    pub show_banner: bool,
    pub banner_urgency: BannerUrgency,
    /// Timing of the next week still waiting for a selection
    #[serde(skip)]
    pub next_week: Option<ChallengeWeekInfo>,
}

impl GatingDecision {
    fn open(next_week: Option<ChallengeWeekInfo>) -> Self {
        Self {
            should_block_dashboard: false,
            blocking_reason: None,
            week_needing_selection: None,
            show_banner: false,
            banner_urgency: BannerUrgency::Normal,
            next_week,
        }
    }

    fn blocked(
        reason: BlockingReason,
        week: u32,
        next_week: Option<ChallengeWeekInfo>,
    ) -> Self {
        Self {
            should_block_dashboard: true,
            blocking_reason: Some(reason),
            week_needing_selection: Some(week),
            show_banner: false,
            banner_urgency: BannerUrgency::Blocking,
            next_week,
        }
    }
}

/// Evaluates the gating table.
#[must_use]
pub fn evaluate(input: &GatingInput<'_>) -> GatingDecision {
    let next_week = input.next_week.clone();

    if matches!(
        input.status,
        ChallengeStatus::NotEnrolled | ChallengeStatus::Ended
    ) {
        return GatingDecision::open(next_week);
    }

    let Some(week1_remote) = input.week1_locked_remote else {
        return GatingDecision::open(next_week);
    };

    if input.status == ChallengeStatus::Pending || input.is_before_start {
        let week1_locked = week1_remote || input.locked_weeks.contains(&1);
        if !week1_locked {
            return GatingDecision::blocked(BlockingReason::FirstSelectionRequired, 1, next_week);
        }
    }

    let pending_week = input
        .next_week
        .as_ref()
        .filter(|info| !input.locked_weeks.contains(&info.week_number));

    if let (ChallengeStatus::Active, Some(info)) = (input.status, pending_week) {
        if info.is_deadline_passed {
            return GatingDecision::blocked(
                BlockingReason::DeadlinePassedWithoutSelection,
                info.week_number,
                next_week,
            );
        }

        let urgency = if info.is_less_than_24_hours {
            BannerUrgency::Urgent
        } else {
            BannerUrgency::Normal
        };
        return GatingDecision {
            week_needing_selection: Some(info.week_number),
            show_banner: true,
            banner_urgency: urgency,
            ..GatingDecision::open(next_week)
        };
    }

    GatingDecision::open(next_week)
}

/// Timing of the first unlocked week at or after the current week (week 1 before the
/// start). `None` when not enrolled or every remaining week is locked.
#[must_use]
pub fn next_unresolved_week(
    state: &ChallengeState,
    locked: &BTreeSet<u32>,
    now: NaiveDateTime,
) -> Option<ChallengeWeekInfo> {
    let start = state.start_date?;
    let from = if state.is_before_start() {
        1
    } else {
        state.current_week()
    };
    let week = access::next_unlocked_week(locked, from, state.total_weeks)?;
    Some(dates::week_info(start, week, now))
}
