//! Which meal weeks a user may open.
//!
//! Before the challenge starts a user can only work one week ahead of their last lock.
//! Once it runs, the current week is always open and the following one opens after the
//! current week is locked.

use crate::errors::{Error, Result};
use std::collections::BTreeSet;

/// Weeks the user may open, sorted and deduplicated.
///
/// # Arguments
/// * `locked` - Weeks whose selection is locked
/// * `current_week` - Current challenge week, 0 when not enrolled or before the start
/// * `total_weeks` - Length of the challenge in weeks
#[must_use]
pub fn accessible_weeks(locked: &BTreeSet<u32>, current_week: u32, total_weeks: u32) -> Vec<u32> {
    let mut weeks = locked.clone();

    if current_week == 0 {
        match locked.last() {
            None => {
                weeks.insert(1);
            }
            Some(&last) if last < total_weeks => {
                weeks.insert(last + 1);
            }
            Some(_) => {}
        }
    } else {
        weeks.insert(current_week);
        if locked.contains(&current_week) && current_week < total_weeks {
            weeks.insert(current_week + 1);
        }
    }

    weeks.into_iter().collect()
}

/// Validates a move from week `from` to week `to`.
///
/// Returns `to` when it is accessible, otherwise [`Error::WeekNotAccessible`] with copy that
/// can be shown to the user.
pub fn navigate_to_week(from: u32, to: u32, accessible: &[u32], total_weeks: u32) -> Result<u32> {
    if accessible.contains(&to) {
        return Ok(to);
    }

    let message = if to == 0 || to > total_weeks {
        format!("Week {to} is not part of this challenge.")
    } else if to > from {
        format!("Lock in your meals for week {from} to unlock week {to}.")
    } else {
        format!("Week {to} is not available.")
    };

    Err(Error::WeekNotAccessible { week: to, message })
}

/// Week to open first: the earliest accessible week that is not locked, otherwise the
/// earliest accessible week.
#[must_use]
pub fn initial_week(accessible: &[u32], locked: &BTreeSet<u32>) -> Option<u32> {
    accessible
        .iter()
        .copied()
        .find(|week| !locked.contains(week))
        .or_else(|| accessible.first().copied())
}

/// First week at or after `from` that is not locked, bounded by `total_weeks`.
#[must_use]
pub fn next_unlocked_week(locked: &BTreeSet<u32>, from: u32, total_weeks: u32) -> Option<u32> {
    (from.max(1)..=total_weeks).find(|week| !locked.contains(week))
}
