//! Periodic deadline countdown.
//!
//! A [`DeadlineTicker`] recomputes the countdown for one deadline on a fixed period and
//! publishes it on a watch channel. Dropping the ticker stops its task.

use crate::core::{clock::Clock, dates};
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle, time::MissedTickBehavior};
use tracing::trace;

/// Countdown state at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineSnapshot {
    pub deadline: NaiveDateTime,
    pub hours_remaining: i64,
    /// e.g. `1 day, 3 hours remaining`
    pub text: String,
    pub is_passed: bool,
    pub is_urgent: bool,
}

impl DeadlineSnapshot {
    /// Snapshot of `deadline` as seen from `now`.
    #[must_use]
    pub fn at(deadline: NaiveDateTime, now: NaiveDateTime) -> Self {
        let remaining = deadline - now;
        Self {
            deadline,
            hours_remaining: remaining.num_hours().max(0),
            text: dates::deadline_countdown(deadline, now),
            is_passed: now > deadline,
            is_urgent: remaining > Duration::zero() && remaining < Duration::hours(24),
        }
    }
}

/// Background task refreshing a [`DeadlineSnapshot`].
#[derive(Debug)]
pub struct DeadlineTicker {
    receiver: watch::Receiver<DeadlineSnapshot>,
    handle: JoinHandle<()>,
}

impl DeadlineTicker {
    /// Starts ticking every `period`. Must be called inside a tokio runtime.
    pub fn spawn(
        clock: Arc<dyn Clock>,
        deadline: NaiveDateTime,
        period: std::time::Duration,
    ) -> Self {
        let (sender, receiver) = watch::channel(DeadlineSnapshot::at(deadline, clock.now()));

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let snapshot = DeadlineSnapshot::at(deadline, clock.now());
                trace!("Countdown refreshed: {}", snapshot.text);
                if sender.send(snapshot).is_err() {
                    break;
                }
            }
        });

        Self { receiver, handle }
    }

    /// Latest snapshot.
    #[must_use]
    pub fn current(&self) -> DeadlineSnapshot {
        self.receiver.borrow().clone()
    }

    /// A receiver for observing refreshes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DeadlineSnapshot> {
        self.receiver.clone()
    }
}

impl Drop for DeadlineTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
