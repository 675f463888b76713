//! Fire-and-forget persistence of local mutations.
//!
//! The session applies every mutation to its in-memory state first, then hands a
//! [`SyncEvent`] to its [`SyncHandle`]. A [`SyncWorker`] drains the channel and writes each
//! event to the record store. Failures are logged and never rolled back: local and stored
//! state may disagree until the next full load.

use crate::{
    core::{
        habits::{BreakfastPhoto, CheckIn, DailyHabit, HabitUpdate, Streak},
        meals::MealSelection,
    },
    db::{habits, meals},
    errors::Result,
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, error, info, warn};

/// A local mutation waiting to be written to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// A habit field changed; `habit` is the full row after the change
    Habit {
        habit: DailyHabit,
        update: HabitUpdate,
        at: NaiveDateTime,
    },
    /// A check-in was submitted
    CheckIn { check_in: CheckIn, at: NaiveDateTime },
    /// The streak moved
    Streak { streak: Streak, at: NaiveDateTime },
    /// The weekly exercise question was answered
    WeeklyExercise {
        week_start: NaiveDate,
        completed: bool,
        at: NaiveDateTime,
    },
    /// An unlocked meal selection changed
    MealSelection {
        selection: MealSelection,
        week_start: NaiveDate,
        at: NaiveDateTime,
    },
    /// A breakfast photo was attached
    BreakfastPhoto(BreakfastPhoto),
    /// A breakfast photo was removed
    BreakfastPhotoRemoved { date: NaiveDate },
}

impl SyncEvent {
    const fn kind(&self) -> &'static str {
        match self {
            Self::Habit { .. } => "habit",
            Self::CheckIn { .. } => "check_in",
            Self::Streak { .. } => "streak",
            Self::WeeklyExercise { .. } => "weekly_exercise",
            Self::MealSelection { .. } => "meal_selection",
            Self::BreakfastPhoto(_) => "breakfast_photo",
            Self::BreakfastPhotoRemoved { .. } => "breakfast_photo_removed",
        }
    }
}

/// Sending side of the sync channel.
///
/// A detached handle has no worker behind it and drops every event, which is what a
/// signed-out session wants.
#[derive(Debug, Clone)]
pub struct SyncHandle {
    sender: Option<mpsc::UnboundedSender<SyncEvent>>,
}

impl SyncHandle {
    /// Creates a handle and the receiver a [`SyncWorker`] drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(sender),
            },
            receiver,
        )
    }

    /// A handle that discards events.
    #[must_use]
    pub const fn detached() -> Self {
        Self { sender: None }
    }

    /// Whether events reach a worker.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.sender.is_some()
    }

    /// Queues `event` without waiting for it to be written.
    pub fn notify(&self, event: SyncEvent) {
        let Some(sender) = &self.sender else {
            debug!("No sync worker; dropping {} event", event.kind());
            return;
        };
        if let Err(e) = sender.send(event) {
            warn!("Sync worker has stopped; dropping {} event", e.0.kind());
        }
    }
}

/// Writes queued events to the record store for one user.
#[derive(Debug)]
pub struct SyncWorker {
    db: DatabaseConnection,
    user_id: String,
    receiver: mpsc::UnboundedReceiver<SyncEvent>,
}

impl SyncWorker {
    #[must_use]
    pub const fn new(
        db: DatabaseConnection,
        user_id: String,
        receiver: mpsc::UnboundedReceiver<SyncEvent>,
    ) -> Self {
        Self {
            db,
            user_id,
            receiver,
        }
    }

    /// Runs the worker on the current runtime until every handle is dropped. The task
    /// yields the number of failed events.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<usize> {
        tokio::spawn(self.run())
    }

    /// Drains the channel, applying events in order.
    ///
    /// # Returns
    /// Number of events that failed to apply
    pub async fn run(mut self) -> usize {
        let mut failures = 0;
        while let Some(event) = self.receiver.recv().await {
            let kind = event.kind();
            match self.apply(event).await {
                Ok(()) => debug!("Synced {} for {}", kind, self.user_id),
                Err(e) => {
                    failures += 1;
                    error!("Failed to sync {} for {}: {}", kind, self.user_id, e);
                }
            }
        }
        info!("Sync worker for {} stopped", self.user_id);
        failures
    }

    async fn apply(&self, event: SyncEvent) -> Result<()> {
        let db = &self.db;
        let user_id = self.user_id.as_str();

        match event {
            SyncEvent::Habit { habit, update, at } => {
                habits::upsert_habit(db, user_id, &habit, update, at).await
            }
            SyncEvent::CheckIn { check_in, at } => {
                habits::upsert_check_in(db, user_id, &check_in, at).await
            }
            SyncEvent::Streak { streak, at } => habits::save_streak(db, user_id, &streak, at).await,
            SyncEvent::WeeklyExercise {
                week_start,
                completed,
                at,
            } => habits::upsert_weekly_exercise(db, user_id, week_start, completed, at).await,
            SyncEvent::MealSelection {
                selection,
                week_start,
                at,
            } => {
                let written =
                    meals::upsert_meal_selection(db, user_id, &selection, week_start, at).await?;
                if !written {
                    warn!(
                        "Week {} is locked in the store; local edits were not saved",
                        selection.challenge_week
                    );
                }
                Ok(())
            }
            SyncEvent::BreakfastPhoto(photo) => {
                habits::upsert_breakfast_photo(db, user_id, &photo).await
            }
            SyncEvent::BreakfastPhotoRemoved { date } => {
                habits::delete_breakfast_photo(db, user_id, date).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, date, init_test_tracing, setup_test_db};
    use sea_orm::ConnectionTrait;

    #[tokio::test]
    async fn test_worker_applies_events_in_order() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let (handle, receiver) = SyncHandle::channel();
        let worker = SyncWorker::new(db.clone(), "u1".to_string(), receiver).spawn();

        let day = date(2025, 6, 10);
        let mut habit = DailyHabit::empty(day);
        habit.water_ml = 250;
        handle.notify(SyncEvent::Habit {
            habit: habit.clone(),
            update: HabitUpdate::AddWaterMl(250),
            at: at(2025, 6, 10, 9, 0),
        });
        habit.water_ml = 500;
        handle.notify(SyncEvent::Habit {
            habit: habit.clone(),
            update: HabitUpdate::AddWaterMl(250),
            at: at(2025, 6, 10, 10, 0),
        });
        drop(handle);
        assert_eq!(worker.await.ok(), Some(0));

        let stored = habits::load_habits(&db, "u1", day).await?;
        assert_eq!(stored, vec![habit]);
        Ok(())
    }

    #[tokio::test]
    async fn test_failures_are_counted_not_raised() -> Result<()> {
        init_test_tracing();
        let db = setup_test_db().await?;
        let (handle, receiver) = SyncHandle::channel();
        let worker = SyncWorker::new(db.clone(), "u1".to_string(), receiver);

        handle.notify(SyncEvent::BreakfastPhotoRemoved {
            date: date(2025, 6, 10),
        });
        handle.notify(SyncEvent::WeeklyExercise {
            week_start: date(2025, 6, 15),
            completed: true,
            at: at(2025, 6, 15, 20, 0),
        });
        db.execute_unprepared("DROP TABLE breakfast_photos").await?;
        drop(handle);

        assert_eq!(worker.run().await, 1);
        assert_eq!(habits::load_weekly_exercise(&db, "u1").await?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_detached_handle_drops_events() {
        let handle = SyncHandle::detached();
        assert!(!handle.is_attached());
        handle.notify(SyncEvent::BreakfastPhotoRemoved {
            date: date(2025, 6, 10),
        });
    }
}
