//! The per-user session: the single owner of in-memory challenge state.
//!
//! A [`ChallengeSession`] is populated by one batch load at start, then every mutation
//! goes through it. Mutations apply locally and synchronously, then queue a
//! [`SyncEvent`] for the record store. Locking a meal week, the week-1 check and account
//! deletion are the only operations that wait on the store.

use crate::{
    core::{
        access,
        challenge::{ChallengeState, ChallengeStatus},
        clock::Clock,
        countdown::DeadlineTicker,
        dates,
        gating::{self, GatingDecision, GatingInput},
        habits::{BreakfastPhoto, CheckInNotes, DailyHabit, HabitLedger, HabitUpdate, Streak},
        meals::{
            DeliveryPreference, MealChoice, MealMenu, MealSelection, MealSelectionStore, MealType,
            MealWeekStatus,
        },
    },
    db::{account, cohorts, habits, meals},
    entities::cohort,
    errors::Result,
    sync::{SyncEvent, SyncHandle},
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use std::{collections::BTreeSet, sync::Arc};
use tracing::{debug, error, info, instrument, warn};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub status: ChallengeStatus,
    /// Clamped challenge day, 0 when not enrolled
    pub current_day: u32,
    pub total_days: u32,
    pub days_remaining: u32,
    pub current_week: u32,
    pub streak: Streak,
    pub today: DailyHabit,
    pub checked_in_today: bool,
    pub can_check_in_today: bool,
    pub gating: GatingDecision,
}

/// In-memory challenge state for one signed-in user.
pub struct ChallengeSession {
    user_id: String,
    clock: Arc<dyn Clock>,
    cohort: Option<cohort::Model>,
    ledger: HabitLedger,
    meals: MealSelectionStore,
    menu: MealMenu,
    week1_locked_remote: Option<bool>,
    sync: SyncHandle,
}

impl std::fmt::Debug for ChallengeSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChallengeSession")
            .field("user_id", &self.user_id)
            .field("cohort", &self.cohort.as_ref().map(|c| &c.id))
            .field("now", &self.clock.now())
            .finish_non_exhaustive()
    }
}

impl ChallengeSession {
    /// Session with empty state, for a user whose data is not loaded from a store.
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        clock: Arc<dyn Clock>,
        cohort: Option<cohort::Model>,
        sync: SyncHandle,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            clock,
            cohort,
            ledger: HabitLedger::new(),
            meals: MealSelectionStore::new(),
            menu: MealMenu::default(),
            week1_locked_remote: None,
            sync,
        }
    }

    /// Loads everything the session needs in one concurrent batch.
    ///
    /// # Arguments
    /// * `history_days` - How far back habit logs and photos are loaded. Check-ins are
    ///   loaded in full so every checked-in day stays locked.
    #[instrument(skip(db, clock, sync))]
    pub async fn load(
        db: &DatabaseConnection,
        user_id: &str,
        clock: Arc<dyn Clock>,
        sync: SyncHandle,
        history_days: u32,
    ) -> Result<Self> {
        let since = clock.today() - Duration::days(i64::from(history_days));

        let (cohort, habit_rows, check_ins, streak, exercise, selections, photos, menu) = tokio::try_join!(
            cohorts::get_cohort_for_user(db, user_id),
            habits::load_habits(db, user_id, since),
            habits::load_check_ins(db, user_id, None),
            habits::load_streak(db, user_id),
            habits::load_weekly_exercise(db, user_id),
            meals::load_meal_selections(db, user_id),
            habits::load_breakfast_photos(db, user_id, since),
            meals::load_meal_menu(db),
        )?;

        info!(
            "Loaded session for {}: cohort {:?}, {} habit days, {} meal weeks",
            user_id,
            cohort.as_ref().map(|c| c.id.as_str()),
            habit_rows.len(),
            selections.len()
        );

        let mut session = Self::new(user_id, clock, cohort, sync);
        session
            .ledger
            .load(habit_rows, check_ins, streak, exercise, photos);
        for selection in selections {
            session.meals.replace(selection);
        }
        session.menu = menu;
        Ok(session)
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub const fn cohort(&self) -> Option<&cohort::Model> {
        self.cohort.as_ref()
    }

    /// Current time from the injected clock.
    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.clock.now()
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Challenge timeline as of now.
    #[must_use]
    pub fn challenge_state(&self) -> ChallengeState {
        ChallengeState::evaluate(self.cohort.as_ref(), self.now())
    }

    /// Whether the day view may open `date`.
    #[must_use]
    pub fn can_view_date(&self, date: NaiveDate) -> bool {
        self.challenge_state().can_view_date(date, self.today())
    }

    fn week_start(&self, week: u32) -> Option<NaiveDate> {
        self.cohort
            .as_ref()
            .map(|c| dates::week_start_date(c.start_date, week))
    }

    // Habits and check-ins

    #[must_use]
    pub fn habits(&self, date: NaiveDate) -> DailyHabit {
        self.ledger.habits(date)
    }

    #[must_use]
    pub fn is_day_locked(&self, date: NaiveDate) -> bool {
        self.ledger.is_locked(date)
    }

    /// Writes one habit field. Returns `false` when the date is checked in.
    pub fn record_habit(&mut self, date: NaiveDate, update: HabitUpdate) -> bool {
        if !self.ledger.record_habit(date, update) {
            debug!("Habit write for checked-in day {} ignored", date);
            return false;
        }
        self.sync.notify(SyncEvent::Habit {
            habit: self.ledger.habits(date),
            update,
            at: self.now(),
        });
        true
    }

    #[must_use]
    pub fn can_check_in(&self, date: NaiveDate) -> bool {
        self.ledger.can_check_in(date)
    }

    /// Submits the check-in for `date`. The streak only moves for today's check-in.
    pub fn submit_check_in(&mut self, date: NaiveDate, notes: &str) -> bool {
        let today = self.today();
        let streak_before = self.ledger.streak().clone();
        if !self.ledger.submit_check_in(date, today, notes) {
            return false;
        }

        let now = self.now();
        if let Some(check_in) = self.ledger.check_in(date) {
            self.sync.notify(SyncEvent::CheckIn {
                check_in: check_in.clone(),
                at: now,
            });
        }
        if self.ledger.streak() != &streak_before {
            self.sync.notify(SyncEvent::Streak {
                streak: self.ledger.streak().clone(),
                at: now,
            });
        }
        info!("Checked in for {} (streak {})", date, self.ledger.streak().current_streak);
        true
    }

    /// Submits the check-in form, encoding mood and energy into the notes text.
    pub fn submit_check_in_form(&mut self, date: NaiveDate, form: &CheckInNotes) -> bool {
        self.submit_check_in(date, &form.to_challenges_text())
    }

    #[must_use]
    pub const fn streak(&self) -> &Streak {
        self.ledger.streak()
    }

    /// Whether the weekly exercise question is shown for `date`.
    #[must_use]
    pub fn weekly_exercise_visible(&self, date: NaiveDate) -> bool {
        self.cohort
            .as_ref()
            .is_some_and(|c| HabitLedger::weekly_exercise_visible(date, c.start_date))
    }

    #[must_use]
    pub fn weekly_exercise(&self, date: NaiveDate) -> Option<bool> {
        self.ledger.weekly_exercise(date)
    }

    /// Answers the weekly exercise question for the week containing `date`.
    pub fn set_weekly_exercise(&mut self, date: NaiveDate, completed: bool) -> bool {
        if !self.ledger.set_weekly_exercise(date, completed) {
            return false;
        }
        self.sync.notify(SyncEvent::WeeklyExercise {
            week_start: dates::week_start_sunday(date),
            completed,
            at: self.now(),
        });
        true
    }

    #[must_use]
    pub fn weight_history(&self) -> Vec<(NaiveDate, f64)> {
        self.ledger.weight_history()
    }

    #[must_use]
    pub fn breakfast_photo(&self, date: NaiveDate) -> Option<&BreakfastPhoto> {
        self.ledger.breakfast_photo(date)
    }

    /// Records an uploaded breakfast photo for `date`.
    pub fn set_breakfast_photo(
        &mut self,
        date: NaiveDate,
        storage_path: impl Into<String>,
        notes: Option<String>,
    ) {
        let photo = BreakfastPhoto {
            date,
            storage_path: storage_path.into(),
            uploaded_at: self.now(),
            notes,
        };
        self.ledger.set_breakfast_photo(photo.clone());
        self.sync.notify(SyncEvent::BreakfastPhoto(photo));
    }

    /// Removes the breakfast photo for `date`. Returns `false` if there was none.
    pub fn remove_breakfast_photo(&mut self, date: NaiveDate) -> bool {
        if self.ledger.remove_breakfast_photo(date).is_none() {
            return false;
        }
        self.sync.notify(SyncEvent::BreakfastPhotoRemoved { date });
        true
    }

    // Meal selection

    #[must_use]
    pub const fn menu(&self) -> &MealMenu {
        &self.menu
    }

    #[must_use]
    pub fn selection(&self, week: u32) -> Option<&MealSelection> {
        self.meals.get(week)
    }

    #[must_use]
    pub fn locked_weeks(&self) -> BTreeSet<u32> {
        self.meals.locked_weeks()
    }

    fn queue_selection(&self, week: u32) {
        let (Some(selection), Some(week_start)) = (self.meals.get(week), self.week_start(week))
        else {
            warn!("Week {} selection kept locally only: no cohort", week);
            return;
        };
        self.sync.notify(SyncEvent::MealSelection {
            selection: selection.clone(),
            week_start,
            at: self.now(),
        });
    }

    /// Chooses an alternative for one slot. Refused for a locked week.
    pub fn select_meal(&mut self, week: u32, day: u8, meal_type: MealType, choice: MealChoice) -> bool {
        if !self.meals.select_meal(week, day, meal_type, choice) {
            return false;
        }
        self.queue_selection(week);
        true
    }

    /// Sets the week's delivery preference. Refused for a locked week.
    pub fn set_delivery_preference(&mut self, week: u32, preference: DeliveryPreference) -> bool {
        if !self.meals.set_delivery_preference(week, preference) {
            return false;
        }
        self.queue_selection(week);
        true
    }

    /// Locks `week` locally and waits for the store to lock it too.
    ///
    /// Returns `Ok(false)` without any change when the user is not enrolled or the
    /// selection is incomplete or already locked. When another session locked the week
    /// in the store first, the stored selection replaces the local one.
    ///
    /// # Errors
    /// Returns the store error if the remote lock fails. The local lock stays in place.
    #[instrument(skip(self, db), fields(user_id = %self.user_id))]
    pub async fn submit_week(&mut self, db: &DatabaseConnection, week: u32) -> Result<bool> {
        let Some(week_start) = self.week_start(week) else {
            warn!("Cannot lock week {} without a cohort", week);
            return Ok(false);
        };

        let now = self.now();
        if !self.meals.lock(week, now) {
            return Ok(false);
        }
        let Some(selection) = self.meals.get(week).cloned() else {
            return Ok(false);
        };

        let locked_here =
            meals::lock_meal_selection(db, &self.user_id, &selection, week_start, now).await?;
        if !locked_here {
            if let Some(stored) = meals::get_meal_selection(db, &self.user_id, week).await? {
                info!("Week {} was locked elsewhere; using the stored selection", week);
                self.meals.replace(stored);
            }
        }
        if week == 1 {
            self.week1_locked_remote = Some(true);
        }
        Ok(true)
    }

    /// Asks the store whether week 1 is locked and remembers the answer for gating.
    ///
    /// Only runs while the challenge is pending or active. A failed lookup counts as
    /// "not locked".
    pub async fn check_week1_selection(&mut self, db: &DatabaseConnection) -> Option<bool> {
        let status = self.challenge_state().status;
        if !matches!(status, ChallengeStatus::Pending | ChallengeStatus::Active) {
            return None;
        }

        let locked = match meals::has_completed_meal_selection(db, &self.user_id, 1).await {
            Ok(locked) => locked,
            Err(e) => {
                error!("Error checking week 1 selection: {}", e);
                false
            }
        };
        self.week1_locked_remote = Some(locked);
        Some(locked)
    }

    // Gating and navigation

    /// Dashboard gating decision as of now.
    #[must_use]
    pub fn gating(&self) -> GatingDecision {
        let state = self.challenge_state();
        let locked = self.meals.locked_weeks();
        let next_week = gating::next_unresolved_week(&state, &locked, self.now());

        gating::evaluate(&GatingInput {
            status: state.status,
            is_before_start: state.is_before_start(),
            week1_locked_remote: self.week1_locked_remote,
            locked_weeks: &locked,
            next_week,
        })
    }

    #[must_use]
    pub fn accessible_weeks(&self) -> Vec<u32> {
        let state = self.challenge_state();
        access::accessible_weeks(&self.meals.locked_weeks(), state.current_week(), state.total_weeks)
    }

    /// Validates a move between meal weeks.
    ///
    /// # Errors
    /// Returns `Error::WeekNotAccessible` with user-facing copy.
    pub fn navigate_to_week(&self, from: u32, to: u32) -> Result<u32> {
        let total_weeks = self.challenge_state().total_weeks;
        access::navigate_to_week(from, to, &self.accessible_weeks(), total_weeks)
    }

    /// Week the meal screen opens on.
    #[must_use]
    pub fn initial_week(&self) -> Option<u32> {
        access::initial_week(&self.accessible_weeks(), &self.meals.locked_weeks())
    }

    /// Meal week screen state, or `None` when not enrolled.
    #[must_use]
    pub fn meal_week_status(&self, week: u32) -> Option<MealWeekStatus> {
        let cohort = self.cohort.as_ref()?;
        Some(MealWeekStatus::compute(
            self.meals.get(week),
            cohort.start_date,
            week,
            self.now(),
        ))
    }

    /// Starts a countdown ticker for `week`'s deadline. Must be called inside a tokio
    /// runtime.
    #[must_use]
    pub fn deadline_ticker(&self, week: u32, period: std::time::Duration) -> Option<DeadlineTicker> {
        let cohort = self.cohort.as_ref()?;
        let deadline = dates::week_deadline(cohort.start_date, week);
        Some(DeadlineTicker::spawn(Arc::clone(&self.clock), deadline, period))
    }

    /// Dashboard headline numbers as of now.
    #[must_use]
    pub fn dashboard_summary(&self) -> DashboardSummary {
        let state = self.challenge_state();
        let today = self.today();
        DashboardSummary {
            status: state.status,
            current_day: state.current_day,
            total_days: state.total_days,
            days_remaining: state.days_remaining,
            current_week: state.current_week(),
            streak: self.ledger.streak().clone(),
            today: self.ledger.habits(today),
            checked_in_today: self.ledger.is_locked(today),
            can_check_in_today: self.ledger.can_check_in(today),
            gating: self.gating(),
        }
    }

    /// Deletes the user's stored data and resets the session.
    ///
    /// # Errors
    /// Returns the store error; local state is only cleared after the store succeeds.
    pub async fn delete_account_data(&mut self, db: &DatabaseConnection) -> Result<u64> {
        let deleted = account::delete_account_data(db, &self.user_id).await?;
        self.cohort = None;
        self.ledger = HabitLedger::new();
        self.meals = MealSelectionStore::new();
        self.week1_locked_remote = None;
        Ok(deleted)
    }
}
