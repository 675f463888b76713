//! Daily habit and check-in ledger.
//!
//! Holds the per-date habit log, the check-ins that lock it, the user's streak, weekly
//! exercise answers and breakfast photo metadata. A check-in freezes its date: habit
//! writes for that date are refused from then on.

use crate::core::dates;
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Habits logged for one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyHabit {
    /// Date the habits belong to
    pub date: NaiveDate,
    /// Morning weight in kilograms
    pub weight_kg: Option<f64>,
    /// Step count
    pub steps: Option<u32>,
    /// Whether the day's meals were followed
    pub meal_adherence: Option<bool>,
    /// Water intake in millilitres
    #[serde(default)]
    pub water_ml: u32,
}

impl DailyHabit {
    /// Empty log for `date`.
    #[must_use]
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            weight_kg: None,
            steps: None,
            meal_adherence: None,
            water_ml: 0,
        }
    }

    /// Weight, a non-zero step count and meal adherence are all logged.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.weight_kg.is_some()
            && self.steps.is_some_and(|steps| steps > 0)
            && self.meal_adherence.is_some()
    }

    fn apply(&mut self, update: HabitUpdate) {
        match update {
            HabitUpdate::WeightKg(kg) => self.weight_kg = Some(kg),
            HabitUpdate::Steps(steps) => self.steps = Some(steps),
            HabitUpdate::MealAdherence(adhered) => self.meal_adherence = Some(adhered),
            HabitUpdate::WaterMl(ml) => self.water_ml = ml,
            HabitUpdate::AddWaterMl(ml) => self.water_ml = self.water_ml.saturating_add(ml),
        }
    }
}

/// A single habit field write.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum HabitUpdate {
    /// Set the weight
    WeightKg(f64),
    /// Set the step count
    Steps(u32),
    /// Set meal adherence
    MealAdherence(bool),
    /// Set water intake
    WaterMl(u32),
    /// Add to water intake
    AddWaterMl(u32),
}

/// End-of-day check-in. At most one exists per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckIn {
    /// Date checked in for
    pub date: NaiveDate,
    /// Free text; carries mood and energy, see [`CheckInNotes`]
    pub challenges_faced: String,
    /// Habits as they were when the check-in was submitted
    pub habits_summary: DailyHabit,
}

/// Mood, energy and notes collected by the check-in form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckInNotes {
    /// Mood on a 1-5 scale
    pub mood: u8,
    /// Energy on a 1-5 scale
    pub energy: u8,
    /// Optional free-text notes
    pub notes: Option<String>,
}

impl CheckInNotes {
    /// Encodes the form as the `challenges_faced` text, e.g.
    /// `Mood: 4/5 | Energy: 3/5 | Notes: long day`.
    #[must_use]
    pub fn to_challenges_text(&self) -> String {
        let mut parts = vec![
            format!("Mood: {}/5", self.mood.clamp(1, 5)),
            format!("Energy: {}/5", self.energy.clamp(1, 5)),
        ];
        if let Some(notes) = self.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            parts.push(format!("Notes: {notes}"));
        }
        parts.join(" | ")
    }

    /// Reads mood, energy and notes back out of a `challenges_faced` text.
    /// Returns `None` when mood or energy are missing.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        // Notes are free text and always last, so they may contain the separator
        let (scores, notes) = match text.split_once("Notes: ") {
            Some((head, rest)) => (head, Some(rest.to_string())),
            None => (text, None),
        };

        let mut mood = None;
        let mut energy = None;
        for part in scores.split(" | ") {
            if let Some(rest) = part.strip_prefix("Mood: ") {
                mood = parse_score(rest);
            } else if let Some(rest) = part.strip_prefix("Energy: ") {
                energy = parse_score(rest);
            }
        }

        Some(Self {
            mood: mood?,
            energy: energy?,
            notes,
        })
    }
}

fn parse_score(text: &str) -> Option<u8> {
    text.strip_suffix("/5")?
        .parse::<u8>()
        .ok()
        .filter(|score| (1..=5).contains(score))
}

/// Consecutive-day check-in streak.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    /// Length of the running streak
    pub current_streak: u32,
    /// Best streak ever reached
    pub longest_streak: u32,
    /// Date of the last live check-in
    pub last_check_in_date: Option<NaiveDate>,
}

impl Streak {
    /// Counts a live check-in on `date`: extends the streak when the previous one was the
    /// day before, otherwise restarts it at 1.
    pub fn record_check_in(&mut self, date: NaiveDate) {
        let consecutive = self
            .last_check_in_date
            .is_some_and(|last| last == date - Duration::days(1));
        self.current_streak = if consecutive {
            self.current_streak + 1
        } else {
            1
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_check_in_date = Some(date);
    }
}

/// Breakfast photo attached to a day's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakfastPhoto {
    /// Day the photo belongs to
    pub date: NaiveDate,
    /// Object-storage path of the uploaded image
    pub storage_path: String,
    /// When the upload finished
    pub uploaded_at: NaiveDateTime,
    /// Optional caption
    pub notes: Option<String>,
}

/// In-memory habit and check-in state for one user.
#[derive(Debug, Clone, Default)]
pub struct HabitLedger {
    habits: BTreeMap<NaiveDate, DailyHabit>,
    check_ins: BTreeMap<NaiveDate, CheckIn>,
    streak: Streak,
    weekly_exercise: BTreeMap<NaiveDate, bool>,
    breakfast_photos: BTreeMap<NaiveDate, BreakfastPhoto>,
}

impl HabitLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Habits logged for `date`, or an empty log.
    #[must_use]
    pub fn habits(&self, date: NaiveDate) -> DailyHabit {
        self.habits
            .get(&date)
            .cloned()
            .unwrap_or_else(|| DailyHabit::empty(date))
    }

    /// Whether a check-in has frozen `date`.
    #[must_use]
    pub fn is_locked(&self, date: NaiveDate) -> bool {
        self.check_ins.contains_key(&date)
    }

    /// Check-in for `date`, if any.
    #[must_use]
    pub fn check_in(&self, date: NaiveDate) -> Option<&CheckIn> {
        self.check_ins.get(&date)
    }

    /// Current streak.
    #[must_use]
    pub const fn streak(&self) -> &Streak {
        &self.streak
    }

    /// Writes one habit field for `date`, creating the log on first write.
    ///
    /// Returns `false` without touching anything when `date` is already checked in.
    pub fn record_habit(&mut self, date: NaiveDate, update: HabitUpdate) -> bool {
        if self.is_locked(date) {
            return false;
        }
        self.habits
            .entry(date)
            .or_insert_with(|| DailyHabit::empty(date))
            .apply(update);
        true
    }

    /// Habits for `date` are complete and no check-in exists yet.
    #[must_use]
    pub fn can_check_in(&self, date: NaiveDate) -> bool {
        !self.is_locked(date) && self.habits.get(&date).is_some_and(DailyHabit::is_complete)
    }

    /// Submits the check-in for `date`.
    ///
    /// Fails without mutation when the habits are incomplete, the date is already checked
    /// in, or `date` is in the future. The streak only moves for a check-in dated `today`;
    /// backfilling a past day never changes it.
    pub fn submit_check_in(&mut self, date: NaiveDate, today: NaiveDate, notes: &str) -> bool {
        if date > today || !self.can_check_in(date) {
            return false;
        }

        let snapshot = self.habits(date);
        self.check_ins.insert(
            date,
            CheckIn {
                date,
                challenges_faced: notes.to_string(),
                habits_summary: snapshot,
            },
        );

        if date == today {
            self.streak.record_check_in(date);
        }
        true
    }

    /// Weekly exercise answer for the week containing `date`; `None` when unset.
    #[must_use]
    pub fn weekly_exercise(&self, date: NaiveDate) -> Option<bool> {
        self.weekly_exercise
            .get(&dates::week_start_sunday(date))
            .copied()
    }

    /// Records whether the user exercised three times in the week containing `date`.
    /// Refused once `date` is checked in.
    pub fn set_weekly_exercise(&mut self, date: NaiveDate, completed: bool) -> bool {
        if self.is_locked(date) {
            return false;
        }
        self.weekly_exercise
            .insert(dates::week_start_sunday(date), completed);
        true
    }

    /// The weekly exercise question is asked on Sundays once a full challenge week exists.
    #[must_use]
    pub fn weekly_exercise_visible(date: NaiveDate, cohort_start: NaiveDate) -> bool {
        date.weekday() == Weekday::Sun && dates::challenge_day_for_date(cohort_start, date) >= 7
    }

    /// Logged weights in date order.
    #[must_use]
    pub fn weight_history(&self) -> Vec<(NaiveDate, f64)> {
        self.habits
            .values()
            .filter_map(|habit| habit.weight_kg.map(|kg| (habit.date, kg)))
            .collect()
    }

    /// Breakfast photo for `date`, if any.
    #[must_use]
    pub fn breakfast_photo(&self, date: NaiveDate) -> Option<&BreakfastPhoto> {
        self.breakfast_photos.get(&date)
    }

    /// Attaches (or replaces) the breakfast photo for its date.
    pub fn set_breakfast_photo(&mut self, photo: BreakfastPhoto) {
        self.breakfast_photos.insert(photo.date, photo);
    }

    /// Removes the breakfast photo for `date`, returning it.
    pub fn remove_breakfast_photo(&mut self, date: NaiveDate) -> Option<BreakfastPhoto> {
        self.breakfast_photos.remove(&date)
    }

    /// Replaces the ledger's contents with rows loaded from the store.
    pub fn load(
        &mut self,
        habits: Vec<DailyHabit>,
        check_ins: Vec<CheckIn>,
        streak: Option<Streak>,
        weekly_exercise: Vec<(NaiveDate, bool)>,
        breakfast_photos: Vec<BreakfastPhoto>,
    ) {
        self.habits = habits.into_iter().map(|h| (h.date, h)).collect();
        self.check_ins = check_ins.into_iter().map(|c| (c.date, c)).collect();
        self.streak = streak.unwrap_or_default();
        self.weekly_exercise = weekly_exercise.into_iter().collect();
        self.breakfast_photos = breakfast_photos.into_iter().map(|p| (p.date, p)).collect();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::date;

    fn complete_day(ledger: &mut HabitLedger, day: NaiveDate) {
        ledger.record_habit(day, HabitUpdate::WeightKg(70.0));
        ledger.record_habit(day, HabitUpdate::Steps(8_000));
        ledger.record_habit(day, HabitUpdate::MealAdherence(true));
    }

    #[test]
    fn test_record_habit_creates_log_lazily() {
        let mut ledger = HabitLedger::new();
        let day = date(2025, 6, 10);
        assert_eq!(ledger.habits(day), DailyHabit::empty(day));

        assert!(ledger.record_habit(day, HabitUpdate::WaterMl(500)));
        assert!(ledger.record_habit(day, HabitUpdate::AddWaterMl(250)));
        assert_eq!(ledger.habits(day).water_ml, 750);
        assert!(ledger.habits(day).weight_kg.is_none());
    }

    #[test]
    fn test_zero_steps_do_not_unlock_check_in() {
        let mut ledger = HabitLedger::new();
        let day = date(2025, 6, 10);
        ledger.record_habit(day, HabitUpdate::WeightKg(70.0));
        ledger.record_habit(day, HabitUpdate::Steps(0));
        ledger.record_habit(day, HabitUpdate::MealAdherence(true));
        assert!(!ledger.can_check_in(day));

        ledger.record_habit(day, HabitUpdate::Steps(1));
        assert!(ledger.can_check_in(day));
    }

    #[test]
    fn test_check_in_locks_the_day() {
        let mut ledger = HabitLedger::new();
        let day = date(2025, 6, 10);
        complete_day(&mut ledger, day);

        assert!(ledger.submit_check_in(day, day, "Mood: 4/5 | Energy: 3/5"));
        assert!(ledger.is_locked(day));
        assert!(!ledger.can_check_in(day));
        assert!(!ledger.submit_check_in(day, day, "again"));

        assert!(!ledger.record_habit(day, HabitUpdate::WeightKg(65.0)));
        assert_eq!(ledger.habits(day).weight_kg, Some(70.0));
        assert_eq!(ledger.check_in(day).unwrap().habits_summary.steps, Some(8_000));
    }

    #[test]
    fn test_incomplete_check_in_is_rejected_without_mutation() {
        let mut ledger = HabitLedger::new();
        let day = date(2025, 6, 10);
        ledger.record_habit(day, HabitUpdate::WeightKg(70.0));

        assert!(!ledger.submit_check_in(day, day, ""));
        assert!(ledger.check_in(day).is_none());
        assert_eq!(ledger.streak(), &Streak::default());
    }

    #[test]
    fn test_future_check_in_is_rejected() {
        let mut ledger = HabitLedger::new();
        let tomorrow = date(2025, 6, 11);
        complete_day(&mut ledger, tomorrow);
        assert!(!ledger.submit_check_in(tomorrow, date(2025, 6, 10), ""));
    }

    #[test]
    fn test_streak_continues_on_consecutive_days() {
        let mut ledger = HabitLedger::new();
        for offset in 0..3 {
            let day = date(2025, 6, 10) + Duration::days(offset);
            complete_day(&mut ledger, day);
            assert!(ledger.submit_check_in(day, day, ""));
        }
        assert_eq!(ledger.streak().current_streak, 3);
        assert_eq!(ledger.streak().longest_streak, 3);
        assert_eq!(ledger.streak().last_check_in_date, Some(date(2025, 6, 12)));
    }

    #[test]
    fn test_streak_resets_after_gap() {
        let mut streak = Streak {
            current_streak: 5,
            longest_streak: 5,
            last_check_in_date: Some(date(2025, 6, 10)),
        };
        streak.record_check_in(date(2025, 6, 11));
        assert_eq!(streak.current_streak, 6);

        streak.record_check_in(date(2025, 6, 14));
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 6);
    }

    #[test]
    fn test_backfilled_check_in_leaves_streak_alone() {
        let mut ledger = HabitLedger::new();
        let today = date(2025, 6, 12);
        complete_day(&mut ledger, today);
        assert!(ledger.submit_check_in(today, today, ""));
        let before = ledger.streak().clone();

        for past in [date(2025, 6, 11), date(2025, 6, 5)] {
            complete_day(&mut ledger, past);
            assert!(ledger.submit_check_in(past, today, ""));
            assert_eq!(ledger.streak(), &before);
        }
        assert!(ledger.is_locked(date(2025, 6, 11)));
    }

    #[test]
    fn test_weekly_exercise_keyed_by_sunday() {
        let mut ledger = HabitLedger::new();
        // 2025-06-18 is a Wednesday; its week starts Sunday 2025-06-15
        assert!(ledger.set_weekly_exercise(date(2025, 6, 18), true));
        assert_eq!(ledger.weekly_exercise(date(2025, 6, 15)), Some(true));
        assert_eq!(ledger.weekly_exercise(date(2025, 6, 21)), Some(true));
        assert_eq!(ledger.weekly_exercise(date(2025, 6, 22)), None);
    }

    #[test]
    fn test_weekly_exercise_refused_after_check_in() {
        let mut ledger = HabitLedger::new();
        let sunday = date(2025, 6, 15);
        complete_day(&mut ledger, sunday);
        assert!(ledger.submit_check_in(sunday, sunday, ""));
        assert!(!ledger.set_weekly_exercise(sunday, true));
        assert_eq!(ledger.weekly_exercise(sunday), None);
    }

    #[test]
    fn test_weekly_exercise_visible_from_day_seven_sundays() {
        // Cohort starts Monday 2025-06-09; Sunday 2025-06-15 is day 7
        let start = date(2025, 6, 9);
        assert!(HabitLedger::weekly_exercise_visible(date(2025, 6, 15), start));
        assert!(HabitLedger::weekly_exercise_visible(date(2025, 6, 22), start));
        assert!(!HabitLedger::weekly_exercise_visible(date(2025, 6, 16), start));

        // Cohort starting Thursday: the first Sunday is day 4
        let thursday_start = date(2025, 6, 12);
        assert!(!HabitLedger::weekly_exercise_visible(date(2025, 6, 15), thursday_start));
        assert!(HabitLedger::weekly_exercise_visible(date(2025, 6, 22), thursday_start));
    }

    #[test]
    fn test_weight_history_sorted_by_date() {
        let mut ledger = HabitLedger::new();
        ledger.record_habit(date(2025, 6, 12), HabitUpdate::WeightKg(69.5));
        ledger.record_habit(date(2025, 6, 10), HabitUpdate::WeightKg(70.2));
        ledger.record_habit(date(2025, 6, 11), HabitUpdate::Steps(100));
        assert_eq!(
            ledger.weight_history(),
            vec![(date(2025, 6, 10), 70.2), (date(2025, 6, 12), 69.5)]
        );
    }

    #[test]
    fn test_check_in_notes_round_trip_and_trim() {
        let notes = CheckInNotes {
            mood: 4,
            energy: 2,
            notes: Some("  skipped lunch  ".to_string()),
        };
        let text = notes.to_challenges_text();
        assert_eq!(text, "Mood: 4/5 | Energy: 2/5 | Notes: skipped lunch");

        let parsed = CheckInNotes::parse(&text).unwrap();
        assert_eq!(parsed.mood, 4);
        assert_eq!(parsed.energy, 2);
        assert_eq!(parsed.notes.as_deref(), Some("skipped lunch"));

        let bare = CheckInNotes {
            mood: 3,
            energy: 3,
            notes: Some("   ".to_string()),
        };
        assert_eq!(bare.to_challenges_text(), "Mood: 3/5 | Energy: 3/5");
        assert!(CheckInNotes::parse("free text only").is_none());
    }

    #[test]
    fn test_check_in_notes_keep_separator_text() {
        let notes = CheckInNotes {
            mood: 2,
            energy: 5,
            notes: Some("tired | skipped lunch | Mood: fine".to_string()),
        };
        let parsed = CheckInNotes::parse(&notes.to_challenges_text()).unwrap();
        assert_eq!(parsed, notes);
    }

    #[test]
    fn test_breakfast_photo_set_and_remove() {
        let mut ledger = HabitLedger::new();
        let day = date(2025, 6, 10);
        ledger.set_breakfast_photo(BreakfastPhoto {
            date: day,
            storage_path: "user/2025-06-10.jpg".to_string(),
            uploaded_at: day.and_hms_opt(8, 15, 0).unwrap(),
            notes: None,
        });
        assert!(ledger.breakfast_photo(day).is_some());
        assert!(ledger.remove_breakfast_photo(day).is_some());
        assert!(ledger.breakfast_photo(day).is_none());
    }
}
