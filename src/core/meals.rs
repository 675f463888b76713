//! Weekly meal selections and the read-only meal menu.
//!
//! A week's selection holds one A/B choice per `(day, meal)` slot plus a delivery
//! preference. Locking is permanent: every mutation entry point refuses a locked week.

use crate::{
    core::dates,
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    str::FromStr,
};
use tracing::warn;

/// Slots to fill per week: 7 days, lunch and dinner.
pub const MEALS_PER_WEEK: usize = 14;

/// Meals covered by the program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    /// Midday meal
    Lunch,
    /// Evening meal
    Dinner,
}

impl MealType {
    /// Every meal type, in serving order.
    pub const ALL: [Self; 2] = [Self::Lunch, Self::Dinner];

    /// Lowercase identifier used in slot keys and the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "lunch" => Ok(Self::Lunch),
            "dinner" => Ok(Self::Dinner),
            other => Err(Error::InvalidRecord {
                message: format!("unknown meal type '{other}'"),
            }),
        }
    }
}

/// One of the two alternatives offered per slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MealChoice {
    /// First alternative
    A,
    /// Second alternative
    B,
}

/// How the week's meals reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryPreference {
    /// Delivered to the user's address
    Home,
    /// Collected by the user
    Pickup,
}

impl DeliveryPreference {
    /// Lowercase identifier used in the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Pickup => "pickup",
        }
    }
}

impl FromStr for DeliveryPreference {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "home" => Ok(Self::Home),
            "pickup" => Ok(Self::Pickup),
            other => Err(Error::InvalidRecord {
                message: format!("unknown delivery preference '{other}'"),
            }),
        }
    }
}

/// A `(day, meal)` position within a week. Serialized as `"{day}_{meal}"`, e.g. `3_dinner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MealSlot {
    /// Day within the week, 1..=7
    pub day: u8,
    /// Meal of the day
    pub meal_type: MealType,
}

impl MealSlot {
    /// Slot for `day`, or `None` when `day` is outside 1..=7.
    #[must_use]
    pub fn new(day: u8, meal_type: MealType) -> Option<Self> {
        (1..=7).contains(&day).then_some(Self { day, meal_type })
    }

    /// All 14 slots of a week in day order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=7u8).flat_map(|day| {
            MealType::ALL
                .into_iter()
                .map(move |meal_type| Self { day, meal_type })
        })
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.day, self.meal_type)
    }
}

impl FromStr for MealSlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidRecord {
            message: format!("invalid meal slot '{s}'"),
        };
        let (day, meal) = s.split_once('_').ok_or_else(invalid)?;
        let day = day.parse::<u8>().map_err(|_| invalid())?;
        Self::new(day, meal.parse()?).ok_or_else(invalid)
    }
}

/// A user's meal choices for one challenge week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealSelection {
    /// Challenge week, 1-based
    pub challenge_week: u32,
    /// Chosen alternative per slot
    pub selections: BTreeMap<MealSlot, MealChoice>,
    /// Delivery preference, once chosen
    pub delivery_preference: Option<DeliveryPreference>,
    /// Whether the week is finalized
    pub locked: bool,
    /// When the week was locked
    pub locked_at: Option<NaiveDateTime>,
}

impl MealSelection {
    /// Empty, unlocked selection for `week`.
    #[must_use]
    pub const fn new(challenge_week: u32) -> Self {
        Self {
            challenge_week,
            selections: BTreeMap::new(),
            delivery_preference: None,
            locked: false,
            locked_at: None,
        }
    }

    /// Every slot has a choice and a delivery preference is set.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.selections.len() == MEALS_PER_WEEK && self.delivery_preference.is_some()
    }

    /// Slots still waiting for a choice.
    #[must_use]
    pub fn missing_slots(&self) -> Vec<MealSlot> {
        MealSlot::all()
            .filter(|slot| !self.selections.contains_key(slot))
            .collect()
    }

    /// Choice made for a slot.
    #[must_use]
    pub fn choice(&self, day: u8, meal_type: MealType) -> Option<MealChoice> {
        MealSlot::new(day, meal_type).and_then(|slot| self.selections.get(&slot).copied())
    }

    /// Encodes the selections as the stored JSON object (`{"1_lunch": "A", ...}`).
    pub fn selections_json(&self) -> Result<serde_json::Value> {
        let map: BTreeMap<String, MealChoice> = self
            .selections
            .iter()
            .map(|(slot, choice)| (slot.to_string(), *choice))
            .collect();
        serde_json::to_value(map).map_err(Into::into)
    }

    /// Decodes a stored selections object. Keys that are not valid slots are skipped.
    pub fn selections_from_json(value: &serde_json::Value) -> Result<BTreeMap<MealSlot, MealChoice>> {
        if value.is_null() {
            return Ok(BTreeMap::new());
        }
        let raw: BTreeMap<String, MealChoice> = serde_json::from_value(value.clone())?;
        Ok(raw
            .into_iter()
            .filter_map(|(key, choice)| match key.parse::<MealSlot>() {
                Ok(slot) => Some((slot, choice)),
                Err(e) => {
                    warn!("Skipping stored meal selection: {}", e);
                    None
                }
            })
            .collect())
    }
}

/// In-memory meal selections for one user, keyed by challenge week.
#[derive(Debug, Clone, Default)]
pub struct MealSelectionStore {
    weeks: BTreeMap<u32, MealSelection>,
}

impl MealSelectionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Selection for `week`, if one was started.
    #[must_use]
    pub fn get(&self, week: u32) -> Option<&MealSelection> {
        self.weeks.get(&week)
    }

    /// Whether `week` is locked.
    #[must_use]
    pub fn is_locked(&self, week: u32) -> bool {
        self.weeks.get(&week).is_some_and(|s| s.locked)
    }

    /// Weeks whose selection is locked.
    #[must_use]
    pub fn locked_weeks(&self) -> BTreeSet<u32> {
        self.weeks
            .values()
            .filter(|s| s.locked)
            .map(|s| s.challenge_week)
            .collect()
    }

    /// Chooses an alternative for one slot.
    ///
    /// Returns `false` without mutation when the week is locked or `day` is outside 1..=7.
    pub fn select_meal(&mut self, week: u32, day: u8, meal_type: MealType, choice: MealChoice) -> bool {
        let Some(slot) = MealSlot::new(day, meal_type) else {
            return false;
        };
        if self.is_locked(week) {
            return false;
        }
        self.entry(week).selections.insert(slot, choice);
        true
    }

    /// Sets the delivery preference. Refused for a locked week.
    pub fn set_delivery_preference(&mut self, week: u32, preference: DeliveryPreference) -> bool {
        if self.is_locked(week) {
            return false;
        }
        self.entry(week).delivery_preference = Some(preference);
        true
    }

    /// Finalizes `week` at `now`.
    ///
    /// Fails without mutation when the selection is incomplete or already locked. There
    /// is no way back.
    pub fn lock(&mut self, week: u32, now: NaiveDateTime) -> bool {
        match self.weeks.get_mut(&week) {
            Some(selection) if !selection.locked && selection.is_complete() => {
                selection.locked = true;
                selection.locked_at = Some(now);
                true
            }
            _ => false,
        }
    }

    /// Installs a selection loaded from the store, replacing any local copy.
    pub fn replace(&mut self, selection: MealSelection) {
        self.weeks.insert(selection.challenge_week, selection);
    }

    /// All selections in week order.
    pub fn iter(&self) -> impl Iterator<Item = &MealSelection> {
        self.weeks.values()
    }

    fn entry(&mut self, week: u32) -> &mut MealSelection {
        self.weeks
            .entry(week)
            .or_insert_with(|| MealSelection::new(week))
    }
}

/// One side of a meal option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MealAlternative {
    /// Dish name
    pub name: String,
    /// Short description
    pub description: Option<String>,
    /// Image reference
    pub image_url: Option<String>,
}

/// The two alternatives offered for a `(week, day, meal)` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealOption {
    pub challenge_week: u32,
    pub slot: MealSlot,
    pub option_a: MealAlternative,
    pub option_b: MealAlternative,
}

impl MealOption {
    /// The alternative matching `choice`.
    #[must_use]
    pub const fn alternative(&self, choice: MealChoice) -> &MealAlternative {
        match choice {
            MealChoice::A => &self.option_a,
            MealChoice::B => &self.option_b,
        }
    }
}

/// Read-only lookup of meal options.
#[derive(Debug, Clone, Default)]
pub struct MealMenu {
    options: BTreeMap<(u32, MealSlot), MealOption>,
}

impl MealMenu {
    /// Builds the menu from loaded options. Later duplicates win.
    #[must_use]
    pub fn new(options: Vec<MealOption>) -> Self {
        Self {
            options: options
                .into_iter()
                .map(|o| ((o.challenge_week, o.slot), o))
                .collect(),
        }
    }

    /// Option for a slot; a slot with no option configured yields `None`.
    #[must_use]
    pub fn option(&self, week: u32, day: u8, meal_type: MealType) -> Option<&MealOption> {
        let slot = MealSlot::new(day, meal_type)?;
        self.options.get(&(week, slot))
    }

    /// The alternative the user picked for a slot, or `None` when nothing is picked or the
    /// slot has no option.
    #[must_use]
    pub fn chosen(
        &self,
        selection: &MealSelection,
        day: u8,
        meal_type: MealType,
    ) -> Option<&MealAlternative> {
        let choice = selection.choice(day, meal_type)?;
        self.option(selection.challenge_week, day, meal_type)
            .map(|option| option.alternative(choice))
    }

    /// Options of one week in slot order.
    pub fn week(&self, week: u32) -> impl Iterator<Item = &MealOption> {
        self.options
            .iter()
            .filter(move |((option_week, _), _)| *option_week == week)
            .map(|(_, option)| option)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}

/// Everything the meal week screen shows about one week.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MealWeekStatus {
    pub week: u32,
    pub week_start: NaiveDate,
    pub selected_count: usize,
    pub required_count: usize,
    pub has_delivery_preference: bool,
    pub is_complete: bool,
    pub is_locked: bool,
    pub deadline: NaiveDateTime,
    /// e.g. `Friday 13 Jun at 23:59`
    pub deadline_text: String,
    /// e.g. `2 days remaining`
    pub countdown: String,
    pub hours_until_deadline: i64,
    pub is_deadline_passed: bool,
    /// Deadline less than 24 hours away
    pub is_urgent: bool,
}

impl MealWeekStatus {
    /// Status of `week` for a cohort starting on `cohort_start`, as seen from `now`.
    #[must_use]
    pub fn compute(
        selection: Option<&MealSelection>,
        cohort_start: NaiveDate,
        week: u32,
        now: NaiveDateTime,
    ) -> Self {
        let info = dates::week_info(cohort_start, week, now);
        Self {
            week,
            week_start: dates::week_start_date(cohort_start, week),
            selected_count: selection.map_or(0, |s| s.selections.len()),
            required_count: MEALS_PER_WEEK,
            has_delivery_preference: selection.is_some_and(|s| s.delivery_preference.is_some()),
            is_complete: selection.is_some_and(MealSelection::is_complete),
            is_locked: selection.is_some_and(|s| s.locked),
            deadline: info.deadline,
            deadline_text: dates::format_deadline(info.deadline),
            countdown: dates::deadline_countdown(info.deadline, now),
            hours_until_deadline: info.hours_until_deadline,
            is_deadline_passed: info.is_deadline_passed,
            is_urgent: info.is_less_than_24_hours,
        }
    }
}
