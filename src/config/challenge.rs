//! Challenge configuration loading from config.toml
//!
//! The file carries runtime settings plus the cohorts and meal options used to seed the
//! record store on first run.

use crate::{
    core::{
        dates,
        meals::{MealAlternative, MealOption, MealSlot, MealType},
    },
    entities::cohort,
    errors::{Error, Result},
};
use chrono::{Duration, NaiveDate};
use serde::Deserialize;
use std::path::Path;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Runtime settings
    #[serde(default)]
    pub settings: Settings,
    /// Cohorts to seed
    #[serde(default)]
    pub cohorts: Vec<CohortConfig>,
    /// Meal options to seed
    #[serde(default)]
    pub meal_options: Vec<MealOptionConfig>,
}

/// Runtime settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// How often deadline countdowns are recomputed
    pub countdown_refresh_secs: u64,
    /// How many days of habit history a session loads
    pub habit_history_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            countdown_refresh_secs: 60,
            habit_history_days: 90,
        }
    }
}

impl Settings {
    #[must_use]
    pub const fn countdown_refresh(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.countdown_refresh_secs)
    }
}

/// Configuration for a single cohort
#[derive(Debug, Deserialize, Clone)]
pub struct CohortConfig {
    pub id: String,
    pub name: String,
    /// Day 1, as `YYYY-MM-DD`
    pub start_date: NaiveDate,
    /// Inclusive last day; derived from the duration when omitted
    pub end_date: Option<NaiveDate>,
    /// Length in weeks; defaults to 3
    pub duration_weeks: Option<i32>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

const fn default_true() -> bool {
    true
}

impl CohortConfig {
    /// Entity row for this cohort.
    #[must_use]
    pub fn to_model(&self) -> cohort::Model {
        let weeks = dates::total_weeks(self.duration_weeks.unwrap_or(0));
        let duration_weeks = i32::try_from(weeks).unwrap_or(i32::MAX);
        let end_date = self.end_date.unwrap_or_else(|| {
            self.start_date + Duration::days(i64::from(duration_weeks) * dates::DAYS_PER_WEEK - 1)
        });

        cohort::Model {
            id: self.id.clone(),
            name: self.name.clone(),
            start_date: self.start_date,
            end_date,
            is_active: self.is_active,
            duration_weeks,
        }
    }
}

/// Configuration for the two alternatives of one meal slot
#[derive(Debug, Deserialize, Clone)]
pub struct MealOptionConfig {
    pub week: u32,
    /// Day within the week, 1..=7
    pub day: u8,
    pub meal_type: MealType,
    pub option_a: MealAlternative,
    pub option_b: MealAlternative,
}

impl MealOptionConfig {
    /// Domain option for this entry.
    ///
    /// # Errors
    /// Returns `Error::Config` when the day is outside 1..=7 or the week is 0.
    pub fn to_option(&self) -> Result<MealOption> {
        let slot = MealSlot::new(self.day, self.meal_type)
            .filter(|_| self.week > 0)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "Meal option for week {} day {} {} is out of range",
                    self.week, self.day, self.meal_type
                ),
            })?;

        Ok(MealOption {
            challenge_week: self.week,
            slot,
            option_a: self.option_a.clone(),
            option_b: self.option_b.clone(),
        })
    }
}

/// Loads challenge configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration named by `CHALLENGE_CONFIG`, falling back to ./config.toml
pub fn load_default_config() -> Result<Config> {
    let path = std::env::var("CHALLENGE_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}
