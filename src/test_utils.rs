//! Shared test utilities for the challenge tracker.
//!
//! This module provides common helper functions for setting up test databases,
//! building dates and creating test cohorts and users with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        clock::FixedClock,
        dates,
        meals::{DeliveryPreference, MealChoice, MealSelectionStore, MealSlot},
    },
    db::cohorts,
    entities::cohort,
    errors::Result,
};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initializes tracing for tests; safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all store tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Calendar date shorthand.
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Local timestamp shorthand.
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
    date(y, m, d).and_hms_opt(h, min, 0).unwrap()
}

/// Clock pinned to `now`, ready to hand to a session.
pub fn fixed_clock(now: NaiveDateTime) -> Arc<FixedClock> {
    Arc::new(FixedClock::new(now))
}

/// Cohort row starting on `start` and lasting `weeks` weeks (end date inclusive).
pub fn cohort_model(id: &str, start: NaiveDate, weeks: i32) -> cohort::Model {
    cohort::Model {
        id: id.to_string(),
        name: format!("Cohort {id}"),
        start_date: start,
        end_date: start + Duration::days(i64::from(weeks) * dates::DAYS_PER_WEEK - 1),
        is_active: true,
        duration_weeks: weeks,
    }
}

/// Inserts a 3-week cohort starting on `start`.
pub async fn create_test_cohort(
    db: &DatabaseConnection,
    id: &str,
    start: NaiveDate,
) -> Result<cohort::Model> {
    cohorts::create_cohort(db, cohort_model(id, start, 3)).await
}

/// Creates a user's profile and enrols them in `cohort_id`.
pub async fn create_test_user(
    db: &DatabaseConnection,
    user_id: &str,
    cohort_id: &str,
) -> Result<()> {
    cohorts::assign_user_to_cohort(db, user_id, cohort_id, at(2025, 6, 1, 9, 0)).await
}

/// Fills every slot of `week` with option A and picks home delivery.
pub fn fill_week(store: &mut MealSelectionStore, week: u32) {
    for slot in MealSlot::all() {
        assert!(store.select_meal(week, slot.day, slot.meal_type, MealChoice::A));
    }
    assert!(store.set_delivery_preference(week, DeliveryPreference::Home));
}
