//! Database configuration module.
//!
//! This module handles the record store connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! and the composite unique indexes backing every upsert are created alongside them.

use crate::entities::{
    BreakfastPhoto, BreakfastPhotoColumn, CheckIn, CheckInColumn, Cohort, DailyHabit,
    DailyHabitColumn, MealOption, MealOptionColumn, MealSelection, MealSelectionColumn, Profile,
    Streak, WeeklyExercise, WeeklyExerciseColumn,
};
use crate::errors::Result;
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema,
    sea_query::{Index, IndexCreateStatement},
};
use tracing::debug;

/// Default location of the local `SQLite` store
const DEFAULT_DATABASE_URL: &str = "sqlite://data/challenge_buddy.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
pub fn get_database_url() -> Result<String> {
    Ok(std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()))
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url()?;
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Unique indexes that the upsert conflict targets rely on
fn upsert_indexes() -> Vec<IndexCreateStatement> {
    vec![
        Index::create()
            .name("idx_daily_habits_user_date")
            .table(DailyHabit)
            .col(DailyHabitColumn::UserId)
            .col(DailyHabitColumn::Date)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_check_ins_user_date")
            .table(CheckIn)
            .col(CheckInColumn::UserId)
            .col(CheckInColumn::Date)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_breakfast_photos_user_date")
            .table(BreakfastPhoto)
            .col(BreakfastPhotoColumn::UserId)
            .col(BreakfastPhotoColumn::Date)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_weekly_exercise_user_week")
            .table(WeeklyExercise)
            .col(WeeklyExerciseColumn::UserId)
            .col(WeeklyExerciseColumn::WeekStartDate)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_meal_selections_user_week")
            .table(MealSelection)
            .col(MealSelectionColumn::UserId)
            .col(MealSelectionColumn::WeekStartDate)
            .unique()
            .if_not_exists()
            .to_owned(),
        Index::create()
            .name("idx_meal_options_slot")
            .table(MealOption)
            .col(MealOptionColumn::ChallengeWeek)
            .col(MealOptionColumn::DayOfWeek)
            .col(MealOptionColumn::MealType)
            .unique()
            .if_not_exists()
            .to_owned(),
    ]
}

/// Creates all tables and unique indexes if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, Cohort).await?;
    create_table(db, &schema, Profile).await?;
    create_table(db, &schema, DailyHabit).await?;
    create_table(db, &schema, CheckIn).await?;
    create_table(db, &schema, Streak).await?;
    create_table(db, &schema, WeeklyExercise).await?;
    create_table(db, &schema, MealOption).await?;
    create_table(db, &schema, MealSelection).await?;
    create_table(db, &schema, BreakfastPhoto).await?;

    for index in upsert_indexes() {
        db.execute(builder.build(&index)).await?;
    }

    debug!("Record store schema is up to date");
    Ok(())
}
