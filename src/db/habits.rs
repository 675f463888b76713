//! Habit, check-in, streak, weekly exercise and breakfast photo persistence.
//!
//! Row-level upserts keyed on (`user_id`, `date`) or (`user_id`, `week_start_date`).
//! Every write is a single independent statement.

use crate::{
    core::habits::{BreakfastPhoto, CheckIn, DailyHabit, HabitUpdate, Streak},
    entities::{
        BreakfastPhoto as BreakfastPhotoEntity, CheckIn as CheckInEntity,
        DailyHabit as DailyHabitEntity, Streak as StreakEntity, WeeklyExercise, breakfast_photo,
        check_in, daily_habit, streak, weekly_exercise,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::OnConflict};
use tracing::{debug, instrument};

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn to_u32(value: i32, field: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::InvalidRecord {
        message: format!("negative {field}: {value}"),
    })
}

fn habit_from_model(model: daily_habit::Model) -> Result<DailyHabit> {
    Ok(DailyHabit {
        date: model.date,
        weight_kg: model.weight_kg,
        steps: model.steps.map(|s| to_u32(s, "steps")).transpose()?,
        meal_adherence: model.meal_adherence,
        water_ml: to_u32(model.water_ml, "water_ml")?,
    })
}

/// Loads the user's habit logs dated on or after `since`.
pub async fn load_habits<C>(db: &C, user_id: &str, since: NaiveDate) -> Result<Vec<DailyHabit>>
where
    C: ConnectionTrait,
{
    DailyHabitEntity::find()
        .filter(daily_habit::Column::UserId.eq(user_id))
        .filter(daily_habit::Column::Date.gte(since))
        .order_by_asc(daily_habit::Column::Date)
        .all(db)
        .await?
        .into_iter()
        .map(habit_from_model)
        .collect()
}

/// Saves the field `update` touched for `habit.date`, stamping its logged-at column.
///
/// A new row takes every field from `habit`. An existing row only has the touched column
/// rewritten, so writes from different sessions to different fields do not clobber each
/// other.
#[instrument(skip(db, habit), fields(date = %habit.date))]
pub async fn upsert_habit<C>(
    db: &C,
    user_id: &str,
    habit: &DailyHabit,
    update: HabitUpdate,
    now: NaiveDateTime,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let mut row = daily_habit::ActiveModel {
        user_id: Set(user_id.to_string()),
        date: Set(habit.date),
        weight_kg: Set(habit.weight_kg),
        steps: Set(habit.steps.map(to_i32)),
        meal_adherence: Set(habit.meal_adherence),
        water_ml: Set(to_i32(habit.water_ml)),
        weight_logged_at: Set(None),
        steps_logged_at: Set(None),
        meal_logged_at: Set(None),
        updated_at: Set(now),
        ..Default::default()
    };

    let mut update_columns = match update {
        HabitUpdate::WeightKg(_) => {
            row.weight_logged_at = Set(Some(now));
            vec![
                daily_habit::Column::WeightKg,
                daily_habit::Column::WeightLoggedAt,
            ]
        }
        HabitUpdate::Steps(_) => {
            row.steps_logged_at = Set(Some(now));
            vec![daily_habit::Column::Steps, daily_habit::Column::StepsLoggedAt]
        }
        HabitUpdate::MealAdherence(_) => {
            row.meal_logged_at = Set(Some(now));
            vec![
                daily_habit::Column::MealAdherence,
                daily_habit::Column::MealLoggedAt,
            ]
        }
        HabitUpdate::WaterMl(_) | HabitUpdate::AddWaterMl(_) => vec![daily_habit::Column::WaterMl],
    };
    update_columns.push(daily_habit::Column::UpdatedAt);

    DailyHabitEntity::insert(row)
        .on_conflict(
            OnConflict::columns([daily_habit::Column::UserId, daily_habit::Column::Date])
                .update_columns(update_columns)
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    debug!("Saved habits for {}", habit.date);
    Ok(())
}

/// Loads the user's check-ins, optionally only those dated on or after `since`.
pub async fn load_check_ins<C>(
    db: &C,
    user_id: &str,
    since: Option<NaiveDate>,
) -> Result<Vec<CheckIn>>
where
    C: ConnectionTrait,
{
    let mut query = CheckInEntity::find().filter(check_in::Column::UserId.eq(user_id));
    if let Some(since) = since {
        query = query.filter(check_in::Column::Date.gte(since));
    }
    query
        .order_by_asc(check_in::Column::Date)
        .all(db)
        .await?
        .into_iter()
        .map(|model| {
            Ok(CheckIn {
                date: model.date,
                challenges_faced: model.challenges_faced,
                habits_summary: serde_json::from_value(model.habits_summary)?,
            })
        })
        .collect()
}

/// Stores a check-in. A second write for the same date replaces the first.
#[instrument(skip(db, check_in), fields(date = %check_in.date))]
pub async fn upsert_check_in<C>(
    db: &C,
    user_id: &str,
    check_in: &CheckIn,
    now: NaiveDateTime,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = check_in::ActiveModel {
        user_id: Set(user_id.to_string()),
        date: Set(check_in.date),
        challenges_faced: Set(check_in.challenges_faced.clone()),
        habits_summary: Set(serde_json::to_value(&check_in.habits_summary)?),
        created_at: Set(now),
        ..Default::default()
    };

    CheckInEntity::insert(row)
        .on_conflict(
            OnConflict::columns([check_in::Column::UserId, check_in::Column::Date])
                .update_columns([
                    check_in::Column::ChallengesFaced,
                    check_in::Column::HabitsSummary,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Loads the user's streak, if one was ever recorded.
pub async fn load_streak<C>(db: &C, user_id: &str) -> Result<Option<Streak>>
where
    C: ConnectionTrait,
{
    let Some(model) = StreakEntity::find_by_id(user_id.to_string()).one(db).await? else {
        return Ok(None);
    };

    Ok(Some(Streak {
        current_streak: to_u32(model.current_streak, "current_streak")?,
        longest_streak: to_u32(model.longest_streak, "longest_streak")?,
        last_check_in_date: model.last_check_in_date,
    }))
}

/// Saves the user's streak.
pub async fn save_streak<C>(db: &C, user_id: &str, value: &Streak, now: NaiveDateTime) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = StreakEntity::find_by_id(user_id.to_string()).one(db).await?;

    if let Some(row) = existing {
        let mut active_model: streak::ActiveModel = row.into();
        active_model.current_streak = Set(to_i32(value.current_streak));
        active_model.longest_streak = Set(to_i32(value.longest_streak));
        active_model.last_check_in_date = Set(value.last_check_in_date);
        active_model.updated_at = Set(now);
        active_model.update(db).await?;
    } else {
        let new_row = streak::ActiveModel {
            user_id: Set(user_id.to_string()),
            current_streak: Set(to_i32(value.current_streak)),
            longest_streak: Set(to_i32(value.longest_streak)),
            last_check_in_date: Set(value.last_check_in_date),
            updated_at: Set(now),
        };
        new_row.insert(db).await?;
    }

    Ok(())
}

/// Loads answered weekly exercise questions as `(week_start_sunday, completed)`.
pub async fn load_weekly_exercise<C>(db: &C, user_id: &str) -> Result<Vec<(NaiveDate, bool)>>
where
    C: ConnectionTrait,
{
    let rows = WeeklyExercise::find()
        .filter(weekly_exercise::Column::UserId.eq(user_id))
        .order_by_asc(weekly_exercise::Column::WeekStartDate)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|row| row.completed_3x.map(|done| (row.week_start_date, done)))
        .collect())
}

/// Records the weekly exercise answer for the week starting on `week_start`.
pub async fn upsert_weekly_exercise<C>(
    db: &C,
    user_id: &str,
    week_start: NaiveDate,
    completed: bool,
    now: NaiveDateTime,
) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = weekly_exercise::ActiveModel {
        user_id: Set(user_id.to_string()),
        week_start_date: Set(week_start),
        completed_3x: Set(Some(completed)),
        updated_at: Set(now),
        ..Default::default()
    };

    WeeklyExercise::insert(row)
        .on_conflict(
            OnConflict::columns([
                weekly_exercise::Column::UserId,
                weekly_exercise::Column::WeekStartDate,
            ])
            .update_columns([
                weekly_exercise::Column::Completed3x,
                weekly_exercise::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Loads breakfast photo metadata dated on or after `since`.
pub async fn load_breakfast_photos<C>(
    db: &C,
    user_id: &str,
    since: NaiveDate,
) -> Result<Vec<BreakfastPhoto>>
where
    C: ConnectionTrait,
{
    let rows = BreakfastPhotoEntity::find()
        .filter(breakfast_photo::Column::UserId.eq(user_id))
        .filter(breakfast_photo::Column::Date.gte(since))
        .order_by_asc(breakfast_photo::Column::Date)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| BreakfastPhoto {
            date: row.date,
            storage_path: row.storage_path,
            uploaded_at: row.uploaded_at,
            notes: row.notes,
        })
        .collect())
}

/// Stores breakfast photo metadata, replacing any earlier photo for the same date.
pub async fn upsert_breakfast_photo<C>(db: &C, user_id: &str, photo: &BreakfastPhoto) -> Result<()>
where
    C: ConnectionTrait,
{
    let row = breakfast_photo::ActiveModel {
        user_id: Set(user_id.to_string()),
        date: Set(photo.date),
        storage_path: Set(photo.storage_path.clone()),
        uploaded_at: Set(photo.uploaded_at),
        notes: Set(photo.notes.clone()),
        ..Default::default()
    };

    BreakfastPhotoEntity::insert(row)
        .on_conflict(
            OnConflict::columns([breakfast_photo::Column::UserId, breakfast_photo::Column::Date])
                .update_columns([
                    breakfast_photo::Column::StoragePath,
                    breakfast_photo::Column::UploadedAt,
                    breakfast_photo::Column::Notes,
                ])
                .to_owned(),
        )
        .exec_without_returning(db)
        .await?;
    Ok(())
}

/// Removes the breakfast photo metadata for `date`.
pub async fn delete_breakfast_photo<C>(db: &C, user_id: &str, date: NaiveDate) -> Result<()>
where
    C: ConnectionTrait,
{
    BreakfastPhotoEntity::delete_many()
        .filter(breakfast_photo::Column::UserId.eq(user_id))
        .filter(breakfast_photo::Column::Date.eq(date))
        .exec(db)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{at, date, setup_test_db};

    #[tokio::test]
    async fn test_habit_upsert_merges_into_one_row() -> Result<()> {
        let db = setup_test_db().await?;
        let day = date(2025, 6, 10);
        let mut habit = DailyHabit::empty(day);

        habit.weight_kg = Some(71.3);
        upsert_habit(&db, "u1", &habit, HabitUpdate::WeightKg(71.3), at(2025, 6, 10, 7, 0)).await?;
        habit.steps = Some(9_500);
        upsert_habit(&db, "u1", &habit, HabitUpdate::Steps(9_500), at(2025, 6, 10, 21, 0)).await?;

        let rows = DailyHabitEntity::find().all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].weight_logged_at, Some(at(2025, 6, 10, 7, 0)));
        assert_eq!(rows[0].steps_logged_at, Some(at(2025, 6, 10, 21, 0)));
        assert!(rows[0].meal_logged_at.is_none());

        let loaded = load_habits(&db, "u1", date(2025, 6, 1)).await?;
        assert_eq!(loaded, vec![habit]);
        assert!(load_habits(&db, "u2", date(2025, 6, 1)).await?.is_empty());
        assert!(load_habits(&db, "u1", date(2025, 6, 11)).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_habit_upsert_leaves_untouched_fields() -> Result<()> {
        let db = setup_test_db().await?;
        let day = date(2025, 6, 10);

        let mut first = DailyHabit::empty(day);
        first.weight_kg = Some(70.0);
        upsert_habit(&db, "u1", &first, HabitUpdate::WeightKg(70.0), at(2025, 6, 10, 7, 0)).await?;

        // A second writer that never saw the weight
        let mut stale = DailyHabit::empty(day);
        stale.steps = Some(9_000);
        upsert_habit(&db, "u1", &stale, HabitUpdate::Steps(9_000), at(2025, 6, 10, 8, 0)).await?;
        stale.water_ml = 250;
        upsert_habit(&db, "u1", &stale, HabitUpdate::AddWaterMl(250), at(2025, 6, 10, 9, 0)).await?;

        let rows = DailyHabitEntity::find().all(&db).await?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].weight_kg, Some(70.0));
        assert_eq!(rows[0].weight_logged_at, Some(at(2025, 6, 10, 7, 0)));
        assert_eq!(rows[0].steps, Some(9_000));
        assert_eq!(rows[0].water_ml, 250);
        assert_eq!(rows[0].updated_at, at(2025, 6, 10, 9, 0));
        Ok(())
    }

    #[tokio::test]
    async fn test_check_in_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let day = date(2025, 6, 10);
        let check_in = CheckIn {
            date: day,
            challenges_faced: "Mood: 4/5 | Energy: 4/5".to_string(),
            habits_summary: DailyHabit {
                date: day,
                weight_kg: Some(70.0),
                steps: Some(8_000),
                meal_adherence: Some(true),
                water_ml: 1_500,
            },
        };
        upsert_check_in(&db, "u1", &check_in, at(2025, 6, 10, 21, 0)).await?;

        let mut older = check_in.clone();
        older.date = date(2025, 1, 10);
        older.habits_summary.date = older.date;
        upsert_check_in(&db, "u1", &older, at(2025, 1, 10, 21, 0)).await?;

        let loaded = load_check_ins(&db, "u1", Some(day)).await?;
        assert_eq!(loaded, vec![check_in.clone()]);
        assert_eq!(load_check_ins(&db, "u1", None).await?, vec![older, check_in]);
        Ok(())
    }

    #[tokio::test]
    async fn test_streak_save_and_update() -> Result<()> {
        let db = setup_test_db().await?;
        assert!(load_streak(&db, "u1").await?.is_none());

        let mut value = Streak::default();
        value.record_check_in(date(2025, 6, 10));
        save_streak(&db, "u1", &value, at(2025, 6, 10, 21, 0)).await?;
        value.record_check_in(date(2025, 6, 11));
        save_streak(&db, "u1", &value, at(2025, 6, 11, 21, 0)).await?;

        let loaded = load_streak(&db, "u1").await?.unwrap();
        assert_eq!(loaded.current_streak, 2);
        assert_eq!(loaded.last_check_in_date, Some(date(2025, 6, 11)));
        Ok(())
    }

    #[tokio::test]
    async fn test_weekly_exercise_upsert() -> Result<()> {
        let db = setup_test_db().await?;
        let sunday = date(2025, 6, 15);
        upsert_weekly_exercise(&db, "u1", sunday, false, at(2025, 6, 15, 20, 0)).await?;
        upsert_weekly_exercise(&db, "u1", sunday, true, at(2025, 6, 15, 21, 0)).await?;

        assert_eq!(load_weekly_exercise(&db, "u1").await?, vec![(sunday, true)]);
        Ok(())
    }

    #[tokio::test]
    async fn test_breakfast_photo_replace_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let day = date(2025, 6, 10);
        let mut photo = BreakfastPhoto {
            date: day,
            storage_path: "u1/2025-06-10-a.jpg".to_string(),
            uploaded_at: at(2025, 6, 10, 8, 0),
            notes: None,
        };
        upsert_breakfast_photo(&db, "u1", &photo).await?;
        photo.storage_path = "u1/2025-06-10-b.jpg".to_string();
        upsert_breakfast_photo(&db, "u1", &photo).await?;

        assert_eq!(load_breakfast_photos(&db, "u1", day).await?, vec![photo]);

        delete_breakfast_photo(&db, "u1", day).await?;
        assert!(load_breakfast_photos(&db, "u1", day).await?.is_empty());
        Ok(())
    }
}
