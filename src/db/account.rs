//! Account data removal.

use crate::{
    entities::{
        BreakfastPhoto, CheckIn, DailyHabit, MealSelection, Profile, Streak, WeeklyExercise,
        breakfast_photo, check_in, daily_habit, meal_selection, profile, streak,
        weekly_exercise,
    },
    errors::Result,
};
use sea_orm::{Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};

/// Deletes every row the user owns and clears the personal fields of their profile.
///
/// Runs in one transaction: either all user data is gone or none of it is.
///
/// # Returns
/// Number of rows deleted
#[instrument(skip(db))]
pub async fn delete_account_data(db: &DatabaseConnection, user_id: &str) -> Result<u64> {
    let txn = db.begin().await?;
    let mut deleted = 0;

    deleted += DailyHabit::delete_many()
        .filter(daily_habit::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;
    deleted += CheckIn::delete_many()
        .filter(check_in::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;
    deleted += Streak::delete_many()
        .filter(streak::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;
    deleted += WeeklyExercise::delete_many()
        .filter(weekly_exercise::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;
    deleted += MealSelection::delete_many()
        .filter(meal_selection::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;
    deleted += BreakfastPhoto::delete_many()
        .filter(breakfast_photo::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?
        .rows_affected;

    if let Some(existing) = Profile::find_by_id(user_id.to_string()).one(&txn).await? {
        let mut active_model: profile::ActiveModel = existing.into();
        active_model.full_name = Set(None);
        active_model.cohort_id = Set(None);
        active_model.push_token = Set(None);
        active_model.update(&txn).await?;
    }

    txn.commit().await?;

    info!("Deleted {} rows of account data for {}", deleted, user_id);
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::habits::{DailyHabit as Habit, HabitUpdate, Streak as StreakValue};
    use crate::db::{cohorts, habits};
    use crate::test_utils::{at, create_test_cohort, create_test_user, date, setup_test_db};

    #[tokio::test]
    async fn test_delete_account_data_only_touches_user() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_cohort(&db, "june", date(2025, 6, 9)).await?;
        create_test_user(&db, "u1", "june").await?;
        create_test_user(&db, "u2", "june").await?;

        let now = at(2025, 6, 10, 8, 0);
        for user in ["u1", "u2"] {
            let mut habit = Habit::empty(date(2025, 6, 10));
            habit.steps = Some(100);
            habits::upsert_habit(&db, user, &habit, HabitUpdate::Steps(100), now).await?;
            habits::save_streak(&db, user, &StreakValue::default(), now).await?;
        }

        let deleted = delete_account_data(&db, "u1").await?;
        assert_eq!(deleted, 2);

        assert!(habits::load_habits(&db, "u1", date(2025, 6, 1)).await?.is_empty());
        assert_eq!(habits::load_habits(&db, "u2", date(2025, 6, 1)).await?.len(), 1);
        assert!(cohorts::get_cohort_for_user(&db, "u1").await?.is_none());
        assert!(cohorts::get_cohort_for_user(&db, "u2").await?.is_some());
        Ok(())
    }
}
