//! Meal option and meal selection persistence.
//!
//! Selections are keyed on (`user_id`, `week_start_date`). A stored row that is already
//! locked is never overwritten: both the plain upsert and the lock only touch the row
//! while `locked` is false.

use crate::{
    config::challenge::MealOptionConfig,
    core::meals::{MealAlternative, MealMenu, MealOption, MealSelection, MealSlot},
    entities::{
        MealOption as MealOptionEntity, MealSelection as MealSelectionEntity, meal_option,
        meal_selection,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime};
use sea_orm::{
    PaginatorTrait, QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, OnConflict},
};
use tracing::{debug, info, instrument, warn};

fn option_from_model(model: meal_option::Model) -> Result<MealOption> {
    let invalid = || Error::InvalidRecord {
        message: format!(
            "meal option week {} day {} {}",
            model.challenge_week, model.day_of_week, model.meal_type
        ),
    };
    let week = u32::try_from(model.challenge_week).map_err(|_| invalid())?;
    let day = u8::try_from(model.day_of_week).map_err(|_| invalid())?;
    let slot = MealSlot::new(day, model.meal_type.parse()?).ok_or_else(invalid)?;

    Ok(MealOption {
        challenge_week: week,
        slot,
        option_a: MealAlternative {
            name: model.option_a_name,
            description: model.option_a_description,
            image_url: model.option_a_image_url,
        },
        option_b: MealAlternative {
            name: model.option_b_name,
            description: model.option_b_description,
            image_url: model.option_b_image_url,
        },
    })
}

/// Loads every meal option into a menu. Rows that do not describe a valid slot are
/// skipped with a warning.
pub async fn load_meal_menu<C>(db: &C) -> Result<MealMenu>
where
    C: ConnectionTrait,
{
    let rows = MealOptionEntity::find()
        .order_by_asc(meal_option::Column::ChallengeWeek)
        .all(db)
        .await?;

    let options = rows
        .into_iter()
        .filter_map(|row| match option_from_model(row) {
            Ok(option) => Some(option),
            Err(e) => {
                warn!("Skipping meal option: {}", e);
                None
            }
        })
        .collect();

    Ok(MealMenu::new(options))
}

/// Inserts or refreshes the configured meal options.
///
/// # Returns
/// Number of options written
#[instrument(skip(db, configs))]
pub async fn seed_meal_options<C>(db: &C, configs: &[MealOptionConfig]) -> Result<usize>
where
    C: ConnectionTrait,
{
    info!(
        "Seeding meal options. Found {} configurations from TOML.",
        configs.len()
    );

    for config in configs {
        let option = config.to_option()?;
        let row = meal_option::ActiveModel {
            challenge_week: Set(i32::try_from(option.challenge_week).unwrap_or(i32::MAX)),
            day_of_week: Set(i32::from(option.slot.day)),
            meal_type: Set(option.slot.meal_type.as_str().to_string()),
            option_a_name: Set(option.option_a.name),
            option_a_description: Set(option.option_a.description),
            option_a_image_url: Set(option.option_a.image_url),
            option_b_name: Set(option.option_b.name),
            option_b_description: Set(option.option_b.description),
            option_b_image_url: Set(option.option_b.image_url),
            ..Default::default()
        };

        MealOptionEntity::insert(row)
            .on_conflict(
                OnConflict::columns([
                    meal_option::Column::ChallengeWeek,
                    meal_option::Column::DayOfWeek,
                    meal_option::Column::MealType,
                ])
                .update_columns([
                    meal_option::Column::OptionAName,
                    meal_option::Column::OptionADescription,
                    meal_option::Column::OptionAImageUrl,
                    meal_option::Column::OptionBName,
                    meal_option::Column::OptionBDescription,
                    meal_option::Column::OptionBImageUrl,
                ])
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?;
    }

    Ok(configs.len())
}

fn selection_from_model(model: meal_selection::Model) -> Result<MealSelection> {
    let challenge_week =
        u32::try_from(model.challenge_week).map_err(|_| Error::InvalidRecord {
            message: format!("meal selection week {}", model.challenge_week),
        })?;

    Ok(MealSelection {
        challenge_week,
        selections: MealSelection::selections_from_json(&model.selections)?,
        delivery_preference: model
            .delivery_preference
            .as_deref()
            .map(str::parse)
            .transpose()?,
        locked: model.locked,
        locked_at: model.locked_at,
    })
}

/// Loads all of the user's meal selections.
pub async fn load_meal_selections<C>(db: &C, user_id: &str) -> Result<Vec<MealSelection>>
where
    C: ConnectionTrait,
{
    MealSelectionEntity::find()
        .filter(meal_selection::Column::UserId.eq(user_id))
        .order_by_asc(meal_selection::Column::ChallengeWeek)
        .all(db)
        .await?
        .into_iter()
        .map(selection_from_model)
        .collect()
}

/// Loads the user's selection for one challenge week.
pub async fn get_meal_selection<C>(
    db: &C,
    user_id: &str,
    week: u32,
) -> Result<Option<MealSelection>>
where
    C: ConnectionTrait,
{
    MealSelectionEntity::find()
        .filter(meal_selection::Column::UserId.eq(user_id))
        .filter(meal_selection::Column::ChallengeWeek.eq(i64::from(week)))
        .one(db)
        .await?
        .map(selection_from_model)
        .transpose()
}

/// Whether the stored selection for `week` is locked.
pub async fn has_completed_meal_selection<C>(db: &C, user_id: &str, week: u32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let count = MealSelectionEntity::find()
        .filter(meal_selection::Column::UserId.eq(user_id))
        .filter(meal_selection::Column::ChallengeWeek.eq(i64::from(week)))
        .filter(meal_selection::Column::Locked.eq(true))
        .count(db)
        .await?;
    Ok(count > 0)
}

fn selection_row(
    user_id: &str,
    selection: &MealSelection,
    week_start: NaiveDate,
    now: NaiveDateTime,
) -> Result<meal_selection::ActiveModel> {
    Ok(meal_selection::ActiveModel {
        user_id: Set(user_id.to_string()),
        challenge_week: Set(i32::try_from(selection.challenge_week).unwrap_or(i32::MAX)),
        week_start_date: Set(week_start),
        selections: Set(selection.selections_json()?),
        delivery_preference: Set(selection
            .delivery_preference
            .map(|p| p.as_str().to_string())),
        locked: Set(false),
        locked_at: Set(None),
        updated_at: Set(now),
        ..Default::default()
    })
}

/// Saves an in-progress selection.
///
/// # Returns
/// `false` when the stored row was already locked and was left unchanged
#[instrument(skip(db, selection), fields(week = selection.challenge_week))]
pub async fn upsert_meal_selection<C>(
    db: &C,
    user_id: &str,
    selection: &MealSelection,
    week_start: NaiveDate,
    now: NaiveDateTime,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let written = MealSelectionEntity::insert(selection_row(user_id, selection, week_start, now)?)
        .on_conflict(
            OnConflict::columns([
                meal_selection::Column::UserId,
                meal_selection::Column::WeekStartDate,
            ])
            .update_columns([
                meal_selection::Column::ChallengeWeek,
                meal_selection::Column::Selections,
                meal_selection::Column::DeliveryPreference,
                meal_selection::Column::UpdatedAt,
            ])
            .action_and_where(Expr::col(meal_selection::Column::Locked).eq(false))
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if written == 0 {
        debug!("Stored week {} is locked; selection not saved", selection.challenge_week);
    }
    Ok(written > 0)
}

/// Locks a week in the store.
///
/// The selection is validated again before writing. A row that some other session
/// already locked is left as it is.
///
/// # Returns
/// `true` if this call locked the week
#[instrument(skip(db, selection), fields(week = selection.challenge_week))]
pub async fn lock_meal_selection<C>(
    db: &C,
    user_id: &str,
    selection: &MealSelection,
    week_start: NaiveDate,
    now: NaiveDateTime,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    if !selection.is_complete() {
        warn!(
            "Refusing to lock week {}: {} of 14 meals and delivery {:?}",
            selection.challenge_week,
            selection.selections.len(),
            selection.delivery_preference
        );
        return Ok(false);
    }

    let mut row = selection_row(user_id, selection, week_start, now)?;
    row.locked = Set(true);
    row.locked_at = Set(Some(selection.locked_at.unwrap_or(now)));

    let written = MealSelectionEntity::insert(row)
        .on_conflict(
            OnConflict::columns([
                meal_selection::Column::UserId,
                meal_selection::Column::WeekStartDate,
            ])
            .update_columns([
                meal_selection::Column::ChallengeWeek,
                meal_selection::Column::Selections,
                meal_selection::Column::DeliveryPreference,
                meal_selection::Column::Locked,
                meal_selection::Column::LockedAt,
                meal_selection::Column::UpdatedAt,
            ])
            .action_and_where(Expr::col(meal_selection::Column::Locked).eq(false))
            .to_owned(),
        )
        .exec_without_returning(db)
        .await?;

    if written > 0 {
        info!("Locked meal selection for week {}", selection.challenge_week);
    } else {
        warn!("Week {} was already locked in the store", selection.challenge_week);
    }
    Ok(written > 0)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::meals::{DeliveryPreference, MealChoice, MealSelectionStore, MealType};
    use crate::test_utils::{at, date, fill_week, setup_test_db};

    fn locked_week(week: u32) -> MealSelection {
        let mut store = MealSelectionStore::new();
        fill_week(&mut store, week);
        assert!(store.lock(week, at(2025, 6, 2, 10, 0)));
        store.get(week).cloned().unwrap()
    }

    #[tokio::test]
    async fn test_selection_round_trip() -> Result<()> {
        let db = setup_test_db().await?;
        let mut store = MealSelectionStore::new();
        store.select_meal(1, 2, MealType::Dinner, MealChoice::B);
        store.set_delivery_preference(1, DeliveryPreference::Pickup);
        let selection = store.get(1).cloned().unwrap();

        assert!(upsert_meal_selection(&db, "u1", &selection, date(2025, 6, 9), at(2025, 6, 1, 9, 0)).await?);
        assert_eq!(load_meal_selections(&db, "u1").await?, vec![selection.clone()]);
        assert_eq!(get_meal_selection(&db, "u1", 1).await?, Some(selection));
        assert!(get_meal_selection(&db, "u1", 2).await?.is_none());
        assert!(!has_completed_meal_selection(&db, "u1", 1).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_then_upsert_is_ignored() -> Result<()> {
        let db = setup_test_db().await?;
        let selection = locked_week(1);
        let week_start = date(2025, 6, 9);

        assert!(lock_meal_selection(&db, "u1", &selection, week_start, at(2025, 6, 2, 10, 0)).await?);
        assert!(has_completed_meal_selection(&db, "u1", 1).await?);

        let mut stale = MealSelection::new(1);
        stale
            .selections
            .insert(MealSlot::new(1, MealType::Lunch).unwrap(), MealChoice::B);
        assert!(!upsert_meal_selection(&db, "u1", &stale, week_start, at(2025, 6, 3, 9, 0)).await?);
        assert!(!lock_meal_selection(&db, "u1", &selection, week_start, at(2025, 6, 3, 9, 0)).await?);

        let stored = get_meal_selection(&db, "u1", 1).await?.unwrap();
        assert_eq!(stored, selection);
        assert_eq!(stored.locked_at, Some(at(2025, 6, 2, 10, 0)));
        Ok(())
    }

    #[tokio::test]
    async fn test_lock_rejects_incomplete_selection() -> Result<()> {
        let db = setup_test_db().await?;
        let mut selection = locked_week(1);
        selection.delivery_preference = None;

        assert!(!lock_meal_selection(&db, "u1", &selection, date(2025, 6, 9), at(2025, 6, 2, 10, 0)).await?);
        assert!(get_meal_selection(&db, "u1", 1).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_and_load_menu() -> Result<()> {
        let db = setup_test_db().await?;
        let config: crate::config::challenge::Config = toml::from_str(
            r#"
            [[meal_options]]
            week = 1
            day = 1
            meal_type = "lunch"
            option_a = { name = "Salmon bowl" }
            option_b = { name = "Lentil curry" }

            [[meal_options]]
            week = 1
            day = 1
            meal_type = "dinner"
            option_a = { name = "Chicken tray bake" }
            option_b = { name = "Tofu stir fry", image_url = "meals/tofu.jpg" }
            "#,
        )
        .unwrap();

        assert_eq!(seed_meal_options(&db, &config.meal_options).await?, 2);
        // Re-seeding refreshes in place
        assert_eq!(seed_meal_options(&db, &config.meal_options).await?, 2);

        let menu = load_meal_menu(&db).await?;
        assert_eq!(menu.week(1).count(), 2);
        let dinner = menu.option(1, 1, MealType::Dinner).unwrap();
        assert_eq!(dinner.option_b.image_url.as_deref(), Some("meals/tofu.jpg"));
        assert!(menu.option(2, 1, MealType::Lunch).is_none());
        Ok(())
    }
}
