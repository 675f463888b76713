//! Cohort and profile persistence.
//!
//! A profile links a user to at most one cohort. Cohorts are reference data seeded from
//! config.toml.

use crate::{
    config::challenge::CohortConfig,
    entities::{Cohort, Profile, cohort, profile},
    errors::{Error, Result},
};
use chrono::NaiveDateTime;
use sea_orm::{Set, prelude::*};
use tracing::{debug, info, instrument};

/// Finds a cohort by its identifier.
pub async fn get_cohort<C>(db: &C, cohort_id: &str) -> Result<Option<cohort::Model>>
where
    C: ConnectionTrait,
{
    Cohort::find_by_id(cohort_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Inserts a new cohort.
pub async fn create_cohort<C>(db: &C, model: cohort::Model) -> Result<cohort::Model>
where
    C: ConnectionTrait,
{
    let cohort: cohort::ActiveModel = model.into();
    cohort.insert(db).await.map_err(Into::into)
}

/// Finds the profile of `user_id`.
pub async fn get_profile<C>(db: &C, user_id: &str) -> Result<Option<profile::Model>>
where
    C: ConnectionTrait,
{
    Profile::find_by_id(user_id.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Looks up the cohort the user is enrolled in.
///
/// Returns `None` when the user has no profile, no cohort, or a dangling cohort reference.
pub async fn get_cohort_for_user<C>(db: &C, user_id: &str) -> Result<Option<cohort::Model>>
where
    C: ConnectionTrait,
{
    let found = Profile::find_by_id(user_id.to_string())
        .find_also_related(Cohort)
        .one(db)
        .await?;

    Ok(found.and_then(|(_, cohort)| cohort))
}

/// Enrols `user_id` in `cohort_id`, creating the profile if needed.
///
/// # Errors
/// Returns `Error::CohortNotFound` if the cohort does not exist.
#[instrument(skip(db))]
pub async fn assign_user_to_cohort<C>(
    db: &C,
    user_id: &str,
    cohort_id: &str,
    now: NaiveDateTime,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if get_cohort(db, cohort_id).await?.is_none() {
        return Err(Error::CohortNotFound {
            id: cohort_id.to_string(),
        });
    }

    if let Some(existing) = get_profile(db, user_id).await? {
        let mut active_model: profile::ActiveModel = existing.into();
        active_model.cohort_id = Set(Some(cohort_id.to_string()));
        active_model.update(db).await?;
    } else {
        let new_profile = profile::ActiveModel {
            id: Set(user_id.to_string()),
            full_name: Set(None),
            cohort_id: Set(Some(cohort_id.to_string())),
            push_token: Set(None),
            created_at: Set(now),
        };
        new_profile.insert(db).await?;
    }

    info!("Enrolled user {} in cohort {}", user_id, cohort_id);
    Ok(())
}

/// Inserts configured cohorts that are not in the store yet. Existing cohorts are left
/// untouched.
///
/// # Returns
/// Number of cohorts inserted
#[instrument(skip(db, configs))]
pub async fn seed_cohorts<C>(db: &C, configs: &[CohortConfig]) -> Result<usize>
where
    C: ConnectionTrait,
{
    info!(
        "Seeding cohorts. Found {} configurations from TOML.",
        configs.len()
    );

    let mut inserted = 0;
    for config in configs {
        if get_cohort(db, &config.id).await?.is_some() {
            debug!("Cohort '{}' already exists. Skipping.", config.id);
            continue;
        }
        create_cohort(db, config.to_model()).await?;
        info!("Inserted cohort '{}' starting {}", config.id, config.start_date);
        inserted += 1;
    }

    Ok(inserted)
}
