//! Cohort entity - A group of users sharing one challenge timeline.
//!
//! The cohort's `start_date` anchors every challenge day and week number. `end_date` is
//! inclusive: the challenge is still active on that day.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Cohort database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cohorts")]
pub struct Model {
    /// Cohort identifier
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Display name (e.g., "June 2025")
    pub name: String,
    /// Day 1 of the challenge
    pub start_date: Date,
    /// Last day of the challenge (inclusive)
    pub end_date: Date,
    /// Whether the cohort is currently running or open for enrolment
    pub is_active: bool,
    /// Length in weeks; values <= 0 fall back to the default
    pub duration_weeks: i32,
}

/// Defines relationships between Cohort and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One cohort has many member profiles
    #[sea_orm(has_many = "super::profile::Entity")]
    Profiles,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
