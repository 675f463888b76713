//! Weekly exercise entity - Whether the user exercised three times in a week.
//!
//! Keyed by the Sunday that starts the calendar week; unique on (`user_id`, `week_start_date`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Weekly exercise database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "weekly_exercise")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    /// Sunday starting the week
    pub week_start_date: Date,
    /// `None` while unanswered
    pub completed_3x: Option<bool>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
