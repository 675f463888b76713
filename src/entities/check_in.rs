//! Check-in entity - The end-of-day check-in that freezes a date's habits.
//!
//! Unique on (`user_id`, `date`). `habits_summary` is a JSON snapshot of the habits at
//! submission time.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Check-in database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "check_ins")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    /// Date checked in for
    pub date: Date,
    /// Free text, usually `Mood: m/5 | Energy: e/5 | Notes: ...`
    pub challenges_faced: String,
    /// Snapshot of the day's habits
    pub habits_summary: Json,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
