//! Meal selection entity - A user's choices for one challenge week.
//!
//! Unique on (`user_id`, `week_start_date`). `selections` is a JSON object mapping
//! `"{day}_{meal}"` slot keys to `"A"` or `"B"`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Meal selection database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meal_selections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    /// Challenge week, 1-based
    pub challenge_week: i32,
    /// First calendar day of the challenge week
    pub week_start_date: Date,
    pub selections: Json,
    /// `"home"` or `"pickup"`
    pub delivery_preference: Option<String>,
    /// Locked selections are final
    pub locked: bool,
    pub locked_at: Option<DateTime>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
