//! Daily habit entity - One row per user and calendar date.
//!
//! Unique on (`user_id`, `date`). Each habit field carries the timestamp of its last write.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Daily habit database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "daily_habits")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the row
    pub user_id: String,
    /// Calendar date the habits belong to
    pub date: Date,
    /// Morning weight in kilograms
    pub weight_kg: Option<f64>,
    /// Step count
    pub steps: Option<i32>,
    /// Whether the day's meals were followed
    pub meal_adherence: Option<bool>,
    /// Water intake in millilitres
    pub water_ml: i32,
    pub weight_logged_at: Option<DateTime>,
    pub steps_logged_at: Option<DateTime>,
    pub meal_logged_at: Option<DateTime>,
    /// Last write to any field
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
