//! Streak entity - One row per user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Streak database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "streaks")]
pub struct Model {
    /// Owner of the streak
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    pub current_streak: i32,
    pub longest_streak: i32,
    /// Date of the last live check-in
    pub last_check_in_date: Option<Date>,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
