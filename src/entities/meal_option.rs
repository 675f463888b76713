//! Meal option entity - The two alternatives offered for one meal slot.
//!
//! Read-only reference data, unique on (`challenge_week`, `day_of_week`, `meal_type`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Meal option database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meal_options")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Challenge week, 1-based
    pub challenge_week: i32,
    /// Day within the week, 1..=7
    pub day_of_week: i32,
    /// `"lunch"` or `"dinner"`
    pub meal_type: String,
    pub option_a_name: String,
    pub option_a_description: Option<String>,
    pub option_a_image_url: Option<String>,
    pub option_b_name: String,
    pub option_b_description: Option<String>,
    pub option_b_image_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
