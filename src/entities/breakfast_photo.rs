//! Breakfast photo entity - Metadata for an uploaded breakfast image.
//!
//! The image itself lives in object storage; unique on (`user_id`, `date`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Breakfast photo database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "breakfast_photos")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: String,
    pub date: Date,
    /// Object-storage path of the image
    pub storage_path: String,
    pub uploaded_at: DateTime,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
