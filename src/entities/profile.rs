//! Profile entity - One row per user, linking them to at most one cohort.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// User identifier issued by the auth provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Name shown in greetings
    pub full_name: Option<String>,
    /// Cohort the user is enrolled in, if any
    pub cohort_id: Option<String>,
    /// Push notification token registered by the device
    pub push_token: Option<String>,
    /// When the profile was created
    pub created_at: DateTime,
}

/// Defines relationships between Profile and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each profile belongs to at most one cohort
    #[sea_orm(
        belongs_to = "super::cohort::Entity",
        from = "Column::CohortId",
        to = "super::cohort::Column::Id"
    )]
    Cohort,
}

impl Related<super::cohort::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cohort.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
