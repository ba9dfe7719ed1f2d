use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A single bird sighting logged by a user.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bird")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub species_name: String,
    pub weight: f64,
    pub diet: String,
    pub habitat: String,
    pub sighting_count: i32,

    /// Email of the user who logged the sighting. Fixed at insert.
    #[sea_orm(indexed)]
    pub owner_identity: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
