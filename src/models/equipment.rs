use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A used machine listed for sale, keyed externally by its listing id
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "equipment")]
#[serde(rename_all = "camelCase")]
#[schema(as = Equipment)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub equipment_id: String,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    /// Hour meter reading
    pub meter: Option<i32>,
    /// Free text; `CALL` when the price is on request
    pub price: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub category: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn title(&self) -> String {
        format!("{} {}", self.make, self.model)
    }
}
