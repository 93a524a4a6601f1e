use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A replacement part from the parsed vendor catalog
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "parts")]
#[serde(rename_all = "camelCase")]
#[schema(as = Part)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Not unique; the same number can appear under several categories
    pub part_number: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub category: String,
    pub subcategory: Option<String>,
    pub price: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub compatibility: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub engine_model: Option<String>,
    pub gasket: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub equipment: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
