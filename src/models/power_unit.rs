use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generator set, industrial or marine engine, or power unit
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "power_units")]
#[serde(rename_all = "camelCase")]
#[schema(as = PowerUnit)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub stock_number: String,
    pub brand: Option<String>,
    pub model: String,
    pub category: String,
    pub hp: Option<i32>,
    pub kw: Option<i32>,
    pub rpm: Option<i32>,
    pub engine_rpm: Option<i32>,
    pub year: Option<String>,
    pub condition: Option<String>,
    pub hours: Option<String>,
    pub tier_rating: Option<String>,
    pub fuel_type: Option<String>,
    pub cooling: Option<String>,
    pub enclosure: Option<String>,
    pub volts: Option<String>,
    pub stage: Option<String>,
    pub selling_stage: Option<String>,
    pub unit_type: Option<String>,
    pub location: Option<String>,
    pub price: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub image_url: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
