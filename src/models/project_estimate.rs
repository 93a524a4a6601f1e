use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Estimator input together with the full generated transcript
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "project_estimates")]
#[serde(rename_all = "camelCase")]
#[schema(as = ProjectEstimate)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub project_name: String,
    pub project_type: String,
    pub location: String,
    pub terrain: String,
    pub project_size: String,
    pub duration: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub additional_details: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub estimate_result: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
