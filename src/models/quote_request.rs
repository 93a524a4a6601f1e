use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const STATUS_PENDING: &str = "pending";

/// Parts quote submitted through the public form
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "quote_requests")]
#[serde(rename_all = "camelCase")]
#[schema(as = QuoteRequest)]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Session subject of the signed-in customer, if any
    pub customer_id: Option<String>,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub ship_to: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    /// Serialized cart lines as sent by the browser
    #[sea_orm(column_type = "Text", nullable)]
    pub items: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
