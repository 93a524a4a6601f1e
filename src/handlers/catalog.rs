use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::IntoParams;

use super::common::{parse_path_id, CatalogQuery};
use crate::errors::ResultExt;
use crate::models::{Equipment, Part, PowerUnit};
use crate::services::catalog::{
    CatalogPage, CatalogStats, DEFAULT_EQUIPMENT_LIMIT, DEFAULT_PARTS_LIMIT,
    DEFAULT_POWER_UNIT_LIMIT,
};
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SubcategoryCountsQuery {
    /// Restrict the histogram to one category
    pub category: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/equipment",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Equipment page", body = CatalogPage<Equipment>),
        (status = 500, description = "Query failed", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn list_equipment(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<CatalogPage<Equipment>> {
    let filter = query.into_filter(DEFAULT_EQUIPMENT_LIMIT);
    let page = state
        .services
        .catalog
        .list_equipment(&filter)
        .await
        .or_public("Failed to fetch equipment")?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/equipment/categories/counts",
    responses(
        (status = 200, description = "Listings per category", body = BTreeMap<String, u64>)
    ),
    tag = "catalog"
)]
pub async fn equipment_category_counts(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<String, u64>> {
    let counts = state
        .services
        .catalog
        .equipment_category_counts()
        .await
        .or_public("Failed to fetch category counts")?;
    Ok(Json(counts))
}

#[utoipa::path(
    get,
    path = "/api/equipment/:id",
    params(("id" = String, Path, description = "External equipment id")),
    responses(
        (status = 200, description = "Equipment listing", body = Equipment),
        (status = 404, description = "Equipment not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_equipment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Equipment> {
    let item = state
        .services
        .catalog
        .get_equipment(&id)
        .await
        .or_public("Failed to fetch equipment")?;
    Ok(Json(item))
}

#[utoipa::path(
    get,
    path = "/api/parts",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Parts page", body = CatalogPage<Part>)
    ),
    tag = "catalog"
)]
pub async fn list_parts(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<CatalogPage<Part>> {
    let filter = query.into_filter(DEFAULT_PARTS_LIMIT);
    let page = state
        .services
        .catalog
        .list_parts(&filter)
        .await
        .or_public("Failed to fetch parts")?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/parts/categories/counts",
    responses(
        (status = 200, description = "Parts per category", body = BTreeMap<String, u64>)
    ),
    tag = "catalog"
)]
pub async fn parts_category_counts(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<String, u64>> {
    let counts = state
        .services
        .catalog
        .parts_category_counts()
        .await
        .or_public("Failed to fetch parts category counts")?;
    Ok(Json(counts))
}

#[utoipa::path(
    get,
    path = "/api/parts/subcategories/counts",
    params(SubcategoryCountsQuery),
    responses(
        (status = 200, description = "Parts per subcategory", body = BTreeMap<String, u64>)
    ),
    tag = "catalog"
)]
pub async fn parts_subcategory_counts(
    State(state): State<AppState>,
    Query(query): Query<SubcategoryCountsQuery>,
) -> ApiResult<BTreeMap<String, u64>> {
    let category = query.category.filter(|c| !c.is_empty());
    let counts = state
        .services
        .catalog
        .parts_subcategory_counts(category.as_deref())
        .await
        .or_public("Failed to fetch subcategory counts")?;
    Ok(Json(counts))
}

#[utoipa::path(
    get,
    path = "/api/parts/:id",
    params(("id" = i32, Path, description = "Part row id")),
    responses(
        (status = 200, description = "Part", body = Part),
        (status = 400, description = "Invalid part ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Part not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_part(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Part> {
    let id = parse_path_id(&id, "Invalid part ID")?;
    let part = state
        .services
        .catalog
        .get_part(id)
        .await
        .or_public("Failed to fetch part")?;
    Ok(Json(part))
}

#[utoipa::path(
    get,
    path = "/api/power-units",
    params(CatalogQuery),
    responses(
        (status = 200, description = "Power unit page", body = CatalogPage<PowerUnit>)
    ),
    tag = "catalog"
)]
pub async fn list_power_units(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> ApiResult<CatalogPage<PowerUnit>> {
    let filter = query.into_filter(DEFAULT_POWER_UNIT_LIMIT);
    let page = state
        .services
        .catalog
        .list_power_units(&filter)
        .await
        .or_public("Failed to fetch power units")?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/api/power-units/categories/counts",
    responses(
        (status = 200, description = "Power units per category", body = BTreeMap<String, u64>)
    ),
    tag = "catalog"
)]
pub async fn power_unit_category_counts(
    State(state): State<AppState>,
) -> ApiResult<BTreeMap<String, u64>> {
    let counts = state
        .services
        .catalog
        .power_unit_category_counts()
        .await
        .or_public("Failed to fetch power unit category counts")?;
    Ok(Json(counts))
}

#[utoipa::path(
    get,
    path = "/api/power-units/:id",
    params(("id" = i32, Path, description = "Power unit row id")),
    responses(
        (status = 200, description = "Power unit", body = PowerUnit),
        (status = 400, description = "Invalid power unit ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Power unit not found", body = crate::errors::ErrorResponse)
    ),
    tag = "catalog"
)]
pub async fn get_power_unit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PowerUnit> {
    let id = parse_path_id(&id, "Invalid power unit ID")?;
    let unit = state
        .services
        .catalog
        .get_power_unit(id)
        .await
        .or_public("Failed to fetch power unit")?;
    Ok(Json(unit))
}

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Catalog row counts", body = CatalogStats)
    ),
    tag = "catalog"
)]
pub async fn catalog_stats(State(state): State<AppState>) -> ApiResult<CatalogStats> {
    let stats = state
        .services
        .catalog
        .stats()
        .await
        .or_public("Failed to fetch stats")?;
    Ok(Json(stats))
}

pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/equipment", get(list_equipment))
        .route("/equipment/categories/counts", get(equipment_category_counts))
        .route("/equipment/:id", get(get_equipment))
        .route("/parts", get(list_parts))
        .route("/parts/categories/counts", get(parts_category_counts))
        .route("/parts/subcategories/counts", get(parts_subcategory_counts))
        .route("/parts/:id", get(get_part))
        .route("/power-units", get(list_power_units))
        .route("/power-units/categories/counts", get(power_unit_category_counts))
        .route("/power-units/:id", get(get_power_unit))
        .route("/stats", get(catalog_stats))
}
