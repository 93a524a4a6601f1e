use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ColumnTrait, Condition, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use utoipa::ToSchema;

use crate::common::{format_money, parse_price, round_whole};
use crate::db::{DbPool, QueryBuilder, SearchBuilder};
use crate::errors::ServiceError;
use crate::models::{equipment, part, power_unit, Equipment, Part, PowerUnit};

pub const DEFAULT_EQUIPMENT_LIMIT: u64 = 24;
pub const DEFAULT_PARTS_LIMIT: u64 = 50;
pub const DEFAULT_POWER_UNIT_LIMIT: u64 = 24;
pub const MAX_PAGE_LIMIT: u64 = 200;

/// One page of catalog rows plus the filtered total
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CatalogPage<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Filters shared by the three catalog listings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub search: Option<String>,
    pub page: u64,
    pub limit: u64,
}

impl CatalogFilter {
    pub fn new(page: u64, limit: u64) -> Self {
        Self {
            page,
            limit,
            ..Default::default()
        }
    }

    fn category_eq<C: ColumnTrait>(&self, column: C) -> Option<Condition> {
        self.category
            .as_ref()
            .map(|category| Condition::all().add(column.eq(category.clone())))
    }

    fn page_limit(&self) -> (u64, u64) {
        (self.page.max(1), self.limit.clamp(1, MAX_PAGE_LIMIT))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub equipment_count: u64,
    pub parts_count: u64,
    pub power_units_count: u64,
}

/// Asking-price spread for one equipment category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PriceSummary {
    pub min: String,
    pub max: String,
    pub avg: String,
    pub count: u64,
}

#[derive(Debug, FromQueryResult)]
struct GroupCount {
    bucket: Option<String>,
    count: i64,
}

#[derive(Debug, FromQueryResult)]
struct CategoryPrice {
    category: String,
    price: Option<String>,
}

fn concat_with_space(left: SimpleExpr, right: SimpleExpr) -> SimpleExpr {
    Expr::cust_with_exprs("$1 || ' ' || $2", [left, right])
}

fn into_count_map(rows: Vec<GroupCount>, null_bucket: Option<&str>) -> BTreeMap<String, u64> {
    let mut counts = BTreeMap::new();
    for row in rows {
        let key = match (row.bucket, null_bucket) {
            (Some(bucket), _) => bucket,
            (None, Some(fallback)) => fallback.to_string(),
            (None, None) => continue,
        };
        *counts.entry(key).or_insert(0) += row.count.max(0) as u64;
    }
    counts
}

/// Builds the per-category summary from raw listing prices.
/// Prices keep only digits and dots; rows left empty or unparseable are skipped.
pub fn summarize_prices<I>(rows: I) -> BTreeMap<String, PriceSummary>
where
    I: IntoIterator<Item = (String, Option<String>)>,
{
    let mut grouped: BTreeMap<String, Vec<Decimal>> = BTreeMap::new();
    for (category, price) in rows {
        if let Some(value) = price.as_deref().and_then(parse_price) {
            grouped.entry(category).or_default().push(value);
        }
    }

    grouped
        .into_iter()
        .filter_map(|(category, prices)| {
            let min = prices.iter().min().copied()?;
            let max = prices.iter().max().copied()?;
            let sum: Decimal = prices.iter().copied().sum();
            let avg = sum / Decimal::from(prices.len() as u64);
            Some((
                category,
                PriceSummary {
                    min: format_money(min),
                    max: format_money(max),
                    avg: format_money(Decimal::from(round_whole(avg))),
                    count: prices.len() as u64,
                },
            ))
        })
        .collect()
}

/// Read-only queries over equipment, parts and power units
#[derive(Clone)]
pub struct CatalogService {
    db_pool: Arc<DbPool>,
}

impl CatalogService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn list_equipment(
        &self,
        filter: &CatalogFilter,
    ) -> Result<CatalogPage<Equipment>, ServiceError> {
        let search = filter.search.as_deref().and_then(|term| {
            SearchBuilder::new(term)
                .add_like(equipment::Column::Make)
                .add_like(equipment::Column::Model)
                .add_like(equipment::Column::EquipmentId)
                .add_like(equipment::Column::City)
                .add_like(equipment::Column::State)
                .add_like_expr(concat_with_space(
                    Expr::col(equipment::Column::Make).into(),
                    Expr::col(equipment::Column::Model).into(),
                ))
                .build()
        });
        let (page, limit) = filter.page_limit();

        let (items, total) = QueryBuilder::<equipment::Entity>::new()
            .filter_opt(filter.category_eq(equipment::Column::Category))
            .filter_opt(search)
            .order_by(equipment::Column::Id, false)
            .paginate(page, limit)
            .execute(&*self.db_pool)
            .await?;

        debug!(total, returned = items.len(), "Listed equipment");
        Ok(CatalogPage { items, total })
    }

    #[instrument(skip(self))]
    pub async fn equipment_category_counts(&self) -> Result<BTreeMap<String, u64>, ServiceError> {
        let rows = equipment::Entity::find()
            .select_only()
            .column_as(equipment::Column::Category, "bucket")
            .column_as(Expr::col(equipment::Column::Id).count(), "count")
            .group_by(equipment::Column::Category)
            .into_model::<GroupCount>()
            .all(&*self.db_pool)
            .await?;
        Ok(into_count_map(rows, None))
    }

    /// Looks up by the external listing id, not the row key
    #[instrument(skip(self))]
    pub async fn get_equipment(&self, equipment_id: &str) -> Result<Equipment, ServiceError> {
        equipment::Entity::find()
            .filter(equipment::Column::EquipmentId.eq(equipment_id))
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Equipment not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn equipment_price_summary(
        &self,
    ) -> Result<BTreeMap<String, PriceSummary>, ServiceError> {
        let rows = equipment::Entity::find()
            .select_only()
            .column(equipment::Column::Category)
            .column(equipment::Column::Price)
            .filter(equipment::Column::Price.is_not_null())
            .into_model::<CategoryPrice>()
            .all(&*self.db_pool)
            .await?;
        Ok(summarize_prices(
            rows.into_iter().map(|row| (row.category, row.price)),
        ))
    }

    #[instrument(skip(self))]
    pub async fn list_parts(&self, filter: &CatalogFilter) -> Result<CatalogPage<Part>, ServiceError> {
        let search = filter.search.as_deref().and_then(|term| {
            SearchBuilder::new(term)
                .add_like(part::Column::PartNumber)
                .add_like(part::Column::Description)
                .add_like(part::Column::Equipment)
                .add_like(part::Column::EngineModel)
                .build()
        });
        let subcategory = filter
            .subcategory
            .as_ref()
            .map(|sub| Condition::all().add(part::Column::Subcategory.eq(sub.clone())));
        let (page, limit) = filter.page_limit();

        let (items, total) = QueryBuilder::<part::Entity>::new()
            .filter_opt(filter.category_eq(part::Column::Category))
            .filter_opt(subcategory)
            .filter_opt(search)
            .order_by(part::Column::Id, false)
            .paginate(page, limit)
            .execute(&*self.db_pool)
            .await?;

        debug!(total, returned = items.len(), "Listed parts");
        Ok(CatalogPage { items, total })
    }

    #[instrument(skip(self))]
    pub async fn parts_category_counts(&self) -> Result<BTreeMap<String, u64>, ServiceError> {
        let rows = part::Entity::find()
            .select_only()
            .column_as(part::Column::Category, "bucket")
            .column_as(Expr::col(part::Column::Id).count(), "count")
            .group_by(part::Column::Category)
            .into_model::<GroupCount>()
            .all(&*self.db_pool)
            .await?;
        Ok(into_count_map(rows, None))
    }

    /// Subcategory histogram, optionally within one category. Rows without a
    /// subcategory are counted under "Other".
    #[instrument(skip(self))]
    pub async fn parts_subcategory_counts(
        &self,
        category: Option<&str>,
    ) -> Result<BTreeMap<String, u64>, ServiceError> {
        let mut query = part::Entity::find()
            .select_only()
            .column_as(part::Column::Subcategory, "bucket")
            .column_as(Expr::col(part::Column::Id).count(), "count")
            .group_by(part::Column::Subcategory);
        if let Some(category) = category {
            query = query.filter(part::Column::Category.eq(category));
        }
        let rows = query
            .into_model::<GroupCount>()
            .all(&*self.db_pool)
            .await?;
        Ok(into_count_map(rows, Some("Other")))
    }

    #[instrument(skip(self))]
    pub async fn get_part(&self, id: i32) -> Result<Part, ServiceError> {
        part::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Part not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn list_power_units(
        &self,
        filter: &CatalogFilter,
    ) -> Result<CatalogPage<PowerUnit>, ServiceError> {
        let search = filter.search.as_deref().and_then(|term| {
            SearchBuilder::new(term)
                .add_like(power_unit::Column::Model)
                .add_like(power_unit::Column::StockNumber)
                .add_like(power_unit::Column::Condition)
                .add_like(power_unit::Column::Brand)
                .add_like(power_unit::Column::FuelType)
                .add_like(power_unit::Column::UnitType)
                .build()
        });
        let (page, limit) = filter.page_limit();

        let (items, total) = QueryBuilder::<power_unit::Entity>::new()
            .filter_opt(filter.category_eq(power_unit::Column::Category))
            .filter_opt(search)
            .order_by(power_unit::Column::Id, false)
            .paginate(page, limit)
            .execute(&*self.db_pool)
            .await?;

        Ok(CatalogPage { items, total })
    }

    #[instrument(skip(self))]
    pub async fn power_unit_category_counts(&self) -> Result<BTreeMap<String, u64>, ServiceError> {
        let rows = power_unit::Entity::find()
            .select_only()
            .column_as(power_unit::Column::Category, "bucket")
            .column_as(Expr::col(power_unit::Column::Id).count(), "count")
            .group_by(power_unit::Column::Category)
            .into_model::<GroupCount>()
            .all(&*self.db_pool)
            .await?;
        Ok(into_count_map(rows, None))
    }

    #[instrument(skip(self))]
    pub async fn get_power_unit(&self, id: i32) -> Result<PowerUnit, ServiceError> {
        power_unit::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Power unit not found".to_string()))
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<CatalogStats, ServiceError> {
        let db = &*self.db_pool;
        let (equipment_count, parts_count, power_units_count) = tokio::try_join!(
            equipment::Entity::find().count(db),
            part::Entity::find().count(db),
            power_unit::Entity::find().count(db),
        )?;
        Ok(CatalogStats {
            equipment_count,
            parts_count,
            power_units_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(category: &str, price: Option<&str>) -> (String, Option<String>) {
        (category.to_string(), price.map(str::to_string))
    }

    #[test]
    fn summarizes_prices_per_category() {
        let summary = summarize_prices(vec![
            row("Excavators", Some("$45,000")),
            row("Excavators", Some("120000")),
            row("Excavators", Some("$100,001 OBO")),
            row("Excavators", Some("CALL")),
            row("Excavators", None),
            row("Dozers", Some("1.2.3")),
            row("Loaders", Some("$80,500.50")),
        ]);

        let excavators = &summary["Excavators"];
        assert_eq!(excavators.min, "$45,000");
        assert_eq!(excavators.max, "$120,000");
        assert_eq!(excavators.avg, "$88,334");
        assert_eq!(excavators.count, 3);
        assert!(!summary.contains_key("Dozers"));
        assert_eq!(summary["Loaders"].max, "$80,500.5");
        assert_eq!(summary["Loaders"].avg, "$80,501");
    }

    #[test]
    fn count_map_buckets_nulls() {
        let rows = vec![
            GroupCount { bucket: Some("Filters".into()), count: 3 },
            GroupCount { bucket: None, count: 2 },
        ];
        let counts = into_count_map(rows, Some("Other"));
        assert_eq!(counts["Filters"], 3);
        assert_eq!(counts["Other"], 2);
    }

    #[test]
    fn filter_limit_is_capped() {
        let filter = CatalogFilter::new(0, 5000);
        assert_eq!(filter.page_limit(), (1, MAX_PAGE_LIMIT));
    }
}
