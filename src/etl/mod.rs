//! Offline jobs that build and enrich the catalog tables.
//!
//! Every job is driven by the `catalog-etl` binary; [`seed::seed_database`]
//! is also run by the server when `seed_on_startup` is set. Jobs that
//! rebuild a table do so inside one transaction so a failed run leaves the
//! previous catalog in place.

pub mod catalog_parser;
pub mod category_images;
pub mod image_assign;
pub mod image_classifier;
pub mod image_decode;
pub mod image_matcher;
pub mod inventory;
pub mod parts_seed;
pub mod power_units;
pub mod seed;

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use sea_orm::{
    sea_query::{CaseStatement, Expr, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::db::DbPool;
use crate::models::{part, PartEntity};

/// The fourteen part categories images are classified into, in prompt order
pub const PART_CATEGORIES: [&str; 14] = [
    "Hydraulic System",
    "Engine Components",
    "Bearings",
    "Undercarriage",
    "Filters",
    "Electrical",
    "Ground Engaging Tools",
    "Belts & Hoses",
    "Braking & Friction",
    "Hardware",
    "Cooling System",
    "Turbochargers",
    "Air Inlet & Exhaust",
    "Gaskets & Seals",
];

/// File-name stem of each category's representative image
pub fn category_slug(category: &str) -> Option<&'static str> {
    let slug = match category {
        "Air Inlet & Exhaust" => "air-inlet-exhaust",
        "Turbochargers" => "turbochargers",
        "Bearings" => "bearings",
        "Belts & Hoses" => "belts-hoses",
        "Braking & Friction" => "braking-friction",
        "Cooling System" => "cooling-system",
        "Electrical" => "electrical",
        "Engine Components" => "engine-components",
        "Filters" => "filters",
        "Ground Engaging Tools" => "ground-engaging",
        "Hardware" => "hardware",
        "Hydraulic System" => "hydraulic-system",
        "Gaskets & Seals" => "gaskets-seals",
        "Undercarriage" => "undercarriage",
        _ => return None,
    };
    Some(slug)
}

pub const ITEM_IMAGE_PREFIX: &str = "/images/parts/items/";
pub const GENERIC_PART_IMAGE: &str = "/images/parts/generic-part.png";

/// One entry of the classification checkpoint file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageClassification {
    pub file: String,
    pub category: String,
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn read_classifications(path: &Path) -> anyhow::Result<Vec<ImageClassification>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read classifications from {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("malformed classifications file {}", path.display()))
}

pub fn write_classifications(path: &Path, items: &[ImageClassification]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(items)?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write classifications to {}", path.display()))
}

/// Groups classified images by category, keeping file order within a group
pub fn images_by_category(
    items: &[ImageClassification],
) -> BTreeMap<&str, Vec<&ImageClassification>> {
    let mut groups: BTreeMap<&str, Vec<&ImageClassification>> = BTreeMap::new();
    for item in items {
        groups.entry(item.category.as_str()).or_default().push(item);
    }
    groups
}

/// Logs a `label: count` breakdown, largest first
pub fn log_breakdown<'a>(title: &str, counts: impl IntoIterator<Item = (&'a str, u64)>) {
    let mut rows: Vec<(&str, u64)> = counts.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    info!("{}:", title);
    for (label, count) in rows {
        info!("  {}: {}", label, count);
    }
}

/// Counts occurrences of each key
pub fn tally<'a>(keys: impl IntoIterator<Item = &'a str>) -> BTreeMap<&'a str, u64> {
    let mut counts = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Deletes every row of `E` and inserts `rows` in batches, all in one transaction
pub async fn replace_all<E, A>(
    db: &DbPool,
    rows: Vec<A>,
    batch_size: usize,
    label: &str,
) -> anyhow::Result<usize>
where
    E: EntityTrait,
    A: ActiveModelTrait<Entity = E> + Send,
{
    let total = rows.len();
    let txn = db.begin().await?;
    let removed = E::delete_many().exec(&txn).await?.rows_affected;
    info!(table = label, removed, "Cleared existing rows");

    let mut inserted = 0usize;
    let mut remaining = rows.into_iter().peekable();
    while remaining.peek().is_some() {
        let batch: Vec<A> = remaining.by_ref().take(batch_size.max(1)).collect();
        inserted += batch.len();
        E::insert_many(batch)
            .exec(&txn)
            .await
            .with_context(|| format!("failed inserting {} batch", label))?;
        if inserted % 2000 == 0 || inserted == total {
            info!("  {}: {}/{}", label, inserted, total);
        }
    }

    txn.commit().await?;
    Ok(inserted)
}

/// A part row and the image it should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAssignment {
    pub part_id: i32,
    pub image_url: String,
}

/// Writes part image URLs with one `CASE id WHEN .. THEN .. END` update per batch
pub async fn apply_image_assignments(
    db: &DbPool,
    assignments: &[ImageAssignment],
    batch_size: usize,
) -> anyhow::Result<()> {
    let txn = db.begin().await?;
    let total = assignments.len();
    let mut done = 0usize;
    for batch in assignments.chunks(batch_size.max(1)) {
        update_image_batch(&txn, batch).await?;
        done += batch.len();
        if done % 2000 < batch_size || done == total {
            info!("  Updated {}/{}", done, total);
        }
    }
    txn.commit().await?;
    Ok(())
}

async fn update_image_batch<C: ConnectionTrait>(
    conn: &C,
    batch: &[ImageAssignment],
) -> anyhow::Result<()> {
    let case = batch.iter().fold(CaseStatement::new(), |case, a| {
        case.case(
            Expr::col(part::Column::Id).eq(a.part_id),
            Expr::val(a.image_url.clone()),
        )
    });
    let ids: Vec<i32> = batch.iter().map(|a| a.part_id).collect();
    PartEntity::update_many()
        .col_expr(part::Column::ImageUrl, SimpleExpr::Case(Box::new(case)))
        .filter(part::Column::Id.is_in(ids))
        .exec(conn)
        .await
        .context("failed updating part images")?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use sea_orm::{ActiveValue::Set, PaginatorTrait};

    #[test]
    fn every_part_category_has_a_slug() {
        for category in PART_CATEGORIES {
            assert!(category_slug(category).is_some(), "{}", category);
        }
        assert_eq!(category_slug("Ground Engaging Tools"), Some("ground-engaging"));
        assert_eq!(category_slug("Fluids"), None);
    }

    #[test]
    fn classifications_round_trip_through_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        let items = vec![ImageClassification {
            file: "part-0001.png".into(),
            category: "Filters".into(),
            part_type: "oil filter".into(),
            keywords: None,
            error: None,
        }];
        write_classifications(&path, &items).unwrap();
        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"partType\": \"oil filter\""));
        assert!(!raw.contains("error"));
        assert_eq!(read_classifications(&path).unwrap(), items);
    }

    #[tokio::test]
    async fn replace_all_swaps_table_contents() {
        let db = memory_db().await;
        insert_part(&db, "OLD-1", "Filters", None, "old").await;

        let rows: Vec<part::ActiveModel> = (0..5)
            .map(|i| part::ActiveModel {
                part_number: Set(format!("1R{:04}", i)),
                description: Set("Oil filter".into()),
                category: Set("Filters".into()),
                ..Default::default()
            })
            .collect();
        let inserted = replace_all(&db, rows, 2, "Parts").await.unwrap();

        assert_eq!(inserted, 5);
        assert_eq!(PartEntity::find().count(db.as_ref()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn image_assignments_update_only_listed_parts() {
        let db = memory_db().await;
        let a = insert_part(&db, "1R0001", "Filters", None, "Oil filter").await;
        let b = insert_part(&db, "1R0002", "Filters", None, "Fuel filter").await;
        let c = insert_part(&db, "1R0003", "Filters", None, "Air filter").await;

        let assignments = vec![
            ImageAssignment { part_id: a, image_url: "/images/parts/items/part-0001.png".into() },
            ImageAssignment { part_id: b, image_url: "/images/parts/items/part-0002.png".into() },
        ];
        apply_image_assignments(&db, &assignments, 1).await.unwrap();

        let url = |id| {
            let db = db.clone();
            async move { PartEntity::find_by_id(id).one(db.as_ref()).await.unwrap().unwrap().image_url }
        };
        assert_eq!(url(a).await.as_deref(), Some("/images/parts/items/part-0001.png"));
        assert_eq!(url(b).await.as_deref(), Some("/images/parts/items/part-0002.png"));
        assert_eq!(url(c).await, None);
    }
}
