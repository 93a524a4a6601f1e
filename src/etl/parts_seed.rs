use std::path::Path;

use anyhow::Context;
use sea_orm::ActiveValue::{NotSet, Set};
use tracing::{info, instrument};

use super::catalog_parser::ParsedPart;
use super::{category_slug, log_breakdown, replace_all};
use crate::db::DbPool;
use crate::models::{part, PartEntity};
use crate::services::catalog::CatalogService;

const BATCH_SIZE: usize = 500;
const GENERIC_CATEGORY_IMAGE: &str = "/images/parts/generic-part.jpg";

/// Category-level photo shown until item images are assigned
pub fn category_image(category: &str) -> String {
    category_slug(category)
        .map(|slug| format!("/images/parts/{}.jpg", slug))
        .unwrap_or_else(|| GENERIC_CATEGORY_IMAGE.to_string())
}

fn non_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn to_active_model(parsed: ParsedPart) -> part::ActiveModel {
    let description = if parsed.description.is_empty() {
        parsed.category.clone()
    } else {
        parsed.description
    };
    let equipment = non_empty(parsed.equipment);
    part::ActiveModel {
        id: NotSet,
        part_number: Set(parsed.part_number),
        description: Set(description),
        image_url: Set(Some(category_image(&parsed.category))),
        category: Set(parsed.category),
        subcategory: Set(non_empty(parsed.subcategory)),
        price: Set(None),
        compatibility: Set(equipment.clone()),
        engine_model: Set(non_empty(parsed.engine_model)),
        gasket: Set(non_empty(parsed.gasket)),
        equipment: Set(equipment),
    }
}

/// Replaces the parts table with the parser's JSON output
#[instrument(skip(db))]
pub async fn seed_parts(db: &DbPool, input: &Path) -> anyhow::Result<usize> {
    let raw = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read parsed parts {}", input.display()))?;
    let parsed: Vec<ParsedPart> = serde_json::from_str(&raw)
        .with_context(|| format!("malformed parsed parts file {}", input.display()))?;
    info!("Loaded {} parts", parsed.len());

    let rows = parsed.into_iter().map(to_active_model).collect();
    let inserted = replace_all::<PartEntity, _>(db, rows, BATCH_SIZE, "Parts").await?;

    let catalog = CatalogService::new(std::sync::Arc::new(db.clone()));
    let counts = catalog.parts_category_counts().await?;
    log_breakdown(
        "Category counts",
        counts.iter().map(|(k, v)| (k.as_str(), *v)),
    );
    info!("Done, {} parts in database", inserted);
    Ok(inserted)
}
