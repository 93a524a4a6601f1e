//! Bootstraps an empty database from the JSON exports in the data directory.
//!
//! A table is only reseeded while its row count is under the threshold, so
//! running this on every startup is cheap once the catalog is loaded. Export
//! keys may be camelCase or snake_case.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use sea_orm::{
    ActiveModelTrait,
    ActiveValue::{NotSet, Set},
    EntityTrait, PaginatorTrait,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{error, info, instrument};

use super::replace_all;
use crate::db::DbPool;
use crate::models::{
    equipment, part, power_unit, EquipmentEntity, PartEntity, PowerUnitEntity,
};

const BATCH_SIZE: usize = 500;
pub const EQUIPMENT_THRESHOLD: u64 = 2000;
pub const PARTS_THRESHOLD: u64 = 17000;
pub const POWER_UNITS_THRESHOLD: u64 = 100;

const EQUIPMENT_FILE: &str = "equipment.json";
const PARTS_FILE: &str = "parts.json";
const POWER_UNITS_FILE: &str = "power-units.json";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EquipmentRecord {
    #[serde(alias = "equipment_id")]
    equipment_id: String,
    make: String,
    model: String,
    year: Option<i32>,
    meter: Option<i32>,
    price: Option<String>,
    city: Option<String>,
    state: Option<String>,
    category: String,
    #[serde(alias = "image_url")]
    image_url: Option<String>,
}

impl From<EquipmentRecord> for equipment::ActiveModel {
    fn from(r: EquipmentRecord) -> Self {
        equipment::ActiveModel {
            id: NotSet,
            equipment_id: Set(r.equipment_id),
            make: Set(r.make),
            model: Set(r.model),
            year: Set(r.year),
            meter: Set(r.meter),
            price: Set(r.price),
            city: Set(r.city),
            state: Set(r.state),
            category: Set(r.category),
            image_url: Set(r.image_url),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PartRecord {
    #[serde(alias = "part_number")]
    part_number: String,
    description: String,
    category: String,
    subcategory: Option<String>,
    price: Option<String>,
    compatibility: Option<String>,
    #[serde(alias = "engine_model")]
    engine_model: Option<String>,
    gasket: Option<String>,
    equipment: Option<String>,
    #[serde(alias = "image_url")]
    image_url: Option<String>,
}

impl From<PartRecord> for part::ActiveModel {
    fn from(r: PartRecord) -> Self {
        part::ActiveModel {
            id: NotSet,
            part_number: Set(r.part_number),
            description: Set(r.description),
            category: Set(r.category),
            subcategory: Set(r.subcategory),
            price: Set(r.price),
            compatibility: Set(r.compatibility),
            engine_model: Set(r.engine_model),
            gasket: Set(r.gasket),
            equipment: Set(r.equipment),
            image_url: Set(r.image_url),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PowerUnitRecord {
    #[serde(alias = "stock_number")]
    stock_number: String,
    brand: Option<String>,
    model: String,
    category: String,
    hp: Option<i32>,
    kw: Option<i32>,
    rpm: Option<i32>,
    #[serde(alias = "engine_rpm")]
    engine_rpm: Option<i32>,
    year: Option<String>,
    condition: Option<String>,
    hours: Option<String>,
    #[serde(alias = "tier_rating")]
    tier_rating: Option<String>,
    #[serde(alias = "fuel_type")]
    fuel_type: Option<String>,
    cooling: Option<String>,
    enclosure: Option<String>,
    volts: Option<String>,
    stage: Option<String>,
    #[serde(alias = "selling_stage")]
    selling_stage: Option<String>,
    #[serde(alias = "unit_type")]
    unit_type: Option<String>,
    location: Option<String>,
    price: Option<String>,
    #[serde(alias = "image_url")]
    image_url: Option<String>,
}

impl From<PowerUnitRecord> for power_unit::ActiveModel {
    fn from(r: PowerUnitRecord) -> Self {
        power_unit::ActiveModel {
            id: NotSet,
            stock_number: Set(r.stock_number),
            brand: Set(r.brand),
            model: Set(r.model),
            category: Set(r.category),
            hp: Set(r.hp),
            kw: Set(r.kw),
            rpm: Set(r.rpm),
            engine_rpm: Set(r.engine_rpm),
            year: Set(r.year),
            condition: Set(r.condition),
            hours: Set(r.hours),
            tier_rating: Set(r.tier_rating),
            fuel_type: Set(r.fuel_type),
            cooling: Set(r.cooling),
            enclosure: Set(r.enclosure),
            volts: Set(r.volts),
            stage: Set(r.stage),
            selling_stage: Set(r.selling_stage),
            unit_type: Set(r.unit_type),
            location: Set(r.location),
            price: Set(r.price),
            image_url: Set(r.image_url),
        }
    }
}

/// Rows written per table; `None` when the table was left alone
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub equipment: Option<usize>,
    pub parts: Option<usize>,
    pub power_units: Option<usize>,
    pub synced_images: usize,
}

fn read_export<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Option<Vec<T>>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let rows = serde_json::from_str(&raw)
        .with_context(|| format!("malformed export {}", path.display()))?;
    Ok(Some(rows))
}

async fn reseed<E, R, A>(db: &DbPool, path: &Path, label: &str) -> anyhow::Result<Option<usize>>
where
    E: EntityTrait,
    R: DeserializeOwned,
    A: ActiveModelTrait<Entity = E> + From<R> + Send,
{
    let Some(records) = read_export::<R>(path)? else {
        info!("{} data file not found, skipping", label);
        return Ok(None);
    };
    info!("Importing {}...", label);
    let rows: Vec<A> = records.into_iter().map(A::from).collect();
    let inserted = replace_all::<E, A>(db, rows, BATCH_SIZE, label).await?;
    info!("Imported {} {} rows", inserted, label);
    Ok(Some(inserted))
}

/// Seeds every table whose row count is under its threshold. When all
/// tables are populated only power unit image URLs are synced.
#[instrument(skip(db))]
pub async fn seed_database(db: &DbPool, data_dir: &Path) -> anyhow::Result<SeedReport> {
    let equipment_count = EquipmentEntity::find().count(db).await?;
    let parts_count = PartEntity::find().count(db).await?;
    let power_unit_count = PowerUnitEntity::find().count(db).await?;

    let mut report = SeedReport::default();
    if equipment_count >= EQUIPMENT_THRESHOLD
        && parts_count >= PARTS_THRESHOLD
        && power_unit_count >= POWER_UNITS_THRESHOLD
    {
        info!(
            "Database already seeded ({} equipment, {} parts, {} power units)",
            equipment_count, parts_count, power_unit_count
        );
        report.synced_images = sync_power_unit_images(db, &data_dir.join(POWER_UNITS_FILE)).await?;
        return Ok(report);
    }

    info!(
        "Current counts: {} equipment, {} parts, {} power units",
        equipment_count, parts_count, power_unit_count
    );

    if equipment_count < EQUIPMENT_THRESHOLD {
        report.equipment = reseed::<EquipmentEntity, EquipmentRecord, equipment::ActiveModel>(
            db,
            &data_dir.join(EQUIPMENT_FILE),
            "Equipment",
        )
        .await?;
    }
    if parts_count < PARTS_THRESHOLD {
        report.parts =
            reseed::<PartEntity, PartRecord, part::ActiveModel>(db, &data_dir.join(PARTS_FILE), "Parts")
                .await?;
    }
    if power_unit_count < POWER_UNITS_THRESHOLD {
        report.power_units = reseed::<PowerUnitEntity, PowerUnitRecord, power_unit::ActiveModel>(
            db,
            &data_dir.join(POWER_UNITS_FILE),
            "Power Units",
        )
        .await?;
    }

    info!("Seeding complete");
    Ok(report)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PowerUnitImage {
    #[serde(alias = "stock_number")]
    stock_number: Option<String>,
    #[serde(alias = "image_url")]
    image_url: Option<String>,
}

/// Points each power unit at the image its export row names
pub async fn sync_power_unit_images(db: &DbPool, path: &Path) -> anyhow::Result<usize> {
    let Some(records) = read_export::<PowerUnitImage>(path)? else {
        return Ok(0);
    };
    let expected: HashMap<String, String> = records
        .into_iter()
        .filter_map(|r| match (r.stock_number, r.image_url) {
            (Some(stock), Some(url)) if !stock.is_empty() && !url.is_empty() => Some((stock, url)),
            _ => None,
        })
        .collect();

    let mut updated = 0;
    for unit in PowerUnitEntity::find().all(db).await? {
        let Some(url) = expected.get(&unit.stock_number) else {
            continue;
        };
        if unit.image_url.as_deref() == Some(url.as_str()) {
            continue;
        }
        let mut active: power_unit::ActiveModel = unit.into();
        active.image_url = Set(Some(url.clone()));
        active.update(db).await?;
        updated += 1;
    }

    if updated > 0 {
        info!("Synced {} power unit image URLs to match data file", updated);
    } else {
        info!("Power unit images already in sync");
    }
    Ok(updated)
}

/// Startup hook: seeding failures are logged and never stop the server
pub async fn seed_on_startup(db: &DbPool, data_dir: &Path) {
    if let Err(e) = seed_database(db, data_dir).await {
        error!("Seeding error: {:#}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::test_support::memory_db;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: serde_json::Value) {
        std::fs::write(dir.join(name), value.to_string()).unwrap();
    }

    #[tokio::test]
    async fn seeds_tables_from_mixed_case_exports() {
        let db = memory_db().await;
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            EQUIPMENT_FILE,
            json!([
                {"equipment_id": "1001", "make": "CAT", "model": "D6T", "year": 2015,
                 "meter": 4200, "price": "$150,000", "category": "Dozers", "image_url": "/a.jpg"},
                {"equipmentId": "1002", "make": "Deere", "model": "350G", "category": "Excavators"}
            ]),
        );
        write(
            dir.path(),
            PARTS_FILE,
            json!([{"partNumber": "1R0750", "description": "OIL FILTER", "category": "Filters",
                    "engine_model": "3306"}]),
        );

        let report = seed_database(&db, dir.path()).await.unwrap();

        assert_eq!(report.equipment, Some(2));
        assert_eq!(report.parts, Some(1));
        assert_eq!(report.power_units, None);
        let machines = EquipmentEntity::find().all(db.as_ref()).await.unwrap();
        assert_eq!(machines[0].image_url.as_deref(), Some("/a.jpg"));
        assert_eq!(machines[1].equipment_id, "1002");
        let parts = PartEntity::find().all(db.as_ref()).await.unwrap();
        assert_eq!(parts[0].engine_model.as_deref(), Some("3306"));
    }

    #[tokio::test]
    async fn syncs_power_unit_images_from_export() {
        let db = memory_db().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(POWER_UNITS_FILE);
        write(
            dir.path(),
            POWER_UNITS_FILE,
            json!([
                {"stockNumber": "PU-001", "model": "Cummins QSK60", "category": "Generator Sets",
                 "imageUrl": "/images/power-units-new/power_unit_001.png"},
                {"stock_number": "PU-002", "model": "CAT 3516", "category": "Generator Sets"}
            ]),
        );
        reseed::<PowerUnitEntity, PowerUnitRecord, power_unit::ActiveModel>(&db, &path, "Power Units")
            .await
            .unwrap();

        let mut first: power_unit::ActiveModel = PowerUnitEntity::find()
            .all(db.as_ref())
            .await
            .unwrap()
            .remove(0)
            .into();
        first.image_url = Set(Some("/stale.png".into()));
        first.update(db.as_ref()).await.unwrap();

        assert_eq!(sync_power_unit_images(&db, &path).await.unwrap(), 1);
        assert_eq!(sync_power_unit_images(&db, &path).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_exports_are_skipped() {
        let db = memory_db().await;
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(seed_database(&db, dir.path()).await.unwrap(), SeedReport::default());
    }
}
