//! Power unit import from the inventory spreadsheet, exported as TSV.
//!
//! The sheet holds four stacked sections with different column layouts, so
//! each section is read from a fixed row range with its own column map.

use std::path::Path;

use anyhow::Context;
use sea_orm::ActiveValue::{NotSet, Set};
use tracing::{info, instrument};

use super::{log_breakdown, replace_all, tally};
use crate::common::parse_leading_int;
use crate::db::DbPool;
use crate::models::{power_unit, PowerUnitEntity};

const NOT_AVAILABLE: &str = "N/A";
const MIN_FILLED_CELLS: usize = 5;
const IMAGED_UNITS: usize = 95;
const LOCATION: &str = "Tampa, FL";
const PRICE: &str = "Call for Price";

#[derive(Debug, Clone, Copy)]
struct Columns {
    brand: usize,
    model: usize,
    year: usize,
    condition: usize,
    hours: usize,
    hp: usize,
    kw: usize,
    rpm: usize,
    engine_rpm: usize,
    tier_rating: usize,
    fuel_type: usize,
    cooling: usize,
    enclosure: usize,
    volts: usize,
    stage: usize,
    selling_stage: usize,
    unit_type: usize,
}

#[derive(Debug, Clone, Copy)]
struct Section {
    name: &'static str,
    first_row: usize,
    last_row: usize,
    cols: Columns,
}

const SECTIONS: [Section; 4] = [
    Section {
        name: "Generator Sets",
        first_row: 2,
        last_row: 90,
        cols: Columns {
            brand: 1, model: 2, year: 5, condition: 9, hours: 11, hp: 14, kw: 17, rpm: 20,
            engine_rpm: 23, tier_rating: 27, fuel_type: 31, cooling: 35, enclosure: 38,
            volts: 41, stage: 43, selling_stage: 45, unit_type: 48,
        },
    },
    Section {
        name: "Industrial Engines",
        first_row: 93,
        last_row: 106,
        cols: Columns {
            brand: 0, model: 2, year: 7, condition: 10, hours: 14, hp: 18, kw: 22, rpm: 24,
            engine_rpm: 26, tier_rating: 30, fuel_type: 34, cooling: 37, enclosure: 39,
            volts: 42, stage: 43, selling_stage: 46, unit_type: 49,
        },
    },
    Section {
        name: "Marine Engines",
        first_row: 109,
        last_row: 132,
        cols: Columns {
            brand: 0, model: 2, year: 4, condition: 8, hours: 13, hp: 16, kw: 19, rpm: 22,
            engine_rpm: 25, tier_rating: 29, fuel_type: 33, cooling: 36, enclosure: 39,
            volts: 42, stage: 43, selling_stage: 45, unit_type: 48,
        },
    },
    Section {
        name: "Power Units",
        first_row: 135,
        last_row: 157,
        cols: Columns {
            brand: 0, model: 3, year: 6, condition: 9, hours: 12, hp: 15, kw: 18, rpm: 21,
            engine_rpm: 24, tier_rating: 28, fuel_type: 32, cooling: 35, enclosure: 38,
            volts: 40, stage: 42, selling_stage: 44, unit_type: 47,
        },
    },
];

/// Repairs brand names whose first letter was lost in the export
pub fn fix_brand(raw: &str) -> String {
    let brand = raw.trim();
    if brand.is_empty() || brand == NOT_AVAILABLE {
        return NOT_AVAILABLE.to_string();
    }
    let fixed = match brand {
        "ummins" | "ummings" => "Cummins",
        "aterpillar" => "Caterpillar",
        "roy Somer" => "Leroy Somer",
        "eneracs" => "Generac",
        "itsubishi" => "Mitsubishi",
        "ohn Deere" => "John Deere",
        "olvo" => "Volvo",
        "ohnson & Towers" => "Johnson & Towers",
        "etroit Diesel" => "Detroit Diesel",
        "an" => "MAN",
        "MTU / Detroit Dies" => "MTU / Detroit Diesel",
        other => other,
    };
    fixed.to_string()
}

fn clean(raw: &str) -> String {
    let value = raw.trim();
    if value.is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value.to_string()
    }
}

/// Integer cells may carry thousands separators or trailing units
pub fn parse_number(raw: &str) -> Option<i32> {
    let value = raw.trim();
    if value.is_empty() || value == NOT_AVAILABLE {
        return None;
    }
    parse_leading_int(&value.replace(',', "")).and_then(|n| i32::try_from(n).ok())
}

/// One unit ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerUnitRow {
    pub stock_number: String,
    pub brand: String,
    pub model: String,
    pub category: &'static str,
    pub hp: Option<i32>,
    pub kw: Option<i32>,
    pub rpm: Option<i32>,
    pub engine_rpm: Option<i32>,
    pub year: String,
    pub condition: String,
    pub hours: String,
    pub tier_rating: String,
    pub fuel_type: String,
    pub cooling: String,
    pub enclosure: String,
    pub volts: String,
    pub stage: String,
    pub selling_stage: String,
    pub unit_type: String,
    pub image_url: Option<String>,
}

impl PowerUnitRow {
    fn into_active_model(self) -> power_unit::ActiveModel {
        power_unit::ActiveModel {
            id: NotSet,
            stock_number: Set(self.stock_number),
            brand: Set(Some(self.brand)),
            model: Set(self.model),
            category: Set(self.category.to_string()),
            hp: Set(self.hp),
            kw: Set(self.kw),
            rpm: Set(self.rpm),
            engine_rpm: Set(self.engine_rpm),
            year: Set(Some(self.year)),
            condition: Set(Some(self.condition)),
            hours: Set(Some(self.hours)),
            tier_rating: Set(Some(self.tier_rating)),
            fuel_type: Set(Some(self.fuel_type)),
            cooling: Set(Some(self.cooling)),
            enclosure: Set(Some(self.enclosure)),
            volts: Set(Some(self.volts)),
            stage: Set(Some(self.stage)),
            selling_stage: Set(Some(self.selling_stage)),
            unit_type: Set(Some(self.unit_type)),
            location: Set(Some(LOCATION.to_string())),
            price: Set(Some(PRICE.to_string())),
            image_url: Set(self.image_url),
        }
    }
}

fn parse_row(cells: &[&str], section: &Section, index: usize) -> PowerUnitRow {
    let cell = |i: usize| cells.get(i).copied().unwrap_or("");
    let c = &section.cols;

    let brand = fix_brand(cell(c.brand));
    let model = clean(cell(c.model));
    let display_model = if brand == NOT_AVAILABLE {
        model
    } else {
        format!("{} {}", brand, model)
    };

    PowerUnitRow {
        stock_number: format!("PU-{:03}", index),
        brand,
        model: display_model,
        category: section.name,
        hp: parse_number(cell(c.hp)),
        kw: parse_number(cell(c.kw)),
        rpm: parse_number(cell(c.rpm)),
        engine_rpm: parse_number(cell(c.engine_rpm)),
        year: clean(cell(c.year)),
        condition: clean(cell(c.condition)),
        hours: clean(cell(c.hours)),
        tier_rating: clean(cell(c.tier_rating)),
        fuel_type: clean(cell(c.fuel_type)),
        cooling: clean(cell(c.cooling)),
        enclosure: clean(cell(c.enclosure)),
        volts: clean(cell(c.volts)),
        stage: clean(cell(c.stage)),
        selling_stage: clean(cell(c.selling_stage)),
        unit_type: clean(cell(c.unit_type)),
        image_url: (index <= IMAGED_UNITS)
            .then(|| format!("/images/power-units-new/power_unit_{:03}.png", index)),
    }
}

/// Parses the sheet's sections in order, numbering units across sections
pub fn parse_sheet(text: &str) -> Vec<PowerUnitRow> {
    let rows: Vec<Vec<&str>> = text
        .split('\n')
        .map(|line| line.trim_end_matches('\r').split('\t').collect())
        .collect();

    let mut units = Vec::new();
    for section in &SECTIONS {
        let last = section.last_row.min(rows.len().saturating_sub(1));
        for row in rows.iter().take(last + 1).skip(section.first_row) {
            let filled = row.iter().filter(|c| !c.trim().is_empty()).count();
            if filled < MIN_FILLED_CELLS {
                continue;
            }
            units.push(parse_row(row, section, units.len() + 1));
        }
    }
    units
}

#[instrument(skip(db))]
pub async fn import_power_units(db: &DbPool, path: &Path) -> anyhow::Result<usize> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read power unit sheet {}", path.display()))?;
    let units = parse_sheet(&text);
    info!("Parsed {} items", units.len());
    log_breakdown("Units per category", tally(units.iter().map(|u| u.category)));

    for section in &SECTIONS {
        for unit in units.iter().filter(|u| u.category == section.name).take(3) {
            info!(
                "  {}: {} | {} | HP:{:?} KW:{:?} | {}hrs | {} | {}",
                unit.stock_number,
                unit.model,
                unit.condition,
                unit.hp,
                unit.kw,
                unit.hours,
                unit.fuel_type,
                unit.enclosure
            );
        }
    }

    let rows = units
        .into_iter()
        .map(PowerUnitRow::into_active_model)
        .collect();
    let inserted = replace_all::<PowerUnitEntity, _>(db, rows, 500, "Power Units").await?;
    info!("Inserted {} power units", inserted);
    Ok(inserted)
}
