//! Equipment import from the dealer listing export (Latin-1, tab separated)

use std::collections::HashSet;
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::ActiveValue::{NotSet, Set};
use tracing::{info, instrument};

use super::{log_breakdown, replace_all, tally};
use crate::common::{parse_leading_int, truncate_chars};
use crate::db::DbPool;
use crate::models::{equipment, EquipmentEntity};

pub const OTHER_EQUIPMENT: &str = "OTHER EQUIPMENT";
const BATCH_SIZE: usize = 100;
const MIN_COLUMNS: usize = 9;

static LISTING_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"americanironus\.com/([^.]+)\.html").expect("valid listing regex"));

fn category_from_slug(slug: &str) -> Option<&'static str> {
    let category = match slug {
        "equipment-scrapers" => "SCRAPERS",
        "equipment-articulated-trucks" => "ARTICULATED TRUCKS",
        "equipment-wheel-loaders" => "WHEEL LOADERS",
        "equipment-excavators" => "EXCAVATORS",
        "equipment-bulldozers" => "BULLDOZERS",
        "equipment-telehandlers" => "TELEHANDLERS",
        "equipment-motor-graders" => "MOTOR GRADERS",
        "equipment-skidsteer" => "SKIDSTEER",
        "equipment-off-highway-trucks" => "OFF-HIGHWAY TRUCKS",
        "equipment-backhoes" => "BACKHOES",
        "equipment-compactors" => "COMPACTORS",
        "equipment-track-dozers" => "TRACK DOZERS",
        "equipment" => OTHER_EQUIPMENT,
        _ => return None,
    };
    Some(category)
}

/// Category encoded in the listing's web link
pub fn category_from_link(link: &str) -> &'static str {
    LISTING_LINK
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|slug| category_from_slug(slug.as_str()))
        .unwrap_or(OTHER_EQUIPMENT)
}

struct ModelRule {
    pattern: Regex,
    exclude: Option<Regex>,
    cat_only: bool,
    category: &'static str,
}

impl ModelRule {
    fn new(pattern: &str, category: &'static str) -> Self {
        Self {
            pattern: Regex::new(&format!("(?i){}", pattern)).expect("valid model rule"),
            exclude: None,
            cat_only: false,
            category,
        }
    }

    fn cat_only(mut self) -> Self {
        self.cat_only = true;
        self
    }

    fn unless(mut self, pattern: &str) -> Self {
        self.exclude = Some(Regex::new(&format!("(?i){}", pattern)).expect("valid model rule"));
        self
    }

    fn matches(&self, make: &str, model: &str) -> bool {
        self.pattern.is_match(model)
            && (!self.cat_only || make == "CAT")
            && !self.exclude.as_ref().is_some_and(|re| re.is_match(model))
    }
}

// First match wins
static MODEL_RULES: Lazy<Vec<ModelRule>> = Lazy::new(|| {
    vec![
        ModelRule::new(r"^AP\d|PAVER", "ASPHALT PAVERS"),
        ModelRule::new(r"^RM\d|^RM\s|RECLAIM", "COLD PLANERS"),
        ModelRule::new(r"^PM\d|PLANER|COLD", "COLD PLANERS"),
        ModelRule::new(r"FOREST|^5[0-9]{2}\s|^538|^568", "FORESTRY EQUIPMENT").cat_only(),
        ModelRule::new(r"PIPE\s?LAY|^PL\d", "PIPELAYERS"),
        ModelRule::new(r"LOADER|^9[0-9]{2}\s|^966|^950|^972", "WHEEL LOADERS").unless(r"TRACK|SKID"),
        ModelRule::new(r"GRADER|^1[0-9]{2}[A-Z]", "MOTOR GRADERS").cat_only(),
        ModelRule::new(r"DOZER|^D[0-9]", "BULLDOZERS").unless("TRACK"),
        ModelRule::new(r"EXCAVAT|^3[0-9]{2}\s", "EXCAVATORS").cat_only(),
        ModelRule::new(r"TELEHANDL|^TL\d|^TH\d", "TELEHANDLERS"),
        ModelRule::new(r"SKID\s?STEER|^2[0-9]{2}D|^S[0-9]{3}", "SKIDSTEER"),
        ModelRule::new(r"COMPACT|^CS\d|^CP\d|^CB\d|^CC\d|^BW\d|^DD[-\d]", "COMPACTORS"),
        ModelRule::new(r"BACKHOE|^4[12][0-9]\s", "BACKHOES").cat_only(),
        ModelRule::new(r"ARTICULAT|^7[0-9]{2}\s|^A[0-9]{2}[A-Z]", "ARTICULATED TRUCKS"),
        ModelRule::new(r"OFF.?HIGH|HAUL|^7[0-9]{2}[A-Z]", "OFF-HIGHWAY TRUCKS"),
        ModelRule::new(r"TRACK.?DOZ|TRACK.?LOAD", "TRACK DOZERS"),
    ]
});

/// Guesses a category from make and model when the link carries none
pub fn infer_category(make: &str, model: &str) -> &'static str {
    let make = make.to_uppercase();
    let model = model.to_uppercase();
    MODEL_RULES
        .iter()
        .find(|rule| rule.matches(&make, &model))
        .map(|rule| rule.category)
        .unwrap_or(OTHER_EQUIPMENT)
}

/// One listing ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRow {
    pub equipment_id: String,
    pub make: String,
    pub model: String,
    pub year: Option<i32>,
    pub meter: Option<i32>,
    pub price: String,
    pub category: String,
}

impl ListingRow {
    fn into_active_model(self) -> equipment::ActiveModel {
        equipment::ActiveModel {
            id: NotSet,
            equipment_id: Set(self.equipment_id),
            make: Set(self.make),
            model: Set(self.model),
            year: Set(self.year),
            meter: Set(self.meter),
            price: Set(Some(self.price)),
            city: Set(None),
            state: Set(None),
            category: Set(self.category),
            image_url: Set(None),
        }
    }
}

/// Decodes ISO-8859-1 bytes; every byte maps to the code point of the same value
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn listing_price(raw: &str) -> String {
    let cleaned = raw.trim().replace('"', "");
    let cleaned = cleaned.trim();
    let price = if cleaned.is_empty() || cleaned == "$0.00" {
        "CALL"
    } else {
        cleaned
    };
    truncate_chars(price, 50)
}

fn small_int(raw: &str) -> Option<i32> {
    parse_leading_int(raw.trim()).and_then(|n| i32::try_from(n).ok())
}

/// Parses the listing export. The first non-blank line is a header.
pub fn parse_listing(text: &str) -> Vec<ListingRow> {
    let text = text.replace('\r', "");
    let mut seen = HashSet::new();
    let mut rows = Vec::new();

    for line in text.split('\n').filter(|l| !l.trim().is_empty()).skip(1) {
        let cols: Vec<&str> = line.split('\t').collect();
        if cols.len() < MIN_COLUMNS {
            continue;
        }

        let id = cols[0].trim();
        if id.is_empty() || !seen.insert(id.to_string()) {
            continue;
        }

        let make = cols[1].trim();
        let model = cols[2].trim();
        if make.is_empty() || model.is_empty() {
            continue;
        }

        let year = small_int(cols[3]).filter(|y| *y > 1900 && *y < 2100);
        let meter = small_int(cols[4]).filter(|m| *m > 0);

        let mut category = category_from_link(cols[8].trim());
        if category == OTHER_EQUIPMENT {
            category = infer_category(make, model);
        }

        rows.push(ListingRow {
            equipment_id: truncate_chars(id, 20),
            make: truncate_chars(make, 50),
            model: truncate_chars(model, 100),
            year,
            meter,
            price: listing_price(cols[5]),
            category: category.to_string(),
        });
    }

    rows
}

/// Replaces the equipment table with the listing file's contents
#[instrument(skip(db))]
pub async fn import_inventory(db: &DbPool, path: &Path) -> anyhow::Result<usize> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read listing file {}", path.display()))?;
    let rows = parse_listing(&decode_latin1(&bytes));
    info!("Parsed {} unique equipment items", rows.len());

    let counts = tally(rows.iter().map(|r| r.category.as_str()))
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect::<Vec<_>>();

    let models = rows.into_iter().map(ListingRow::into_active_model).collect();
    let inserted = replace_all::<EquipmentEntity, _>(db, models, BATCH_SIZE, "Equipment").await?;

    log_breakdown(
        "Category breakdown",
        counts.iter().map(|(k, v)| (k.as_str(), *v)),
    );
    info!("Done, {} items imported", inserted);
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const HEADER: &str = "ID\tMake\tModel\tYear\tMeter\tPrice\tCity\tState\tLink";

    fn line(id: &str, make: &str, model: &str, year: &str, meter: &str, price: &str, link: &str) -> String {
        format!("{}\t{}\t{}\t{}\t{}\t{}\t\t\t{}", id, make, model, year, meter, price, link)
    }

    #[rstest]
    #[case("https://americanironus.com/equipment-excavators.html", "EXCAVATORS")]
    #[case("https://www.americanironus.com/equipment-skidsteer.html?x=1", "SKIDSTEER")]
    #[case("https://americanironus.com/equipment.html", OTHER_EQUIPMENT)]
    #[case("https://example.com/whatever", OTHER_EQUIPMENT)]
    fn categories_from_links(#[case] link: &str, #[case] expected: &str) {
        assert_eq!(category_from_link(link), expected);
    }

    #[rstest]
    #[case("CAT", "AP1055F", "ASPHALT PAVERS")]
    #[case("Wirtgen", "w210 cold planer", "COLD PLANERS")]
    #[case("CAT", "568 FM", "FORESTRY EQUIPMENT")]
    #[case("Deere", "568 FM", OTHER_EQUIPMENT)]
    #[case("CAT", "966H", "WHEEL LOADERS")]
    #[case("CAT", "950 GC", "WHEEL LOADERS")]
    #[case("CAT", "963 TRACK LOADER", "TRACK DOZERS")]
    #[case("CAT", "140M", "MOTOR GRADERS")]
    #[case("Komatsu", "D65PX", "BULLDOZERS")]
    #[case("CAT", "336 FL", "EXCAVATORS")]
    #[case("Bobcat", "S650", "SKIDSTEER")]
    #[case("Hamm", "DD-25", "COMPACTORS")]
    #[case("CAT", "420 F2", "BACKHOES")]
    #[case("CAT", "740 EJ", "ARTICULATED TRUCKS")]
    #[case("CAT", "777G", "OFF-HIGHWAY TRUCKS")]
    #[case("Volvo", "L120", OTHER_EQUIPMENT)]
    fn infers_categories_from_models(#[case] make: &str, #[case] model: &str, #[case] expected: &str) {
        assert_eq!(infer_category(make, model), expected);
    }

    #[test]
    fn parses_listing_rows() {
        let text = [
            HEADER.to_string(),
            line("A1", "CAT", "336", "2019", "4500", "\"$185,000.00\"", "https://americanironus.com/equipment-excavators.html"),
            line("A1", "CAT", "336", "2019", "4500", "$1", "dup"),
            line("A2", "CAT", "966H", "1850", "0", "$0.00", "https://americanironus.com/equipment.html"),
            line("A3", "", "D6", "2010", "1", "", "x"),
            "A4\tshort\trow".to_string(),
            String::new(),
            line("A5", "Deere", "310SL", "abc", "-5", "", "x"),
        ]
        .join("\r\n");

        let rows = parse_listing(&text);
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].equipment_id, "A1");
        assert_eq!(rows[0].price, "$185,000.00");
        assert_eq!(rows[0].year, Some(2019));
        assert_eq!(rows[0].meter, Some(4500));
        assert_eq!(rows[0].category, "EXCAVATORS");

        assert_eq!(rows[1].price, "CALL");
        assert_eq!(rows[1].year, None);
        assert_eq!(rows[1].meter, None);
        assert_eq!(rows[1].category, "WHEEL LOADERS");

        assert_eq!(rows[2].equipment_id, "A5");
        assert_eq!(rows[2].price, "CALL");
        assert_eq!(rows[2].meter, None);
        assert_eq!(rows[2].category, OTHER_EQUIPMENT);
    }

    #[test]
    fn truncates_to_column_widths() {
        let long_id = "X".repeat(30);
        let text = format!("{}\n{}", HEADER, line(&long_id, &"M".repeat(60), "D8T", "2015", "", "$5", ""));
        let rows = parse_listing(&text);
        assert_eq!(rows[0].equipment_id.len(), 20);
        assert_eq!(rows[0].make.len(), 50);
    }

    #[test]
    fn decodes_latin1_bytes() {
        assert_eq!(decode_latin1(b"Caf\xe9"), "Café");
    }

    #[tokio::test]
    async fn import_replaces_equipment() {
        use sea_orm::{EntityTrait, PaginatorTrait};

        let db = crate::etl::test_support::memory_db().await;
        let file = tempfile::NamedTempFile::new().unwrap();
        let text = format!(
            "{}\n{}\n{}",
            HEADER,
            line("E1", "CAT", "D6T", "2018", "3200", "$95,000", "https://americanironus.com/equipment-bulldozers.html"),
            line("E2", "CAT", "745", "2020", "", "", "")
        );
        std::fs::write(file.path(), text).unwrap();

        assert_eq!(import_inventory(&db, file.path()).await.unwrap(), 2);
        assert_eq!(EquipmentEntity::find().count(db.as_ref()).await.unwrap(), 2);
        assert_eq!(import_inventory(&db, file.path()).await.unwrap(), 2);
        assert_eq!(EquipmentEntity::find().count(db.as_ref()).await.unwrap(), 2);
    }
}
