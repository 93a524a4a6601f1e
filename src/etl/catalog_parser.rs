//! Text-layout parts catalog parser.
//!
//! The vendor catalog is exported as a column-preserving text layout.
//! Sidebar labels switch the current category, upper-case headings switch
//! the subcategory, and every token that looks like a part number becomes a
//! record. Engine model, gasket and equipment columns are read from the
//! double-space separated cells around the part number.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::Context;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::{log_breakdown, tally};
use crate::common::truncate_chars;

const EQUIPMENT_MAX_CHARS: usize = 500;

/// One parsed catalog line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedPart {
    pub part_number: String,
    pub description: String,
    pub category: String,
    pub subcategory: String,
    pub engine_model: String,
    pub gasket: String,
    pub equipment: String,
}

const SIDEBAR_CATEGORIES: &[(&str, &str)] = &[
    ("air inlet & exhaust system", "Air Inlet & Exhaust"),
    ("turbochargers", "Turbochargers"),
    ("bearings", "Bearings"),
    ("belts & hoses", "Belts & Hoses"),
    ("braking & friction", "Braking & Friction"),
    ("cooling system", "Cooling System"),
    ("electrical parts", "Electrical"),
    ("diesel engine components", "Engine Components"),
    ("ground engaging tools", "Ground Engaging Tools"),
    ("hardware parts", "Hardware"),
    ("hydraulic system", "Hydraulic System"),
    ("gaskets & seals", "Gaskets & Seals"),
    ("filters", "Filters"),
    ("fluids", "Fluids"),
    ("fuel system", "Fuel System"),
    ("undercarriage", "Undercarriage"),
    ("operator station", "Operator Station"),
    ("powertrain", "Powertrain"),
    ("rubber products", "Rubber Products"),
    ("work tools", "Work Tools"),
];

const KNOWN_SUBCATEGORIES: &[&str] = &[
    "SINGLE MANIFOLDS", "EXHAUST MANIFOLDS", "GROUP MANIFOLDS", "MUFFLERS",
    "EXHAUST PIPES", "INLET PIPES", "EXHAUST RAIN CAPS", "INLET & EXHAUST PIPES",
    "MUFFLERS FOR KOMATSU", "EXHAUST PIPES FOR KOMATSU",
    "C SERIES TURBOCHARGERS", "D SERIES TURBOCHARGERS",
    "TURBOCHARGERS FOR KOMATSU", "TURBOCHARGER HEAT SHIELDS",
    "AFTERCOOLER GASKETS", "AFTERCOOLER ADAPTERS", "AFTERCOOLERS",
    "TURBOCHARGER CARTRIDGES",
    "COMPOSITE BEARINGS", "BEARING SLEEVES", "BUSHINGS", "BEARINGS",
    "BUSHINGS FOR KOMATSU", "BEARINGS FOR JOHN DEERE",
    "SLEEVES", "SPHERICAL BEARINGS", "SPHERICAL BEARING RACES",
    "SPHERICAL BEARINGS FOR KOMATSU", "TAPERED BEARINGS",
    "TAPERED ROLLER BEARING ASSEMBLIES", "ROLLER BEARINGS",
    "ROLLER BEARINGS FOR KOMATSU", "NEEDLE BEARINGS",
    "V-BELTS", "BELTS BY SIZE", "SERPENTINE BELTS", "BELT TENSIONERS",
    "COGGED V-BELT", "BELTS FOR KOMATSU", "PULLEYS",
    "RADIATOR HOSES", "RUBBER HOSES", "WATER HOSES",
    "AFTERCOOLER AIR HOSES", "ENGINE OIL COOLER HOSES",
    "BRAKE PEDALS & VALVES", "BRAKE SYSTEM VALVES",
    "HYDRAULIC BRAKE CALIPERS", "BRAKE LINING", "BRAKE PADS",
    "BRAKE BAND LINING KITS", "SHOE LINING AND BANDS",
    "BRAKE DISCS", "STEERING CLUTCH DISCS", "FINAL DRIVE DISCS",
    "DISCS FOR POWERTRAIN", "POWER SHIFT CONTROL DISCS",
    "ENGINE OIL COOLERS", "OIL COOLERS", "RADIATOR OIL COOLERS",
    "RADIATOR CORES", "RADIATORS", "RADIATORS FOR KOMATSU",
    "RADIATOR COOLING FANS", "WATER PUMPS", "WATER PUMPS FOR KOMATSU",
    "THERMOSTATS", "FAN BLADES", "FAN DRIVES",
    "ALTERNATORS", "ALTERNATORS FOR KOMATSU", "VOLTAGE REGULATORS",
    "STARTING MOTORS", "STARTING MOTORS FOR KOMATSU",
    "STARTING MOTORS PARTS", "BATTERIES",
    "SEALED LAMPS", "LED LAMP GROUP", "DRIVING & TRAFFIC LIGHTS",
    "WARNING LIGHTS", "LAMP BULBS",
    "SENSORS", "PRESSURE SENSORS", "TEMPERATURE SENSORS",
    "SPEED SENSORS", "OIL PRESSURE SENSORS",
    "SWITCHES", "IGNITION SWITCHES", "TOGGLE SWITCHES",
    "ROCKER SWITCHES", "PUSHBUTTON SWITCHES",
    "SOLENOIDS", "FUEL SHUTOFF SOLENOIDS", "ELECTRICAL SOLENOIDS",
    "SPARK PLUGS", "GLOW PLUGS",
    "ENGINE BLOCKS", "CUSTOM ENGINES",
    "INFRAME OVERHAUL KITS", "ENGINE KITS",
    "PISTONS", "PISTON RING SETS", "CYLINDER LINERS",
    "CRANKSHAFTS", "CRANKSHAFT GEARS",
    "CAMSHAFTS", "CAMSHAFT GEARS",
    "ENGINE CONNECTING RODS", "CONNECTING ROD KITS",
    "ENGINE OIL PUMPS", "ENGINE VALVES",
    "CYLINDER HEADS", "ASSEMBLED CYLINDER HEADS",
    "INJECTOR SLEEVES", "PRE-COMBUSTION CHAMBERS",
    "TIPS & ADAPTERS", "RIPPER SHANKS", "SHANK PROTECTORS",
    "RIPPER TEETH", "SHANK TIPS",
    "CUTTING EDGES", "END BITS", "GRADER BLADES",
    "BUCKET TEETH", "ADAPTERS FOR EXCAVATOR",
    "EXCAVATOR BUCKETS", "MINI-EXCAVATORS",
    "BOLTS", "NUTS", "SCREWS", "WASHERS", "PINS",
    "PLOW BOLTS", "TRACK BOLTS", "CUTTING EDGE BOLTS",
    "CONNECTORS", "FITTINGS", "CLAMPS",
    "GEAR PUMPS", "PISTON PUMPS", "VANE PUMPS",
    "HYDRAULIC CYLINDERS", "HYDRAULIC HOSES",
    "HYDRAULIC FILTERS", "CONTROL VALVES",
    "COMPLETE GASKET SETS", "HEAD GASKETS",
    "OIL FILTERS", "FUEL FILTERS", "AIR FILTERS",
    "PRIMARY AIR FILTERS", "SECONDARY AIR FILTERS",
    "TRANSMISSION FILTERS",
    "FUEL TRANSFER PUMPS", "FUEL PRIMING PUMPS",
    "FUEL INJECTION NOZZLES", "FUEL INJECTORS",
    "SPROCKETS & SEGMENTS", "TRACK SHOES", "TRACK CHAINS",
    "TRACK ROLLERS", "CARRIER ROLLERS", "IDLERS",
    "TRACK LINKS", "TRACK GROUPS",
    "LOADER PADS", "RUBBER PADS",
    "SEATS", "MIRRORS", "FUEL CAPS", "GLASS",
    "BULLDOZER GLASS", "WINDSHIELD WIPERS",
];

const PART_WORDS: &[&str] = &[
    "MANIFOLD", "BEARING", "BELT", "HOSE", "BRAKE", "DISC", "PUMP",
    "VALVE", "MOTOR", "FILTER", "SENSOR", "SWITCH", "LAMP", "LIGHT",
    "BOLT", "NUT", "SCREW", "PIN", "WASHER", "FITTING", "CLAMP",
    "PISTON", "LINER", "CRANKSHAFT", "CAMSHAFT", "GASKET", "SEAL",
    "CYLINDER", "COOLER", "RADIATOR", "FAN", "THERMOSTAT",
    "ALTERNATOR", "STARTER", "BATTERY", "SOLENOID", "PLUG",
    "SPROCKET", "ROLLER", "IDLER", "TRACK", "SHOE", "PAD",
    "BUCKET", "EDGE", "TOOTH", "TEETH", "SHANK", "BLADE",
    "SEAT", "MIRROR", "CAP", "GLASS", "WIPER", "TUBE",
    "GEAR", "CARTRIDGE", "OVERHAUL", "KIT", "ENGINE",
    "HYDRAULIC", "CONNECTING", "ROD", "OIL", "WATER", "FUEL", "AIR",
    "RUBBER", "ACTUATOR", "REGULATOR", "HEAD", "INJECTOR",
    "NOZZLE", "ADAPTER", "RIPPER", "GRADER", "CUTTING", "EXCAVATOR",
    "PIPE", "MUFFLER", "TURBOCHARGER", "AFTERCOOLER", "EXHAUST",
    "INLET", "RAIN", "TENSIONER", "PULLEY", "SERPENTINE", "COGGED",
];

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid catalog regex")
}

static BRANDING: Lazy<[Regex; 5]> = Lazy::new(|| {
    [
        re(r"(?i)\bCostex\s*Tractor\s*Parts?\b"),
        re(r"(?i)\bCostex\b"),
        re(r"\bCTP\s*"),
        re(r"(?i)Copyright\s*©.*$"),
        re("®"),
    ]
});

static SKIP_LINES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"Costex\s*Tractor",
        r"Copyright\s*©",
        r"All rights reserved",
        r"Part numbers are used for reference",
        r"contact your sales",
        r"^Part\s+No\.\s*Description",
        r"^Engine\s+Part\s+Number",
        r"^Engine\s+Part\s+No\.",
        r"^ENGINE\s+END\s+CENTER",
        r"manufactured to meet",
        r"will help you maximize",
        r"^For over \d+ years",
        r"^At CTP",
        r"authorized distributor",
        r"^All Part Numbers",
        r"^Other part no",
        r"^\s*Typical Applications",
        r"^\s*Features:",
        r"lubricating properties",
    ]
    .iter()
    .map(|p| re(&format!("(?i){}", p)))
    .collect()
});

static PAGE_NUMBER: Lazy<Regex> = Lazy::new(|| re(r"^\d{1,3}$"));
static HEADING: Lazy<Regex> = Lazy::new(|| re(r"^[A-Z][A-Z &\-/,'()0-9]+$"));
static CONT_MARK: Lazy<Regex> = Lazy::new(|| re(r"(?i)\(CONT\.?\)"));
static FOR_KOMATSU: Lazy<Regex> = Lazy::new(|| re(r"(?i)\bFOR\s+KOMATSU\b"));
static FOR_JOHN_DEERE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\bFOR\s+JOHN\s+DEERE\b"));
static BRAND_SUFFIX: Lazy<Regex> = Lazy::new(|| re(r"(?i)FOR KOMATSU|FOR JOHN DEERE"));
static PARENTHESIZED: Lazy<Regex> = Lazy::new(|| re(r"\(.*?\)"));
static WIDE_GAP: Lazy<Regex> = Lazy::new(|| re(r"\s{2,}"));
static ENGINE_CELL: Lazy<Regex> = Lazy::new(|| re(r"^[A-Z0-9][A-Z0-9, .\-/]+$"));
static NEXT_LINE_START: Lazy<Regex> = Lazy::new(|| re(r"^[A-Z0-9]"));
static CAPS_WORDS: Lazy<Regex> = Lazy::new(|| re(r"^[A-Z][A-Z &\-]+$"));

struct SubcategoryFilters {
    model_code: Regex,
    letter_digits: Regex,
    comma_list: Regex,
    leading_digit: Regex,
    digit_dash: Regex,
    volt: Regex,
}

static SUBCATEGORY_FILTERS: Lazy<SubcategoryFilters> = Lazy::new(|| SubcategoryFilters {
    model_code: re(r"\d{3,}[A-Z]"),
    letter_digits: re(r"^[A-Z]\d{2}"),
    comma_list: re(r",\s*[A-Z0-9]+\s*,"),
    leading_digit: re(r"^\d"),
    digit_dash: re(r"^\d+-"),
    volt: re(r"^\d{2,4}-Volt"),
});

struct PartNumberShapes {
    short_number: Regex,
    reserved_word: Regex,
    capitalized_word: Regex,
    all_letters: Regex,
    accepted: [Regex; 6],
}

static PART_NUMBER: Lazy<PartNumberShapes> = Lazy::new(|| PartNumberShapes {
    short_number: re(r"^\d{1,4}$"),
    reserved_word: re(
        r"(?i)^(ENGINE|GASKET|PART|MODEL|NUMBER|DESCRIPTION|EQUIPMENT|CARTRIDGE|CONT|SOLD|SEPARATELY|STATED|STD|LH|RH|NA|QTY)$",
    ),
    capitalized_word: re(r"^[A-Z][a-z]"),
    all_letters: re(r"^[A-Z]{3,}$"),
    accepted: [
        re(r"^\d{1,2}[A-Z]\d{4,5}$"),
        re(r"^\d{6,8}$"),
        re(r"^\d{3,4}-\d{2}-\d{4,5}$"),
        re(r"^[A-Z]\d{4,}$"),
        re(r"^\d+[A-Z]+\d+[A-Z]*\d*$"),
        re(r"^[A-Z]{2,3}\d{3,}[A-Z]*\d*$"),
    ],
});

/// Strips vendor branding and trademark marks
pub fn clean_branding(text: &str) -> String {
    let mut out = text.to_string();
    for pattern in BRANDING.iter() {
        out = pattern.replace_all(&out, "").into_owned();
    }
    out.trim().to_string()
}

/// Whether a token has one of the catalog's part-number shapes
pub fn is_part_number(raw: &str) -> bool {
    let s = raw.trim();
    let len = s.chars().count();
    if !(4..=20).contains(&len) {
        return false;
    }
    let shapes = &*PART_NUMBER;
    if shapes.short_number.is_match(s)
        || shapes.reserved_word.is_match(s)
        || shapes.capitalized_word.is_match(s)
        || shapes.all_letters.is_match(s)
    {
        return false;
    }
    shapes.accepted.iter().any(|re| re.is_match(s))
}

/// Whether an upper-case heading names a subcategory
pub fn is_valid_subcategory(raw: &str) -> bool {
    let s = CONT_MARK.replace(raw, "");
    let s = s.trim();
    let len = s.chars().count();
    if !(4..=60).contains(&len) {
        return false;
    }

    let f = &*SUBCATEGORY_FILTERS;
    if f.model_code.is_match(s) || f.letter_digits.is_match(s) {
        return false;
    }
    if f.comma_list.is_match(s) && s.split(',').count() > 3 {
        return false;
    }
    if f.leading_digit.is_match(s) && !f.digit_dash.is_match(s) && !f.volt.is_match(s) {
        return false;
    }

    let normalized = PARENTHESIZED.replace_all(s, "");
    let normalized = BRAND_SUFFIX.replace_all(&normalized, "");
    let normalized = normalized.trim();

    if KNOWN_SUBCATEGORIES
        .iter()
        .any(|known| normalized.contains(known) || known.contains(normalized))
    {
        return true;
    }

    normalized
        .split_whitespace()
        .any(|word| PART_WORDS.iter().any(|pw| word.contains(pw)))
}

fn sidebar_category(line: &str) -> Option<&'static str> {
    let lower = line
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    SIDEBAR_CATEGORIES
        .iter()
        .find(|(sidebar, _)| lower == *sidebar || lower == sidebar.replace(" & ", "&"))
        .map(|(_, category)| *category)
}

fn heading_subcategory(line: &str) -> Option<String> {
    let len = line.chars().count();
    if !HEADING.is_match(line) || len <= 4 || len >= 70 {
        return None;
    }
    let clean = CONT_MARK.replace(line, "");
    let clean = clean.trim();
    if !is_valid_subcategory(clean) {
        return None;
    }
    let sub = FOR_KOMATSU.replace_all(clean, "(Komatsu)");
    let sub = FOR_JOHN_DEERE.replace_all(&sub, "(John Deere)");
    let sub = clean_branding(&sub);
    (sub.chars().count() > 3).then_some(sub)
}

fn cells(line: &str) -> Vec<&str> {
    WIDE_GAP
        .split(line)
        .filter(|cell| !cell.trim().is_empty())
        .collect()
}

/// Engine, gasket and equipment columns around the part number's cell
fn column_details(part_number: &str, cells: &[&str]) -> (String, String, String) {
    let mut engine = String::new();
    let mut gasket = String::new();
    let mut equipment = String::new();

    if cells.len() < 2 {
        return (engine, gasket, equipment);
    }
    let Some(idx) = cells.iter().position(|cell| cell.contains(part_number)) else {
        return (engine, gasket, equipment);
    };

    if idx > 0 {
        let before = cells[idx - 1].trim();
        if ENGINE_CELL.is_match(before) && before.chars().count() < 60 && !is_part_number(before) {
            engine = before.to_string();
        }
    }

    for cell in &cells[idx + 1..] {
        let after = cell.trim();
        if is_part_number(after) {
            if gasket.is_empty() {
                gasket = after.to_string();
            }
        } else if after.chars().count() > 3 {
            if !equipment.is_empty() {
                equipment.push_str(", ");
            }
            equipment.push_str(&clean_branding(after));
        }
    }

    (engine, gasket, equipment)
}

/// Equipment named at the start of the following line, when the row has none
fn next_line_equipment(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if next.chars().count() <= 5 || !NEXT_LINE_START.is_match(next) {
        return None;
    }
    let first = WIDE_GAP.split(next).next()?.trim();
    if first.is_empty() || is_part_number(first) || CAPS_WORDS.is_match(first) {
        return None;
    }
    Some(clean_branding(first))
}

/// Parses the whole layout into deduplicated part records
pub fn parse_catalog(content: &str) -> Vec<ParsedPart> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut parts = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut category = String::new();
    let mut subcategory = String::new();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.chars().count() < 3
            || SKIP_LINES.iter().any(|p| p.is_match(trimmed))
            || PAGE_NUMBER.is_match(trimmed)
        {
            continue;
        }

        if let Some(sidebar) = sidebar_category(trimmed) {
            category = sidebar.to_string();
        }
        if let Some(sub) = heading_subcategory(trimmed) {
            subcategory = sub;
        }
        if category.is_empty() {
            continue;
        }

        let row_cells = cells(trimmed);
        for token in trimmed.split_whitespace() {
            if !is_part_number(token) || seen.contains(token) {
                continue;
            }

            let (engine, gasket, mut equipment) = column_details(token, &row_cells);
            if equipment.is_empty() {
                if let Some(next) = next_line_equipment(lines.get(i + 1).copied()) {
                    equipment = next;
                }
            }

            seen.insert(token.to_string());
            let heading = if subcategory.is_empty() {
                &category
            } else {
                &subcategory
            };
            parts.push(ParsedPart {
                part_number: token.to_string(),
                description: clean_branding(heading),
                category: category.clone(),
                subcategory: clean_branding(&subcategory),
                engine_model: clean_branding(&engine),
                gasket,
                equipment: truncate_chars(&equipment, EQUIPMENT_MAX_CHARS),
            });
        }
    }

    parts
}

fn log_summary(parts: &[ParsedPart]) {
    log_breakdown("Category counts", tally(parts.iter().map(|p| p.category.as_str())));

    let mut by_sub: BTreeMap<String, u64> = BTreeMap::new();
    for part in parts {
        let sub = if part.subcategory.is_empty() {
            "(none)"
        } else {
            part.subcategory.as_str()
        };
        *by_sub.entry(format!("{} > {}", part.category, sub)).or_insert(0) += 1;
    }
    let mut top: Vec<(&str, u64)> = by_sub.iter().map(|(k, v)| (k.as_str(), *v)).collect();
    top.sort_by(|a, b| b.1.cmp(&a.1));
    top.truncate(40);
    log_breakdown("Subcategory counts (top 40)", top);

    let step = (parts.len() / 15).max(1);
    info!("Sample parts:");
    for part in parts.iter().step_by(step) {
        info!(
            "  [{}/{}] {} E:{} Eq:{}",
            part.category,
            part.subcategory,
            part.part_number,
            or_dash(&truncate_chars(&part.engine_model, 30)),
            or_dash(&truncate_chars(&part.equipment, 50)),
        );
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

/// Reads the layout file, writes the parsed JSON and returns the part count
#[instrument]
pub fn parse_catalog_file(input: &Path, output: &Path) -> anyhow::Result<usize> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read catalog layout {}", input.display()))?;
    let parts = parse_catalog(&content);
    info!("Total parts parsed: {}", parts.len());
    log_summary(&parts);

    let json = serde_json::to_string_pretty(&parts)?;
    std::fs::write(output, json)
        .with_context(|| format!("failed to write parsed parts to {}", output.display()))?;
    info!("Written to {}", output.display());
    Ok(parts.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("1R0750", true)]
    #[case("12345678", true)]
    #[case("123-45-67890", true)]
    #[case("A12345", true)]
    #[case("6I2501", true)]
    #[case("CH11220", true)]
    #[case("123", false)]
    #[case("1234", false)]
    #[case("ENGINE", false)]
    #[case("Qty", false)]
    #[case("Filter", false)]
    #[case("ABCDEF", false)]
    #[case("1R0750ABCDEFGHIJKLMNOP", false)]
    fn recognizes_part_numbers(#[case] token: &str, #[case] expected: bool) {
        assert_eq!(is_part_number(token), expected, "{}", token);
    }

    #[rstest]
    #[case("EXHAUST MANIFOLDS", true)]
    #[case("MUFFLERS FOR KOMATSU (CONT.)", true)]
    #[case("HEAVY DUTY WIPER ARMS", true)]
    #[case("D6R, D6T, D7R, D8T", false)]
    #[case("3306 ENGINE", false)]
    #[case("C15 ACERT", false)]
    #[case("24-Volt ALTERNATORS", true)]
    #[case("ABC", false)]
    #[case("MISCELLANEOUS", false)]
    fn recognizes_subcategories(#[case] heading: &str, #[case] expected: bool) {
        assert_eq!(is_valid_subcategory(heading), expected, "{}", heading);
    }

    #[test]
    fn strips_vendor_branding() {
        assert_eq!(clean_branding("Costex Tractor Parts Turbochargers®"), "Turbochargers");
        assert_eq!(clean_branding("CTP Bearings"), "Bearings");
        assert_eq!(clean_branding("Filters Copyright © 2024 all"), "Filters");
    }

    #[test]
    fn sidebar_labels_match_with_or_without_spaced_ampersand() {
        assert_eq!(sidebar_category("Belts  &  Hoses"), Some("Belts & Hoses"));
        assert_eq!(sidebar_category("belts&hoses"), Some("Belts & Hoses"));
        assert_eq!(sidebar_category("Electrical Parts"), Some("Electrical"));
        assert_eq!(sidebar_category("Belts"), None);
    }

    #[test]
    fn parses_layout_into_parts() {
        let layout = "\
Costex Tractor Parts catalog
1R0750 ignored before any category
Turbochargers
C SERIES TURBOCHARGERS
3306    1R0750    4N1234    D6R, D7R Tractors
C15    2W1220
980G Wheel Loader
12
Part No. Description
Filters
OIL FILTERS (CONT.)
1R0750    duplicate
";
        let parts = parse_catalog(layout);
        assert_eq!(parts.len(), 3);

        let turbo = &parts[0];
        assert_eq!(turbo.part_number, "1R0750");
        assert_eq!(turbo.category, "Turbochargers");
        assert_eq!(turbo.subcategory, "C SERIES TURBOCHARGERS");
        assert_eq!(turbo.description, "C SERIES TURBOCHARGERS");
        assert_eq!(turbo.engine_model, "3306");
        assert_eq!(turbo.gasket, "4N1234");
        assert_eq!(turbo.equipment, "D6R, D7R Tractors");

        assert_eq!(parts[1].part_number, "4N1234");
        assert_eq!(parts[1].engine_model, "");

        let next_line = &parts[2];
        assert_eq!(next_line.part_number, "2W1220");
        assert_eq!(next_line.engine_model, "C15");
        assert_eq!(next_line.equipment, "980G Wheel Loader");
    }

    #[test]
    fn writes_parsed_json() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("layout.txt");
        let output = dir.path().join("parsed.json");
        std::fs::write(&input, "Filters\nOIL FILTERS\n1R0750    Engine oil\n").unwrap();

        assert_eq!(parse_catalog_file(&input, &output).unwrap(), 1);
        let parsed: Vec<ParsedPart> =
            serde_json::from_str(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(parsed[0].part_number, "1R0750");
        assert_eq!(parsed[0].subcategory, "OIL FILTERS");
        assert_eq!(parsed[0].equipment, "Engine oil");
    }
}
