//! Single-item quotations rendered as a PDF attachment and an HTML email body

mod html;
mod pdf;

pub use html::render_html;
pub use pdf::render_pdf;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::common::{format_long_date, format_money, format_us_integer};
use crate::models::{Equipment, PowerUnit};

pub const CALL_FOR_PRICE: &str = "Call for Price";
/// Days a quotation stays valid
pub const VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("PDF encoding failed: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("PDF write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Label/value row of the specifications table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRow {
    pub label: String,
    pub value: String,
}

impl SpecRow {
    fn new(label: &str, value: impl Into<String>) -> Self {
        Self {
            label: label.to_string(),
            value: value.into(),
        }
    }
}

/// Everything a quotation shows about one catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteDocument {
    pub quote_number: String,
    pub quote_date: NaiveDate,
    pub title: String,
    pub identifier: String,
    pub category: String,
    pub price: String,
    pub specs: Vec<SpecRow>,
}

impl QuoteDocument {
    pub fn for_equipment(item: &Equipment, quote_number: &str, quote_date: NaiveDate) -> Self {
        let price = match item.price.as_deref() {
            Some(price) if !price.is_empty() && price != "CALL" => price.to_string(),
            _ => CALL_FOR_PRICE.to_string(),
        };
        let hours = match item.meter {
            Some(meter) if meter != 0 => format!("{} hrs", format_us_integer(i64::from(meter))),
            _ => "N/A".to_string(),
        };
        let location = [item.city.as_deref(), item.state.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        Self {
            quote_number: quote_number.to_string(),
            quote_date,
            title: item.title(),
            identifier: format!("ID: {}", item.equipment_id),
            category: item.category.clone(),
            price,
            specs: vec![
                SpecRow::new("Make", item.make.clone()),
                SpecRow::new("Model", item.model.clone()),
                SpecRow::new(
                    "Year",
                    item.year.map(|y| y.to_string()).unwrap_or_else(|| "N/A".into()),
                ),
                SpecRow::new("Hours", hours),
                SpecRow::new(
                    "Location",
                    if location.is_empty() { "Tampa, FL".to_string() } else { location },
                ),
            ],
        }
    }

    pub fn for_power_unit(item: &PowerUnit, quote_number: &str, quote_date: NaiveDate) -> Self {
        let price = item
            .price
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .and_then(|p| p.parse::<Decimal>().ok())
            .map(format_money)
            .unwrap_or_else(|| CALL_FOR_PRICE.to_string());

        let mut specs = vec![
            SpecRow::new("Model", item.model.clone()),
            SpecRow::new("Stock Number", item.stock_number.clone()),
            SpecRow::new("Category", item.category.clone()),
        ];
        let nonzero = |v: Option<i32>| v.filter(|n| *n != 0);
        let present = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        if let Some(hp) = nonzero(item.hp) {
            specs.push(SpecRow::new("Horsepower", format!("{} HP", hp)));
        }
        if let Some(kw) = nonzero(item.kw) {
            specs.push(SpecRow::new("Kilowatts", format!("{} kW", kw)));
        }
        if let Some(rpm) = nonzero(item.rpm) {
            specs.push(SpecRow::new("RPM", rpm.to_string()));
        }
        if let Some(year) = present(&item.year) {
            specs.push(SpecRow::new("Year", year));
        }
        if let Some(condition) = present(&item.condition) {
            specs.push(SpecRow::new("Condition", condition));
        }
        if let Some(location) = present(&item.location) {
            specs.push(SpecRow::new("Location", location));
        }

        Self {
            quote_number: quote_number.to_string(),
            quote_date,
            title: item.model.clone(),
            identifier: format!("SN: {}", item.stock_number),
            category: item.category.clone(),
            price,
            specs,
        }
    }

    pub fn valid_until(&self) -> NaiveDate {
        self.quote_date + Duration::days(VALIDITY_DAYS)
    }

    pub fn formatted_date(&self) -> String {
        format_long_date(self.quote_date)
    }

    pub fn formatted_valid_until(&self) -> String {
        format_long_date(self.valid_until())
    }

    pub fn email_subject(&self) -> String {
        format!("Quote {} — {} | American Iron LLC", self.quote_number, self.title)
    }

    pub fn attachment_name(&self) -> String {
        format!("American_Iron_Quote_{}.pdf", self.quote_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(super) fn equipment() -> Equipment {
        Equipment {
            id: 1,
            equipment_id: "AI-1001".into(),
            make: "Caterpillar".into(),
            model: "D6T".into(),
            year: Some(2019),
            meter: Some(4520),
            price: Some("$185,000".into()),
            city: Some("Tampa".into()),
            state: None,
            category: "Dozers".into(),
            image_url: None,
        }
    }

    pub(super) fn power_unit() -> PowerUnit {
        PowerUnit {
            id: 7,
            stock_number: "PU-007".into(),
            brand: Some("Cummins".into()),
            model: "Cummins QSX15".into(),
            category: "Generator Sets".into(),
            hp: Some(600),
            kw: None,
            rpm: Some(1800),
            engine_rpm: None,
            year: Some("2015".into()),
            condition: Some("".into()),
            hours: None,
            tier_rating: None,
            fuel_type: None,
            cooling: None,
            enclosure: None,
            volts: None,
            stage: None,
            selling_stage: None,
            unit_type: None,
            location: Some("Tampa, FL".into()),
            price: Some("45000".into()),
            image_url: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 15).unwrap()
    }

    #[test]
    fn equipment_quote_fields() {
        let doc = QuoteDocument::for_equipment(&equipment(), "Q-100", date());
        assert_eq!(doc.title, "Caterpillar D6T");
        assert_eq!(doc.identifier, "ID: AI-1001");
        assert_eq!(doc.price, "$185,000");
        let values: Vec<&str> = doc.specs.iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, ["Caterpillar", "D6T", "2019", "4,520 hrs", "Tampa"]);
        assert_eq!(doc.formatted_valid_until(), "February 14, 2026");
        assert_eq!(doc.email_subject(), "Quote Q-100 — Caterpillar D6T | American Iron LLC");
        assert_eq!(doc.attachment_name(), "American_Iron_Quote_Q-100.pdf");
    }

    #[test]
    fn equipment_fallbacks() {
        let mut item = equipment();
        item.price = Some("CALL".into());
        item.meter = Some(0);
        item.year = None;
        item.city = None;
        let doc = QuoteDocument::for_equipment(&item, "1", date());
        assert_eq!(doc.price, CALL_FOR_PRICE);
        assert_eq!(doc.specs[2].value, "N/A");
        assert_eq!(doc.specs[3].value, "N/A");
        assert_eq!(doc.specs[4].value, "Tampa, FL");
    }

    #[test]
    fn power_unit_quote_lists_present_specs_only() {
        let doc = QuoteDocument::for_power_unit(&power_unit(), "2", date());
        assert_eq!(doc.identifier, "SN: PU-007");
        assert_eq!(doc.price, "$45,000");
        let labels: Vec<&str> = doc.specs.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Model", "Stock Number", "Category", "Horsepower", "RPM", "Year", "Location"]
        );
        assert_eq!(doc.specs[3].value, "600 HP");
    }

    #[test]
    fn non_numeric_power_unit_price_calls_for_price() {
        let mut unit = power_unit();
        unit.price = Some("Call for Price".into());
        let doc = QuoteDocument::for_power_unit(&unit, "3", date());
        assert_eq!(doc.price, CALL_FOR_PRICE);
    }
}
