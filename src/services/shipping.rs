use std::cmp::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use metrics::counter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{ServiceError, ValidationIssue};

const RATES_FAILED: &str = "Failed to fetch UPS rates";
const RATING_REJECTED: &str =
    "Unable to retrieve UPS rates. Please verify the addresses and try again.";
/// Tokens are refreshed this long before the provider says they expire
const TOKEN_EXPIRY_MARGIN_SECS: u64 = 60;

fn default_country() -> String {
    "US".to_string()
}

/// Package and route to quote
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRateRequest {
    #[validate(length(min = 1))]
    pub origin_city: String,
    #[validate(length(min = 1, max = 5))]
    pub origin_state: String,
    #[validate(length(min = 1))]
    pub origin_postal: String,
    #[validate(length(equal = 2))]
    #[serde(default = "default_country")]
    pub origin_country: String,
    #[validate(length(min = 1))]
    pub dest_city: String,
    #[validate(length(max = 5))]
    #[serde(default)]
    pub dest_state: String,
    #[validate(length(min = 1))]
    pub dest_postal: String,
    #[validate(length(equal = 2))]
    #[serde(default = "default_country")]
    pub dest_country: String,
    #[validate(range(max = 150.0))]
    pub weight_lbs: f64,
    #[validate(range(max = 108.0))]
    pub length_in: f64,
    #[validate(range(max = 108.0))]
    pub width_in: f64,
    #[validate(range(max = 108.0))]
    pub height_in: f64,
}

impl ShippingRateRequest {
    /// Runs the derived rules plus the strictly-positive checks on the
    /// package measurements.
    pub fn check(&self) -> Result<(), ServiceError> {
        let mut issues = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => match ServiceError::from(errors) {
                ServiceError::ValidationError(issues) => issues,
                other => return Err(other),
            },
        };
        for (field, value) in [
            ("weightLbs", self.weight_lbs),
            ("lengthIn", self.length_in),
            ("widthIn", self.width_in),
            ("heightIn", self.height_in),
        ] {
            if value.is_nan() || value <= 0.0 {
                issues.push(ValidationIssue::new(
                    field,
                    "range",
                    format!("{} must be greater than 0", field),
                ));
            }
        }
        if issues.is_empty() {
            Ok(())
        } else {
            issues.sort_by(|a, b| a.path.cmp(&b.path));
            Err(ServiceError::ValidationError(issues))
        }
    }

    pub fn origin_label(&self) -> String {
        format!("{}, {} {}", self.origin_city, self.origin_state, self.origin_postal)
    }

    pub fn destination_label(&self) -> String {
        format!(
            "{}, {} {} {}",
            self.dest_city, self.dest_state, self.dest_postal, self.dest_country
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub service_code: String,
    pub service_name: String,
    pub total_charges: String,
    pub currency: String,
    pub guaranteed_days: Option<String>,
    pub delivery_by_time: Option<String>,
    pub billing_weight: Option<String>,
    pub billing_weight_unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRatesResponse {
    pub rates: Vec<ShippingRate>,
    pub origin: String,
    pub destination: String,
}

/// Display names for UPS service codes
pub fn service_name(code: &str) -> String {
    let name = match code {
        "01" => "UPS Next Day Air",
        "02" => "UPS 2nd Day Air",
        "03" => "UPS Ground",
        "07" => "UPS Worldwide Express",
        "08" => "UPS Worldwide Expedited",
        "11" => "UPS Standard",
        "12" => "UPS 3 Day Select",
        "13" => "UPS Next Day Air Saver",
        "14" => "UPS Next Day Air Early",
        "54" => "UPS Worldwide Express Plus",
        "59" => "UPS 2nd Day Air A.M.",
        "65" => "UPS Worldwide Saver",
        "82" => "UPS Today Standard",
        "83" => "UPS Today Dedicated Courier",
        "84" => "UPS Today Intercity",
        "85" => "UPS Today Express",
        "86" => "UPS Today Express Saver",
        "96" => "UPS Worldwide Express Freight",
        other => return format!("UPS Service {}", other),
    };
    name.to_string()
}

fn address(city: &str, state: &str, postal: &str, country: &str) -> Value {
    json!({
        "City": city,
        "StateProvinceCode": state,
        "PostalCode": postal,
        "CountryCode": country,
    })
}

/// Builds the `RateRequest` document for the Shop endpoint
pub fn rate_payload(request: &ShippingRateRequest, account_number: &str) -> Value {
    let origin = address(
        &request.origin_city,
        &request.origin_state,
        &request.origin_postal,
        &request.origin_country,
    );
    json!({
        "RateRequest": {
            "Request": {
                "SubVersion": "2205",
                "TransactionReference": { "CustomerContext": "Rate Request" },
            },
            "Shipment": {
                "Shipper": {
                    "ShipperNumber": account_number,
                    "Address": origin.clone(),
                },
                "ShipTo": {
                    "Address": address(
                        &request.dest_city,
                        &request.dest_state,
                        &request.dest_postal,
                        &request.dest_country,
                    ),
                },
                "ShipFrom": { "Address": origin },
                "Package": {
                    "PackagingType": { "Code": "02" },
                    "Dimensions": {
                        "UnitOfMeasurement": { "Code": "IN" },
                        "Length": request.length_in.to_string(),
                        "Width": request.width_in.to_string(),
                        "Height": request.height_in.to_string(),
                    },
                    "PackageWeight": {
                        "UnitOfMeasurement": { "Code": "LBS" },
                        "Weight": request.weight_lbs.to_string(),
                    },
                },
            },
        },
    })
}

fn text_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn charge(rate: &ShippingRate) -> f64 {
    rate.total_charges.parse::<f64>().unwrap_or(f64::INFINITY)
}

/// Extracts rated shipments from a Shop response, cheapest first
pub fn parse_rates(body: &Value) -> Vec<ShippingRate> {
    let shipments = match body.pointer("/RateResponse/RatedShipment") {
        Some(Value::Array(items)) => items.clone(),
        Some(single @ Value::Object(_)) => vec![single.clone()],
        _ => Vec::new(),
    };

    let mut rates: Vec<ShippingRate> = shipments
        .iter()
        .map(|rs| {
            let service_code = text_at(rs, "/Service/Code").unwrap_or_default();
            ShippingRate {
                service_name: service_name(&service_code),
                service_code,
                total_charges: text_at(rs, "/TotalCharges/MonetaryValue")
                    .unwrap_or_else(|| "0".to_string()),
                currency: text_at(rs, "/TotalCharges/CurrencyCode")
                    .unwrap_or_else(|| "USD".to_string()),
                guaranteed_days: text_at(rs, "/GuaranteedDelivery/BusinessDaysInTransit"),
                delivery_by_time: text_at(rs, "/GuaranteedDelivery/DeliveryByTime"),
                billing_weight: text_at(rs, "/BillingWeight/Weight"),
                billing_weight_unit: text_at(rs, "/BillingWeight/UnitOfMeasurement/Code")
                    .unwrap_or_else(|| "LBS".to_string()),
            }
        })
        .collect();

    rates.sort_by(|a, b| charge(a).partial_cmp(&charge(b)).unwrap_or(Ordering::Equal));
    rates
}

/// UPS developer credentials
#[derive(Debug, Clone, Default)]
pub struct UpsCredentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub account_number: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    /// UPS sends this as a string
    #[serde(default)]
    expires_in: Value,
}

fn seconds(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n.as_u64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Carrier rate shopping through the UPS REST APIs
#[derive(Clone)]
pub struct ShippingService {
    client: reqwest::Client,
    base_url: String,
    credentials: UpsCredentials,
    token: Arc<Mutex<Option<CachedToken>>>,
}

impl ShippingService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, credentials: UpsCredentials) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credentials,
            token: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the cached bearer token or performs the client-credentials exchange
    async fn access_token(&self) -> Result<String, String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let (Some(client_id), Some(client_secret)) = (
            self.credentials.client_id.as_deref().filter(|v| !v.is_empty()),
            self.credentials.client_secret.as_deref().filter(|v| !v.is_empty()),
        ) else {
            return Err("UPS credentials not configured".to_string());
        };

        let basic = STANDARD.encode(format!("{}:{}", client_id, client_secret));
        let response = self
            .client
            .post(format!("{}/security/v1/oauth/token", self.base_url))
            .header("Authorization", format!("Basic {}", basic))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "UPS OAuth error: {}", body);
            return Err(format!("UPS authentication failed: {}", status.as_u16()));
        }

        let token: TokenResponse = response.json().await.map_err(|e| e.to_string())?;
        let lifetime = seconds(&token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN_SECS);
        *cached = Some(CachedToken {
            access_token: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(lifetime),
        });
        debug!(lifetime_secs = lifetime, "UPS token refreshed");
        Ok(token.access_token)
    }

    #[instrument(skip(self, request), fields(origin = %request.origin_postal, dest = %request.dest_postal))]
    pub async fn quote_rates(
        &self,
        request: ShippingRateRequest,
    ) -> Result<ShippingRatesResponse, ServiceError> {
        request.check()?;

        let account_number = self
            .credentials
            .account_number
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ServiceError::InternalError("UPS account not configured".to_string()))?;

        let failed = |message: String| ServiceError::ProviderFailed {
            error: RATES_FAILED.to_string(),
            message,
        };

        let token = self.access_token().await.map_err(|e| {
            error!("UPS rate error: {}", e);
            failed(e)
        })?;

        let started = Instant::now();
        let response = self
            .client
            .post(format!("{}/api/rating/v2403/Shop", self.base_url))
            .bearer_auth(&token)
            .header("transId", format!("ami-{}", chrono::Utc::now().timestamp_millis()))
            .header("transactionSrc", "AmericanIronLLC")
            .json(&rate_payload(&request, account_number))
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "UPS rating responded"
        );
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), "UPS Rating error: {}", body);
            return Err(ServiceError::ExternalServiceError(RATING_REJECTED.to_string()));
        }

        let body: Value = response.json().await.map_err(|e| failed(e.to_string()))?;
        let rates = parse_rates(&body);
        counter!("iron_catalog_ups.rate_lookups", 1);
        info!(rates = rates.len(), "UPS rates retrieved");

        Ok(ShippingRatesResponse {
            origin: request.origin_label(),
            destination: request.destination_label(),
            rates,
        })
    }
}
