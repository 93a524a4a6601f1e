use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Iron Catalog API",
        version = "1.0.0",
        description = r#"
# Iron Catalog API

Public catalog of used heavy equipment, replacement parts and hydraulic power
units, plus the lead-capture and customer-facing flows around it.

## Features

- **Catalog**: paged listings, category histograms and detail lookups
- **Leads**: quote requests and contact inquiries with email notifications
- **Quotations**: PDF quotation documents delivered by email
- **Estimator**: streamed AI project estimates grounded in current inventory
- **Shipping**: UPS rate shopping for parts and units
- **Portal**: signed-in customers see their own quotes, orders and payments

## Authentication

Portal endpoints require a bearer token:

```
Authorization: Bearer <your-jwt-token>
```

`POST /api/quotes` accepts the token optionally and links the request to the
customer when present.

## Errors

Failures share one body shape:

```json
{
  "error": "Validation error",
  "details": [{"path": ["email"], "code": "email", "message": "Invalid email"}],
  "request_id": "3f0c9a5e-...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

Session failures add a `code` (`AUTH_MISSING`, `AUTH_INVALID_TOKEN`,
`AUTH_TOKEN_EXPIRED`, `AUTH_NOT_CONFIGURED`); carrier authentication failures
add the provider's `message`.
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "catalog", description = "Equipment, parts and power unit listings"),
        (name = "leads", description = "Quote requests and contact inquiries"),
        (name = "quotes", description = "Quotation documents"),
        (name = "estimator", description = "Streaming AI project estimates"),
        (name = "shipping", description = "Carrier rate shopping"),
        (name = "portal", description = "Signed-in customer data"),
        (name = "health", description = "Liveness and integration status")
    ),
    paths(
        // Catalog
        crate::handlers::catalog::list_equipment,
        crate::handlers::catalog::equipment_category_counts,
        crate::handlers::catalog::get_equipment,
        crate::handlers::catalog::list_parts,
        crate::handlers::catalog::parts_category_counts,
        crate::handlers::catalog::parts_subcategory_counts,
        crate::handlers::catalog::get_part,
        crate::handlers::catalog::list_power_units,
        crate::handlers::catalog::power_unit_category_counts,
        crate::handlers::catalog::get_power_unit,
        crate::handlers::catalog::catalog_stats,

        // Leads and quotations
        crate::handlers::leads::create_quote_request,
        crate::handlers::leads::create_contact_inquiry,
        crate::handlers::quotes::send_quote_email,

        // Estimator and shipping
        crate::handlers::estimator::create_estimate,
        crate::handlers::shipping::ups_rates,

        // Portal
        crate::handlers::portal::profile,
        crate::handlers::portal::quotes,
        crate::handlers::portal::orders,
        crate::handlers::portal::payments,
        crate::handlers::portal::inquiries,

        // Health
        crate::handlers::health::health_check,
        crate::handlers::health::api_status,
    ),
    components(
        schemas(
            // Catalog rows
            crate::models::Equipment,
            crate::models::Part,
            crate::models::PowerUnit,
            crate::services::catalog::CatalogStats,

            // Leads
            crate::models::QuoteRequest,
            crate::models::ContactInquiry,
            crate::services::leads::CreateQuoteRequest,
            crate::services::leads::CreateContactInquiry,

            // Quotations
            crate::services::quote_documents::QuoteItemType,
            crate::services::quote_documents::SendQuoteEmailRequest,
            crate::services::quote_documents::SendQuoteEmailResponse,

            // Estimator
            crate::services::estimator::EstimateRequest,
            crate::models::ProjectEstimate,

            // Shipping
            crate::services::shipping::ShippingRateRequest,
            crate::services::shipping::ShippingRate,
            crate::services::shipping::ShippingRatesResponse,

            // Portal
            crate::services::portal::PortalUser,
            crate::services::portal::PortalCounts,
            crate::services::portal::PortalProfile,
            crate::models::CustomerOrder,
            crate::models::CustomerPayment,

            // Health
            crate::handlers::health::ComponentStatus,
            crate::handlers::health::ComponentHealth,
            crate::handlers::health::HealthResponse,
            crate::handlers::health::StatusResponse,
            crate::handlers::health::IntegrationStatus,

            // Error types
            crate::errors::ErrorResponse,
            crate::errors::ValidationIssue
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
