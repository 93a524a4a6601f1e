use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::common::{parse_leading_int, parse_quote_date};
use crate::documents::{render_html, render_pdf, QuoteDocument};
use crate::errors::ServiceError;
use crate::notifications::{EmailMessage, EmailSender, NotificationError};
use crate::services::catalog::CatalogService;

/// Catalog item kinds a quotation can be produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum QuoteItemType {
    #[serde(rename = "equipment")]
    Equipment,
    #[serde(rename = "power-unit")]
    PowerUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendQuoteEmailRequest {
    #[validate(email(message = "Invalid email"))]
    pub email: String,
    pub item_type: QuoteItemType,
    pub item_id: String,
    pub quote_number: String,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub quote_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendQuoteEmailResponse {
    pub success: bool,
    pub email_id: String,
}

/// Builds quotation documents and mails them with the PDF attached
#[derive(Clone)]
pub struct QuoteDocumentService {
    catalog: CatalogService,
    mailer: Arc<dyn EmailSender>,
    email_from: String,
}

impl QuoteDocumentService {
    pub fn new(catalog: CatalogService, mailer: Arc<dyn EmailSender>, email_from: impl Into<String>) -> Self {
        Self {
            catalog,
            mailer,
            email_from: email_from.into(),
        }
    }

    /// Resolves the catalog item into a quotation
    pub async fn build_document(
        &self,
        request: &SendQuoteEmailRequest,
    ) -> Result<QuoteDocument, ServiceError> {
        let quote_date = parse_quote_date(&request.quote_date)
            .ok_or_else(|| ServiceError::invalid_field("quoteDate", "Invalid quote date"))?;

        match request.item_type {
            QuoteItemType::Equipment => {
                let item = self.catalog.get_equipment(&request.item_id).await?;
                Ok(QuoteDocument::for_equipment(&item, &request.quote_number, quote_date))
            }
            QuoteItemType::PowerUnit => {
                let id = parse_leading_int(&request.item_id)
                    .and_then(|id| i32::try_from(id).ok())
                    .ok_or_else(|| ServiceError::BadRequest("Invalid power unit ID".to_string()))?;
                let unit = self.catalog.get_power_unit(id).await?;
                Ok(QuoteDocument::for_power_unit(&unit, &request.quote_number, quote_date))
            }
        }
    }

    #[instrument(skip(self, request), fields(item_type = ?request.item_type, item_id = %request.item_id))]
    pub async fn send_quote_email(
        &self,
        request: SendQuoteEmailRequest,
    ) -> Result<SendQuoteEmailResponse, ServiceError> {
        request.validate()?;
        let document = self.build_document(&request).await?;

        let pdf = render_pdf(&document).map_err(|e| {
            error!("Quote PDF rendering failed: {}", e);
            ServiceError::InternalError("Failed to send quote email".to_string())
        })?;

        let message = EmailMessage::new(
            &self.email_from,
            &request.email,
            document.email_subject(),
            render_html(&document),
        )
        .attach(document.attachment_name(), pdf);

        match self.mailer.send(message).await {
            Ok(receipt) => {
                info!(email_id = %receipt.id, to = %request.email, "Quote email sent");
                Ok(SendQuoteEmailResponse {
                    success: true,
                    email_id: receipt.id,
                })
            }
            Err(NotificationError::Transport(e)) => {
                error!("Quote email transport failure: {}", e);
                Err(ServiceError::InternalError("Failed to send quote email".to_string()))
            }
            Err(e) => {
                error!("Quote email provider error: {}", e);
                Err(ServiceError::OperationFailed {
                    message: "Failed to send email".to_string(),
                    details: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{equipment, power_unit};
    use crate::notifications::{EmailReceipt, MockEmailSender};
    use assert_matches::assert_matches;
    use sea_orm::{ActiveModelTrait, Database, Set};
    use sea_orm_migration::MigratorTrait;

    async fn catalog() -> CatalogService {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::migrator::Migrator::up(&db, None).await.unwrap();
        equipment::ActiveModel {
            equipment_id: Set("EQ-1001".into()),
            make: Set("Caterpillar".into()),
            model: Set("D6T".into()),
            year: Set(Some(2019)),
            meter: Set(Some(4200)),
            price: Set(Some("$185,000".into())),
            city: Set(Some("Tampa".into())),
            state: Set(Some("FL".into())),
            category: Set("Dozers".into()),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        power_unit::ActiveModel {
            stock_number: Set("PU-001".into()),
            brand: Set(Some("Cummins".into())),
            model: Set("Cummins QSX15".into()),
            category: Set("Generator Sets".into()),
            hp: Set(Some(600)),
            ..Default::default()
        }
        .insert(&db)
        .await
        .unwrap();
        CatalogService::new(Arc::new(db))
    }

    fn request(item_type: QuoteItemType, item_id: &str) -> SendQuoteEmailRequest {
        SendQuoteEmailRequest {
            email: "buyer@example.com".into(),
            item_type,
            item_id: item_id.into(),
            quote_number: "AI-2041".into(),
            quote_date: "2026-03-09T14:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn equipment_quote_is_mailed_with_pdf_attachment() {
        let mut mailer = MockEmailSender::new();
        mailer
            .expect_send()
            .withf(|m| {
                m.to == "buyer@example.com"
                    && m.subject == "Quote AI-2041 — Caterpillar D6T | American Iron LLC"
                    && m.attachments.len() == 1
                    && m.attachments[0].filename == "American_Iron_Quote_AI-2041.pdf"
                    && m.attachments[0].content.starts_with(b"%PDF")
            })
            .times(1)
            .returning(|_| Ok(EmailReceipt { id: "em_1".into() }));

        let service = QuoteDocumentService::new(catalog().await, Arc::new(mailer), "a@b.c");
        let response = service
            .send_quote_email(request(QuoteItemType::Equipment, "EQ-1001"))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.email_id, "em_1");
    }

    #[tokio::test]
    async fn lookup_failures_map_to_client_errors() {
        let mut mailer = MockEmailSender::new();
        mailer.expect_send().never();
        let service = QuoteDocumentService::new(catalog().await, Arc::new(mailer), "a@b.c");

        let err = service
            .send_quote_email(request(QuoteItemType::PowerUnit, "abc"))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::BadRequest(msg) if msg == "Invalid power unit ID");

        let err = service
            .send_quote_email(request(QuoteItemType::Equipment, "EQ-404"))
            .await
            .unwrap_err();
        assert_matches!(err, ServiceError::NotFound(msg) if msg == "Equipment not found");

        let mut bad_date = request(QuoteItemType::Equipment, "EQ-1001");
        bad_date.quote_date = "next tuesday".into();
        let err = service.send_quote_email(bad_date).await.unwrap_err();
        assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn provider_rejection_reports_details() {
        let mut mailer = MockEmailSender::new();
        mailer
            .expect_send()
            .returning(|_| Err(NotificationError::Provider("domain not verified".into())));
        let service = QuoteDocumentService::new(catalog().await, Arc::new(mailer), "a@b.c");

        let err = service
            .send_quote_email(request(QuoteItemType::PowerUnit, "1"))
            .await
            .unwrap_err();
        assert_matches!(
            err,
            ServiceError::OperationFailed { message, details }
                if message == "Failed to send email" && details.contains("domain not verified")
        );
    }
}
