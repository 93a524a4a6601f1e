use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{contact_inquiry, quote_request, ContactInquiry, QuoteRequest};
use crate::notifications::templates::{self, QuoteLead};
use crate::notifications::{EmailMessage, EmailSender};

/// Parts quote request form
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuoteRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email"), length(max = 200))]
    pub email: String,
    #[validate(length(max = 50))]
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub ship_to: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub items: Option<String>,
}

/// Contact form
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateContactInquiry {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email"), length(max = 200))]
    pub email: String,
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Persists form submissions and sends the paired notification emails
#[derive(Clone)]
pub struct LeadService {
    db_pool: Arc<DbPool>,
    mailer: Arc<dyn EmailSender>,
    email_from: String,
    business_email: String,
}

impl LeadService {
    pub fn new(
        db_pool: Arc<DbPool>,
        mailer: Arc<dyn EmailSender>,
        email_from: impl Into<String>,
        business_email: impl Into<String>,
    ) -> Self {
        Self {
            db_pool,
            mailer,
            email_from: email_from.into(),
            business_email: business_email.into(),
        }
    }

    /// Stores a quote request. `customer_id` is the authenticated session
    /// subject when there is one.
    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_quote_request(
        &self,
        input: CreateQuoteRequest,
        customer_id: Option<String>,
    ) -> Result<QuoteRequest, ServiceError> {
        input.validate()?;

        let row = quote_request::ActiveModel {
            customer_id: Set(customer_id),
            name: Set(input.name.clone()),
            email: Set(input.email.clone()),
            phone: Set(input.phone.clone()),
            ship_to: Set(input.ship_to.clone()),
            notes: Set(input.notes.clone()),
            items: Set(input.items.clone()),
            status: Set(quote_request::STATUS_PENDING.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let saved = row.insert(&*self.db_pool).await?;
        info!(quote_request_id = saved.id, "Quote request stored");

        let lead = QuoteLead {
            name: &input.name,
            email: &input.email,
            phone: non_empty(&input.phone),
            ship_to: non_empty(&input.ship_to),
            items: non_empty(&input.items),
            notes: non_empty(&input.notes),
        };
        let business = EmailMessage::new(
            &self.email_from,
            &self.business_email,
            format!("New Parts Quote Request from {}", input.name),
            templates::quote_business_html(&lead, saved.created_at),
        )
        .reply_to(&input.email);
        let confirmation = EmailMessage::new(
            &self.email_from,
            &input.email,
            "Quote Request Received — American Iron LLC",
            templates::quote_confirmation_html(&lead),
        );
        self.deliver_pair("Quote request", business, confirmation).await;

        Ok(saved)
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_contact_inquiry(
        &self,
        input: CreateContactInquiry,
    ) -> Result<ContactInquiry, ServiceError> {
        input.validate()?;

        let row = contact_inquiry::ActiveModel {
            name: Set(input.name.clone()),
            email: Set(input.email.clone()),
            message: Set(input.message.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        let saved = row.insert(&*self.db_pool).await?;
        info!(contact_inquiry_id = saved.id, "Contact inquiry stored");

        let business = EmailMessage::new(
            &self.email_from,
            &self.business_email,
            format!("New Contact Inquiry from {}", input.name),
            templates::contact_business_html(
                &input.name,
                &input.email,
                &input.message,
                saved.created_at,
            ),
        )
        .reply_to(&input.email);
        let confirmation = EmailMessage::new(
            &self.email_from,
            &input.email,
            "We've Received Your Inquiry — American Iron LLC",
            templates::contact_confirmation_html(&input.name, &input.message),
        );
        self.deliver_pair("Contact", business, confirmation).await;

        Ok(saved)
    }

    /// Sends both emails concurrently; failures are logged, never returned
    async fn deliver_pair(&self, kind: &str, business: EmailMessage, confirmation: EmailMessage) {
        let to = confirmation.to.clone();
        let (business_result, confirmation_result) = tokio::join!(
            self.mailer.send(business),
            self.mailer.send(confirmation)
        );
        match (business_result, confirmation_result) {
            (Ok(_), Ok(_)) => info!(to = %to, "{} emails sent", kind),
            (business, confirmation) => {
                if let Err(e) = business {
                    error!("{} business email failed (non-blocking): {}", kind, e);
                }
                if let Err(e) = confirmation {
                    error!("{} confirmation email failed (non-blocking): {}", kind, e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{EmailReceipt, MockEmailSender, NotificationError};
    use assert_matches::assert_matches;
    use sea_orm::{Database, EntityTrait};
    use sea_orm_migration::MigratorTrait;

    async fn pool() -> Arc<DbPool> {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        crate::migrator::Migrator::up(&db, None).await.unwrap();
        Arc::new(db)
    }

    fn quote_input() -> CreateQuoteRequest {
        CreateQuoteRequest {
            name: "Jordan".into(),
            email: "jordan@example.com".into(),
            phone: Some("813-555-0100".into()),
            ship_to: None,
            notes: None,
            items: Some("2x 1R-0750 fuel filter".into()),
        }
    }

    #[tokio::test]
    async fn quote_request_sends_business_notice_and_confirmation() {
        let mut mailer = MockEmailSender::new();
        mailer
            .expect_send()
            .withf(|m| {
                m.to == "info@americanironus.com"
                    && m.subject == "New Parts Quote Request from Jordan"
                    && m.reply_to.as_deref() == Some("jordan@example.com")
            })
            .times(1)
            .returning(|_| Ok(EmailReceipt { id: "b".into() }));
        mailer
            .expect_send()
            .withf(|m| {
                m.to == "jordan@example.com"
                    && m.subject == "Quote Request Received — American Iron LLC"
                    && m.html.contains("1R-0750")
            })
            .times(1)
            .returning(|_| Ok(EmailReceipt { id: "c".into() }));

        let db = pool().await;
        let service = LeadService::new(
            db.clone(),
            Arc::new(mailer),
            "shop@example.com",
            "info@americanironus.com",
        );
        let saved = service
            .create_quote_request(quote_input(), Some("user-1".into()))
            .await
            .unwrap();
        assert_eq!(saved.status, "pending");
        assert_eq!(saved.customer_id.as_deref(), Some("user-1"));

        let stored = crate::models::QuoteRequestEntity::find_by_id(saved.id)
            .one(&*db)
            .await
            .unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn email_failures_do_not_fail_submission() {
        let mut mailer = MockEmailSender::new();
        mailer
            .expect_send()
            .times(2)
            .returning(|_| Err(NotificationError::Provider("quota exceeded".into())));

        let service = LeadService::new(pool().await, Arc::new(mailer), "a@b.c", "d@e.f");
        let saved = service
            .create_contact_inquiry(CreateContactInquiry {
                name: "Sam".into(),
                email: "sam@example.com".into(),
                message: "Looking for a D8".into(),
            })
            .await
            .unwrap();
        assert_eq!(saved.name, "Sam");
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_storage() {
        let mut mailer = MockEmailSender::new();
        mailer.expect_send().never();
        let service = LeadService::new(pool().await, Arc::new(mailer), "a@b.c", "d@e.f");

        let mut input = quote_input();
        input.email = "not-an-email".into();
        input.phone = Some("9".repeat(51));
        let err = service.create_quote_request(input, None).await.unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(issues) if issues.len() == 2);
    }
}
