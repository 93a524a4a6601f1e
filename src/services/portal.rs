use std::sync::Arc;

use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::auth::AuthUser;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{
    contact_inquiry, customer_order, customer_payment, quote_request, ContactInquiry,
    ContactInquiryEntity, CustomerOrder, CustomerOrderEntity, CustomerPayment,
    CustomerPaymentEntity, QuoteRequest, QuoteRequestEntity,
};

const NO_EMAIL: &str = "No email associated with account";

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortalUser {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PortalCounts {
    pub quotes: u64,
    pub orders: u64,
    pub payments: u64,
    pub inquiries: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PortalProfile {
    pub user: PortalUser,
    pub counts: PortalCounts,
}

fn email_of(user: &AuthUser) -> Result<&str, ServiceError> {
    user.email
        .as_deref()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| ServiceError::BadRequest(NO_EMAIL.to_string()))
}

fn subject_of(user: &AuthUser) -> Result<&str, ServiceError> {
    if user.user_id.is_empty() {
        Err(ServiceError::Unauthorized("Unauthorized".to_string()))
    } else {
        Ok(&user.user_id)
    }
}

/// Read-only views over a signed-in customer's records
#[derive(Clone)]
pub struct PortalService {
    db_pool: Arc<DbPool>,
}

impl PortalService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, user), fields(customer_id = %user.user_id))]
    pub async fn profile(&self, user: &AuthUser) -> Result<PortalProfile, ServiceError> {
        let email = email_of(user)?;
        let db = &*self.db_pool;

        let (quotes, orders, payments, inquiries) = tokio::try_join!(
            QuoteRequestEntity::find()
                .filter(quote_request::Column::Email.eq(email))
                .count(db),
            CustomerOrderEntity::find()
                .filter(customer_order::Column::CustomerId.eq(user.user_id.as_str()))
                .count(db),
            CustomerPaymentEntity::find()
                .filter(customer_payment::Column::CustomerId.eq(user.user_id.as_str()))
                .count(db),
            ContactInquiryEntity::find()
                .filter(contact_inquiry::Column::Email.eq(email))
                .count(db),
        )?;

        Ok(PortalProfile {
            user: PortalUser {
                id: user.user_id.clone(),
                email: user.email.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                profile_image_url: user.profile_image_url.clone(),
            },
            counts: PortalCounts {
                quotes,
                orders,
                payments,
                inquiries,
            },
        })
    }

    /// Quotes filed under the session subject, else under the session email
    #[instrument(skip(self, user), fields(customer_id = %user.user_id))]
    pub async fn quotes(&self, user: &AuthUser) -> Result<Vec<QuoteRequest>, ServiceError> {
        let db = &*self.db_pool;
        let mut quotes = Vec::new();
        if !user.user_id.is_empty() {
            quotes = QuoteRequestEntity::find()
                .filter(quote_request::Column::CustomerId.eq(user.user_id.as_str()))
                .order_by_desc(quote_request::Column::CreatedAt)
                .all(db)
                .await?;
        }
        if quotes.is_empty() {
            if let Some(email) = user.email.as_deref().filter(|e| !e.is_empty()) {
                quotes = QuoteRequestEntity::find()
                    .filter(quote_request::Column::Email.eq(email))
                    .order_by_desc(quote_request::Column::CreatedAt)
                    .all(db)
                    .await?;
            }
        }
        Ok(quotes)
    }

    #[instrument(skip(self, user), fields(customer_id = %user.user_id))]
    pub async fn orders(&self, user: &AuthUser) -> Result<Vec<CustomerOrder>, ServiceError> {
        let customer_id = subject_of(user)?;
        Ok(CustomerOrderEntity::find()
            .filter(customer_order::Column::CustomerId.eq(customer_id))
            .order_by_desc(customer_order::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, user), fields(customer_id = %user.user_id))]
    pub async fn payments(&self, user: &AuthUser) -> Result<Vec<CustomerPayment>, ServiceError> {
        let customer_id = subject_of(user)?;
        Ok(CustomerPaymentEntity::find()
            .filter(customer_payment::Column::CustomerId.eq(customer_id))
            .order_by_desc(customer_payment::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }

    #[instrument(skip(self, user), fields(customer_id = %user.user_id))]
    pub async fn inquiries(&self, user: &AuthUser) -> Result<Vec<ContactInquiry>, ServiceError> {
        let email = email_of(user)?;
        Ok(ContactInquiryEntity::find()
            .filter(contact_inquiry::Column::Email.eq(email))
            .order_by_desc(contact_inquiry::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?)
    }
}
