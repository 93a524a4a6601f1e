pub mod catalog;
pub mod common;
pub mod estimator;
pub mod health;
pub mod leads;
pub mod portal;
pub mod quotes;
pub mod shipping;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::notifications::EmailSender;
use crate::services::{
    catalog::CatalogService, estimator::EstimatorService, leads::LeadService,
    openai::OpenAiClient, portal::PortalService, quote_documents::QuoteDocumentService,
    shipping::{ShippingService, UpsCredentials},
};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub catalog: CatalogService,
    pub leads: LeadService,
    pub quote_documents: QuoteDocumentService,
    pub estimator: EstimatorService,
    pub shipping: ShippingService,
    pub portal: PortalService,
}

impl AppServices {
    /// Wires every service from configuration. Provider clients share `http`.
    pub fn new(
        db_pool: Arc<DbPool>,
        cfg: &AppConfig,
        mailer: Arc<dyn EmailSender>,
        http: reqwest::Client,
    ) -> Self {
        let catalog = CatalogService::new(db_pool.clone());
        let leads = LeadService::new(
            db_pool.clone(),
            mailer.clone(),
            cfg.email_from.clone(),
            cfg.business_email.clone(),
        );
        let quote_documents =
            QuoteDocumentService::new(catalog.clone(), mailer, cfg.email_from.clone());

        let openai = OpenAiClient::new(
            http.clone(),
            cfg.openai_base_url.clone(),
            cfg.openai_api_key.clone(),
            cfg.openai_max_retries,
        );
        let estimator = EstimatorService::new(
            db_pool.clone(),
            catalog.clone(),
            openai,
            cfg.openai_model.clone(),
            cfg.estimator_max_tokens,
        );

        let shipping = ShippingService::new(
            http,
            cfg.ups_base_url.clone(),
            UpsCredentials {
                client_id: cfg.ups_client_id.clone(),
                client_secret: cfg.ups_client_secret.clone(),
                account_number: cfg.ups_account_number.clone(),
            },
        );

        Self {
            catalog,
            leads,
            quote_documents,
            estimator,
            shipping,
            portal: PortalService::new(db_pool),
        }
    }
}
