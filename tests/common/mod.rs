#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, Database};
use sea_orm_migration::MigratorTrait;
use serde_json::Value;
use tower::ServiceExt;

use iron_catalog::{
    auth::AuthUser,
    config::AppConfig,
    db::DbPool,
    migrator::Migrator,
    models::{equipment, part, power_unit},
    notifications::{EmailMessage, EmailReceipt, EmailSender, NotificationError},
    AppState,
};

pub const JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Captures outgoing email instead of calling the provider
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
    pub fail: bool,
}

impl RecordingMailer {
    pub fn messages(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<EmailReceipt, NotificationError> {
        if self.fail {
            return Err(NotificationError::Provider("mailbox unavailable".into()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(message);
        Ok(EmailReceipt {
            id: format!("email-{}", sent.len()),
        })
    }
}

/// Response status plus the parsed body (`Value::Null` when not JSON)
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or(Value::Null)
    }
}

/// Application router over a migrated in-memory SQLite database
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        Self::build(adjust, RecordingMailer::default()).await
    }

    pub async fn with_failing_mailer() -> Self {
        Self::build(
            |_| {},
            RecordingMailer {
                fail: true,
                ..Default::default()
            },
        )
        .await
    }

    async fn build(adjust: impl FnOnce(&mut AppConfig), mailer: RecordingMailer) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.business_email = "sales@example.com".to_string();
        adjust(&mut cfg);

        let db = Database::connect(cfg.database_url())
            .await
            .expect("failed to open test database");
        Migrator::up(&db, None)
            .await
            .expect("failed to migrate test database");

        let mailer = Arc::new(mailer);
        let state = AppState::with_mailer(
            Arc::new(db),
            cfg,
            mailer.clone(),
            reqwest::Client::new(),
        );
        let router = iron_catalog::app(state.clone());

        Self {
            router,
            state,
            mailer,
        }
    }

    pub fn db(&self) -> &DbPool {
        &self.state.db
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router response");
        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("response body");
        TestResponse {
            status,
            content_type,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), None).await
    }

    /// Signs a session token for a portal customer
    pub fn token_for(&self, user_id: &str, email: Option<&str>) -> String {
        let user = AuthUser {
            user_id: user_id.to_string(),
            email: email.map(str::to_string),
            first_name: Some("Dana".to_string()),
            last_name: None,
            profile_image_url: None,
        };
        self.state
            .auth
            .issue_token(&user, Duration::hours(1))
            .expect("token")
    }

    pub async fn insert_equipment(
        &self,
        equipment_id: &str,
        make: &str,
        model: &str,
        category: &str,
        price: Option<&str>,
    ) -> equipment::Model {
        equipment::ActiveModel {
            equipment_id: Set(equipment_id.to_string()),
            make: Set(make.to_string()),
            model: Set(model.to_string()),
            year: Set(Some(2018)),
            meter: Set(Some(3200)),
            price: Set(price.map(str::to_string)),
            city: Set(Some("Tampa".to_string())),
            state: Set(Some("FL".to_string())),
            category: Set(category.to_string()),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("insert equipment")
    }

    pub async fn insert_part(
        &self,
        part_number: &str,
        description: &str,
        category: &str,
        subcategory: Option<&str>,
    ) -> part::Model {
        part::ActiveModel {
            part_number: Set(part_number.to_string()),
            description: Set(description.to_string()),
            category: Set(category.to_string()),
            subcategory: Set(subcategory.map(str::to_string)),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("insert part")
    }

    pub async fn insert_power_unit(
        &self,
        stock_number: &str,
        model: &str,
        category: &str,
        price: Option<&str>,
    ) -> power_unit::Model {
        power_unit::ActiveModel {
            stock_number: Set(stock_number.to_string()),
            model: Set(model.to_string()),
            category: Set(category.to_string()),
            hp: Set(Some(250)),
            kw: Set(Some(180)),
            condition: Set(Some("Used".to_string())),
            location: Set(Some("Tampa, FL".to_string())),
            price: Set(price.map(str::to_string)),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("insert power unit")
    }
}
