use std::sync::Arc;

use async_stream::stream;
use chrono::Utc;
use futures::stream::{BoxStream, StreamExt};
use metrics::counter;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};
use utoipa::ToSchema;
use validator::Validate;

use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::{project_estimate, ProjectEstimate};
use crate::services::catalog::CatalogService;
use crate::services::openai::{ChatMessage, ChatRequest, OpenAiClient};

pub const ESTIMATE_FAILED: &str = "Failed to generate estimate";

/// Project parameters submitted to the estimator
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    #[validate(length(min = 1, max = 200))]
    pub project_name: String,
    #[validate(length(min = 1, max = 100))]
    pub project_type: String,
    #[validate(length(min = 1, max = 200))]
    pub location: String,
    #[validate(length(min = 1, max = 100))]
    pub terrain: String,
    #[validate(length(min = 1, max = 100))]
    pub project_size: String,
    #[validate(length(min = 1, max = 100))]
    pub duration: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub additional_details: Option<String>,
}

/// One server-sent event of an estimate stream
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EstimateEvent {
    Content { content: String },
    Done { done: bool },
    Error { error: String },
}

impl EstimateEvent {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content {
            content: text.into(),
        }
    }

    pub fn done() -> Self {
        Self::Done { done: true }
    }

    pub fn failed() -> Self {
        Self::Error {
            error: ESTIMATE_FAILED.to_string(),
        }
    }
}

/// Inventory block embedded in the system prompt
pub async fn inventory_context(catalog: &CatalogService) -> Result<String, ServiceError> {
    let category_counts = catalog.equipment_category_counts().await?;
    let price_summary = catalog.equipment_price_summary().await?;
    let parts_counts = catalog.parts_category_counts().await?;

    Ok(format!(
        "\nAMERICAN IRON LLC INVENTORY DATA:\n\
Equipment Categories & Counts: {}\n\
Equipment Price Ranges by Category: {}\n\
Parts Categories & Counts: {}\n\
Total Equipment Items: {}\n\
Total Parts Items: {}\n",
        compact_json(&category_counts),
        compact_json(&price_summary),
        compact_json(&parts_counts),
        category_counts.values().sum::<u64>(),
        parts_counts.values().sum::<u64>(),
    ))
}

fn compact_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

pub fn system_prompt(inventory_context: &str) -> String {
    format!(
        r#"You are the IRON Estimator — an institutional-grade construction equipment estimation tool for American Iron LLC, a leading heavy equipment and parts company based in Tampa, Florida. You provide comprehensive, thorough, and professional project equipment estimates.

{inventory_context}

You must generate a detailed, institutional-quality estimate that includes:

1. **Primary Equipment Requirements**: List each piece of heavy equipment needed with specific make/model recommendations from our inventory categories (Excavators, Bulldozers, Wheel Loaders, Articulated Trucks, Motor Graders, Compactors, Scrapers, Track Dozers, Backhoes, Skidsteers, Telehandlers, etc.), quantities needed, and estimated costs based on our pricing.

2. **Supporting Equipment**: Forklifts, telehandlers, skidsteers, compactors, and other support machinery needed.

3. **Power Generation**: Generators and power units required for the project scope and location.

4. **Transportation & Logistics**: Estimated transport costs for equipment mobilization/demobilization based on the project location relative to our Tampa, FL headquarters.

5. **Maintenance & Parts Budget**: Estimated maintenance costs and replacement parts budget based on project duration, including filters, hydraulic components, undercarriage parts, engine components, etc. from our 12,200+ parts catalog.

6. **Personnel Considerations**: Estimated operator and maintenance crew requirements.

7. **Cost Summary**: 
   - Equipment Purchase/Rental Costs
   - Transportation Costs
   - Maintenance & Parts Reserve
   - Support Equipment Costs
   - Total Estimated Project Equipment Budget

Format your response as a structured, professional report with clear sections, bullet points, and cost breakdowns. Use real pricing ranges based on the inventory data provided. Be specific with equipment models and quantities. Consider the terrain type, project size, duration, and location when making recommendations.

Always provide cost ranges (low-mid-high) to give the client flexibility in budgeting. Include a note that actual pricing may vary and encourage the visitor to request a formal quote through American Iron LLC for exact pricing."#
    )
}

pub fn user_prompt(request: &EstimateRequest) -> String {
    let details = request
        .additional_details
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| format!("**Additional Details:** {}", d))
        .unwrap_or_default();
    format!(
        r#"Generate a comprehensive construction project equipment estimate for the following project:

**Project Name:** {}
**Project Type:** {}
**Location:** {}
**Terrain Type:** {}
**Project Size/Scale:** {}
**Estimated Duration:** {}
{}

Provide a thorough, institutional-grade estimate with specific equipment recommendations, quantities, cost breakdowns, and a comprehensive budget summary."#,
        request.project_name,
        request.project_type,
        request.location,
        request.terrain,
        request.project_size,
        request.duration,
        details,
    )
}

/// Drafts project equipment budgets through the chat-completion API
#[derive(Clone)]
pub struct EstimatorService {
    db_pool: Arc<DbPool>,
    catalog: CatalogService,
    openai: OpenAiClient,
    model: String,
    max_tokens: u32,
}

impl EstimatorService {
    pub fn new(
        db_pool: Arc<DbPool>,
        catalog: CatalogService,
        openai: OpenAiClient,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            db_pool,
            catalog,
            openai,
            model: model.into(),
            max_tokens,
        }
    }

    /// Opens the upstream completion and relays it as estimate events.
    /// Failures before the first event surface as an error; failures after
    /// it become a trailing error event.
    #[instrument(skip(self, request), fields(project = %request.project_name))]
    pub async fn stream_estimate(
        &self,
        request: EstimateRequest,
    ) -> Result<BoxStream<'static, EstimateEvent>, ServiceError> {
        request.validate()?;
        let context = inventory_context(&self.catalog).await.map_err(|e| {
            error!("Inventory context failed: {}", e);
            ServiceError::InternalError(ESTIMATE_FAILED.to_string())
        })?;

        let chat = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(system_prompt(&context)),
                ChatMessage::user(user_prompt(&request)),
            ],
            stream: true,
            max_completion_tokens: self.max_tokens,
        };

        let mut deltas = self.openai.stream_chat(&chat).await.map_err(|e| {
            error!("Error generating estimate: {}", e);
            ServiceError::InternalError(ESTIMATE_FAILED.to_string())
        })?;

        let service = self.clone();
        let events = stream! {
            let mut transcript = String::new();
            while let Some(delta) = deltas.next().await {
                match delta {
                    Ok(text) => {
                        transcript.push_str(&text);
                        yield EstimateEvent::content(text);
                    }
                    Err(e) => {
                        error!("Estimate stream failed: {}", e);
                        yield EstimateEvent::failed();
                        return;
                    }
                }
            }

            match service.save(&request, transcript).await {
                Ok(saved) => {
                    counter!("iron_catalog_estimates.generated", 1);
                    info!(estimate_id = saved.id, "Project estimate saved");
                    yield EstimateEvent::done();
                }
                Err(e) => {
                    error!("Saving project estimate failed: {}", e);
                    yield EstimateEvent::failed();
                }
            }
        };

        Ok(events.boxed())
    }

    pub async fn save(
        &self,
        request: &EstimateRequest,
        transcript: String,
    ) -> Result<ProjectEstimate, ServiceError> {
        let row = project_estimate::ActiveModel {
            project_name: Set(request.project_name.clone()),
            project_type: Set(request.project_type.clone()),
            location: Set(request.location.clone()),
            terrain: Set(request.terrain.clone()),
            project_size: Set(request.project_size.clone()),
            duration: Set(request.duration.clone()),
            additional_details: Set(request
                .additional_details
                .clone()
                .filter(|d| !d.is_empty())),
            estimate_result: Set(transcript),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(row.insert(&*self.db_pool).await?)
    }
}
