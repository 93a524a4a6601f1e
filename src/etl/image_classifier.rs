//! Vision classification of part photos into the part categories.
//!
//! Progress is checkpointed to a JSON file keyed by image file name, so an
//! interrupted run picks up where it stopped.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::join_all;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{info, instrument, warn};
use walkdir::WalkDir;

use super::{
    log_breakdown, read_classifications, tally, write_classifications, ImageClassification,
    PART_CATEGORIES,
};
use crate::common::truncate_chars;
use crate::services::openai::{
    ChatMessage, ChatRequest, ContentPart, ImageUrl, OpenAiClient, OpenAiError,
};

pub const CLASSIFY_PROMPT: &str = r#"Classify this heavy equipment/machinery part image into ONE category from this list:
1. Hydraulic System (pumps, valves, cylinders, hoses, fittings)
2. Engine Components (pistons, crankshafts, camshafts, cylinder heads, blocks)
3. Bearings (ball bearings, roller bearings, bushings, races)
4. Undercarriage (track links, rollers, idlers, sprockets, shoes)
5. Filters (oil, fuel, air, hydraulic filters)
6. Electrical (alternators, starters, wiring, switches, sensors)
7. Ground Engaging Tools (bucket teeth, cutting edges, blades)
8. Belts & Hoses (drive belts, radiator hoses, hydraulic hoses)
9. Braking & Friction (brake pads, discs, friction plates)
10. Hardware (bolts, nuts, screws, washers, pins, clamps)
11. Cooling System (radiators, water pumps, thermostats, fans)
12. Turbochargers (turbo assemblies, cartridges, housings)
13. Air Inlet & Exhaust (mufflers, exhaust pipes, manifolds)
14. Gaskets & Seals (gaskets, o-rings, seals, seal kits)

Reply ONLY with JSON: {"cat": <number 1-14>, "type": "specific part name"}"#;

const MAX_REPLY_TOKENS: u32 = 60;
const FALLBACK_CATEGORY: &str = "Hardware";
const UNKNOWN_TYPE: &str = "unknown";

static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^}]+\}").expect("valid object regex"));
static FIRST_NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("valid number regex"));

/// Pacing and retry knobs for a classification run
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    pub model: String,
    pub concurrency: usize,
    pub max_attempts: u32,
    /// Doubled on every rate-limited attempt
    pub rate_limit_backoff: Duration,
    pub error_delay: Duration,
    pub batch_pause: Duration,
    pub checkpoint_every: usize,
}

impl ClassifierSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            concurrency: 2,
            max_attempts: 6,
            rate_limit_backoff: Duration::from_secs(3),
            error_delay: Duration::from_secs(2),
            batch_pause: Duration::from_millis(300),
            checkpoint_every: 20,
        }
    }
}

/// `cat` arrives as `5`, `5.0` or `"5"` depending on the model
fn category_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Category and part type from a model reply. Replies that are not JSON
/// fall back to their first number; the category index is clamped.
pub fn parse_reply(content: &str) -> (&'static str, String) {
    let content = content.trim();
    let json = JSON_OBJECT
        .find(content)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok());

    let (cat, part_type) = match json {
        Some(value) => (
            value.get("cat").and_then(category_number),
            value
                .get("type")
                .and_then(Value::as_str)
                .filter(|t| !t.is_empty())
                .map(str::to_string),
        ),
        None => (
            FIRST_NUMBER
                .find(content)
                .and_then(|m| m.as_str().parse::<i64>().ok()),
            None,
        ),
    };

    let cat = cat.filter(|c| *c != 0).unwrap_or(1);
    let index = (cat - 1).clamp(0, PART_CATEGORIES.len() as i64 - 1) as usize;
    (
        PART_CATEGORIES[index],
        part_type.unwrap_or_else(|| UNKNOWN_TYPE.to_string()),
    )
}

/// `part-*.png` files directly inside `dir`, sorted by name
pub fn list_part_images(dir: &Path) -> anyhow::Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("failed to scan {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with("part-") && name.ends_with(".png") {
            files.push(name.into_owned());
        }
    }
    files.sort();
    Ok(files)
}

pub struct ImageClassifier {
    client: OpenAiClient,
    settings: ClassifierSettings,
}

impl ImageClassifier {
    pub fn new(client: OpenAiClient, settings: ClassifierSettings) -> Self {
        Self { client, settings }
    }

    async fn classify_once(&self, path: &Path, file: &str) -> anyhow::Result<ImageClassification> {
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let request = ChatRequest {
            model: self.settings.model.clone(),
            messages: vec![ChatMessage::user_parts(vec![
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: format!("data:image/png;base64,{}", STANDARD.encode(data)),
                    },
                },
                ContentPart::Text {
                    text: CLASSIFY_PROMPT.to_string(),
                },
            ])],
            stream: false,
            max_completion_tokens: MAX_REPLY_TOKENS,
        };

        let reply = self.client.complete(&request).await?;
        let (category, part_type) = parse_reply(&reply);
        Ok(ImageClassification {
            file: file.to_string(),
            category: category.to_string(),
            part_type,
            keywords: None,
            error: None,
        })
    }

    /// `None` when every attempt was rate limited; the image stays
    /// unclassified for the next run.
    async fn classify(&self, dir: &Path, file: &str) -> Option<ImageClassification> {
        let path: PathBuf = dir.join(file);
        let attempts = self.settings.max_attempts.max(1);

        for attempt in 0..attempts {
            let err = match self.classify_once(&path, file).await {
                Ok(result) => return Some(result),
                Err(err) => err,
            };
            let rate_limited = err
                .downcast_ref::<OpenAiError>()
                .is_some_and(OpenAiError::is_rate_limited);

            if rate_limited {
                let delay = self.settings.rate_limit_backoff * 2u32.saturating_pow(attempt);
                warn!(file, attempt, delay_ms = delay.as_millis() as u64, "Rate limited, backing off");
                tokio::time::sleep(delay).await;
            } else if attempt + 1 == attempts {
                warn!(file, error = %err, "Classification failed, recording fallback");
                return Some(ImageClassification {
                    file: file.to_string(),
                    category: FALLBACK_CATEGORY.to_string(),
                    part_type: UNKNOWN_TYPE.to_string(),
                    keywords: None,
                    error: Some(truncate_chars(&err.to_string(), 100)),
                });
            } else {
                tokio::time::sleep(self.settings.error_delay).await;
            }
        }
        None
    }

    /// Classifies every unclassified image in `images_dir`, checkpointing to
    /// `output`, and returns the full result set.
    #[instrument(skip(self))]
    pub async fn run(
        &self,
        images_dir: &Path,
        output: &Path,
    ) -> anyhow::Result<Vec<ImageClassification>> {
        let mut results = if output.exists() {
            let existing = read_classifications(output)?;
            info!("Resuming: {} already classified", existing.len());
            existing
        } else {
            Vec::new()
        };

        let images = list_part_images(images_dir)?;
        info!("Total images: {}", images.len());
        let pending: Vec<&String> = images
            .iter()
            .filter(|file| !results.iter().any(|r| &r.file == *file))
            .collect();
        info!("Remaining: {}", pending.len());

        if pending.is_empty() {
            log_summary(&results);
            return Ok(results);
        }

        let concurrency = self.settings.concurrency.max(1);
        let mut errors = 0usize;
        for (batch_no, batch) in pending.chunks(concurrency).enumerate() {
            let start = batch_no * concurrency;
            let outcomes =
                join_all(batch.iter().map(|file| self.classify(images_dir, file))).await;
            for outcome in outcomes.into_iter().flatten() {
                if outcome.error.is_some() {
                    errors += 1;
                }
                results.push(outcome);
            }

            let last = start + concurrency >= pending.len();
            if start % self.settings.checkpoint_every.max(1) == 0 || last {
                write_classifications(output, &results)?;
            }
            if results.len() % 25 < concurrency {
                info!("Progress: {}/{} ({} errors)", results.len(), images.len(), errors);
            }
            if !last {
                tokio::time::sleep(self.settings.batch_pause).await;
            }
        }

        write_classifications(output, &results)?;
        log_summary(&results);
        Ok(results)
    }
}

fn log_summary(results: &[ImageClassification]) {
    log_breakdown(
        "Classification summary",
        tally(results.iter().map(|r| r.category.as_str())),
    );
    info!("Total: {}", results.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[rstest]
    #[case(r#"{"cat": 5, "type": "oil filter"}"#, "Filters", "oil filter")]
    #[case(r#"{"cat":"5"}"#, "Filters", "unknown")]
    #[case(r#"{"cat": " 12 ", "type": "turbo"}"#, "Turbochargers", "turbo")]
    #[case(r#"{"cat": 5.0}"#, "Filters", "unknown")]
    #[case(r#"Sure! {"cat": 12} done"#, "Turbochargers", "unknown")]
    #[case("Category 3, bearings", "Bearings", "unknown")]
    #[case(r#"{"cat": 40, "type": "x"}"#, "Gaskets & Seals", "x")]
    #[case(r#"{"cat": -2, "type": ""}"#, "Hydraulic System", "unknown")]
    #[case("no idea", "Hydraulic System", "unknown")]
    fn parses_model_replies(#[case] reply: &str, #[case] category: &str, #[case] part_type: &str) {
        let (cat, kind) = parse_reply(reply);
        assert_eq!(cat, category);
        assert_eq!(kind, part_type);
    }

    fn fast_settings(attempts: u32) -> ClassifierSettings {
        ClassifierSettings {
            max_attempts: attempts,
            rate_limit_backoff: Duration::ZERO,
            error_delay: Duration::ZERO,
            batch_pause: Duration::ZERO,
            ..ClassifierSettings::new("gpt-vision-test")
        }
    }

    fn images_dir(files: &[&str]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"\x89PNG").unwrap();
        }
        dir
    }

    fn classifier(server: &MockServer, attempts: u32) -> ImageClassifier {
        let client = OpenAiClient::new(reqwest::Client::new(), server.uri(), Some("sk-test".into()), 0);
        ImageClassifier::new(client, fast_settings(attempts))
    }

    #[test]
    fn lists_only_part_pngs() {
        let dir = images_dir(&["part-0002.png", "part-0001.png", "part-0003.jpg", "cover.png"]);
        assert_eq!(
            list_part_images(dir.path()).unwrap(),
            vec!["part-0001.png".to_string(), "part-0002.png".to_string()]
        );
    }

    #[tokio::test]
    async fn resumes_from_checkpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-vision-test",
                "max_completion_tokens": 60,
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{\"cat\": 5, \"type\": \"oil filter\"}"}}]
            })))
            .expect(2)
            .mount(&server)
            .await;

        let dir = images_dir(&["part-0001.png", "part-0002.png", "part-0003.png"]);
        let output = dir.path().join("classifications.json");
        write_classifications(
            &output,
            &[ImageClassification {
                file: "part-0001.png".into(),
                category: "Bearings".into(),
                part_type: "bushing".into(),
                keywords: None,
                error: None,
            }],
        )
        .unwrap();

        let results = classifier(&server, 6).run(dir.path(), &output).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].category, "Bearings");
        assert!(results[1..].iter().all(|r| r.category == "Filters"));
        assert_eq!(read_classifications(&output).unwrap(), results);
    }

    #[tokio::test]
    async fn records_fallback_after_repeated_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("unsupported image"))
            .expect(3)
            .mount(&server)
            .await;

        let dir = images_dir(&["part-0001.png"]);
        let output = dir.path().join("classifications.json");
        let results = classifier(&server, 3).run(dir.path(), &output).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].category, "Hardware");
        assert_eq!(results[0].part_type, "unknown");
        let error = results[0].error.as_deref().unwrap();
        assert!(error.contains("400"));
        assert!(error.chars().count() <= 100);
    }

    #[tokio::test]
    async fn rate_limited_images_stay_pending() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limit"))
            .expect(2)
            .mount(&server)
            .await;

        let dir = images_dir(&["part-0001.png"]);
        let output = dir.path().join("classifications.json");
        let results = classifier(&server, 2).run(dir.path(), &output).await.unwrap();

        assert!(results.is_empty());
        assert!(read_classifications(&output).unwrap().is_empty());
    }
}
