//! Image generation: Replicate-backed illustrations for generated pages.
//!
//! One image per keyword of the outline's keyword set, capped by the caller.
//! Per-image failures are skipped; the call only fails if nothing was produced.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::generation::models::GeneratedImage;

const REPLICATE_API_URL: &str = "https://api.replicate.com/v1/models";
/// Text-to-image model used for every illustration.
pub const IMAGE_MODEL: &str = "black-forest-labs/flux-schnell";
const POLL_INTERVAL: Duration = Duration::from_secs(1);
const MAX_POLLS: u32 = 30;

const IMAGE_PROMPT_TEMPLATE: &str = "Professional photograph for a premium chauffeur \
    service website: {keyword}. Black executive sedan, elegant driver in a suit, French \
    Riviera light, clean composition, no text, no logos, photorealistic";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Prediction {id} ended with status '{status}': {detail}")]
    PredictionFailed {
        id: String,
        status: String,
        detail: String,
    },

    #[error("Prediction {id} did not finish after {polls} polls")]
    Timeout { id: String, polls: u32 },

    #[error("Prediction returned no output URL")]
    NoOutput,

    #[error("All {requested} image generations failed; last error: {last}")]
    AllFailed { requested: usize, last: String },
}

/// Image-generation backend.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generates up to `count` images, one per keyword in order.
    async fn generate(
        &self,
        keywords: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedImage>, ImageError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Replicate
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct PredictionRequest {
    input: PredictionInput,
}

#[derive(Debug, Serialize)]
struct PredictionInput {
    prompt: String,
    aspect_ratio: &'static str,
    output_format: &'static str,
    num_outputs: u32,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
    urls: PredictionUrls,
}

#[derive(Debug, Deserialize)]
struct PredictionUrls {
    get: String,
}

impl Prediction {
    fn is_terminal(&self) -> bool {
        matches!(self.status.as_str(), "succeeded" | "failed" | "canceled")
    }

    /// Replicate returns either a single URL or a list of URLs.
    fn first_output_url(&self) -> Option<String> {
        match self.output.as_ref()? {
            Value::String(url) => Some(url.clone()),
            Value::Array(items) => items.iter().find_map(|v| v.as_str().map(str::to_string)),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    api_token: String,
}

impl ReplicateClient {
    pub fn new(api_token: String) -> Result<Self, ImageError> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(120)).build()?,
            api_token,
        })
    }

    async fn generate_one(&self, keyword: &str) -> Result<GeneratedImage, ImageError> {
        let prompt = build_image_prompt(keyword);
        let body = PredictionRequest {
            input: PredictionInput {
                prompt: prompt.clone(),
                aspect_ratio: "16:9",
                output_format: "webp",
                num_outputs: 1,
            },
        };

        let response = self
            .client
            .post(format!("{REPLICATE_API_URL}/{IMAGE_MODEL}/predictions"))
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;
        let mut prediction: Prediction = read_prediction(response).await?;

        let mut polls = 0;
        while !prediction.is_terminal() {
            if polls >= MAX_POLLS {
                return Err(ImageError::Timeout {
                    id: prediction.id,
                    polls,
                });
            }
            polls += 1;
            tokio::time::sleep(POLL_INTERVAL).await;
            let response = self
                .client
                .get(&prediction.urls.get)
                .bearer_auth(&self.api_token)
                .send()
                .await?;
            prediction = read_prediction(response).await?;
        }

        if prediction.status != "succeeded" {
            let detail = prediction
                .error
                .as_ref()
                .map(Value::to_string)
                .unwrap_or_default();
            return Err(ImageError::PredictionFailed {
                id: prediction.id,
                status: prediction.status,
                detail,
            });
        }

        let url = prediction.first_output_url().ok_or(ImageError::NoOutput)?;
        debug!("Image for '{}' ready after {} polls: {}", keyword, polls, url);

        Ok(GeneratedImage {
            url,
            alt: alt_text_for(keyword),
            keyword: keyword.to_string(),
            prompt,
        })
    }
}

async fn read_prediction(response: reqwest::Response) -> Result<Prediction, ImageError> {
    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ImageError::Api {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response.json().await?)
}

#[async_trait]
impl ImageGenerator for ReplicateClient {
    async fn generate(
        &self,
        keywords: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedImage>, ImageError> {
        let targets: Vec<&String> = keywords.iter().take(count).collect();
        let mut images = Vec::with_capacity(targets.len());
        let mut last_error: Option<ImageError> = None;

        for keyword in &targets {
            match self.generate_one(keyword).await {
                Ok(image) => images.push(image),
                Err(e) => {
                    warn!("Image generation for '{}' failed: {}", keyword, e);
                    last_error = Some(e);
                }
            }
        }

        if images.is_empty() {
            if let Some(last) = last_error {
                return Err(ImageError::AllFailed {
                    requested: targets.len(),
                    last: last.to_string(),
                });
            }
        }

        info!("Generated {}/{} images", images.len(), targets.len());
        Ok(images)
    }
}

fn build_image_prompt(keyword: &str) -> String {
    IMAGE_PROMPT_TEMPLATE.replace("{keyword}", keyword)
}

fn alt_text_for(keyword: &str) -> String {
    format!("{keyword} – chauffeur privé et berline haut de gamme")
}
