//! Pipeline Orchestrator: drives one keyword from outline to scored, illustrated page.
//!
//! States:
//! Planning → SectionGeneration → Assembled → Validating ⇄ OptimizationNeeded
//!          → ImageGeneration → Done, with Failed reachable from any state.
//!
//! `generate_optimized_content` always returns a `GenerationResult`: unrecovered
//! errors become a `failed` result with empty collections and a zero score.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::errors::PipelineError;
use crate::generation::assembler::{assemble, check_consistency, total_word_count};
use crate::generation::models::{GeneratedImage, Outline, Section};
use crate::generation::planner::StructurePlanner;
use crate::generation::sections::SectionGenerator;
use crate::images::ImageGenerator;
use crate::llm_client::TextGenerator;
use crate::optimizer::{validate_optimized_content, ContentOptimizer};
use crate::seo::{SeoResult, SeoValidator};

pub mod batch;
pub mod handlers;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_MIN_SEO_SCORE: u32 = 90;
/// Scores at or above this floor (but below the target) are `partial`.
pub const PARTIAL_SCORE_FLOOR: u32 = 70;
/// Maximum number of images generated per page.
pub const MAX_IMAGES: usize = 4;
/// Fixed allowance subtracted from total time to approximate pure generation time.
const GENERATION_TIME_OFFSET_MS: u64 = 2_000;

// ────────────────────────────────────────────────────────────────────────────
// Configuration & results
// ────────────────────────────────────────────────────────────────────────────

/// Per-invocation settings. Missing fields in a JSON payload fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_attempts: u32,
    pub min_seo_score: u32,
    pub enable_images: bool,
    pub enable_optimization: bool,
    pub parallel_generation: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            min_seo_score: DEFAULT_MIN_SEO_SCORE,
            enable_images: true,
            enable_optimization: true,
            parallel_generation: true,
        }
    }
}

impl PipelineConfig {
    /// `max_attempts` of zero still allows the first validation.
    pub fn attempt_limit(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    Success,
    Partial,
    Failed,
}

impl GenerationStatus {
    /// success ⇔ score ≥ target; partial ⇔ 70 ≤ score < target; failed otherwise.
    pub fn classify(score: u32, min_seo_score: u32) -> Self {
        if score >= min_seo_score {
            GenerationStatus::Success
        } else if score >= PARTIAL_SCORE_FLOOR {
            GenerationStatus::Partial
        } else {
            GenerationStatus::Failed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Success => "success",
            GenerationStatus::Partial => "partial",
            GenerationStatus::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationMetrics {
    pub generation_time_ms: u64,
    pub total_time_ms: u64,
    pub word_count: u32,
    pub image_count: u32,
    pub seo_score: u32,
    pub attempts: u32,
}

/// Final outcome for one keyword. Never mutated after the orchestrator returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    pub run_id: Uuid,
    pub keyword: String,
    pub structure: Outline,
    pub sections: Vec<Section>,
    pub images: Vec<GeneratedImage>,
    pub content: String,
    pub seo_result: SeoResult,
    pub metrics: GenerationMetrics,
    pub status: GenerationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl GenerationResult {
    /// Result for a run that hit an unrecovered error: empty collections, zero score.
    pub fn failed(run_id: Uuid, keyword: &str, attempts: u32, total_time_ms: u64, error: String) -> Self {
        Self {
            run_id,
            keyword: keyword.to_string(),
            structure: Outline::default(),
            sections: vec![],
            images: vec![],
            content: String::new(),
            seo_result: SeoResult::empty(),
            metrics: GenerationMetrics {
                generation_time_ms: 0,
                total_time_ms,
                word_count: 0,
                image_count: 0,
                seo_score: 0,
                attempts: attempts.max(1),
            },
            status: GenerationStatus::Failed,
            url: None,
            error: Some(error),
            generated_at: Utc::now(),
        }
    }

    /// Returns the same result with its public URL attached.
    pub fn with_url(self, url: Option<String>) -> Self {
        Self { url, ..self }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// State machine
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Planning,
    SectionGeneration,
    Assembled,
    Validating,
    OptimizationNeeded,
    ImageGeneration,
    Done,
    Failed,
}

/// Transition out of `Validating`.
///
/// - target reached → stop the loop, even with attempts left
/// - below target, optimization enabled, attempts left → optimize
/// - otherwise → stop with the last score standing
pub fn next_after_validation(score: u32, attempts: u32, config: &PipelineConfig) -> PipelineState {
    if score >= config.min_seo_score {
        PipelineState::ImageGeneration
    } else if config.enable_optimization && attempts < config.attempt_limit() {
        PipelineState::OptimizationNeeded
    } else {
        PipelineState::ImageGeneration
    }
}

/// Mutable working set of a single run.
struct Run {
    outline: Outline,
    sections: Vec<Section>,
    content: String,
    seo: SeoResult,
    images: Vec<GeneratedImage>,
    attempts: u32,
}

impl Run {
    fn new() -> Self {
        Self {
            outline: Outline::default(),
            sections: vec![],
            content: String::new(),
            seo: SeoResult::empty(),
            images: vec![],
            attempts: 0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Pipeline {
    planner: StructurePlanner,
    sections: SectionGenerator,
    validator: Arc<dyn SeoValidator>,
    optimizer: ContentOptimizer,
    images: Arc<dyn ImageGenerator>,
}

impl Pipeline {
    /// `drafting` writes sections; `editing` plans structures and optimizes content.
    pub fn new(
        drafting: Arc<dyn TextGenerator>,
        editing: Arc<dyn TextGenerator>,
        validator: Arc<dyn SeoValidator>,
        images: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            planner: StructurePlanner::new(editing.clone()),
            sections: SectionGenerator::new(drafting),
            validator,
            optimizer: ContentOptimizer::new(editing),
            images,
        }
    }

    pub fn planner(&self) -> &StructurePlanner {
        &self.planner
    }

    /// Runs the full pipeline for one keyword. Never fails: errors are folded into
    /// a `failed` result.
    pub async fn generate_optimized_content(
        &self,
        keyword: &str,
        config: &PipelineConfig,
    ) -> GenerationResult {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        let mut run = Run::new();
        let mut state = PipelineState::Planning;

        info!("Pipeline {} started for '{}'", run_id, keyword);

        let mut failure = None;
        while !matches!(state, PipelineState::Done | PipelineState::Failed) {
            match self.step(state, keyword, config, &mut run).await {
                Ok(next) => state = next,
                Err(e) => {
                    error!(
                        "Pipeline {} for '{}' failed during {:?}: {}",
                        run_id, keyword, state, e
                    );
                    failure = Some(e);
                    state = PipelineState::Failed;
                }
            }
        }

        let total_time_ms = started.elapsed().as_millis() as u64;

        if let Some(e) = failure {
            return GenerationResult::failed(run_id, keyword, run.attempts, total_time_ms, e.to_string());
        }

        let status = GenerationStatus::classify(run.seo.score, config.min_seo_score);
        info!(
            "Pipeline {} finished for '{}': {} (score {}, {} attempts, {}ms)",
            run_id,
            keyword,
            status.as_str(),
            run.seo.score,
            run.attempts,
            total_time_ms
        );

        GenerationResult {
            run_id,
            keyword: keyword.to_string(),
            metrics: GenerationMetrics {
                generation_time_ms: total_time_ms.saturating_sub(GENERATION_TIME_OFFSET_MS),
                total_time_ms,
                word_count: total_word_count(&run.sections),
                image_count: run.images.len() as u32,
                seo_score: run.seo.score,
                attempts: run.attempts,
            },
            structure: run.outline,
            sections: run.sections,
            images: run.images,
            content: run.content,
            seo_result: run.seo,
            status,
            url: None,
            error: None,
            generated_at: Utc::now(),
        }
    }

    /// Executes one state and returns the next one.
    async fn step(
        &self,
        state: PipelineState,
        keyword: &str,
        config: &PipelineConfig,
        run: &mut Run,
    ) -> Result<PipelineState, PipelineError> {
        let next = match state {
            PipelineState::Planning => {
                run.outline = self.planner.plan(keyword).await?;
                PipelineState::SectionGeneration
            }

            PipelineState::SectionGeneration => {
                run.sections = self
                    .sections
                    .generate_all_sections(&run.outline, config.parallel_generation)
                    .await?;
                PipelineState::Assembled
            }

            PipelineState::Assembled => {
                // Advisory only: a warning is logged and the run continues.
                check_consistency(&run.sections, &run.outline);
                run.content = assemble(&run.sections);
                run.attempts = 1;
                PipelineState::Validating
            }

            PipelineState::Validating => {
                run.seo = self.validator.validate(&run.content, keyword);
                info!(
                    "Attempt {}/{} for '{}': SEO score {} ({}), {} blocking issues",
                    run.attempts,
                    config.attempt_limit(),
                    keyword,
                    run.seo.score,
                    run.seo.grade,
                    run.seo.blocking_issue_count()
                );
                next_after_validation(run.seo.score, run.attempts, config)
            }

            PipelineState::OptimizationNeeded => {
                match self.optimizer.optimize(&run.content, &run.seo.issues).await {
                    Ok(optimized) => {
                        let check = validate_optimized_content(&optimized, &run.content);
                        if !check.is_valid {
                            warn!(
                                "Optimized content for '{}' looks suspicious: {}",
                                keyword,
                                check.changes.join("; ")
                            );
                        }
                        run.content = optimized;
                    }
                    // The attempt is spent; the loop revalidates the current content.
                    Err(e) => warn!("Attempt {} for '{}' not optimized: {}", run.attempts, keyword, e),
                }
                run.attempts += 1;
                PipelineState::Validating
            }

            PipelineState::ImageGeneration => {
                if config.enable_images {
                    run.images = self.generate_images(&run.outline).await;
                }
                PipelineState::Done
            }

            PipelineState::Done | PipelineState::Failed => state,
        };

        Ok(next)
    }

    /// Best effort: any image failure degrades to zero images.
    async fn generate_images(&self, outline: &Outline) -> Vec<GeneratedImage> {
        match self.images.generate(&outline.keywords, MAX_IMAGES).await {
            Ok(images) => images,
            Err(e) => {
                let err = PipelineError::ImageGeneration(e.to_string());
                warn!("{} for '{}'; continuing without images", err, outline.keyword);
                vec![]
            }
        }
    }
}
