//! Batch Runner: one orchestrator run per keyword, strictly sequential, with a
//! fixed pause between items.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::pipeline::{GenerationResult, GenerationStatus, Pipeline, PipelineConfig};

/// Pause between two keywords. Not applied after the last one.
pub const INTER_ITEM_PAUSE: Duration = Duration::from_secs(2);
/// Estimated API cost of one generated page, in EUR.
pub const COST_PER_PAGE_EUR: f64 = 0.15;

/// Anything that turns a keyword into a `GenerationResult`.
#[async_trait]
pub trait KeywordRunner: Send + Sync {
    async fn run(&self, keyword: &str, config: &PipelineConfig) -> GenerationResult;
}

#[async_trait]
impl KeywordRunner for Pipeline {
    async fn run(&self, keyword: &str, config: &PipelineConfig) -> GenerationResult {
        self.generate_optimized_content(keyword, config).await
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total: usize,
    pub successful: usize,
    pub partial: usize,
    pub failed: usize,
    /// Percentage of `success` results, 0–100.
    pub success_rate: f64,
    pub average_seo_score: f64,
    pub total_words: u64,
    pub average_words: f64,
    pub total_time_ms: u64,
    pub average_time_ms: f64,
    pub cost_estimate: f64,
}

/// Runs every keyword in order and collects the results.
///
/// A run that panics is logged and skipped: the returned list then holds fewer
/// entries than `keywords`. Every other outcome, including `failed`, is kept.
pub async fn run_batch(
    runner: &dyn KeywordRunner,
    keywords: &[String],
    config: &PipelineConfig,
) -> Vec<GenerationResult> {
    let mut results = Vec::with_capacity(keywords.len());

    for (i, keyword) in keywords.iter().enumerate() {
        info!("Batch item {}/{}: '{}'", i + 1, keywords.len(), keyword);

        match AssertUnwindSafe(runner.run(keyword, config)).catch_unwind().await {
            Ok(result) => {
                info!(
                    "Batch item '{}' finished: {} (score {})",
                    keyword,
                    result.status.as_str(),
                    result.metrics.seo_score
                );
                results.push(result);
            }
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!("Batch item '{}' aborted and skipped: {}", keyword, reason);
            }
        }

        if i + 1 < keywords.len() {
            tokio::time::sleep(INTER_ITEM_PAUSE).await;
        }
    }

    let stats = calculate_batch_stats(&results);
    info!(
        "Batch done: {}/{} results, {} success, {} partial, {} failed, avg score {:.1}",
        stats.total,
        keywords.len(),
        stats.successful,
        stats.partial,
        stats.failed,
        stats.average_seo_score
    );

    results
}

/// Aggregates a batch. All averages divide by `results.len()`; an empty list
/// yields zeroes.
pub fn calculate_batch_stats(results: &[GenerationResult]) -> BatchStats {
    let total = results.len();
    let count_status = |status: GenerationStatus| results.iter().filter(|r| r.status == status).count();
    let successful = count_status(GenerationStatus::Success);
    let partial = count_status(GenerationStatus::Partial);
    let failed = count_status(GenerationStatus::Failed);

    let total_score: u64 = results.iter().map(|r| r.metrics.seo_score as u64).sum();
    let total_words: u64 = results.iter().map(|r| r.metrics.word_count as u64).sum();
    let total_time_ms: u64 = results.iter().map(|r| r.metrics.total_time_ms).sum();

    let average = |sum: f64| if total == 0 { 0.0 } else { sum / total as f64 };

    BatchStats {
        total,
        successful,
        partial,
        failed,
        success_rate: average(successful as f64 * 100.0),
        average_seo_score: average(total_score as f64),
        total_words,
        average_words: average(total_words as f64),
        total_time_ms,
        average_time_ms: average(total_time_ms as f64),
        cost_estimate: total as f64 * COST_PER_PAGE_EUR,
    }
}
