//! Section Generator: drafts one section per outline entry and validates it at the boundary.
//!
//! The model is asked for a single JSON object; the first JSON object in its answer
//! is extracted (surrounding commentary is tolerated) and checked against the section
//! schema. Any section failing here is fatal for the keyword: partial section sets are
//! never handed to the assembler.

use std::sync::Arc;

use futures::future::try_join_all;
use serde::Deserialize;
use serde_json::error::Category;
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::generation::models::{
    ImageDescriptor, Outline, OutlineEntry, Section, MAX_SECTION_WORDS, MIN_SECTION_CONTENT_CHARS,
};
use crate::generation::prompts::{SECTION_PROMPT_TEMPLATE, SECTION_SYSTEM};
use crate::llm_client::prompts::{BUSINESS_CONTEXT, JSON_ONLY_SYSTEM};
use crate::llm_client::{extract_json_object, CompletionRequest, TextGenerator};

/// Word-count tolerance given to the model around each target.
const WORD_COUNT_TOLERANCE: f32 = 0.10;

/// Section as the model returns it, before validation.
#[derive(Debug, Deserialize)]
struct RawSection {
    title: String,
    content: String,
    html: String,
    word_count: u32,
    #[serde(default)]
    keywords: Vec<String>,
    readability_score: f32,
    #[serde(default)]
    has_cta: Option<bool>,
    #[serde(default)]
    internal_links: Option<Vec<String>>,
    #[serde(default)]
    images: Option<Vec<ImageDescriptor>>,
}

#[derive(Clone)]
pub struct SectionGenerator {
    llm: Arc<dyn TextGenerator>,
}

impl SectionGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Drafts a single section. One network call per invocation.
    pub async fn generate_section(
        &self,
        entry: &OutlineEntry,
        keywords: &[String],
    ) -> Result<Section, PipelineError> {
        let request = CompletionRequest::new(
            format!("{SECTION_SYSTEM} {JSON_ONLY_SYSTEM}"),
            build_section_prompt(entry, keywords),
        )
        .max_tokens(4096)
        .temperature(0.7);

        let text = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| PipelineError::SectionGeneration {
                section: entry.title.clone(),
                reason: e.to_string(),
            })?;

        let section = parse_section(&text, entry)?;
        debug!(
            "Section '{}' drafted by {}: {} words",
            section.title,
            self.llm.provider(),
            section.word_count
        );
        Ok(section)
    }

    /// Drafts every outline entry and returns sections in outline order.
    ///
    /// With `parallel` set, all calls are in flight at once (no cap) and the first
    /// failure short-circuits the join. Otherwise entries are drafted one by one.
    pub async fn generate_all_sections(
        &self,
        outline: &Outline,
        parallel: bool,
    ) -> Result<Vec<Section>, PipelineError> {
        info!(
            "Generating {} sections for '{}' ({})",
            outline.entries.len(),
            outline.keyword,
            if parallel { "parallel" } else { "sequential" }
        );

        let sections = if parallel {
            try_join_all(
                outline
                    .entries
                    .iter()
                    .map(|entry| self.generate_section(entry, &outline.keywords)),
            )
            .await?
        } else {
            let mut sections = Vec::with_capacity(outline.entries.len());
            for entry in &outline.entries {
                sections.push(self.generate_section(entry, &outline.keywords).await?);
            }
            sections
        };

        info!("All {} sections generated for '{}'", sections.len(), outline.keyword);
        Ok(sections)
    }
}

fn build_section_prompt(entry: &OutlineEntry, keywords: &[String]) -> String {
    let target = entry.word_count as f32;
    let min_words = (target * (1.0 - WORD_COUNT_TOLERANCE)).round() as u32;
    let max_words = (target * (1.0 + WORD_COUNT_TOLERANCE)).round() as u32;
    let main_keyword = keywords.first().map(String::as_str).unwrap_or(&entry.title);

    SECTION_PROMPT_TEMPLATE
        .replace("{business_context}", BUSINESS_CONTEXT)
        .replace("{section_type}", entry.section_type.as_str())
        .replace("{title}", &entry.title)
        .replace("{word_count}", &entry.word_count.to_string())
        .replace("{min_words}", &min_words.to_string())
        .replace("{max_words}", &max_words.to_string())
        .replace("{main_keyword}", main_keyword)
        .replace("{keywords}", &keywords.join(", "))
}

/// Extracts and validates a section from raw model output.
///
/// No JSON object, or malformed JSON → `SectionParse`.
/// Well-formed JSON that does not satisfy the schema → `SectionValidation`.
fn parse_section(text: &str, entry: &OutlineEntry) -> Result<Section, PipelineError> {
    let json = extract_json_object(text).ok_or_else(|| PipelineError::SectionParse {
        section: entry.title.clone(),
        reason: "no JSON object found in response".to_string(),
    })?;

    let raw: RawSection = serde_json::from_str(json).map_err(|e| match e.classify() {
        Category::Data => PipelineError::SectionValidation {
            section: entry.title.clone(),
            reason: e.to_string(),
        },
        _ => PipelineError::SectionParse {
            section: entry.title.clone(),
            reason: e.to_string(),
        },
    })?;

    validate_section(raw, entry)
}

fn validate_section(raw: RawSection, entry: &OutlineEntry) -> Result<Section, PipelineError> {
    let invalid = |reason: String| PipelineError::SectionValidation {
        section: entry.title.clone(),
        reason,
    };

    let content_chars = raw.content.trim().chars().count();
    if content_chars < MIN_SECTION_CONTENT_CHARS {
        return Err(invalid(format!(
            "content is {content_chars} characters, minimum is {MIN_SECTION_CONTENT_CHARS}"
        )));
    }
    if raw.html.trim().is_empty() {
        return Err(invalid("html is empty".to_string()));
    }
    if raw.title.trim().is_empty() {
        return Err(invalid("title is empty".to_string()));
    }
    if !(0.0..=100.0).contains(&raw.readability_score) {
        return Err(invalid(format!(
            "readability_score {} is outside [0, 100]",
            raw.readability_score
        )));
    }
    if !(1..=MAX_SECTION_WORDS).contains(&raw.word_count) {
        return Err(invalid(format!(
            "word_count {} is outside [1, {MAX_SECTION_WORDS}]",
            raw.word_count
        )));
    }

    // The outline, not the model, decides the section type.
    Ok(Section {
        title: raw.title,
        content: raw.content,
        html: raw.html,
        word_count: raw.word_count,
        keywords: raw.keywords,
        section_type: entry.section_type,
        readability_score: raw.readability_score,
        has_cta: raw.has_cta,
        internal_links: raw.internal_links,
        images: raw.images,
    })
}
