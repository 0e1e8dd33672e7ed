//! Structure Planner: turns a keyword into an ordered section outline.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::generation::models::{Outline, OutlineEntry, MAX_SECTION_WORDS};
use crate::generation::prompts::{STRUCTURE_PROMPT_TEMPLATE, STRUCTURE_SYSTEM};
use crate::llm_client::prompts::{BUSINESS_CONTEXT, JSON_ONLY_SYSTEM};
use crate::llm_client::{complete_json, CompletionRequest, TextGenerator};

/// Raw planner output before validation.
#[derive(Debug, Deserialize)]
struct RawStructure {
    #[serde(default)]
    sections: Vec<OutlineEntry>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    total_words: Option<u32>,
}

#[derive(Clone)]
pub struct StructurePlanner {
    llm: Arc<dyn TextGenerator>,
}

impl StructurePlanner {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Asks the LLM for a page outline. Any failure is fatal for the keyword.
    pub async fn plan(&self, keyword: &str) -> Result<Outline, PipelineError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(PipelineError::StructureGeneration(
                "keyword must not be empty".to_string(),
            ));
        }

        let prompt = STRUCTURE_PROMPT_TEMPLATE
            .replace("{business_context}", BUSINESS_CONTEXT)
            .replace("{keyword}", keyword);
        let request = CompletionRequest::new(format!("{STRUCTURE_SYSTEM} {JSON_ONLY_SYSTEM}"), prompt)
            .max_tokens(2048)
            .temperature(0.4);

        let raw: RawStructure = complete_json(self.llm.as_ref(), &request)
            .await
            .map_err(|e| PipelineError::StructureGeneration(format!("planner call failed: {e}")))?;

        let outline = into_outline(keyword, raw)?;
        info!(
            "Planned {} sections ({} words) for '{}'",
            outline.entries.len(),
            outline.total_words,
            keyword
        );
        Ok(outline)
    }
}

fn into_outline(keyword: &str, raw: RawStructure) -> Result<Outline, PipelineError> {
    if raw.sections.is_empty() {
        return Err(PipelineError::StructureGeneration(
            "planner returned no sections".to_string(),
        ));
    }

    if let Some(entry) = raw
        .sections
        .iter()
        .find(|e| !(1..=MAX_SECTION_WORDS).contains(&e.word_count) || e.title.trim().is_empty())
    {
        return Err(PipelineError::StructureGeneration(format!(
            "invalid outline entry '{}' ({} words, expected 1..={MAX_SECTION_WORDS})",
            entry.title, entry.word_count
        )));
    }

    let total_words = raw
        .sections
        .iter()
        .try_fold(0u32, |acc, e| acc.checked_add(e.word_count))
        .ok_or_else(|| {
            PipelineError::StructureGeneration("outline word total overflows".to_string())
        })?;
    if let Some(declared) = raw.total_words.filter(|&d| d != total_words) {
        debug!("Planner declared {declared} words but sections sum to {total_words}; using the sum");
    }

    // The main keyword always leads the keyword set.
    let mut keywords = vec![keyword.to_string()];
    for kw in raw.keywords {
        let kw = kw.trim();
        if !kw.is_empty() && !keywords.iter().any(|k| k.eq_ignore_ascii_case(kw)) {
            keywords.push(kw.to_string());
        }
    }

    Ok(Outline {
        keyword: keyword.to_string(),
        entries: raw.sections,
        keywords,
        total_words,
    })
}
