//! Content Optimizer: asks the editing model to fix blocking SEO issues.
//!
//! Only critical and high issues justify a rewrite; with none present the input is
//! returned untouched and no call is made. The rewrite is sanitized before it is
//! handed back to the orchestrator.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::PipelineError;
use crate::llm_client::prompts::BUSINESS_CONTEXT;
use crate::llm_client::{CompletionRequest, TextGenerator};
use crate::seo::SeoIssue;

pub mod prompts;

use prompts::{OPTIMIZE_PROMPT_TEMPLATE, OPTIMIZE_SYSTEM};

/// Maximum relative length change accepted by `validate_optimized_content`.
const MAX_LENGTH_CHANGE: f64 = 0.5;

/// Substrings every optimized page is expected to keep (case-insensitive).
const ESSENTIAL_ELEMENTS: [&str; 4] = ["<h1", "<h2", "<p", "<a "];

static HTML_COMMENT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").expect("Invalid comment regex"));
static COMMENT_LINE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?://|/\*|\*/|```).*(?:\n|$)").expect("Invalid comment line regex")
});
static BLANK_RUN_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("Invalid blank run regex"));

/// Advisory diagnostics for an optimized rewrite. Not a pipeline gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedContentCheck {
    pub is_valid: bool,
    pub changes: Vec<String>,
}

#[derive(Clone)]
pub struct ContentOptimizer {
    llm: Arc<dyn TextGenerator>,
}

impl ContentOptimizer {
    pub fn new(llm: Arc<dyn TextGenerator>) -> Self {
        Self { llm }
    }

    /// Rewrites `content` so the listed issues are fixed.
    ///
    /// Returns the input unchanged, without a network call, when no issue is
    /// critical or high.
    pub async fn optimize(
        &self,
        content: &str,
        issues: &[SeoIssue],
    ) -> Result<String, PipelineError> {
        let blocking = issues.iter().filter(|i| i.severity.is_blocking()).count();
        if blocking == 0 {
            debug!("No critical/high issues; skipping optimization call");
            return Ok(content.to_string());
        }

        info!(
            "Optimizing content for {} issues ({} critical/high) via {}",
            issues.len(),
            blocking,
            self.llm.provider()
        );

        let prompt = OPTIMIZE_PROMPT_TEMPLATE
            .replace("{business_context}", BUSINESS_CONTEXT)
            .replace("{issues}", &format_issues(issues))
            .replace("{content}", content);
        let request = CompletionRequest::new(OPTIMIZE_SYSTEM, prompt)
            .max_tokens(8192)
            .temperature(0.3);

        let raw = self
            .llm
            .complete(&request)
            .await
            .map_err(|e| PipelineError::Optimization(e.to_string()))?;

        let cleaned = sanitize_optimized_html(&raw);
        if cleaned.is_empty() {
            return Err(PipelineError::Optimization(
                "optimizer returned no HTML".to_string(),
            ));
        }
        Ok(cleaned)
    }
}

/// Numbered issue list for the prompt. Every field is included so the model
/// sees the impact and the expected fix, not just the symptom.
fn format_issues(issues: &[SeoIssue]) -> String {
    issues
        .iter()
        .enumerate()
        .map(|(i, issue)| {
            let mut block = format!(
                "{}. [{}] {}: {}\n   Impact: {}\n   Solution: {}",
                i + 1,
                issue.severity.as_str().to_uppercase(),
                issue.issue_type,
                issue.message,
                issue.impact,
                issue.solution
            );
            if let Some(location) = &issue.location {
                block.push_str(&format!("\n   Location: {location}"));
            }
            if let Some(snippet) = &issue.snippet {
                block.push_str(&format!("\n   Snippet: {snippet}"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strips HTML comments, comment-marker lines, and code fences, then collapses
/// runs of three or more newlines to a single blank line.
pub fn sanitize_optimized_html(raw: &str) -> String {
    let without_comments = HTML_COMMENT_PATTERN.replace_all(raw, "");
    let without_comment_lines = COMMENT_LINE_PATTERN.replace_all(&without_comments, "");
    BLANK_RUN_PATTERN
        .replace_all(&without_comment_lines, "\n\n")
        .trim()
        .to_string()
}

/// Cheap sanity check of a rewrite against the original.
pub fn validate_optimized_content(optimized: &str, original: &str) -> OptimizedContentCheck {
    let mut changes = Vec::new();
    let mut is_valid = true;

    if optimized.trim().is_empty() {
        return OptimizedContentCheck {
            is_valid: false,
            changes: vec!["Optimized content is empty".to_string()],
        };
    }

    let original_len = original.chars().count();
    let optimized_len = optimized.chars().count();
    if original_len > 0 {
        let change = (optimized_len as f64 - original_len as f64) / original_len as f64;
        changes.push(format!(
            "Length changed by {:+.0}% ({} → {} characters)",
            change * 100.0,
            original_len,
            optimized_len
        ));
        if change.abs() > MAX_LENGTH_CHANGE {
            is_valid = false;
            changes.push(format!(
                "Length change exceeds {:.0}% of the original",
                MAX_LENGTH_CHANGE * 100.0
            ));
        }
    }

    let lower = optimized.to_lowercase();
    for element in ESSENTIAL_ELEMENTS {
        if !lower.contains(element) {
            is_valid = false;
            changes.push(format!("Missing essential element {}", element.trim()));
        }
    }

    OptimizedContentCheck { is_valid, changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::seo::Severity;
    use crate::testing::{issue, FakeLlm};

    const PAGE: &str = "<h1>VTC Aéroport Nice</h1>\n<h2>Services</h2>\n<p>Texte avec <a href=\"/reservation\">lien</a>.</p>";

    #[tokio::test]
    async fn test_optimize_short_circuits_without_blocking_issues() {
        let llm = Arc::new(FakeLlm::replying("<p>should not be used</p>".to_string()));
        let optimizer = ContentOptimizer::new(llm.clone());
        let issues = vec![issue("readability", Severity::Low), issue("internal_links", Severity::Medium)];

        let result = optimizer.optimize(PAGE, &issues).await.unwrap();

        assert_eq!(result, PAGE);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_optimize_short_circuits_with_no_issues() {
        let llm = Arc::new(FakeLlm::replying(String::new()));
        let optimizer = ContentOptimizer::new(llm.clone());
        assert_eq!(optimizer.optimize(PAGE, &[]).await.unwrap(), PAGE);
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_optimize_prompt_lists_every_issue_and_sanitizes() {
        let llm = Arc::new(FakeLlm::new(|request| {
            assert!(request.prompt.contains("[CRITICAL] missing_h1"));
            assert!(request.prompt.contains("[HIGH] keyword_density"));
            assert!(request.prompt.contains("[LOW] readability"));
            assert!(request.prompt.contains("Location: <h1>"));
            Ok("<!-- fixed -->\n// corrected version\n<h1>VTC Aéroport Nice</h1>\n\n\n\n<p>ok</p>".to_string())
        }));
        let optimizer = ContentOptimizer::new(llm.clone());
        let mut critical = issue("missing_h1", Severity::Critical);
        critical.location = Some("<h1>".to_string());
        let issues = vec![
            critical,
            issue("keyword_density", Severity::High),
            issue("readability", Severity::Low),
        ];

        let result = optimizer.optimize(PAGE, &issues).await.unwrap();

        assert_eq!(result, "<h1>VTC Aéroport Nice</h1>\n\n<p>ok</p>");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_optimize_call_failure_is_optimization_error() {
        let llm = Arc::new(FakeLlm::new(|_| Err(LlmError::EmptyContent)));
        let optimizer = ContentOptimizer::new(llm);

        let err = optimizer
            .optimize(PAGE, &[issue("missing_h1", Severity::Critical)])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::Optimization(_)));
    }

    #[test]
    fn test_sanitize_strips_fences_and_comment_lines() {
        let raw = "```html\n<h1>Titre</h1>\n/* note */\n<p>Corps</p>\n```";
        assert_eq!(sanitize_optimized_html(raw), "<h1>Titre</h1>\n<p>Corps</p>");
    }

    #[test]
    fn test_sanitize_removes_multiline_html_comments() {
        let raw = "<p>a</p>\n<!-- changed:\n  - added keyword\n-->\n<p>b</p>";
        assert_eq!(sanitize_optimized_html(raw), "<p>a</p>\n\n<p>b</p>");
    }

    #[test]
    fn test_sanitize_keeps_urls_with_double_slash() {
        let raw = "<p>Voir <a href=\"https://example.com\">site</a></p>";
        assert_eq!(sanitize_optimized_html(raw), raw);
    }

    #[test]
    fn test_validate_optimized_accepts_similar_rewrite() {
        let optimized = PAGE.replace("Texte", "Texte enrichi");
        let check = validate_optimized_content(&optimized, PAGE);
        assert!(check.is_valid, "{:?}", check.changes);
    }

    #[test]
    fn test_validate_optimized_rejects_empty() {
        let check = validate_optimized_content("  ", PAGE);
        assert!(!check.is_valid);
    }

    #[test]
    fn test_validate_optimized_rejects_large_length_change() {
        let optimized = format!("{PAGE}{}", "<p>ajout</p>".repeat(40));
        let check = validate_optimized_content(&optimized, PAGE);
        assert!(!check.is_valid);
        assert!(check.changes.iter().any(|c| c.contains("exceeds")));
    }

    #[test]
    fn test_validate_optimized_reports_missing_elements_case_insensitively() {
        let original = "<H1>Titre</H1><H2>Sous-titre</H2><P>Texte <A HREF=\"/x\">lien</A></P>";
        let check = validate_optimized_content(original, original);
        assert!(check.is_valid, "{:?}", check.changes);

        let without_links = "<H1>Titre</H1><H2>Sous-titre</H2><P>Texte sans lien ici</P>";
        let check = validate_optimized_content(without_links, original);
        assert!(!check.is_valid);
        assert!(check.changes.iter().any(|c| c.contains("<a")));
    }
}
