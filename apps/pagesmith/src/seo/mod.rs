//! SEO validation: pluggable, trait-based scorer for assembled page HTML.
//!
//! Default: `HeuristicSeoValidator` (pure Rust, deterministic, no network).
//! The optimization loop relies on determinism: validating the same content twice
//! must yield the same score and issues.

use serde::{Deserialize, Serialize};

pub mod rules;

pub use rules::HeuristicSeoValidator;

// ────────────────────────────────────────────────────────────────────────────
// Output data models
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Points deducted from the 100-point score for one issue of this severity.
    pub fn penalty(&self) -> u32 {
        match self {
            Severity::Low => 2,
            Severity::Medium => 5,
            Severity::High => 10,
            Severity::Critical => 20,
        }
    }

    /// Critical and high issues are the only ones worth an optimization call.
    pub fn is_blocking(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

/// A single rubric violation. Issues are never mutated; each validation pass
/// produces a fresh list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoIssue {
    #[serde(rename = "type")]
    pub issue_type: String,
    pub severity: Severity,
    pub message: String,
    pub impact: String,
    pub solution: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoResult {
    pub score: u32, // 0 – 100
    pub grade: String,
    pub issues: Vec<SeoIssue>,
    pub recommendations: Vec<String>,
    pub passed_checks: Vec<String>,
    pub failed_checks: Vec<String>,
}

impl SeoResult {
    /// The zero-score result attached to failed pipeline runs.
    pub fn empty() -> Self {
        Self {
            score: 0,
            grade: grade_for(0).to_string(),
            issues: vec![],
            recommendations: vec![],
            passed_checks: vec![],
            failed_checks: vec![],
        }
    }

    pub fn blocking_issue_count(&self) -> usize {
        self.issues.iter().filter(|i| i.severity.is_blocking()).count()
    }
}

/// Letter grade for a 0–100 score.
pub fn grade_for(score: u32) -> &'static str {
    match score {
        90..=u32::MAX => "A",
        80..=89 => "B",
        70..=79 => "C",
        60..=69 => "D",
        _ => "F",
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// The SEO validator trait. Implement this to swap rubrics without touching the
/// orchestrator or the HTTP handlers.
///
/// Carried in `AppState` and the pipeline as `Arc<dyn SeoValidator>`.
pub trait SeoValidator: Send + Sync {
    fn validate(&self, content: &str, keyword: &str) -> SeoResult;
}
