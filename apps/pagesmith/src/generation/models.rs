//! Page content data model: outlines produced by the planner and validated sections.

use serde::{Deserialize, Serialize};

/// Minimum prose length (characters) a drafted section must reach.
pub const MIN_SECTION_CONTENT_CHARS: usize = 300;

/// Upper bound on any single section's word count, planned or drafted.
pub const MAX_SECTION_WORDS: u32 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Introduction,
    Content,
    Conclusion,
    #[serde(alias = "FAQ")]
    Faq,
}

impl SectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Introduction => "introduction",
            SectionType::Content => "content",
            SectionType::Conclusion => "conclusion",
            SectionType::Faq => "faq",
        }
    }
}

/// One planned section: what to write and how long it should be.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineEntry {
    pub title: String,
    pub word_count: u32,
    #[serde(rename = "type")]
    pub section_type: SectionType,
}

/// Ordered section plan for one keyword. Immutable once produced.
///
/// `total_words` always equals the sum of the entries' targets; the planner
/// recomputes it rather than trusting the model's arithmetic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    pub keyword: String,
    pub entries: Vec<OutlineEntry>,
    pub keywords: Vec<String>,
    pub total_words: u32,
}

/// Image slot requested by a section, to be filled by the image generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageDescriptor {
    pub alt: String,
    pub position: String,
    pub description: String,
}

/// A drafted section after schema validation. Immutable after validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub content: String,
    pub html: String,
    pub word_count: u32,
    pub keywords: Vec<String>,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub readability_score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_cta: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_links: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageDescriptor>>,
}

/// An image produced by the image-generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedImage {
    pub url: String,
    pub alt: String,
    pub keyword: String,
    pub prompt: String,
}
