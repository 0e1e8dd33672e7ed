//! Export: batch results as JSON or CSV, and per-page artifacts on disk.
//!
//! Page layout under the output directory:
//!   {output_dir}/{slug}/index.html        standalone HTML document
//!   {output_dir}/{slug}/seo-report.json   score, issues, metrics, status
//!   {output_dir}/{slug}/content.json      the full `GenerationResult`

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use csv::WriterBuilder;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::pipeline::{GenerationMetrics, GenerationResult, GenerationStatus};
use crate::seo::SeoResult;

pub const CSV_HEADER: [&str; 8] = [
    "Keyword",
    "Status",
    "SEO Score",
    "Word Count",
    "Image Count",
    "Generation Time",
    "Total Time",
    "Attempts",
];

const META_DESCRIPTION_MAX_CHARS: usize = 160;

static META_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta\b[^>]*\bname\s*=\s*["']description["'][^>]*>\s*"#)
        .expect("Invalid meta regex")
});
static CONTENT_ATTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid content regex")
});
static H1_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").expect("Invalid h1 regex"));
static PARAGRAPH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("Invalid paragraph regex"));
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));
static SPACE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("Invalid space regex"));

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }
}

/// Serializes a batch: pretty-printed JSON of every result, or one CSV row per result.
pub fn export_results(
    results: &[GenerationResult],
    format: ExportFormat,
) -> Result<String, ExportError> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(results)?),
        ExportFormat::Csv => export_csv(results),
    }
}

fn export_csv(results: &[GenerationResult]) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for result in results {
        let m = &result.metrics;
        writer.write_record([
            result.keyword.clone(),
            result.status.as_str().to_string(),
            m.seo_score.to_string(),
            m.word_count.to_string(),
            m.image_count.to_string(),
            m.generation_time_ms.to_string(),
            m.total_time_ms.to_string(),
            m.attempts.to_string(),
        ])?;
    }

    let bytes = writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ExportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

// ────────────────────────────────────────────────────────────────────────────
// Page artifacts
// ────────────────────────────────────────────────────────────────────────────

/// Where a page was written and, when a base URL is configured, where it is served.
#[derive(Debug, Clone, PartialEq)]
pub struct PageArtifacts {
    pub slug: String,
    pub directory: PathBuf,
    pub url: Option<String>,
}

#[derive(Serialize)]
struct SeoReport<'a> {
    keyword: &'a str,
    status: GenerationStatus,
    seo_result: &'a SeoResult,
    metrics: &'a GenerationMetrics,
    generated_at: DateTime<Utc>,
}

/// Writes the three artifacts of one page and returns their location.
pub async fn write_page_artifacts(
    output_dir: &Path,
    result: &GenerationResult,
    site_base_url: Option<&str>,
) -> Result<PageArtifacts, ExportError> {
    let slug = slugify(&result.keyword);
    let directory = output_dir.join(&slug);
    tokio::fs::create_dir_all(&directory).await?;

    let url = site_base_url.map(|base| format!("{}/{}/", base.trim_end_matches('/'), slug));
    let published = result.clone().with_url(url.clone());

    let report = SeoReport {
        keyword: &published.keyword,
        status: published.status,
        seo_result: &published.seo_result,
        metrics: &published.metrics,
        generated_at: published.generated_at,
    };

    tokio::fs::write(directory.join("index.html"), render_page_html(&published)).await?;
    tokio::fs::write(
        directory.join("seo-report.json"),
        serde_json::to_string_pretty(&report)?,
    )
    .await?;
    tokio::fs::write(
        directory.join("content.json"),
        serde_json::to_string_pretty(&published)?,
    )
    .await?;

    info!("Wrote page artifacts for '{}' to {}", result.keyword, directory.display());

    Ok(PageArtifacts {
        slug,
        directory,
        url,
    })
}

/// Wraps the assembled content in a standalone HTML document.
///
/// A meta description embedded in the content is moved into `<head>`; without one,
/// the first paragraph is used. The title is the H1 text, or the keyword.
pub fn render_page_html(result: &GenerationResult) -> String {
    let embedded_meta = META_TAG_PATTERN.find(&result.content).map(|m| m.as_str().to_string());
    let body = META_TAG_PATTERN.replace(&result.content, "");

    let title = H1_PATTERN
        .captures(&body)
        .map(|c| plain_text(&c[1]))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| result.keyword.clone());

    let description = embedded_meta
        .as_deref()
        .and_then(|tag| CONTENT_ATTR_PATTERN.captures(tag))
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str().to_string())
        .or_else(|| {
            PARAGRAPH_PATTERN
                .captures(&body)
                .map(|c| truncate_chars(&plain_text(&c[1]), META_DESCRIPTION_MAX_CHARS))
        })
        .unwrap_or_default();

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"fr\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!("<title>{}</title>\n", escape_html(&title)));
    html.push_str(&format!(
        "<meta name=\"description\" content=\"{}\">\n",
        escape_html(&description)
    ));
    if let Some(url) = &result.url {
        html.push_str(&format!("<link rel=\"canonical\" href=\"{}\">\n", escape_html(url)));
    }
    html.push_str("</head>\n<body>\n<main>\n");
    html.push_str(body.trim());
    html.push_str("\n</main>\n");

    if !result.images.is_empty() {
        html.push_str("<section class=\"gallery\">\n");
        for image in &result.images {
            html.push_str(&format!(
                "<figure><img src=\"{}\" alt=\"{}\" loading=\"lazy\"></figure>\n",
                escape_html(&image.url),
                escape_html(&image.alt)
            ));
        }
        html.push_str("</section>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}

/// Lowercase ASCII slug: French accents folded, alphanumeric runs joined by `-`.
pub fn slugify(text: &str) -> String {
    let mut folded = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        match c {
            'à' | 'â' | 'ä' | 'á' | 'ã' => folded.push('a'),
            'ç' => folded.push('c'),
            'é' | 'è' | 'ê' | 'ë' => folded.push('e'),
            'î' | 'ï' | 'í' => folded.push('i'),
            'ô' | 'ö' | 'ó' => folded.push('o'),
            'ù' | 'û' | 'ü' | 'ú' => folded.push('u'),
            'ÿ' => folded.push('y'),
            'ñ' => folded.push('n'),
            'œ' => folded.push_str("oe"),
            'æ' => folded.push_str("ae"),
            c => folded.push(c),
        }
    }

    let slug = folded
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "page".to_string()
    } else {
        slug
    }
}

fn plain_text(html: &str) -> String {
    let text = TAG_PATTERN.replace_all(html, " ");
    SPACE_PATTERN.replace_all(&text, " ").trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
