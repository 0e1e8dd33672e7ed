//! Heuristic SEO rubric over raw HTML.
//!
//! Algorithm:
//! 1. Extract headings, meta tags, images, and links with regexes (no DOM).
//! 2. Reduce the HTML to visible text for word, keyword, and sentence statistics.
//! 3. Run every check; each check lands in exactly one of passed/failed.
//! 4. score = 100 − Σ severity penalty, floored at 0.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::seo::{grade_for, SeoIssue, SeoResult, SeoValidator, Severity};

const TITLE_MIN_CHARS: usize = 30;
const TITLE_MAX_CHARS: usize = 65;
const META_MIN_CHARS: usize = 120;
const META_MAX_CHARS: usize = 160;
const DENSITY_MIN_PCT: f64 = 0.5;
const DENSITY_MAX_PCT: f64 = 2.5;
const MIN_H2_COUNT: usize = 2;
const MIN_INTERNAL_LINKS: usize = 2;
const SENTENCE_WORDS_SOFT_MAX: f64 = 20.0;
const SENTENCE_WORDS_HARD_MAX: f64 = 25.0;
const MIN_WORDS_CRITICAL: usize = 300;
const MIN_WORDS_RECOMMENDED: usize = 800;

static H1_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<h1\b[^>]*>(.*?)</h1>").expect("Invalid h1 regex"));
static H2_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<h2\b").expect("Invalid h2 regex"));
static TITLE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<title\b[^>]*>(.*?)</title>").expect("Invalid title regex"));
static META_TAG_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<meta\b[^>]*\bname\s*=\s*["']description["'][^>]*>"#)
        .expect("Invalid meta regex")
});
static CONTENT_ATTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\bcontent\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid content regex")
});
static PARAGRAPH_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("Invalid paragraph regex"));
static IMG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<img\b[^>]*>").expect("Invalid img regex"));
static ALT_ATTR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)\balt\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("Invalid alt regex")
});
static HREF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*\bhref\s*=\s*["']([^"']+)["']"#).expect("Invalid href regex")
});
static BLOCK_END_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)</(?:h[1-6]|p|li|ul|ol|div|section|blockquote)>|<br\s*/?>|<hr\b[^>]*>")
        .expect("Invalid block regex")
});
static NON_TEXT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<(script|style|title|head)\b[^>]*>.*?</(?:script|style|title|head)>")
        .expect("Invalid non-text regex")
});
static TAG_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("Invalid tag regex"));
static INLINE_SPACE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\r]+").expect("Invalid whitespace regex"));

/// Default deterministic rubric. Stateless; cheap to share.
#[derive(Debug, Clone, Default)]
pub struct HeuristicSeoValidator;

impl SeoValidator for HeuristicSeoValidator {
    fn validate(&self, content: &str, keyword: &str) -> SeoResult {
        let page = PageFacts::extract(content, keyword);
        let mut report = Report::default();

        check_h1(&page, &mut report);
        check_keyword_in_h1(&page, &mut report);
        check_title_length(&page, &mut report);
        check_meta_description(&page, &mut report);
        check_keyword_density(&page, &mut report);
        check_heading_structure(&page, &mut report);
        check_image_alt(&page, &mut report);
        check_internal_links(&page, &mut report);
        check_readability(&page, &mut report);
        check_content_length(&page, &mut report);

        report.finish()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction
// ────────────────────────────────────────────────────────────────────────────

struct PageFacts {
    keyword: String,
    h1s: Vec<String>,
    title: Option<String>,
    meta_description: Option<String>,
    first_paragraph: Option<String>,
    h2_count: usize,
    images_total: usize,
    images_without_alt: usize,
    internal_links: usize,
    word_count: usize,
    keyword_occurrences: usize,
    sentence_count: usize,
}

impl PageFacts {
    fn extract(html: &str, keyword: &str) -> Self {
        let h1s: Vec<String> = H1_PATTERN
            .captures_iter(html)
            .map(|c| to_plain_text(&c[1]).trim().to_string())
            .collect();

        let title = TITLE_PATTERN
            .captures(html)
            .map(|c| to_plain_text(&c[1]).trim().to_string())
            .filter(|t| !t.is_empty());

        let meta_description = META_TAG_PATTERN.find(html).and_then(|tag| {
            CONTENT_ATTR_PATTERN.captures(tag.as_str()).map(|c| {
                c.get(1)
                    .or_else(|| c.get(2))
                    .map(|m| decode_entities(m.as_str()).trim().to_string())
                    .unwrap_or_default()
            })
        });

        let first_paragraph = PARAGRAPH_PATTERN
            .captures(html)
            .map(|c| to_plain_text(&c[1]).trim().to_string())
            .filter(|p| !p.is_empty());

        let images: Vec<&str> = IMG_PATTERN.find_iter(html).map(|m| m.as_str()).collect();
        let images_without_alt = images
            .iter()
            .filter(|tag| {
                ALT_ATTR_PATTERN
                    .captures(tag)
                    .and_then(|c| c.get(1).or_else(|| c.get(2)))
                    .map(|alt| alt.as_str().trim().is_empty())
                    .unwrap_or(true)
            })
            .count();

        let internal_links = HREF_PATTERN
            .captures_iter(html)
            .filter(|c| is_internal_href(&c[1]))
            .count();

        let text = to_plain_text(html);
        let words: Vec<&str> = text.split_whitespace().filter(|w| is_word(w)).collect();

        let keyword_lower = keyword.trim().to_lowercase();
        let keyword_occurrences = if keyword_lower.is_empty() {
            0
        } else {
            text.to_lowercase().matches(&keyword_lower).count()
        };

        let sentence_count = text
            .split(is_sentence_break)
            .filter(|s| s.split_whitespace().any(is_word))
            .count();

        Self {
            keyword: keyword.trim().to_string(),
            h1s,
            title,
            meta_description,
            first_paragraph,
            h2_count: H2_PATTERN.find_iter(html).count(),
            images_total: images.len(),
            images_without_alt,
            internal_links,
            word_count: words.len(),
            keyword_occurrences,
            sentence_count,
        }
    }

    /// `<title>` wins over the first H1.
    fn effective_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .or_else(|| self.h1s.first().map(String::as_str))
            .filter(|t| !t.is_empty())
    }

    fn keyword_density_pct(&self) -> f64 {
        if self.word_count == 0 {
            return 0.0;
        }
        self.keyword_occurrences as f64 / self.word_count as f64 * 100.0
    }

    fn mean_sentence_words(&self) -> f64 {
        if self.sentence_count == 0 {
            return 0.0;
        }
        self.word_count as f64 / self.sentence_count as f64
    }
}

/// Reduces HTML to visible text. Block-level boundaries become newlines so that
/// headings and list items count as their own sentences.
fn to_plain_text(html: &str) -> String {
    let without_hidden = NON_TEXT_PATTERN.replace_all(html, " ");
    let with_breaks = BLOCK_END_PATTERN.replace_all(&without_hidden, "\n");
    let without_tags = TAG_PATTERN.replace_all(&with_breaks, " ");
    let decoded = decode_entities(&without_tags);
    INLINE_SPACE_PATTERN.replace_all(&decoded, " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

fn is_sentence_break(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '\n')
}

fn is_word(token: &str) -> bool {
    token.chars().any(char::is_alphanumeric)
}

fn is_internal_href(href: &str) -> bool {
    let href = href.trim();
    !(href.is_empty()
        || href.starts_with('#')
        || href.contains("://")
        || href.starts_with("//")
        || href.starts_with("mailto:")
        || href.starts_with("tel:"))
}

fn snippet(text: &str) -> String {
    let mut s: String = text.chars().take(80).collect();
    if text.chars().count() > 80 {
        s.push('…');
    }
    s
}

// ────────────────────────────────────────────────────────────────────────────
// Checks
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Report {
    issues: Vec<SeoIssue>,
    passed: Vec<String>,
    failed: Vec<String>,
}

impl Report {
    fn pass(&mut self, check: &str) {
        self.passed.push(check.to_string());
    }

    fn fail(&mut self, check: &str, issue: SeoIssue) {
        self.failed.push(check.to_string());
        self.issues.push(issue);
    }

    fn finish(self) -> SeoResult {
        let penalty: u32 = self.issues.iter().map(|i| i.severity.penalty()).sum();
        let score = 100u32.saturating_sub(penalty);

        let mut recommendations: Vec<String> = Vec::new();
        for issue in &self.issues {
            if !recommendations.contains(&issue.solution) {
                recommendations.push(issue.solution.clone());
            }
        }

        SeoResult {
            score,
            grade: grade_for(score).to_string(),
            issues: self.issues,
            recommendations,
            passed_checks: self.passed,
            failed_checks: self.failed,
        }
    }
}

fn issue(
    issue_type: &str,
    severity: Severity,
    message: String,
    impact: &str,
    solution: &str,
) -> SeoIssue {
    SeoIssue {
        issue_type: issue_type.to_string(),
        severity,
        message,
        impact: impact.to_string(),
        solution: solution.to_string(),
        location: None,
        snippet: None,
    }
}

fn check_h1(page: &PageFacts, report: &mut Report) {
    match page.h1s.len() {
        1 => report.pass("h1"),
        0 => report.fail(
            "h1",
            issue(
                "missing_h1",
                Severity::Critical,
                "The page has no <h1> heading".to_string(),
                "Search engines cannot identify the main topic of the page",
                "Add a single <h1> at the top of the page containing the main keyword",
            ),
        ),
        n => report.fail(
            "h1",
            SeoIssue {
                location: Some("<h1>".to_string()),
                ..issue(
                    "multiple_h1",
                    Severity::High,
                    format!("The page has {n} <h1> headings"),
                    "Competing main headings dilute the topical signal",
                    "Keep one <h1> and demote the others to <h2>",
                )
            },
        ),
    }
}

fn check_keyword_in_h1(page: &PageFacts, report: &mut Report) {
    let keyword = page.keyword.to_lowercase();
    let found = page
        .h1s
        .first()
        .map(|h1| h1.to_lowercase().contains(&keyword))
        .unwrap_or(false);

    if found {
        report.pass("keyword_in_h1");
    } else {
        report.fail(
            "keyword_in_h1",
            SeoIssue {
                location: Some("<h1>".to_string()),
                snippet: page.h1s.first().map(|h| snippet(h)),
                ..issue(
                    "keyword_missing_in_h1",
                    Severity::High,
                    format!("The main heading does not contain \"{}\"", page.keyword),
                    "The strongest on-page relevance signal is wasted",
                    "Rewrite the <h1> so it contains the exact main keyword",
                )
            },
        );
    }
}

fn check_title_length(page: &PageFacts, report: &mut Report) {
    let Some(title) = page.effective_title() else {
        report.fail(
            "title_length",
            issue(
                "title_length",
                Severity::Medium,
                "No title could be determined (no <title> or <h1>)".to_string(),
                "Search results will show an auto-generated title",
                "Provide a title between 30 and 65 characters",
            ),
        );
        return;
    };

    let len = title.chars().count();
    if (TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        report.pass("title_length");
    } else {
        report.fail(
            "title_length",
            SeoIssue {
                snippet: Some(snippet(title)),
                ..issue(
                    "title_length",
                    Severity::Medium,
                    format!("Title is {len} characters (expected {TITLE_MIN_CHARS}–{TITLE_MAX_CHARS})"),
                    "Titles outside this range are truncated or look thin in search results",
                    "Adjust the title to 30–65 characters, keyword first",
                )
            },
        );
    }
}

fn check_meta_description(page: &PageFacts, report: &mut Report) {
    match (&page.meta_description, &page.first_paragraph) {
        (Some(meta), _) => {
            let len = meta.chars().count();
            if (META_MIN_CHARS..=META_MAX_CHARS).contains(&len) {
                report.pass("meta_description");
            } else {
                report.fail(
                    "meta_description",
                    SeoIssue {
                        location: Some("<meta name=\"description\">".to_string()),
                        snippet: Some(snippet(meta)),
                        ..issue(
                            "meta_description",
                            Severity::Medium,
                            format!(
                                "Meta description is {len} characters (expected {META_MIN_CHARS}–{META_MAX_CHARS})"
                            ),
                            "Search engines rewrite or truncate descriptions outside this range",
                            "Write a 120–160 character description including the keyword and a call to action",
                        )
                    },
                );
            }
        }
        (None, Some(paragraph)) if paragraph.chars().count() >= META_MIN_CHARS => report.fail(
            "meta_description",
            issue(
                "meta_description",
                Severity::Low,
                "No meta description; the first paragraph will be used instead".to_string(),
                "The search snippet is left to the search engine",
                "Add a <meta name=\"description\"> of 120–160 characters",
            ),
        ),
        _ => report.fail(
            "meta_description",
            issue(
                "meta_description",
                Severity::High,
                "No meta description and no usable opening paragraph".to_string(),
                "Search results will show an arbitrary text fragment",
                "Add a <meta name=\"description\"> of 120–160 characters",
            ),
        ),
    }
}

fn check_keyword_density(page: &PageFacts, report: &mut Report) {
    let density = page.keyword_density_pct();

    if density < DENSITY_MIN_PCT {
        report.fail(
            "keyword_density",
            issue(
                "keyword_density",
                Severity::High,
                format!(
                    "Keyword \"{}\" density is {density:.2}% ({} occurrences in {} words)",
                    page.keyword, page.keyword_occurrences, page.word_count
                ),
                "The page is unlikely to rank for its target keyword",
                "Use the exact keyword naturally in the introduction, headings, and conclusion (target ~1%)",
            ),
        );
    } else if density > DENSITY_MAX_PCT {
        report.fail(
            "keyword_density",
            issue(
                "keyword_density",
                Severity::Medium,
                format!("Keyword \"{}\" density is {density:.2}%, above {DENSITY_MAX_PCT}%", page.keyword),
                "Keyword stuffing can trigger ranking penalties",
                "Replace some exact-match occurrences with synonyms and related terms",
            ),
        );
    } else {
        report.pass("keyword_density");
    }
}

fn check_heading_structure(page: &PageFacts, report: &mut Report) {
    if page.h2_count >= MIN_H2_COUNT {
        report.pass("heading_structure");
    } else {
        report.fail(
            "heading_structure",
            issue(
                "heading_structure",
                Severity::Medium,
                format!("Only {} <h2> headings (expected at least {MIN_H2_COUNT})", page.h2_count),
                "Flat pages are harder to scan and to understand for crawlers",
                "Split the body into themed sections under <h2> headings",
            ),
        );
    }
}

fn check_image_alt(page: &PageFacts, report: &mut Report) {
    if page.images_without_alt == 0 {
        report.pass("image_alt");
    } else {
        report.fail(
            "image_alt",
            SeoIssue {
                location: Some("<img>".to_string()),
                ..issue(
                    "missing_alt_text",
                    Severity::High,
                    format!(
                        "{} of {} images have no alt text",
                        page.images_without_alt, page.images_total
                    ),
                    "Images are invisible to search engines and screen readers",
                    "Add descriptive alt text to every image, mentioning the service where relevant",
                )
            },
        );
    }
}

fn check_internal_links(page: &PageFacts, report: &mut Report) {
    if page.internal_links >= MIN_INTERNAL_LINKS {
        report.pass("internal_links");
    } else {
        report.fail(
            "internal_links",
            issue(
                "internal_links",
                Severity::Medium,
                format!(
                    "{} internal links (expected at least {MIN_INTERNAL_LINKS})",
                    page.internal_links
                ),
                "Link equity does not flow to booking and service pages",
                "Link to related pages such as /reservation or /tarifs with descriptive anchors",
            ),
        );
    }
}

fn check_readability(page: &PageFacts, report: &mut Report) {
    let mean = page.mean_sentence_words();
    let severity = if mean > SENTENCE_WORDS_HARD_MAX {
        Some(Severity::Medium)
    } else if mean > SENTENCE_WORDS_SOFT_MAX {
        Some(Severity::Low)
    } else {
        None
    };

    match severity {
        None => report.pass("readability"),
        Some(severity) => report.fail(
            "readability",
            issue(
                "readability",
                severity,
                format!("Sentences average {mean:.1} words"),
                "Long sentences reduce engagement on mobile",
                "Split long sentences; aim for 15–20 words on average",
            ),
        ),
    }
}

fn check_content_length(page: &PageFacts, report: &mut Report) {
    if page.word_count >= MIN_WORDS_RECOMMENDED {
        report.pass("content_length");
        return;
    }

    let severity = if page.word_count < MIN_WORDS_CRITICAL {
        Severity::Critical
    } else {
        Severity::Medium
    };
    report.fail(
        "content_length",
        issue(
            "content_length",
            severity,
            format!("The page has {} words", page.word_count),
            "Thin content rarely ranks on competitive local queries",
            "Expand the page to at least 800 words of useful, specific content",
        ),
    );
}
