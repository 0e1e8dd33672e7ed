// All LLM prompt constants for the Generation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// System prompt for structure planning.
pub const STRUCTURE_SYSTEM: &str = "You are a senior SEO content strategist. \
    You plan the outline of landing pages before any prose is written.";

/// Structure planning prompt template.
/// Replace: {business_context}, {keyword}
pub const STRUCTURE_PROMPT_TEMPLATE: &str = r#"{business_context}

Plan the outline of an SEO landing page targeting the keyword: "{keyword}"

Return a JSON object with this EXACT schema:
{
  "keyword": "{keyword}",
  "sections": [
    {"title": "Introduction title", "word_count": 200, "type": "introduction"},
    {"title": "Body section title", "word_count": 400, "type": "content"},
    {"title": "Questions fréquentes", "word_count": 300, "type": "faq"},
    {"title": "Conclusion title", "word_count": 150, "type": "conclusion"}
  ],
  "keywords": ["{keyword}", "secondary keyword", "long-tail variation"],
  "total_words": 1050
}

Rules:
1. Exactly one "introduction" section first and one "conclusion" section last
2. Between 3 and 6 "content" sections, optionally one "faq" section before the conclusion
3. The whole page should total between 1200 and 2000 words
4. "total_words" MUST equal the sum of every section's "word_count"
5. "keywords" starts with the main keyword followed by 4 to 8 semantically related terms
6. Section titles are written in French and read naturally — no keyword stuffing"#;

/// System prompt for section drafting.
pub const SECTION_SYSTEM: &str = "You are an expert French SEO copywriter for premium \
    chauffeur services. You write one page section at a time.";

/// Section drafting prompt template.
/// Replace: {business_context}, {title}, {section_type}, {word_count}, {min_words},
///          {max_words}, {main_keyword}, {keywords}
pub const SECTION_PROMPT_TEMPLATE: &str = r#"{business_context}

Write the "{section_type}" section titled "{title}".

CONSTRAINTS:
- Length: {word_count} words (acceptable range {min_words}–{max_words}, ±10%)
- Main keyword: "{main_keyword}" with a keyword density between 0.8% and 1.2%
- Weave in these related keywords naturally: {keywords}
- Include exactly ONE verifiable statistic
- Include ONE concrete example (a typical ride, a customer situation)
- Professional, reassuring tone
- HTML uses <h2> for the section title, <h3> for sub-headings, <p>, <ul>/<li>, and
  <a href="/..."> for internal links. Only the introduction may use a single <h1>.

Return ONE JSON object with this EXACT schema and nothing else:
{
  "title": "{title}",
  "content": "Plain-text prose of the section (at least 300 characters)",
  "html": "<h2>{title}</h2><p>...</p>",
  "word_count": {word_count},
  "keywords": ["keywords actually used"],
  "readability_score": 65,
  "has_cta": false,
  "internal_links": ["/reservation"],
  "images": [{"alt": "Alt text", "position": "after-title", "description": "What the image shows"}]
}

"readability_score" is a Flesch reading-ease estimate between 0 and 100."#;
