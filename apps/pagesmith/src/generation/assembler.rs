//! Content Assembler: pure functions over validated sections. No I/O.

use tracing::warn;

use crate::generation::models::{Outline, Section, SectionType};

/// Divider inserted after body sections.
pub const SECTION_DIVIDER: &str = "<hr class=\"section-divider\">";

/// Relative tolerance between assembled and planned word counts.
const WORD_COUNT_TOLERANCE: f64 = 0.15;

/// Concatenates section HTML in input order, separated by blank lines.
/// A divider follows every `content` section except the last section.
pub fn assemble(sections: &[Section]) -> String {
    let last = sections.len().saturating_sub(1);
    let mut parts: Vec<&str> = Vec::with_capacity(sections.len() * 2);

    for (i, section) in sections.iter().enumerate() {
        parts.push(section.html.trim());
        if section.section_type == SectionType::Content && i != last {
            parts.push(SECTION_DIVIDER);
        }
    }

    parts.join("\n\n")
}

/// Saturates at `u32::MAX` rather than wrapping.
pub fn total_word_count(sections: &[Section]) -> u32 {
    sections
        .iter()
        .fold(0u32, |acc, s| acc.saturating_add(s.word_count))
}

/// Advisory check: word count within ±15% of the plan, and both an introduction
/// and a conclusion present. Logs a warning and returns false on violation.
pub fn check_consistency(sections: &[Section], outline: &Outline) -> bool {
    let actual = total_word_count(sections) as f64;
    let expected = outline.total_words as f64;
    let mut consistent = true;

    let deviation = if expected > 0.0 {
        (actual - expected).abs() / expected
    } else {
        f64::INFINITY
    };
    if deviation > WORD_COUNT_TOLERANCE {
        warn!(
            "Consistency warning for '{}': {} words assembled vs {} planned ({:.0}% off)",
            outline.keyword,
            actual,
            expected,
            deviation * 100.0
        );
        consistent = false;
    }

    for required in [SectionType::Introduction, SectionType::Conclusion] {
        if !sections.iter().any(|s| s.section_type == required) {
            warn!(
                "Consistency warning for '{}': no {} section",
                outline.keyword,
                required.as_str()
            );
            consistent = false;
        }
    }

    consistent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{outline_fixture, section_fixture};

    fn page() -> Vec<Section> {
        vec![
            section_fixture("Intro", SectionType::Introduction, 200),
            section_fixture("Services", SectionType::Content, 400),
            section_fixture("Tarifs", SectionType::Content, 400),
            section_fixture("FAQ", SectionType::Faq, 300),
            section_fixture("Conclusion", SectionType::Conclusion, 150),
        ]
    }

    #[test]
    fn test_assemble_inserts_dividers_after_content_sections() {
        let html = assemble(&page());
        assert_eq!(html.matches(SECTION_DIVIDER).count(), 2);

        let services = html.find("Services").unwrap();
        let tarifs = html.find("Tarifs").unwrap();
        let first_divider = html.find(SECTION_DIVIDER).unwrap();
        assert!(services < first_divider && first_divider < tarifs);
    }

    #[test]
    fn test_assemble_no_divider_after_last_content_section() {
        let sections = vec![
            section_fixture("Intro", SectionType::Introduction, 200),
            section_fixture("Body", SectionType::Content, 400),
        ];
        let html = assemble(&sections);
        assert!(!html.contains(SECTION_DIVIDER));
        assert!(html.ends_with(sections[1].html.trim()));
    }

    #[test]
    fn test_assemble_separates_with_blank_lines() {
        let sections = vec![
            section_fixture("Intro", SectionType::Introduction, 200),
            section_fixture("Fin", SectionType::Conclusion, 100),
        ];
        let html = assemble(&sections);
        assert_eq!(
            html,
            format!("{}\n\n{}", sections[0].html.trim(), sections[1].html.trim())
        );
    }

    #[test]
    fn test_assemble_is_idempotent() {
        let sections = page();
        assert_eq!(assemble(&sections), assemble(&sections));
    }

    #[test]
    fn test_assemble_empty_is_empty() {
        assert_eq!(assemble(&[]), "");
    }

    #[test]
    fn test_total_word_count_sums_sections() {
        assert_eq!(total_word_count(&page()), 1450);
    }

    #[test]
    fn test_total_word_count_saturates() {
        let sections = vec![
            section_fixture("Intro", SectionType::Introduction, u32::MAX),
            section_fixture("Fin", SectionType::Conclusion, 10),
        ];
        assert_eq!(total_word_count(&sections), u32::MAX);
    }

    #[test]
    fn test_consistency_within_tolerance() {
        let mut outline = outline_fixture("VTC Nice");
        outline.total_words = 1400; // 1450 is +3.6%
        assert!(check_consistency(&page(), &outline));
    }

    #[test]
    fn test_consistency_fails_outside_tolerance() {
        let mut outline = outline_fixture("VTC Nice");
        outline.total_words = 2000; // 1450 is -27.5%
        assert!(!check_consistency(&page(), &outline));
    }

    #[test]
    fn test_consistency_requires_intro_and_conclusion() {
        let mut sections = page();
        sections.retain(|s| s.section_type != SectionType::Conclusion);
        let mut outline = outline_fixture("VTC Nice");
        outline.total_words = total_word_count(&sections);
        assert!(!check_consistency(&sections, &outline));
    }
}
