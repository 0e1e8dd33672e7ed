//! Shared fakes and fixtures for unit tests.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::config::Config;
use crate::generation::models::{GeneratedImage, Outline, OutlineEntry, Section, SectionType};
use crate::images::{ImageError, ImageGenerator};
use crate::llm_client::{CompletionRequest, LlmError, TextGenerator};
use crate::pipeline::{GenerationMetrics, GenerationResult, GenerationStatus, Pipeline};
use crate::seo::{grade_for, HeuristicSeoValidator, SeoIssue, SeoResult, SeoValidator, Severity};
use crate::state::AppState;

type Responder = Box<dyn Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync>;

/// Text generator answering from a closure and counting calls.
pub struct FakeLlm {
    responder: Responder,
    calls: AtomicUsize,
}

impl FakeLlm {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always answers with the same text.
    pub fn replying(text: String) -> Self {
        Self::new(move |_| Ok(text.clone()))
    }

    /// Invokes the responder without counting a call.
    pub fn respond(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        (self.responder)(request)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for FakeLlm {
    fn provider(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.respond(request)
    }
}

/// Editing model stand-in: plans outlines and returns an optimized page.
pub fn editing_llm() -> FakeLlm {
    FakeLlm::new(|request| {
        if request.system.contains("SEO editor") {
            Ok("<h1>Contenu optimisé</h1>\n<h2>Services</h2>\n<p>Texte optimisé.</p>".to_string())
        } else {
            let keyword = request
                .prompt
                .split("targeting the keyword: \"")
                .nth(1)
                .and_then(|rest| rest.split('"').next())
                .unwrap_or("VTC");
            Ok(structure_json(keyword))
        }
    })
}

/// Validator replaying a fixed list of results; the last one repeats.
pub struct ScriptedValidator {
    results: Vec<SeoResult>,
    calls: AtomicUsize,
}

impl ScriptedValidator {
    pub fn new(results: Vec<SeoResult>) -> Self {
        Self {
            results,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SeoValidator for ScriptedValidator {
    fn validate(&self, _content: &str, _keyword: &str) -> SeoResult {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.results.len() {
            0 => SeoResult::empty(),
            len => self.results[index.min(len - 1)].clone(),
        }
    }
}

pub struct FakeImages {
    fail: bool,
    calls: AtomicUsize,
}

impl FakeImages {
    pub fn succeeding() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeImages {
    async fn generate(
        &self,
        keywords: &[String],
        count: usize,
    ) -> Result<Vec<GeneratedImage>, ImageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ImageError::AllFailed {
                requested: count,
                last: "prediction failed".to_string(),
            });
        }
        Ok(keywords
            .iter()
            .take(count)
            .enumerate()
            .map(|(i, kw)| image_fixture(kw, i))
            .collect())
    }
}

fn image_fixture(keyword: &str, index: usize) -> GeneratedImage {
    GeneratedImage {
        url: format!("https://replicate.delivery/fake/{index}.webp"),
        alt: format!("{keyword} – chauffeur privé"),
        keyword: keyword.to_string(),
        prompt: format!("photo {keyword}"),
    }
}

pub fn issue(issue_type: &str, severity: Severity) -> SeoIssue {
    SeoIssue {
        issue_type: issue_type.to_string(),
        severity,
        message: format!("{issue_type} needs attention"),
        impact: "Lower ranking".to_string(),
        solution: format!("Fix {issue_type}"),
        location: None,
        snippet: None,
    }
}

/// Result with one issue per listed severity.
pub fn seo_result(score: u32, severities: &[Severity]) -> SeoResult {
    let issues: Vec<SeoIssue> = severities
        .iter()
        .enumerate()
        .map(|(i, s)| issue(&format!("issue_{i}"), *s))
        .collect();
    SeoResult {
        score,
        grade: grade_for(score).to_string(),
        recommendations: issues.iter().map(|i| i.solution.clone()).collect(),
        failed_checks: issues.iter().map(|i| i.issue_type.clone()).collect(),
        passed_checks: vec!["h1".to_string()],
        issues,
    }
}

pub fn structure_json(keyword: &str) -> String {
    serde_json::json!({
        "keyword": keyword,
        "sections": [
            {"title": "Votre chauffeur privé", "word_count": 200, "type": "introduction"},
            {"title": "Accueil à l'aéroport", "word_count": 400, "type": "content"},
            {"title": "Une flotte haut de gamme", "word_count": 350, "type": "content"},
            {"title": "Tarifs et réservation", "word_count": 350, "type": "content"},
            {"title": "Questions fréquentes", "word_count": 250, "type": "FAQ"},
            {"title": "Réservez votre trajet", "word_count": 150, "type": "conclusion"}
        ],
        "keywords": [keyword, "chauffeur privé", "transfert aéroport", "berline"],
        "total_words": 1700
    })
    .to_string()
}

pub fn outline_fixture(keyword: &str) -> Outline {
    let entry = |title: &str, word_count: u32, section_type: SectionType| OutlineEntry {
        title: title.to_string(),
        word_count,
        section_type,
    };
    let entries = vec![
        entry("Votre chauffeur privé", 200, SectionType::Introduction),
        entry("Accueil à l'aéroport", 400, SectionType::Content),
        entry("Une flotte haut de gamme", 400, SectionType::Content),
        entry("Questions fréquentes", 300, SectionType::Faq),
        entry("Réservez votre trajet", 150, SectionType::Conclusion),
    ];
    Outline {
        keyword: keyword.to_string(),
        total_words: entries.iter().map(|e| e.word_count).sum(),
        entries,
        keywords: vec![
            keyword.to_string(),
            "chauffeur privé".to_string(),
            "transfert aéroport".to_string(),
        ],
    }
}

const SECTION_PROSE: &str = "Votre chauffeur privé vous attend dans le hall des arrivées avec une \
    pancarte à votre nom. Il suit votre vol en temps réel et adapte l'heure de prise en charge en \
    cas de retard, sans frais supplémentaires. Plus de 90 % de nos clients réservent à nouveau \
    après un premier trajet. La berline est climatisée, l'eau est offerte et le wifi est \
    disponible pendant tout le parcours.";

/// A valid section answer as the drafting model would return it.
pub fn section_json(title: &str) -> String {
    serde_json::json!({
        "title": title,
        "content": SECTION_PROSE,
        "html": format!("<h2>{title}</h2><p>{SECTION_PROSE}</p>"),
        "word_count": 300,
        "keywords": ["chauffeur privé"],
        "readability_score": 65,
        "has_cta": false,
        "internal_links": ["/reservation"],
        "images": [{"alt": "Berline", "position": "after-title", "description": "Berline noire"}]
    })
    .to_string()
}

pub fn section_fixture(title: &str, section_type: SectionType, word_count: u32) -> Section {
    let content = "Texte de démonstration pour la mise en page.";
    Section {
        title: title.to_string(),
        content: content.to_string(),
        html: format!("<h2>{title}</h2><p>{content}</p>"),
        word_count,
        keywords: vec![],
        section_type,
        readability_score: 60.0,
        has_cta: None,
        internal_links: None,
        images: None,
    }
}

/// A page satisfying every rubric check for `keyword`.
pub fn well_optimized_page(keyword: &str) -> String {
    const FILLER: [&str; 3] = [
        "Notre chauffeur vous attend à l'arrivée avec une pancarte nominative.",
        "Vos bagages sont chargés dès votre arrivée au terminal principal.",
        "Le tarif est fixé à la réservation sans aucun supplément.",
    ];
    const HEADINGS: [&str; 3] = [
        "Accueil personnalisé à l'arrivée",
        "Des tarifs clairs et fixes",
        "Un service disponible toute l'année",
    ];

    let mut html = format!(
        "<meta name=\"description\" content=\"Réservez votre {keyword} : chauffeur privé ponctuel, \
         berline haut de gamme et prix fixe annoncé avant chaque trajet, de jour comme de nuit.\">\n\
         <h1>{keyword} : votre chauffeur privé à l'aéroport</h1>\n\
         <img src=\"/img/berline.jpg\" alt=\"Berline noire devant le terminal\">\n"
    );

    for i in 0..9 {
        if i % 3 == 0 {
            html.push_str(&format!("<h2>{}</h2>\n", HEADINGS[i / 3]));
        }
        let mut paragraph: Vec<String> = (0..9).map(|j| FILLER[(i + j) % 3].to_string()).collect();
        paragraph.push(format!("Le service {keyword} reste disponible jour et nuit."));
        html.push_str(&format!("<p>{}</p>\n", paragraph.join(" ")));
    }

    html.push_str(
        "<p>Consultez nos <a href=\"/tarifs\">tarifs</a> ou passez par la \
         <a href=\"/reservation\">réservation en ligne</a>.</p>",
    );
    html
}

/// A finished result for export and HTTP tests.
pub fn generation_result(keyword: &str, status: GenerationStatus, score: u32) -> GenerationResult {
    let outline = outline_fixture(keyword);
    let sections = vec![
        section_fixture("Votre chauffeur privé", SectionType::Introduction, 200),
        section_fixture("Réservez votre trajet", SectionType::Conclusion, 150),
    ];
    let images = vec![image_fixture(keyword, 0), image_fixture(keyword, 1)];
    GenerationResult {
        run_id: Uuid::new_v4(),
        keyword: keyword.to_string(),
        content: format!("<h1>{keyword}</h1>\n<p>Contenu</p>"),
        seo_result: seo_result(score, &[]),
        metrics: GenerationMetrics {
            generation_time_ms: 3_000,
            total_time_ms: 5_000,
            word_count: sections.iter().map(|s| s.word_count).sum(),
            image_count: images.len() as u32,
            seo_score: score,
            attempts: 1,
        },
        structure: outline,
        sections,
        images,
        status,
        url: None,
        error: None,
        generated_at: Utc::now(),
    }
}

/// App state over fakes: every page scores 92, the rubric endpoint uses the real validator.
pub fn test_state(output_dir: PathBuf) -> AppState {
    let config = Config {
        anthropic_api_key: "test-anthropic".to_string(),
        openai_api_key: "test-openai".to_string(),
        replicate_api_token: "test-replicate".to_string(),
        output_dir,
        site_base_url: Some("https://vtc.example".to_string()),
        port: 0,
        rust_log: "info".to_string(),
    };
    let pipeline = Pipeline::new(
        Arc::new(FakeLlm::new(|_| Ok(section_json("Section")))),
        Arc::new(editing_llm()),
        Arc::new(ScriptedValidator::new(vec![seo_result(92, &[])])),
        Arc::new(FakeImages::succeeding()),
    );
    AppState {
        config,
        pipeline: Arc::new(pipeline),
        validator: Arc::new(HeuristicSeoValidator),
    }
}
