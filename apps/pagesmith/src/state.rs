use std::sync::Arc;

use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::seo::SeoValidator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub pipeline: Arc<Pipeline>,
    /// Pluggable SEO rubric, also used by the pipeline. Default: HeuristicSeoValidator.
    pub validator: Arc<dyn SeoValidator>,
}
