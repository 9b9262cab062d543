use std::sync::Arc;

use crate::config::Config;
use crate::layout::LayoutConfig;
use crate::model::StrokeModel;
use crate::synthesis::{GenerationPool, GeneratorConfig, StyleLibrary, Synthesis};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Server-wide layout. Requests override fields on a clone.
    pub layout: Arc<LayoutConfig>,
    pub generator: GeneratorConfig,
    /// Loaded once at startup, shared read-only by every line generation.
    pub model: Arc<dyn StrokeModel>,
    pub styles: Arc<StyleLibrary>,
    pub pool: GenerationPool,
}

impl AppState {
    pub fn synthesis(&self) -> Synthesis<'_> {
        Synthesis {
            model: &self.model,
            styles: &self.styles,
            pool: &self.pool,
            generator: self.generator,
            timeout: self.config.generation_timeout,
        }
    }
}
