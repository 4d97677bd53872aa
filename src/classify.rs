//! Classification entry point.
//!
//! ```text
//! taxonomy + text ─▶ build_prompt ─▶ generate ─▶ parse ─▶ validate ─▶ result
//! ```
//!
//! One attempt per call. A failed generation becomes the `"Error"` sentinel
//! result; an answer naming no taxonomy member becomes `"Unclassifiable"`.
//! Neither is an `Err`.

use crate::config::ClassifierConfig;
use crate::error::DocClassError;
use crate::extract::TextExtractor;
use crate::generate::{LlmGenerator, TextGenerator};
use crate::pipeline::input::DocumentKind;
use crate::prompts::build_prompt;
use crate::response::{self, ClassificationResult};
use crate::taxonomy::Taxonomy;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Classifies document text against a taxonomy with a [`TextGenerator`].
///
/// Holds no per-request state; share one instance across requests.
#[derive(Clone)]
pub struct Classifier {
    generator: Arc<dyn TextGenerator>,
    config: ClassifierConfig,
}

impl Classifier {
    pub fn new(generator: Arc<dyn TextGenerator>, config: ClassifierConfig) -> Self {
        Self { generator, config }
    }

    /// Build a classifier on the provider described by `config`.
    pub fn from_config(config: ClassifierConfig) -> Result<Self, DocClassError> {
        let generator = LlmGenerator::from_settings(&config.provider)?;
        Ok(Self::new(Arc::new(generator), config))
    }

    /// The prompt [`Classifier::classify`] would send for `document_text`.
    pub fn prompt(&self, taxonomy: &Taxonomy, document_text: &str) -> String {
        build_prompt(taxonomy, document_text, self.config.language)
    }

    /// Classify `document_text` into one of `taxonomy`'s types.
    pub async fn classify(&self, taxonomy: &Taxonomy, document_text: &str) -> ClassificationResult {
        let start = Instant::now();
        let prompt = self.prompt(taxonomy, document_text);
        debug!(
            "Classification prompt: {} chars for {} types",
            prompt.len(),
            taxonomy.len()
        );

        let raw = match self
            .generator
            .generate(&prompt, self.config.temperature, self.config.max_tokens)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Error during classification: {}", e);
                return ClassificationResult::error(e);
            }
        };

        let parsed = response::parse(raw.trim());
        let result = response::validate(parsed, taxonomy);

        info!(
            "Classified as '{}' in {}ms",
            result.doc_type,
            start.elapsed().as_millis()
        );
        result
    }

    /// Extract the text of the file at `path` and classify it.
    ///
    /// Extraction failures are returned as `Err`; generation failures are
    /// still reported through the `"Error"` sentinel.
    pub async fn classify_file(
        &self,
        extractor: &dyn TextExtractor,
        taxonomy: &Taxonomy,
        path: &Path,
    ) -> Result<ClassificationResult, DocClassError> {
        let kind = DocumentKind::from_path(path)?;
        let text = extractor.extract(path, kind).await?;
        Ok(self.classify(taxonomy, &text).await)
    }
}
