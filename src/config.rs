//! Configuration types for classification, text extraction and serving.
//!
//! Classification and extraction are configured separately because they
//! talk to the model for different reasons: classification wants a short,
//! near-deterministic answer in a fixed format, while OCR wants a long,
//! faithful transcription of a page image. Both use builders so callers set
//! only what they care about and inherit documented defaults for the rest.

use crate::error::DocClassError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

// ── Provider selection ───────────────────────────────────────────────────

/// Which LLM provider to talk to.
///
/// Shared by [`ClassifierConfig`] and [`ExtractionConfig`] so a single CLI
/// flag or environment variable drives both.
#[derive(Clone, Default)]
pub struct ProviderSettings {
    /// LLM model identifier, e.g. "gpt-4.1-nano". If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini", "ollama").
    /// If None along with `provider`, the provider is auto-detected.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .finish()
    }
}

// ── Classification ───────────────────────────────────────────────────────

/// Language used for the classification prompt.
///
/// The parser accepts the labels of every language regardless of this
/// setting, so a model that answers in the "wrong" language is still read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PromptLanguage {
    /// French instructions, `INFORMATIONS ADDITIONNELLES:` label. (default)
    #[default]
    French,
    /// English instructions, `ADDITIONAL INFORMATION:` label.
    English,
}

/// Configuration for a classification call.
///
/// # Example
/// ```rust
/// use doctype_classifier::{ClassifierConfig, PromptLanguage};
///
/// let config = ClassifierConfig::builder()
///     .temperature(0.2)
///     .language(PromptLanguage::English)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 1000);
/// ```
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub provider: ProviderSettings,

    /// Sampling temperature. Default: 0.3.
    ///
    /// Low enough that repeated calls on the same document mostly agree,
    /// high enough to keep justifications readable.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 1000.
    ///
    /// Three labelled fields rarely need more than a few hundred tokens.
    pub max_tokens: usize,

    /// Prompt language. Default: [`PromptLanguage::French`].
    pub language: PromptLanguage,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            temperature: 0.3,
            max_tokens: 1000,
            language: PromptLanguage::default(),
        }
    }
}

impl ClassifierConfig {
    /// Create a new builder for `ClassifierConfig`.
    pub fn builder() -> ClassifierConfigBuilder {
        ClassifierConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ClassifierConfig`].
#[derive(Debug)]
pub struct ClassifierConfigBuilder {
    config: ClassifierConfig,
}

impl ClassifierConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.provider.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn language(mut self, language: PromptLanguage) -> Self {
        self.config.language = language;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClassifierConfig, DocClassError> {
        if self.config.max_tokens == 0 {
            return Err(DocClassError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Configuration for turning a PDF or image into plain text.
///
/// PDFs with a text layer never touch the model. Scanned pages and images
/// are rasterised and transcribed by a vision model, which is what the
/// rendering and retry knobs below control.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    pub provider: ProviderSettings,

    /// Rendering DPI for scanned PDF pages. Range: 72–400. Default: 150.
    pub dpi: u32,

    /// Maximum rendered image dimension in pixels. Default: 2000.
    ///
    /// Applies both to rasterised PDF pages and to uploaded images, which are
    /// downscaled before being sent to the vision model.
    pub max_rendered_pixels: u32,

    /// Number of concurrent OCR calls for scanned PDF pages. Default: 4.
    pub concurrency: usize,

    /// A PDF page whose text layer has fewer non-whitespace characters than
    /// this is treated as scanned and sent to OCR. Default: 16.
    pub min_text_chars: usize,

    /// Sampling temperature for OCR calls. Default: 0.1.
    pub ocr_temperature: f32,

    /// Maximum tokens per OCR call. Default: 4096.
    pub ocr_max_tokens: usize,

    /// Maximum retry attempts on a failed OCR call, at most
    /// [`MAX_OCR_RETRIES`]. Default: 3.
    pub max_retries: u32,

    /// Initial OCR retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            provider: ProviderSettings::default(),
            dpi: 150,
            max_rendered_pixels: 2000,
            concurrency: 4,
            min_text_chars: 16,
            ocr_temperature: 0.1,
            ocr_max_tokens: 4096,
            max_retries: 3,
            retry_backoff_ms: 500,
            password: None,
            download_timeout_secs: 120,
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Upper bound for [`ExtractionConfig::max_retries`].
pub const MAX_OCR_RETRIES: u32 = 10;

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.provider.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider.provider = Some(provider);
        self
    }

    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi.clamp(72, 400);
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn min_text_chars(mut self, n: usize) -> Self {
        self.config.min_text_chars = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(MAX_OCR_RETRIES);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, DocClassError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 400 {
            return Err(DocClassError::InvalidConfig(format!(
                "DPI must be 72–400, got {}",
                c.dpi
            )));
        }
        if c.concurrency == 0 {
            return Err(DocClassError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Configuration for the HTTP classification service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on. Default: `0.0.0.0:8000`.
    pub bind: SocketAddr,

    /// Taxonomy definition file, re-read on every request so edits apply
    /// without a restart. Default: `./Tools/list_type_doc.json`.
    pub taxonomy_path: PathBuf,

    /// Maximum accepted request body in bytes. Default: 25 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8000)),
            taxonomy_path: PathBuf::from("./Tools/list_type_doc.json"),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}
