//! The text-generation capability the classifier depends on.
//!
//! [`TextGenerator`] is the whole contract: a prompt and two decoding
//! parameters in, a string (or a failure) out. The classifier never sees a
//! provider SDK, which keeps it testable with a scripted generator and lets
//! any [`edgequake_llm::LLMProvider`] stand behind [`LlmGenerator`].

use crate::config::ProviderSettings;
use crate::error::{DocClassError, GenerationError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Produce a completion for a prompt.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String, GenerationError>;
}

/// [`TextGenerator`] backed by an edgequake-llm chat provider.
///
/// The prompt is sent as a single user message.
#[derive(Clone)]
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }

    /// Resolve a provider from `settings` and wrap it.
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, DocClassError> {
        resolve_provider(settings).map(Self::new)
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: usize,
    ) -> Result<String, GenerationError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let options = CompletionOptions {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| GenerationError::Provider(e.to_string()))?;

        debug!(
            "Generation: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(response.content)
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, DocClassError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DocClassError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`settings.provider`) — used as-is.
/// 2. **Named provider + model** (`settings.provider_name`) — the factory
///    reads the matching API key (`OPENAI_API_KEY`, ...) from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** via [`ProviderFactory::from_env`]. Its
///    mock fallback is rejected unless `EDGEQUAKE_LLM_PROVIDER=mock`; name
///    the `"mock"` provider explicitly to get one.
pub fn resolve_provider(settings: &ProviderSettings) -> Result<Arc<dyn LLMProvider>, DocClassError> {
    if let Some(ref provider) = settings.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = settings.provider_name {
        let model = settings.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = settings.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DocClassError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    // With no credentials at all, the factory hands back its mock provider.
    if llm_provider.name() == MOCK_PROVIDER && !mock_requested() {
        return Err(DocClassError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: "No LLM credentials found in the environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, GEMINI_API_KEY, or pass --provider."
                .to_string(),
        });
    }

    Ok(llm_provider)
}

/// Name edgequake-llm gives its canned-response provider.
const MOCK_PROVIDER: &str = "mock";

fn mock_requested() -> bool {
    std::env::var("EDGEQUAKE_LLM_PROVIDER")
        .map(|p| p.eq_ignore_ascii_case(MOCK_PROVIDER))
        .unwrap_or(false)
}
