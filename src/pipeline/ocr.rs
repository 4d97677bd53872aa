//! Vision-model OCR: transcribe one page image to plain text.
//!
//! All prompt wording lives in [`crate::prompts`]; this module only builds
//! the message list and drives the retry loop.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors are transient under concurrent load. Exponential
//! backoff (`retry_backoff_ms * 2^attempt`) gives 500 ms → 1 s → 2 s with
//! the defaults.

use crate::config::ExtractionConfig;
use crate::error::PageError;
use crate::prompts::OCR_SYSTEM_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Transcribe a single image. `page_num` is 1-indexed and only used for
/// logging and errors (images count as page 1).
pub async fn transcribe(
    provider: &Arc<dyn LLMProvider>,
    page_num: usize,
    image_data: ImageData,
    config: &ExtractionConfig,
) -> Result<String, PageError> {
    let start = Instant::now();
    let messages = vec![
        ChatMessage::system(OCR_SYSTEM_PROMPT),
        ChatMessage::user_with_images("", vec![image_data]),
    ];
    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config
                .retry_backoff_ms
                .saturating_mul(2u64.saturating_pow(attempt - 1));
            warn!(
                "Page {}: OCR retry {}/{} after {}ms",
                page_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "Page {}: OCR {} input tokens, {} output tokens, {:?}",
                    page_num,
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                return Ok(response.content);
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!("Page {}: OCR attempt {} failed — {}", page_num, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(PageError::OcrFailed {
        page: page_num,
        retries: config.max_retries,
        detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.ocr_temperature),
        max_tokens: Some(config.ocr_max_tokens),
        ..Default::default()
    }
}
