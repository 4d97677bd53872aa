//! Document-text extraction: PDF or image in, plain text out.
//!
//! ## PDFs
//!
//! The text layer of every page is read first. Pages whose layer has fewer
//! than `min_text_chars` visible characters are assumed to be scans: they are
//! rasterised and transcribed by the vision model, up to `concurrency` at a
//! time. A page whose OCR fails is logged and contributes nothing; only a
//! document with no text at all is an error.
//!
//! ## Images
//!
//! Decoded, downscaled to `max_rendered_pixels`, and transcribed in one call.

use crate::config::ExtractionConfig;
use crate::error::{DocClassError, PageError};
use crate::generate::resolve_provider;
use crate::pipeline::input::DocumentKind;
use crate::pipeline::{encode, normalize, ocr, render};
use async_trait::async_trait;
use edgequake_llm::LLMProvider;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Turn a stored document into plain text.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, DocClassError>;
}

/// Production [`TextExtractor`]: pdfium text layers with vision-model OCR
/// for scanned pages and images.
#[derive(Clone)]
pub struct DocumentExtractor {
    config: ExtractionConfig,
    /// Resolved lazily so text-layer PDFs work without any API key.
    provider: Arc<tokio::sync::OnceCell<Arc<dyn LLMProvider>>>,
}

impl DocumentExtractor {
    pub fn new(config: ExtractionConfig) -> Self {
        Self {
            config,
            provider: Arc::new(tokio::sync::OnceCell::new()),
        }
    }

    async fn provider(&self) -> Result<&Arc<dyn LLMProvider>, DocClassError> {
        self.provider
            .get_or_try_init(|| async { resolve_provider(&self.config.provider) })
            .await
    }

    async fn extract_pdf(&self, path: &Path) -> Result<String, DocClassError> {
        let mut pages = render::page_texts(path, self.config.password.as_deref()).await?;

        let scanned: Vec<usize> = pages
            .iter()
            .enumerate()
            .filter(|(_, text)| normalize::visible_chars(text) < self.config.min_text_chars)
            .map(|(idx, _)| idx)
            .collect();

        if !scanned.is_empty() {
            info!(
                "{}/{} pages have no usable text layer, running OCR",
                scanned.len(),
                pages.len()
            );
            for (idx, text) in self.ocr_pages(path, &scanned).await? {
                pages[idx] = text;
            }
        }

        let joined = pages
            .iter()
            .map(|p| normalize::clean_text(p))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(joined)
    }

    /// Rasterise and transcribe `indices`, returning `(index, text)` for the
    /// pages that succeeded.
    async fn ocr_pages(
        &self,
        path: &Path,
        indices: &[usize],
    ) -> Result<Vec<(usize, String)>, DocClassError> {
        let provider = self.provider().await?;
        let rendered = render::render_pages(path, &self.config, indices).await?;

        let encoded: Vec<(usize, _)> = rendered
            .iter()
            .filter_map(|(idx, img)| match encode::encode_page(img) {
                Ok(data) => Some((*idx, data)),
                Err(e) => {
                    let err = PageError::RenderFailed {
                        page: idx + 1,
                        detail: format!("Image encoding failed: {}", e),
                    };
                    warn!("{}", err);
                    None
                }
            })
            .collect();

        let results: Vec<(usize, Result<String, PageError>)> =
            stream::iter(encoded.into_iter().map(|(idx, data)| {
                let provider = Arc::clone(provider);
                let config = &self.config;
                async move { (idx, ocr::transcribe(&provider, idx + 1, data, config).await) }
            }))
            .buffer_unordered(self.config.concurrency)
            .collect()
            .await;

        Ok(results
            .into_iter()
            .filter_map(|(idx, result)| match result {
                Ok(text) => Some((idx, text)),
                Err(e) => {
                    warn!("{}", e);
                    None
                }
            })
            .collect())
    }

    async fn extract_image(&self, path: &Path) -> Result<String, DocClassError> {
        let provider = self.provider().await?;
        let data = encode::load_image(path, self.config.max_rendered_pixels).await?;
        match ocr::transcribe(provider, 1, data, &self.config).await {
            Ok(text) => Ok(normalize::clean_text(&text)),
            Err(e) => {
                warn!("{}", e);
                Err(DocClassError::NoTextExtracted {
                    path: path.to_path_buf(),
                })
            }
        }
    }
}

#[async_trait]
impl TextExtractor for DocumentExtractor {
    async fn extract(&self, path: &Path, kind: DocumentKind) -> Result<String, DocClassError> {
        let start = Instant::now();
        let text = if kind.is_image() {
            self.extract_image(path).await?
        } else {
            self.extract_pdf(path).await?
        };

        if text.is_empty() {
            return Err(DocClassError::NoTextExtracted {
                path: path.to_path_buf(),
            });
        }

        debug!(
            "Extracted {} chars from {} in {}ms",
            text.len(),
            path.display(),
            start.elapsed().as_millis()
        );
        Ok(text)
    }
}
