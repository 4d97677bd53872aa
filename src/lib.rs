//! # doctype-classifier
//!
//! Classify PDF and image documents into a caller-defined taxonomy with a
//! large language model.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (PDF / PNG / JPEG)
//!  │
//!  ├─ 1. Input     resolve local file or URL, check kind and magic bytes
//!  ├─ 2. Extract   pdfium text layer; vision-model OCR for scans and images
//!  ├─ 3. Prompt    taxonomy + verbatim text + answer format
//!  ├─ 4. Generate  one call, low temperature, bounded output
//!  ├─ 5. Parse     TYPE / JUSTIFICATION / INFORMATIONS ADDITIONNELLES
//!  └─ 6. Validate  type must be a taxonomy member, else "Unclassifiable"
//! ```
//!
//! A failed generation call never surfaces as an `Err`: it becomes a result
//! whose type is `"Error"` and whose justification carries the failure.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doctype_classifier::{Classifier, ClassifierConfig, Taxonomy};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let classifier = Classifier::from_config(ClassifierConfig::default())?;
//!     let taxonomy = Taxonomy::load("Tools/list_type_doc.json").await?;
//!     let result = classifier.classify(&taxonomy, "FACTURE N° 42 ... Total TTC 120 €").await;
//!     println!("{} — {}", result.doc_type, result.justification);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `doctype` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod classify;
pub mod config;
pub mod error;
pub mod extract;
pub mod generate;
pub mod pipeline;
pub mod prompts;
pub mod response;
pub mod server;
pub mod taxonomy;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use classify::Classifier;
pub use config::{
    ClassifierConfig, ClassifierConfigBuilder, ExtractionConfig, ExtractionConfigBuilder,
    PromptLanguage, ProviderSettings, ServerConfig,
};
pub use error::{DocClassError, GenerationError, PageError};
pub use extract::{DocumentExtractor, TextExtractor};
pub use generate::{LlmGenerator, TextGenerator};
pub use pipeline::input::DocumentKind;
pub use prompts::build_prompt;
pub use response::{ClassificationResult, ERROR, UNCLASSIFIABLE};
pub use server::AppState;
pub use taxonomy::{Taxonomy, TaxonomyEntry};
