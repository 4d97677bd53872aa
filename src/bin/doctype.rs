//! CLI binary for doctype-classifier.
//!
//! A thin shim over the library crate: maps CLI flags to the config
//! builders, then classifies one document, prints the prompt, or serves the
//! HTTP endpoint.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use doctype_classifier::pipeline::input::resolve_input;
use doctype_classifier::server::{self, AppState};
use doctype_classifier::{
    Classifier, ClassifierConfig, DocumentExtractor, DocumentKind, ExtractionConfig,
    PromptLanguage, ServerConfig, Taxonomy, TextExtractor,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

const AFTER_HELP: &str = r#"EXAMPLES:
  # Classify a PDF against a taxonomy
  doctype classify invoice.pdf --taxonomy Tools/list_type_doc.json

  # Classify a photo, JSON output
  doctype classify receipt.jpg --json

  # Show the prompt that would be sent (no classification call;
  # scanned pages and images are still OCR'd by the vision model)
  doctype prompt contract.pdf --language english

  # Run the HTTP service
  doctype serve --bind 0.0.0.0:8000
  curl -F file=@invoice.pdf http://localhost:8000/classify-document/

TAXONOMY FORMAT:
  {"documents": [{"type_document": "Facture",
                  "description": "Demande de paiement",
                  "champs": [{"nom": "montant"}, {"nom": "date"}]}]}

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (openai, anthropic, gemini, ollama)
  EDGEQUAKE_MODEL         Override model ID
  DOCTYPE_TAXONOMY        Taxonomy definition file
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download
"#;

/// Classify PDF and image documents into a custom taxonomy using LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "doctype",
    version,
    about = "Classify PDF and image documents into a custom taxonomy using LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "DOCTYPE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the result.
    #[arg(short, long, global = true, env = "DOCTYPE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a document's text and classify it.
    Classify {
        #[command(flatten)]
        doc: DocumentArgs,

        #[command(flatten)]
        llm: LlmArgs,

        /// Output the result as JSON.
        #[arg(long, env = "DOCTYPE_JSON")]
        json: bool,
    },

    /// Print the classification prompt without making the classification call.
    Prompt {
        #[command(flatten)]
        doc: DocumentArgs,

        #[command(flatten)]
        llm: LlmArgs,
    },

    /// Serve the classification HTTP endpoint.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "DOCTYPE_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,

        /// Taxonomy definition file (re-read on every request).
        #[arg(long, env = "DOCTYPE_TAXONOMY", default_value = "./Tools/list_type_doc.json")]
        taxonomy: PathBuf,

        /// Maximum upload size in MiB.
        #[arg(long, env = "DOCTYPE_MAX_UPLOAD_MB", default_value_t = 25)]
        max_upload_mb: usize,

        #[command(flatten)]
        llm: LlmArgs,
    },
}

#[derive(Args, Debug)]
struct DocumentArgs {
    /// Local PDF/PNG/JPEG path or HTTP/HTTPS URL.
    input: String,

    /// Taxonomy definition file.
    #[arg(long, env = "DOCTYPE_TAXONOMY", default_value = "./Tools/list_type_doc.json")]
    taxonomy: PathBuf,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "DOCTYPE_PASSWORD")]
    password: Option<String>,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "DOCTYPE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,
}

#[derive(Args, Debug, Clone)]
struct LlmArgs {
    /// LLM model ID (e.g. gpt-4.1-nano, gpt-4.1, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_PROVIDER")]
    provider: Option<String>,

    /// Classification temperature (0.0–2.0).
    #[arg(long, env = "DOCTYPE_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Max tokens in the classification answer.
    #[arg(long, env = "DOCTYPE_MAX_TOKENS", default_value_t = 1000)]
    max_tokens: usize,

    /// Prompt language.
    #[arg(long, env = "DOCTYPE_LANGUAGE", value_enum, default_value = "french")]
    language: LanguageArg,

    /// Rendering DPI for scanned PDF pages (72–400).
    #[arg(long, env = "DOCTYPE_DPI", default_value_t = 150,
          value_parser = clap::value_parser!(u32).range(72..=400))]
    dpi: u32,

    /// Concurrent OCR calls for scanned PDF pages.
    #[arg(short, long, env = "DOCTYPE_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Retries per OCR call (0–10).
    #[arg(long, env = "DOCTYPE_MAX_RETRIES", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(0..=10))]
    max_retries: u32,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum LanguageArg {
    French,
    English,
}

impl From<LanguageArg> for PromptLanguage {
    fn from(v: LanguageArg) -> Self {
        match v {
            LanguageArg::French => PromptLanguage::French,
            LanguageArg::English => PromptLanguage::English,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let serving = matches!(cli.command, Command::Serve { .. });
    let filter = default_log_level(cli.verbose, cli.quiet, serving);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Classify { doc, llm, json } => {
            run_classify(&doc, &llm, json, cli.quiet).await
        }
        Command::Prompt { doc, llm } => run_prompt(&doc, &llm, cli.quiet).await,
        Command::Serve {
            bind,
            taxonomy,
            max_upload_mb,
            llm,
        } => {
            ensure_pdfium(cli.quiet)?;
            let config = ServerConfig {
                bind,
                taxonomy_path: taxonomy,
                max_upload_bytes: max_upload_mb.max(1) * 1024 * 1024,
            };
            let state = AppState {
                classifier: Classifier::from_config(classifier_config(&llm)?)
                    .context("Failed to configure the LLM provider")?,
                extractor: Arc::new(DocumentExtractor::new(extraction_config(&llm, None, 120)?)),
                taxonomy_path: config.taxonomy_path.clone(),
            };
            server::serve(&config, state).await.context("Server error")
        }
    }
}

/// Log level used when `RUST_LOG` is unset.
///
/// One-shot commands draw a spinner on stderr, so they only log errors
/// unless `--verbose` is given.
fn default_log_level(verbose: bool, quiet: bool, serving: bool) -> &'static str {
    if verbose {
        "debug"
    } else if quiet || !serving {
        "error"
    } else {
        "info"
    }
}

/// Extract, classify and print one document.
async fn run_classify(doc: &DocumentArgs, llm: &LlmArgs, json: bool, quiet: bool) -> Result<()> {
    let taxonomy = Taxonomy::load(&doc.taxonomy)
        .await
        .context("Failed to load taxonomy")?;
    let classifier = Classifier::from_config(classifier_config(llm)?)
        .context("Failed to configure the LLM provider")?;

    let text = extract_text(doc, llm, quiet || json).await?;

    let spinner = (!quiet && !json).then(|| spinner("Classifying", "asking the model…"));
    let result = classifier.classify(&taxonomy, &text).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
        return Ok(());
    }

    let marker = if result.is_error() {
        red("✘")
    } else if result.is_unclassifiable() {
        yellow("?")
    } else {
        green("✔")
    };
    println!("{} {}", marker, bold(&result.doc_type));
    if !result.justification.is_empty() {
        println!("\n{}\n{}", dim("Justification:"), result.justification);
    }
    if !result.additional_info.is_empty() {
        println!("\n{}\n{}", dim("Additional information:"), result.additional_info);
    }
    Ok(())
}

/// Print the prompt the classifier would send.
async fn run_prompt(doc: &DocumentArgs, llm: &LlmArgs, quiet: bool) -> Result<()> {
    let taxonomy = Taxonomy::load(&doc.taxonomy)
        .await
        .context("Failed to load taxonomy")?;
    let text = extract_text(doc, llm, quiet).await?;
    let prompt = doctype_classifier::build_prompt(&taxonomy, &text, llm.language.clone().into());
    println!("{prompt}");
    Ok(())
}

async fn extract_text(doc: &DocumentArgs, llm: &LlmArgs, quiet: bool) -> Result<String> {
    let resolved = resolve_input(&doc.input, doc.download_timeout)
        .await
        .context("Failed to open document")?;
    let kind = DocumentKind::from_path(resolved.path())?;
    if kind == DocumentKind::Pdf {
        ensure_pdfium(quiet)?;
    }

    let extractor = DocumentExtractor::new(extraction_config(
        llm,
        doc.password.clone(),
        doc.download_timeout,
    )?);

    let spinner = (!quiet).then(|| spinner("Extracting", "reading document…"));
    let text = extractor.extract(resolved.path(), kind).await;
    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }
    text.context("Text extraction failed")
}

fn spinner(prefix: &'static str, message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(TICKS),
    );
    bar.set_prefix(prefix);
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// Make sure a pdfium library is available, downloading it on first run.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if pdfium_auto::is_pdfium_cached() {
        return Ok(());
    }
    if quiet {
        return tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .map(|_| ())
            .context("Failed to download PDFium engine");
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    tokio::task::block_in_place(|| {
        pdfium_auto::ensure_pdfium_library(Some(&|downloaded, total| {
            if let Some(t) = total {
                if bar.length().unwrap_or(0) != t {
                    bar.set_length(t);
                }
            }
            bar.set_position(downloaded);
        }))
    })
    .context("Failed to download PDFium engine")?;

    dl_bar.finish_and_clear();
    Ok(())
}

/// Map CLI args to `ClassifierConfig`.
fn classifier_config(llm: &LlmArgs) -> Result<ClassifierConfig> {
    let mut builder = ClassifierConfig::builder()
        .temperature(llm.temperature)
        .max_tokens(llm.max_tokens)
        .language(llm.language.clone().into());
    if let Some(ref model) = llm.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = llm.provider {
        builder = builder.provider_name(provider);
    }
    builder.build().context("Invalid configuration")
}

/// Map CLI args to `ExtractionConfig`.
fn extraction_config(
    llm: &LlmArgs,
    password: Option<String>,
    download_timeout: u64,
) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .dpi(llm.dpi)
        .concurrency(llm.concurrency)
        .max_retries(llm.max_retries)
        .download_timeout_secs(download_timeout);
    if let Some(ref model) = llm.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = llm.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(pwd) = password {
        builder = builder.password(pwd);
    }
    builder.build().context("Invalid configuration")
}
