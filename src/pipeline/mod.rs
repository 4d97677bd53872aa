//! Pipeline stages for turning an uploaded document into plain text.
//!
//! Each submodule implements exactly one step, so each can be tested on its
//! own and swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//!                    ┌─▶ render::page_texts ──────────────┐
//! input ─▶ (pdf) ────┤                                    ├─▶ normalize
//!                    └─▶ render::render_pages ─▶ encode ─▶ ocr
//! input ─▶ (image) ─────────────────────────────▶ encode ─▶ ocr ─▶ normalize
//! ```
//!
//! 1. [`input`]     — resolve a path or URL to a local file and decide its kind
//! 2. [`render`]    — read PDF text layers; rasterise pages that have none
//! 3. [`encode`]    — PNG-encode and base64-wrap images for the vision model
//! 4. [`ocr`]       — transcribe an image with the vision model, with retries
//! 5. [`normalize`] — deterministic whitespace and Unicode cleanup

pub mod encode;
pub mod input;
pub mod normalize;
pub mod ocr;
pub mod render;
