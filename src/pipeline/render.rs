//! PDF access via pdfium: read each page's text layer, and rasterise the
//! pages that have none so they can be sent to OCR.
//!
//! pdfium keeps thread-local state and is not safe to drive from async
//! contexts, so every entry point here hops onto `spawn_blocking`.
//!
//! Rasterisation uses the configured DPI but caps the longest edge at
//! `max_rendered_pixels`, so an A0 poster cannot exhaust memory.

use crate::config::ExtractionConfig;
use crate::error::DocClassError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Bind to pdfium, downloading the library on first use.
fn bind() -> Result<Pdfium, DocClassError> {
    pdfium_auto::bind_pdfium_silent().map_err(|e| DocClassError::PdfiumBindingFailed(e.to_string()))
}

/// Open a PDF, mapping pdfium's error to the password/corruption variants.
fn open_document<'a>(
    pdfium: &'a Pdfium,
    pdf_path: &Path,
    password: Option<&'a str>,
) -> Result<PdfDocument<'a>, DocClassError> {
    pdfium.load_pdf_from_file(pdf_path, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                DocClassError::WrongPassword {
                    path: pdf_path.to_path_buf(),
                }
            } else {
                DocClassError::PasswordRequired {
                    path: pdf_path.to_path_buf(),
                }
            }
        } else {
            DocClassError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: err_str,
            }
        }
    })
}

/// Read the text layer of every page, in page order.
///
/// Pages without a text layer yield an empty string.
pub async fn page_texts(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<String>, DocClassError> {
    let path = pdf_path.to_path_buf();
    let pwd = password.map(|s| s.to_string());

    tokio::task::spawn_blocking(move || page_texts_blocking(&path, pwd.as_deref()))
        .await
        .map_err(|e| DocClassError::Internal(format!("Text task panicked: {}", e)))?
}

fn page_texts_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<String>, DocClassError> {
    let pdfium = bind()?;
    let document = open_document(&pdfium, pdf_path, password)?;
    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let texts = pages
        .iter()
        .enumerate()
        .map(|(idx, page)| match page.text() {
            Ok(text) => text.all(),
            Err(e) => {
                warn!("Page {}: no text layer ({:?})", idx + 1, e);
                String::new()
            }
        })
        .collect();

    Ok(texts)
}

/// Rasterise selected pages of a PDF into images.
///
/// # Returns
/// A vector of `(page_index_0based, DynamicImage)` tuples.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ExtractionConfig,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, DocClassError> {
    let path = pdf_path.to_path_buf();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();
    let indices = page_indices.to_vec();

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, dpi, max_pixels, password.as_deref(), &indices)
    })
    .await
    .map_err(|e| DocClassError::Internal(format!("Render task panicked: {}", e)))?
}

fn render_pages_blocking(
    pdf_path: &Path,
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
    page_indices: &[usize],
) -> Result<Vec<(usize, DynamicImage)>, DocClassError> {
    let pdfium = bind()?;
    let document = open_document(&pdfium, pdf_path, password)?;
    let pages = document.pages();
    let total_pages = pages.len() as usize;

    let mut results = Vec::with_capacity(page_indices.len());

    for &idx in page_indices {
        if idx >= total_pages {
            warn!(
                "Skipping page {} (out of range, total={})",
                idx + 1,
                total_pages
            );
            continue;
        }

        let page = match pages.get(idx as u16) {
            Ok(page) => page,
            Err(e) => {
                warn!("Page {}: cannot open for rendering: {:?}", idx + 1, e);
                continue;
            }
        };

        let render_config = PdfRenderConfig::new()
            .set_target_width(target_width(page.width().value, dpi, max_pixels))
            .set_maximum_height(max_pixels as i32);

        let rendered = page.render_with_config(&render_config);
        match rendered {
            Ok(bitmap) => {
                let image = bitmap.as_image();
                debug!(
                    "Rendered page {} → {}x{} px",
                    idx + 1,
                    image.width(),
                    image.height()
                );
                results.push((idx, image));
            }
            Err(e) => warn!("Page {}: rasterisation failed: {:?}", idx + 1, e),
        }
    }

    Ok(results)
}

/// Pixel width for a page `width_points` wide at `dpi`, capped at `max_pixels`.
fn target_width(width_points: f32, dpi: u32, max_pixels: u32) -> i32 {
    let px = (width_points / 72.0 * dpi as f32).round() as i32;
    px.clamp(1, max_pixels as i32)
}
