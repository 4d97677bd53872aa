//! Input resolution: normalise a user-supplied path or URL to a local file
//! and decide whether it is a PDF or an image.
//!
//! URL inputs are downloaded into a `TempDir` that lives inside
//! [`ResolvedInput`], so the file disappears as soon as the caller drops it,
//! even on panic. The file kind comes from the extension; PDFs are also
//! checked for the `%PDF` magic bytes so a renamed file fails with a clear
//! error instead of a pdfium crash.

use crate::error::DocClassError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// What kind of document a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Png,
    Jpeg,
}

impl DocumentKind {
    /// Classify a file name by its extension (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(DocumentKind::Pdf),
            "png" => Some(DocumentKind::Png),
            "jpg" | "jpeg" => Some(DocumentKind::Jpeg),
            _ => None,
        }
    }

    /// Like [`DocumentKind::from_name`], failing with
    /// [`DocClassError::UnsupportedFileType`] for anything else.
    pub fn from_path(path: &Path) -> Result<Self, DocClassError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self::from_name(&name).ok_or(DocClassError::UnsupportedFileType { name })
    }

    pub fn is_image(self) -> bool {
        !matches!(self, DocumentKind::Pdf)
    }
}

/// The resolved input — either a local path or a downloaded temp file.
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL; downloaded to a temp directory that is kept alive
    /// until this value is dropped.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Get the path to the file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to a local, supported document.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, DocClassError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        resolve_local(input)
    }
}

/// Resolve a local file path, validating existence, kind and PDF magic bytes.
fn resolve_local(path_str: &str) -> Result<ResolvedInput, DocClassError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(DocClassError::FileNotFound { path });
    }
    check_file(&path)?;

    debug!("Resolved local document: {}", path.display());
    Ok(ResolvedInput::Local(path))
}

/// Validate that `path` is readable, has a supported extension, and — for
/// PDFs — starts with `%PDF`.
pub fn check_file(path: &Path) -> Result<DocumentKind, DocClassError> {
    let kind = DocumentKind::from_path(path)?;

    match std::fs::File::open(path) {
        Ok(mut f) => {
            if kind == DocumentKind::Pdf {
                use std::io::Read;
                let mut magic = [0u8; 4];
                if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                    return Err(DocClassError::NotAPdf {
                        path: path.to_path_buf(),
                        magic,
                    });
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(DocClassError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(DocClassError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    Ok(kind)
}

/// Download a URL to a temporary directory and return the path.
async fn download_url(url: &str, timeout_secs: u64) -> Result<ResolvedInput, DocClassError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocClassError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            DocClassError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocClassError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(DocClassError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());
    let filename = extract_filename(url, content_type.as_deref());

    let temp_dir = TempDir::new().map_err(|e| DocClassError::Internal(e.to_string()))?;
    let file_path = temp_dir.path().join(&filename);

    let bytes = response
        .bytes()
        .await
        .map_err(|e| DocClassError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    tokio::fs::write(&file_path, &bytes)
        .await
        .map_err(|e| DocClassError::Internal(format!("Failed to write temp file: {}", e)))?;

    check_file(&file_path)?;
    info!("Downloaded to: {}", file_path.display());

    Ok(ResolvedInput::Downloaded {
        path: file_path,
        _temp_dir: temp_dir,
    })
}

/// Pick a file name for a download: the URL's last path segment when it
/// has a supported extension, else one derived from the content type.
fn extract_filename(url: &str, content_type: Option<&str>) -> String {
    if let Ok(parsed) = reqwest::Url::parse(url) {
        if let Some(mut segments) = parsed.path_segments() {
            if let Some(last) = segments.next_back() {
                if DocumentKind::from_name(last).is_some() {
                    return last.to_string();
                }
            }
        }
    }

    match content_type.map(|c| c.split(';').next().unwrap_or("").trim()) {
        Some("image/png") => "downloaded.png".to_string(),
        Some("image/jpeg") => "downloaded.jpg".to_string(),
        _ => "downloaded.pdf".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("doc.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn kind_from_name() {
        assert_eq!(DocumentKind::from_name("scan.PDF"), Some(DocumentKind::Pdf));
        assert_eq!(DocumentKind::from_name("a.b.png"), Some(DocumentKind::Png));
        assert_eq!(DocumentKind::from_name("photo.jpg"), Some(DocumentKind::Jpeg));
        assert_eq!(DocumentKind::from_name("photo.JPEG"), Some(DocumentKind::Jpeg));
        assert_eq!(DocumentKind::from_name("notes.docx"), None);
        assert_eq!(DocumentKind::from_name("pdf"), None);
        assert!(DocumentKind::Png.is_image());
        assert!(!DocumentKind::Pdf.is_image());
    }

    #[test]
    fn from_path_rejects_unsupported() {
        let err = DocumentKind::from_path(Path::new("/tmp/readme.txt")).unwrap_err();
        assert!(matches!(err, DocClassError::UnsupportedFileType { ref name } if name == "readme.txt"));
    }

    #[test]
    fn filename_from_url_or_content_type() {
        assert_eq!(extract_filename("https://x.org/files/bill.pdf", None), "bill.pdf");
        assert_eq!(
            extract_filename("https://x.org/render?id=3", Some("image/png")),
            "downloaded.png"
        );
        assert_eq!(
            extract_filename("https://x.org/get", Some("image/jpeg; charset=binary")),
            "downloaded.jpg"
        );
        assert_eq!(extract_filename("https://x.org/get", None), "downloaded.pdf");
    }

    #[test]
    fn check_file_rejects_fake_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"GIF89a....").unwrap();
        let err = check_file(&path).unwrap_err();
        assert!(matches!(err, DocClassError::NotAPdf { .. }));
        assert!(err.is_client_error());
    }

    #[test]
    fn check_file_accepts_pdf_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("real.pdf");
        std::fs::write(&path, b"%PDF-1.7\n").unwrap();
        assert_eq!(check_file(&path).unwrap(), DocumentKind::Pdf);
    }

    #[tokio::test]
    async fn resolve_missing_local_file() {
        let err = resolve_input("/definitely/not/here.pdf", 5).await.err().unwrap();
        assert!(matches!(err, DocClassError::FileNotFound { .. }));
    }
}
