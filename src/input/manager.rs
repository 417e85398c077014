//! Input manager for CV and job sources

use crate::error::{MatcherError, Result};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use log::{debug, info};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt};

#[derive(Debug, Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    pub async fn extract_text(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(MatcherError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        match FileType::from_path(path) {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", path.display());
                PdfExtractor.extract(path).await
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", path.display());
                MarkdownExtractor.extract(path).await
            }
            FileType::Text => {
                info!("Reading plain text file: {}", path.display());
                PlainTextExtractor.extract(path).await
            }
            FileType::Docx => Err(MatcherError::UnsupportedFormat(format!(
                "Word documents are not supported, convert to PDF or text: {}",
                path.display()
            ))),
        }
    }

    /// Treat `source` as a file when such a file exists, otherwise as literal text.
    pub async fn resolve_source(&self, source: &str) -> Result<String> {
        let path = Path::new(source);
        if !source.is_empty() && path.is_file() {
            self.extract_text(path).await
        } else {
            debug!("Using {} chars of literal text", source.chars().count());
            Ok(source.to_string())
        }
    }

    /// Read a whole document from `reader`, normally stdin.
    pub async fn read_document<R>(&self, mut reader: R) -> Result<String>
    where
        R: AsyncRead + Unpin,
    {
        let mut buffer = String::new();
        reader.read_to_string(&mut buffer).await?;
        debug!("Read {} bytes of input", buffer.len());
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_resolve_source_reads_existing_file() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        write!(file, "Rust engineer").unwrap();

        let manager = InputManager::new();
        let text = manager.resolve_source(&file.path().to_string_lossy()).await.unwrap();
        assert_eq!(text, "Rust engineer");
    }

    #[tokio::test]
    async fn test_resolve_source_falls_back_to_literal() {
        let manager = InputManager::new();
        let text = manager.resolve_source("Senior Python Engineer, 5+ years").await.unwrap();
        assert_eq!(text, "Senior Python Engineer, 5+ years");
        assert_eq!(manager.resolve_source("").await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_missing_file_is_invalid_input() {
        let result = InputManager::new().extract_text(Path::new("/nonexistent/cv.pdf")).await;
        assert!(matches!(result, Err(MatcherError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_docx_is_unsupported() {
        let file = NamedTempFile::with_suffix(".docx").unwrap();
        let result = InputManager::new().extract_text(file.path()).await;
        assert!(matches!(result, Err(MatcherError::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_read_document() {
        let input: &[u8] = br#"{"cvText": "a"}"#;
        let text = InputManager::new().read_document(input).await.unwrap();
        assert_eq!(text, r#"{"cvText": "a"}"#);
    }
}
