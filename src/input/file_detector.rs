//! File type detection

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Pdf,
    Text,
    Markdown,
    /// Word documents are recognised so they can be rejected with a clear message
    Docx,
}

impl FileType {
    /// Unknown or missing extensions are read as plain text.
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "md" | "markdown" => FileType::Markdown,
            "docx" | "doc" => FileType::Docx,
            _ => FileType::Text,
        }
    }

    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileType::Text)
    }
}
