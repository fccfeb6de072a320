//! Loading a document's text from disk.
//!
//! Only plain-text formats are read here; anything else is rejected so the caller
//! can extract text with its own tooling first.

use std::path::{Path, PathBuf};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown", "text"];

/// Read the text of the document at `path`.
/// Fails if the format is unsupported or the file holds no text.
pub fn load_document(path: &Path) -> Result<String, DocumentError> {
    if !is_supported(path) {
        return Err(DocumentError::Unsupported(path.to_path_buf()));
    }
    let text =
        std::fs::read_to_string(path).map_err(|e| DocumentError::Read(path.to_path_buf(), e))?;
    if text.trim().is_empty() {
        return Err(DocumentError::NoText(path.to_path_buf()));
    }
    Ok(text)
}

/// Plain-text extensions, or no extension at all.
pub fn is_supported(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        None => true,
        Some(ext) => TEXT_EXTENSIONS
            .iter()
            .any(|t| t.eq_ignore_ascii_case(ext)),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("unsupported document format: {0}")]
    Unsupported(PathBuf),
    #[error("no text could be extracted from {0}")]
    NoText(PathBuf),
    #[error("read error for {0}: {1}")]
    Read(PathBuf, std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_text_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "the cat sat").unwrap();
        assert_eq!(load_document(&path).unwrap(), "the cat sat");
    }

    #[test]
    fn rejects_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, "%PDF-1.4").unwrap();
        assert!(matches!(
            load_document(&path),
            Err(DocumentError::Unsupported(_))
        ));
    }

    #[test]
    fn rejects_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.md");
        std::fs::write(&path, "  \n\n ").unwrap();
        assert!(matches!(load_document(&path), Err(DocumentError::NoText(_))));
    }

    #[test]
    fn missing_file_is_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            load_document(&dir.path().join("gone.txt")),
            Err(DocumentError::Read(_, _))
        ));
    }

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(is_supported(Path::new("README.MD")));
        assert!(is_supported(Path::new("LICENSE")));
        assert!(!is_supported(Path::new("paper.pdf")));
    }
}
