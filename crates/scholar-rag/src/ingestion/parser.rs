//! PDF and text file parsing

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed document with extracted text and metadata
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Extracted text content
    pub content: String,
    /// Content hash for deduplication
    pub content_hash: String,
    /// Total pages (PDFs only)
    pub total_pages: Option<u32>,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);

        if !file_type.is_supported() {
            let extension = filename.rsplit('.').next().unwrap_or("");
            return Err(Error::UnsupportedFileType(extension.to_string()));
        }

        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Txt | FileType::Markdown => Self::parse_text(filename, data, file_type),
            FileType::Unknown => unreachable!("unsupported types rejected above"),
        }
    }

    /// Parse a PDF document
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let content = Self::extract_pdf_with_timeout(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        // Normalize: drop null bytes and collapse blank lines left by extraction
        let content = content
            .replace('\0', "")
            .lines()
            .map(|l| l.trim_end())
            .filter(|l| !l.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        if content.trim().is_empty() {
            return Err(Error::file_parse(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        let total_pages = match lopdf::Document::load_mem(data) {
            Ok(doc) => Some(doc.get_pages().len() as u32),
            Err(_) => None,
        };

        Ok(ParsedDocument {
            file_type: FileType::Pdf,
            content_hash: hash_content(&content),
            content,
            total_pages,
        })
    }

    /// Extract PDF text with a sync timeout to prevent hangs on problematic fonts
    fn extract_pdf_with_timeout(data: &[u8]) -> Result<String> {
        use std::sync::mpsc;
        use std::thread;
        use std::time::Duration;

        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(Duration::from_secs(60)) {
            Ok(Ok(text)) => {
                let _ = handle.join();
                Ok(text)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed: {}, trying lopdf fallback", e);
                Self::extract_pdf_text_fallback(data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!("PDF extraction timeout after 60s, trying lopdf fallback");
                Self::extract_pdf_text_fallback(data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                tracing::error!("PDF extraction thread crashed, trying lopdf fallback");
                Self::extract_pdf_text_fallback(data)
            }
        }
    }

    /// Fallback PDF text extraction using lopdf directly
    fn extract_pdf_text_fallback(data: &[u8]) -> Result<String> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::Internal(format!("lopdf load failed: {}", e)))?;

        let mut text = String::new();
        let pages = doc.get_pages();
        for page_number in pages.keys() {
            if let Ok(page_text) = doc.extract_text(&[*page_number]) {
                text.push_str(&page_text);
                text.push('\n');
            }
        }

        if text.trim().is_empty() {
            return Err(Error::Internal(
                "lopdf fallback extracted no text".to_string(),
            ));
        }

        Ok(text)
    }

    /// Parse a plain-text or Markdown file
    fn parse_text(filename: &str, data: &[u8], file_type: FileType) -> Result<ParsedDocument> {
        let content = String::from_utf8_lossy(data).into_owned();

        if content.trim().is_empty() {
            return Err(Error::file_parse(filename, "File is empty"));
        }

        Ok(ParsedDocument {
            file_type,
            content_hash: hash_content(&content),
            content,
            total_pages: None,
        })
    }
}

/// SHA-256 hash of content, hex-encoded
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_text_file() {
        let parsed = FileParser::parse("notes.txt", b"An algorithm is a procedure.").unwrap();
        assert_eq!(parsed.file_type, FileType::Txt);
        assert_eq!(parsed.content, "An algorithm is a procedure.");
        assert_eq!(parsed.content_hash.len(), 64);
        assert!(parsed.total_pages.is_none());
    }

    #[test]
    fn rejects_unsupported_extension() {
        let result = FileParser::parse("slides.pptx", b"binary");
        assert!(matches!(result, Err(Error::UnsupportedFileType(_))));
    }

    #[test]
    fn rejects_empty_text() {
        let result = FileParser::parse("empty.txt", b"   \n  ");
        assert!(matches!(result, Err(Error::FileParse { .. })));
    }

    #[test]
    fn hash_is_stable() {
        assert_eq!(hash_content("abc"), hash_content("abc"));
        assert_ne!(hash_content("abc"), hash_content("abd"));
    }

    #[test]
    fn handles_non_utf8_text_lossily() {
        let parsed = FileParser::parse("latin1.txt", b"caf\xe9 notes").unwrap();
        assert!(parsed.content.contains("caf"));
    }
}
