//! Source-file converters. PDF text extraction is delegated to `pdf-extract`;
//! plain text files are read directly.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::traits::Converter;
use crate::types::{Document, Meta, META_FILE_NAME, META_SOURCE};

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|s| s.to_str()).is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

fn source_meta(path: &Path) -> Meta {
    let mut meta = Meta::new();
    meta.insert(META_SOURCE.to_string(), path.to_string_lossy().to_string());
    if let Some(name) = path.file_name() {
        meta.insert(META_FILE_NAME.to_string(), name.to_string_lossy().to_string());
    }
    meta
}

fn into_document(path: &Path, text: String) -> Result<Document> {
    if text.trim().is_empty() {
        return Err(Error::conversion(path.display().to_string(), "no extractable text"));
    }
    Ok(Document::new(text, source_meta(path)))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PdfConverter;

impl Converter for PdfConverter {
    fn can_convert(&self, path: &Path) -> bool { has_extension(path, "pdf") }

    fn convert(&self, path: &Path) -> Result<Document> {
        let name = path.display().to_string();
        // pdf-extract panics on some malformed inputs instead of returning an error.
        let extracted = std::panic::catch_unwind(|| pdf_extract::extract_text(path))
            .map_err(|_| Error::conversion(&name, "PDF parser aborted on malformed input"))?
            .map_err(|e| Error::conversion(&name, e))?;
        tracing::debug!(source = %name, chars = extracted.len(), "pdf converted");
        into_document(path, extracted)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TextConverter;

impl Converter for TextConverter {
    fn can_convert(&self, path: &Path) -> bool { has_extension(path, "txt") || has_extension(path, "md") }

    fn convert(&self, path: &Path) -> Result<Document> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                let bytes = fs::read(path).map_err(|e| Error::conversion(path.display().to_string(), e))?;
                String::from_utf8_lossy(&bytes).to_string()
            }
        };
        into_document(path, content)
    }
}

/// Dispatches to the first converter that accepts the file extension.
pub struct ConverterSet {
    converters: Vec<Box<dyn Converter>>,
}

impl Default for ConverterSet {
    fn default() -> Self { Self { converters: vec![Box::new(PdfConverter), Box::new(TextConverter)] } }
}

impl ConverterSet {
    pub fn new(converters: Vec<Box<dyn Converter>>) -> Self { Self { converters } }
}

impl Converter for ConverterSet {
    fn can_convert(&self, path: &Path) -> bool { self.converters.iter().any(|c| c.can_convert(path)) }

    fn convert(&self, path: &Path) -> Result<Document> {
        let converter = self
            .converters
            .iter()
            .find(|c| c.can_convert(path))
            .ok_or_else(|| Error::conversion(path.display().to_string(), "unsupported file type"))?;
        converter.convert(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_converter_records_source_metadata() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let path = tmp.path().join("notes.txt");
        fs::write(&path, "Transformers rely on attention.").expect("write");
        let doc = TextConverter.convert(&path).expect("convert");
        assert_eq!(doc.text, "Transformers rely on attention.");
        assert_eq!(doc.meta.get(META_FILE_NAME).map(String::as_str), Some("notes.txt"));
        assert!(doc.source().is_some_and(|s| s.ends_with("notes.txt")));
    }

    #[test]
    fn blank_text_file_is_a_conversion_error() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let path = tmp.path().join("blank.txt");
        fs::write(&path, "   \n").expect("write");
        assert!(matches!(TextConverter.convert(&path), Err(Error::Conversion { .. })));
    }

    #[test]
    fn set_rejects_unsupported_extension() {
        let set = ConverterSet::default();
        assert!(set.can_convert(Path::new("paper.PDF")));
        assert!(!set.can_convert(Path::new("image.png")));
        assert!(matches!(set.convert(Path::new("image.png")), Err(Error::Conversion { .. })));
    }

    #[test]
    fn garbage_pdf_fails_with_conversion_error() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let path = tmp.path().join("broken.pdf");
        fs::write(&path, b"not a pdf at all").expect("write");
        assert!(matches!(PdfConverter.convert(&path), Err(Error::Conversion { .. })));
    }
}
