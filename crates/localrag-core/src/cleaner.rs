use crate::config::CleanerSettings;
use crate::types::Document;

/// Normalises extracted PDF text before chunking.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentCleaner {
    settings: CleanerSettings,
}

impl DocumentCleaner {
    pub fn new(settings: CleanerSettings) -> Self { Self { settings } }

    /// Returns a new document; the id is recomputed from the cleaned text.
    pub fn clean(&self, doc: &Document) -> Document {
        let text = self.clean_text(&doc.text);
        Document::new(text, doc.meta.clone())
    }

    pub fn clean_text(&self, text: &str) -> String {
        // Form feeds separate pages in extracted PDF text.
        let text = text.replace('\u{c}', "\n");
        let mut lines: Vec<String> = Vec::new();
        for line in text.lines() {
            let line = if self.settings.remove_extra_whitespaces {
                line.split_whitespace().collect::<Vec<_>>().join(" ")
            } else {
                line.to_string()
            };
            if self.settings.remove_empty_lines && line.trim().is_empty() {
                continue;
            }
            lines.push(line);
        }
        let joined = lines.join("\n");
        if self.settings.remove_extra_whitespaces { joined.trim().to_string() } else { joined }
    }
}
