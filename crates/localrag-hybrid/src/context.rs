//! Prompt assembly: fused records and the question rendered into a template.

use localrag_core::config::PromptSettings;
use localrag_core::error::{Error, Result};
use localrag_core::types::{FusedContext, META_FILE_NAME};

pub const CONTEXT_SLOT: &str = "{context}";
pub const QUESTION_SLOT: &str = "{question}";

/// Rendered in the context slot when retrieval found nothing.
pub const NO_CONTEXT: &str = "No relevant context was found.";

pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 12_000;

pub const RESEARCH_TEMPLATE: &str = "\
You are an academic research assistant. Please answer the user's question based ONLY on the following [Context].
Be professional and accurate. If possible, cite specific details from the context.
If the context does not contain the answer, say so.

[Context]:
{context}

User Question: {question}
Answer:
";

pub const HYBRID_TEMPLATE: &str = "\
Answer the question based ONLY on the following [Context].
[Context]:
{context}

Question: {question}
Answer:
";

/// A prompt template with one `{question}` slot and at most one `{context}` slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    text: String,
}

impl PromptTemplate {
    pub fn research() -> Self { Self { text: RESEARCH_TEMPLATE.to_string() } }

    pub fn hybrid() -> Self { Self { text: HYBRID_TEMPLATE.to_string() } }

    pub fn custom(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.matches(QUESTION_SLOT).count() != 1 {
            return Err(Error::Configuration(format!("prompt template must contain exactly one {QUESTION_SLOT} slot")));
        }
        if text.matches(CONTEXT_SLOT).count() > 1 {
            return Err(Error::Configuration(format!("prompt template may contain at most one {CONTEXT_SLOT} slot")));
        }
        Ok(Self { text })
    }

    pub fn from_settings(settings: &PromptSettings) -> Result<Self> {
        match &settings.template {
            Some(text) => Self::custom(text.clone()),
            None => Ok(Self::research()),
        }
    }

    pub fn as_str(&self) -> &str { &self.text }

    /// Substitute both slots in one left-to-right pass, so slot-like text
    /// inside the question or the context is left untouched.
    fn render(&self, context: &str, question: &str) -> String {
        let mut out = String::with_capacity(self.text.len() + context.len() + question.len());
        let mut rest = self.text.as_str();
        loop {
            let next = [(CONTEXT_SLOT, context), (QUESTION_SLOT, question)]
                .into_iter()
                .filter_map(|(slot, value)| rest.find(slot).map(|at| (at, slot, value)))
                .min_by_key(|(at, _, _)| *at);
            match next {
                Some((at, slot, value)) => {
                    out.push_str(&rest[..at]);
                    out.push_str(value);
                    rest = &rest[at + slot.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

/// Outcome of one assembly, for logging and the `search` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub prompt: String,
    pub included: usize,
    pub dropped: usize,
}

const BLOCK_SEPARATOR: &str = "\n\n";

/// Renders fused records in fusion order under a character budget.
///
/// Records are never cut: the first record that would overflow the budget is
/// dropped together with every lower-ranked record. The top record is always
/// kept.
#[derive(Debug, Clone)]
pub struct ContextAssembler {
    template: PromptTemplate,
    max_context_chars: usize,
}

impl ContextAssembler {
    pub fn new(template: PromptTemplate, max_context_chars: usize) -> Self { Self { template, max_context_chars } }

    pub fn from_settings(settings: &PromptSettings) -> Result<Self> {
        Ok(Self::new(PromptTemplate::from_settings(settings)?, settings.max_context_chars))
    }

    pub fn template(&self) -> &PromptTemplate { &self.template }

    pub fn assemble(&self, fused: &FusedContext, question: &str) -> AssembledPrompt {
        let mut blocks: Vec<String> = Vec::with_capacity(fused.len());
        let mut used = 0usize;
        for (i, fr) in fused.records.iter().enumerate() {
            let block = match fr.record.meta.get(META_FILE_NAME) {
                Some(name) => format!("[{}] ({name}) {}", i + 1, fr.record.text),
                None => format!("[{}] {}", i + 1, fr.record.text),
            };
            let separator = if blocks.is_empty() { 0 } else { BLOCK_SEPARATOR.len() };
            let cost = separator + block.chars().count();
            if !blocks.is_empty() && used + cost > self.max_context_chars {
                break;
            }
            used += cost;
            blocks.push(block);
        }
        let dropped = fused.len() - blocks.len();
        if dropped > 0 {
            tracing::warn!(dropped, kept = blocks.len(), budget = self.max_context_chars, "context budget exceeded, lowest-ranked records dropped");
        }
        let context = if blocks.is_empty() { NO_CONTEXT.to_string() } else { blocks.join(BLOCK_SEPARATOR) };
        AssembledPrompt { prompt: self.template.render(&context, question), included: blocks.len(), dropped }
    }
}

/// `assemble(fused_context, question, template)` with the default budget.
pub fn assemble(fused: &FusedContext, question: &str, template: &PromptTemplate) -> String {
    ContextAssembler::new(template.clone(), DEFAULT_MAX_CONTEXT_CHARS).assemble(fused, question).prompt
}
