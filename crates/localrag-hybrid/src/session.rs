//! Append-only chat transcript over the two orchestrators.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use localrag_core::error::Result;
use localrag_core::types::{ConversationTurn, Role};

use crate::ingest::{IngestPipeline, IngestReport};
use crate::query::{Answer, QueryPipeline};

/// One conversation. Methods take `&mut self`, so an upload finishes
/// ingesting before the next question is accepted.
pub struct ChatSession {
    query: Arc<QueryPipeline>,
    ingest: Arc<IngestPipeline>,
    turns: Vec<ConversationTurn>,
}

impl ChatSession {
    pub fn new(query: Arc<QueryPipeline>, ingest: Arc<IngestPipeline>) -> Self { Self { query, ingest, turns: Vec::new() } }

    pub fn transcript(&self) -> &[ConversationTurn] { &self.turns }

    pub async fn ask(&mut self, question: &str) -> Result<Answer> { self.ask_with_cancel(question, &CancellationToken::new()).await }

    /// The user and assistant turns are appended together, and only when the
    /// answer was generated.
    pub async fn ask_with_cancel(&mut self, question: &str, cancel: &CancellationToken) -> Result<Answer> {
        let answer = self.query.answer_with_cancel(question, cancel).await?;
        self.turns.push(ConversationTurn { role: Role::User, text: question.to_string() });
        self.turns.push(ConversationTurn { role: Role::Assistant, text: answer.text.clone() });
        Ok(answer)
    }

    pub async fn upload(&mut self, path: &Path) -> Result<IngestReport> { self.ingest.ingest_file(path).await }

    /// Transcript in submission order, one `role: text` block per turn.
    pub fn render_transcript(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            let _ = writeln!(out, "{}: {}", turn.role, turn.text);
        }
        out
    }
}
