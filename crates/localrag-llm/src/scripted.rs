use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use localrag_core::error::{Error, Result};
use localrag_core::traits::Generator;

#[derive(Debug, Clone)]
enum Reply {
    Fixed(String),
    Echo,
    Fail(String),
}

/// In-process generator that records every prompt it receives.
#[derive(Debug)]
pub struct ScriptedGenerator {
    reply: Reply,
    delay: Option<Duration>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn fixed(answer: impl Into<String>) -> Self { Self::with(Reply::Fixed(answer.into())) }

    /// Answers with the prompt it was given.
    pub fn echo() -> Self { Self::with(Reply::Echo) }

    pub fn failing(message: impl Into<String>) -> Self { Self::with(Reply::Fail(message.into())) }

    /// Sleep before replying; used to exercise cancellation and timeouts.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn with(reply: Reply) -> Self { Self { reply, delay: None, prompts: Mutex::new(Vec::new()) } }

    pub async fn prompts(&self) -> Vec<String> { self.prompts.lock().await.clone() }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn model(&self) -> &str { "scripted" }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().await.push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.reply {
            Reply::Fixed(answer) => Ok(answer.clone()),
            Reply::Echo => Ok(prompt.to_string()),
            Reply::Fail(message) => Err(Error::generation(message)),
        }
    }
}
