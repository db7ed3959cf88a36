//! Results → natural-language answer
//!
//! One prompt, two ways to deliver it: the whole text at once (HTTP) or a
//! token stream (console).

use manolito_ir::QueryResult;
use std::sync::Arc;

use crate::llm::{ChatModel, ChatPrompt, LlmError, TokenStream};

pub const SYSTEM_PROMPT: &str = r#"Eres un analista de datos de producción de tornillos.
Responde SIEMPRE en español, de forma muy concisa y clara.
Usa SOLO los datos proporcionados en las consultas y resultados.
Si algo no se puede responder con esos datos, dilo claramente."#;

pub struct Synthesizer {
    model: Arc<dyn ChatModel>,
    temperature: f32,
}

impl Synthesizer {
    pub fn new(model: Arc<dyn ChatModel>, temperature: f32) -> Self {
        Self { model, temperature }
    }

    /// The user message embeds every result, error sentinels included
    pub fn prompt(&self, question: &str, results: &[QueryResult]) -> Result<ChatPrompt, serde_json::Error> {
        let results_json = serde_json::to_string_pretty(results)?;

        Ok(ChatPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user: format!(
                "Pregunta original:\n{}\n\nConsultas ejecutadas y sus resultados (formato JSON):\n{}",
                question, results_json
            ),
            temperature: Some(self.temperature),
        })
    }

    /// Complete answer in one piece; a reply without text is an empty answer
    pub async fn answer(&self, question: &str, results: &[QueryResult]) -> Result<String, SynthesisError> {
        let prompt = self.prompt(question, results)?;
        let answer = self.model.complete(&prompt).await?.unwrap_or_default();
        tracing::debug!(chars = answer.len(), "Answer synthesized");
        Ok(answer)
    }

    /// Same answer, delivered token by token as the model produces it
    pub async fn answer_stream(
        &self,
        question: &str,
        results: &[QueryResult],
    ) -> Result<TokenStream, SynthesisError> {
        let prompt = self.prompt(question, results)?;
        Ok(self.model.stream(&prompt).await?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("failed to serialize query results: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Llm(#[from] LlmError),
}
