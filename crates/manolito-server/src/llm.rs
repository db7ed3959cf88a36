//! Language model access over an OpenAI-compatible chat completions API

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model request failed: {0}")]
    Api(#[from] OpenAIError),
}

/// A single-turn conversation: one system instruction, one user message
#[derive(Debug, Clone, PartialEq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
    pub temperature: Option<f32>,
}

/// Incremental answer text, in arrival order
pub type TokenStream = BoxStream<'static, Result<String, LlmError>>;

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Non-streaming call; `None` when the model sent no text
    async fn complete(&self, prompt: &ChatPrompt) -> Result<Option<String>, LlmError>;

    /// Streaming call; yields each non-empty content delta
    async fn stream(&self, prompt: &ChatPrompt) -> Result<TokenStream, LlmError>;
}

pub struct OpenAiModel {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiModel {
    pub fn new(base_url: &str, api_key: &str, model: impl Into<String>) -> Self {
        let config = OpenAIConfig::new()
            .with_api_base(base_url)
            .with_api_key(api_key);

        Self {
            client: Client::with_config(config),
            model: model.into(),
        }
    }

    fn request(&self, prompt: &ChatPrompt) -> Result<CreateChatCompletionRequest, OpenAIError> {
        let messages = vec![
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(prompt.system.clone())
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt.user.clone())
                    .build()?,
            ),
        ];

        let mut args = CreateChatCompletionRequestArgs::default();
        args.model(self.model.clone()).messages(messages);
        if let Some(temperature) = prompt.temperature {
            args.temperature(temperature);
        }
        args.build()
    }
}

#[async_trait]
impl ChatModel for OpenAiModel {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<Option<String>, LlmError> {
        let request = self.request(prompt)?;
        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content);

        tracing::debug!(model = %self.model, chars = content.as_ref().map(String::len), "Completion received");
        Ok(content)
    }

    async fn stream(&self, prompt: &ChatPrompt) -> Result<TokenStream, LlmError> {
        let request = self.request(prompt)?;
        let stream = self.client.chat().create_stream(request).await?;

        let tokens = stream.filter_map(|chunk| {
            let item = match chunk {
                Ok(response) => response
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|choice| choice.delta.content)
                    .filter(|text| !text.is_empty())
                    .map(Ok),
                Err(err) => Some(Err(LlmError::from(err))),
            };
            futures::future::ready(item)
        });

        Ok(tokens.boxed())
    }
}
