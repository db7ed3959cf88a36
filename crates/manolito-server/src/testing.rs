//! Scripted stand-ins for the model and the database

use async_openai::error::OpenAIError;
use async_trait::async_trait;
use futures::StreamExt;
use manolito_ir::Row;
use manolito_mysql::{ExecutionError, QueryRunner};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::llm::{ChatModel, ChatPrompt, LlmError, TokenStream};

/// Replies with queued responses, in order, and records every prompt
pub struct FakeModel {
    responses: Mutex<VecDeque<Option<String>>>,
    prompts: Mutex<Vec<ChatPrompt>>,
    fail: bool,
}

impl FakeModel {
    pub fn new(responses: Vec<Option<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// Every call fails as if the endpoint were unreachable
    pub fn unreachable() -> Self {
        Self {
            fail: true,
            ..Self::new(vec![])
        }
    }

    pub fn prompts(&self) -> Vec<ChatPrompt> {
        self.prompts.lock().unwrap().clone()
    }

    fn next(&self, prompt: &ChatPrompt) -> Result<Option<String>, LlmError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if self.fail {
            return Err(OpenAIError::InvalidArgument("connection refused".to_string()).into());
        }
        Ok(self.responses.lock().unwrap().pop_front().flatten())
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, prompt: &ChatPrompt) -> Result<Option<String>, LlmError> {
        self.next(prompt)
    }

    async fn stream(&self, prompt: &ChatPrompt) -> Result<TokenStream, LlmError> {
        let text = self.next(prompt)?.unwrap_or_default();
        let tokens: Vec<Result<String, LlmError>> = text
            .split_inclusive(' ')
            .map(|token| Ok(token.to_string()))
            .collect();
        Ok(futures::stream::iter(tokens).boxed())
    }
}

/// Returns the same rows for every query, except those mentioning `fail_on`
pub struct FakeRunner {
    rows: Vec<Row>,
    fail_on: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl FakeRunner {
    pub fn returning(rows: Vec<Row>) -> Self {
        Self {
            rows,
            fail_on: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryRunner for FakeRunner {
    async fn fetch_rows(&self, sql: &str) -> Result<Vec<Row>, ExecutionError> {
        self.calls.lock().unwrap().push(sql.to_string());
        match &self.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => Err(ExecutionError::Database(format!(
                "Table 'RDP_DAILY.{}' doesn't exist",
                needle
            ))),
            _ => Ok(self.rows.clone()),
        }
    }
}

pub fn row(value: serde_json::Value) -> Row {
    value.as_object().cloned().unwrap_or_default()
}
