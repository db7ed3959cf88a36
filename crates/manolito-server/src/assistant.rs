//! The question → answer pipeline
//!
//! Planner call, then every accepted query in order, then the synthesizer
//! call. Model and database are injected so both front ends (and the tests)
//! share one implementation.

use manolito_ir::{Plan, QueryResult, QuerySpec, RejectedQuery};
use manolito_mysql::{execute_all, QueryRunner};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use crate::llm::{ChatModel, TokenStream};
use crate::planner::{Planner, PlannerError};
use crate::synthesizer::{SynthesisError, Synthesizer};

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("planning failed: {0}")]
    Planner(#[from] PlannerError),

    #[error("answer synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Everything produced while answering one question
#[derive(Debug, Clone, Serialize)]
pub struct Exchange {
    pub answer: String,
    pub queries: Vec<QuerySpec>,
    #[serde(rename = "resultados")]
    pub results: Vec<QueryResult>,
    #[serde(rename = "descartadas", skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedQuery>,
}

pub struct Assistant {
    planner: Planner,
    synthesizer: Synthesizer,
    runner: Arc<dyn QueryRunner>,
}

impl Assistant {
    pub fn new(
        model: Arc<dyn ChatModel>,
        runner: Arc<dyn QueryRunner>,
        schema: &str,
        answer_temperature: f32,
    ) -> Self {
        Self {
            planner: Planner::new(model.clone(), schema),
            synthesizer: Synthesizer::new(model, answer_temperature),
            runner,
        }
    }

    pub async fn plan(&self, question: &str) -> Result<Plan, PlannerError> {
        self.planner.plan(question).await
    }

    pub async fn execute(&self, queries: &[QuerySpec]) -> Vec<QueryResult> {
        execute_all(self.runner.as_ref(), queries).await
    }

    pub async fn answer_stream(
        &self,
        question: &str,
        results: &[QueryResult],
    ) -> Result<TokenStream, SynthesisError> {
        self.synthesizer.answer_stream(question, results).await
    }

    /// Run the whole pipeline and return the finished answer
    pub async fn ask(&self, question: &str) -> Result<Exchange, AssistantError> {
        let started = Instant::now();

        let plan = self.plan(question).await?;
        let results = self.execute(&plan.queries).await;
        let answer = self.synthesizer.answer(question, &results).await?;

        crate::log_event!(
            level: tracing::Level::INFO,
            event: "question_answered",
            queries: plan.queries.len(),
            rejected: plan.rejected.len(),
            failed: results.iter().filter(|r| r.is_error()).count(),
            duration_ms: started.elapsed().as_millis(),
        );

        Ok(Exchange {
            answer,
            queries: plan.queries,
            results,
            rejected: plan.rejected,
        })
    }
}
