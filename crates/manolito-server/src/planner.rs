//! Question → SQL planning
//!
//! One deterministic model call. The reply must be the bare JSON object
//! described in [`SYSTEM_PROMPT`]; it is validated into a [`Plan`] before any
//! query reaches the database.

use manolito_ir::{Plan, PlanError};
use std::sync::Arc;
use thiserror::Error;

use crate::llm::{ChatModel, ChatPrompt, LlmError};

/// Instructions for the planning call
pub const SYSTEM_PROMPT: &str = r#"Eres un asistente que traduce preguntas en español sobre producción de tornillos
a consultas SQL de MySQL. SOLO puedes usar SELECT (nunca INSERT, UPDATE, DELETE, DROP, etc.).

Devuelve EXCLUSIVAMENTE un JSON válido con este formato:

{
  "queries": [
    {
      "description": "explicación breve de qué calcula esta query",
      "sql": "SELECT ... "
    }
  ]
}

No incluyas texto fuera del JSON, ni explicaciones adicionales."#;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("the model returned no content for the queries")]
    ContentMissing,

    #[error(transparent)]
    Parse(serde_json::Error),

    #[error("the model's JSON has no 'queries' array")]
    SchemaViolation,

    #[error(transparent)]
    Llm(#[from] LlmError),
}

impl From<PlanError> for PlannerError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::Parse(e) => PlannerError::Parse(e),
            PlanError::SchemaViolation => PlannerError::SchemaViolation,
        }
    }
}

pub struct Planner {
    model: Arc<dyn ChatModel>,
    schema: String,
}

impl Planner {
    pub fn new(model: Arc<dyn ChatModel>, schema: impl Into<String>) -> Self {
        Self {
            model,
            schema: schema.into(),
        }
    }

    pub fn prompt(&self, question: &str) -> ChatPrompt {
        ChatPrompt {
            system: SYSTEM_PROMPT.to_string(),
            user: format!(
                "Esquema de la base de datos:\n\n{}\n\nPregunta del usuario:\n{}",
                self.schema, question
            ),
            temperature: Some(0.0),
        }
    }

    /// Ask the model for queries answering `question`
    ///
    /// Entries that are not single read-only SELECTs end up in
    /// [`Plan::rejected`], never in [`Plan::queries`].
    pub async fn plan(&self, question: &str) -> Result<Plan, PlannerError> {
        let content = self
            .model
            .complete(&self.prompt(question))
            .await?
            .filter(|text| !text.is_empty())
            .ok_or(PlannerError::ContentMissing)?;

        tracing::debug!(%content, "Planner response");

        let plan = Plan::from_model_output(&content).map_err(|err| {
            if let PlanError::Parse(_) = err {
                tracing::error!(%content, "Failed to parse the JSON returned by the model");
            }
            PlannerError::from(err)
        })?;

        tracing::info!(
            accepted = plan.queries.len(),
            rejected = plan.rejected.len(),
            "Queries planned"
        );

        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SCHEMA_DESCRIPTION;
    use crate::testing::FakeModel;

    #[test]
    fn test_prompt_shape() {
        let planner = Planner::new(Arc::new(FakeModel::new(vec![])), SCHEMA_DESCRIPTION);
        let prompt = planner.prompt("¿Qué planta produjo más?");

        assert!(prompt.system.contains("SOLO puedes usar SELECT"));
        assert!(prompt.system.contains("\"queries\""));
        assert!(prompt.user.starts_with("Esquema de la base de datos:"));
        assert!(prompt.user.contains("D_RDP_TORNILLOS"));
        assert!(prompt.user.ends_with("Pregunta del usuario:\n¿Qué planta produjo más?"));
        assert_eq!(prompt.temperature, Some(0.0));
    }

    #[tokio::test]
    async fn test_plan_keeps_only_selects() {
        let model = Arc::new(FakeModel::new(vec![Some(
            r#"{"queries": [
                {"description": "producción total", "sql": "SELECT SUM(CANTIDAD_PRODUCIDA) FROM D_RDP_TORNILLOS"},
                {"description": "limpieza", "sql": "DROP TABLE D_RDP_TORNILLOS"}
            ]}"#
            .to_string(),
        )]));
        let planner = Planner::new(model.clone(), SCHEMA_DESCRIPTION);

        let plan = planner.plan("¿Cuánto se produjo?").await.unwrap();

        assert_eq!(plan.queries.len(), 1);
        assert_eq!(plan.queries[0].description, "producción total");
        assert_eq!(plan.rejected.len(), 1);
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_content() {
        let planner = Planner::new(Arc::new(FakeModel::new(vec![None])), SCHEMA_DESCRIPTION);
        let err = planner.plan("hola").await.unwrap_err();
        assert!(matches!(err, PlannerError::ContentMissing));

        let planner = Planner::new(
            Arc::new(FakeModel::new(vec![Some(String::new())])),
            SCHEMA_DESCRIPTION,
        );
        let err = planner.plan("hola").await.unwrap_err();
        assert!(matches!(err, PlannerError::ContentMissing));
    }

    #[tokio::test]
    async fn test_not_json() {
        let planner = Planner::new(
            Arc::new(FakeModel::new(vec![Some("not json".to_string())])),
            SCHEMA_DESCRIPTION,
        );
        let err = planner.plan("hola").await.unwrap_err();
        assert!(matches!(err, PlannerError::Parse(_)));
    }

    #[tokio::test]
    async fn test_schema_violation() {
        let planner = Planner::new(
            Arc::new(FakeModel::new(vec![Some(r#"{"consultas": []}"#.to_string())])),
            SCHEMA_DESCRIPTION,
        );
        let err = planner.plan("hola").await.unwrap_err();
        assert!(matches!(err, PlannerError::SchemaViolation));
    }
}
