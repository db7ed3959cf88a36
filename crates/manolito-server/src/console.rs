//! Interactive terminal chat
//!
//! Reads questions line by line, shows the generated SQL, and streams the
//! answer as the model writes it. `salir` or end of input quits.

use colored::Colorize;
use futures::StreamExt;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use thiserror::Error;

use crate::assistant::Assistant;
use crate::llm::LlmError;
use crate::planner::PlannerError;
use crate::synthesizer::SynthesisError;

const PROMPT: &str = "Tú: ";

#[derive(Debug, Error)]
pub enum TurnError {
    #[error(transparent)]
    Planner(#[from] PlannerError),

    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error("answer stream interrupted: {0}")]
    Stream(#[from] LlmError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub fn is_exit_command(line: &str) -> bool {
    line.trim().to_lowercase() == "salir"
}

/// Answer one question, writing progress and the streamed answer to `out`
pub async fn run_turn<W: Write>(
    assistant: &Assistant,
    question: &str,
    out: &mut W,
) -> Result<(), TurnError> {
    writeln!(out, "\n{}\n", "[Generando SQL desde la pregunta...]".dimmed())?;
    let plan = assistant.plan(question).await?;

    writeln!(out, "{}", "[Consultas generadas por la IA:]".bold())?;
    for (idx, spec) in plan.queries.iter().enumerate() {
        writeln!(out, "\n#{} {}\n{}\n", idx + 1, spec.description, spec.sql.cyan())?;
    }
    for rejected in &plan.rejected {
        writeln!(
            out,
            "{} {} ({})",
            "[Consulta descartada]".yellow(),
            rejected.sql,
            rejected.reason
        )?;
    }

    writeln!(out, "{}\n", "[Ejecutando consultas en MySQL...]".dimmed())?;
    let results = assistant.execute(&plan.queries).await;

    writeln!(out, "{}\n", "[Respuesta de la IA basada en los datos:]".bold())?;
    let mut tokens = assistant.answer_stream(question, &results).await?;
    while let Some(token) = tokens.next().await {
        out.write_all(token?.as_bytes())?;
        out.flush()?;
    }
    writeln!(out)?;

    Ok(())
}

/// Read-answer loop on the terminal
pub async fn run(assistant: &Assistant) -> Result<(), ReadlineError> {
    let mut editor = DefaultEditor::new()?;
    let mut stdout = std::io::stdout();

    println!("{}", "--ManolitoDB Chat--".bold());
    println!("Escribe 'salir' para terminar.\n");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err),
        };

        if is_exit_command(&line) {
            break;
        }
        if line.trim().is_empty() {
            continue;
        }
        if let Err(err) = editor.add_history_entry(line.as_str()) {
            tracing::debug!(error = %err, "Could not record history entry");
        }

        if let Err(err) = run_turn(assistant, &line, &mut stdout).await {
            tracing::error!(error = %err, "Chat turn failed");
            eprintln!("{} {}", "Error en el proceso:".red(), err);
        }
    }

    Ok(())
}
