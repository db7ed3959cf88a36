//! Manolito - natural-language chat over the screw production database
//!
//! A question goes to the language model, which proposes read-only SQL; the
//! queries run against MySQL, and the model turns the rows into a short
//! Spanish answer. Served over HTTP (`http`) or an interactive terminal
//! (`console`).

pub mod assistant;
pub mod config;
pub mod console;
pub mod http;
pub mod llm;
pub mod logging;
pub mod planner;
pub mod schema;
pub mod synthesizer;

#[cfg(test)]
mod testing;

pub use assistant::{Assistant, AssistantError, Exchange};
pub use config::Config;
