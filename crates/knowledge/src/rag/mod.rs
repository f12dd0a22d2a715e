//! Grounded answering: retrieve one document (or search the web), render it
//! into a prompt and stream the generator's answer.

pub mod ask;
pub mod prompt;
pub mod types;
pub mod web;

pub use ask::{answer, ask, collect_answer};
pub use prompt::{PromptBuilder, DEFAULT_TEMPLATE};
pub use types::{RagAnswer, RagOptions, RagResponse, WebAnswer};
pub use web::{ask_web, WebPromptBuilder, WEB_TEMPLATE};
