//! Grounded answer generation

mod answer;
mod prompt;

pub use answer::{AnswerGenerator, NO_DOCUMENTS_TO_SUMMARIZE};
pub use prompt::PromptBuilder;
