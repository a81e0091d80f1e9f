//! Prompt templates for grounded answering and summarization

use crate::providers::ChatMessage;
use crate::types::ScoredChunk;

const GROUNDED_SYSTEM_PROMPT: &str = "You are a policy information verification assistant. \
You answer questions about official policies using only the documents you are given.
Follow the rules:
- Base every response strictly on the provided context chunks extracted from official publications.
- If the context does not contain the answer, say that you cannot confirm it and suggest consulting the official, authoritative sources.
- Highlight whether a claim seems supported, partially supported, or not supported by the context.
- Cite the source file names in parentheses.
";

const SUMMARY_SYSTEM_PROMPT: &str = "You compress policy context into clear summaries.";

/// Prompt builder for RAG queries
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render retrieved chunks as `Source: <name>` blocks separated by blank lines
    pub fn build_context(chunks: &[ScoredChunk]) -> String {
        chunks
            .iter()
            .map(|c| format!("Source: {}\n{}", c.source_name(), c.text()))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Messages for a grounded, cited answer
    pub fn answer_messages(question: &str, chunks: &[ScoredChunk]) -> Vec<ChatMessage> {
        let user = format!(
            "Context:\n{}\n\nQuestion: {}\nAnswer in a factual tone and cite sources in parentheses.",
            Self::build_context(chunks),
            question
        );
        vec![
            ChatMessage::system(GROUNDED_SYSTEM_PROMPT),
            ChatMessage::user(user),
        ]
    }

    /// Messages for a bullet-point summary of the retrieved context
    pub fn summary_messages(chunks: &[ScoredChunk]) -> Vec<ChatMessage> {
        let user = format!(
            "Summarize the key policy facts from the context below in bullet points so a member of the public can understand them.\n\nContext:\n{}",
            Self::build_context(chunks)
        );
        vec![
            ChatMessage::system(SUMMARY_SYSTEM_PROMPT),
            ChatMessage::user(user),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::Role;
    use crate::types::{Chunk, DocumentMetadata, FileType, SourceDocument};

    fn scored(name: &str, text: &str) -> ScoredChunk {
        let doc = SourceDocument::new(
            text.to_string(),
            DocumentMetadata {
                source_name: name.to_string(),
                relative_path: name.to_string(),
                file_type: FileType::Markdown,
                page_count: None,
            },
        );
        ScoredChunk {
            chunk: Chunk::new(&doc, text.to_string(), 0),
            score: 0.5,
        }
    }

    #[test]
    fn test_answer_messages_layout() {
        let chunks = vec![
            scored("faq1.md", "Withdrawals start at 55."),
            scored("faq2.md", "Payouts start at 65."),
        ];
        let messages = PromptBuilder::answer_messages("When can I withdraw?", &chunks);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::System);
        assert!(messages[0].content.contains("partially supported"));
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(
            messages[1].content,
            "Context:\nSource: faq1.md\nWithdrawals start at 55.\n\nSource: faq2.md\nPayouts start at 65.\n\n\
Question: When can I withdraw?\nAnswer in a factual tone and cite sources in parentheses."
        );
    }

    #[test]
    fn test_summary_messages() {
        let messages = PromptBuilder::summary_messages(&[scored("faq1.md", "Fact.")]);
        assert_eq!(messages[0].content, SUMMARY_SYSTEM_PROMPT);
        assert!(messages[1].content.contains("bullet points"));
        assert!(messages[1].content.ends_with("Context:\nSource: faq1.md\nFact."));
    }
}
