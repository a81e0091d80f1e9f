//! Answer and summary generation over retrieved evidence

use std::sync::Arc;

use super::prompt::PromptBuilder;
use crate::error::{Error, Result};
use crate::providers::LlmProvider;
use crate::types::{AnswerResponse, ScoredChunk};

/// Returned by `summarize` when there is nothing to summarize
pub const NO_DOCUMENTS_TO_SUMMARIZE: &str = "No documents available to summarize.";

/// Turns retrieved chunks into a cited answer or a summary
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl AnswerGenerator {
    /// Generator calling `llm` at `temperature`
    pub fn new(llm: Arc<dyn LlmProvider>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    /// Answer `question` from `evidence`.
    ///
    /// Empty evidence fails with `NoEvidence` without calling the model.
    /// Citations are the evidence's source names in retrieval order,
    /// whatever the model chose to mention.
    pub async fn generate(&self, question: &str, evidence: &[ScoredChunk]) -> Result<AnswerResponse> {
        if evidence.is_empty() {
            return Err(Error::NoEvidence);
        }

        let messages = PromptBuilder::answer_messages(question, evidence);
        tracing::debug!(
            "Generating answer with {} from {} chunks",
            self.llm.model(),
            evidence.len()
        );
        let answer = self.llm.complete(&messages, self.temperature).await?;

        Ok(AnswerResponse::from_evidence(answer, evidence))
    }

    /// Bullet-point summary of the `evidence` retrieved for `question`.
    ///
    /// The summary covers the evidence as a whole; the question only
    /// identifies the request in logs.
    pub async fn summarize(&self, question: &str, evidence: &[ScoredChunk]) -> Result<String> {
        if evidence.is_empty() {
            return Ok(NO_DOCUMENTS_TO_SUMMARIZE.to_string());
        }

        tracing::debug!(
            "Summarizing {} chunks retrieved for {:?}",
            evidence.len(),
            question
        );
        let messages = PromptBuilder::summary_messages(evidence);
        self.llm.complete(&messages, self.temperature).await
    }

    /// Model used for generation
    pub fn model(&self) -> &str {
        self.llm.model()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ChatMessage;
    use crate::types::{Chunk, DocumentMetadata, FileType, SourceDocument};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedLlm {
        reply: Result<String>,
        calls: AtomicUsize,
    }

    impl FixedLlm {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl LlmProvider for FixedLlm {
        async fn complete(&self, messages: &[ChatMessage], _temperature: f32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(messages.len(), 2);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(Error::generation("down")),
            }
        }

        fn name(&self) -> &str {
            "fixed"
        }

        fn model(&self) -> &str {
            "fixed-model"
        }
    }

    fn scored(name: &str, text: &str) -> ScoredChunk {
        let doc = SourceDocument::new(
            text.to_string(),
            DocumentMetadata {
                source_name: name.to_string(),
                relative_path: name.to_string(),
                file_type: FileType::Txt,
                page_count: None,
            },
        );
        ScoredChunk {
            chunk: Chunk::new(&doc, text.to_string(), 0),
            score: 0.8,
        }
    }

    #[tokio::test]
    async fn test_no_evidence_skips_model() {
        let llm = FixedLlm::replying("unused");
        let generator = AnswerGenerator::new(llm.clone(), 0.1);

        let err = generator.generate("anything?", &[]).await.unwrap_err();
        assert!(matches!(err, Error::NoEvidence));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_citations_follow_retrieval() {
        let llm = FixedLlm::replying("Members can withdraw from 55 (faq1.md).");
        let generator = AnswerGenerator::new(llm.clone(), 0.1);
        let evidence = vec![scored("faq1.md", "From age 55."), scored("faq2.md", "Payouts at 65.")];

        let response = generator.generate("When?", &evidence).await.unwrap();
        assert_eq!(response.answer_text, "Members can withdraw from 55 (faq1.md).");
        assert_eq!(response.citations, vec!["faq1.md", "faq2.md"]);
        assert_eq!(response.evidence_texts, vec!["From age 55.", "Payouts at 65."]);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_summarize() {
        let llm = FixedLlm::replying("- fact");
        let generator = AnswerGenerator::new(llm.clone(), 0.1);

        assert_eq!(generator.summarize("anything?", &[]).await.unwrap(), NO_DOCUMENTS_TO_SUMMARIZE);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);

        let summary = generator.summarize("What applies?", &[scored("faq1.md", "Fact.")]).await.unwrap();
        assert_eq!(summary, "- fact");
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_generation_failure_propagates() {
        let llm = Arc::new(FixedLlm {
            reply: Err(Error::generation("down")),
            calls: AtomicUsize::new(0),
        });
        let generator = AnswerGenerator::new(llm, 0.1);
        let err = generator
            .generate("q", &[scored("a.md", "text")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::GenerationBackendUnavailable(_)));
    }
}
