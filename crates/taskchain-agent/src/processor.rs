//! Content processor seam.
//!
//! The generation pipeline is an external collaborator: it is handed a
//! task id and a topic and must come back with a result string. It may be
//! slow and it may fail; timeouts and the retry schedule are the agent's
//! concern, not the processor's.

use async_trait::async_trait;
use thiserror::Error;

use taskchain_core::TaskId;

/// Errors signalled by a content processor.
#[derive(Debug, Error)]
pub enum ProcessorError {
    /// Generation failed; retryable per the agent's policy.
    #[error("Content generation failed: {0}")]
    Failed(String),

    /// The processor cannot take work right now.
    #[error("Processor unavailable: {0}")]
    Unavailable(String),
}

/// Maps `(task_id, topic)` to generated content.
#[async_trait]
pub trait Processor: Send + Sync {
    /// Generate content for `topic`. May take significant time.
    async fn process(&self, id: TaskId, topic: &str) -> Result<String, ProcessorError>;
}

/// Built-in processor producing a deterministic draft.
///
/// Stands in for the real multi-step generation pipeline so the agent runs
/// end-to-end without one attached. Output depends only on the topic.
pub struct DraftProcessor;

#[async_trait]
impl Processor for DraftProcessor {
    async fn process(&self, _id: TaskId, topic: &str) -> Result<String, ProcessorError> {
        Ok(format!(
            "# {topic}\n\n\
             An overview of {topic}, prepared for on-chain publication.\n\n\
             This draft outlines the context around {topic}, the questions \
             it raises, and the directions worth watching. Replace the \
             draft processor with a full generation pipeline to produce \
             publishable content."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_draft_processor_is_deterministic() {
        let processor = DraftProcessor;
        let a = processor.process(TaskId::new(1), "Web3").await.unwrap();
        let b = processor.process(TaskId::new(2), "Web3").await.unwrap();
        assert_eq!(a, b);
        assert!(a.contains("Web3"));
    }
}
