//! Canned-response LLM client for running workflows without a model backend.

use cogflow_core::llm::LlmClient;
use cogflow_types::llm::LlmError;

/// Returns a fixed response chosen by keywords in the prompt.
///
/// - "summary" / "summarize" -> a mock summary
/// - "action" / "strategy" -> a mock action plan
/// - anything else -> a character count
#[derive(Debug, Default, Clone, Copy)]
pub struct MockLlmClient;

impl MockLlmClient {
    pub fn new() -> Self {
        Self
    }

    fn respond(prompt: &str, model: &str) -> String {
        let lower = prompt.to_lowercase();
        if lower.contains("summary") || lower.contains("summarize") {
            format!(
                "[[Mock Summary using {model}]]: The text discusses key concepts X, Y, and Z. It argues that..."
            )
        } else if lower.contains("action") || lower.contains("strategy") {
            format!("[[Mock Action Plan using {model}]]:\n1. Do this.\n2. Do that.\n3. Profit.")
        } else {
            format!(
                "[[Mock Response using {model}]]: Processed {} characters.",
                prompt.chars().count()
            )
        }
    }
}

impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn query(&self, prompt: &str, model: &str) -> Result<String, LlmError> {
        tracing::debug!(model, prompt_chars = prompt.len(), "mock LLM query");
        Ok(Self::respond(prompt, model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_summary_keyword() {
        let out = MockLlmClient.query("Please SUMMARIZE this", "m").await.unwrap();
        assert!(out.starts_with("[[Mock Summary using m]]"));
    }

    #[tokio::test]
    async fn test_action_keyword() {
        let out = MockLlmClient.query("Draft a strategy", "default").await.unwrap();
        assert_eq!(
            out,
            "[[Mock Action Plan using default]]:\n1. Do this.\n2. Do that.\n3. Profit."
        );
    }

    #[tokio::test]
    async fn test_fallback_counts_characters() {
        let out = MockLlmClient.query("héllo", "m").await.unwrap();
        assert_eq!(out, "[[Mock Response using m]]: Processed 5 characters.");
    }
}
