//! BoxLlmClient -- object-safe dynamic dispatch wrapper for LlmClient.
//!
//! 1. Define an object-safe `LlmClientDyn` trait with boxed futures
//! 2. Blanket-impl `LlmClientDyn` for all `T: LlmClient`
//! 3. `BoxLlmClient` wraps `Box<dyn LlmClientDyn>` and delegates

use std::future::Future;
use std::pin::Pin;

use cogflow_types::llm::LlmError;

use super::client::LlmClient;

/// Object-safe version of [`LlmClient`] with boxed futures.
pub trait LlmClientDyn: Send + Sync {
    fn name(&self) -> &str;

    fn query_boxed<'a>(
        &'a self,
        prompt: &'a str,
        model: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>>;
}

/// Blanket implementation: any `LlmClient` automatically implements `LlmClientDyn`.
impl<T: LlmClient> LlmClientDyn for T {
    fn name(&self) -> &str {
        LlmClient::name(self)
    }

    fn query_boxed<'a>(
        &'a self,
        prompt: &'a str,
        model: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, LlmError>> + Send + 'a>> {
        Box::pin(self.query(prompt, model))
    }
}

/// Type-erased LLM client, shared by the transformer tasks through an `Arc`.
pub struct BoxLlmClient {
    inner: Box<dyn LlmClientDyn + Send + Sync>,
}

impl BoxLlmClient {
    /// Wrap a concrete `LlmClient` in a type-erased box.
    pub fn new<T: LlmClient + 'static>(client: T) -> Self {
        Self {
            inner: Box::new(client),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Send `prompt` to `model` and return the completion text.
    pub async fn query(&self, prompt: &str, model: &str) -> Result<String, LlmError> {
        self.inner.query_boxed(prompt, model).await
    }
}

impl std::fmt::Debug for BoxLlmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxLlmClient")
            .field("name", &self.name())
            .finish()
    }
}
