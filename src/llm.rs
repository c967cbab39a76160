//! Hosted model service abstraction
//!
//! The session core talks to the hosted model through this seam: one-shot
//! completion for the turn request and an incremental fragment stream for
//! the narrated follow-up.

mod error;
mod gemini;
mod types;

pub use error::{ModelError, ModelErrorKind};
pub use gemini::{GeminiModel, GeminiService};
pub use types::*;

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::sync::Arc;

/// A lazy, finite, non-restartable sequence of text fragments.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ModelError>> + Send>>;

/// Interface to the hosted model's text operations
#[async_trait]
pub trait ModelService: Send + Sync {
    /// One-shot generation over the full conversation history.
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError>;

    /// Incremental generation: fragments of the final narrated text.
    async fn stream(&self, request: &ModelRequest) -> Result<TextStream, ModelError>;

    /// Identifier of the backing model (for logging)
    fn model_id(&self) -> &str;
}

#[async_trait]
impl<T: ModelService + ?Sized> ModelService for Arc<T> {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        (**self).complete(request).await
    }

    async fn stream(&self, request: &ModelRequest) -> Result<TextStream, ModelError> {
        (**self).stream(request).await
    }

    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// Logging wrapper around a model service
pub struct LoggingService<M> {
    inner: M,
}

impl<M: ModelService> LoggingService<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<M: ModelService> ModelService for LoggingService<M> {
    async fn complete(&self, request: &ModelRequest) -> Result<ModelResponse, ModelError> {
        let start = std::time::Instant::now();
        let result = self.inner.complete(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::info!(
                    model = %self.inner.model_id(),
                    duration_ms = %duration.as_millis(),
                    input_tokens = response.usage.input_tokens,
                    output_tokens = response.usage.output_tokens,
                    tool_calls = response.tool_calls().len(),
                    "model request completed"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.inner.model_id(),
                    duration_ms = %duration.as_millis(),
                    error = %e,
                    retryable = e.kind.is_retryable(),
                    "model request failed"
                );
            }
        }

        result
    }

    async fn stream(&self, request: &ModelRequest) -> Result<TextStream, ModelError> {
        tracing::debug!(model = %self.inner.model_id(), "opening fragment stream");
        self.inner.stream(request).await
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
