//! Batch embedding with retry and rate-limit handling

use crate::error::{classify_failure, EmbeddingError, EmbeddingResult, FailureKind};
use crate::traits::Embedder;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// Wraps an [`Embedder`] with fixed-size batching, bounded retry with
/// exponential backoff, and strict count validation.
///
/// Rate-limit failures consume retry budget but lengthen the delay;
/// auth failures fail immediately; transient failures retry with the
/// normal backoff.
pub struct BatchEmbeddingProcessor {
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    max_retries: u32,
    retry_delay: Duration,
}

impl BatchEmbeddingProcessor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        batch_size: usize,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            embedder,
            batch_size: batch_size.max(1),
            max_retries,
            retry_delay,
        }
    }

    /// The configured batch size
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed all texts, batch by batch.
    ///
    /// # Errors
    ///
    /// Propagates the final classified error once a batch exhausts its
    /// retry budget.
    pub async fn embed_documents_with_retry(
        &self,
        texts: &[String],
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let embeddings = self.embed_batch_with_retry(batch).await?;
            all_embeddings.extend(embeddings);
        }
        Ok(all_embeddings)
    }

    /// Embed a single batch with the retry policy applied.
    ///
    /// # Errors
    ///
    /// Returns the classified error after the retry budget is spent,
    /// or immediately for auth/fatal failures.
    pub async fn embed_batch_with_retry(
        &self,
        batch: &[String],
    ) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match self.embedder.embed_documents(batch).await {
                Ok(embeddings) => {
                    if embeddings.len() != batch.len() {
                        return Err(EmbeddingError::CountMismatch {
                            requested: batch.len(),
                            received: embeddings.len(),
                        });
                    }
                    return Ok(embeddings);
                }
                Err(e) => {
                    let kind = failure_kind(&e);
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_retries + 1,
                        kind = ?kind,
                        "Embedding batch failed: {e}"
                    );

                    match kind {
                        FailureKind::AuthError => {
                            return Err(EmbeddingError::Auth(e.to_string()));
                        }
                        FailureKind::Fatal => return Err(e),
                        FailureKind::RateLimit if attempt < self.max_retries => {
                            // Doubled on top of the exponential curve
                            let delay = self.backoff_delay(attempt) * 2;
                            tracing::info!("Rate limited, retrying in {delay:?}");
                            sleep(delay).await;
                        }
                        FailureKind::Transient if attempt < self.max_retries => {
                            sleep(self.backoff_delay(attempt)).await;
                        }
                        FailureKind::RateLimit => {
                            return Err(EmbeddingError::RateLimited(e.to_string()));
                        }
                        FailureKind::Transient => {
                            return Err(EmbeddingError::Transient(e.to_string()));
                        }
                    }
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| EmbeddingError::Fatal("retry loop exited without error".to_string())))
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.retry_delay * 2_u32.saturating_pow(attempt)
    }
}

/// Map an already-typed error back to its retry class; untyped (fatal)
/// errors get one more chance at text classification.
fn failure_kind(error: &EmbeddingError) -> FailureKind {
    match error {
        EmbeddingError::Auth(_) => FailureKind::AuthError,
        EmbeddingError::RateLimited(_) => FailureKind::RateLimit,
        EmbeddingError::Transient(_) => FailureKind::Transient,
        EmbeddingError::CountMismatch { .. }
        | EmbeddingError::UnsupportedProvider(_)
        | EmbeddingError::Config(_) => FailureKind::Fatal,
        EmbeddingError::Fatal(message) => classify_failure(message),
    }
}
