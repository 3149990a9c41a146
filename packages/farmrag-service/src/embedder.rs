//! Process-wide guard around the embedding provider.
//!
//! One `Embedder` is shared by query-time vector search and ingestion. Every provider call runs
//! under a single async mutex that also spaces calls `interval` apart, so concurrent ingestion jobs
//! queue instead of overrunning the provider quota.

use std::{sync::Arc, time::Duration};

use tokio::{
	sync::Mutex,
	time::{self, Instant},
};

use farmrag_config::{EmbeddingPacing, EmbeddingProviderConfig};

use crate::{EmbeddingProvider, Error, Result};

#[derive(Clone, Debug)]
pub struct PacingPolicy {
	pub interval: Duration,
	pub max_retries: u32,
	pub base_backoff: Duration,
	pub max_backoff: Duration,
	pub batch_size: usize,
}
impl PacingPolicy {
	/// Backoff before retry number `attempt` (0-based): `base * 2^attempt`, capped.
	pub fn backoff_for(&self, attempt: u32) -> Duration {
		let factor = 2_u32.saturating_pow(attempt);

		self.base_backoff.saturating_mul(factor).min(self.max_backoff)
	}
}
impl From<&EmbeddingPacing> for PacingPolicy {
	fn from(cfg: &EmbeddingPacing) -> Self {
		Self {
			interval: Duration::from_millis(cfg.interval_ms),
			max_retries: cfg.max_retries,
			base_backoff: Duration::from_millis(cfg.base_backoff_ms),
			max_backoff: Duration::from_millis(cfg.max_backoff_ms),
			batch_size: (cfg.batch_size as usize).max(1),
		}
	}
}

pub struct Embedder {
	provider: Arc<dyn EmbeddingProvider>,
	cfg: EmbeddingProviderConfig,
	policy: PacingPolicy,
	last_call: Mutex<Option<Instant>>,
}
impl Embedder {
	pub fn new(
		provider: Arc<dyn EmbeddingProvider>,
		cfg: EmbeddingProviderConfig,
		policy: PacingPolicy,
	) -> Self {
		Self { provider, cfg, policy, last_call: Mutex::new(None) }
	}

	pub fn policy(&self) -> &PacingPolicy {
		&self.policy
	}

	pub fn dimensions(&self) -> usize {
		self.cfg.dimensions as usize
	}

	/// Embeds `texts` in one provider call. The gate is held for the whole call, retries included.
	pub async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		if texts.is_empty() {
			return Ok(Vec::new());
		}

		let mut last_call = self.last_call.lock().await;
		let mut attempt: u32 = 0;

		loop {
			if let Some(previous) = *last_call {
				time::sleep_until(previous + self.policy.interval).await;
			}

			*last_call = Some(Instant::now());

			match self.provider.embed(&self.cfg, texts).await {
				Ok(vectors) => return self.check_vectors(texts.len(), vectors),
				Err(err) if err.is_rate_limited() => {
					if attempt >= self.policy.max_retries {
						return Err(Error::RateLimitExhausted {
							attempts: attempt + 1,
							message: err.to_string(),
						});
					}

					let backoff = self.policy.backoff_for(attempt);

					tracing::warn!(
						error = %err,
						attempt = attempt + 1,
						backoff_ms = backoff.as_millis() as u64,
						"Embedding provider rate limited; backing off."
					);

					time::sleep(backoff).await;

					attempt += 1;
				},
				Err(err) => return Err(err.into()),
			}
		}
	}

	pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
		let mut vectors = self.embed(&[text.to_string()]).await?;

		vectors.pop().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})
	}

	/// Embeds any number of texts in `batch_size` slices, releasing the gate between slices.
	pub async fn embed_batched(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		let mut out = Vec::with_capacity(texts.len());

		for batch in texts.chunks(self.policy.batch_size) {
			out.extend(self.embed(batch).await?);
		}

		Ok(out)
	}

	fn check_vectors(&self, expected: usize, vectors: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>> {
		if vectors.len() != expected {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for {expected} inputs.",
					vectors.len()
				),
			});
		}

		let dim = self.dimensions();

		if let Some(bad) = vectors.iter().find(|vec| vec.len() != dim) {
			return Err(Error::Provider {
				message: format!(
					"Embedding vector dimension mismatch: expected {dim}, got {}.",
					bad.len()
				),
			});
		}

		Ok(vectors)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn policy() -> PacingPolicy {
		PacingPolicy {
			interval: Duration::from_millis(200),
			max_retries: 5,
			base_backoff: Duration::from_millis(2_000),
			max_backoff: Duration::from_millis(60_000),
			batch_size: 100,
		}
	}

	#[test]
	fn backoff_doubles_and_caps() {
		let policy = policy();

		assert_eq!(policy.backoff_for(0), Duration::from_millis(2_000));
		assert_eq!(policy.backoff_for(1), Duration::from_millis(4_000));
		assert_eq!(policy.backoff_for(4), Duration::from_millis(32_000));
		assert_eq!(policy.backoff_for(5), Duration::from_millis(60_000));
		assert_eq!(policy.backoff_for(40), Duration::from_millis(60_000));
	}

	#[test]
	fn zero_batch_size_is_clamped() {
		let cfg = EmbeddingPacing { batch_size: 0, ..EmbeddingPacing::default() };

		assert_eq!(PacingPolicy::from(&cfg).batch_size, 1);
	}
}
