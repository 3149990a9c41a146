mod support;

use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use farmrag_config::EmbeddingProviderConfig;
use farmrag_service::{BoxFuture, Embedder, EmbeddingProvider, Error, PacingPolicy};

use support::{DIM, test_config};

/// Fails with a rate limit for the first `rate_limited` calls, then succeeds.
struct FlakyEmbedding {
	rate_limited: usize,
	calls: AtomicUsize,
}
impl FlakyEmbedding {
	fn new(rate_limited: usize) -> Self {
		Self { rate_limited, calls: AtomicUsize::new(0) }
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EmbeddingProvider for FlakyEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, farmrag_providers::Result<Vec<Vec<f32>>>> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst);
		let limited = call < self.rate_limited;
		let vectors = vec![vec![0.5; DIM as usize]; texts.len()];

		Box::pin(async move {
			if limited {
				return Err(farmrag_providers::Error::Status {
					status: 400,
					message: "429 Resource has been exhausted (e.g. check quota).".to_string(),
				});
			}

			Ok(vectors)
		})
	}
}

struct UnauthorizedEmbedding {
	calls: AtomicUsize,
}
impl EmbeddingProvider for UnauthorizedEmbedding {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, farmrag_providers::Result<Vec<Vec<f32>>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move {
			Err(farmrag_providers::Error::Status {
				status: 401,
				message: "Invalid API key.".to_string(),
			})
		})
	}
}

/// Records the highest number of calls in flight at once.
struct ConcurrencyProbe {
	in_flight: AtomicUsize,
	peak: AtomicUsize,
	calls: AtomicUsize,
}
impl EmbeddingProvider for ConcurrencyProbe {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, farmrag_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

			self.peak.fetch_max(now, Ordering::SeqCst);
			self.calls.fetch_add(1, Ordering::SeqCst);
			tokio::time::sleep(Duration::from_millis(5)).await;
			self.in_flight.fetch_sub(1, Ordering::SeqCst);

			Ok(vec![vec![0.0; DIM as usize]; texts.len()])
		})
	}
}

fn embedder(provider: Arc<dyn EmbeddingProvider>) -> Embedder {
	let cfg = test_config();

	Embedder::new(provider, cfg.providers.embedding, PacingPolicy::from(&cfg.embedding_pacing))
}

fn texts(n: usize) -> Vec<String> {
	(0..n).map(|idx| format!("chunk {idx}")).collect()
}

#[tokio::test]
async fn rate_limits_are_retried_until_success() {
	let provider = Arc::new(FlakyEmbedding::new(2));
	let embedder = embedder(provider.clone());
	let vectors = embedder.embed(&texts(2)).await.expect("Embedding failed.");

	assert_eq!(vectors.len(), 2);
	assert_eq!(provider.count(), 3);
}

#[tokio::test]
async fn exhausted_retries_fail_with_rate_limit_error() {
	let provider = Arc::new(FlakyEmbedding::new(usize::MAX));
	let embedder = embedder(provider.clone());
	let err = embedder.embed(&texts(1)).await.expect_err("Expected exhaustion.");

	// One initial attempt plus `max_retries` retries.
	assert!(matches!(err, Error::RateLimitExhausted { attempts: 4, .. }));
	assert_eq!(provider.count(), 4);
}

#[tokio::test]
async fn fatal_errors_are_not_retried() {
	let provider = Arc::new(UnauthorizedEmbedding { calls: AtomicUsize::new(0) });
	let embedder = embedder(provider.clone());
	let err = embedder.embed(&texts(1)).await.expect_err("Expected fatal error.");

	assert!(matches!(err, Error::Provider { .. }));
	assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dimension_mismatch_is_rejected() {
	let mut cfg = test_config();

	cfg.providers.embedding.dimensions = DIM + 1;

	let embedder = Embedder::new(
		Arc::new(FlakyEmbedding::new(0)),
		cfg.providers.embedding,
		PacingPolicy::from(&cfg.embedding_pacing),
	);
	let err = embedder.embed(&texts(1)).await.expect_err("Expected dimension mismatch.");

	assert!(err.to_string().contains("dimension mismatch"));
}

#[tokio::test]
async fn empty_input_skips_the_provider() {
	let provider = Arc::new(FlakyEmbedding::new(0));
	let embedder = embedder(provider.clone());

	assert!(embedder.embed(&[]).await.expect("Embedding failed.").is_empty());
	assert_eq!(provider.count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_callers_are_serialized() {
	let probe = Arc::new(ConcurrencyProbe {
		in_flight: AtomicUsize::new(0),
		peak: AtomicUsize::new(0),
		calls: AtomicUsize::new(0),
	});
	let embedder = Arc::new(embedder(probe.clone()));
	let mut handles = Vec::new();

	for _ in 0..6 {
		let embedder = embedder.clone();

		handles.push(tokio::spawn(async move { embedder.embed(&texts(1)).await }));
	}
	for handle in handles {
		handle.await.expect("Task panicked.").expect("Embedding failed.");
	}

	assert_eq!(probe.calls.load(Ordering::SeqCst), 6);
	assert_eq!(probe.peak.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn batched_embedding_splits_by_batch_size() {
	let provider = Arc::new(FlakyEmbedding::new(0));
	let embedder = embedder(provider.clone());
	let vectors = embedder.embed_batched(&texts(5)).await.expect("Embedding failed.");

	assert_eq!(vectors.len(), 5);
	assert_eq!(provider.count(), 3);
}

#[tokio::test]
async fn calls_are_spaced_by_the_pacing_interval() {
	let mut cfg = test_config();

	cfg.embedding_pacing.interval_ms = 20;

	let embedder = Embedder::new(
		Arc::new(FlakyEmbedding::new(0)),
		cfg.providers.embedding,
		PacingPolicy::from(&cfg.embedding_pacing),
	);
	let started = tokio::time::Instant::now();

	for _ in 0..3 {
		embedder.embed(&texts(1)).await.expect("Embedding failed.");
	}

	assert!(started.elapsed() >= Duration::from_millis(40));
}
