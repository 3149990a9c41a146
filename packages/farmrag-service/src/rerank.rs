use std::{cmp::Ordering, collections::HashSet, sync::Arc};

use farmrag_config::ProviderConfig;

use crate::{RerankProvider, Result, candidate::ScoredCandidate};

/// Cross-encoder precision gate applied to the fused shortlist.
pub struct Reranker {
	provider: Arc<dyn RerankProvider>,
	cfg: ProviderConfig,
}
impl Reranker {
	pub fn new(provider: Arc<dyn RerankProvider>, cfg: ProviderConfig) -> Self {
		Self { provider, cfg }
	}

	/// Scores every candidate against `query` and returns the best `top_k`, highest relevance
	/// first. An empty candidate list never reaches the provider.
	pub async fn rerank(
		&self,
		query: &str,
		candidates: &[ScoredCandidate],
		top_k: usize,
	) -> Result<Vec<ScoredCandidate>> {
		let top_n = top_k.min(candidates.len());

		if top_n == 0 {
			return Ok(Vec::new());
		}

		let docs: Vec<String> =
			candidates.iter().map(|candidate| candidate.chunk.content.clone()).collect();
		let hits = self.provider.rerank(&self.cfg, query, &docs, top_n).await?;
		let mut seen = HashSet::new();
		let mut out = Vec::with_capacity(top_n);

		for hit in hits {
			let Some(candidate) = candidates.get(hit.index) else {
				tracing::warn!(
					index = hit.index,
					candidates = candidates.len(),
					"Rerank provider returned an out-of-range index."
				);

				continue;
			};

			if !hit.relevance_score.is_finite() || !seen.insert(hit.index) {
				continue;
			}

			out.push(candidate.with_relevance(hit.relevance_score.clamp(0.0, 1.0)));
		}

		out.sort_by(|a, b| {
			b.relevance_score.partial_cmp(&a.relevance_score).unwrap_or(Ordering::Equal)
		});
		out.truncate(top_n);

		Ok(out)
	}

	/// `rerank` followed by dropping every candidate scored below `threshold`. Empty output means
	/// nothing was relevant enough.
	pub async fn rerank_with_threshold(
		&self,
		query: &str,
		candidates: &[ScoredCandidate],
		threshold: f32,
		top_k: usize,
	) -> Result<Vec<ScoredCandidate>> {
		let reranked = self.rerank(query, candidates, top_k).await?;
		let before = reranked.len();
		let kept: Vec<ScoredCandidate> = reranked
			.into_iter()
			.filter(|candidate| candidate.relevance_score.is_some_and(|score| score >= threshold))
			.collect();

		tracing::info!(reranked = before, kept = kept.len(), threshold, "Rerank finished.");

		Ok(kept)
	}
}
