use farmrag_config::Search;

use crate::{
	Result,
	candidate::{Channel, ScoredCandidate},
	fusion,
	lexical::LexicalSearch,
	transform::{QueryTransformation, QueryTransformer},
	vector::VectorSearch,
};

/// Everything one hybrid search produced, for callers that report more than the ranking.
#[derive(Clone, Debug)]
pub struct HybridOutcome {
	pub transformation: QueryTransformation,
	pub vector_hits: usize,
	pub lexical_hits: usize,
	/// The channel that failed and was replaced by an empty list, if any.
	pub degraded: Option<Channel>,
	pub candidates: Vec<ScoredCandidate>,
}

pub struct HybridSearch {
	transformer: QueryTransformer,
	vector: VectorSearch,
	lexical: LexicalSearch,
	cfg: Search,
}
impl HybridSearch {
	pub fn new(
		transformer: QueryTransformer,
		vector: VectorSearch,
		lexical: LexicalSearch,
		cfg: Search,
	) -> Self {
		Self { transformer, vector, lexical, cfg }
	}

	pub fn transformer(&self) -> &QueryTransformer {
		&self.transformer
	}

	pub fn vector(&self) -> &VectorSearch {
		&self.vector
	}

	pub fn lexical(&self) -> &LexicalSearch {
		&self.lexical
	}

	/// Fused candidates for `query`, best first. Reranking is left to the caller.
	pub async fn search(
		&self,
		query: &str,
		use_transformation: bool,
		top_k: usize,
	) -> Result<Vec<ScoredCandidate>> {
		Ok(self.search_detailed(query, use_transformation, top_k).await?.candidates)
	}

	pub async fn search_detailed(
		&self,
		query: &str,
		use_transformation: bool,
		top_k: usize,
	) -> Result<HybridOutcome> {
		let query = farmrag_domain::text::normalize_query(query);

		if query.is_empty() {
			return Ok(HybridOutcome {
				transformation: QueryTransformation::passthrough(&query),
				vector_hits: 0,
				lexical_hits: 0,
				degraded: None,
				candidates: Vec::new(),
			});
		}

		let transformation = if use_transformation {
			self.transformer.transform(&query).await
		} else {
			QueryTransformation::passthrough(&query)
		};
		let variants = &transformation.variants;
		let (vector_res, lexical_res) = tokio::join!(
			self.vector.search_multi(variants, self.cfg.vector_k),
			self.lexical.search_multi(variants, self.cfg.lexical_k),
		);
		let (vector, lexical, degraded) = self.settle(vector_res, lexical_res)?;
		let candidates = fusion::reciprocal_rank_fusion(&vector, &lexical, self.cfg.rrf_k, top_k);

		tracing::info!(
			variants = variants.len(),
			vector_hits = vector.len(),
			lexical_hits = lexical.len(),
			fused = candidates.len(),
			"Hybrid search finished."
		);

		for candidate in &candidates {
			tracing::debug!(
				chunk_id = %candidate.chunk_id(),
				filename = candidate.chunk.filename.as_str(),
				provenance = candidate.provenance.as_str(),
				rrf_score = candidate.rrf_score.unwrap_or_default(),
				"Fused candidate."
			);
		}

		Ok(HybridOutcome {
			vector_hits: vector.len(),
			lexical_hits: lexical.len(),
			transformation,
			degraded,
			candidates,
		})
	}

	/// Applies the partial-failure policy: with `allow_partial`, one failed channel is replaced by
	/// an empty list. Two failures, or any failure without `allow_partial`, propagate.
	fn settle(
		&self,
		vector: Result<Vec<ScoredCandidate>>,
		lexical: Result<Vec<ScoredCandidate>>,
	) -> Result<(Vec<ScoredCandidate>, Vec<ScoredCandidate>, Option<Channel>)> {
		match (vector, lexical) {
			(Ok(vector), Ok(lexical)) => Ok((vector, lexical, None)),
			(Err(err), Ok(lexical)) if self.cfg.allow_partial => {
				tracing::warn!(error = %err, "Vector channel failed; fusing lexical results only.");

				Ok((Vec::new(), lexical, Some(Channel::Vector)))
			},
			(Ok(vector), Err(err)) if self.cfg.allow_partial => {
				tracing::warn!(error = %err, "Lexical channel failed; fusing vector results only.");

				Ok((vector, Vec::new(), Some(Channel::Lexical)))
			},
			(Err(err), _) | (_, Err(err)) => Err(err),
		}
	}
}
