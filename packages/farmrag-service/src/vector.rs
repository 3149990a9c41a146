use std::sync::Arc;

use futures::future;

use crate::{
	DocumentStore, Result,
	candidate::{Channel, ScoredCandidate},
	embedder::Embedder,
};

/// Semantic nearest-neighbour retrieval over chunk embeddings.
pub struct VectorSearch {
	store: Arc<dyn DocumentStore>,
	embedder: Arc<Embedder>,
}
impl VectorSearch {
	pub fn new(store: Arc<dyn DocumentStore>, embedder: Arc<Embedder>) -> Self {
		Self { store, embedder }
	}

	/// The `k` most similar chunks by cosine similarity. Chunks without an embedding never match.
	pub async fn search(&self, query: &str, k: u32) -> Result<Vec<ScoredCandidate>> {
		let query_vec = self.embedder.embed_query(query).await?;

		self.nearest(&query_vec, k).await
	}

	/// Runs one search per query and concatenates the lists in query order without deduplication.
	pub async fn search_multi(&self, queries: &[String], k: u32) -> Result<Vec<ScoredCandidate>> {
		if queries.is_empty() {
			return Ok(Vec::new());
		}

		// One provider call covers every variant.
		let vectors = self.embedder.embed(queries).await?;
		let lists =
			future::try_join_all(vectors.iter().map(|query_vec| self.nearest(query_vec, k))).await?;
		let out: Vec<ScoredCandidate> = lists.into_iter().flatten().collect();

		tracing::info!(queries = queries.len(), hits = out.len(), "Vector search finished.");

		Ok(out)
	}

	async fn nearest(&self, query_vec: &[f32], k: u32) -> Result<Vec<ScoredCandidate>> {
		let rows = self.store.nearest_chunks(query_vec, k).await?;

		Ok(rows.into_iter().map(|row| ScoredCandidate::from_row(row, Channel::Vector)).collect())
	}
}
