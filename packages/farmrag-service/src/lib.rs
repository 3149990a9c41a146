pub mod candidate;
pub mod embedder;
pub mod fusion;
pub mod hybrid;
pub mod ingest;
pub mod lexical;
pub mod rerank;
pub mod store;
pub mod tool;
pub mod transform;
pub mod vector;

mod error;

pub use candidate::{Channel, Chunk, Provenance, ScoredCandidate};
pub use embedder::{Embedder, PacingPolicy};
pub use error::{Error, Result};
pub use hybrid::{HybridOutcome, HybridSearch};
pub use ingest::{IngestReport, IngestRequest, NewChunk};
pub use lexical::{LexicalSearch, LexicalStrategy};
pub use rerank::Reranker;
pub use store::PgDocumentStore;
pub use tool::{DocumentTool, ToolOutput};
pub use transform::{QueryTransformation, QueryTransformer};
pub use vector::VectorSearch;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

use farmrag_config::{Config, EmbeddingProviderConfig, LlmProviderConfig, ProviderConfig};
use farmrag_providers::{
	completion, embedding,
	rerank::{self as rerank_api, RerankHit},
};
use farmrag_storage::{
	db::Db,
	models::{ChunkListing, DocumentSummary, NewDocChunk, ScoredChunk},
	search::{FullTextParams, TrigramParams},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Provider seams return the provider error so rate limits stay distinguishable from fatal
/// failures until the embedder decides whether to retry.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, farmrag_providers::Result<Vec<Vec<f32>>>>;
}

pub trait RerankProvider
where
	Self: Send + Sync,
{
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, farmrag_providers::Result<Vec<RerankHit>>>;
}

pub trait CompletionProvider
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, farmrag_providers::Result<String>>;
}

/// Everything the pipeline needs from the chunk store.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	fn nearest_chunks<'a>(
		&'a self,
		query_vec: &'a [f32],
		k: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>>;

	fn full_text_chunks<'a>(
		&'a self,
		query: &'a str,
		k: u32,
		params: &'a FullTextParams<'a>,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>>;

	fn trigram_chunks<'a>(
		&'a self,
		query: &'a str,
		k: u32,
		params: &'a TrigramParams,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>>;

	/// Inserts all chunks atomically.
	fn insert_chunks<'a>(&'a self, chunks: &'a [NewDocChunk]) -> BoxFuture<'a, Result<()>>;

	/// Deletes the chunks of `filename` and inserts `chunks` in one transaction. Returns the
	/// number of deleted rows.
	fn replace_chunks<'a>(
		&'a self,
		filename: &'a str,
		chunks: &'a [NewDocChunk],
	) -> BoxFuture<'a, Result<u64>>;

	fn delete_chunks_by_filename<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<u64>>;

	fn count_chunks_for_filename<'a>(&'a self, filename: &'a str)
	-> BoxFuture<'a, Result<i64>>;

	fn list_documents(&self) -> BoxFuture<'_, Result<Vec<DocumentSummary>>>;

	fn list_chunks(&self) -> BoxFuture<'_, Result<Vec<ChunkListing>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub rerank: Arc<dyn RerankProvider>,
	pub completion: Arc<dyn CompletionProvider>,
}
impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		rerank: Arc<dyn RerankProvider>,
		completion: Arc<dyn CompletionProvider>,
	) -> Self {
		Self { embedding, rerank, completion }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), rerank: provider.clone(), completion: provider }
	}
}

/// The retrieval pipeline wired once at startup.
pub struct RetrievalService {
	pub cfg: Config,
	pub store: Arc<dyn DocumentStore>,
	pub providers: Providers,
	pub embedder: Arc<Embedder>,
	pub hybrid: HybridSearch,
	pub reranker: Reranker,
}
impl RetrievalService {
	pub fn new(cfg: Config, db: Db) -> Result<Self> {
		let store = Arc::new(PgDocumentStore::new(db, cfg.storage.documents.vector_dim));

		Self::with_parts(cfg, store, Providers::default())
	}

	pub fn with_parts(
		cfg: Config,
		store: Arc<dyn DocumentStore>,
		providers: Providers,
	) -> Result<Self> {
		let embedder = Arc::new(Embedder::new(
			providers.embedding.clone(),
			cfg.providers.embedding.clone(),
			PacingPolicy::from(&cfg.embedding_pacing),
		));
		let transformer = QueryTransformer::new(
			providers.completion.clone(),
			cfg.providers.llm.clone(),
			cfg.search.expansion.max_variants as usize,
		);
		let vector = VectorSearch::new(store.clone(), embedder.clone());
		let lexical = LexicalSearch::new(store.clone(), cfg.search.lexical.clone())?;
		let hybrid = HybridSearch::new(transformer, vector, lexical, cfg.search.clone());
		let reranker = Reranker::new(providers.rerank.clone(), cfg.providers.rerank.clone());

		Ok(Self { cfg, store, providers, embedder, hybrid, reranker })
	}

	pub fn document_tool(&self) -> DocumentTool<'_> {
		DocumentTool::new(self)
	}
}

struct DefaultProviders;
impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, farmrag_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}
impl RerankProvider for DefaultProviders {
	fn rerank<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
		top_n: usize,
	) -> BoxFuture<'a, farmrag_providers::Result<Vec<RerankHit>>> {
		Box::pin(rerank_api::rerank(cfg, query, docs, top_n))
	}
}
impl CompletionProvider for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, farmrag_providers::Result<String>> {
		Box::pin(completion::complete(cfg, messages))
	}
}
