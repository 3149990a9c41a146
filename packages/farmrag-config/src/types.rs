use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub embedding_pacing: EmbeddingPacing,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub rerank: Rerank,
	#[serde(default)]
	pub tool: Tool,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub documents: Documents,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Documents {
	/// Dimensionality of the `embedding` column. Fixed when the schema is created.
	pub vector_dim: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
	pub llm: LlmProviderConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// Serialises every embedding request issued by one process.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EmbeddingPacing {
	/// Minimum gap between two consecutive provider calls.
	pub interval_ms: u64,
	/// Retries granted to rate-limited calls before the failure becomes fatal.
	pub max_retries: u32,
	pub base_backoff_ms: u64,
	pub max_backoff_ms: u64,
	/// Texts sent per provider call during ingestion.
	pub batch_size: u32,
}
impl Default for EmbeddingPacing {
	fn default() -> Self {
		Self {
			interval_ms: 200,
			max_retries: 5,
			base_backoff_ms: 2_000,
			max_backoff_ms: 60_000,
			batch_size: 100,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub vector_k: u32,
	pub lexical_k: u32,
	pub rrf_k: u32,
	pub top_k: u32,
	pub use_transformation: bool,
	/// Fuse whatever one channel returned when the other channel failed.
	pub allow_partial: bool,
	pub lexical: SearchLexical,
	pub expansion: SearchExpansion,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			vector_k: 10,
			lexical_k: 10,
			rrf_k: 60,
			top_k: 20,
			use_transformation: true,
			allow_partial: true,
			lexical: SearchLexical::default(),
			expansion: SearchExpansion::default(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchLexical {
	/// One of `full_text`, `trigram`, or `auto`.
	pub strategy: String,
	/// Postgres text search configuration used by the `full_text` strategy.
	pub text_search_config: String,
	pub full_text_rank_weight: f32,
	pub full_text_trigram_weight: f32,
	pub trigram_weight: f32,
	pub word_similarity_weight: f32,
	pub min_similarity: f32,
}
impl Default for SearchLexical {
	fn default() -> Self {
		Self {
			strategy: "trigram".to_string(),
			text_search_config: "english".to_string(),
			full_text_rank_weight: 0.6,
			full_text_trigram_weight: 0.4,
			trigram_weight: 0.5,
			word_similarity_weight: 0.5,
			min_similarity: 0.1,
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct SearchExpansion {
	pub max_variants: u32,
}
impl Default for SearchExpansion {
	fn default() -> Self {
		Self { max_variants: 3 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Rerank {
	pub top_k: u32,
	pub threshold: f32,
}
impl Default for Rerank {
	fn default() -> Self {
		Self { top_k: 5, threshold: 0.3 }
	}
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Tool {
	pub no_documents_message: String,
	pub no_relevant_message: String,
}
impl Default for Tool {
	fn default() -> Self {
		Self {
			no_documents_message:
				"No related documents were found. No documents may have been uploaded yet."
					.to_string(),
			no_relevant_message: "No documents were relevant enough to answer this question."
				.to_string(),
		}
	}
}
