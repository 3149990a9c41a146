mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Documents, EmbeddingPacing, EmbeddingProviderConfig, LlmProviderConfig, Postgres,
	ProviderConfig, Providers, Rerank, Search, SearchExpansion, SearchLexical, Service, Storage,
	Tool,
};

use std::{fs, path::Path};

pub const LEXICAL_STRATEGIES: [&str; 3] = ["full_text", "trigram", "auto"];

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;
	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.documents.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.documents.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("rerank", &cfg.providers.rerank.api_key),
		("llm", &cfg.providers.llm.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	if !cfg.providers.llm.temperature.is_finite() || cfg.providers.llm.temperature < 0.0 {
		return Err(Error::Validation {
			message: "providers.llm.temperature must be a finite number zero or greater."
				.to_string(),
		});
	}

	validate_pacing(cfg)?;
	validate_search(cfg)?;

	if cfg.rerank.top_k == 0 {
		return Err(Error::Validation {
			message: "rerank.top_k must be greater than zero.".to_string(),
		});
	}
	if !cfg.rerank.threshold.is_finite() || !(0.0..=1.0).contains(&cfg.rerank.threshold) {
		return Err(Error::Validation {
			message: "rerank.threshold must be in the range 0.0-1.0.".to_string(),
		});
	}

	Ok(())
}

fn validate_pacing(cfg: &Config) -> Result<()> {
	let pacing = &cfg.embedding_pacing;

	if pacing.batch_size == 0 {
		return Err(Error::Validation {
			message: "embedding_pacing.batch_size must be greater than zero.".to_string(),
		});
	}
	if pacing.max_backoff_ms < pacing.base_backoff_ms {
		return Err(Error::Validation {
			message: "embedding_pacing.max_backoff_ms must be at least embedding_pacing.base_backoff_ms."
				.to_string(),
		});
	}

	Ok(())
}

fn validate_search(cfg: &Config) -> Result<()> {
	let search = &cfg.search;

	for (label, value) in [
		("search.vector_k", search.vector_k),
		("search.lexical_k", search.lexical_k),
		("search.rrf_k", search.rrf_k),
		("search.top_k", search.top_k),
	] {
		if value == 0 {
			return Err(Error::Validation { message: format!("{label} must be greater than zero.") });
		}
	}

	if !LEXICAL_STRATEGIES.contains(&search.lexical.strategy.as_str()) {
		return Err(Error::Validation {
			message: "search.lexical.strategy must be one of full_text, trigram, or auto."
				.to_string(),
		});
	}
	if search.lexical.text_search_config.trim().is_empty() {
		return Err(Error::Validation {
			message: "search.lexical.text_search_config must be non-empty.".to_string(),
		});
	}

	for (label, weight) in [
		("search.lexical.full_text_rank_weight", search.lexical.full_text_rank_weight),
		("search.lexical.full_text_trigram_weight", search.lexical.full_text_trigram_weight),
		("search.lexical.trigram_weight", search.lexical.trigram_weight),
		("search.lexical.word_similarity_weight", search.lexical.word_similarity_weight),
	] {
		if !weight.is_finite() {
			return Err(Error::Validation { message: format!("{label} must be a finite number.") });
		}
		if weight < 0.0 {
			return Err(Error::Validation { message: format!("{label} must be zero or greater.") });
		}
	}

	if !search.lexical.min_similarity.is_finite()
		|| !(0.0..=1.0).contains(&search.lexical.min_similarity)
	{
		return Err(Error::Validation {
			message: "search.lexical.min_similarity must be in the range 0.0-1.0.".to_string(),
		});
	}
	if !(1..=8).contains(&search.expansion.max_variants) {
		return Err(Error::Validation {
			message: "search.expansion.max_variants must be in the range 1-8.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.search.lexical.strategy = cfg.search.lexical.strategy.trim().to_lowercase();

	for api_base in [
		&mut cfg.providers.embedding.api_base,
		&mut cfg.providers.rerank.api_base,
		&mut cfg.providers.llm.api_base,
	] {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}
}
