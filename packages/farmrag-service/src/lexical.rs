use std::{str::FromStr, sync::Arc};

use futures::future;

use farmrag_config::SearchLexical;
use farmrag_storage::search::{FullTextParams, TrigramParams};

use crate::{
	DocumentStore, Error, Result,
	candidate::{Channel, ScoredCandidate},
};

/// How lexical candidates are matched and scored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexicalStrategy {
	/// Stemmed full-text rank blended with trigram similarity. Needs a text search configuration
	/// for the query language.
	FullText,
	/// Trigram similarity blended with word similarity plus substring containment. Works for any
	/// language, including Vietnamese.
	Trigram,
	/// `FullText` for confidently English queries, `Trigram` otherwise.
	Auto,
}
impl LexicalStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::FullText => "full_text",
			Self::Trigram => "trigram",
			Self::Auto => "auto",
		}
	}

	/// Picks the concrete strategy for one query.
	pub fn resolve(self, query: &str) -> Self {
		match self {
			Self::Auto =>
				if farmrag_domain::language::is_confident_english(query) {
					Self::FullText
				} else {
					Self::Trigram
				},
			other => other,
		}
	}
}
impl FromStr for LexicalStrategy {
	type Err = Error;

	fn from_str(value: &str) -> Result<Self> {
		match value.trim().to_ascii_lowercase().as_str() {
			"full_text" => Ok(Self::FullText),
			"trigram" => Ok(Self::Trigram),
			"auto" => Ok(Self::Auto),
			other => Err(Error::InvalidRequest {
				message: format!("Unknown lexical strategy {other:?}."),
			}),
		}
	}
}

/// Keyword and fuzzy retrieval over raw chunk text.
pub struct LexicalSearch {
	store: Arc<dyn DocumentStore>,
	cfg: SearchLexical,
	strategy: LexicalStrategy,
}
impl LexicalSearch {
	pub fn new(store: Arc<dyn DocumentStore>, cfg: SearchLexical) -> Result<Self> {
		let strategy = cfg.strategy.parse()?;

		Ok(Self { store, cfg, strategy })
	}

	pub fn strategy(&self) -> LexicalStrategy {
		self.strategy
	}

	pub async fn search(&self, query: &str, k: u32) -> Result<Vec<ScoredCandidate>> {
		self.search_with(query, k, self.strategy).await
	}

	pub async fn search_with(
		&self,
		query: &str,
		k: u32,
		strategy: LexicalStrategy,
	) -> Result<Vec<ScoredCandidate>> {
		let resolved = strategy.resolve(query);
		let rows = match resolved {
			LexicalStrategy::FullText => {
				let params = FullTextParams {
					text_search_config: self.cfg.text_search_config.as_str(),
					rank_weight: self.cfg.full_text_rank_weight,
					trigram_weight: self.cfg.full_text_trigram_weight,
					min_similarity: self.cfg.min_similarity,
				};

				self.store.full_text_chunks(query, k, &params).await?
			},
			_ => {
				let params = TrigramParams {
					similarity_weight: self.cfg.trigram_weight,
					word_similarity_weight: self.cfg.word_similarity_weight,
					min_similarity: self.cfg.min_similarity,
				};

				self.store.trigram_chunks(query, k, &params).await?
			},
		};

		tracing::debug!(strategy = resolved.as_str(), hits = rows.len(), "Lexical query finished.");

		Ok(rows.into_iter().map(|row| ScoredCandidate::from_row(row, Channel::Lexical)).collect())
	}

	/// Same fan-out contract as vector search: per-query lists concatenated in query order.
	pub async fn search_multi(&self, queries: &[String], k: u32) -> Result<Vec<ScoredCandidate>> {
		let lists =
			future::try_join_all(queries.iter().map(|query| self.search(query, k))).await?;
		let out: Vec<ScoredCandidate> = lists.into_iter().flatten().collect();

		tracing::info!(
			queries = queries.len(),
			hits = out.len(),
			strategy = self.strategy.as_str(),
			"Lexical search finished."
		);

		Ok(out)
	}
}

#[cfg(test)]
mod tests {
	use super::LexicalStrategy;

	#[test]
	fn parses_strategy_labels() {
		let full_text: LexicalStrategy = "full_text".parse().expect("parse failed");
		let trigram: LexicalStrategy = " Trigram ".parse().expect("parse failed");

		assert_eq!(full_text, LexicalStrategy::FullText);
		assert_eq!(trigram, LexicalStrategy::Trigram);
		assert!("bm25".parse::<LexicalStrategy>().is_err());
	}

	#[test]
	fn auto_resolves_by_query_language() {
		assert_eq!(
			LexicalStrategy::Auto.resolve(
				"What is the recommended vaccination schedule for weaned piglets on the farm?"
			),
			LexicalStrategy::FullText
		);
		assert_eq!(
			LexicalStrategy::Auto.resolve("lịch tiêm phòng cho heo con"),
			LexicalStrategy::Trigram
		);
		assert_eq!(LexicalStrategy::Trigram.resolve("piglets"), LexicalStrategy::Trigram);
	}
}
