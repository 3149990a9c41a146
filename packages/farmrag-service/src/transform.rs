//! LLM-driven query rewriting and multi-query expansion.
//!
//! Every operation here is best-effort: provider failures are logged and degrade to the input
//! query instead of surfacing as errors.

use std::{collections::HashSet, sync::Arc};

use serde_json::Value;

use farmrag_config::LlmProviderConfig;

use crate::CompletionProvider;

const REWRITE_SYSTEM_PROMPT: &str = "You rewrite questions for a document search engine that \
serves pig farm operators. Restate the question using precise livestock and veterinary \
terminology while keeping its intent. Keep the language of the question. Reply with the \
rewritten question only.";
const EXPAND_SYSTEM_PROMPT: &str = "You generate alternative search queries for a document \
search engine that serves pig farm operators. Each alternative must approach the same \
information need from a different angle, for example symptoms, causes, treatment, or \
prevention. Keep the language of the question. Reply with one query per line and nothing else.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryTransformation {
	pub original: String,
	pub rewritten: String,
	/// Always starts with `original`.
	pub variants: Vec<String>,
}
impl QueryTransformation {
	pub fn passthrough(query: &str) -> Self {
		Self {
			original: query.to_string(),
			rewritten: query.to_string(),
			variants: vec![query.to_string()],
		}
	}
}

pub struct QueryTransformer {
	llm: Arc<dyn CompletionProvider>,
	cfg: LlmProviderConfig,
	max_variants: usize,
}
impl QueryTransformer {
	pub fn new(
		llm: Arc<dyn CompletionProvider>,
		cfg: LlmProviderConfig,
		max_variants: usize,
	) -> Self {
		Self { llm, cfg, max_variants }
	}

	/// Restates `query` in domain terms. Falls back to `query` on failure or empty output.
	pub async fn rewrite(&self, query: &str) -> String {
		self.try_rewrite(query).await.unwrap_or_else(|| query.to_string())
	}

	/// Returns `query` followed by up to `max_variants` alternative phrasings.
	pub async fn expand(&self, query: &str) -> Vec<String> {
		self.try_expand(query).await.unwrap_or_else(|| vec![query.to_string()])
	}

	/// Rewrites, expands the rewritten text, and merges the results behind the original query.
	///
	/// A failure in either step discards the other step's output as well.
	pub async fn transform(&self, query: &str) -> QueryTransformation {
		let Some(rewritten) = self.try_rewrite(query).await else {
			return QueryTransformation::passthrough(query);
		};
		let Some(expanded) = self.try_expand(&rewritten).await else {
			return QueryTransformation::passthrough(query);
		};
		let variants = merge_variants(query, expanded);

		tracing::info!(variants = variants.len(), "Query transformed.");

		QueryTransformation { original: query.to_string(), rewritten, variants }
	}

	async fn try_rewrite(&self, query: &str) -> Option<String> {
		let messages = build_messages(REWRITE_SYSTEM_PROMPT, query);

		match self.llm.complete(&self.cfg, &messages).await {
			Ok(text) => {
				let rewritten = text.lines().map(str::trim).find(|line| !line.is_empty());

				if rewritten.is_none() {
					tracing::warn!("Query rewrite returned empty output; using original query.");
				}

				rewritten.map(str::to_string)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Query rewrite failed; using original query.");

				None
			},
		}
	}

	async fn try_expand(&self, query: &str) -> Option<Vec<String>> {
		let messages = build_messages(EXPAND_SYSTEM_PROMPT, query);

		match self.llm.complete(&self.cfg, &messages).await {
			Ok(text) => {
				let mut variants = vec![query.to_string()];

				variants.extend(split_variants(&text, self.max_variants));

				Some(variants)
			},
			Err(err) => {
				tracing::warn!(error = %err, "Query expansion failed; using original query.");

				None
			},
		}
	}
}

fn build_messages(system_prompt: &str, query: &str) -> Vec<Value> {
	vec![
		serde_json::json!({ "role": "system", "content": system_prompt }),
		serde_json::json!({ "role": "user", "content": query }),
	]
}

/// Splits model output into at most `max` non-blank lines, dropping list markers.
fn split_variants(text: &str, max: usize) -> Vec<String> {
	text.lines()
		.map(strip_list_marker)
		.filter(|line| !line.is_empty())
		.take(max)
		.map(str::to_string)
		.collect()
}

fn strip_list_marker(line: &str) -> &str {
	let trimmed = line.trim();

	if let Some(rest) = trimmed.strip_prefix(['-', '*', '•']) {
		return rest.trim();
	}

	let digits = trimmed.chars().take_while(char::is_ascii_digit).count();

	if digits > 0 {
		let rest = &trimmed[digits..];

		if let Some(rest) = rest.strip_prefix(['.', ')']) {
			return rest.trim();
		}
	}

	trimmed
}

/// Keeps the original query first and drops case-insensitive repeats.
fn merge_variants(original: &str, candidates: Vec<String>) -> Vec<String> {
	let mut out = Vec::with_capacity(candidates.len() + 1);
	let mut seen = HashSet::new();

	out.push(original.to_string());
	seen.insert(original.trim().to_lowercase());

	for candidate in candidates {
		let trimmed = candidate.trim();

		if trimmed.is_empty() {
			continue;
		}
		if seen.insert(trimmed.to_lowercase()) {
			out.push(trimmed.to_string());
		}
	}

	out
}
