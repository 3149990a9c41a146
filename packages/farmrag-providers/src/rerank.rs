use serde_json::Value;

use crate::{Error, Result};

/// One cross-encoder judgement. `index` points into the submitted documents.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RerankHit {
	pub index: usize,
	pub relevance_score: f32,
}

pub async fn rerank(
	cfg: &farmrag_config::ProviderConfig,
	query: &str,
	docs: &[String],
	top_n: usize,
) -> Result<Vec<RerankHit>> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"query": query,
		"documents": docs,
		"top_n": top_n,
		"return_documents": false,
	});
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let json = crate::post_json(&client, &url, headers, &body).await?;

	parse_rerank_response(json)
}

fn parse_rerank_response(json: Value) -> Result<Vec<RerankHit>> {
	let results =
		json.get("results").or_else(|| json.get("data")).and_then(|v| v.as_array()).ok_or_else(
			|| Error::InvalidResponse {
				message: "Rerank response is missing results array.".to_string(),
			},
		)?;
	let mut hits = Vec::with_capacity(results.len());

	for item in results {
		let index = item.get("index").and_then(|v| v.as_u64()).ok_or_else(|| {
			Error::InvalidResponse { message: "Rerank result missing index.".to_string() }
		})? as usize;
		let relevance_score = item
			.get("relevance_score")
			.or_else(|| item.get("score"))
			.and_then(|v| v.as_f64())
			.ok_or_else(|| Error::InvalidResponse {
				message: "Rerank result missing score.".to_string(),
			})? as f32;

		hits.push(RerankHit { index, relevance_score });
	}

	Ok(hits)
}
