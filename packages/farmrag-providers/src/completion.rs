use serde_json::Value;

use crate::{Error, Result};

/// Single-turn chat completion. Returns the assistant text, trimmed.
pub async fn complete(
	cfg: &farmrag_config::LlmProviderConfig,
	messages: &[Value],
) -> Result<String> {
	let client = crate::http_client(cfg.timeout_ms)?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let headers = crate::auth_headers(&cfg.api_key, &cfg.default_headers)?;
	let json = crate::post_json(&client, &url, headers, &body).await?;

	parse_completion_text(&json)
}

fn parse_completion_text(json: &Value) -> Result<String> {
	let content = json
		.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.ok_or_else(|| Error::InvalidResponse {
			message: "Completion response is missing message content.".to_string(),
		})?;

	// Some gateways return content as a list of typed parts.
	if let Some(parts) = content.as_array() {
		let text = parts
			.iter()
			.filter_map(|part| part.get("text").and_then(|t| t.as_str()))
			.collect::<Vec<_>>()
			.join("");

		return Ok(text.trim().to_string());
	}

	content.as_str().map(|text| text.trim().to_string()).ok_or_else(|| Error::InvalidResponse {
		message: "Completion content must be a string.".to_string(),
	})
}
