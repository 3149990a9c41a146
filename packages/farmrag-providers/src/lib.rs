pub mod completion;
pub mod embedding;
pub mod rerank;

mod error;

pub use error::{Error, Result, is_rate_limit_message};

use std::time::Duration;

use reqwest::{
	Client, StatusCode,
	header::{AUTHORIZATION, HeaderMap, HeaderName},
};
use serde_json::{Map, Value};

const MAX_ERROR_BODY_CHARS: usize = 512;

pub fn auth_headers(api_key: &str, default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) fn http_client(timeout_ms: u64) -> Result<Client> {
	Ok(Client::builder().timeout(Duration::from_millis(timeout_ms)).build()?)
}

pub(crate) async fn post_json(
	client: &Client,
	url: &str,
	headers: HeaderMap,
	body: &Value,
) -> Result<Value> {
	let res = client.post(url).headers(headers).json(body).send().await?;
	let status = res.status();

	if status.is_success() {
		return Ok(res.json().await?);
	}

	let body = res.text().await.unwrap_or_default();
	let message: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();

	Err(classify_status(status, message))
}

fn classify_status(status: StatusCode, message: String) -> Error {
	if status == StatusCode::TOO_MANY_REQUESTS || is_rate_limit_message(&message) {
		return Error::RateLimited { message };
	}

	Error::Status { status: status.as_u16(), message }
}
