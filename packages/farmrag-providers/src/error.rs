pub type Result<T, E = Error> = std::result::Result<T, E>;

const RATE_LIMIT_MARKERS: [&str; 6] = [
	"rate limit",
	"rate-limit",
	"ratelimit",
	"quota",
	"resource_exhausted",
	"too many requests",
];

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	SerdeJson(#[from] serde_json::Error),
	#[error(transparent)]
	InvalidHeaderName(#[from] reqwest::header::InvalidHeaderName),
	#[error(transparent)]
	InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),
	#[error("{message}")]
	InvalidConfig { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
	#[error("Provider is rate limited: {message}")]
	RateLimited { message: String },
	#[error("Provider returned HTTP {status}: {message}")]
	Status { status: u16, message: String },
}
impl Error {
	/// Rate limits are the only retryable provider failure.
	pub fn is_rate_limited(&self) -> bool {
		match self {
			Self::RateLimited { .. } => true,
			Self::Status { status, message } => *status == 429 || is_rate_limit_message(message),
			Self::Reqwest(err) => err.status().map(|status| status.as_u16() == 429).unwrap_or(false),
			_ => false,
		}
	}
}

pub fn is_rate_limit_message(message: &str) -> bool {
	let lowered = message.to_lowercase();

	lowered.contains("429") || RATE_LIMIT_MARKERS.iter().any(|marker| lowered.contains(marker))
}
