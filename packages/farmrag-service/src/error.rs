pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Provider still rate limited after {attempts} attempts: {message}")]
	RateLimitExhausted { attempts: u32, message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<farmrag_storage::Error> for Error {
	fn from(err: farmrag_storage::Error) -> Self {
		match err {
			farmrag_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			farmrag_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			farmrag_storage::Error::NotFound(message) => Self::NotFound { message },
			farmrag_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}

impl From<farmrag_providers::Error> for Error {
	fn from(err: farmrag_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
