pub mod chunks;
pub mod db;
pub mod models;
pub mod schema;
pub mod search;

mod error;

pub use error::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Renders a vector as a pgvector text literal, bound with `$n::text::vector`.
pub fn vector_to_pg(vec: &[f32]) -> String {
	let mut out = String::with_capacity(vec.len() * 10 + 2);

	out.push('[');

	for (idx, value) in vec.iter().enumerate() {
		if idx > 0 {
			out.push(',');
		}

		out.push_str(&value.to_string());
	}

	out.push(']');

	out
}

pub fn content_hash(content: &str) -> String {
	blake3::hash(content.as_bytes()).to_hex().to_string()
}
