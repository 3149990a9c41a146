use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct DocChunk {
	pub chunk_id: Uuid,
	pub filename: String,
	pub chunk_index: i32,
	pub content: String,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
}

/// A chunk as returned by one of the search queries, with that query's raw score.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ScoredChunk {
	#[sqlx(flatten)]
	pub chunk: DocChunk,
	pub score: f32,
}

#[derive(Debug)]
pub struct NewDocChunk {
	pub chunk_id: Uuid,
	pub filename: String,
	pub chunk_index: i32,
	pub content: String,
	pub content_hash: String,
	pub metadata: Value,
	pub embedding: Option<Vec<f32>>,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct ChunkListing {
	pub chunk_id: Uuid,
	pub filename: String,
	pub chunk_index: i32,
	pub content_hash: String,
	pub has_embedding: bool,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct DocumentSummary {
	pub filename: String,
	pub chunk_count: i64,
	pub uploaded_at: OffsetDateTime,
}
