use std::sync::Arc;

use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use farmrag_storage::models::{DocChunk, ScoredChunk};

#[derive(Clone, Debug, PartialEq)]
pub struct Chunk {
	pub chunk_id: Uuid,
	pub filename: String,
	pub chunk_index: i32,
	pub content: String,
	pub metadata: Value,
	pub created_at: OffsetDateTime,
}
impl From<DocChunk> for Chunk {
	fn from(row: DocChunk) -> Self {
		Self {
			chunk_id: row.chunk_id,
			filename: row.filename,
			chunk_index: row.chunk_index,
			content: row.content,
			metadata: row.metadata,
			created_at: row.created_at,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
	Vector,
	Lexical,
}
impl Channel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vector => "vector",
			Self::Lexical => "lexical",
		}
	}
}

/// Which retrieval channels surfaced a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Provenance {
	Vector,
	Lexical,
	Both,
}
impl Provenance {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Vector => "vector",
			Self::Lexical => "lexical",
			Self::Both => "both",
		}
	}

	pub fn includes(self, channel: Channel) -> bool {
		matches!(
			(self, channel),
			(Self::Both, _) | (Self::Vector, Channel::Vector) | (Self::Lexical, Channel::Lexical)
		)
	}

	pub fn with(self, channel: Channel) -> Self {
		match (self, channel) {
			(Self::Vector, Channel::Vector) => Self::Vector,
			(Self::Lexical, Channel::Lexical) => Self::Lexical,
			_ => Self::Both,
		}
	}
}
impl From<Channel> for Provenance {
	fn from(channel: Channel) -> Self {
		match channel {
			Channel::Vector => Self::Vector,
			Channel::Lexical => Self::Lexical,
		}
	}
}

/// A chunk annotated by the pipeline stages that have seen it.
///
/// Each stage writes its own field and returns a new value; earlier scores are carried forward
/// untouched.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
	pub chunk: Arc<Chunk>,
	pub provenance: Provenance,
	/// Cosine similarity from vector search, in [-1, 1].
	pub similarity: Option<f32>,
	/// Blended lexical score from lexical search.
	pub lexical_score: Option<f32>,
	/// Accumulated reciprocal-rank score from fusion.
	pub rrf_score: Option<f32>,
	/// Cross-encoder relevance, in [0, 1].
	pub relevance_score: Option<f32>,
}
impl ScoredCandidate {
	pub fn from_vector(chunk: Arc<Chunk>, similarity: f32) -> Self {
		Self {
			chunk,
			provenance: Provenance::Vector,
			similarity: Some(similarity),
			lexical_score: None,
			rrf_score: None,
			relevance_score: None,
		}
	}

	pub fn from_lexical(chunk: Arc<Chunk>, lexical_score: f32) -> Self {
		Self {
			chunk,
			provenance: Provenance::Lexical,
			similarity: None,
			lexical_score: Some(lexical_score),
			rrf_score: None,
			relevance_score: None,
		}
	}

	pub(crate) fn from_row(row: ScoredChunk, channel: Channel) -> Self {
		let chunk = Arc::new(Chunk::from(row.chunk));

		match channel {
			Channel::Vector => Self::from_vector(chunk, row.score),
			Channel::Lexical => Self::from_lexical(chunk, row.score),
		}
	}

	pub fn chunk_id(&self) -> Uuid {
		self.chunk.chunk_id
	}

	/// The score of the latest stage that has run.
	pub fn score(&self) -> f32 {
		self.relevance_score
			.or(self.rrf_score)
			.or(self.lexical_score)
			.or(self.similarity)
			.unwrap_or(0.0)
	}

	pub fn with_relevance(&self, relevance_score: f32) -> Self {
		Self { relevance_score: Some(relevance_score), ..self.clone() }
	}
}
