//! JSON shapes printed by the CLI.

use serde::Serialize;
use serde_json::Value;
use time::{error::Format, format_description::well_known::Rfc3339};
use uuid::Uuid;

use farmrag_service::ScoredCandidate;
use farmrag_storage::models::{ChunkListing, DocumentSummary};

#[derive(Debug, Serialize)]
pub struct SearchReport {
	pub query: String,
	pub rewritten: String,
	pub variants: Vec<String>,
	pub vector_hits: usize,
	pub lexical_hits: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub degraded: Option<&'static str>,
	pub reranked: bool,
	pub candidates: Vec<CandidateReport>,
}

#[derive(Debug, Serialize)]
pub struct CandidateReport {
	pub chunk_id: Uuid,
	pub filename: String,
	pub chunk_index: i32,
	pub provenance: &'static str,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub similarity: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub lexical_score: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub rrf_score: Option<f32>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub relevance_score: Option<f32>,
	pub metadata: Value,
	pub content: String,
}
impl From<&ScoredCandidate> for CandidateReport {
	fn from(candidate: &ScoredCandidate) -> Self {
		Self {
			chunk_id: candidate.chunk_id(),
			filename: candidate.chunk.filename.clone(),
			chunk_index: candidate.chunk.chunk_index,
			provenance: candidate.provenance.as_str(),
			similarity: candidate.similarity,
			lexical_score: candidate.lexical_score,
			rrf_score: candidate.rrf_score,
			relevance_score: candidate.relevance_score,
			metadata: candidate.chunk.metadata.clone(),
			content: candidate.chunk.content.clone(),
		}
	}
}

#[derive(Debug, Serialize)]
pub struct DocumentReport {
	pub filename: String,
	pub chunk_count: i64,
	pub uploaded_at: String,
}
impl TryFrom<&DocumentSummary> for DocumentReport {
	type Error = Format;

	fn try_from(summary: &DocumentSummary) -> Result<Self, Self::Error> {
		Ok(Self {
			filename: summary.filename.clone(),
			chunk_count: summary.chunk_count,
			uploaded_at: summary.uploaded_at.format(&Rfc3339)?,
		})
	}
}

#[derive(Debug, Serialize)]
pub struct ChunkReport {
	pub chunk_id: Uuid,
	pub filename: String,
	pub chunk_index: i32,
	pub content_hash: String,
	pub has_embedding: bool,
	pub created_at: String,
}
impl TryFrom<&ChunkListing> for ChunkReport {
	type Error = Format;

	fn try_from(listing: &ChunkListing) -> Result<Self, Self::Error> {
		Ok(Self {
			chunk_id: listing.chunk_id,
			filename: listing.filename.clone(),
			chunk_index: listing.chunk_index,
			content_hash: listing.content_hash.clone(),
			has_embedding: listing.has_embedding,
			created_at: listing.created_at.format(&Rfc3339)?,
		})
	}
}
