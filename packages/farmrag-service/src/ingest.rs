use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

use farmrag_storage::models::{ChunkListing, DocumentSummary, NewDocChunk};

use crate::{Error, Result, RetrievalService};

/// Pre-chunked text for one source document.
#[derive(Clone, Debug)]
pub struct IngestRequest {
	pub filename: String,
	pub chunks: Vec<NewChunk>,
	/// Swap out existing chunks for `filename` instead of rejecting the upload.
	pub replace: bool,
}

#[derive(Clone, Debug)]
pub struct NewChunk {
	pub content: String,
	pub metadata: Value,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IngestReport {
	pub filename: String,
	pub chunk_count: usize,
	pub replaced: u64,
}

impl RetrievalService {
	pub async fn ingest(&self, req: IngestRequest) -> Result<IngestReport> {
		let filename = req.filename.trim().to_string();

		if filename.is_empty() {
			return Err(Error::InvalidRequest { message: "filename must not be empty.".to_string() });
		}

		let chunks: Vec<NewChunk> = req
			.chunks
			.into_iter()
			.map(|chunk| NewChunk {
				content: farmrag_domain::text::normalize_document_text(&chunk.content),
				metadata: chunk.metadata,
			})
			.filter(|chunk| !chunk.content.is_empty())
			.collect();

		if chunks.is_empty() {
			return Err(Error::InvalidRequest {
				message: format!("{filename} has no non-blank chunks."),
			});
		}

		let existing = self.store.count_chunks_for_filename(&filename).await?;

		if existing > 0 && !req.replace {
			return Err(Error::Conflict {
				message: format!("{filename} already has {existing} chunks."),
			});
		}

		let batch_size = self.embedder.policy().batch_size;
		let created_at = OffsetDateTime::now_utc();
		let mut rows = Vec::with_capacity(chunks.len());

		for (batch_idx, batch) in chunks.chunks(batch_size).enumerate() {
			let texts: Vec<String> = batch.iter().map(|chunk| chunk.content.clone()).collect();
			let vectors = self.embedder.embed(&texts).await?;
			let offset = batch_idx * batch_size;

			for (idx, (chunk, embedding)) in batch.iter().zip(vectors).enumerate() {
				rows.push(build_row(&filename, offset + idx, chunk, embedding, created_at)?);
			}

			tracing::debug!(
				filename = filename.as_str(),
				batch = batch_idx,
				chunks = batch.len(),
				"Embedded chunk batch."
			);
		}

		// Nothing is written until every batch has its embedding.
		let replaced = if existing > 0 {
			self.store.replace_chunks(&filename, &rows).await?
		} else {
			self.store.insert_chunks(&rows).await?;

			0
		};

		tracing::info!(
			filename = filename.as_str(),
			chunk_count = chunks.len(),
			replaced,
			"Document ingested."
		);

		Ok(IngestReport { filename, chunk_count: chunks.len(), replaced })
	}

	/// Removes every chunk of `filename`.
	pub async fn delete_document(&self, filename: &str) -> Result<u64> {
		let deleted = self.store.delete_chunks_by_filename(filename.trim()).await?;

		if deleted == 0 {
			return Err(Error::NotFound { message: format!("No chunks for {filename}.") });
		}

		tracing::info!(filename, deleted, "Document deleted.");

		Ok(deleted)
	}

	pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
		self.store.list_documents().await
	}

	pub async fn list_chunks(&self) -> Result<Vec<ChunkListing>> {
		self.store.list_chunks().await
	}
}

fn build_row(
	filename: &str,
	ordinal: usize,
	chunk: &NewChunk,
	embedding: Vec<f32>,
	created_at: OffsetDateTime,
) -> Result<NewDocChunk> {
	let chunk_index = i32::try_from(ordinal).map_err(|_| Error::InvalidRequest {
		message: format!("{filename} has too many chunks."),
	})?;
	let metadata = match &chunk.metadata {
		Value::Null => Value::Object(Default::default()),
		other => other.clone(),
	};

	Ok(NewDocChunk {
		chunk_id: Uuid::new_v4(),
		filename: filename.to_string(),
		chunk_index,
		content: chunk.content.clone(),
		content_hash: farmrag_storage::content_hash(&chunk.content),
		metadata,
		embedding: Some(embedding),
		created_at,
	})
}
