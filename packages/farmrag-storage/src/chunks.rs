use sqlx::PgExecutor;

use crate::{
	Error, Result,
	models::{ChunkListing, DocumentSummary, NewDocChunk},
};

pub async fn insert_chunk<'e, E>(executor: E, chunk: &NewDocChunk, vector_dim: u32) -> Result<()>
where
	E: PgExecutor<'e>,
{
	let embedding = match chunk.embedding.as_deref() {
		Some(vec) if vec.len() != vector_dim as usize =>
			return Err(Error::InvalidArgument(format!(
				"Embedding for {}#{} has {} dimensions, expected {vector_dim}.",
				chunk.filename,
				chunk.chunk_index,
				vec.len()
			))),
		Some(vec) => Some(crate::vector_to_pg(vec)),
		None => None,
	};

	if chunk.chunk_index < 0 {
		return Err(Error::InvalidArgument(format!(
			"chunk_index must be non-negative, got {}.",
			chunk.chunk_index
		)));
	}

	sqlx::query(
		"\
INSERT INTO doc_chunks (
\tchunk_id,
\tfilename,
\tchunk_index,
\tcontent,
\tcontent_hash,
\tmetadata,
\tembedding,
\tcreated_at
)
VALUES ($1,$2,$3,$4,$5,$6,$7::text::vector,$8)",
	)
	.bind(chunk.chunk_id)
	.bind(chunk.filename.as_str())
	.bind(chunk.chunk_index)
	.bind(chunk.content.as_str())
	.bind(chunk.content_hash.as_str())
	.bind(&chunk.metadata)
	.bind(embedding)
	.bind(chunk.created_at)
	.execute(executor)
	.await?;

	Ok(())
}

/// Deletes every chunk of one source document. Returns the number of rows removed.
pub async fn delete_chunks_by_filename<'e, E>(executor: E, filename: &str) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query("DELETE FROM doc_chunks WHERE filename = $1")
		.bind(filename)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}

pub async fn count_chunks_for_filename<'e, E>(executor: E, filename: &str) -> Result<i64>
where
	E: PgExecutor<'e>,
{
	let count: i64 = sqlx::query_scalar("SELECT count(*) FROM doc_chunks WHERE filename = $1")
		.bind(filename)
		.fetch_one(executor)
		.await?;

	Ok(count)
}

pub async fn list_chunks<'e, E>(executor: E) -> Result<Vec<ChunkListing>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ChunkListing>(
		"\
SELECT
\tchunk_id,
\tfilename,
\tchunk_index,
\tcontent_hash,
\tembedding IS NOT NULL AS has_embedding,
\tcreated_at
FROM doc_chunks
ORDER BY filename ASC, chunk_index ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// One row per source document, newest upload first.
pub async fn list_documents<'e, E>(executor: E) -> Result<Vec<DocumentSummary>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DocumentSummary>(
		"\
SELECT
\tfilename,
\tcount(*) AS chunk_count,
\tmin(created_at) AS uploaded_at
FROM doc_chunks
GROUP BY filename
ORDER BY uploaded_at DESC, filename ASC",
	)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
