//! Candidate queries for the two retrieval channels.
//!
//! Every query orders by its score and falls back to `seq` so equal scores keep insertion order.

use sqlx::PgExecutor;

use crate::{Error, Result, models::ScoredChunk};

/// Blend for the stemmed full-text strategy.
#[derive(Clone, Debug)]
pub struct FullTextParams<'a> {
	pub text_search_config: &'a str,
	pub rank_weight: f32,
	pub trigram_weight: f32,
	pub min_similarity: f32,
}

/// Blend for the language-agnostic strategy.
#[derive(Clone, Copy, Debug)]
pub struct TrigramParams {
	pub similarity_weight: f32,
	pub word_similarity_weight: f32,
	pub min_similarity: f32,
}

pub async fn nearest_chunks<'e, E>(
	executor: E,
	query_vec: &[f32],
	k: u32,
) -> Result<Vec<ScoredChunk>>
where
	E: PgExecutor<'e>,
{
	if query_vec.is_empty() {
		return Err(Error::InvalidArgument("Query vector must not be empty.".to_string()));
	}

	let vec_text = crate::vector_to_pg(query_vec);
	let rows = sqlx::query_as::<_, ScoredChunk>(
		"\
SELECT
\tchunk_id,
\tfilename,
\tchunk_index,
\tcontent,
\tmetadata,
\tcreated_at,
\t(1 - (embedding <=> $1::text::vector))::real AS score
FROM doc_chunks
WHERE embedding IS NOT NULL
ORDER BY embedding <=> $1::text::vector ASC, seq ASC
LIMIT $2",
	)
	.bind(vec_text)
	.bind(i64::from(k))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn full_text_chunks<'e, E>(
	executor: E,
	query: &str,
	k: u32,
	params: &FullTextParams<'_>,
) -> Result<Vec<ScoredChunk>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ScoredChunk>(
		"\
SELECT
\tchunk_id,
\tfilename,
\tchunk_index,
\tcontent,
\tmetadata,
\tcreated_at,
\t(
\t\tts_rank(to_tsvector($2::text::regconfig, content), plainto_tsquery($2::text::regconfig, $1)) * $3::real
\t\t+ similarity(content, $1) * $4::real
\t)::real AS score
FROM doc_chunks
WHERE to_tsvector($2::text::regconfig, content) @@ plainto_tsquery($2::text::regconfig, $1)
\tOR similarity(content, $1) > $5::real
ORDER BY score DESC, seq ASC
LIMIT $6",
	)
	.bind(query)
	.bind(params.text_search_config)
	.bind(params.rank_weight)
	.bind(params.trigram_weight)
	.bind(params.min_similarity)
	.bind(i64::from(k))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

pub async fn trigram_chunks<'e, E>(
	executor: E,
	query: &str,
	k: u32,
	params: &TrigramParams,
) -> Result<Vec<ScoredChunk>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, ScoredChunk>(
		"\
SELECT
\tchunk_id,
\tfilename,
\tchunk_index,
\tcontent,
\tmetadata,
\tcreated_at,
\t(similarity(content, $1) * $2::real + word_similarity($1, content) * $3::real)::real AS score
FROM doc_chunks
WHERE strpos(lower(content), lower($1)) > 0
\tOR similarity(content, $1) > $4::real
ORDER BY score DESC, seq ASC
LIMIT $5",
	)
	.bind(query)
	.bind(params.similarity_weight)
	.bind(params.word_similarity_weight)
	.bind(params.min_similarity)
	.bind(i64::from(k))
	.fetch_all(executor)
	.await?;

	Ok(rows)
}
