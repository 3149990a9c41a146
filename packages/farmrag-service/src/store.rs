use farmrag_storage::{
	chunks,
	db::Db,
	models::{ChunkListing, DocumentSummary, NewDocChunk, ScoredChunk},
	search::{self, FullTextParams, TrigramParams},
};

use crate::{BoxFuture, DocumentStore, Result};

/// `DocumentStore` backed by the `doc_chunks` table.
pub struct PgDocumentStore {
	db: Db,
	vector_dim: u32,
}
impl PgDocumentStore {
	pub fn new(db: Db, vector_dim: u32) -> Self {
		Self { db, vector_dim }
	}

	pub fn db(&self) -> &Db {
		&self.db
	}
}
impl DocumentStore for PgDocumentStore {
	fn nearest_chunks<'a>(
		&'a self,
		query_vec: &'a [f32],
		k: u32,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(async move { Ok(search::nearest_chunks(&self.db.pool, query_vec, k).await?) })
	}

	fn full_text_chunks<'a>(
		&'a self,
		query: &'a str,
		k: u32,
		params: &'a FullTextParams<'a>,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(async move {
			Ok(search::full_text_chunks(&self.db.pool, query, k, params).await?)
		})
	}

	fn trigram_chunks<'a>(
		&'a self,
		query: &'a str,
		k: u32,
		params: &'a TrigramParams,
	) -> BoxFuture<'a, Result<Vec<ScoredChunk>>> {
		Box::pin(async move { Ok(search::trigram_chunks(&self.db.pool, query, k, params).await?) })
	}

	fn insert_chunks<'a>(&'a self, rows: &'a [NewDocChunk]) -> BoxFuture<'a, Result<()>> {
		Box::pin(async move {
			let mut tx = self.db.pool.begin().await?;

			for row in rows {
				chunks::insert_chunk(&mut *tx, row, self.vector_dim).await?;
			}

			tx.commit().await?;

			Ok(())
		})
	}

	fn replace_chunks<'a>(
		&'a self,
		filename: &'a str,
		rows: &'a [NewDocChunk],
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			let mut tx = self.db.pool.begin().await?;
			let deleted = chunks::delete_chunks_by_filename(&mut *tx, filename).await?;

			for row in rows {
				chunks::insert_chunk(&mut *tx, row, self.vector_dim).await?;
			}

			tx.commit().await?;

			Ok(deleted)
		})
	}

	fn delete_chunks_by_filename<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			Ok(chunks::delete_chunks_by_filename(&self.db.pool, filename).await?)
		})
	}

	fn count_chunks_for_filename<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<i64>> {
		Box::pin(async move {
			Ok(chunks::count_chunks_for_filename(&self.db.pool, filename).await?)
		})
	}

	fn list_documents(&self) -> BoxFuture<'_, Result<Vec<DocumentSummary>>> {
		Box::pin(async move { Ok(chunks::list_documents(&self.db.pool).await?) })
	}

	fn list_chunks(&self) -> BoxFuture<'_, Result<Vec<ChunkListing>>> {
		Box::pin(async move { Ok(chunks::list_chunks(&self.db.pool).await?) })
	}
}
