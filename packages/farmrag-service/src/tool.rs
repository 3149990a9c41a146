//! The document-search tool handed to the chat agent.

use farmrag_config::Tool;

use crate::{Result, RetrievalService, candidate::ScoredCandidate};

const EXCERPT_SEPARATOR: &str = "\n---\n";

#[derive(Clone, Debug)]
pub enum ToolOutput {
	/// Hybrid search found nothing at all.
	NoDocuments,
	/// Candidates existed but none cleared the relevance threshold.
	NotRelevant,
	Excerpts(Vec<ScoredCandidate>),
}
impl ToolOutput {
	pub fn is_found(&self) -> bool {
		matches!(self, Self::Excerpts(_))
	}

	/// Text handed back to the agent.
	pub fn render(&self, cfg: &Tool) -> String {
		match self {
			Self::NoDocuments => cfg.no_documents_message.clone(),
			Self::NotRelevant => cfg.no_relevant_message.clone(),
			Self::Excerpts(candidates) => render_excerpts(candidates),
		}
	}
}

pub struct DocumentTool<'a> {
	service: &'a RetrievalService,
}
impl<'a> DocumentTool<'a> {
	pub fn new(service: &'a RetrievalService) -> Self {
		Self { service }
	}

	/// Hybrid search, then rerank against the untransformed query.
	pub async fn search(&self, query: &str) -> Result<ToolOutput> {
		let cfg = &self.service.cfg;
		let outcome = self
			.service
			.hybrid
			.search_detailed(query, cfg.search.use_transformation, cfg.search.top_k as usize)
			.await?;

		if outcome.candidates.is_empty() {
			return Ok(ToolOutput::NoDocuments);
		}

		let kept = self
			.service
			.reranker
			.rerank_with_threshold(
				&outcome.transformation.original,
				&outcome.candidates,
				cfg.rerank.threshold,
				cfg.rerank.top_k as usize,
			)
			.await?;

		if kept.is_empty() {
			return Ok(ToolOutput::NotRelevant);
		}

		Ok(ToolOutput::Excerpts(kept))
	}

	pub async fn search_text(&self, query: &str) -> Result<String> {
		Ok(self.search(query).await?.render(&self.service.cfg.tool))
	}
}

fn render_excerpts(candidates: &[ScoredCandidate]) -> String {
	candidates
		.iter()
		.enumerate()
		.map(|(idx, candidate)| {
			format!(
				"[Document {}] (Source: {}, Relevance: {:.2})\n{}\n",
				idx + 1,
				candidate.chunk.filename,
				candidate.relevance_score.unwrap_or_default(),
				candidate.chunk.content
			)
		})
		.collect::<Vec<_>>()
		.join(EXCERPT_SEPARATOR)
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use serde_json::Value;
	use time::OffsetDateTime;
	use uuid::Uuid;

	use super::*;
	use crate::candidate::Chunk;

	fn candidate(filename: &str, content: &str, relevance: f32) -> ScoredCandidate {
		let chunk = Arc::new(Chunk {
			chunk_id: Uuid::new_v4(),
			filename: filename.to_string(),
			chunk_index: 0,
			content: content.to_string(),
			metadata: Value::Null,
			created_at: OffsetDateTime::UNIX_EPOCH,
		});

		ScoredCandidate::from_vector(chunk, 0.5).with_relevance(relevance)
	}

	#[test]
	fn renders_numbered_excerpts_with_sources() {
		let output = ToolOutput::Excerpts(vec![
			candidate("benh-heo.pdf", "Heo ốm thường sốt cao.", 0.912),
			candidate("dinh-duong.pdf", "Khẩu phần cho heo nái.", 0.31),
		]);
		let text = output.render(&Tool::default());

		assert_eq!(
			text,
			"[Document 1] (Source: benh-heo.pdf, Relevance: 0.91)\nHeo ốm thường sốt cao.\n\
\n---\n\
[Document 2] (Source: dinh-duong.pdf, Relevance: 0.31)\nKhẩu phần cho heo nái.\n"
		);
	}

	#[test]
	fn sentinels_come_from_config() {
		let cfg = Tool {
			no_documents_message: "empty".to_string(),
			no_relevant_message: "irrelevant".to_string(),
		};

		assert_eq!(ToolOutput::NoDocuments.render(&cfg), "empty");
		assert_eq!(ToolOutput::NotRelevant.render(&cfg), "irrelevant");
		assert!(!ToolOutput::NotRelevant.is_found());
	}
}
