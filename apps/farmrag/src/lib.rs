pub mod report;

use std::{fs, path::PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde::Deserialize;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use farmrag_config::Config;
use farmrag_service::{IngestRequest, NewChunk, RetrievalService};
use farmrag_storage::db::Db;

use crate::report::{CandidateReport, ChunkReport, DocumentReport, SearchReport};

#[derive(Debug, Parser)]
#[command(
	version = farmrag_cli::VERSION,
	rename_all = "kebab",
	styles = farmrag_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Run hybrid search and print the fused candidates as JSON.
	Search {
		query: String,
		#[arg(long, value_name = "N")]
		top_k: Option<u32>,
		#[arg(long)]
		no_transformation: bool,
		/// Rerank the fused candidates and apply the relevance threshold.
		#[arg(long)]
		rerank: bool,
	},
	/// Print exactly what the chat agent's document tool would return.
	Ask { query: String },
	/// Store a pre-chunked document from a JSON file.
	Ingest {
		#[arg(long, short = 'f', value_name = "FILE")]
		file: PathBuf,
		/// Overrides the filename recorded in the chunks file.
		#[arg(long, value_name = "NAME")]
		filename: Option<String>,
		#[arg(long)]
		replace: bool,
	},
	/// Remove every chunk of a document.
	Delete { filename: String },
	/// List stored documents.
	Documents,
	/// List stored chunks in document order.
	Chunks,
}

/// On-disk shape accepted by `ingest`.
#[derive(Debug, Deserialize)]
struct ChunksFile {
	filename: Option<String>,
	chunks: Vec<ChunkEntry>,
}

#[derive(Debug, Deserialize)]
struct ChunkEntry {
	content: String,
	#[serde(default)]
	metadata: Value,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = farmrag_config::load(&args.config)?;

	init_tracing(&config)?;

	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema(config.storage.documents.vector_dim).await?;

	let service = RetrievalService::new(config, db)?;

	match args.command {
		Command::Search { query, top_k, no_transformation, rerank } => {
			let top_k = top_k.unwrap_or(service.cfg.search.top_k) as usize;
			let use_transformation = service.cfg.search.use_transformation && !no_transformation;
			let outcome = service.hybrid.search_detailed(&query, use_transformation, top_k).await?;
			let candidates = if rerank {
				service
					.reranker
					.rerank_with_threshold(
						&outcome.transformation.original,
						&outcome.candidates,
						service.cfg.rerank.threshold,
						service.cfg.rerank.top_k as usize,
					)
					.await?
			} else {
				outcome.candidates.clone()
			};
			let report = SearchReport {
				query: outcome.transformation.original.clone(),
				rewritten: outcome.transformation.rewritten.clone(),
				variants: outcome.transformation.variants.clone(),
				vector_hits: outcome.vector_hits,
				lexical_hits: outcome.lexical_hits,
				degraded: outcome.degraded.map(|channel| channel.as_str()),
				reranked: rerank,
				candidates: candidates.iter().map(CandidateReport::from).collect(),
			};

			print_json(&report)?;
		},
		Command::Ask { query } => {
			let text = service.document_tool().search_text(&query).await?;

			println!("{text}");
		},
		Command::Ingest { file, filename, replace } => {
			let raw = fs::read_to_string(&file)?;
			let parsed: ChunksFile = serde_json::from_str(&raw)?;
			let filename = filename.or(parsed.filename).ok_or_else(|| {
				eyre::eyre!("Chunks file has no filename; pass --filename.")
			})?;
			let chunks = parsed
				.chunks
				.into_iter()
				.map(|entry| NewChunk { content: entry.content, metadata: entry.metadata })
				.collect();
			let report = service.ingest(IngestRequest { filename, chunks, replace }).await?;

			println!(
				"Ingested {} chunks for {} (replaced {}).",
				report.chunk_count, report.filename, report.replaced
			);
		},
		Command::Delete { filename } => {
			let deleted = service.delete_document(&filename).await?;

			println!("Deleted {deleted} chunks for {filename}.");
		},
		Command::Documents => {
			let documents = service.list_documents().await?;
			let report =
				documents.iter().map(DocumentReport::try_from).collect::<Result<Vec<_>, _>>()?;

			print_json(&report)?;
		},
		Command::Chunks => {
			let chunks = service.list_chunks().await?;
			let report = chunks.iter().map(ChunkReport::try_from).collect::<Result<Vec<_>, _>>()?;

			print_json(&report)?;
		},
	}

	Ok(())
}

fn init_tracing(config: &Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	Ok(())
}

fn print_json<T>(value: &T) -> color_eyre::Result<()>
where
	T: serde::Serialize,
{
	let json = serde_json::to_string_pretty(value)?;

	println!("{json}");

	Ok(())
}
