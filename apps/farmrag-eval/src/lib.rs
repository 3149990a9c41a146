use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
	time::Instant,
};

use clap::Parser;
use color_eyre::eyre;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use farmrag_service::{RetrievalService, ScoredCandidate};
use farmrag_storage::db::Db;

#[derive(Debug, Parser)]
#[command(
	version = farmrag_cli::VERSION,
	rename_all = "kebab",
	styles = farmrag_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[arg(long, short = 'd', value_name = "FILE")]
	pub dataset: PathBuf,
	#[arg(long, value_name = "N")]
	pub top_k: Option<u32>,
	#[arg(long)]
	pub no_transformation: bool,
	/// Score the fused list directly instead of the reranked, thresholded one.
	#[arg(long)]
	pub no_rerank: bool,
}

#[derive(Debug, Deserialize)]
struct EvalDataset {
	name: Option<String>,
	queries: Vec<EvalQuery>,
}

#[derive(Debug, Deserialize)]
struct EvalQuery {
	id: Option<String>,
	query: String,
	expected_filenames: Vec<String>,
}

#[derive(Debug, Serialize)]
struct EvalOutput {
	dataset: EvalDatasetInfo,
	settings: EvalSettings,
	summary: EvalSummary,
	queries: Vec<QueryReport>,
}

#[derive(Debug, Serialize)]
struct EvalDatasetInfo {
	name: String,
	query_count: usize,
}

#[derive(Debug, Serialize)]
struct EvalSettings {
	config_path: String,
	top_k: u32,
	use_transformation: bool,
	rerank: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	rerank_threshold: Option<f32>,
}

#[derive(Debug, Serialize)]
struct EvalSummary {
	avg_recall_at_k: f64,
	avg_precision_at_k: f64,
	mean_rr: f64,
	mean_ndcg: f64,
	latency_ms_p50: f64,
	latency_ms_p95: f64,
	degraded_queries: usize,
}

#[derive(Debug, Serialize)]
struct QueryReport {
	id: String,
	query: String,
	expected_count: usize,
	retrieved_count: usize,
	relevant_count: usize,
	recall_at_k: f64,
	precision_at_k: f64,
	rr: f64,
	ndcg: f64,
	latency_ms: f64,
	#[serde(skip_serializing_if = "Option::is_none")]
	degraded: Option<&'static str>,
	expected_filenames: Vec<String>,
	retrieved_filenames: Vec<String>,
}

struct Metrics {
	recall_at_k: f64,
	precision_at_k: f64,
	rr: f64,
	ndcg: f64,
	relevant_count: usize,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = farmrag_config::load(&args.config)?;
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

	let dataset = load_dataset(args.dataset.as_path())?;
	let db = Db::connect(&config.storage.postgres).await?;

	db.ensure_schema(config.storage.documents.vector_dim).await?;

	let service = RetrievalService::new(config, db)?;
	let output = eval(args.config.as_path(), &service, &dataset, &args).await?;
	let json = serde_json::to_string_pretty(&output)?;

	println!("{json}");

	Ok(())
}

fn load_dataset(path: &Path) -> color_eyre::Result<EvalDataset> {
	let raw = fs::read_to_string(path)?;
	let dataset: EvalDataset = serde_json::from_str(&raw)?;

	if dataset.queries.is_empty() {
		return Err(eyre::eyre!("Dataset must include at least one query."));
	}

	Ok(dataset)
}

async fn eval(
	config_path: &Path,
	service: &RetrievalService,
	dataset: &EvalDataset,
	args: &Args,
) -> color_eyre::Result<EvalOutput> {
	let cfg = &service.cfg;
	let top_k = args.top_k.unwrap_or(cfg.search.top_k).max(1);
	let use_transformation = cfg.search.use_transformation && !args.no_transformation;
	let rerank = !args.no_rerank;
	let mut reports = Vec::with_capacity(dataset.queries.len());
	let mut latencies_ms = Vec::with_capacity(dataset.queries.len());

	for (index, query) in dataset.queries.iter().enumerate() {
		let expected = unique_filenames(query.expected_filenames.iter().map(String::as_str));
		let expected_set: HashSet<&str> = expected.iter().map(String::as_str).collect();
		let started = Instant::now();
		let outcome =
			service.hybrid.search_detailed(&query.query, use_transformation, top_k as usize).await?;
		let ranked = if rerank {
			service
				.reranker
				.rerank_with_threshold(
					&outcome.transformation.original,
					&outcome.candidates,
					cfg.rerank.threshold,
					cfg.rerank.top_k as usize,
				)
				.await?
		} else {
			outcome.candidates.clone()
		};
		let latency_ms = started.elapsed().as_secs_f64() * 1_000.0;
		let retrieved = retrieved_filenames(&ranked);
		let metrics = compute_metrics(&retrieved, &expected_set);

		tracing::debug!(query = query.query.as_str(), latency_ms, "Evaluated query.");

		reports.push(QueryReport {
			id: query.id.clone().unwrap_or_else(|| format!("q{}", index + 1)),
			query: query.query.clone(),
			expected_count: expected.len(),
			retrieved_count: retrieved.len(),
			relevant_count: metrics.relevant_count,
			recall_at_k: metrics.recall_at_k,
			precision_at_k: metrics.precision_at_k,
			rr: metrics.rr,
			ndcg: metrics.ndcg,
			latency_ms,
			degraded: outcome.degraded.map(|channel| channel.as_str()),
			expected_filenames: expected,
			retrieved_filenames: retrieved,
		});
		latencies_ms.push(latency_ms);
	}

	let summary = summarize(&reports, &latencies_ms);

	Ok(EvalOutput {
		dataset: EvalDatasetInfo {
			name: dataset.name.clone().unwrap_or_else(|| "eval".to_string()),
			query_count: reports.len(),
		},
		settings: EvalSettings {
			config_path: config_path.display().to_string(),
			top_k,
			use_transformation,
			rerank,
			rerank_threshold: rerank.then_some(cfg.rerank.threshold),
		},
		summary,
		queries: reports,
	})
}

/// Relevance is judged per document, so several chunks of one file count once.
fn retrieved_filenames(candidates: &[ScoredCandidate]) -> Vec<String> {
	unique_filenames(candidates.iter().map(|candidate| candidate.chunk.filename.as_str()))
}

fn unique_filenames<'a, I>(iter: I) -> Vec<String>
where
	I: Iterator<Item = &'a str>,
{
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for name in iter {
		if seen.insert(name) {
			out.push(name.to_string());
		}
	}

	out
}

fn compute_metrics(retrieved: &[String], expected: &HashSet<&str>) -> Metrics {
	let expected_count = expected.len();
	let mut relevant_count = 0_usize;
	let mut dcg = 0.0_f64;
	let mut first_hit: Option<usize> = None;

	for (idx, name) in retrieved.iter().enumerate() {
		if !expected.contains(name.as_str()) {
			continue;
		}

		let rank = idx + 1;

		relevant_count += 1;
		dcg += 1.0 / (rank as f64 + 1.0).log2();

		if first_hit.is_none() {
			first_hit = Some(rank);
		}
	}

	let rr = first_hit.map(|rank| 1.0 / rank as f64).unwrap_or(0.0);
	let ideal_hits = expected_count.min(retrieved.len());
	let idcg: f64 = (1..=ideal_hits).map(|rank| 1.0 / (rank as f64 + 1.0).log2()).sum();
	let ndcg = if idcg > 0.0 { dcg / idcg } else { 0.0 };
	let precision_at_k =
		if retrieved.is_empty() { 0.0 } else { relevant_count as f64 / retrieved.len() as f64 };
	let recall_at_k =
		if expected_count == 0 { 0.0 } else { relevant_count as f64 / expected_count as f64 };

	Metrics { recall_at_k, precision_at_k, rr, ndcg, relevant_count }
}

fn summarize(reports: &[QueryReport], latencies_ms: &[f64]) -> EvalSummary {
	let count = reports.len().max(1) as f64;
	let avg_recall_at_k = reports.iter().map(|r| r.recall_at_k).sum::<f64>() / count;
	let avg_precision_at_k = reports.iter().map(|r| r.precision_at_k).sum::<f64>() / count;
	let mean_rr = reports.iter().map(|r| r.rr).sum::<f64>() / count;
	let mean_ndcg = reports.iter().map(|r| r.ndcg).sum::<f64>() / count;
	let degraded_queries = reports.iter().filter(|r| r.degraded.is_some()).count();
	let mut sorted = latencies_ms.to_vec();

	sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

	EvalSummary {
		avg_recall_at_k,
		avg_precision_at_k,
		mean_rr,
		mean_ndcg,
		latency_ms_p50: percentile(&sorted, 0.50),
		latency_ms_p95: percentile(&sorted, 0.95),
		degraded_queries,
	}
}

fn percentile(values: &[f64], percentile: f64) -> f64 {
	if values.is_empty() {
		return 0.0;
	}

	let clamped = percentile.clamp(0.0, 1.0);
	let pos = clamped * (values.len() as f64 - 1.0);
	let lower = pos.floor() as usize;
	let upper = pos.ceil() as usize;

	if lower == upper {
		values[lower]
	} else {
		let weight = pos - lower as f64;

		values[lower] * (1.0 - weight) + values[upper] * weight
	}
}
