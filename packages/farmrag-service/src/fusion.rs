//! Reciprocal Rank Fusion over the vector and lexical candidate lists.

use std::{
	cmp::Ordering,
	collections::{HashMap, HashSet},
};

use uuid::Uuid;

use crate::candidate::{Channel, ScoredCandidate};

pub const DEFAULT_RRF_K: u32 = 60;

struct Entry {
	base: ScoredCandidate,
	/// Summed in `f64`; `f32` sums tie for some distinct rank pairs.
	score: f64,
}

/// Merges two ranked lists into one consensus ranking.
///
/// Within each list only the first occurrence of a chunk is ranked; ranks count distinct chunks
/// starting at 1. A chunk scores `1 / (k + rank)` per list it appears in. Output is sorted by
/// fused score descending with ties kept in first-seen order (vector list first), then truncated
/// to `top_k`.
pub fn reciprocal_rank_fusion(
	vector: &[ScoredCandidate],
	lexical: &[ScoredCandidate],
	k: u32,
	top_k: usize,
) -> Vec<ScoredCandidate> {
	let mut entries: Vec<Entry> = Vec::with_capacity(vector.len() + lexical.len());
	let mut positions: HashMap<Uuid, usize> = HashMap::new();

	accumulate(&mut entries, &mut positions, vector, Channel::Vector, k);
	accumulate(&mut entries, &mut positions, lexical, Channel::Lexical, k);

	// `sort_by` is stable, which gives the first-seen tie-break.
	entries.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
	entries.truncate(top_k);

	entries
		.into_iter()
		.map(|entry| ScoredCandidate { rrf_score: Some(entry.score as f32), ..entry.base })
		.collect()
}

fn accumulate(
	entries: &mut Vec<Entry>,
	positions: &mut HashMap<Uuid, usize>,
	list: &[ScoredCandidate],
	channel: Channel,
	k: u32,
) {
	let mut seen = HashSet::new();
	let mut rank: u32 = 0;

	for candidate in list {
		let chunk_id = candidate.chunk_id();

		if !seen.insert(chunk_id) {
			continue;
		}

		rank += 1;

		let contribution = 1.0 / (f64::from(k) + f64::from(rank));

		match positions.get(&chunk_id) {
			Some(&idx) => {
				let entry = &mut entries[idx];

				entry.score += contribution;
				entry.base.provenance = entry.base.provenance.with(channel);

				match channel {
					Channel::Vector => entry.base.similarity = candidate.similarity,
					Channel::Lexical => entry.base.lexical_score = candidate.lexical_score,
				}
			},
			None => {
				positions.insert(chunk_id, entries.len());
				entries.push(Entry {
					base: ScoredCandidate {
						provenance: channel.into(),
						rrf_score: None,
						relevance_score: None,
						..candidate.clone()
					},
					score: contribution,
				});
			},
		}
	}
}
