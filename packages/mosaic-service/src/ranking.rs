//! Cosine ranking over the stored embedding corpus.
//!
//! Every call is a full linear scan over the candidates of one source type.
//! At the intended scale (a single user, low thousands of vectors) the scan
//! is cheaper than maintaining an index structure; that is a known ceiling,
//! not an accident.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use mosaic_storage::vectors::Embedding;

#[derive(Clone, Debug, PartialEq)]
pub struct RankedMatch {
	pub source_id: Uuid,
	pub score: f32,
}

/// `0` when either vector has zero magnitude; a similarity of "undefined"
/// must never divide by zero or outrank a real match.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
	if a.len() != b.len() {
		return 0.0;
	}

	let mut dot = 0.0_f32;
	let mut norm_a = 0.0_f32;
	let mut norm_b = 0.0_f32;

	for (x, y) in a.iter().zip(b.iter()) {
		dot += x * y;
		norm_a += x * x;
		norm_b += y * y;
	}

	if norm_a == 0.0 || norm_b == 0.0 {
		return 0.0;
	}

	dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Scores `candidates` against `query`, drops scores below `threshold`,
/// sorts descending, and truncates to `limit`.
///
/// Candidates embedded by a different model, or with a different dimension,
/// are incommensurate with the query vector and are skipped outright rather
/// than scored.
pub fn rank(
	query: &[f32],
	query_model: &str,
	candidates: &[Embedding],
	limit: usize,
	threshold: Option<f32>,
) -> Vec<RankedMatch> {
	let mut matches = Vec::with_capacity(candidates.len());

	for candidate in candidates {
		if candidate.model_identifier != query_model || candidate.vector.len() != query.len() {
			continue;
		}

		let score = cosine_similarity(query, &candidate.vector);

		if let Some(threshold) = threshold
			&& score < threshold
		{
			continue;
		}

		matches.push(RankedMatch { source_id: candidate.source_id, score });
	}

	matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
	matches.truncate(limit);

	matches
}

/// Collapses chunk-level matches to one entry per owning document, keeping
/// the best-scoring chunk and the overall rank order. Chunks with no mapping
/// (the chunk row vanished under us) are dropped.
pub fn dedupe_by_document(
	matches: &[RankedMatch],
	chunk_documents: &HashMap<Uuid, Uuid>,
) -> Vec<RankedMatch> {
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for entry in matches {
		let Some(document_id) = chunk_documents.get(&entry.source_id) else {
			continue;
		};

		if seen.insert(*document_id) {
			out.push(RankedMatch { source_id: *document_id, score: entry.score });
		}
	}

	out
}
