//! Drains queued embedding work.
//!
//! Failures retry with exponential backoff; the request that enqueued the
//! job has long since returned and is never affected.

use time::{Duration, OffsetDateTime};

use mosaic_storage::{
	documents,
	models::EnrichmentJob,
	outbox, queries,
	vectors::{self, SourceType},
};

use crate::scheduler::SchedulerState;

const CLAIM_LEASE_SECONDS: i64 = 30;
const BASE_BACKOFF_MS: i64 = 500;
const MAX_BACKOFF_MS: i64 = 30_000;
const MAX_ERROR_CHARS: usize = 1_024;

/// Claims and handles at most one due job. Returns whether one was claimed.
pub async fn process_next(state: &SchedulerState) -> color_eyre::Result<bool> {
	let now = OffsetDateTime::now_utc();
	let Some(job) =
		outbox::claim_next(&state.db, now, Duration::seconds(CLAIM_LEASE_SECONDS)).await?
	else {
		return Ok(false);
	};

	match handle_job(state, &job).await {
		Ok(()) => {
			outbox::mark_done(&state.db, job.outbox_id, OffsetDateTime::now_utc()).await?;
		},
		Err(err) => {
			let next_attempts = job.attempts.saturating_add(1);
			let now = OffsetDateTime::now_utc();
			let available_at = now + backoff_for_attempt(next_attempts);
			let error_text = sanitize_error(&err.to_string());

			outbox::mark_failed(
				&state.db,
				job.outbox_id,
				next_attempts,
				&error_text,
				available_at,
				now,
			)
			.await?;
			tracing::error!(error = %err, outbox_id = %job.outbox_id, "Enrichment job failed.");
		},
	}

	Ok(true)
}

async fn handle_job(state: &SchedulerState, job: &EnrichmentJob) -> color_eyre::Result<()> {
	let source_type = SourceType::parse(&job.source_type)?;
	let text = match source_type {
		SourceType::SessionSummary => {
			let Some(metadata) =
				queries::get_session_metadata(&state.db, job.source_id).await?
			else {
				tracing::info!(session_id = %job.source_id, "Metadata missing for queued embedding. Marking done.");

				return Ok(());
			};

			summary_text(
				&metadata.orientation_blurb,
				&metadata.unresolved_edge,
				&metadata.last_pivot,
			)
		},
		SourceType::DocumentChunk => {
			let Some(chunk) = documents::get_document_chunk(&state.db, job.source_id).await?
			else {
				tracing::info!(chunk_id = %job.source_id, "Chunk missing for queued embedding. Marking done.");

				return Ok(());
			};

			chunk.text
		},
	};
	let Some(embedded) =
		state.providers.embedding.embed(&state.cfg.providers.embedding, &text).await
	else {
		return Err(color_eyre::eyre::eyre!("Every embedding backend failed."));
	};

	vectors::store(
		&state.db,
		source_type,
		job.source_id,
		&embedded.vector,
		&embedded.model_identifier,
	)
	.await?;

	Ok(())
}

/// The concatenated summary fields are what session-level retrieval sees.
pub fn summary_text(orientation: &str, unresolved: &str, pivot: &str) -> String {
	[orientation, unresolved, pivot]
		.iter()
		.map(|part| part.trim())
		.filter(|part| !part.is_empty())
		.collect::<Vec<_>>()
		.join("\n\n")
}

fn backoff_for_attempt(attempt: i32) -> Duration {
	let attempts = attempt.max(1) as u32;
	let exp = attempts.saturating_sub(1).min(6);
	let base = BASE_BACKOFF_MS.saturating_mul(1 << exp);
	let capped = base.min(MAX_BACKOFF_MS);

	Duration::milliseconds(capped)
}

/// Outbox errors land in a queryable column; keep credentials out of them
/// and keep them short.
fn sanitize_error(text: &str) -> String {
	let mut parts = Vec::new();
	let mut redact_next = false;

	for raw in text.split_whitespace() {
		let mut word = raw.to_string();

		if redact_next {
			word = "[REDACTED]".to_string();
			redact_next = false;
		}
		if raw.eq_ignore_ascii_case("bearer") {
			redact_next = true;
		}

		let lowered = raw.to_ascii_lowercase();

		for key in ["api_key", "apikey", "password", "secret", "token"] {
			if lowered.contains(key) && (lowered.contains('=') || lowered.contains(':')) {
				let sep = if raw.contains('=') { '=' } else { ':' };
				let prefix = raw.split(sep).next().unwrap_or(raw);

				word = format!("{prefix}{sep}[REDACTED]");

				break;
			}
		}

		parts.push(word);
	}

	let mut out = parts.join(" ");

	if out.chars().count() > MAX_ERROR_CHARS {
		out = out.chars().take(MAX_ERROR_CHARS).collect();
		out.push_str("...");
	}

	out
}
