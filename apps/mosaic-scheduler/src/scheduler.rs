//! Background refresh of session summary metadata.
//!
//! One timer, sequential per-session processing, and the next tick is
//! scheduled only after the previous one completes, so ticks never overlap.
//! Between ticks the same loop drains the enrichment outbox.

use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tokio::{sync::watch, task::JoinHandle, time as tokio_time};

use mosaic_config::Config;
use mosaic_domain::staleness::{self, Freshness};
use mosaic_service::Providers;
use mosaic_storage::{
	db::Db,
	models::{Message, Session},
	outbox as outbox_store, queries,
	vectors::{self, SourceType},
};

use crate::outbox;

const POLL_INTERVAL_MS: u64 = 500;

pub struct SchedulerState {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}

/// Owns the background task. The process holds one of these and drives its
/// lifecycle explicitly; there is no global timer handle anywhere.
pub struct Scheduler {
	state: Arc<SchedulerState>,
	shutdown: watch::Sender<bool>,
	handle: Option<JoinHandle<()>>,
}
impl Scheduler {
	pub fn new(state: SchedulerState) -> Self {
		let (shutdown, _) = watch::channel(false);

		Self { state: Arc::new(state), shutdown, handle: None }
	}

	pub fn is_running(&self) -> bool {
		self.handle.as_ref().map(|handle| !handle.is_finished()).unwrap_or(false)
	}

	/// Starting an already-running scheduler is a no-op.
	pub fn start(&mut self) {
		if self.is_running() {
			return;
		}

		let state = self.state.clone();
		let shutdown = self.shutdown.subscribe();

		self.handle = Some(tokio::spawn(run_loop(state, shutdown)));
	}

	/// Signals the loop and waits for the in-flight tick to finish.
	pub async fn stop(&mut self) {
		let _ = self.shutdown.send(true);

		if let Some(handle) = self.handle.take() {
			if let Err(err) = handle.await {
				tracing::error!(error = %err, "Scheduler task ended abnormally.");
			}
		}
	}
}

async fn run_loop(state: Arc<SchedulerState>, mut shutdown: watch::Receiver<bool>) {
	let tick_interval = Duration::minutes(state.cfg.scheduler.tick_interval_minutes);
	// First tick fires immediately on startup.
	let mut next_tick = OffsetDateTime::now_utc();

	loop {
		if *shutdown.borrow() {
			break;
		}

		if OffsetDateTime::now_utc() >= next_tick {
			if let Err(err) = run_tick(&state).await {
				tracing::error!(error = %err, "Metadata refresh tick failed.");
			}

			next_tick = OffsetDateTime::now_utc() + tick_interval;
		}

		match outbox::process_next(&state).await {
			// A job was handled; look for the next one right away.
			Ok(true) => continue,
			Ok(false) => {},
			Err(err) => {
				tracing::error!(error = %err, "Enrichment outbox processing failed.");
			},
		}

		tokio::select! {
			_ = shutdown.changed() => break,
			_ = tokio_time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS)) => {},
		}
	}
}

/// One staleness pass: find every session whose activity went quiet and
/// whose summary lags it, and regenerate them one at a time. A single
/// session's failure is logged and skipped, never fatal to the tick.
/// Re-running against an already-fresh corpus is a no-op.
pub async fn run_tick(state: &SchedulerState) -> color_eyre::Result<()> {
	let now = OffsetDateTime::now_utc();
	let inactivity = Duration::minutes(state.cfg.scheduler.inactivity_minutes);
	let due = queries::sessions_needing_metadata(&state.db, now - inactivity).await?;

	if due.is_empty() {
		return Ok(());
	}

	tracing::info!(count = due.len(), "Refreshing stale session metadata.");

	// Sequential on purpose: one generation call in flight bounds provider
	// load.
	for session in due {
		if let Err(err) = refresh_session(state, &session).await {
			tracing::warn!(
				session_id = %session.session_id,
				error = %err,
				"Session metadata refresh failed. Continuing with the next session."
			);
		}
	}

	Ok(())
}

async fn refresh_session(state: &SchedulerState, session: &Session) -> color_eyre::Result<()> {
	let now = OffsetDateTime::now_utc();
	let inactivity = Duration::minutes(state.cfg.scheduler.inactivity_minutes);
	let metadata = queries::get_session_metadata(&state.db, session.session_id).await?;
	let freshness = staleness::classify(
		session.last_active_at,
		metadata.map(|metadata| metadata.generated_at),
		session.imported,
		now,
		inactivity,
	);

	// Re-check against live rows; the selection query may be stale by the
	// time this session's turn comes around in the sequence.
	if freshness != Freshness::NeedsRegeneration {
		return Ok(());
	}

	let messages = queries::list_messages(&state.db, session.session_id).await?;
	let transcript = render_transcript(&messages);

	if transcript.is_empty() {
		tracing::debug!(session_id = %session.session_id, "Session has no transcript. Skipping.");

		return Ok(());
	}

	let annotations =
		state.providers.generation.annotate(&state.cfg.providers.metadata, &transcript).await?;
	// Sessions abandoned before they were ever named get a title from the
	// same pass. Best-effort; an untitled session is not a failure.
	let title = if session.title.trim().is_empty() {
		match state.providers.generation.title(&state.cfg.providers.metadata, &transcript).await {
			Ok(title) => Some(title),
			Err(err) => {
				tracing::warn!(
					session_id = %session.session_id,
					error = %err,
					"Title generation failed. Leaving the session untitled."
				);

				None
			},
		}
	} else {
		None
	};
	let generated_at = OffsetDateTime::now_utc();
	let embed_needed =
		!vectors::exists(&state.db, SourceType::SessionSummary, session.session_id).await?;
	let mut tx = state.db.pool.begin().await?;

	if let Some(title) = title.as_deref() {
		queries::set_session_title_tx(&mut tx, session.session_id, title).await?;
	}

	queries::upsert_session_metadata_tx(
		&mut tx,
		session.session_id,
		&annotations.orientation_blurb,
		&annotations.unresolved_edge,
		&annotations.last_pivot,
		generated_at,
	)
	.await?;

	// The summary embedding is queued, never awaited here. An existing
	// vector means a previous pass already embedded this session, so the
	// enqueue is skipped instead of paying for a redundant provider call on
	// a partial-failure retry.
	if embed_needed {
		outbox_store::enqueue_tx(
			&mut tx,
			SourceType::SessionSummary.as_str(),
			session.session_id,
			generated_at,
		)
		.await?;
	}

	tx.commit().await?;

	Ok(())
}

fn render_transcript(messages: &[Message]) -> String {
	let mut out = String::new();

	for message in messages {
		out.push_str(&message.role);
		out.push_str(": ");
		out.push_str(&message.content);
		out.push('\n');
	}

	out.trim_end().to_string()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn message(role: &str, content: &str) -> Message {
		Message {
			message_id: uuid::Uuid::new_v4(),
			session_id: uuid::Uuid::new_v4(),
			role: role.to_string(),
			content: content.to_string(),
			created_at: OffsetDateTime::UNIX_EPOCH,
		}
	}

	#[test]
	fn transcripts_interleave_roles_and_content() {
		let rendered = render_transcript(&[
			message("user", "Is the archive format settled?"),
			message("assistant", "Not yet."),
		]);

		assert_eq!(rendered, "user: Is the archive format settled?\nassistant: Not yet.");
	}

	#[test]
	fn empty_transcripts_render_empty() {
		assert!(render_transcript(&[]).is_empty());
	}
}
