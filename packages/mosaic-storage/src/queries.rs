use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	Result,
	db::Db,
	models::{Message, Session, SessionMetadata},
};

pub async fn get_session(db: &Db, session_id: Uuid) -> Result<Option<Session>> {
	let session = sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE session_id = $1")
		.bind(session_id)
		.fetch_optional(&db.pool)
		.await?;

	Ok(session)
}

pub async fn list_sessions_by_ids(db: &Db, session_ids: &[Uuid]) -> Result<Vec<Session>> {
	if session_ids.is_empty() {
		return Ok(Vec::new());
	}

	let sessions =
		sqlx::query_as::<_, Session>("SELECT * FROM sessions WHERE session_id = ANY($1)")
			.bind(session_ids)
			.fetch_all(&db.pool)
			.await?;

	Ok(sessions)
}

pub async fn list_messages(db: &Db, session_id: Uuid) -> Result<Vec<Message>> {
	let messages = sqlx::query_as::<_, Message>(
		"SELECT * FROM messages WHERE session_id = $1 ORDER BY created_at ASC",
	)
	.bind(session_id)
	.fetch_all(&db.pool)
	.await?;

	Ok(messages)
}

pub async fn list_first_messages(db: &Db, session_id: Uuid, limit: i64) -> Result<Vec<Message>> {
	let messages = sqlx::query_as::<_, Message>(
		"SELECT * FROM messages WHERE session_id = $1 ORDER BY created_at ASC LIMIT $2",
	)
	.bind(session_id)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(messages)
}

/// Sessions whose activity went quiet before `cutoff` and whose summary
/// metadata is missing or predates the latest activity. Imported archives
/// never qualify. Ordered oldest-activity-first so the longest-stale session
/// is refreshed first.
pub async fn sessions_needing_metadata(db: &Db, cutoff: OffsetDateTime) -> Result<Vec<Session>> {
	let sessions = sqlx::query_as::<_, Session>(
		"\
SELECT s.*
FROM sessions s
LEFT JOIN session_metadata m ON m.session_id = s.session_id
WHERE s.imported = FALSE
	AND s.last_active_at <= $1
	AND (m.session_id IS NULL OR m.generated_at < s.last_active_at)
ORDER BY s.last_active_at ASC",
	)
	.bind(cutoff)
	.fetch_all(&db.pool)
	.await?;

	Ok(sessions)
}

pub async fn get_session_metadata(
	db: &Db,
	session_id: Uuid,
) -> Result<Option<SessionMetadata>> {
	let metadata = sqlx::query_as::<_, SessionMetadata>(
		"SELECT * FROM session_metadata WHERE session_id = $1",
	)
	.bind(session_id)
	.fetch_optional(&db.pool)
	.await?;

	Ok(metadata)
}

pub async fn list_session_metadata_by_ids(
	db: &Db,
	session_ids: &[Uuid],
) -> Result<Vec<SessionMetadata>> {
	if session_ids.is_empty() {
		return Ok(Vec::new());
	}

	let metadata = sqlx::query_as::<_, SessionMetadata>(
		"SELECT * FROM session_metadata WHERE session_id = ANY($1)",
	)
	.bind(session_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(metadata)
}

pub async fn set_session_title_tx(
	tx: &mut Transaction<'_, Postgres>,
	session_id: Uuid,
	title: &str,
) -> Result<()> {
	sqlx::query("UPDATE sessions SET title = $1 WHERE session_id = $2")
		.bind(title)
		.bind(session_id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

/// Single-row upsert: regeneration overwrites, it never versions.
pub async fn upsert_session_metadata_tx(
	tx: &mut Transaction<'_, Postgres>,
	session_id: Uuid,
	orientation_blurb: &str,
	unresolved_edge: &str,
	last_pivot: &str,
	generated_at: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO session_metadata (session_id, orientation_blurb, unresolved_edge, last_pivot, generated_at)
VALUES ($1, $2, $3, $4, $5)
ON CONFLICT (session_id) DO UPDATE
SET
	orientation_blurb = EXCLUDED.orientation_blurb,
	unresolved_edge = EXCLUDED.unresolved_edge,
	last_pivot = EXCLUDED.last_pivot,
	generated_at = EXCLUDED.generated_at",
	)
	.bind(session_id)
	.bind(orientation_blurb)
	.bind(unresolved_edge)
	.bind(last_pivot)
	.bind(generated_at)
	.execute(&mut **tx)
	.await?;

	Ok(())
}
