//! Queued embedding work.
//!
//! An enrichment row is written in the same transaction as the write that
//! produced the source text, then drained by the scheduler binary. The
//! enqueuing request never waits on, or fails because of, the embedding.

use sqlx::{Postgres, Transaction};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::{Result, db::Db, models::EnrichmentJob};

pub async fn enqueue_tx(
	tx: &mut Transaction<'_, Postgres>,
	source_type: &str,
	source_id: Uuid,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO enrichment_outbox (outbox_id, source_type, source_id, status, created_at, updated_at, available_at)
VALUES ($1, $2, $3, 'PENDING', $4, $4, $4)",
	)
	.bind(Uuid::new_v4())
	.bind(source_type)
	.bind(source_id)
	.bind(now)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

/// Claims the next due job and leases it, so a crashed worker releases the
/// job after the lease instead of wedging it.
pub async fn claim_next(
	db: &Db,
	now: OffsetDateTime,
	lease: Duration,
) -> Result<Option<EnrichmentJob>> {
	let mut tx = db.pool.begin().await?;
	let row = sqlx::query_as::<_, EnrichmentJob>(
		"\
SELECT *
FROM enrichment_outbox
WHERE status IN ('PENDING', 'FAILED') AND available_at <= $1
ORDER BY available_at ASC
LIMIT 1
FOR UPDATE SKIP LOCKED",
	)
	.bind(now)
	.fetch_optional(&mut *tx)
	.await?;
	let job = if let Some(mut job) = row {
		let lease_until = now + lease;

		sqlx::query(
			"UPDATE enrichment_outbox SET available_at = $1, updated_at = $2 WHERE outbox_id = $3",
		)
		.bind(lease_until)
		.bind(now)
		.bind(job.outbox_id)
		.execute(&mut *tx)
		.await?;

		job.available_at = lease_until;
		job.updated_at = now;

		Some(job)
	} else {
		None
	};

	tx.commit().await?;

	Ok(job)
}

pub async fn mark_done(db: &Db, outbox_id: Uuid, now: OffsetDateTime) -> Result<()> {
	sqlx::query("UPDATE enrichment_outbox SET status = 'DONE', updated_at = $1 WHERE outbox_id = $2")
		.bind(now)
		.bind(outbox_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn mark_failed(
	db: &Db,
	outbox_id: Uuid,
	attempts: i32,
	error_text: &str,
	available_at: OffsetDateTime,
	now: OffsetDateTime,
) -> Result<()> {
	sqlx::query(
		"\
UPDATE enrichment_outbox
SET status = 'FAILED',
	attempts = $1,
	last_error = $2,
	available_at = $3,
	updated_at = $4
WHERE outbox_id = $5",
	)
	.bind(attempts)
	.bind(error_text)
	.bind(available_at)
	.bind(now)
	.bind(outbox_id)
	.execute(&db.pool)
	.await?;

	Ok(())
}
