//! One embedding per `(source_type, source_id)`.
//!
//! Writes replace the previous row with a delete-then-insert inside a single
//! transaction, so a reader never observes two vectors for one key and a
//! half-written update never survives. Vectors travel as JSON float arrays
//! in a text column; `dimension` and `model_identifier` ride along so a
//! re-embedded corpus cannot be silently compared against stale vectors.

use sqlx::{Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{Error, Result, db::Db, models::EmbeddingRow};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceType {
	SessionSummary,
	DocumentChunk,
}
impl SourceType {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::SessionSummary => "session_summary",
			Self::DocumentChunk => "document_chunk",
		}
	}

	pub fn parse(raw: &str) -> Result<Self> {
		match raw {
			"session_summary" => Ok(Self::SessionSummary),
			"document_chunk" => Ok(Self::DocumentChunk),
			other => Err(Error::InvalidArgument(format!("Unknown source type {other:?}."))),
		}
	}
}

#[derive(Clone, Debug)]
pub struct Embedding {
	pub source_id: Uuid,
	pub vector: Vec<f32>,
	pub dimension: i32,
	pub model_identifier: String,
	pub created_at: OffsetDateTime,
}

pub fn encode_vector(vector: &[f32]) -> Result<String> {
	serde_json::to_string(vector)
		.map_err(|err| Error::InvalidArgument(format!("Vector does not serialize: {err}.")))
}

pub fn decode_vector(text: &str) -> Result<Vec<f32>> {
	serde_json::from_str(text)
		.map_err(|err| Error::InvalidArgument(format!("Vector payload does not parse: {err}.")))
}

pub async fn store(
	db: &Db,
	source_type: SourceType,
	source_id: Uuid,
	vector: &[f32],
	model_identifier: &str,
) -> Result<()> {
	let vec_text = encode_vector(vector)?;
	let mut tx = db.pool.begin().await?;

	sqlx::query("DELETE FROM embeddings WHERE source_type = $1 AND source_id = $2")
		.bind(source_type.as_str())
		.bind(source_id)
		.execute(&mut *tx)
		.await?;
	sqlx::query(
		"\
INSERT INTO embeddings (embedding_id, source_type, source_id, vec, dimension, model_identifier)
VALUES ($1, $2, $3, $4, $5, $6)",
	)
	.bind(Uuid::new_v4())
	.bind(source_type.as_str())
	.bind(source_id)
	.bind(vec_text.as_str())
	.bind(vector.len() as i32)
	.bind(model_identifier)
	.execute(&mut *tx)
	.await?;

	tx.commit().await?;

	Ok(())
}

pub async fn get(db: &Db, source_type: SourceType, source_id: Uuid) -> Result<Option<Embedding>> {
	let row = sqlx::query_as::<_, EmbeddingRow>(
		"SELECT * FROM embeddings WHERE source_type = $1 AND source_id = $2",
	)
	.bind(source_type.as_str())
	.bind(source_id)
	.fetch_optional(&db.pool)
	.await?;

	row.map(decode_row).transpose()
}

pub async fn get_all_by_type(db: &Db, source_type: SourceType) -> Result<Vec<Embedding>> {
	let rows = sqlx::query_as::<_, EmbeddingRow>(
		"SELECT * FROM embeddings WHERE source_type = $1 ORDER BY created_at ASC",
	)
	.bind(source_type.as_str())
	.fetch_all(&db.pool)
	.await?;

	rows.into_iter().map(decode_row).collect()
}

pub async fn exists(db: &Db, source_type: SourceType, source_id: Uuid) -> Result<bool> {
	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM embeddings WHERE source_type = $1 AND source_id = $2",
	)
	.bind(source_type.as_str())
	.bind(source_id)
	.fetch_one(&db.pool)
	.await?;

	Ok(count > 0)
}

pub async fn delete(db: &Db, source_type: SourceType, source_id: Uuid) -> Result<()> {
	sqlx::query("DELETE FROM embeddings WHERE source_type = $1 AND source_id = $2")
		.bind(source_type.as_str())
		.bind(source_id)
		.execute(&db.pool)
		.await?;

	Ok(())
}

pub async fn delete_many_tx(
	tx: &mut Transaction<'_, Postgres>,
	source_type: SourceType,
	source_ids: &[Uuid],
) -> Result<()> {
	if source_ids.is_empty() {
		return Ok(());
	}

	sqlx::query("DELETE FROM embeddings WHERE source_type = $1 AND source_id = ANY($2)")
		.bind(source_type.as_str())
		.bind(source_ids)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

fn decode_row(row: EmbeddingRow) -> Result<Embedding> {
	let vector = decode_vector(&row.vec)?;

	Ok(Embedding {
		source_id: row.source_id,
		vector,
		dimension: row.dimension,
		model_identifier: row.model_identifier,
		created_at: row.created_at,
	})
}
