use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{Result, db::Db, models::DocumentChunk};

pub async fn find_document_by_name_tx(
	tx: &mut Transaction<'_, Postgres>,
	name: &str,
) -> Result<Option<Uuid>> {
	let document_id =
		sqlx::query_scalar::<_, Uuid>("SELECT document_id FROM documents WHERE name = $1")
			.bind(name)
			.fetch_optional(&mut **tx)
			.await?;

	Ok(document_id)
}

pub async fn insert_document_tx(
	tx: &mut Transaction<'_, Postgres>,
	document_id: Uuid,
	name: &str,
) -> Result<()> {
	sqlx::query("INSERT INTO documents (document_id, name) VALUES ($1, $2)")
		.bind(document_id)
		.bind(name)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

pub async fn list_chunk_ids_tx(
	tx: &mut Transaction<'_, Postgres>,
	document_id: Uuid,
) -> Result<Vec<Uuid>> {
	let chunk_ids =
		sqlx::query_scalar::<_, Uuid>("SELECT chunk_id FROM document_chunks WHERE document_id = $1")
			.bind(document_id)
			.fetch_all(&mut **tx)
			.await?;

	Ok(chunk_ids)
}

pub async fn delete_document_chunks_tx(
	tx: &mut Transaction<'_, Postgres>,
	document_id: Uuid,
) -> Result<()> {
	sqlx::query("DELETE FROM document_chunks WHERE document_id = $1")
		.bind(document_id)
		.execute(&mut **tx)
		.await?;

	Ok(())
}

pub async fn insert_document_chunk_tx(
	tx: &mut Transaction<'_, Postgres>,
	chunk_id: Uuid,
	document_id: Uuid,
	chunk_index: i32,
	source_name: &str,
	text: &str,
) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO document_chunks (chunk_id, document_id, chunk_index, source_name, text)
VALUES ($1, $2, $3, $4, $5)",
	)
	.bind(chunk_id)
	.bind(document_id)
	.bind(chunk_index)
	.bind(source_name)
	.bind(text)
	.execute(&mut **tx)
	.await?;

	Ok(())
}

pub async fn get_document_chunk(db: &Db, chunk_id: Uuid) -> Result<Option<DocumentChunk>> {
	let chunk =
		sqlx::query_as::<_, DocumentChunk>("SELECT * FROM document_chunks WHERE chunk_id = $1")
			.bind(chunk_id)
			.fetch_optional(&db.pool)
			.await?;

	Ok(chunk)
}

/// Maps chunk ids back to their owning document, for per-document
/// deduplication of chunk-level matches.
pub async fn chunk_documents(
	db: &Db,
	chunk_ids: &[Uuid],
) -> Result<Vec<(Uuid, Uuid, String)>> {
	if chunk_ids.is_empty() {
		return Ok(Vec::new());
	}

	let rows = sqlx::query_as::<_, (Uuid, Uuid, String)>(
		"\
SELECT c.chunk_id, c.document_id, d.name
FROM document_chunks c
JOIN documents d ON d.document_id = c.document_id
WHERE c.chunk_id = ANY($1)",
	)
	.bind(chunk_ids)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}
