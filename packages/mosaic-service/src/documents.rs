use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use mosaic_chunking::ChunkingConfig;
use mosaic_storage::{
	documents, outbox,
	vectors::{self, SourceType},
};

use crate::{MosaicService, ServiceError, ServiceResult};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IndexDocumentRequest {
	pub name: String,
	pub text: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IndexDocumentResponse {
	pub document_id: Uuid,
	pub chunks: u32,
}

impl MosaicService {
	/// Accepts raw extracted text, chunks it, and stores the chunks.
	/// Embeddings are queued, not generated here: an embedding failure must
	/// never fail the indexing request.
	///
	/// Re-indexing a name replaces that document's chunks wholesale, and
	/// drops the vectors of chunks that no longer exist.
	pub async fn index_document(
		&self,
		req: IndexDocumentRequest,
	) -> ServiceResult<IndexDocumentResponse> {
		let name = req.name.trim();

		if name.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Document name must be non-empty.".to_string(),
			});
		}

		let chunking = ChunkingConfig {
			window_words: self.cfg.chunking.window_words,
			overlap_words: self.cfg.chunking.overlap_words,
			small_doc_words: self.cfg.chunking.small_doc_words,
		};
		let chunks = mosaic_chunking::split_text(&req.text, &chunking);

		if chunks.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Document text is empty.".to_string(),
			});
		}

		let now = OffsetDateTime::now_utc();
		let mut tx = self.db.pool.begin().await?;
		let document_id = match documents::find_document_by_name_tx(&mut tx, name).await? {
			Some(existing) => {
				let old_chunk_ids = documents::list_chunk_ids_tx(&mut tx, existing).await?;

				vectors::delete_many_tx(&mut tx, SourceType::DocumentChunk, &old_chunk_ids)
					.await?;
				documents::delete_document_chunks_tx(&mut tx, existing).await?;

				existing
			},
			None => {
				let document_id = Uuid::new_v4();

				documents::insert_document_tx(&mut tx, document_id, name).await?;

				document_id
			},
		};

		for chunk in &chunks {
			let chunk_id = chunk_id_for(document_id, chunk.chunk_index);

			documents::insert_document_chunk_tx(
				&mut tx,
				chunk_id,
				document_id,
				chunk.chunk_index,
				name,
				&chunk.text,
			)
			.await?;
			outbox::enqueue_tx(&mut tx, SourceType::DocumentChunk.as_str(), chunk_id, now)
				.await?;
		}

		tx.commit().await?;

		tracing::info!(
			document_id = %document_id,
			chunks = chunks.len(),
			"Document indexed. Embeddings queued."
		);

		Ok(IndexDocumentResponse { document_id, chunks: chunks.len() as u32 })
	}
}

/// Chunk ids derive from the document and position, so re-indexing the same
/// document addresses the same rows.
pub fn chunk_id_for(document_id: Uuid, chunk_index: i32) -> Uuid {
	let name = format!("{document_id}:{chunk_index}");

	Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn chunk_ids_are_stable_per_document_and_index() {
		let document_id = Uuid::new_v4();

		assert_eq!(chunk_id_for(document_id, 0), chunk_id_for(document_id, 0));
		assert_ne!(chunk_id_for(document_id, 0), chunk_id_for(document_id, 1));
		assert_ne!(chunk_id_for(document_id, 0), chunk_id_for(Uuid::new_v4(), 0));
	}
}
