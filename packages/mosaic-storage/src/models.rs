use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Session {
	pub session_id: Uuid,
	pub project_id: Option<Uuid>,
	pub title: String,
	pub imported: bool,
	pub created_at: OffsetDateTime,
	pub last_active_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct Message {
	pub message_id: Uuid,
	pub session_id: Uuid,
	pub role: String,
	pub content: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct SessionMetadata {
	pub session_id: Uuid,
	pub orientation_blurb: String,
	pub unresolved_edge: String,
	pub last_pivot: String,
	pub generated_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct DocumentChunk {
	pub chunk_id: Uuid,
	pub document_id: Uuid,
	pub chunk_index: i32,
	pub source_name: String,
	pub text: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct EmbeddingRow {
	pub embedding_id: Uuid,
	pub source_type: String,
	pub source_id: Uuid,
	pub vec: String,
	pub dimension: i32,
	pub model_identifier: String,
	pub created_at: OffsetDateTime,
}

#[derive(Clone, Debug, sqlx::FromRow)]
pub struct EnrichmentJob {
	pub outbox_id: Uuid,
	pub source_type: String,
	pub source_id: Uuid,
	pub status: String,
	pub attempts: i32,
	pub last_error: Option<String>,
	pub available_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}
