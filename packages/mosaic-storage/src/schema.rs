/// Bootstrap DDL, applied statement by statement under an advisory lock.
/// Statements are split on `;`, so none of them may embed a semicolon in a
/// string literal.
pub const SCHEMA_SQL: &str = "\
CREATE TABLE IF NOT EXISTS sessions (
	session_id UUID PRIMARY KEY,
	project_id UUID,
	title TEXT NOT NULL,
	imported BOOLEAN NOT NULL DEFAULT FALSE,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	last_active_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS messages (
	message_id UUID PRIMARY KEY,
	session_id UUID NOT NULL REFERENCES sessions(session_id) ON DELETE CASCADE,
	role TEXT NOT NULL,
	content TEXT NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_messages_session_created
	ON messages (session_id, created_at);

CREATE TABLE IF NOT EXISTS session_metadata (
	session_id UUID PRIMARY KEY REFERENCES sessions(session_id) ON DELETE CASCADE,
	orientation_blurb TEXT NOT NULL,
	unresolved_edge TEXT NOT NULL,
	last_pivot TEXT NOT NULL,
	generated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS documents (
	document_id UUID PRIMARY KEY,
	name TEXT NOT NULL UNIQUE,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS document_chunks (
	chunk_id UUID PRIMARY KEY,
	document_id UUID NOT NULL REFERENCES documents(document_id) ON DELETE CASCADE,
	chunk_index INTEGER NOT NULL,
	source_name TEXT NOT NULL,
	text TEXT NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	UNIQUE (document_id, chunk_index)
);

CREATE TABLE IF NOT EXISTS embeddings (
	embedding_id UUID PRIMARY KEY,
	source_type TEXT NOT NULL,
	source_id UUID NOT NULL,
	vec TEXT NOT NULL,
	dimension INTEGER NOT NULL,
	model_identifier TEXT NOT NULL,
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	UNIQUE (source_type, source_id)
);

CREATE TABLE IF NOT EXISTS enrichment_outbox (
	outbox_id UUID PRIMARY KEY,
	source_type TEXT NOT NULL,
	source_id UUID NOT NULL,
	status TEXT NOT NULL DEFAULT 'PENDING',
	attempts INTEGER NOT NULL DEFAULT 0,
	last_error TEXT,
	available_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
	updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_enrichment_outbox_due
	ON enrichment_outbox (available_at)
	WHERE status IN ('PENDING', 'FAILED');
";
