use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mosaic_storage::{
	documents, queries,
	vectors::{self, SourceType},
};

use crate::{MosaicService, ServiceResult, ranking, round_score, validate_query};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimilaritySearchRequest {
	pub query: String,
	pub exclude_session_id: Option<Uuid>,
	pub limit: Option<u32>,
	pub threshold: Option<f32>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SessionMatch {
	pub session_id: Uuid,
	pub title: String,
	pub score: f32,
	pub has_unresolved: bool,
	#[serde(with = "crate::time_serde")]
	pub last_active_at: time::OffsetDateTime,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SimilaritySearchResponse {
	pub results: Vec<SessionMatch>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DocumentMatch {
	pub document_id: Uuid,
	pub name: String,
	pub score: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RelatedDocumentsResponse {
	pub results: Vec<DocumentMatch>,
}

impl MosaicService {
	/// Ad hoc "related sessions while typing": embeds the query and ranks it
	/// against every stored session summary.
	pub async fn similarity_search(
		&self,
		req: SimilaritySearchRequest,
	) -> ServiceResult<SimilaritySearchResponse> {
		let query = validate_query(&req.query)?;
		let Some(embedded) =
			self.providers.embedding.embed(&self.cfg.providers.embedding, query).await
		else {
			// No reachable embedding backend degrades to an empty result set
			// so the caller can fall back to keyword search.
			return Ok(SimilaritySearchResponse { results: Vec::new() });
		};
		let limit = req.limit.unwrap_or(self.cfg.search.similarity_limit) as usize;
		let threshold = req.threshold.unwrap_or(self.cfg.search.similarity_threshold);
		let mut candidates = vectors::get_all_by_type(&self.db, SourceType::SessionSummary).await?;

		if let Some(excluded) = req.exclude_session_id {
			candidates.retain(|candidate| candidate.source_id != excluded);
		}

		let ranked = ranking::rank(
			&embedded.vector,
			&embedded.model_identifier,
			&candidates,
			limit,
			Some(threshold),
		);
		let results = self.session_matches(&ranked, None).await?;

		Ok(SimilaritySearchResponse { results })
	}

	/// Sessions related to an existing session, ranked by its stored summary
	/// embedding. A session that has not been indexed yet has no relations.
	pub async fn related_sessions(
		&self,
		session_id: Uuid,
	) -> ServiceResult<SimilaritySearchResponse> {
		let Some(own) = vectors::get(&self.db, SourceType::SessionSummary, session_id).await?
		else {
			return Ok(SimilaritySearchResponse { results: Vec::new() });
		};
		let mut candidates = vectors::get_all_by_type(&self.db, SourceType::SessionSummary).await?;

		// The session must leave the candidate set before ranking, not after,
		// or it would eat one slot of the limit.
		candidates.retain(|candidate| candidate.source_id != session_id);

		let ranked = ranking::rank(
			&own.vector,
			&own.model_identifier,
			&candidates,
			self.cfg.search.similarity_limit as usize,
			Some(self.cfg.search.similarity_threshold),
		);
		let results = self.session_matches(&ranked, None).await?;

		Ok(SimilaritySearchResponse { results })
	}

	/// Documents related to a session: chunk-level ranking collapsed to the
	/// best chunk per document.
	pub async fn related_documents(
		&self,
		session_id: Uuid,
	) -> ServiceResult<RelatedDocumentsResponse> {
		let Some(own) = vectors::get(&self.db, SourceType::SessionSummary, session_id).await?
		else {
			return Ok(RelatedDocumentsResponse { results: Vec::new() });
		};
		let candidates = vectors::get_all_by_type(&self.db, SourceType::DocumentChunk).await?;
		let ranked = ranking::rank(
			&own.vector,
			&own.model_identifier,
			&candidates,
			candidates.len(),
			Some(self.cfg.search.similarity_threshold),
		);
		let chunk_ids: Vec<Uuid> = ranked.iter().map(|entry| entry.source_id).collect();
		let rows = documents::chunk_documents(&self.db, &chunk_ids).await?;
		let chunk_to_document: HashMap<Uuid, Uuid> =
			rows.iter().map(|(chunk_id, document_id, _)| (*chunk_id, *document_id)).collect();
		let names: HashMap<Uuid, &str> =
			rows.iter().map(|(_, document_id, name)| (*document_id, name.as_str())).collect();
		let mut deduped = ranking::dedupe_by_document(&ranked, &chunk_to_document);

		deduped.truncate(self.cfg.search.similarity_limit as usize);

		let results = deduped
			.into_iter()
			.filter_map(|entry| {
				names.get(&entry.source_id).map(|name| DocumentMatch {
					document_id: entry.source_id,
					name: (*name).to_string(),
					score: round_score(entry.score),
				})
			})
			.collect();

		Ok(RelatedDocumentsResponse { results })
	}

	/// Resolves ranked session ids into response entries, preserving rank
	/// order. `project_filter` drops sessions outside the project after
	/// ranking.
	pub(crate) async fn session_matches(
		&self,
		ranked: &[ranking::RankedMatch],
		project_filter: Option<Uuid>,
	) -> ServiceResult<Vec<SessionMatch>> {
		let session_ids: Vec<Uuid> = ranked.iter().map(|entry| entry.source_id).collect();
		let sessions = queries::list_sessions_by_ids(&self.db, &session_ids).await?;
		let metadata = queries::list_session_metadata_by_ids(&self.db, &session_ids).await?;
		let sessions: HashMap<Uuid, _> =
			sessions.into_iter().map(|session| (session.session_id, session)).collect();
		let unresolved: HashMap<Uuid, bool> = metadata
			.into_iter()
			.map(|m| (m.session_id, !m.unresolved_edge.trim().is_empty()))
			.collect();
		let mut results = Vec::with_capacity(ranked.len());

		for entry in ranked {
			let Some(session) = sessions.get(&entry.source_id) else {
				// Orphan vector; the session row is gone.
				continue;
			};

			if let Some(project_id) = project_filter
				&& session.project_id != Some(project_id)
			{
				continue;
			}

			results.push(SessionMatch {
				session_id: session.session_id,
				title: session.title.clone(),
				score: round_score(entry.score),
				has_unresolved: unresolved.get(&session.session_id).copied().unwrap_or(false),
				last_active_at: session.last_active_at,
			});
		}

		Ok(results)
	}
}
