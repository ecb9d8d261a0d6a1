use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mosaic_storage::vectors::{self, SourceType};

use crate::{MosaicService, ServiceResult, SessionMatch, ranking, validate_query};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConceptSearchRequest {
	pub query: String,
	pub limit: Option<u32>,
	pub project_id: Option<Uuid>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ConceptSearchResponse {
	pub results: Vec<SessionMatch>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchAvailability {
	pub available: bool,
}

impl MosaicService {
	/// Concept search over session summaries. With no reachable embedding
	/// backend the result set is empty, not an error, so the UI can fall
	/// back to keyword search silently.
	pub async fn concept_search(
		&self,
		req: ConceptSearchRequest,
	) -> ServiceResult<ConceptSearchResponse> {
		let query = validate_query(&req.query)?;
		let Some(embedded) =
			self.providers.embedding.embed(&self.cfg.providers.embedding, query).await
		else {
			return Ok(ConceptSearchResponse { results: Vec::new() });
		};
		let limit = req.limit.unwrap_or(self.cfg.search.similarity_limit) as usize;
		let candidates = vectors::get_all_by_type(&self.db, SourceType::SessionSummary).await?;
		let ranked = ranking::rank(
			&embedded.vector,
			&embedded.model_identifier,
			&candidates,
			limit,
			Some(self.cfg.search.similarity_threshold),
		);
		// The project filter runs after ranking; filtering the candidate set
		// first would under-count candidates near the threshold.
		let results = self.session_matches(&ranked, req.project_id).await?;

		Ok(ConceptSearchResponse { results })
	}

	/// A cheap reachability probe for the UI to decide whether to offer
	/// concept search at all. Not a promise: `embed` can still fail, and
	/// every caller of `embed` handles that on its own.
	pub async fn search_availability(&self) -> SearchAvailability {
		let available =
			self.providers.embedding.is_available(&self.cfg.providers.embedding).await;

		SearchAvailability { available }
	}
}
