//! Cross-session synthesis: select relevant sessions, assemble a bounded
//! prompt from their summaries and key exchanges, and ask a provider for a
//! cited answer.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mosaic_config::LlmProviderConfig;
use mosaic_domain::snapshot;
use mosaic_storage::{
	queries,
	vectors::{self, SourceType},
};

use crate::{MosaicService, ServiceError, ServiceResult, ranking, round_score, validate_query};

/// Returned verbatim when nothing in the archive qualifies. Not an error.
pub const NO_MATCH_ANSWER: &str = "\
No archived sessions were related enough to this question to synthesize an \
answer. Try rephrasing the question, or name the sessions to draw from.";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SynthesisRequest {
	pub query: String,
	pub session_ids: Option<Vec<Uuid>>,
	pub project_id: Option<Uuid>,
	pub max_sessions: Option<u32>,
	pub threshold: Option<f32>,
	pub provider: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SynthesisSource {
	pub session_id: Uuid,
	pub title: String,
	pub score: f32,
	pub has_unresolved: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SynthesisResponse {
	pub answer: String,
	pub sources: Vec<SynthesisSource>,
	pub sessions_analyzed: u32,
}

struct SessionSnapshot {
	session_id: Uuid,
	title: String,
	score: f32,
	orientation: String,
	unresolved: String,
	exchanges: String,
}

impl MosaicService {
	pub async fn synthesize(&self, req: SynthesisRequest) -> ServiceResult<SynthesisResponse> {
		let query = validate_query(&req.query)?.to_string();
		let selected: Vec<(Uuid, f32)> = match req.session_ids.as_deref() {
			// Explicit ids bypass ranking entirely; their relevance is
			// asserted by the caller.
			Some(ids) if !ids.is_empty() => ids.iter().map(|id| (*id, 1.0)).collect(),
			_ => self.select_by_relevance(&query, &req).await?,
		};

		if selected.is_empty() {
			return Ok(no_match_response());
		}

		let snapshots = self.build_snapshots(&selected).await?;

		if snapshots.is_empty() {
			return Ok(no_match_response());
		}

		let prompt = build_prompt(&query, &snapshots);
		let answer = self.generate_with_fallback(&prompt, req.provider.as_deref()).await?;
		// Sources carry identity and signal, never transcript excerpts; the
		// full detail is one navigation away.
		let sources: Vec<SynthesisSource> = snapshots
			.iter()
			.map(|snapshot| SynthesisSource {
				session_id: snapshot.session_id,
				title: snapshot.title.clone(),
				score: round_score(snapshot.score),
				has_unresolved: !snapshot.unresolved.trim().is_empty(),
			})
			.collect();

		Ok(SynthesisResponse {
			answer,
			sessions_analyzed: sources.len() as u32,
			sources,
		})
	}

	async fn select_by_relevance(
		&self,
		query: &str,
		req: &SynthesisRequest,
	) -> ServiceResult<Vec<(Uuid, f32)>> {
		let Some(embedded) =
			self.providers.embedding.embed(&self.cfg.providers.embedding, query).await
		else {
			// Without a query vector there is nothing to rank; the no-match
			// answer covers this the same way it covers an empty archive.
			return Ok(Vec::new());
		};
		let candidates = vectors::get_all_by_type(&self.db, SourceType::SessionSummary).await?;
		let threshold = req.threshold.unwrap_or(self.cfg.synthesis.threshold);
		let max_sessions = req.max_sessions.unwrap_or(self.cfg.synthesis.max_sessions) as usize;
		let ranked = ranking::rank(
			&embedded.vector,
			&embedded.model_identifier,
			&candidates,
			max_sessions,
			Some(threshold),
		);
		let mut selected: Vec<(Uuid, f32)> =
			ranked.into_iter().map(|entry| (entry.source_id, entry.score)).collect();

		if let Some(project_id) = req.project_id {
			// Post-hoc on purpose: filtering the candidate set before
			// ranking would under-count candidates near the threshold.
			let session_ids: Vec<Uuid> = selected.iter().map(|(id, _)| *id).collect();
			let sessions = queries::list_sessions_by_ids(&self.db, &session_ids).await?;
			let in_project: HashSet<Uuid> = sessions
				.iter()
				.filter(|session| session.project_id == Some(project_id))
				.map(|session| session.session_id)
				.collect();

			selected.retain(|(id, _)| in_project.contains(id));
		}

		Ok(selected)
	}

	async fn build_snapshots(
		&self,
		selected: &[(Uuid, f32)],
	) -> ServiceResult<Vec<SessionSnapshot>> {
		let mut snapshots = Vec::with_capacity(selected.len());

		for (session_id, score) in selected {
			let Some(session) = queries::get_session(&self.db, *session_id).await? else {
				tracing::debug!(session_id = %session_id, "Session missing during synthesis. Skipping.");

				continue;
			};
			let metadata = queries::get_session_metadata(&self.db, *session_id).await?;
			let messages = queries::list_first_messages(
				&self.db,
				*session_id,
				snapshot::MAX_EXCHANGES as i64,
			)
			.await?;
			let exchanges = snapshot::bounded_exchanges(
				messages.iter().map(|message| (message.role.as_str(), message.content.as_str())),
			);
			let (orientation, unresolved) = match metadata {
				Some(metadata) => (metadata.orientation_blurb, metadata.unresolved_edge),
				None => (String::new(), String::new()),
			};

			snapshots.push(SessionSnapshot {
				session_id: *session_id,
				title: session.title,
				score: *score,
				orientation,
				unresolved,
				exchanges,
			});
		}

		Ok(snapshots)
	}

	async fn generate_with_fallback(
		&self,
		prompt: &str,
		preferred: Option<&str>,
	) -> ServiceResult<String> {
		let chain = provider_chain(&self.cfg.providers.synthesis, preferred)?;

		for cfg in chain {
			match self.providers.generation.synthesize(cfg, prompt).await {
				Ok(answer) => return Ok(answer),
				Err(err) => {
					tracing::warn!(
						provider = %cfg.provider_id,
						error = %err,
						"Synthesis provider failed. Trying next."
					);
				},
			}
		}

		Err(ServiceError::ProviderUnavailable {
			message: "every configured synthesis provider failed".to_string(),
		})
	}
}

/// The configured chain, with the requested provider moved to the front. The
/// rest keep their configured order and still serve as fallbacks.
fn provider_chain<'a>(
	providers: &'a [LlmProviderConfig],
	preferred: Option<&str>,
) -> ServiceResult<Vec<&'a LlmProviderConfig>> {
	let mut chain: Vec<&LlmProviderConfig> = providers.iter().collect();

	if let Some(preferred) = preferred {
		let Some(position) = chain.iter().position(|cfg| cfg.provider_id == preferred) else {
			return Err(ServiceError::InvalidRequest {
				message: format!("Unknown synthesis provider {preferred:?}."),
			});
		};
		let preferred = chain.remove(position);

		chain.insert(0, preferred);
	}

	Ok(chain)
}

fn no_match_response() -> SynthesisResponse {
	SynthesisResponse { answer: NO_MATCH_ANSWER.to_string(), sources: Vec::new(), sessions_analyzed: 0 }
}

fn build_prompt(query: &str, snapshots: &[SessionSnapshot]) -> String {
	let mut prompt = String::new();

	prompt.push_str(
		"You are answering a question by drawing on a reader's archived inquiry sessions.\n",
	);
	prompt.push_str(
		"Address the question directly. Synthesize across the sessions instead of summarizing \
		them one by one. Surface contradictions between sessions and how the thinking evolved. \
		Name the questions that remain unresolved. Attribute each claim to the session it came \
		from, by title.\n\n",
	);
	prompt.push_str("Question: ");
	prompt.push_str(query);
	prompt.push('\n');

	for snapshot in snapshots {
		let relevance = (snapshot.score * 100.0).round() as i32;

		prompt.push_str(&format!("\n### Session: {} (relevance {relevance}%)\n", snapshot.title));

		if !snapshot.orientation.is_empty() {
			prompt.push_str("Orientation: ");
			prompt.push_str(&snapshot.orientation);
			prompt.push('\n');
		}
		if !snapshot.unresolved.is_empty() {
			prompt.push_str("Unresolved edge: ");
			prompt.push_str(&snapshot.unresolved);
			prompt.push('\n');
		}
		if !snapshot.exchanges.is_empty() {
			prompt.push_str("Key exchanges:\n");
			prompt.push_str(&snapshot.exchanges);
			prompt.push('\n');
		}
	}

	prompt
}

#[cfg(test)]
mod tests {
	use serde_json::Map;

	use super::*;

	fn provider(id: &str) -> LlmProviderConfig {
		LlmProviderConfig {
			provider_id: id.to_string(),
			api_base: format!("https://{id}.example.test"),
			api_key: "key".to_string(),
			path: "/v1/chat/completions".to_string(),
			model: "model".to_string(),
			temperature: 0.5,
			timeout_ms: 1_000,
			default_headers: Map::new(),
		}
	}

	fn snapshot(title: &str, score: f32) -> SessionSnapshot {
		SessionSnapshot {
			session_id: Uuid::new_v4(),
			title: title.to_string(),
			score,
			orientation: "Where the session stood.".to_string(),
			unresolved: "What stayed open.".to_string(),
			exchanges: "user: opening question".to_string(),
		}
	}

	#[test]
	fn prompt_carries_headers_relevance_and_question() {
		let snapshots = vec![snapshot("Archive formats", 0.87), snapshot("Codec tradeoffs", 0.42)];
		let prompt = build_prompt("Which format should I use?", &snapshots);

		assert!(prompt.contains("Question: Which format should I use?"));
		assert!(prompt.contains("### Session: Archive formats (relevance 87%)"));
		assert!(prompt.contains("### Session: Codec tradeoffs (relevance 42%)"));
		assert!(prompt.contains("Orientation: Where the session stood."));
		assert!(prompt.contains("Unresolved edge: What stayed open."));
		assert!(prompt.contains("Key exchanges:\nuser: opening question"));
	}

	#[test]
	fn prompt_omits_empty_snapshot_sections() {
		let mut bare = snapshot("Bare", 1.0);

		bare.orientation = String::new();
		bare.unresolved = String::new();
		bare.exchanges = String::new();

		let prompt = build_prompt("anything", &[bare]);

		assert!(prompt.contains("### Session: Bare (relevance 100%)"));
		assert!(!prompt.contains("Orientation:"));
		assert!(!prompt.contains("Unresolved edge:"));
		assert!(!prompt.contains("Key exchanges:"));
	}

	#[test]
	fn provider_chain_defaults_to_configured_order() {
		let providers = vec![provider("primary"), provider("secondary"), provider("tertiary")];
		let chain = provider_chain(&providers, None).expect("Expected a chain.");
		let ids: Vec<&str> = chain.iter().map(|cfg| cfg.provider_id.as_str()).collect();

		assert_eq!(ids, vec!["primary", "secondary", "tertiary"]);
	}

	#[test]
	fn provider_chain_moves_the_requested_provider_first() {
		let providers = vec![provider("primary"), provider("secondary"), provider("tertiary")];
		let chain = provider_chain(&providers, Some("tertiary")).expect("Expected a chain.");
		let ids: Vec<&str> = chain.iter().map(|cfg| cfg.provider_id.as_str()).collect();

		assert_eq!(ids, vec!["tertiary", "primary", "secondary"]);
	}

	#[test]
	fn provider_chain_rejects_unknown_providers() {
		let providers = vec![provider("primary")];

		assert!(provider_chain(&providers, Some("nonexistent")).is_err());
	}

	#[test]
	fn no_match_response_is_empty_handed_but_not_an_error() {
		let response = no_match_response();

		assert_eq!(response.answer, NO_MATCH_ANSWER);
		assert!(response.sources.is_empty());
		assert_eq!(response.sessions_analyzed, 0);
	}
}
