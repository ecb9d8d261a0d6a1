pub mod concept;
pub mod documents;
pub mod ranking;
pub mod similarity;
pub mod synthesis;
pub mod time_serde;

mod error;

pub use error::Error as ServiceError;

use std::{future::Future, pin::Pin, sync::Arc};

use mosaic_config::{Config, Embedding as EmbeddingConfig, LlmProviderConfig};
use mosaic_providers::{
	gateway::{self, EmbeddedText},
	generation::{self, SessionAnnotations},
};
use mosaic_storage::db::Db;

pub use concept::{ConceptSearchRequest, ConceptSearchResponse, SearchAvailability};
pub use documents::{IndexDocumentRequest, IndexDocumentResponse};
pub use similarity::{
	DocumentMatch, RelatedDocumentsResponse, SessionMatch, SimilaritySearchRequest,
	SimilaritySearchResponse,
};
pub use synthesis::{SynthesisRequest, SynthesisResponse, SynthesisSource};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Queries shorter than this never reach a provider.
pub const MIN_QUERY_CHARS: usize = 3;

pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingConfig,
		text: &'a str,
	) -> BoxFuture<'a, Option<EmbeddedText>>;

	fn is_available<'a>(&'a self, cfg: &'a EmbeddingConfig) -> BoxFuture<'a, bool>;
}

pub trait GenerationProvider
where
	Self: Send + Sync,
{
	fn annotate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		transcript: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<SessionAnnotations>>;

	fn title<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		opening: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;

	fn synthesize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
	pub generation: Arc<dyn GenerationProvider>,
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingConfig,
		text: &'a str,
	) -> BoxFuture<'a, Option<EmbeddedText>> {
		Box::pin(gateway::embed(cfg, text))
	}

	fn is_available<'a>(&'a self, cfg: &'a EmbeddingConfig) -> BoxFuture<'a, bool> {
		Box::pin(gateway::is_available(cfg))
	}
}

impl GenerationProvider for DefaultProviders {
	fn annotate<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		transcript: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<SessionAnnotations>> {
		Box::pin(generation::generate_annotations(cfg, transcript))
	}

	fn title<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		opening: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate_title(cfg, opening))
	}

	fn synthesize<'a>(
		&'a self,
		cfg: &'a LlmProviderConfig,
		prompt: &'a str,
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(generation::generate_synthesis(cfg, prompt))
	}
}

impl Providers {
	pub fn new(
		embedding: Arc<dyn EmbeddingProvider>,
		generation: Arc<dyn GenerationProvider>,
	) -> Self {
		Self { embedding, generation }
	}
}

impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self { embedding: provider.clone(), generation: provider }
	}
}

pub struct MosaicService {
	pub cfg: Config,
	pub db: Db,
	pub providers: Providers,
}
impl MosaicService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self { cfg, db, providers: Providers::default() }
	}

	pub fn with_providers(cfg: Config, db: Db, providers: Providers) -> Self {
		Self { cfg, db, providers }
	}
}

pub(crate) fn round_score(score: f32) -> f32 {
	(score * 100.0).round() / 100.0
}

pub(crate) fn validate_query(query: &str) -> ServiceResult<&str> {
	let trimmed = query.trim();

	if trimmed.is_empty() {
		return Err(ServiceError::InvalidRequest {
			message: "Query must be non-empty.".to_string(),
		});
	}
	if trimmed.chars().count() < MIN_QUERY_CHARS {
		return Err(ServiceError::InvalidRequest {
			message: format!("Query must be at least {MIN_QUERY_CHARS} characters."),
		});
	}

	Ok(trimmed)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn scores_round_to_two_decimals() {
		assert_eq!(round_score(0.876_543), 0.88);
		assert_eq!(round_score(-0.124_9), -0.12);
		assert_eq!(round_score(1.0), 1.0);
	}

	#[test]
	fn blank_and_tiny_queries_are_rejected() {
		assert!(validate_query("").is_err());
		assert!(validate_query("   \n").is_err());
		assert!(validate_query("ab").is_err());
		assert_eq!(validate_query("  abc  ").expect("Expected a valid query."), "abc");
	}
}
