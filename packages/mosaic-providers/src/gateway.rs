//! Ordered-fallback front over the embedding backends.
//!
//! Embedding is enrichment, never a hard dependency: a backend failure is
//! logged and the next backend in the order is tried, and only when the whole
//! order is exhausted does the gateway return `None`. Callers must handle
//! `None`; `is_available` is a UI hint, not a guarantee.

use mosaic_config::Embedding;

use crate::embedding;

#[derive(Clone, Debug)]
pub struct EmbeddedText {
	pub vector: Vec<f32>,
	pub dimension: u32,
	pub model_identifier: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Backend {
	Hosted,
	Local,
}

/// The fallback order for the configured primary. A hosted primary without a
/// credential cannot be called at all, so it drops out of the order and the
/// local backend serves alone.
pub fn backend_order(cfg: &Embedding) -> Vec<Backend> {
	match cfg.backend.as_str() {
		"hosted" =>
			if cfg.hosted.api_key.trim().is_empty() {
				vec![Backend::Local]
			} else {
				vec![Backend::Hosted, Backend::Local]
			},
		_ => vec![Backend::Local],
	}
}

pub async fn embed(cfg: &Embedding, text: &str) -> Option<EmbeddedText> {
	for backend in backend_order(cfg) {
		match attempt(cfg, backend, text).await {
			Ok(embedded) => return Some(embedded),
			Err(err) => {
				tracing::warn!(?backend, error = %err, "Embedding backend failed. Trying next.");
			},
		}
	}

	tracing::warn!("Every embedding backend failed. Proceeding without a vector.");

	None
}

pub async fn is_available(cfg: &Embedding) -> bool {
	match backend_order(cfg).first() {
		Some(Backend::Hosted) => embedding::probe(&cfg.hosted.api_base, cfg.probe_timeout_ms).await,
		Some(Backend::Local) => embedding::probe(&cfg.local.api_base, cfg.probe_timeout_ms).await,
		None => false,
	}
}

async fn attempt(cfg: &Embedding, backend: Backend, text: &str) -> color_eyre::Result<EmbeddedText> {
	match backend {
		Backend::Hosted => {
			let vector = embedding::embed_hosted(&cfg.hosted, text).await?;

			Ok(EmbeddedText {
				dimension: vector.len() as u32,
				vector,
				model_identifier: cfg.hosted.model.clone(),
			})
		},
		Backend::Local => {
			let vector = embedding::embed_local(&cfg.local, text).await?;

			Ok(EmbeddedText {
				dimension: vector.len() as u32,
				vector,
				model_identifier: cfg.local.model.clone(),
			})
		},
	}
}
