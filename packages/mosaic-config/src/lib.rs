mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chunking, Config, Embedding, HostedEmbedding, LlmProviderConfig, LocalEmbedding, Postgres,
	Providers, Scheduler, Search, Service, Storage, Synthesis,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.providers.embedding.backend.as_str(), "hosted" | "local") {
		return Err(Error::Validation {
			message: "providers.embedding.backend must be one of hosted or local.".to_string(),
		});
	}
	if cfg.providers.embedding.hosted.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.hosted.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.local.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.local.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.local.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "providers.embedding.local.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.providers.synthesis.is_empty() {
		return Err(Error::Validation {
			message: "providers.synthesis must list at least one provider.".to_string(),
		});
	}

	for (label, provider) in std::iter::once(("metadata", &cfg.providers.metadata))
		.chain(cfg.providers.synthesis.iter().map(|provider| ("synthesis", provider)))
	{
		if provider.provider_id.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} provider_id must be non-empty."),
			});
		}
		if provider.api_base.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_base must be non-empty."),
			});
		}
	}

	{
		let mut seen = std::collections::HashSet::new();

		for provider in &cfg.providers.synthesis {
			if !seen.insert(provider.provider_id.as_str()) {
				return Err(Error::Validation {
					message: format!(
						"providers.synthesis provider_id {:?} appears more than once.",
						provider.provider_id
					),
				});
			}
		}
	}

	if cfg.chunking.window_words == 0 {
		return Err(Error::Validation {
			message: "chunking.window_words must be greater than zero.".to_string(),
		});
	}
	if cfg.chunking.overlap_words >= cfg.chunking.window_words {
		return Err(Error::Validation {
			message: "chunking.overlap_words must be less than chunking.window_words.".to_string(),
		});
	}
	if cfg.chunking.small_doc_words < cfg.chunking.window_words {
		return Err(Error::Validation {
			message: "chunking.small_doc_words must be at least chunking.window_words.".to_string(),
		});
	}
	if cfg.scheduler.inactivity_minutes <= 0 {
		return Err(Error::Validation {
			message: "scheduler.inactivity_minutes must be greater than zero.".to_string(),
		});
	}
	if cfg.scheduler.tick_interval_minutes <= 0 {
		return Err(Error::Validation {
			message: "scheduler.tick_interval_minutes must be greater than zero.".to_string(),
		});
	}
	if cfg.search.similarity_limit == 0 {
		return Err(Error::Validation {
			message: "search.similarity_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.synthesis.max_sessions == 0 {
		return Err(Error::Validation {
			message: "synthesis.max_sessions must be greater than zero.".to_string(),
		});
	}

	for (label, threshold) in [
		("search.similarity_threshold", cfg.search.similarity_threshold),
		("synthesis.threshold", cfg.synthesis.threshold),
	] {
		if !threshold.is_finite() {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number."),
			});
		}
		if !(-1.0..=1.0).contains(&threshold) {
			return Err(Error::Validation {
				message: format!("{label} must be in the range -1.0 to 1.0."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	// Base URLs and paths are concatenated verbatim when building request
	// URLs, so a trailing slash here would produce a double slash there.
	trim_trailing_slash(&mut cfg.providers.embedding.hosted.api_base);
	trim_trailing_slash(&mut cfg.providers.embedding.local.api_base);
	trim_trailing_slash(&mut cfg.providers.metadata.api_base);

	for provider in &mut cfg.providers.synthesis {
		trim_trailing_slash(&mut provider.api_base);
	}
}

fn trim_trailing_slash(url: &mut String) {
	while url.ends_with('/') {
		url.pop();
	}
}
