use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub chunking: Chunking,
	#[serde(default)]
	pub scheduler: Scheduler,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub synthesis: Synthesis,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: Embedding,
	pub metadata: LlmProviderConfig,
	/// Ordered fallback chain for synthesis calls. The first entry is the
	/// default provider.
	pub synthesis: Vec<LlmProviderConfig>,
}

#[derive(Debug, Deserialize)]
pub struct Embedding {
	/// Which backend is primary: "hosted" or "local". A hosted primary with
	/// no credential, or a hosted call that fails, falls through to the
	/// local backend.
	pub backend: String,
	/// Budget for the cheap reachability handshake, not for real calls.
	#[serde(default = "default_probe_timeout_ms")]
	pub probe_timeout_ms: u64,
	pub hosted: HostedEmbedding,
	pub local: LocalEmbedding,
}

#[derive(Debug, Deserialize)]
pub struct HostedEmbedding {
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LocalEmbedding {
	pub api_base: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LlmProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	#[serde(default)]
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Chunking {
	pub window_words: usize,
	pub overlap_words: usize,
	/// Documents under this word count become a single chunk.
	pub small_doc_words: usize,
}
impl Default for Chunking {
	fn default() -> Self {
		Self { window_words: 500, overlap_words: 75, small_doc_words: 600 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Scheduler {
	pub inactivity_minutes: i64,
	pub tick_interval_minutes: i64,
}
impl Default for Scheduler {
	fn default() -> Self {
		Self { inactivity_minutes: 60, tick_interval_minutes: 5 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub similarity_limit: u32,
	pub similarity_threshold: f32,
}
impl Default for Search {
	fn default() -> Self {
		Self { similarity_limit: 10, similarity_threshold: 0.3 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Synthesis {
	pub threshold: f32,
	pub max_sessions: u32,
}
impl Default for Synthesis {
	fn default() -> Self {
		Self { threshold: 0.3, max_sessions: 5 }
	}
}

fn default_probe_timeout_ms() -> u64 {
	500
}
