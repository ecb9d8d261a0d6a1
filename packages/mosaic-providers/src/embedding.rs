use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde_json::Value;

use mosaic_config::{HostedEmbedding, LocalEmbedding};

pub async fn embed_hosted(cfg: &HostedEmbedding, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": [text],
		"dimensions": cfg.dimensions,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_hosted_response(json)
}

pub async fn embed_local(cfg: &LocalEmbedding, text: &str) -> Result<Vec<f32>> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({ "model": cfg.model, "prompt": text });
	let res = client.post(url).json(&body).send().await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_local_response(json)
}

/// Cheap reachability handshake. Any HTTP response proves the host is up;
/// it says nothing about whether an `embed` call will succeed.
pub async fn probe(api_base: &str, timeout_ms: u64) -> bool {
	let Ok(client) = Client::builder().timeout(Duration::from_millis(timeout_ms)).build() else {
		return false;
	};

	client.get(api_base).send().await.is_ok()
}

fn parse_hosted_response(json: Value) -> Result<Vec<f32>> {
	let data = json
		.get("data")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing data array."))?;
	let first = data.first().ok_or_else(|| eyre::eyre!("Embedding response data is empty."))?;
	let values = first
		.get("embedding")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding item missing embedding array."))?;

	collect_vector(values)
}

fn parse_local_response(json: Value) -> Result<Vec<f32>> {
	let values = json
		.get("embedding")
		.and_then(|v| v.as_array())
		.ok_or_else(|| eyre::eyre!("Embedding response is missing embedding array."))?;

	collect_vector(values)
}

fn collect_vector(values: &[Value]) -> Result<Vec<f32>> {
	let mut vec = Vec::with_capacity(values.len());

	for value in values {
		let number =
			value.as_f64().ok_or_else(|| eyre::eyre!("Embedding value must be numeric."))?;

		vec.push(number as f32);
	}

	if vec.is_empty() {
		return Err(eyre::eyre!("Embedding vector is empty."));
	}

	Ok(vec)
}
