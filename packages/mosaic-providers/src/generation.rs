use std::time::Duration;

use color_eyre::{Result, eyre};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use mosaic_config::LlmProviderConfig;

/// The three-field session summary: a blurb for re-entry, the question the
/// session left open, and where the conversation last changed direction.
#[derive(Clone, Debug, Deserialize)]
pub struct SessionAnnotations {
	pub orientation_blurb: String,
	pub unresolved_edge: String,
	pub last_pivot: String,
}

const ANNOTATION_INSTRUCTIONS: &str = "\
You summarize one archived inquiry conversation. Reply with a JSON object \
holding exactly three string fields: orientation_blurb (two sentences that \
re-orient the reader), unresolved_edge (the sharpest question the \
conversation left open, or an empty string), and last_pivot (where the \
conversation most recently changed direction). No prose outside the JSON.";

const TITLE_INSTRUCTIONS: &str = "\
Name this conversation in at most six words. Reply with the title only.";

pub async fn generate_annotations(
	cfg: &LlmProviderConfig,
	transcript: &str,
) -> Result<SessionAnnotations> {
	let messages = [
		serde_json::json!({ "role": "system", "content": ANNOTATION_INSTRUCTIONS }),
		serde_json::json!({ "role": "user", "content": transcript }),
	];

	for _ in 0..3 {
		let json = chat_completion(cfg, &messages).await?;

		if let Ok(parsed) = parse_annotations(json) {
			return Ok(parsed);
		}
	}

	Err(eyre::eyre!("Annotation response is not valid JSON."))
}

pub async fn generate_title(cfg: &LlmProviderConfig, opening: &str) -> Result<String> {
	let messages = [
		serde_json::json!({ "role": "system", "content": TITLE_INSTRUCTIONS }),
		serde_json::json!({ "role": "user", "content": opening }),
	];
	let json = chat_completion(cfg, &messages).await?;
	let title = content_text(&json)
		.ok_or_else(|| eyre::eyre!("Title response is missing content."))?
		.trim()
		.trim_matches('"')
		.to_string();

	if title.is_empty() {
		return Err(eyre::eyre!("Title response is empty."));
	}

	Ok(title)
}

pub async fn generate_synthesis(cfg: &LlmProviderConfig, prompt: &str) -> Result<String> {
	let messages = [serde_json::json!({ "role": "user", "content": prompt })];
	let json = chat_completion(cfg, &messages).await?;
	let answer = content_text(&json)
		.ok_or_else(|| eyre::eyre!("Synthesis response is missing content."))?
		.trim()
		.to_string();

	if answer.is_empty() {
		return Err(eyre::eyre!("Synthesis response is empty."));
	}

	Ok(answer)
}

async fn chat_completion(cfg: &LlmProviderConfig, messages: &[Value]) -> Result<Value> {
	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"temperature": cfg.temperature,
		"messages": messages,
	});
	let res = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?;

	Ok(res.error_for_status()?.json().await?)
}

fn content_text(json: &Value) -> Option<&str> {
	json.get("choices")
		.and_then(|v| v.as_array())
		.and_then(|arr| arr.first())
		.and_then(|choice| choice.get("message"))
		.and_then(|msg| msg.get("content"))
		.and_then(|c| c.as_str())
}

fn parse_annotations(json: Value) -> Result<SessionAnnotations> {
	if let Some(content) = content_text(&json) {
		let parsed: SessionAnnotations = serde_json::from_str(content)
			.map_err(|_| eyre::eyre!("Annotation content is not valid JSON."))?;

		return Ok(parsed);
	}

	// Some local servers return the object directly instead of wrapping it
	// in a chat choice.
	serde_json::from_value(json)
		.map_err(|_| eyre::eyre!("Annotation response is missing JSON content."))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_annotations_from_choice_content() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"orientation_blurb\": \"A map of the debate.\", \"unresolved_edge\": \"Which codec wins?\", \"last_pivot\": \"Moved from codecs to containers.\"}" } }
			]
		});
		let parsed = parse_annotations(json).expect("parse failed");

		assert_eq!(parsed.orientation_blurb, "A map of the debate.");
		assert_eq!(parsed.unresolved_edge, "Which codec wins?");
		assert_eq!(parsed.last_pivot, "Moved from codecs to containers.");
	}

	#[test]
	fn parses_annotations_from_a_bare_object() {
		let json = serde_json::json!({
			"orientation_blurb": "Short.",
			"unresolved_edge": "",
			"last_pivot": "None yet."
		});
		let parsed = parse_annotations(json).expect("parse failed");

		assert!(parsed.unresolved_edge.is_empty());
	}

	#[test]
	fn rejects_annotations_with_missing_fields() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "{\"orientation_blurb\": \"Only one field.\"}" } }
			]
		});

		assert!(parse_annotations(json).is_err());
	}

	#[test]
	fn reads_synthesis_content_from_the_first_choice() {
		let json = serde_json::json!({
			"choices": [
				{ "message": { "content": "An answer." } },
				{ "message": { "content": "Ignored." } }
			]
		});

		assert_eq!(content_text(&json), Some("An answer."));
	}
}
