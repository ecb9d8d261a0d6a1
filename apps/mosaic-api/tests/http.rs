use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
};
use tower::util::ServiceExt;

use mosaic_api::{routes, state::AppState};
use mosaic_config::Config;
use mosaic_testkit::TestDatabase;

fn test_config(dsn: &str) -> Config {
	// Provider endpoints point at a closed local port so every embedding
	// attempt fails fast; the routes under test must degrade, not hang.
	let raw = format!(
		r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "info"

[storage.postgres]
dsn = "{dsn}"
pool_max_conns = 2

[providers.embedding]
backend = "local"

[providers.embedding.hosted]
api_base = "http://127.0.0.1:9"
path = "/v1/embeddings"
model = "unused"
dimensions = 4
timeout_ms = 200

[providers.embedding.local]
api_base = "http://127.0.0.1:9"
path = "/api/embeddings"
model = "unreachable"
dimensions = 4
timeout_ms = 200

[providers.metadata]
provider_id = "unreachable"
api_base = "http://127.0.0.1:9"
path = "/v1/chat/completions"
model = "unreachable"
temperature = 0.0
timeout_ms = 200

[[providers.synthesis]]
provider_id = "unreachable"
api_base = "http://127.0.0.1:9"
path = "/v1/chat/completions"
model = "unreachable"
temperature = 0.0
timeout_ms = 200
"#
	);
	let cfg: Config = toml::from_str(&raw).expect("Failed to parse test config.");

	mosaic_config::validate(&cfg).expect("Expected the test config to validate.");

	cfg
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MOSAIC_PG_DSN to run."]
async fn health_answers_and_degraded_routes_stay_polite() {
	let Some(base_dsn) = mosaic_testkit::env_dsn() else {
		eprintln!("Skipping HTTP test; set MOSAIC_PG_DSN to run it.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let state =
		AppState::new(test_config(test_db.dsn())).await.expect("Failed to build app state.");
	let app = routes::router(state);

	let health = app
		.clone()
		.oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
		.await
		.expect("Health request failed.");

	assert_eq!(health.status(), StatusCode::OK);

	// Concept search with no reachable embedding backend is an empty result
	// set, not an error.
	let concept = app
		.clone()
		.oneshot(
			Request::builder()
				.uri("/v1/search/concept?q=anything+related")
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("Concept request failed.");

	assert_eq!(concept.status(), StatusCode::OK);

	let bytes = body::to_bytes(concept.into_body(), usize::MAX)
		.await
		.expect("Failed to read concept body.");
	let json: serde_json::Value =
		serde_json::from_slice(&bytes).expect("Concept body is not JSON.");

	assert_eq!(json["results"], serde_json::json!([]));

	// With nothing listening on the backend port, the availability probe
	// reports false instead of failing.
	let availability = app
		.clone()
		.oneshot(
			Request::builder()
				.uri("/v1/search/availability")
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("Availability request failed.");

	assert_eq!(availability.status(), StatusCode::OK);

	let bytes = body::to_bytes(availability.into_body(), usize::MAX)
		.await
		.expect("Failed to read availability body.");
	let json: serde_json::Value =
		serde_json::from_slice(&bytes).expect("Availability body is not JSON.");

	assert_eq!(json["available"], serde_json::json!(false));

	// A too-short query is rejected before any provider call.
	let rejected = app
		.oneshot(
			Request::builder()
				.uri("/v1/search/concept?q=ab")
				.body(Body::empty())
				.expect("request"),
		)
		.await
		.expect("Rejection request failed.");

	assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set MOSAIC_PG_DSN to run."]
async fn synthesize_rejects_malformed_input() {
	let Some(base_dsn) = mosaic_testkit::env_dsn() else {
		eprintln!("Skipping synthesize HTTP test; set MOSAIC_PG_DSN to run it.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let state =
		AppState::new(test_config(test_db.dsn())).await.expect("Failed to build app state.");
	let app = routes::router(state);

	let response = app
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/synthesize")
				.header("content-type", "application/json")
				.body(Body::from(r#"{"query": ""}"#))
				.expect("request"),
		)
		.await
		.expect("Synthesize request failed.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
