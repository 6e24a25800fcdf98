//! Shared fixtures for the integration suites.

#![allow(dead_code)]

// std
use std::sync::Arc;
// crates.io
use axum::{body::Body, http::Request, response::Response};
use httpmock::MockServer;
use serde_json::Value;
use time::OffsetDateTime;
use tower::ServiceExt;
// self
use fantasy_gateway::{
	api::{self, AppState},
	auth::Credential,
	config::Settings,
	http::ReqwestHttpClient,
	reqwest,
	store::{CredentialStore, MemoryStore},
};

pub const API_KEY: &str = "test-api-key";
pub const CONSUMER_KEY: &str = "consumer-key";
pub const CONSUMER_SECRET: &str = "consumer-secret";

/// Settings pointing every Yahoo endpoint at `server`, plus `extra` overrides.
pub fn settings(server: &MockServer, extra: &[(&str, &str)]) -> Settings {
	let mut vars = vec![
		("YAHOO_AUTH_URL".to_owned(), server.url("/oauth2/request_auth")),
		("YAHOO_TOKEN_URL".to_owned(), server.url("/oauth2/get_token")),
		("YAHOO_API_BASE_URL".to_owned(), server.url("/fantasy/v2")),
		("YAHOO_CONSUMER_KEY".to_owned(), CONSUMER_KEY.to_owned()),
		("YAHOO_CONSUMER_SECRET".to_owned(), CONSUMER_SECRET.to_owned()),
		("API_KEY".to_owned(), API_KEY.to_owned()),
		("RATE_LIMIT_PER_MIN".to_owned(), "0".to_owned()),
	];

	vars.extend(extra.iter().map(|(key, value)| ((*key).to_owned(), (*value).to_owned())));

	Settings::from_vars(vars).expect("Test settings should load.")
}

/// Credential issued `age_secs` ago that lives for `expires_in` seconds.
pub fn credential(access: &str, refresh: &str, age_secs: i64, expires_in: i64) -> Credential {
	let issued = OffsetDateTime::now_utc().unix_timestamp() - age_secs;

	Credential {
		access_token: Some(access.into()),
		refresh_token: Some(refresh.into()),
		token_type: Some("bearer".to_owned()),
		token_time: Some(issued as f64),
		expires_in: Some(expires_in),
		guid: Some("GUID123".to_owned()),
		..Default::default()
	}
}

/// HTTP client that trusts the self-signed certificates `httpmock` serves over HTTPS.
pub fn test_http_client() -> ReqwestHttpClient {
	let client = reqwest::Client::builder()
		.danger_accept_invalid_certs(true)
		.danger_accept_invalid_hostnames(true)
		.build()
		.expect("Insecure test client should build.");

	ReqwestHttpClient::with_client(client)
}

/// State backed by `store`, talking to the mock server through [`test_http_client`].
pub fn state_with_store(settings: Settings, store: Arc<dyn CredentialStore>) -> AppState {
	AppState::with_parts(settings, store, test_http_client())
		.expect("Application state should build.")
}

/// State seeded with a credential that stays valid for an hour.
pub fn authenticated_state(settings: Settings) -> AppState {
	let store = Arc::new(MemoryStore::with_credential(credential("access-live", "refresh-live", 0, 3_600)));

	state_with_store(settings, store)
}

/// Sends `request` through a fresh router built from `state`.
pub async fn send(state: &AppState, request: Request<Body>) -> Response {
	api::router(state.clone())
		.oneshot(request)
		.await
		.expect("Router should always produce a response.")
}

/// Builds a `GET` request carrying the test API key.
pub fn get(uri: &str) -> Request<Body> {
	Request::get(uri)
		.header("x-api-key", API_KEY)
		.body(Body::empty())
		.expect("GET request should build.")
}

/// Collects a response body as JSON.
pub async fn json(response: Response) -> Value {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	serde_json::from_slice(&bytes).expect("Response body should be JSON.")
}

/// Collects a response body as text.
pub async fn text(response: Response) -> String {
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Response body should be readable.");

	String::from_utf8(bytes.to_vec()).expect("Response body should be UTF-8.")
}
