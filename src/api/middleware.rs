//! API-key gate, request tracking, and CORS.

// std
use std::time::Instant;
// crates.io
use axum::{
	extract::{MatchedPath, Request, State},
	http::{HeaderName, HeaderValue, Method},
	middleware::Next,
	response::{IntoResponse, Response},
};
use sha2::{Digest, Sha256};
use tower_http::cors::{AllowOrigin, CorsLayer};
use uuid::Uuid;
// self
use crate::{
	_prelude::*,
	api::{ApiError, AppState},
	auth::TokenSecret,
};

/// Header carrying the shared API key.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");
/// Header carrying the request id.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Compares presented API keys against the configured one by SHA-256 digest.
#[derive(Clone, Default)]
pub struct ApiKeyGate {
	expected: Option<[u8; 32]>,
}
impl ApiKeyGate {
	/// Builds a gate; `None` (or a blank key) leaves the API open.
	pub fn new(api_key: Option<&TokenSecret>) -> Self {
		Self { expected: api_key.filter(|key| !key.is_blank()).map(|key| digest(key.expose().as_bytes())) }
	}

	/// Returns `true` when no key is configured.
	pub fn is_open(&self) -> bool {
		self.expected.is_none()
	}

	/// Returns `true` when `presented` matches the configured key.
	pub fn allows(&self, presented: Option<&HeaderValue>) -> bool {
		let Some(expected) = &self.expected else {
			return true;
		};
		let Some(presented) = presented else {
			return false;
		};
		let actual = digest(presented.as_bytes());

		expected.iter().zip(actual.iter()).fold(0_u8, |acc, (a, b)| acc | (a ^ b)) == 0
	}
}
impl Debug for ApiKeyGate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiKeyGate").field("open", &self.is_open()).finish()
	}
}

fn digest(bytes: &[u8]) -> [u8; 32] {
	Sha256::digest(bytes).into()
}

pub(crate) async fn require_api_key(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	if state.api_key.allows(request.headers().get(API_KEY_HEADER)) {
		next.run(request).await
	} else {
		ApiError::unauthorized().into_response()
	}
}

/// Echoes (or assigns) `X-Request-Id`, records route metrics, and logs one line per request.
pub(crate) async fn track_request(
	State(state): State<AppState>,
	request: Request,
	next: Next,
) -> Response {
	let request_id = request
		.headers()
		.get(REQUEST_ID_HEADER)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(str::to_owned)
		.unwrap_or_else(|| Uuid::new_v4().to_string());
	let method = request.method().clone();
	let path = request.uri().path().to_owned();
	let route = request
		.extensions()
		.get::<MatchedPath>()
		.map(|matched| matched.as_str().to_owned())
		.unwrap_or_else(|| "unmatched".to_owned());
	let started = Instant::now();
	let mut response = next.run(request).await;
	let latency = started.elapsed();
	let status = response.status().as_u16();

	if let Ok(value) = HeaderValue::from_str(&request_id) {
		response.headers_mut().insert(REQUEST_ID_HEADER, value);
	}

	state.metrics.record_request(&route, status, latency);

	tracing::info!(
		request_id = %request_id,
		method = %method,
		path = %path,
		status,
		latency_ms = latency.as_secs_f64() * 1_000.0,
		"request"
	);

	response
}

/// CORS policy: any origin for `*`, otherwise the configured list.
pub fn cors(origins: &[String]) -> CorsLayer {
	let allow_origin = if origins.iter().any(|origin| origin == "*") {
		AllowOrigin::any()
	} else {
		let origins = origins
			.iter()
			.filter_map(|origin| HeaderValue::from_str(origin).ok())
			.collect::<Vec<_>>();

		if origins.is_empty() { AllowOrigin::any() } else { AllowOrigin::list(origins) }
	};

	CorsLayer::new()
		.allow_origin(allow_origin)
		.allow_methods([Method::GET, Method::POST, Method::OPTIONS])
		.allow_headers([
			HeaderName::from_static("content-type"),
			HeaderName::from_static("authorization"),
			API_KEY_HEADER,
			REQUEST_ID_HEADER,
		])
		.expose_headers([REQUEST_ID_HEADER])
}
