//! JSON error bodies and the mapping from [`Error`] to HTTP status codes.

// crates.io
use axum::{
	Json,
	http::{HeaderValue, StatusCode, header::RETRY_AFTER},
	response::{IntoResponse, Response},
};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransientError, UpstreamError},
};

const REAUTH_HINT: &str = "Re-authorize via /v1/auth/url and /v1/auth/token.";

/// Body of every non-2xx JSON response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Stable machine-readable code.
	pub code: String,
	/// Human-readable message.
	pub message: String,
	/// Structured details such as per-field validation failures.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<Value>,
}

/// An HTTP error response.
#[derive(Clone, Debug)]
pub struct ApiError {
	/// Response status.
	pub status: StatusCode,
	/// Response body.
	pub body: ErrorBody,
	/// Seconds to advertise in `Retry-After`.
	pub retry_after: Option<u64>,
}
impl ApiError {
	/// Creates an error with no details.
	pub fn new(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
		Self {
			status,
			body: ErrorBody { code: code.to_owned(), message: message.into(), details: None },
			retry_after: None,
		}
	}

	/// 401 for a missing or wrong `X-API-Key`.
	pub fn unauthorized() -> Self {
		Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Missing or invalid API key")
	}

	/// 429 raised by the rate limiter.
	pub fn rate_limited(retry_after: StdDuration) -> Self {
		Self::new(StatusCode::TOO_MANY_REQUESTS, "rate_limited", "Too many requests")
			.with_retry_after(retry_after)
	}

	/// 422 listing each failed field.
	pub fn validation<'a, I>(failures: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, String)>,
	{
		let details = failures
			.into_iter()
			.map(|(field, reason)| json!({ "field": field, "reason": reason }))
			.collect::<Vec<_>>();

		Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", "Validation failed")
			.with_details(Value::Array(details))
	}

	/// Attaches structured details.
	pub fn with_details(mut self, details: Value) -> Self {
		self.body.details = Some(details);

		self
	}

	/// Attaches a `Retry-After` hint, rounded up to whole seconds.
	pub fn with_retry_after(mut self, retry_after: StdDuration) -> Self {
		let seconds = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);

		self.retry_after = Some(seconds.max(1));

		self
	}
}
impl From<Error> for ApiError {
	fn from(error: Error) -> Self {
		match error {
			Error::Validation { field, reason } => Self::validation([(field, reason)]),
			Error::NotAuthenticated { reason } => Self::new(
				StatusCode::UNAUTHORIZED,
				"not_authenticated",
				format!("Not authenticated with Yahoo: {reason}."),
			),
			Error::InvalidGrant { reason } => Self::new(
				StatusCode::UNAUTHORIZED,
				"reauthentication_required",
				format!("Yahoo rejected the stored grant ({reason}). {REAUTH_HINT}"),
			),
			Error::InvalidClient { reason } => Self::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"invalid_client",
				format!("Yahoo rejected the consumer credentials: {reason}."),
			),
			Error::InsufficientScope { reason } => Self::new(
				StatusCode::FORBIDDEN,
				"insufficient_scope",
				format!("Token lacks the required scopes: {reason}."),
			),
			Error::Config(ConfigError::MissingConsumerCredentials) => Self::new(
				StatusCode::INTERNAL_SERVER_ERROR,
				"missing_consumer_credentials",
				"Yahoo consumer key/secret not configured",
			),
			Error::Config(e) => {
				tracing::error!(error = %e, "configuration error while serving request");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "configuration_error", e.to_string())
			},
			Error::Storage(e) => {
				tracing::error!(error = %e, "credential store failure");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, "credential_store_error", e.to_string())
			},
			Error::Transient(TransientError::IncompleteTokenResponse { field }) => Self::new(
				StatusCode::BAD_GATEWAY,
				"oauth_incomplete_response",
				format!("Yahoo did not provide required OAuth field `{field}`"),
			),
			Error::Transient(TransientError::TokenEndpoint { message, retry_after, .. }) => {
				let error = Self::new(
					StatusCode::BAD_GATEWAY,
					"oauth_unavailable",
					format!("Yahoo OAuth service returned an unexpected response: {message}"),
				);

				match retry_after.and_then(|hint| StdDuration::try_from(hint).ok()) {
					Some(hint) => error.with_retry_after(hint),
					None => error,
				}
			},
			Error::Transient(e) =>
				Self::new(StatusCode::BAD_GATEWAY, "oauth_invalid_response", e.to_string()),
			Error::Transport(e) => {
				tracing::warn!(error = %e, "token endpoint unreachable");

				Self::new(
					StatusCode::BAD_GATEWAY,
					"oauth_unreachable",
					"Failed to reach Yahoo OAuth service",
				)
			},
			Error::Upstream(e) => Self::from(e),
		}
	}
}
impl From<UpstreamError> for ApiError {
	fn from(error: UpstreamError) -> Self {
		match error {
			UpstreamError::Status { status, message } => {
				let (status, code, message) = match status {
					401 => (
						StatusCode::UNAUTHORIZED,
						"upstream_unauthorized",
						format!("{message} {REAUTH_HINT}"),
					),
					403 => (StatusCode::FORBIDDEN, "upstream_forbidden", message),
					404 => (StatusCode::NOT_FOUND, "not_found", message),
					400 | 422 => (StatusCode::UNPROCESSABLE_ENTITY, "upstream_rejected", message),
					429 => (StatusCode::TOO_MANY_REQUESTS, "upstream_rate_limited", message),
					_ => (StatusCode::BAD_GATEWAY, "upstream_error", message),
				};

				Self::new(status, code, message)
			},
			UpstreamError::Parse { resource, source } => {
				tracing::warn!(resource = %resource, error = %source, "fantasy API returned invalid JSON");

				Self::new(
					StatusCode::BAD_GATEWAY,
					"upstream_invalid_response",
					"Yahoo returned an invalid response",
				)
			},
			UpstreamError::Timeout =>
				Self::new(StatusCode::GATEWAY_TIMEOUT, "upstream_timeout", "Yahoo did not respond in time"),
			UpstreamError::Unreachable { source } => {
				tracing::warn!(error = %source, "fantasy API unreachable");

				Self::new(StatusCode::BAD_GATEWAY, "upstream_unreachable", "Failed to reach Yahoo")
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let mut response = (self.status, Json(self.body)).into_response();

		if let Some(seconds) = self.retry_after {
			response.headers_mut().insert(RETRY_AFTER, HeaderValue::from(seconds));
		}

		response
	}
}
