//! Gateway-level error types shared across flows, stores, and upstream calls.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Credential storage failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Temporary token endpoint failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS) while calling the token endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Fantasy API call failed.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),

	/// Caller input failed validation.
	#[error("Request validation failed: {reason}.")]
	Validation {
		/// Offending field.
		field: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// No usable tokens are stored; the operator must complete the authorization flow.
	#[error("Not authenticated with Yahoo: {reason}.")]
	NotAuthenticated {
		/// Why the stored credential cannot be used.
		reason: String,
	},
	/// Requested scopes exceed what was granted.
	#[error("Token lacks the required scopes: {reason}.")]
	InsufficientScope {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
	/// Provider rejected the grant (e.g., bad code or refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or consumer credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or gateway-supplied reason string.
		reason: String,
	},
}
impl Error {
	/// Builds a [`Error::Validation`] for the provided field.
	pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
		Self::Validation { field, reason: reason.into() }
	}
}

/// Configuration and validation failures raised at startup or while preparing requests.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Descriptor(#[from] crate::provider::ProviderDescriptorError),
	/// Neither the environment nor the credential file supplies consumer credentials.
	#[error("Yahoo consumer key/secret not configured.")]
	MissingConsumerCredentials,
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Environment variable could not be interpreted.
	#[error("Setting `{key}` is invalid: {reason}.")]
	InvalidSetting {
		/// Environment variable name.
		key: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// A `FAVORITE_TEAMS` entry could not be parsed.
	#[error("Favorite entry `{entry}` is invalid: {reason}.")]
	InvalidFavorite {
		/// Raw entry text.
		entry: String,
		/// Human-readable reason.
		reason: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Provider returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or gateway-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint succeeded but omitted a field the gateway relies on.
	#[error("Token endpoint response is missing `{field}`.")]
	IncompleteTokenResponse {
		/// Missing field name.
		field: &'static str,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures raised while calling the Fantasy Sports REST API.
#[derive(Debug, ThisError)]
pub enum UpstreamError {
	/// Upstream answered with a non-success status.
	#[error("Fantasy API returned {status}: {message}.")]
	Status {
		/// HTTP status code returned by the Fantasy API.
		status: u16,
		/// Upstream error description or a body preview.
		message: String,
	},
	/// Upstream response body was not the JSON the gateway expects.
	#[error("Fantasy API returned an unreadable payload for `{resource}`.")]
	Parse {
		/// Resource path that produced the payload.
		resource: String,
		/// Underlying JSON failure.
		#[source]
		source: serde_json::Error,
	},
	/// Upstream did not answer within the configured timeout.
	#[error("Fantasy API timed out.")]
	Timeout,
	/// Network failure before a response was received.
	#[error("Fantasy API is unreachable.")]
	Unreachable {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl From<ReqwestError> for UpstreamError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout } else { Self::Unreachable { source: Box::new(e) } }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn validation_helper_keeps_field() {
		let err = Error::validation("team_key", "must match <game>.l.<league>.t.<team>");

		assert!(matches!(err, Error::Validation { field: "team_key", .. }));
		assert!(err.to_string().contains("must match"));
	}

	#[test]
	fn upstream_status_renders_code_and_message() {
		let err: Error =
			UpstreamError::Status { status: 404, message: "league not found".into() }.into();

		assert_eq!(err.to_string(), "Fantasy API returned 404: league not found.");
	}
}
