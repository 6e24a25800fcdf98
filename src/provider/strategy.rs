//! Provider strategy hooks that classify token endpoint failures.

// self
use crate::{_prelude::*, provider::descriptor::GrantType};

/// Strategy hook that maps token endpoint failures into the gateway error taxonomy.
///
/// The hook works on crate-owned data so implementations stay independent of reqwest.
pub trait ProviderStrategy: Send + Sync {
	/// Classifies a failed token request.
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind;
}

/// Canonical provider error categories used by strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderErrorKind {
	/// Provider rejected the authorization code or refresh token.
	InvalidGrant,
	/// Consumer key/secret were rejected.
	InvalidClient,
	/// Requested scopes exceed what the app may request.
	InsufficientScope,
	/// Failure is temporary and may be retried.
	Transient,
}

/// Context passed to provider strategies when classifying token errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderErrorContext {
	/// Grant type associated with the failing request.
	pub grant_type: GrantType,
	/// HTTP status code returned by the provider, when available.
	pub http_status: Option<u16>,
	/// Provider-supplied OAuth `error` field.
	pub oauth_error: Option<String>,
	/// Provider-supplied OAuth `error_description` field.
	pub error_description: Option<String>,
	/// Indicates whether the failure originated from the network/transport layer.
	pub network_error: bool,
}
impl ProviderErrorContext {
	/// Creates a new context scoped to the provided grant type.
	pub fn new(grant_type: GrantType) -> Self {
		Self {
			grant_type,
			http_status: None,
			oauth_error: None,
			error_description: None,
			network_error: false,
		}
	}

	/// Convenience constructor for transport-level/network failures.
	pub fn network_failure(grant_type: GrantType) -> Self {
		Self { network_error: true, ..Self::new(grant_type) }
	}

	/// Adds an HTTP status code.
	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status = Some(status);

		self
	}

	/// Adds the OAuth error code string returned by the provider.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Adds the OAuth `error_description` field.
	pub fn with_error_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}
}

/// Strategy tuned for Yahoo's token endpoint.
///
/// Yahoo reports most failures as `invalid_grant`/`invalid_client` but also puts
/// upper-case codes such as `INVALID_REFRESH_TOKEN` in the description, so both fields
/// are inspected before falling back to the HTTP status.
#[derive(Debug, Default)]
pub struct YahooStrategy;
impl Display for YahooStrategy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("yahoo-strategy")
	}
}
impl ProviderStrategy for YahooStrategy {
	fn classify_token_error(&self, ctx: &ProviderErrorContext) -> ProviderErrorKind {
		if ctx.network_error {
			return ProviderErrorKind::Transient;
		}

		ctx.oauth_error
			.as_deref()
			.and_then(classify_code)
			.or_else(|| ctx.error_description.as_deref().and_then(classify_code))
			.unwrap_or_else(|| classify_status(ctx.http_status))
	}
}

fn classify_code(value: &str) -> Option<ProviderErrorKind> {
	let lowered = value.to_ascii_lowercase();

	match lowered.as_str() {
		text if text.contains("invalid_grant")
			|| text.contains("access_denied")
			|| text.contains("invalid_refresh_token")
			|| text.contains("invalid_authorization_code")
			|| text.contains("token_expired") =>
			Some(ProviderErrorKind::InvalidGrant),
		text if text.contains("invalid_client") || text.contains("unauthorized_client") =>
			Some(ProviderErrorKind::InvalidClient),
		text if text.contains("invalid_scope") || text.contains("insufficient_scope") =>
			Some(ProviderErrorKind::InsufficientScope),
		text if text.contains("temporarily_unavailable") || text.contains("server_error") =>
			Some(ProviderErrorKind::Transient),
		_ => None,
	}
}

fn classify_status(status: Option<u16>) -> ProviderErrorKind {
	match status {
		Some(400 | 404 | 410) => ProviderErrorKind::InvalidGrant,
		Some(401) => ProviderErrorKind::InvalidClient,
		Some(403) => ProviderErrorKind::InsufficientScope,
		_ => ProviderErrorKind::Transient,
	}
}
