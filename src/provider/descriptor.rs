//! Provider descriptor data structures shared by the OAuth flows.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::_prelude::*;

/// Yahoo's production authorization endpoint.
pub const YAHOO_AUTHORIZATION_ENDPOINT: &str = "https://api.login.yahoo.com/oauth2/request_auth";
/// Yahoo's production token endpoint.
pub const YAHOO_TOKEN_ENDPOINT: &str = "https://api.login.yahoo.com/oauth2/get_token";

/// OAuth 2.0 grants the gateway performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Authorization Code grant completed by the operator.
	AuthorizationCode,
	/// Refresh Token grant run lazily before upstream calls.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::AuthorizationCode => "authorization_code",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint pair declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
	/// Authorization endpoint the operator visits.
	pub authorization: Url,
	/// Token endpoint used for code exchanges and refreshes.
	pub token: Url,
}

/// Immutable provider descriptor consumed by flows.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
	/// Short label used in logs.
	pub name: String,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism.
	pub preferred_client_auth_method: ClientAuthMethod,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided label.
	pub fn builder(name: impl Into<String>) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(name)
	}

	/// Descriptor for Yahoo's production OAuth endpoints.
	pub fn yahoo() -> Result<Self, ProviderDescriptorError> {
		let parse = |raw: &str| {
			Url::parse(raw).map_err(|e| ProviderDescriptorError::InvalidEndpoint {
				endpoint: "yahoo",
				reason: e.to_string(),
			})
		};

		Self::builder("yahoo")
			.authorization_endpoint(parse(YAHOO_AUTHORIZATION_ENDPOINT)?)
			.token_endpoint(parse(YAHOO_TOKEN_ENDPOINT)?)
			.build()
	}
}
