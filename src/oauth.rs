//! Token endpoint facade built on the `oauth2` crate.
//!
//! Yahoo returns `xoauth_yahoo_guid` (and sometimes `id_token`) next to the standard
//! fields, so the facade plugs [`YahooTokenFields`] into oauth2's generic token response.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, Client, ClientId, ClientSecret, EndpointNotSet,
	EndpointSet, ExtraTokenFields, HttpClientError, RefreshToken, RequestTokenError,
	StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse, BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenGrant, TokenSecret},
	error::{ConfigError, TransientError, TransportError},
	http::{ReqwestHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{
		ClientAuthMethod, GrantType, ProviderDescriptor, ProviderErrorContext, ProviderErrorKind,
		ProviderStrategy,
	},
};

/// Yahoo-specific fields carried next to the standard token response.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YahooTokenFields {
	/// GUID of the Yahoo account that granted access.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub xoauth_yahoo_guid: Option<String>,
	/// OpenID Connect token, present when `openid` was requested.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<String>,
}
impl ExtraTokenFields for YahooTokenFields {}

/// Token response type returned by Yahoo's token endpoint.
pub type YahooTokenResponse = StandardTokenResponse<YahooTokenFields, BasicTokenType>;

type ConfiguredClient = Client<
	BasicErrorResponse,
	YahooTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Confidential client bound to one descriptor and consumer key/secret pair.
pub(crate) struct TokenFacade {
	oauth_client: ConfiguredClient,
	http_client: ReqwestHttpClient,
}
impl TokenFacade {
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &str,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = Client::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client })
	}

	/// Exchanges an authorization code. `redirect_uri` is sent verbatim because Yahoo
	/// accepts the non-URL value `oob`.
	pub(crate) async fn exchange_code(
		&self,
		strategy: &dyn ProviderStrategy,
		code: &str,
		redirect_uri: &str,
	) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let response = self
			.oauth_client
			.exchange_code(AuthorizationCode::new(code.to_owned()))
			.add_extra_param("redirect_uri", redirect_uri)
			.request_async(&instrumented)
			.await
			.map_err(|err| {
				map_request_error(strategy, GrantType::AuthorizationCode, meta.take(), err)
			})?;
		let grant = map_token_response(response)?;

		if grant.refresh_token.is_none() {
			return Err(TransientError::IncompleteTokenResponse { field: "refresh_token" }.into());
		}

		Ok(grant)
	}

	pub(crate) async fn refresh(
		&self,
		strategy: &dyn ProviderStrategy,
		refresh_token: &str,
		redirect_uri: Option<&str>,
	) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.instrumented(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.to_owned());
		let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

		if let Some(redirect) = redirect_uri {
			request = request.add_extra_param("redirect_uri", redirect);
		}

		let response = request.request_async(&instrumented).await.map_err(|err| {
			map_request_error(strategy, GrantType::RefreshToken, meta.take(), err)
		})?;

		map_token_response(response)
	}
}

fn map_token_response(response: YahooTokenResponse) -> Result<TokenGrant> {
	let expires_in = response
		.expires_in()
		.map(|lifetime| i64::try_from(lifetime.as_secs()))
		.transpose()
		.map_err(|_| ConfigError::ExpiresInOutOfRange)?;
	let scope = response
		.scopes()
		.map(|scopes| scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "))
		.filter(|joined| !joined.is_empty());
	let extra = response.extra_fields();

	Ok(TokenGrant {
		access_token: TokenSecret::new(response.access_token().secret().to_owned()),
		refresh_token: response.refresh_token().map(|token| TokenSecret::new(token.secret().to_owned())),
		token_type: Some(response.token_type().as_ref().to_owned()),
		expires_in,
		scope,
		guid: extra.xoauth_yahoo_guid.clone(),
		id_token: extra.id_token.clone().map(TokenSecret::new),
	})
}

fn map_request_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<ReqwestError>>,
) -> Error {
	let meta_ref = meta.as_ref();

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(strategy, grant, response, meta_ref),
		RequestTokenError::Request(error) => map_transport_error(meta_ref, error),
		RequestTokenError::Parse(error, _body) =>
			TransientError::TokenResponseParse { source: error, status: meta_status(meta_ref) }
				.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta_ref),
			retry_after: meta_retry_after(meta_ref),
		}
		.into(),
	}
}

fn map_server_response_error(
	strategy: &dyn ProviderStrategy,
	grant: GrantType,
	response: BasicErrorResponse,
	meta: Option<&ResponseMetadata>,
) -> Error {
	let mut ctx =
		ProviderErrorContext::new(grant).with_oauth_error(response.error().as_ref().to_string());

	if let Some(description) = response.error_description() {
		ctx = ctx.with_error_description(description.clone());
	}
	if let Some(status) = meta_status(meta) {
		ctx = ctx.with_http_status(status);
	}

	let message = match response.error_description() {
		Some(description) => format!("{} ({description})", response.error().as_ref()),
		None => response.error().as_ref().to_string(),
	};

	match strategy.classify_token_error(&ctx) {
		ProviderErrorKind::InvalidGrant => Error::InvalidGrant { reason: message },
		ProviderErrorKind::InvalidClient => Error::InvalidClient { reason: message },
		ProviderErrorKind::InsufficientScope => Error::InsufficientScope { reason: message },
		ProviderErrorKind::Transient => TransientError::TokenEndpoint {
			message,
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_transport_error(meta: Option<&ResponseMetadata>, err: HttpClientError<ReqwestError>) -> Error {
	match err {
		HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
		HttpClientError::Http(inner) => ConfigError::from(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error: {message}"),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: "HTTP client error".into(),
			status: meta_status(meta),
			retry_after: meta_retry_after(meta),
		}
		.into(),
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransientError::TokenEndpoint {
			message: "request timed out".into(),
			status: meta_status(meta).or_else(|| err.status().map(|code| code.as_u16())),
			retry_after: meta_retry_after(meta),
		}
		.into();
	}

	TransportError::from(err).into()
}

fn meta_status(meta: Option<&ResponseMetadata>) -> Option<u16> {
	meta.and_then(|value| value.status)
}

fn meta_retry_after(meta: Option<&ResponseMetadata>) -> Option<Duration> {
	meta.and_then(|value| value.retry_after)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn yahoo_token_response_maps_extra_fields() {
		let response: YahooTokenResponse = serde_json::from_str(
			r#"{"access_token":"a","refresh_token":"r","token_type":"bearer","expires_in":3600,"xoauth_yahoo_guid":"GUID123"}"#,
		)
		.expect("Yahoo token response fixture should deserialize.");
		let grant = map_token_response(response).expect("Token response should map.");

		assert_eq!(grant.access_token.expose(), "a");
		assert_eq!(grant.refresh_token.as_ref().map(TokenSecret::expose), Some("r"));
		assert_eq!(grant.token_type.as_deref(), Some("bearer"));
		assert_eq!(grant.expires_in, Some(3_600));
		assert_eq!(grant.guid.as_deref(), Some("GUID123"));
		assert!(grant.scope.is_none());
	}

	#[test]
	fn builds_post_auth_client() {
		let descriptor = ProviderDescriptor::builder("yahoo")
			.authorization_endpoint(
				Url::parse("https://example.com/oauth2/request_auth")
					.expect("Failed to parse authorization endpoint URL."),
			)
			.token_endpoint(
				Url::parse("https://example.com/oauth2/get_token")
					.expect("Failed to parse token endpoint URL."),
			)
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
			.build()
			.expect("Failed to build provider descriptor.");
		let result = TokenFacade::from_descriptor(
			&descriptor,
			"client-id",
			"secret",
			ReqwestHttpClient::default(),
		);

		assert!(result.is_ok());
	}
}
