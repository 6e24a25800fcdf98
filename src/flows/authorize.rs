//! Authorization URL construction and code exchange.

// self
use crate::{
	_prelude::*,
	flows::Broker,
	oauth::TokenFacade,
	obs::{FlowKind, FlowOutcome, FlowSpan},
};

/// Authorization URL handed to the operator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
	/// Yahoo consent page URL.
	pub authorization_url: Url,
	/// Redirect URI embedded in the URL; the same value must be used for the exchange.
	pub redirect_uri: String,
	/// Caller-supplied state echoed by Yahoo.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
}

/// Summary returned after a successful code exchange.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
	/// Always `stored`.
	pub status: String,
	/// Token type reported by Yahoo.
	pub token_type: String,
	/// Yahoo user GUID.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub guid: Option<String>,
	/// Granted scopes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Access token expiry.
	#[serde(default, skip_serializing_if = "Option::is_none", with = "time::serde::rfc3339::option")]
	pub expires_at: Option<OffsetDateTime>,
}

impl Broker {
	/// Builds the Yahoo consent URL for the configured consumer key.
	pub async fn authorization_url(
		&self,
		state: Option<String>,
		redirect_uri: Option<String>,
	) -> Result<AuthorizationRequest> {
		let stored = self.store.load().await?;
		let (client_id, _) = self.resolve_consumer(stored.as_ref())?;
		let redirect_uri = self.resolve_redirect(redirect_uri.as_deref(), stored.as_ref());
		let state = state.filter(|value| !value.trim().is_empty());
		let mut authorization_url = self.descriptor.endpoints.authorization.clone();

		{
			let mut query = authorization_url.query_pairs_mut();

			query
				.append_pair("client_id", &client_id)
				.append_pair("redirect_uri", &redirect_uri)
				.append_pair("response_type", "code");

			if let Some(state) = &state {
				query.append_pair("state", state);
			}
		}

		Ok(AuthorizationRequest { authorization_url, redirect_uri, state })
	}

	/// Exchanges an authorization code and persists the resulting credential.
	pub async fn exchange_code(
		&self,
		code: &str,
		redirect_uri: Option<&str>,
		state: Option<&str>,
	) -> Result<ExchangeOutcome> {
		let code = code.trim();

		if code.is_empty() {
			return Err(Error::validation("code", "must not be empty"));
		}

		let span = FlowSpan::new(FlowKind::AuthorizationCode, "exchange_code");

		self.metrics.record_flow(FlowKind::AuthorizationCode, FlowOutcome::Attempt);

		let result = span.instrument(self.exchange_code_inner(code, redirect_uri, state)).await;
		let outcome =
			if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

		self.metrics.record_flow(FlowKind::AuthorizationCode, outcome);

		result
	}

	async fn exchange_code_inner(
		&self,
		code: &str,
		redirect_uri: Option<&str>,
		state: Option<&str>,
	) -> Result<ExchangeOutcome> {
		let mut credential = self.store.load().await?.unwrap_or_default();
		let (client_id, client_secret) = self.resolve_consumer(Some(&credential))?;
		let redirect_uri = self.resolve_redirect(redirect_uri, Some(&credential));
		let facade = TokenFacade::from_descriptor(
			&self.descriptor,
			&client_id,
			client_secret.expose(),
			self.http_client.clone(),
		)?;
		let grant = facade.exchange_code(self.strategy.as_ref(), code, &redirect_uri).await?;

		credential.consumer_key = Some(client_id);
		credential.consumer_secret = Some(client_secret);
		credential.redirect_uri = Some(redirect_uri);
		credential.state = state.map(str::to_owned).or(credential.state);
		credential.apply_grant(grant, OffsetDateTime::now_utc());

		self.store.save(credential.clone()).await?;

		tracing::info!(
			guid = credential.guid.as_deref().unwrap_or("unknown"),
			"authorization code exchanged and credential stored"
		);

		Ok(ExchangeOutcome {
			status: "stored".into(),
			token_type: credential.token_type.clone().unwrap_or_else(|| "bearer".into()),
			guid: credential.guid.clone(),
			scope: credential.scope.clone(),
			expires_at: credential.expires_at(),
		})
	}
}
