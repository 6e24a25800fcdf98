//! Lazy refresh with a singleflight guard and CAS rotation.
//!
//! Callers ask [`Broker::access_token`] for a bearer token. When the stored access token is
//! inside the preemptive window, one caller performs a `grant_type=refresh_token` call
//! while the rest wait on the guard and reuse the rotated credential. A rejected refresh
//! token surfaces as [`Error::InvalidGrant`]; the stored credential is left on disk so the
//! operator can inspect it before re-authorizing.

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	flows::Broker,
	oauth::TokenFacade,
	obs::{FlowKind, FlowOutcome, FlowSpan},
	store::CompareAndSwapOutcome,
};

const REAUTH_HINT: &str = "complete the authorization flow via /v1/auth/url and /v1/auth/token";

impl Broker {
	/// Returns a bearer token that is valid for at least the preemptive window.
	pub async fn access_token(&self) -> Result<TokenSecret> {
		let credential = self.valid_credential().await?;

		credential.access_token.ok_or_else(|| Error::NotAuthenticated {
			reason: format!("stored credential has no access token; {REAUTH_HINT}"),
		})
	}

	/// Loads the credential, refreshing it first when it is expired or about to expire.
	pub async fn valid_credential(&self) -> Result<Credential> {
		let current = self.load_authenticated().await?;

		if !current.should_refresh(OffsetDateTime::now_utc(), self.preemptive_window) {
			return Ok(current);
		}

		self.refresh_credential(false).await
	}

	/// Refreshes the stored credential.
	///
	/// Without `force`, a credential that another caller already rotated is returned as is.
	pub async fn refresh_credential(&self, force: bool) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_credential");

		self.metrics.record_flow(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let _singleflight = self.refresh_guard.lock().await;
				let current = self.load_authenticated().await?;
				let now = OffsetDateTime::now_utc();

				if !force && !current.should_refresh(now, self.preemptive_window) {
					return Ok(current);
				}

				let expected_refresh = current
					.refresh_token
					.as_ref()
					.map(|secret| secret.expose().to_owned())
					.ok_or_else(|| Error::NotAuthenticated {
						reason: format!("stored credential has no refresh token; {REAUTH_HINT}"),
					})?;
				let (client_id, client_secret) = self.resolve_consumer(Some(&current))?;
				let redirect_uri = self.resolve_redirect(None, Some(&current));
				let facade = TokenFacade::from_descriptor(
					&self.descriptor,
					&client_id,
					client_secret.expose(),
					self.http_client.clone(),
				)?;
				let grant = facade
					.refresh(self.strategy.as_ref(), &expected_refresh, Some(&redirect_uri))
					.await
					.inspect_err(|err| {
						if matches!(err, Error::InvalidGrant { .. }) {
							tracing::warn!(
								error = %err,
								"refresh token rejected; re-authorization required"
							);
						}
					})?;
				let mut updated = current;

				updated.apply_grant(grant, now);

				let outcome = self
					.store
					.compare_and_swap_refresh(Some(expected_refresh.as_str()), updated.clone())
					.await;

				Ok(match outcome {
					Ok(CompareAndSwapOutcome::Updated) => updated,
					Ok(CompareAndSwapOutcome::Missing) => {
						if let Err(e) = self.store.save(updated.clone()).await {
							tracing::warn!(error = %e, "refreshed credential could not be persisted");
						}

						updated
					},
					Ok(CompareAndSwapOutcome::RefreshMismatch) =>
						match self.store.load().await {
							Ok(Some(existing)) if existing.has_tokens() => existing,
							_ => updated,
						},
					Err(e) => {
						tracing::warn!(error = %e, "refreshed credential could not be persisted");

						updated
					},
				})
			})
			.await;

		match &result {
			Ok(_) => self.metrics.record_flow(KIND, FlowOutcome::Success),
			Err(_) => self.metrics.record_flow(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn load_authenticated(&self) -> Result<Credential> {
		let credential = self.store.load().await?.ok_or_else(|| Error::NotAuthenticated {
			reason: format!("no stored credential; {REAUTH_HINT}"),
		})?;

		if !credential.has_tokens() {
			return Err(Error::NotAuthenticated {
				reason: format!("stored credential has no tokens; {REAUTH_HINT}"),
			});
		}

		Ok(credential)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{
		provider::{ProviderDescriptor, YahooStrategy},
		store::MemoryStore,
	};

	fn broker_with(credential: Option<Credential>) -> Broker {
		let store = match credential {
			Some(credential) => MemoryStore::with_credential(credential),
			None => MemoryStore::default(),
		};

		Broker::new(
			Arc::new(store),
			ProviderDescriptor::yahoo().expect("Yahoo descriptor should build."),
			Arc::new(YahooStrategy),
		)
	}

	#[tokio::test]
	async fn missing_credential_is_not_authenticated() {
		let err = broker_with(None).access_token().await.expect_err("Missing credential should fail.");

		assert!(matches!(err, Error::NotAuthenticated { .. }));
	}

	#[tokio::test]
	async fn consumer_only_credential_is_not_authenticated() {
		let seeded = Credential {
			consumer_key: Some("key".into()),
			consumer_secret: Some("secret".into()),
			..Default::default()
		};
		let err = broker_with(Some(seeded))
			.access_token()
			.await
			.expect_err("Credential without tokens should fail.");

		assert!(matches!(err, Error::NotAuthenticated { .. }));
	}

	#[tokio::test]
	async fn fresh_token_is_returned_without_refresh() {
		let seeded = Credential {
			access_token: Some("access".into()),
			refresh_token: Some("refresh".into()),
			token_time: Some(OffsetDateTime::now_utc().unix_timestamp() as f64),
			expires_in: Some(3_600),
			..Default::default()
		};
		let broker = broker_with(Some(seeded));
		let token = broker.access_token().await.expect("Fresh token should be returned.");

		assert_eq!(token.expose(), "access");
		assert!(!broker.metrics.render().contains("flow=\"refresh\",outcome=\"attempt\""));
	}
}
