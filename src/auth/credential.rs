//! Persisted OAuth credential record and lifecycle helpers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: i64 = 3_600;

/// Current lifecycle status for a stored credential.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Consumer credentials may exist, but no tokens were issued yet.
	Missing,
	/// Access token is currently valid.
	Active,
	/// Access token exceeded its expiry instant.
	Expired,
}

/// Flat credential document shared with the operator tooling.
///
/// Every field is optional because the file may be seeded with consumer credentials only.
/// Keys the gateway does not understand are carried in `extra` and written back untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Credential {
	/// OAuth client identifier issued by Yahoo.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub consumer_key: Option<String>,
	/// OAuth client secret issued by Yahoo.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub consumer_secret: Option<TokenSecret>,
	/// Redirect URI registered for the app (`oob` for manual copy/paste).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirect_uri: Option<String>,
	/// Bearer token injected into Fantasy API calls.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<TokenSecret>,
	/// Long-lived token used to mint new access tokens.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Token type reported by the token endpoint (usually `bearer`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Issue instant as fractional Unix seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_time: Option<f64>,
	/// Access token lifetime in seconds.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<i64>,
	/// Granted scope string.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
	/// Yahoo user GUID (`xoauth_yahoo_guid`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub guid: Option<String>,
	/// OpenID Connect token, when Yahoo returns one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id_token: Option<TokenSecret>,
	/// Opaque state echoed during the last authorization.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub state: Option<String>,
	/// Unrecognized keys preserved across rewrites.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}
impl Credential {
	/// Returns `true` when both the access and refresh tokens are present.
	pub fn has_tokens(&self) -> bool {
		let present = |secret: &Option<TokenSecret>| secret.as_ref().is_some_and(|s| !s.is_blank());

		present(&self.access_token) && present(&self.refresh_token)
	}

	/// Issue instant derived from `token_time`.
	pub fn issued_at(&self) -> Option<OffsetDateTime> {
		let secs = self.token_time.filter(|secs| secs.is_finite())?;

		OffsetDateTime::from_unix_timestamp_nanos((secs * 1e9) as i128).ok()
	}

	/// Expiry instant (`token_time + expires_in`), assuming [`DEFAULT_EXPIRES_IN`] when absent.
	///
	/// Returns `None` when the sum is not a representable instant; callers treat that as expired.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		let issued = self.issued_at()?;

		issued.checked_add(Duration::seconds(self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN)))
	}

	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		if !self.has_tokens() {
			return TokenStatus::Missing;
		}

		match self.expires_at() {
			Some(expires_at) if instant < expires_at => TokenStatus::Active,
			_ => TokenStatus::Expired,
		}
	}

	/// Returns `true` when the access token is expired or will expire within `window`.
	pub fn should_refresh(&self, now: OffsetDateTime, window: Duration) -> bool {
		match self.expires_at() {
			Some(expires_at) => expires_at - now <= window,
			None => true,
		}
	}

	/// Folds a freshly issued grant into the record.
	///
	/// Fields the token endpoint omitted keep their previous values, so a refresh that does
	/// not rotate the refresh token keeps the old one.
	pub fn apply_grant(&mut self, grant: TokenGrant, issued_at: OffsetDateTime) {
		self.access_token = Some(grant.access_token);

		if let Some(refresh) = grant.refresh_token {
			self.refresh_token = Some(refresh);
		}
		if let Some(token_type) = grant.token_type {
			self.token_type = Some(token_type);
		}
		if grant.scope.is_some() {
			self.scope = grant.scope;
		}
		if grant.guid.is_some() {
			self.guid = grant.guid;
		}
		if grant.id_token.is_some() {
			self.id_token = grant.id_token;
		}

		self.expires_in = grant.expires_in.or(self.expires_in);
		self.token_time = Some(issued_at.unix_timestamp_nanos() as f64 / 1e9);
	}
}

/// Token endpoint payload normalized for [`Credential::apply_grant`].
#[derive(Clone, Debug, PartialEq)]
pub struct TokenGrant {
	/// Newly issued access token.
	pub access_token: TokenSecret,
	/// Rotated refresh token, if the endpoint issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Token type label.
	pub token_type: Option<String>,
	/// Lifetime in seconds.
	pub expires_in: Option<i64>,
	/// Space-delimited granted scopes.
	pub scope: Option<String>,
	/// Yahoo user GUID.
	pub guid: Option<String>,
	/// OpenID Connect token.
	pub id_token: Option<TokenSecret>,
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn active_credential(issued: OffsetDateTime) -> Credential {
		Credential {
			access_token: Some("access".into()),
			refresh_token: Some("refresh".into()),
			token_time: Some(issued.unix_timestamp() as f64),
			expires_in: Some(3_600),
			..Default::default()
		}
	}

	#[test]
	fn status_tracks_expiry() {
		let issued = macros::datetime!(2025-09-01 12:00 UTC);
		let credential = active_credential(issued);

		assert_eq!(credential.status_at(issued + Duration::minutes(10)), TokenStatus::Active);
		assert_eq!(credential.status_at(issued + Duration::hours(2)), TokenStatus::Expired);
		assert_eq!(Credential::default().status_at(issued), TokenStatus::Missing);
	}

	#[test]
	fn unrepresentable_expiry_counts_as_expired() {
		let issued = macros::datetime!(2025-09-01 12:00 UTC);
		let credential =
			Credential { expires_in: Some(1_000_000_000_000), ..active_credential(issued) };

		assert!(credential.expires_at().is_none());
		assert_eq!(credential.status_at(issued), TokenStatus::Expired);
		assert!(credential.should_refresh(issued, Duration::seconds(60)));

		let negative = Credential { expires_in: Some(i64::MIN), ..active_credential(issued) };

		assert!(negative.expires_at().is_none());
	}

	#[test]
	fn missing_expires_in_assumes_one_hour() {
		let issued = macros::datetime!(2025-09-01 12:00 UTC);
		let credential = Credential { expires_in: None, ..active_credential(issued) };

		assert_eq!(credential.expires_at(), Some(issued + Duration::hours(1)));
	}

	#[test]
	fn should_refresh_honors_window() {
		let issued = macros::datetime!(2025-09-01 12:00 UTC);
		let credential = active_credential(issued);
		let window = Duration::seconds(60);

		assert!(!credential.should_refresh(issued + Duration::minutes(30), window));
		assert!(credential.should_refresh(issued + Duration::seconds(3_550), window));
		assert!(Credential::default().should_refresh(issued, window));
	}

	#[test]
	fn apply_grant_keeps_previous_refresh_token() {
		let issued = macros::datetime!(2025-09-01 12:00 UTC);
		let mut credential = active_credential(issued);
		let later = issued + Duration::hours(2);

		credential.apply_grant(
			TokenGrant {
				access_token: "access-2".into(),
				refresh_token: None,
				token_type: Some("bearer".into()),
				expires_in: Some(1_800),
				scope: None,
				guid: Some("GUID".into()),
				id_token: None,
			},
			later,
		);

		assert_eq!(credential.access_token.as_ref().map(TokenSecret::expose), Some("access-2"));
		assert_eq!(credential.refresh_token.as_ref().map(TokenSecret::expose), Some("refresh"));
		assert_eq!(credential.expires_at(), Some(later + Duration::minutes(30)));
		assert_eq!(credential.guid.as_deref(), Some("GUID"));
	}

	#[test]
	fn unknown_keys_survive_round_trip() {
		let raw = r#"{"access_token":"a","custom_flag":true,"refresh_token":"r","token_time":1.5}"#;
		let credential: Credential =
			serde_json::from_str(raw).expect("Credential fixture should deserialize.");

		assert_eq!(credential.extra.get("custom_flag"), Some(&Value::Bool(true)));

		let back = serde_json::to_value(&credential).expect("Credential should serialize.");

		assert_eq!(back["custom_flag"], Value::Bool(true));
		assert_eq!(back["token_time"], serde_json::json!(1.5));
		assert!(back.get("scope").is_none());
	}
}
