//! OAuth flow orchestration for the gateway's single Yahoo credential.

pub mod authorize;
pub mod refresh;

pub use authorize::*;

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
	error::ConfigError,
	http::ReqwestHttpClient,
	obs::ServiceMetrics,
	provider::{ProviderDescriptor, ProviderStrategy},
	store::CredentialStore,
};

/// Redirect URI Yahoo accepts for copy/paste (out-of-band) authorization.
pub const OUT_OF_BAND_REDIRECT: &str = "oob";

/// Coordinates the authorization, exchange, and refresh flows against one descriptor.
///
/// Consumer credentials configured through the environment take precedence over the
/// values stored in the credential file; the file is the fallback so an operator can
/// seed everything in one place.
#[derive(Clone)]
pub struct Broker {
	/// HTTP client used for every token endpoint request.
	pub http_client: ReqwestHttpClient,
	/// Credential store that persists issued tokens.
	pub store: Arc<dyn CredentialStore>,
	/// Provider descriptor that defines the OAuth endpoints.
	pub descriptor: ProviderDescriptor,
	/// Strategy responsible for classifying token endpoint errors.
	pub strategy: Arc<dyn ProviderStrategy>,
	/// Consumer key configured outside the credential file.
	pub consumer_key: Option<String>,
	/// Consumer secret configured outside the credential file.
	pub consumer_secret: Option<TokenSecret>,
	/// Redirect URI configured outside the credential file.
	pub redirect_uri: Option<String>,
	/// Refresh when the access token expires within this window.
	pub preemptive_window: Duration,
	/// Shared metrics registry.
	pub metrics: Arc<ServiceMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl Broker {
	const DEFAULT_PREEMPTIVE_WINDOW: Duration = Duration::seconds(60);

	/// Creates a broker with a default HTTP client and no configured consumer credentials.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		descriptor: ProviderDescriptor,
		strategy: Arc<dyn ProviderStrategy>,
	) -> Self {
		Self {
			http_client: ReqwestHttpClient::default(),
			store,
			descriptor,
			strategy,
			consumer_key: None,
			consumer_secret: None,
			redirect_uri: None,
			preemptive_window: Self::DEFAULT_PREEMPTIVE_WINDOW,
			metrics: Default::default(),
			refresh_guard: Default::default(),
		}
	}

	/// Replaces the HTTP client used for token requests.
	pub fn with_http_client(mut self, http_client: ReqwestHttpClient) -> Self {
		self.http_client = http_client;

		self
	}

	/// Sets consumer credentials that override the credential file.
	pub fn with_consumer(mut self, key: Option<String>, secret: Option<TokenSecret>) -> Self {
		self.consumer_key = key.filter(|value| !value.trim().is_empty());
		self.consumer_secret = secret.filter(|value| !value.is_blank());

		self
	}

	/// Sets the redirect URI used when neither the request nor the file supplies one.
	pub fn with_redirect_uri(mut self, redirect_uri: Option<String>) -> Self {
		self.redirect_uri = redirect_uri.filter(|value| !value.trim().is_empty());

		self
	}

	/// Shares a metrics registry with the rest of the service.
	pub fn with_metrics(mut self, metrics: Arc<ServiceMetrics>) -> Self {
		self.metrics = metrics;

		self
	}

	/// Overrides the preemptive refresh window (defaults to 60 seconds).
	pub fn with_preemptive_window(mut self, window: Duration) -> Self {
		self.preemptive_window = if window.is_negative() { Duration::ZERO } else { window };

		self
	}

	pub(crate) fn resolve_consumer(
		&self,
		stored: Option<&Credential>,
	) -> Result<(String, TokenSecret)> {
		let key = non_blank(self.consumer_key.as_deref())
			.or_else(|| non_blank(stored.and_then(|c| c.consumer_key.as_deref())))
			.map(str::to_owned);
		let secret = self
			.consumer_secret
			.clone()
			.filter(|value| !value.is_blank())
			.or_else(|| {
				stored.and_then(|c| c.consumer_secret.clone()).filter(|value| !value.is_blank())
			});

		match (key, secret) {
			(Some(key), Some(secret)) => Ok((key, secret)),
			_ => Err(ConfigError::MissingConsumerCredentials.into()),
		}
	}

	/// Request value first, then the credential file, then configuration, then `oob`.
	pub(crate) fn resolve_redirect(
		&self,
		requested: Option<&str>,
		stored: Option<&Credential>,
	) -> String {
		non_blank(requested)
			.or_else(|| non_blank(stored.and_then(|c| c.redirect_uri.as_deref())))
			.or_else(|| non_blank(self.redirect_uri.as_deref()))
			.unwrap_or(OUT_OF_BAND_REDIRECT)
			.to_owned()
	}
}
impl Debug for Broker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("consumer_key", &self.consumer_key)
			.field("consumer_secret_set", &self.consumer_secret.is_some())
			.field("redirect_uri", &self.redirect_uri)
			.finish()
	}
}

// Blank values count as absent.
fn non_blank(value: Option<&str>) -> Option<&str> {
	value.filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{provider::YahooStrategy, store::MemoryStore};

	fn broker() -> Broker {
		Broker::new(
			Arc::new(MemoryStore::default()),
			ProviderDescriptor::yahoo().expect("Yahoo descriptor should build."),
			Arc::new(YahooStrategy),
		)
	}

	#[test]
	fn configured_consumer_overrides_file() {
		let broker = broker().with_consumer(Some("env-key".into()), Some("env-secret".into()));
		let stored = Credential {
			consumer_key: Some("file-key".into()),
			consumer_secret: Some("file-secret".into()),
			..Default::default()
		};
		let (key, secret) =
			broker.resolve_consumer(Some(&stored)).expect("Consumer should resolve.");

		assert_eq!(key, "env-key");
		assert_eq!(secret.expose(), "env-secret");
	}

	#[test]
	fn file_consumer_is_the_fallback() {
		let stored = Credential {
			consumer_key: Some("file-key".into()),
			consumer_secret: Some("file-secret".into()),
			..Default::default()
		};
		let (key, _) = broker().resolve_consumer(Some(&stored)).expect("Consumer should resolve.");

		assert_eq!(key, "file-key");
		assert!(matches!(
			broker().resolve_consumer(None),
			Err(Error::Config(ConfigError::MissingConsumerCredentials))
		));
	}

	#[test]
	fn redirect_falls_back_to_out_of_band() {
		let configured = broker().with_redirect_uri(Some("https://app.example.com/cb".into()));
		let stored =
			Credential { redirect_uri: Some("https://file.example.com/cb".into()), ..Default::default() };

		assert_eq!(broker().resolve_redirect(None, None), "oob");
		assert_eq!(configured.resolve_redirect(None, None), "https://app.example.com/cb");
		assert_eq!(configured.resolve_redirect(None, Some(&stored)), "https://file.example.com/cb");
		assert_eq!(
			configured.resolve_redirect(Some("https://req.example.com"), Some(&stored)),
			"https://req.example.com"
		);
	}

	#[test]
	fn blank_sources_fall_through() {
		let configured = broker()
			.with_redirect_uri(Some("https://cfg.example.com/cb".into()))
			.with_consumer(Some(" ".into()), Some("env-secret".into()));
		let stored = Credential {
			consumer_key: Some("file-key".into()),
			redirect_uri: Some(String::new()),
			..Default::default()
		};

		assert_eq!(configured.resolve_redirect(Some(""), None), "https://cfg.example.com/cb");
		assert_eq!(
			configured.resolve_redirect(Some("  "), Some(&stored)),
			"https://cfg.example.com/cb"
		);

		let (key, secret) =
			configured.resolve_consumer(Some(&stored)).expect("Consumer should resolve.");

		assert_eq!(key, "file-key");
		assert_eq!(secret.expose(), "env-secret");
	}
}
