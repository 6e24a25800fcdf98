//! Environment-driven service settings.
//!
//! Values are read from the process environment after an optional `.env` file in the
//! working directory has been loaded. Blank variables count as unset.

// std
use std::{
	net::{IpAddr, Ipv4Addr, SocketAddr},
	path::PathBuf,
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	favorites::{self, Favorite},
	obs::LogFormat,
	provider::{self, ProviderDescriptor, YAHOO_AUTHORIZATION_ENDPOINT, YAHOO_TOKEN_ENDPOINT},
	upstream::YAHOO_FANTASY_BASE_URL,
};

/// Default credential file location inside the container image.
pub const DEFAULT_OAUTH_FILE: &str = "/data/oauth2.json";

/// Fully validated service settings.
#[derive(Clone, Debug)]
pub struct Settings {
	/// Credential file path (`YAHOO_OAUTH_FILE`).
	pub oauth_file: PathBuf,
	/// Consumer key overriding the credential file.
	pub consumer_key: Option<String>,
	/// Consumer secret overriding the credential file.
	pub consumer_secret: Option<TokenSecret>,
	/// Redirect URI used when neither the request nor the file names one.
	pub redirect_uri: Option<String>,
	/// Authorization endpoint.
	pub auth_url: Url,
	/// Token endpoint.
	pub token_url: Url,
	/// Fantasy Sports API base URL.
	pub api_base_url: Url,
	/// Shared API key; `None` leaves the API open.
	pub api_key: Option<TokenSecret>,
	/// Raw `CORS_ALLOW_ORIGINS` value.
	pub cors_allow_origins: String,
	/// Log filter directive.
	pub log_level: String,
	/// Log output format.
	pub log_format: LogFormat,
	/// Listen address.
	pub host: IpAddr,
	/// Listen port.
	pub port: u16,
	/// Steady-state requests per minute per client; `0` disables rate limiting.
	pub rate_limit_per_min: u32,
	/// Bucket capacity per client.
	pub rate_limit_burst: u32,
	/// Parsed `FAVORITE_TEAMS`.
	pub favorites: Vec<Favorite>,
	/// Timeout applied to every outbound request.
	pub upstream_timeout: StdDuration,
	/// Lifetime of cached league and team names.
	pub name_cache_ttl: StdDuration,
	/// Build commit reported by `/version`.
	pub git_sha: String,
	/// Build timestamp reported by `/version`.
	pub build_time: String,
}
impl Settings {
	/// Loads `.env` (when present) and reads the process environment.
	pub fn from_env() -> Result<Self, ConfigError> {
		if let Err(e) = dotenv::dotenv() {
			tracing::debug!(error = %e, "no .env file loaded");
		}

		Self::from_vars(std::env::vars())
	}

	/// Builds settings from explicit key/value pairs.
	pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let vars = Vars(
			vars.into_iter()
				.map(|(key, value)| (key.into(), value.into()))
				.filter(|(_, value): &(String, String)| !value.trim().is_empty())
				.collect(),
		);
		let log_format = match vars.get("LOG_FORMAT") {
			Some(raw) => raw
				.parse::<LogFormat>()
				.map_err(|reason| ConfigError::InvalidSetting { key: "LOG_FORMAT", reason })?,
			None => LogFormat::default(),
		};

		Ok(Self {
			oauth_file: PathBuf::from(vars.get("YAHOO_OAUTH_FILE").unwrap_or(DEFAULT_OAUTH_FILE)),
			consumer_key: vars.owned("YAHOO_CONSUMER_KEY"),
			consumer_secret: vars.owned("YAHOO_CONSUMER_SECRET").map(TokenSecret::new),
			redirect_uri: vars.owned("YAHOO_REDIRECT_URI"),
			auth_url: vars.url("YAHOO_AUTH_URL", YAHOO_AUTHORIZATION_ENDPOINT)?,
			token_url: vars.url("YAHOO_TOKEN_URL", YAHOO_TOKEN_ENDPOINT)?,
			api_base_url: vars.url("YAHOO_API_BASE_URL", YAHOO_FANTASY_BASE_URL)?,
			api_key: vars.owned("API_KEY").map(TokenSecret::new),
			cors_allow_origins: vars.get("CORS_ALLOW_ORIGINS").unwrap_or("*").to_owned(),
			log_level: vars.get("LOG_LEVEL").unwrap_or("info").to_owned(),
			log_format,
			host: vars.parse("HOST", IpAddr::V4(Ipv4Addr::UNSPECIFIED))?,
			port: vars.parse("PORT", 8_000)?,
			rate_limit_per_min: vars.parse("RATE_LIMIT_PER_MIN", 60)?,
			rate_limit_burst: vars.parse("RATE_LIMIT_BURST", 10)?,
			favorites: favorites::parse_favorites(vars.get("FAVORITE_TEAMS").unwrap_or_default())?,
			upstream_timeout: vars.positive_secs("UPSTREAM_TIMEOUT_SECS", 30)?,
			name_cache_ttl: StdDuration::from_secs(vars.parse("NAME_CACHE_TTL_SECS", 300)?),
			git_sha: vars.get("GIT_SHA").unwrap_or("dev").to_owned(),
			build_time: vars.get("BUILD_TIME").unwrap_or("dev").to_owned(),
		})
	}

	/// Allowed CORS origins; `["*"]` means any origin.
	pub fn cors_origins(&self) -> Vec<String> {
		let raw = self.cors_allow_origins.trim();

		if raw.is_empty() || raw == "*" {
			return vec!["*".to_owned()];
		}

		raw.split(',').map(str::trim).filter(|origin| !origin.is_empty()).map(str::to_owned).collect()
	}

	/// Socket address the server binds to.
	pub fn bind_addr(&self) -> SocketAddr {
		SocketAddr::new(self.host, self.port)
	}

	/// OAuth descriptor built from the configured endpoints.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		Ok(ProviderDescriptor::builder("yahoo")
			.authorization_endpoint(self.auth_url.clone())
			.token_endpoint(self.token_url.clone())
			.build()?)
	}
}

struct Vars(HashMap<String, String>);
impl Vars {
	fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(|value| value.trim())
	}

	fn owned(&self, key: &str) -> Option<String> {
		self.get(key).map(str::to_owned)
	}

	fn parse<T>(&self, key: &'static str, default: T) -> Result<T, ConfigError>
	where
		T: FromStr,
		T::Err: Display,
	{
		match self.get(key) {
			Some(raw) => raw
				.parse()
				.map_err(|e: T::Err| ConfigError::InvalidSetting { key, reason: e.to_string() }),
			None => Ok(default),
		}
	}

	fn positive_secs(&self, key: &'static str, default: u64) -> Result<StdDuration, ConfigError> {
		match self.parse(key, default)? {
			0 => Err(ConfigError::InvalidSetting { key, reason: "must be greater than zero".into() }),
			secs => Ok(StdDuration::from_secs(secs)),
		}
	}

	fn url(&self, key: &'static str, default: &str) -> Result<Url, ConfigError> {
		let raw = self.get(key).unwrap_or(default);
		let url = Url::parse(raw)
			.map_err(|e| ConfigError::InvalidSetting { key, reason: e.to_string() })?;

		provider::validate_endpoint(key, &url)
			.map_err(|e| ConfigError::InvalidSetting { key, reason: e.to_string() })?;

		Ok(url)
	}
}
