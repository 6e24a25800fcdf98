//! HTTP surface: router, shared state, and guards.
//!
//! Public routes (`/health`, `/version`, `/privacy-policy`) skip every guard. `/metrics`
//! requires the API key. Everything under `/v1` passes the rate limiter first and the
//! API-key gate second.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod rate_limit;

mod query;

pub use error::{ApiError, ErrorBody};
pub use middleware::ApiKeyGate;
pub use rate_limit::RateLimiter;

// std
use std::net::SocketAddr;
// crates.io
use axum::{
	Router,
	middleware::from_fn_with_state,
	routing::{get, post},
};
// self
use crate::{
	_prelude::*,
	config::Settings,
	favorites::FavoritesResolver,
	flows::Broker,
	http::ReqwestHttpClient,
	obs::ServiceMetrics,
	provider::YahooStrategy,
	store::{CredentialStore, FileStore},
	upstream::FantasyClient,
};

/// State shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
	/// Loaded settings.
	pub settings: Arc<Settings>,
	/// Fantasy API client (owns the broker).
	pub fantasy: Arc<FantasyClient>,
	/// Configured favorites.
	pub favorites: Arc<FavoritesResolver>,
	/// Per-client rate limiter.
	pub limiter: Arc<RateLimiter>,
	/// Metrics registry.
	pub metrics: Arc<ServiceMetrics>,
	/// API-key gate.
	pub api_key: ApiKeyGate,
}
impl AppState {
	/// Builds the production state: file-backed credentials and a timeout-bound client.
	pub fn from_settings(settings: Settings) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(settings.upstream_timeout)?;
		let store = Arc::new(FileStore::new(settings.oauth_file.clone()));

		Self::with_parts(settings, store, http_client)
	}

	/// Builds state around an explicit store and HTTP client.
	pub fn with_parts(
		settings: Settings,
		store: Arc<dyn CredentialStore>,
		http_client: ReqwestHttpClient,
	) -> Result<Self> {
		let metrics = Arc::new(ServiceMetrics::default());
		let broker = Broker::new(store, settings.descriptor()?, Arc::new(YahooStrategy))
			.with_http_client(http_client.clone())
			.with_consumer(settings.consumer_key.clone(), settings.consumer_secret.clone())
			.with_redirect_uri(settings.redirect_uri.clone())
			.with_metrics(metrics.clone());
		let fantasy = FantasyClient::new(
			broker,
			http_client,
			settings.api_base_url.clone(),
			settings.name_cache_ttl,
		);

		Ok(Self {
			fantasy: Arc::new(fantasy),
			favorites: Arc::new(FavoritesResolver::new(settings.favorites.clone())),
			limiter: Arc::new(RateLimiter::new(settings.rate_limit_per_min, settings.rate_limit_burst)),
			metrics,
			api_key: ApiKeyGate::new(settings.api_key.as_ref()),
			settings: Arc::new(settings),
		})
	}

	/// Broker that owns the OAuth lifecycle.
	pub fn broker(&self) -> &Broker {
		self.fantasy.broker()
	}
}

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
	let v1 = Router::new()
		.route("/auth/url", get(handlers::auth_url))
		.route("/auth/token", post(handlers::auth_token))
		.route("/teams", get(handlers::teams))
		.route("/roster", get(handlers::roster))
		.route("/waivers", get(handlers::waivers))
		.route("/free-agents", get(handlers::free_agents))
		.route("/favorites", get(handlers::favorites))
		.route_layer(from_fn_with_state(state.clone(), middleware::require_api_key))
		.route_layer(from_fn_with_state(state.clone(), rate_limit::enforce));
	let protected = Router::new()
		.route("/metrics", get(handlers::metrics))
		.route_layer(from_fn_with_state(state.clone(), middleware::require_api_key));

	Router::new()
		.route("/health", get(handlers::health))
		.route("/version", get(handlers::version))
		.route("/privacy-policy", get(handlers::privacy_policy))
		.merge(protected)
		.nest("/v1", v1)
		.layer(from_fn_with_state(state.clone(), middleware::track_request))
		.layer(middleware::cors(&state.settings.cors_origins()))
		.with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(state: AppState) -> std::io::Result<()> {
	let addr = state.settings.bind_addr();
	let listener = tokio::net::TcpListener::bind(addr).await?;

	tracing::info!(%addr, "listening");

	axum::serve(listener, router(state).into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(shutdown_signal())
		.await
}

async fn shutdown_signal() {
	match tokio::signal::ctrl_c().await {
		Ok(()) => tracing::info!("shutdown signal received"),
		Err(e) => {
			tracing::warn!(error = %e, "failed to listen for shutdown signal");

			std::future::pending::<()>().await
		},
	}
}
