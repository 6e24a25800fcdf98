//! Route handlers.

// crates.io
use axum::{
	Json,
	extract::{RawQuery, State, rejection::JsonRejection},
	http::{StatusCode, header::CONTENT_TYPE},
	response::{Html, IntoResponse},
};
use serde_json::json;
// self
use crate::{
	_prelude::*,
	api::{ApiError, AppState, query::Query},
	favorites::FavoritesResponse,
	flows::{AuthorizationRequest, ExchangeOutcome},
	upstream::{FreeAgentsResponse, RosterResponse, TeamsResponse, WaiversResponse},
};

type ApiResult<T> = Result<Json<T>, ApiError>;

const PRIVACY_POLICY: &str = r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>Privacy Policy</title></head>
<body>
<h1>Privacy Policy</h1>
<p>This service reads fantasy football data from Yahoo on behalf of its single operator.</p>
<p>OAuth tokens are stored only in the operator's credential file and are never shared.
Request logs contain request ids, paths, status codes, and latencies; they do not contain
tokens, API keys, or request bodies.</p>
<p>No data is sold or disclosed to third parties. Revoke access at any time from your Yahoo
account settings.</p>
</body>
</html>
"#;

/// Body of `POST /v1/auth/token`.
#[derive(Clone, Debug, Deserialize)]
pub struct AuthCodeRequest {
	/// Authorization code shown by Yahoo.
	pub code: String,
	/// Redirect URI used when requesting the code.
	#[serde(default)]
	pub redirect_uri: Option<String>,
	/// State passed to the authorization URL.
	#[serde(default)]
	pub state: Option<String>,
}

/// Build metadata served by `/version`.
#[derive(Clone, Debug, Serialize)]
pub struct VersionInfo {
	/// Crate version.
	pub version: &'static str,
	/// Commit the binary was built from.
	pub git_sha: String,
	/// Build timestamp.
	pub build_time: String,
}

pub(crate) async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

pub(crate) async fn version(State(state): State<AppState>) -> Json<VersionInfo> {
	Json(VersionInfo {
		version: env!("CARGO_PKG_VERSION"),
		git_sha: state.settings.git_sha.clone(),
		build_time: state.settings.build_time.clone(),
	})
}

pub(crate) async fn privacy_policy() -> Html<&'static str> {
	Html(PRIVACY_POLICY)
}

pub(crate) async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
	([(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")], state.metrics.render())
}

pub(crate) async fn auth_url(
	State(state): State<AppState>,
	RawQuery(raw): RawQuery,
) -> ApiResult<AuthorizationRequest> {
	let query = Query::parse(raw.as_deref());
	let request = state
		.broker()
		.authorization_url(query.text("state"), query.text("redirect_uri"))
		.await?;

	Ok(Json(request))
}

pub(crate) async fn auth_token(
	State(state): State<AppState>,
	body: Result<Json<AuthCodeRequest>, JsonRejection>,
) -> ApiResult<ExchangeOutcome> {
	let Json(body) = body.map_err(|rejection| {
		ApiError::validation([("body", rejection.body_text())])
	})?;
	let outcome = state
		.broker()
		.exchange_code(&body.code, body.redirect_uri.as_deref(), body.state.as_deref())
		.await
		.map_err(|e| match e {
			Error::InvalidGrant { reason } => ApiError::new(
				StatusCode::BAD_REQUEST,
				"authorization_code_rejected",
				format!("Yahoo rejected the authorization code: {reason}"),
			),
			other => ApiError::from(other),
		})?;

	Ok(Json(outcome))
}

pub(crate) async fn teams(
	State(state): State<AppState>,
	RawQuery(raw): RawQuery,
) -> ApiResult<TeamsResponse> {
	let mut query = Query::parse(raw.as_deref());
	let season = query.season();

	query.finish()?;

	Ok(Json(state.fantasy.list_teams(season).await?))
}

pub(crate) async fn roster(
	State(state): State<AppState>,
	RawQuery(raw): RawQuery,
) -> ApiResult<RosterResponse> {
	let mut query = Query::parse(raw.as_deref());
	let team_key = query.team_key();
	let week = query.week();

	let team_key = query.finish_with(team_key)?;

	Ok(Json(state.fantasy.roster(&team_key, week).await?))
}

pub(crate) async fn waivers(
	State(state): State<AppState>,
	RawQuery(raw): RawQuery,
) -> ApiResult<WaiversResponse> {
	let mut query = Query::parse(raw.as_deref());
	let team_key = query.team_key();
	let league_key = query.league_key();

	let team_key = query.finish_with(team_key)?;
	let league_key = league_key.unwrap_or_else(|| team_key.league_key());

	Ok(Json(state.fantasy.waivers(&league_key, &team_key).await?))
}

pub(crate) async fn free_agents(
	State(state): State<AppState>,
	RawQuery(raw): RawQuery,
) -> ApiResult<FreeAgentsResponse> {
	let mut query = Query::parse(raw.as_deref());
	let team_key = query.team_key();
	let positions = query.positions();
	let limit = query.limit();

	let team_key = query.finish_with(team_key)?;

	Ok(Json(state.fantasy.free_agents(&team_key, &positions, limit).await?))
}

pub(crate) async fn favorites(State(state): State<AppState>) -> Json<FavoritesResponse> {
	Json(state.favorites.resolve(&state.fantasy).await)
}
