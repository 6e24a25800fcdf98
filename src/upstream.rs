//! Fantasy Sports REST client that injects the broker's bearer token.

pub mod models;
pub mod names;

mod parse;

pub use models::*;
pub use names::NameCache;

// crates.io
use reqwest::header::{ACCEPT, USER_AGENT};
// self
use crate::{
	_prelude::*,
	auth::{LeagueKey, TeamKey, TokenSecret},
	error::{ConfigError, UpstreamError},
	flows::Broker,
	http::{self, ReqwestHttpClient},
	obs::{FlowKind, FlowOutcome, FlowSpan, ServiceMetrics},
};

/// Production base URL of the Fantasy Sports API.
pub const YAHOO_FANTASY_BASE_URL: &str = "https://fantasysports.yahooapis.com/fantasy/v2";
/// Positions searched by the free-agent endpoint when the caller names none.
pub const DEFAULT_POSITIONS: [&str; 4] = ["QB", "RB", "WR", "TE"];

/// Read-only client for the resources the gateway exposes.
#[derive(Debug)]
pub struct FantasyClient {
	broker: Broker,
	http_client: ReqwestHttpClient,
	base_url: Url,
	names: NameCache,
	metrics: Arc<ServiceMetrics>,
}
impl FantasyClient {
	/// Creates a client rooted at `base_url` that shares the broker's metrics registry.
	pub fn new(
		broker: Broker,
		http_client: ReqwestHttpClient,
		base_url: Url,
		name_ttl: StdDuration,
	) -> Self {
		let metrics = broker.metrics.clone();

		Self { broker, http_client, base_url, names: NameCache::new(name_ttl, metrics.clone()), metrics }
	}

	/// Broker that supplies bearer tokens.
	pub fn broker(&self) -> &Broker {
		&self.broker
	}

	/// League and team name cache.
	pub fn names(&self) -> &NameCache {
		&self.names
	}

	/// Lists the user's NFL leagues with their teams, optionally for one season.
	pub async fn list_teams(&self, season: Option<u16>) -> Result<TeamsResponse> {
		let listing = match season {
			Some(season) =>
				format!("users;use_login=1/games;game_codes=nfl;seasons={season}/leagues"),
			None => "users;use_login=1/games;game_keys=nfl/leagues".to_owned(),
		};
		let mut leagues = parse::leagues(&self.get_json(&listing).await?);

		if leagues.is_empty() {
			return Ok(TeamsResponse::default());
		}

		let keys = leagues.iter().map(|league| league.league_key.as_str()).collect::<Vec<_>>();
		let detailed = parse::leagues(
			&self.get_json(&format!("leagues;league_keys={}/teams", keys.join(","))).await?,
		)
		.into_iter()
		.map(|league| (league.league_key.clone(), league))
		.collect::<HashMap<_, _>>();

		for league in &mut leagues {
			if let Some(detail) = detailed.get(&league.league_key) {
				league.teams = detail.teams.clone();

				if league.league_name.is_none() {
					league.league_name = detail.league_name.clone();
				}
			}
			if let Some(name) = &league.league_name {
				self.names.insert(&league.league_key, name);
			}

			for team in &league.teams {
				self.names.insert(&team.team_key, &team.team_name);
			}
		}

		Ok(TeamsResponse { leagues })
	}

	/// Fetches a team roster, for the current week unless `week` is given.
	pub async fn roster(&self, team_key: &TeamKey, week: Option<u8>) -> Result<RosterResponse> {
		let resource = match week {
			Some(week) => format!("team/{team_key}/roster;week={week}"),
			None => format!("team/{team_key}/roster"),
		};
		let (team_name, players) = parse::roster(&self.get_json(&resource).await?);
		let team_name = match team_name {
			Some(name) => {
				self.names.insert(team_key, &name);

				Some(name)
			},
			None => self.names.get(team_key),
		};

		Ok(RosterResponse { team_key: team_key.to_string(), team_name, week, players })
	}

	/// Waiver settings, priority order, and the team's pending claims.
	pub async fn waivers(
		&self,
		league_key: &LeagueKey,
		team_key: &TeamKey,
	) -> Result<WaiversResponse> {
		let settings = parse::waiver_settings(
			&self.get_json(&format!("league/{league_key}/settings")).await?,
		);
		let priority =
			parse::waiver_priority(&self.get_json(&format!("league/{league_key}/teams")).await?);
		let pending = parse::waiver_claims(
			&self
				.get_json(&format!("league/{league_key}/transactions;types=waiver;team_key={team_key}"))
				.await?,
		);

		for entry in &priority {
			self.names.insert(&entry.team_key, &entry.team_name);
		}

		Ok(WaiversResponse { settings, priority, pending })
	}

	/// Top available free agents per position in the team's league.
	pub async fn free_agents(
		&self,
		team_key: &TeamKey,
		positions: &[String],
		limit: u8,
	) -> Result<FreeAgentsResponse> {
		let league_key = team_key.league_key();
		let mut free_agents = BTreeMap::new();

		for position in positions {
			let resource = format!(
				"league/{league_key}/players;status=FA;position={position};sort=AR;count={limit}/percent_owned"
			);
			let players = parse::available_players(&self.get_json(&resource).await?);

			free_agents.insert(position.clone(), players);
		}

		Ok(FreeAgentsResponse {
			team_key: team_key.to_string(),
			positions: positions.to_vec(),
			free_agents,
		})
	}

	/// Performs an authenticated `GET` for `resource` and decodes the JSON body.
	pub async fn get_json(&self, resource: &str) -> Result<Value> {
		const KIND: FlowKind = FlowKind::Upstream;

		let token = self.broker.access_token().await?;
		let url = self.resource_url(resource)?;
		let span = FlowSpan::new(KIND, "get_json");

		self.metrics.record_flow(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.fetch(url, &token, resource)).await;

		match &result {
			Ok(_) => self.metrics.record_flow(KIND, FlowOutcome::Success),
			Err(_) => self.metrics.record_flow(KIND, FlowOutcome::Failure),
		}

		result
	}

	fn resource_url(&self, resource: &str) -> Result<Url> {
		let raw = format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), resource);
		let mut url = Url::parse(&raw).map_err(|e| ConfigError::InvalidSetting {
			key: "YAHOO_API_BASE_URL",
			reason: format!("cannot build a resource URL: {e}"),
		})?;

		url.query_pairs_mut().append_pair("format", "json");

		Ok(url)
	}

	async fn fetch(&self, url: Url, token: &TokenSecret, resource: &str) -> Result<Value> {
		let response = self
			.http_client
			.get(url)
			.bearer_auth(token.expose())
			.header(ACCEPT, "application/json")
			.header(USER_AGENT, http::USER_AGENT)
			.send()
			.await
			.map_err(UpstreamError::from)?;
		let status = response.status();
		let body = response.bytes().await.map_err(UpstreamError::from)?;

		if !status.is_success() {
			let message = parse::error_description(&body).unwrap_or_else(|| {
				status.canonical_reason().unwrap_or("unexpected status").to_owned()
			});

			tracing::warn!(status = status.as_u16(), resource, %message, "fantasy API request failed");

			return Err(UpstreamError::Status { status: status.as_u16(), message }.into());
		}

		serde_json::from_slice(&body)
			.map_err(|source| UpstreamError::Parse { resource: resource.to_owned(), source }.into())
	}
}
