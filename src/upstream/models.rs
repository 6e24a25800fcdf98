//! Response shapes served by the gateway.

// self
use crate::_prelude::*;

/// A team inside a league listing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueTeam {
	/// Yahoo team key.
	pub team_key: String,
	/// Display name (empty when Yahoo omits it).
	pub team_name: String,
	/// Current waiver priority.
	pub waiver_priority: Option<i64>,
}

/// A league with its teams.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
	/// Numeric league id.
	pub league_id: String,
	/// Yahoo league key.
	pub league_key: String,
	/// Display name.
	pub league_name: Option<String>,
	/// Teams in the league.
	pub teams: Vec<LeagueTeam>,
}

/// `GET /v1/teams` body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamsResponse {
	/// Leagues the authorized user belongs to.
	pub leagues: Vec<League>,
}

/// One rostered player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterPlayer {
	/// Full player name.
	pub name: String,
	/// Display position such as `QB` or `WR,TE`.
	pub position: Option<String>,
	/// Roster slot such as `QB`, `W/R/T`, or `BN`.
	pub slot: Option<String>,
	/// Injury or availability status.
	pub status: Option<String>,
	/// Positions the player may fill.
	pub eligible_positions: Vec<String>,
	/// Numeric player id.
	pub player_id: Option<i64>,
	/// Offense, defense, or kicker grouping (`O`, `DT`, `K`).
	pub position_type: Option<String>,
}

/// `GET /v1/roster` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterResponse {
	/// Requested team key.
	pub team_key: String,
	/// Team display name.
	pub team_name: Option<String>,
	/// Requested week, if any.
	pub week: Option<u8>,
	/// Players on the roster.
	pub players: Vec<RosterPlayer>,
}

/// Waiver settings extracted from league settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiverSettings {
	/// Waiver type code.
	pub waiver_type: Option<String>,
	/// Waiver rule (for example `gametime`).
	pub waiver_rule: Option<String>,
	/// Whether the league uses a FAAB budget.
	pub uses_faab: Option<bool>,
	/// Time players remain on waivers.
	pub waiver_time: Option<i64>,
}

/// One entry of the waiver priority order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaiverPriority {
	/// Team display name.
	pub team_name: String,
	/// Yahoo team key.
	pub team_key: String,
	/// Priority (1 claims first).
	pub priority: Option<i64>,
}

/// A pending waiver claim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaiverClaim {
	/// Player name.
	pub player: String,
	/// `add` or `drop`.
	pub action_type: String,
	/// Team the player leaves.
	pub source_team_key: Option<String>,
	/// Team the player joins.
	pub destination_team_key: Option<String>,
	/// FAAB bid attached to the claim.
	pub faab_bid: Option<f64>,
}

/// `GET /v1/waivers` body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaiversResponse {
	/// League waiver settings.
	pub settings: WaiverSettings,
	/// Waiver priority order.
	pub priority: Vec<WaiverPriority>,
	/// Pending claims for the requested team.
	pub pending: Vec<WaiverClaim>,
}

/// An unrostered player.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AvailablePlayer {
	/// Numeric player id.
	pub player_id: Option<i64>,
	/// Full player name.
	pub name: String,
	/// Positions the player may fill.
	pub eligible_positions: Vec<String>,
	/// Percentage of leagues where the player is rostered.
	pub percent_owned: Option<f64>,
	/// Injury or availability status.
	pub status: Option<String>,
	/// Offense, defense, or kicker grouping.
	pub position_type: Option<String>,
}

/// `GET /v1/free-agents` body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FreeAgentsResponse {
	/// Team whose league was searched.
	pub team_key: String,
	/// Positions searched, in request order.
	pub positions: Vec<String>,
	/// Best available players per position.
	pub free_agents: BTreeMap<String, Vec<AvailablePlayer>>,
}
