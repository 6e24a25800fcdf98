//! Configured favorite teams and their enrichment with cached names.

// self
use crate::{
	_prelude::*,
	auth::{LeagueKey, TeamKey},
	error::ConfigError,
	upstream::FantasyClient,
};

/// A configured shortcut to one team.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
	/// Friendly name (`fav{n}` unless configured).
	pub alias: String,
	/// League that owns the team.
	pub league_key: LeagueKey,
	/// Team key.
	pub team_key: TeamKey,
}

/// A favorite with the names the gateway could resolve.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteView {
	/// League key.
	pub league_key: String,
	/// Team key.
	pub team_key: String,
	/// Friendly name.
	pub alias: String,
	/// Team display name, when known.
	pub team_name: Option<String>,
	/// League display name, when known.
	pub league_name: Option<String>,
}
impl From<&Favorite> for FavoriteView {
	fn from(favorite: &Favorite) -> Self {
		Self {
			league_key: favorite.league_key.to_string(),
			team_key: favorite.team_key.to_string(),
			alias: favorite.alias.clone(),
			team_name: None,
			league_name: None,
		}
	}
}

/// `GET /v1/favorites` body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoritesResponse {
	/// Favorites in configuration order.
	pub favorites: Vec<FavoriteView>,
}

/// Parses `FAVORITE_TEAMS`.
///
/// Entries are separated by `;` (or `,` when no `;` is present) and take the form
/// `[Alias@]league_key|team_key`, `[Alias@]league_key:team_key`, or `[Alias@]team_key`.
pub fn parse_favorites(raw: &str) -> Result<Vec<Favorite>, ConfigError> {
	let separator = if raw.contains(';') { ';' } else { ',' };

	raw.split(separator)
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.enumerate()
		.map(|(index, entry)| parse_entry(index + 1, entry))
		.collect()
}

fn parse_entry(position: usize, entry: &str) -> Result<Favorite, ConfigError> {
	let invalid =
		|reason: String| ConfigError::InvalidFavorite { entry: entry.to_owned(), reason };
	let (alias, pair) = match entry.split_once('@') {
		Some((alias, pair)) => (alias.trim(), pair.trim()),
		None => ("", entry),
	};
	let (league, team) = match pair.split_once('|').or_else(|| pair.split_once(':')) {
		Some((league, team)) => (league.trim(), team.trim()),
		None => ("", pair),
	};
	let team_key = TeamKey::new(team).map_err(|e| invalid(e.to_string()))?;
	let league_key = if league.is_empty() {
		team_key.league_key()
	} else {
		let league_key = LeagueKey::new(league).map_err(|e| invalid(e.to_string()))?;

		if team_key.league_key() != league_key {
			return Err(invalid(format!("team {team_key} does not belong to league {league_key}")));
		}

		league_key
	};
	let alias = if alias.is_empty() { format!("fav{position}") } else { alias.to_owned() };

	Ok(Favorite { alias, league_key, team_key })
}

/// Resolves configured favorites against the name cache.
#[derive(Clone, Debug, Default)]
pub struct FavoritesResolver {
	favorites: Vec<Favorite>,
}
impl FavoritesResolver {
	/// Wraps the configured favorites.
	pub fn new(favorites: Vec<Favorite>) -> Self {
		Self { favorites }
	}

	/// Configured favorites in order.
	pub fn favorites(&self) -> &[Favorite] {
		&self.favorites
	}

	/// Enriches favorites with team and league names.
	///
	/// A cache miss triggers one `list_teams` call. If that call fails the favorites are
	/// returned without names; this never fails.
	pub async fn resolve(&self, client: &FantasyClient) -> FavoritesResponse {
		if self.favorites.is_empty() {
			return FavoritesResponse::default();
		}

		let mut favorites = self.lookup(client);

		if favorites.iter().any(|view| view.team_name.is_none() || view.league_name.is_none()) {
			match client.list_teams(None).await {
				Ok(_) => favorites = self.lookup(client),
				Err(e) => {
					tracing::warn!(error = %e, "favorites enrichment failed; returning unenriched favorites");
				},
			}
		}

		FavoritesResponse { favorites }
	}

	fn lookup(&self, client: &FantasyClient) -> Vec<FavoriteView> {
		self.favorites
			.iter()
			.map(|favorite| FavoriteView {
				team_name: client.names().get(&favorite.team_key),
				league_name: client.names().get(&favorite.league_key),
				..FavoriteView::from(favorite)
			})
			.collect()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn parses_aliases_and_derives_leagues() {
		let favorites = parse_favorites("Alias One@461.l.123|461.l.123.t.1;461.l.456.t.2")
			.expect("Favorites should parse.");

		assert_eq!(favorites.len(), 2);
		assert_eq!(favorites[0].alias, "Alias One");
		assert_eq!(favorites[0].league_key.as_ref(), "461.l.123");
		assert_eq!(favorites[0].team_key.as_ref(), "461.l.123.t.1");
		assert_eq!(favorites[1].alias, "fav2");
		assert_eq!(favorites[1].league_key.as_ref(), "461.l.456");
	}

	#[test]
	fn commas_and_colons_are_accepted() {
		let favorites =
			parse_favorites("423.l.1:423.l.1.t.2, 423.l.9.t.3").expect("Favorites should parse.");

		assert_eq!(favorites.len(), 2);
		assert_eq!(favorites[0].team_key.as_ref(), "423.l.1.t.2");
		assert_eq!(favorites[1].alias, "fav2");
	}

	#[test]
	fn empty_input_yields_nothing() {
		assert!(parse_favorites("").expect("Empty input should parse.").is_empty());
		assert!(parse_favorites(" ; ;").expect("Blank entries should be skipped.").is_empty());
	}

	#[test]
	fn mismatched_league_is_rejected() {
		let err = parse_favorites("423.l.1|423.l.2.t.3").expect_err("Mismatched league should fail.");

		assert!(matches!(err, ConfigError::InvalidFavorite { .. }));
	}

	#[test]
	fn malformed_team_key_is_rejected() {
		let err = parse_favorites("My Team@not-a-team").expect_err("Malformed key should fail.");

		assert!(matches!(err, ConfigError::InvalidFavorite { ref entry, .. } if entry == "My Team@not-a-team"));
	}
}
