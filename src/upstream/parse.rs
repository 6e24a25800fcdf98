//! Flattening of Yahoo's fragment-encoded JSON into gateway models.
//!
//! Yahoo encodes objects as arrays of single-key fragments (`[{"team_key":..},{"name":..}]`,
//! sometimes nested one level deeper) and lists as maps keyed by index plus a `count`
//! entry (`{"0":{..},"1":{..},"count":2}`). Every parser here is tolerant: missing
//! sections yield empty results instead of errors.

// self
use crate::{
	_prelude::*,
	upstream::models::{
		AvailablePlayer, League, LeagueTeam, RosterPlayer, WaiverClaim, WaiverPriority,
		WaiverSettings,
	},
};

/// Merges fragment arrays (at any nesting depth) into one object.
pub(crate) fn merge_fragments(value: &Value) -> Map<String, Value> {
	let mut merged = Map::new();

	merge_into(value, &mut merged);

	merged
}

fn merge_into(value: &Value, merged: &mut Map<String, Value>) {
	match value {
		Value::Object(fields) =>
			for (key, field) in fields {
				merged.insert(key.clone(), field.clone());
			},
		Value::Array(items) =>
			for item in items {
				merge_into(item, merged);
			},
		_ => {},
	}
}

/// Returns the elements of an index-keyed map (or a plain array) in index order.
pub(crate) fn indexed_items(value: &Value) -> Vec<&Value> {
	match value {
		Value::Object(fields) => {
			let mut items = fields
				.iter()
				.filter_map(|(key, item)| key.parse::<usize>().ok().map(|index| (index, item)))
				.collect::<Vec<_>>();

			items.sort_by_key(|(index, _)| *index);

			items.into_iter().map(|(_, item)| item).collect()
		},
		Value::Array(items) => items.iter().collect(),
		_ => Vec::new(),
	}
}

/// Collects every value stored under `key`, without descending into matches.
pub(crate) fn find_key<'a>(value: &'a Value, key: &str) -> Vec<&'a Value> {
	let mut found = Vec::new();

	find_key_into(value, key, &mut found);

	found
}

fn find_key_into<'a>(value: &'a Value, key: &str, found: &mut Vec<&'a Value>) {
	match value {
		Value::Object(fields) => {
			let mut entries = fields.iter().collect::<Vec<_>>();

			// Index-keyed maps must keep upstream order; `Map` sorts "10" before "2".
			entries.sort_by_key(|(name, _)| name.parse::<usize>().unwrap_or(usize::MAX));

			for (name, field) in entries {
				if name == key {
					found.push(field);
				} else {
					find_key_into(field, key, found);
				}
			}
		},
		Value::Array(items) =>
			for item in items {
				find_key_into(item, key, found);
			},
		_ => {},
	}
}

/// Parses leagues (with their teams when the payload carries `teams`).
pub(crate) fn leagues(payload: &Value) -> Vec<League> {
	find_key(payload, "league")
		.into_iter()
		.filter_map(|node| {
			let fields = merge_fragments(node);
			let league_key = text(&fields, "league_key")?;
			let league_id = text(&fields, "league_id").unwrap_or_else(|| {
				league_key.rsplit(".l.").next().unwrap_or(league_key.as_str()).to_owned()
			});

			Some(League {
				league_id,
				league_name: text(&fields, "name"),
				teams: fields.get("teams").map(teams).unwrap_or_default(),
				league_key,
			})
		})
		.collect()
}

/// Parses every `team` node under `payload`.
pub(crate) fn teams(payload: &Value) -> Vec<LeagueTeam> {
	find_key(payload, "team")
		.into_iter()
		.filter_map(|node| {
			let fields = merge_fragments(node);

			Some(LeagueTeam {
				team_key: text(&fields, "team_key")?,
				team_name: text(&fields, "name").unwrap_or_default(),
				waiver_priority: integer(&fields, "waiver_priority"),
			})
		})
		.collect()
}

/// Waiver priority order derived from a league's teams.
pub(crate) fn waiver_priority(payload: &Value) -> Vec<WaiverPriority> {
	teams(payload)
		.into_iter()
		.map(|team| WaiverPriority {
			team_name: team.team_name,
			team_key: team.team_key,
			priority: team.waiver_priority,
		})
		.collect()
}

/// Returns the team name and rostered players of a `team/{key}/roster` payload.
pub(crate) fn roster(payload: &Value) -> (Option<String>, Vec<RosterPlayer>) {
	let team = find_key(payload, "team").into_iter().next().map(merge_fragments).unwrap_or_default();
	let team_name = text(&team, "name");
	let players = team
		.get("roster")
		.map(|roster| {
			find_key(roster, "player")
				.into_iter()
				.map(|node| {
					let fields = merge_fragments(node);

					RosterPlayer {
						name: player_name(&fields).unwrap_or_default(),
						position: text(&fields, "display_position"),
						slot: fields
							.get("selected_position")
							.map(merge_fragments)
							.and_then(|selected| text(&selected, "position")),
						status: text(&fields, "status"),
						eligible_positions: eligible_positions(&fields),
						player_id: integer(&fields, "player_id"),
						position_type: text(&fields, "position_type"),
					}
				})
				.collect()
		})
		.unwrap_or_default();

	(team_name, players)
}

/// Extracts waiver settings from a `league/{key}/settings` payload.
pub(crate) fn waiver_settings(payload: &Value) -> WaiverSettings {
	let fields =
		find_key(payload, "settings").into_iter().next().map(merge_fragments).unwrap_or_default();

	WaiverSettings {
		waiver_type: text(&fields, "waiver_type"),
		waiver_rule: text(&fields, "waiver_rule"),
		uses_faab: flag(&fields, "uses_faab"),
		waiver_time: integer(&fields, "waiver_time"),
	}
}

/// Flattens waiver transactions into one claim per player action.
pub(crate) fn waiver_claims(payload: &Value) -> Vec<WaiverClaim> {
	let mut claims = Vec::new();

	for node in find_key(payload, "transaction") {
		let transaction = merge_fragments(node);
		let default_action = text(&transaction, "type").unwrap_or_else(|| "waiver".into());
		let faab_bid = decimal(&transaction, "faab_bid");
		let Some(players) = transaction.get("players") else {
			continue;
		};

		for player in indexed_items(players).into_iter().filter_map(|item| item.get("player")) {
			let fields = merge_fragments(player);
			let data = fields.get("transaction_data").map(merge_fragments).unwrap_or_default();

			claims.push(WaiverClaim {
				player: player_name(&fields).unwrap_or_default(),
				action_type: text(&data, "type").unwrap_or_else(|| default_action.clone()),
				source_team_key: text(&data, "source_team_key"),
				destination_team_key: text(&data, "destination_team_key"),
				faab_bid,
			});
		}
	}

	claims
}

/// Parses a `players` collection, including `percent_owned` when present.
pub(crate) fn available_players(payload: &Value) -> Vec<AvailablePlayer> {
	find_key(payload, "player")
		.into_iter()
		.map(|node| {
			let fields = merge_fragments(node);

			AvailablePlayer {
				player_id: integer(&fields, "player_id"),
				name: player_name(&fields).unwrap_or_default(),
				eligible_positions: eligible_positions(&fields),
				percent_owned: percent_owned(&fields),
				status: text(&fields, "status"),
				position_type: text(&fields, "position_type"),
			}
		})
		.collect()
}

/// Pulls Yahoo's `error.description` out of a failure body.
pub(crate) fn error_description(body: &[u8]) -> Option<String> {
	let payload = serde_json::from_slice::<Value>(body).ok()?;

	find_key(&payload, "description")
		.into_iter()
		.find_map(|value| value.as_str().map(str::trim).filter(|s| !s.is_empty()).map(str::to_owned))
}

fn text(fields: &Map<String, Value>, key: &str) -> Option<String> {
	match fields.get(key)? {
		Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
		Value::Number(n) => Some(n.to_string()),
		_ => None,
	}
}

fn integer(fields: &Map<String, Value>, key: &str) -> Option<i64> {
	match fields.get(key)? {
		Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn decimal(fields: &Map<String, Value>, key: &str) -> Option<f64> {
	match fields.get(key)? {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

fn flag(fields: &Map<String, Value>, key: &str) -> Option<bool> {
	match fields.get(key)? {
		Value::Bool(b) => Some(*b),
		Value::Number(n) => n.as_i64().map(|v| v != 0),
		Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
			"1" | "true" | "yes" => Some(true),
			"0" | "false" | "no" => Some(false),
			_ => None,
		},
		_ => None,
	}
}

fn player_name(fields: &Map<String, Value>) -> Option<String> {
	match fields.get("name")? {
		Value::Object(name) => name.get("full").and_then(Value::as_str).map(str::to_owned),
		Value::String(name) => Some(name.clone()),
		_ => None,
	}
}

fn eligible_positions(fields: &Map<String, Value>) -> Vec<String> {
	let mut positions = Vec::new();

	if let Some(value) = fields.get("eligible_positions") {
		collect_positions(value, &mut positions);
	}

	positions
}

fn collect_positions(value: &Value, positions: &mut Vec<String>) {
	match value {
		Value::String(position) => positions.push(position.clone()),
		Value::Array(items) =>
			for item in items {
				collect_positions(item, positions);
			},
		Value::Object(fields) =>
			if let Some(position) = fields.get("position") {
				collect_positions(position, positions);
			},
		_ => {},
	}
}

fn percent_owned(fields: &Map<String, Value>) -> Option<f64> {
	match fields.get("percent_owned")? {
		value @ (Value::Array(_) | Value::Object(_)) => decimal(&merge_fragments(value), "value"),
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	fn league_teams_payload() -> Value {
		json!({
			"fantasy_content": {
				"leagues": {
					"0": {
						"league": [
							{ "league_key": "423.l.12345", "league_id": "12345", "name": "League 12345" },
							{
								"teams": {
									"0": { "team": [[
										{ "team_key": "423.l.12345.t.7" },
										{ "team_id": "7" },
										{ "name": "Team Seven" },
										[],
										{ "waiver_priority": 3 }
									]] },
									"1": { "team": [[
										{ "team_key": "423.l.12345.t.8" },
										{ "name": "Team Eight" },
										{ "waiver_priority": "" }
									]] },
									"count": 2
								}
							}
						]
					},
					"count": 1
				}
			}
		})
	}

	#[test]
	fn merge_fragments_flattens_nested_arrays() {
		let merged = merge_fragments(&json!([[{ "a": 1 }, { "b": "x" }], { "c": true }]));

		assert_eq!(merged.get("a"), Some(&json!(1)));
		assert_eq!(merged.get("b"), Some(&json!("x")));
		assert_eq!(merged.get("c"), Some(&json!(true)));
	}

	#[test]
	fn indexed_items_follow_numeric_order() {
		let payload = json!({ "count": 3, "10": "c", "2": "b", "0": "a" });
		let items = indexed_items(&payload);

		assert_eq!(items, vec![&json!("a"), &json!("b"), &json!("c")]);
	}

	#[test]
	fn leagues_carry_teams() {
		let leagues = leagues(&league_teams_payload());

		assert_eq!(leagues.len(), 1);
		assert_eq!(leagues[0].league_key, "423.l.12345");
		assert_eq!(leagues[0].league_id, "12345");
		assert_eq!(leagues[0].league_name.as_deref(), Some("League 12345"));
		assert_eq!(leagues[0].teams.len(), 2);
		assert_eq!(leagues[0].teams[0].team_name, "Team Seven");
		assert_eq!(leagues[0].teams[0].waiver_priority, Some(3));
		assert_eq!(leagues[0].teams[1].waiver_priority, None);
	}

	#[test]
	fn league_listing_without_teams() {
		let payload = json!({
			"fantasy_content": { "users": { "0": { "user": [
				{ "guid": "GUID" },
				{ "games": { "0": { "game": [
					{ "game_key": "423", "code": "nfl" },
					{ "leagues": {
						"0": { "league": [{ "league_key": "423.l.1", "name": "One" }] },
						"1": { "league": [{ "league_key": "423.l.2", "league_id": "2", "name": "Two" }] },
						"count": 2
					} }
				] }, "count": 1 } }
			] }, "count": 1 } }
		});
		let leagues = leagues(&payload);

		assert_eq!(leagues.len(), 2);
		assert_eq!(leagues[0].league_id, "1");
		assert_eq!(leagues[1].league_name.as_deref(), Some("Two"));
		assert!(leagues[0].teams.is_empty());
	}

	#[test]
	fn roster_players_are_flattened() {
		let payload = json!({
			"fantasy_content": { "team": [
				[{ "team_key": "423.l.12345.t.7" }, { "name": "Team Seven" }],
				{ "roster": {
					"coverage_type": "week",
					"week": "3",
					"0": { "players": {
						"0": { "player": [
							[
								{ "player_key": "423.p.100" },
								{ "player_id": "100" },
								{ "name": { "full": "Patrick Mahomes", "first": "Patrick" } },
								{ "status": "Q" },
								{ "display_position": "QB" },
								{ "eligible_positions": [{ "position": "QB" }] },
								{ "position_type": "O" }
							],
							{ "selected_position": [{ "coverage_type": "week" }, { "position": "QB" }] }
						] },
						"1": { "player": [
							[
								{ "player_id": 200 },
								{ "name": { "full": "Travis Kelce" } },
								{ "display_position": "TE" },
								{ "eligible_positions": [{ "position": "TE" }, { "position": "W/R/T" }] }
							],
							{ "selected_position": [{ "position": "BN" }] }
						] },
						"count": 2
					} }
				} }
			] }
		});
		let (team_name, players) = roster(&payload);

		assert_eq!(team_name.as_deref(), Some("Team Seven"));
		assert_eq!(players.len(), 2);
		assert_eq!(players[0].name, "Patrick Mahomes");
		assert_eq!(players[0].position.as_deref(), Some("QB"));
		assert_eq!(players[0].slot.as_deref(), Some("QB"));
		assert_eq!(players[0].status.as_deref(), Some("Q"));
		assert_eq!(players[0].player_id, Some(100));
		assert_eq!(players[0].position_type.as_deref(), Some("O"));
		assert_eq!(players[1].slot.as_deref(), Some("BN"));
		assert_eq!(players[1].eligible_positions, vec!["TE".to_owned(), "W/R/T".to_owned()]);
		assert!(players[1].status.is_none());
	}

	#[test]
	fn waiver_settings_coerce_types() {
		let payload = json!({
			"fantasy_content": { "league": [
				{ "league_key": "423.l.12345" },
				{ "settings": [{
					"waiver_type": "FR",
					"waiver_rule": "gametime",
					"uses_faab": "1",
					"waiver_time": "2"
				}] }
			] }
		});
		let settings = waiver_settings(&payload);

		assert_eq!(settings.waiver_type.as_deref(), Some("FR"));
		assert_eq!(settings.waiver_rule.as_deref(), Some("gametime"));
		assert_eq!(settings.uses_faab, Some(true));
		assert_eq!(settings.waiver_time, Some(2));
	}

	#[test]
	fn waiver_claims_expand_player_actions() {
		let payload = json!({
			"fantasy_content": { "league": [
				{ "league_key": "423.l.12345" },
				{ "transactions": {
					"0": { "transaction": [
						{ "transaction_key": "423.l.12345.w.c.1", "type": "waiver", "status": "pending", "faab_bid": "12" },
						{ "players": {
							"0": { "player": [
								[{ "player_key": "423.p.1" }, { "name": { "full": "Added Player" } }],
								{ "transaction_data": [{
									"type": "add",
									"source_type": "waivers",
									"destination_type": "team",
									"destination_team_key": "423.l.12345.t.7"
								}] }
							] },
							"1": { "player": [
								[{ "player_key": "423.p.2" }, { "name": { "full": "Dropped Player" } }],
								{ "transaction_data": {
									"type": "drop",
									"source_team_key": "423.l.12345.t.7"
								} }
							] },
							"count": 2
						} }
					] },
					"count": 1
				} }
			] }
		});
		let claims = waiver_claims(&payload);

		assert_eq!(claims.len(), 2);
		assert_eq!(claims[0].player, "Added Player");
		assert_eq!(claims[0].action_type, "add");
		assert_eq!(claims[0].destination_team_key.as_deref(), Some("423.l.12345.t.7"));
		assert_eq!(claims[0].faab_bid, Some(12.0));
		assert_eq!(claims[1].action_type, "drop");
		assert_eq!(claims[1].source_team_key.as_deref(), Some("423.l.12345.t.7"));
	}

	#[test]
	fn available_players_read_percent_owned() {
		let payload = json!({
			"fantasy_content": { "league": [
				{ "league_key": "423.l.12345" },
				{ "players": {
					"0": { "player": [
						[
							{ "player_id": "300" },
							{ "name": { "full": "Backup Quarterback" } },
							{ "eligible_positions": [{ "position": "QB" }] },
							{ "position_type": "O" }
						],
						{ "percent_owned": [{ "coverage_type": "week" }, { "value": "45.5" }, { "delta": "1" }] }
					] },
					"count": 1
				} }
			] }
		});
		let players = available_players(&payload);

		assert_eq!(players.len(), 1);
		assert_eq!(players[0].player_id, Some(300));
		assert_eq!(players[0].percent_owned, Some(45.5));
		assert_eq!(players[0].eligible_positions, vec!["QB".to_owned()]);
	}

	#[test]
	fn missing_sections_yield_empty_results() {
		let empty = json!({ "fantasy_content": {} });

		assert!(leagues(&empty).is_empty());
		assert!(roster(&empty).1.is_empty());
		assert!(waiver_claims(&empty).is_empty());
		assert_eq!(waiver_settings(&empty), WaiverSettings::default());
	}

	#[test]
	fn error_description_reads_yahoo_errors() {
		let body = br#"{"error":{"lang":"en-us","description":"Please provide valid credentials.","detail":""}}"#;

		assert_eq!(error_description(body).as_deref(), Some("Please provide valid credentials."));
		assert!(error_description(b"<html>").is_none());
	}
}
