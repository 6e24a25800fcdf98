//! Query-string parsing with field-level validation failures.

// std
use std::ops::RangeInclusive;
// self
use crate::{
	_prelude::*,
	api::ApiError,
	auth::{LeagueKey, TeamKey},
	upstream::DEFAULT_POSITIONS,
};

const SEASONS: RangeInclusive<u16> = 2_000..=2_100;
const WEEKS: RangeInclusive<u8> = 1..=18;
const LIMITS: RangeInclusive<u8> = 1..=50;
const DEFAULT_LIMIT: u8 = 25;

/// Decoded query pairs plus the failures collected while reading them.
#[derive(Debug, Default)]
pub(crate) struct Query {
	pairs: Vec<(String, String)>,
	failures: Vec<(&'static str, String)>,
}
impl Query {
	pub(crate) fn parse(raw: Option<&str>) -> Self {
		let pairs = raw
			.map(|raw| url::form_urlencoded::parse(raw.as_bytes()).into_owned().collect())
			.unwrap_or_default();

		Self { pairs, failures: Vec::new() }
	}

	fn first(&self, key: &str) -> Option<&str> {
		self.pairs
			.iter()
			.find(|(name, value)| name == key && !value.trim().is_empty())
			.map(|(_, value)| value.trim())
	}

	pub(crate) fn text(&self, key: &str) -> Option<String> {
		self.first(key).map(str::to_owned)
	}

	fn all(&self, key: &str) -> Vec<&str> {
		self.pairs
			.iter()
			.filter(|(name, _)| name == key)
			.flat_map(|(_, value)| value.split(','))
			.map(str::trim)
			.filter(|value| !value.is_empty())
			.collect()
	}

	fn fail(&mut self, field: &'static str, reason: impl Into<String>) {
		self.failures.push((field, reason.into()));
	}

	fn number<T>(&mut self, field: &'static str, range: RangeInclusive<T>) -> Option<T>
	where
		T: Copy + Display + FromStr + PartialOrd,
	{
		let raw = self.first(field)?;
		let parsed = raw.parse::<T>().ok().filter(|value| range.contains(value));

		if parsed.is_none() {
			self.fail(
				field,
				format!("must be an integer between {} and {}", range.start(), range.end()),
			);
		}

		parsed
	}

	pub(crate) fn season(&mut self) -> Option<u16> {
		self.number("nfl_season", SEASONS)
	}

	pub(crate) fn week(&mut self) -> Option<u8> {
		self.number("week", WEEKS)
	}

	pub(crate) fn limit(&mut self) -> u8 {
		self.number("limit", LIMITS).unwrap_or(DEFAULT_LIMIT)
	}

	pub(crate) fn team_key(&mut self) -> Option<TeamKey> {
		let Some(raw) = self.first("team_key") else {
			self.fail("team_key", "field required");

			return None;
		};

		match TeamKey::new(raw) {
			Ok(key) => Some(key),
			Err(e) => {
				self.fail("team_key", e.to_string());

				None
			},
		}
	}

	pub(crate) fn league_key(&mut self) -> Option<LeagueKey> {
		let raw = self.first("league_key")?;

		match LeagueKey::new(raw) {
			Ok(key) => Some(key),
			Err(e) => {
				self.fail("league_key", e.to_string());

				None
			},
		}
	}

	/// Upper-cased, de-duplicated positions (repeated or comma-separated).
	pub(crate) fn positions(&mut self) -> Vec<String> {
		let mut positions = Vec::<String>::new();
		let mut invalid = Vec::new();

		for raw in self.all("positions") {
			let position = raw.to_ascii_uppercase();

			if position.len() > 8 || !position.chars().all(|c| c.is_ascii_alphanumeric()) {
				invalid.push(raw.to_owned());
			} else if !positions.contains(&position) {
				positions.push(position);
			}
		}

		for raw in invalid {
			self.fail("positions", format!("`{raw}` is not a roster position"));
		}

		if positions.is_empty() {
			positions = DEFAULT_POSITIONS.iter().map(|position| (*position).to_owned()).collect();
		}

		positions
	}

	/// Returns the collected failures as a single 422.
	pub(crate) fn finish(self) -> Result<(), ApiError> {
		self.finish_with(Some(()))
	}

	/// Like [`Query::finish`], but also unwraps a required field read earlier.
	///
	/// Readers of required fields record a failure whenever they return `None`.
	pub(crate) fn finish_with<T>(self, required: Option<T>) -> Result<T, ApiError> {
		match required {
			Some(value) if self.failures.is_empty() => Ok(value),
			_ => Err(ApiError::validation(self.failures)),
		}
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use axum::http::StatusCode;
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn valid_roster_query() {
		let mut query = Query::parse(Some("team_key=423.l.12345.t.7&week=3"));
		let team_key = query.team_key();
		let week = query.week();

		assert!(query.finish().is_ok());
		assert_eq!(team_key.as_deref(), Some("423.l.12345.t.7"));
		assert_eq!(week, Some(3));
	}

	#[test]
	fn failures_are_collected_per_field() {
		let mut query = Query::parse(Some("team_key=bad&week=19"));

		query.team_key();
		query.week();

		let error = query.finish().expect_err("Invalid query should fail.");
		let details = error.body.details.expect("Validation details should be present.");
		let fields = details
			.as_array()
			.expect("Details should be an array.")
			.iter()
			.filter_map(|detail| detail.get("field").and_then(Value::as_str))
			.collect::<Vec<_>>();

		assert_eq!(fields, vec!["team_key", "week"]);
	}

	#[test]
	fn missing_team_key_is_required() {
		let mut query = Query::parse(None);
		let team_key = query.team_key();

		assert!(team_key.is_none());

		let error = query.finish_with(team_key).expect_err("Missing team key should fail.");

		assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(
			error.body.details,
			Some(json!([{ "field": "team_key", "reason": "field required" }]))
		);
	}

	#[test]
	fn required_field_is_returned_when_query_is_valid() {
		let mut query = Query::parse(Some("team_key=423.l.12345.t.7"));
		let team_key = query.team_key();
		let team_key = query.finish_with(team_key).expect("Valid team key should be returned.");

		assert_eq!(&*team_key, "423.l.12345.t.7");
	}

	#[test]
	fn positions_are_normalized() {
		let mut query = Query::parse(Some("positions=qb&positions=wr,te&positions=QB"));

		assert_eq!(query.positions(), vec!["QB".to_owned(), "WR".to_owned(), "TE".to_owned()]);
		assert!(query.finish().is_ok());

		let mut defaults = Query::parse(None);

		assert_eq!(defaults.positions(), vec!["QB", "RB", "WR", "TE"]);
		assert_eq!(defaults.limit(), 25);
	}

	#[test]
	fn invalid_position_is_rejected() {
		let mut query = Query::parse(Some("positions=W%2FR"));

		query.positions();

		assert!(query.finish().is_err());
	}

	#[test]
	fn season_range_is_enforced() {
		let mut query = Query::parse(Some("nfl_season=1999"));

		assert!(query.season().is_none());
		assert!(query.finish().is_err());
	}
}
