//! Strongly typed Yahoo resource keys enforced at every API boundary.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

macro_rules! def_key {
	($name:ident, $doc:literal, $kind:literal, $markers:expr) => {
		#[doc = $doc]
		#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
		#[serde(try_from = "String", into = "String")]
		pub struct $name(String);
		impl $name {
			/// Creates a new key after validating its shape.
			pub fn new(value: impl AsRef<str>) -> Result<Self, KeyError> {
				let view = value.as_ref();

				validate_view($kind, view, $markers)?;

				Ok(Self(view.to_owned()))
			}
		}
		impl Deref for $name {
			type Target = str;

			fn deref(&self) -> &Self::Target {
				&self.0
			}
		}
		impl AsRef<str> for $name {
			fn as_ref(&self) -> &str {
				&self.0
			}
		}
		impl From<$name> for String {
			fn from(value: $name) -> Self {
				value.0
			}
		}
		impl TryFrom<String> for $name {
			type Error = KeyError;

			fn try_from(value: String) -> Result<Self, Self::Error> {
				validate_view($kind, &value, $markers)?;

				Ok(Self(value))
			}
		}
		impl Borrow<str> for $name {
			fn borrow(&self) -> &str {
				&self.0
			}
		}
		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				write!(f, concat!($kind, "({})"), self.0)
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(&self.0)
			}
		}
		impl FromStr for $name {
			type Err = KeyError;

			fn from_str(s: &str) -> Result<Self, Self::Err> {
				Self::new(s)
			}
		}
	};
}

const KEY_MAX_LEN: usize = 64;

/// Error returned when key validation fails.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ThisError)]
pub enum KeyError {
	/// The key was empty.
	#[error("{kind} key cannot be empty.")]
	Empty {
		/// Kind of key (league, team).
		kind: &'static str,
	},
	/// The key does not follow Yahoo's dotted layout.
	#[error("{kind} key must look like {expected}.")]
	Malformed {
		/// Kind of key (league, team).
		kind: &'static str,
		/// Human-readable layout hint.
		expected: &'static str,
	},
	/// The key exceeded the allowed character count.
	#[error("{kind} key exceeds {max} characters.")]
	TooLong {
		/// Kind of key (league, team).
		kind: &'static str,
		/// Maximum permitted character count.
		max: usize,
	},
}

def_key! { LeagueKey, "Yahoo league key such as `423.l.12345`.", "League", &["l"] }
def_key! { TeamKey, "Yahoo team key such as `423.l.12345.t.7`.", "Team", &["l", "t"] }

impl TeamKey {
	/// Returns the league that owns this team.
	pub fn league_key(&self) -> LeagueKey {
		let cut = self.0.rfind(".t.").unwrap_or(self.0.len());

		LeagueKey(self.0[..cut].to_owned())
	}
}

fn validate_view(kind: &'static str, view: &str, markers: &[&str]) -> Result<(), KeyError> {
	if view.is_empty() {
		return Err(KeyError::Empty { kind });
	}
	if view.len() > KEY_MAX_LEN {
		return Err(KeyError::TooLong { kind, max: KEY_MAX_LEN });
	}

	let expected = if markers.len() == 1 { "<game>.l.<league>" } else { "<game>.l.<league>.t.<team>" };
	let parts = view.split('.').collect::<Vec<_>>();

	if parts.len() != 1 + markers.len() * 2 || !is_number(parts[0]) {
		return Err(KeyError::Malformed { kind, expected });
	}

	for (idx, marker) in markers.iter().enumerate() {
		if parts[1 + idx * 2] != *marker || !is_number(parts[2 + idx * 2]) {
			return Err(KeyError::Malformed { kind, expected });
		}
	}

	Ok(())
}

fn is_number(part: &str) -> bool {
	!part.is_empty() && part.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn keys_validate_layout() {
		let team = TeamKey::new("423.l.12345.t.7").expect("Team fixture should be valid.");

		assert_eq!(team.as_ref(), "423.l.12345.t.7");
		assert_eq!(team.league_key().as_ref(), "423.l.12345");
		assert!(TeamKey::new("423.l.12345").is_err());
		assert!(TeamKey::new("nfl.l.1.t.2").is_err());
		assert!(TeamKey::new("423.l.12345.t.").is_err());
		assert!(LeagueKey::new("423.l.12345").is_ok());
		assert!(LeagueKey::new("423.l.12345.t.7").is_err());
		assert!(matches!(LeagueKey::new(""), Err(KeyError::Empty { kind: "League" })));
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let team: TeamKey = serde_json::from_str("\"461.l.456.t.2\"")
			.expect("Team key should deserialize successfully.");

		assert_eq!(team.as_ref(), "461.l.456.t.2");
		assert!(serde_json::from_str::<TeamKey>("\"bad key\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<LeagueKey, u8> = HashMap::from_iter([(
			LeagueKey::new("461.l.123").expect("League used for lookup should be valid."),
			3_u8,
		)]);

		assert_eq!(map.get("461.l.123"), Some(&3));
	}
}
