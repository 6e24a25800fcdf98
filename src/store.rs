//! Storage contracts and built-in stores for the gateway's OAuth credential.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Credential, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the single credential the gateway operates on.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Loads the current credential, if one exists.
	fn load(&self) -> StoreFuture<'_, Option<Credential>>;

	/// Persists or replaces the credential.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Atomically replaces the credential if its refresh token still matches `expected_refresh`.
	fn compare_and_swap_refresh<'a>(
		&'a self,
		expected_refresh: Option<&'a str>,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh secret matched the expected value and the credential was updated.
	Updated,
	/// A credential exists but another writer rotated its refresh token first.
	RefreshMismatch,
	/// No credential was stored.
	Missing,
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// The credential document could not be encoded or decoded.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Filesystem or backend failure.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

pub(crate) fn refresh_matches(current: Option<&TokenSecret>, expected: Option<&str>) -> bool {
	match (current.map(TokenSecret::expose), expected) {
		(None, None) => true,
		(Some(cur), Some(exp)) => cur == exp,
		_ => false,
	}
}

pub(crate) fn cas_outcome(
	current: Option<&Credential>,
	expected_refresh: Option<&str>,
) -> CompareAndSwapOutcome {
	match current {
		Some(existing) if refresh_matches(existing.refresh_token.as_ref(), expected_refresh) =>
			CompareAndSwapOutcome::Updated,
		Some(_) => CompareAndSwapOutcome::RefreshMismatch,
		None => CompareAndSwapOutcome::Missing,
	}
}
