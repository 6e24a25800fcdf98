//! Thread-safe in-memory [`CredentialStore`] for tests and ephemeral deployments.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{self, CompareAndSwapOutcome, CredentialStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<Credential>>>;

/// Storage backend that keeps the credential in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store pre-seeded with `credential`.
	pub fn with_credential(credential: Credential) -> Self {
		Self(Arc::new(RwLock::new(Some(credential))))
	}

	fn cas_now(
		slot: Slot,
		expected_refresh: Option<&str>,
		replacement: Credential,
	) -> CompareAndSwapOutcome {
		let mut guard = slot.write();
		let outcome = store::cas_outcome(guard.as_ref(), expected_refresh);

		if matches!(outcome, CompareAndSwapOutcome::Updated) {
			*guard = Some(replacement);
		}

		outcome
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(credential);

			Ok(())
		})
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		expected_refresh: Option<&'a str>,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::cas_now(slot, expected_refresh, replacement)) })
	}
}
