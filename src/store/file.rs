//! File-backed [`CredentialStore`] compatible with Yahoo OAuth helper tooling.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
	time::SystemTime,
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	store::{self, CompareAndSwapOutcome, CredentialStore, StoreError, StoreFuture},
};

#[derive(Debug, Default)]
struct Snapshot {
	credential: Option<Credential>,
	modified: Option<SystemTime>,
	loaded: bool,
}

/// Persists the credential as a flat JSON document after each mutation.
///
/// The file is re-read whenever its modification time changes, so an operator can
/// re-seed it while the gateway is running.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Creates a store for the provided path; no I/O happens until first use.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into(), inner: Default::default() }
	}

	/// Path of the backing credential file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn current(&self) -> Result<Option<Credential>, StoreError> {
		let modified = Self::modified(&self.path)?;

		{
			let guard = self.inner.read();

			if guard.loaded && guard.modified == modified {
				return Ok(guard.credential.clone());
			}
		}

		let mut guard = self.inner.write();

		self.reload_locked(&mut guard)?;

		Ok(guard.credential.clone())
	}

	fn reload_locked(&self, snapshot: &mut Snapshot) -> Result<(), StoreError> {
		let modified = Self::modified(&self.path)?;

		if snapshot.loaded && snapshot.modified == modified {
			return Ok(());
		}

		snapshot.credential = Self::read_file(&self.path)?;
		snapshot.modified = modified;
		snapshot.loaded = true;

		Ok(())
	}

	fn modified(path: &Path) -> Result<Option<SystemTime>, StoreError> {
		match path.metadata() {
			Ok(meta) => Ok(meta.modified().ok()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to inspect {}: {e}", path.display()),
			}),
		}
	}

	fn read_file(path: &Path) -> Result<Option<Credential>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create credential directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	/// Renders the document with sorted keys, two-space indentation, and a trailing newline.
	fn render(credential: &Credential) -> Result<Vec<u8>, StoreError> {
		let to_message =
			|e: serde_json::Error| format!("Failed to serialize credential document: {e}");
		let value = serde_json::to_value(credential)
			.map_err(|e| StoreError::Serialization { message: to_message(e) })?;
		let mut rendered = serde_json::to_vec_pretty(&value)
			.map_err(|e| StoreError::Serialization { message: to_message(e) })?;

		rendered.push(b'\n');

		Ok(rendered)
	}

	fn persist_locked(&self, snapshot: &mut Snapshot) -> Result<(), StoreError> {
		let Some(credential) = snapshot.credential.as_ref() else {
			return Ok(());
		};

		Self::ensure_parent_exists(&self.path)?;

		let serialized = Self::render(credential)?;
		let mut tmp_name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();

		tmp_name.push(".tmp");

		let tmp_path = self.path.with_file_name(tmp_name);

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			restrict_permissions(&file).map_err(|e| StoreError::Backend {
				message: format!("Failed to restrict permissions on {}: {e}", tmp_path.display()),
			})?;
			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| {
			let _ = fs::remove_file(&tmp_path);

			StoreError::Backend {
				message: format!("Failed to replace {}: {e}", self.path.display()),
			}
		})?;

		snapshot.modified = Self::modified(&self.path)?;

		Ok(())
	}
}
impl CredentialStore for FileStore {
	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		Box::pin(async move { self.current() })
	}

	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			// The in-memory copy is updated first so a read-only mount still serves fresh tokens.
			guard.credential = Some(credential);
			guard.loaded = true;

			self.persist_locked(&mut guard)
		})
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		expected_refresh: Option<&'a str>,
		replacement: Credential,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			self.reload_locked(&mut guard)?;

			let outcome = store::cas_outcome(guard.credential.as_ref(), expected_refresh);

			if matches!(outcome, CompareAndSwapOutcome::Updated) {
				guard.credential = Some(replacement);
				guard.loaded = true;

				self.persist_locked(&mut guard)?;
			}

			Ok(outcome)
		})
	}
}

#[cfg(unix)]
fn restrict_permissions(file: &File) -> std::io::Result<()> {
	// std
	use std::os::unix::fs::PermissionsExt;

	file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_: &File) -> std::io::Result<()> {
	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn credential() -> Credential {
		Credential {
			consumer_key: Some("ck".into()),
			consumer_secret: Some("cs".into()),
			access_token: Some("access-token".into()),
			refresh_token: Some("refresh-token".into()),
			token_type: Some("bearer".into()),
			token_time: Some(1_700_000_000.25),
			expires_in: Some(3_600),
			..Default::default()
		}
	}

	#[tokio::test]
	async fn missing_file_loads_as_empty() {
		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let store = FileStore::new(dir.path().join("absent.json"));

		assert!(store.load().await.expect("Loading a missing file should succeed.").is_none());
	}

	#[tokio::test]
	async fn save_and_reload_round_trip() {
		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let path = dir.path().join("nested").join("oauth2.json");
		let store = FileStore::new(&path);

		store.save(credential()).await.expect("Saving the credential should succeed.");

		let reopened = FileStore::new(&path);
		let loaded = reopened
			.load()
			.await
			.expect("Loading the credential should succeed.")
			.expect("Credential should be present after save.");

		assert_eq!(loaded, credential());

		let raw = fs::read_to_string(&path).expect("Credential file should be readable.");

		assert!(raw.ends_with("}\n"));
		assert!(raw.find("\"access_token\"") < raw.find("\"consumer_key\""));
		assert!(raw.contains("\n  \"token_type\": \"bearer\""));
	}

	#[cfg(unix)]
	#[tokio::test]
	async fn saved_file_is_owner_only() {
		// std
		use std::os::unix::fs::PermissionsExt;

		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let path = dir.path().join("oauth2.json");

		FileStore::new(&path).save(credential()).await.expect("Saving should succeed.");

		let mode = fs::metadata(&path).expect("Metadata should be readable.").permissions().mode();

		assert_eq!(mode & 0o777, 0o600);
	}

	#[tokio::test]
	async fn invalid_json_is_a_serialization_error() {
		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let path = dir.path().join("oauth2.json");

		fs::write(&path, "{not json").expect("Fixture should be written.");

		let err = FileStore::new(&path).load().await.expect_err("Invalid JSON must be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));
	}

	#[tokio::test]
	async fn compare_and_swap_detects_rotation() {
		let dir = tempfile::tempdir().expect("Temporary directory should be created.");
		let store = FileStore::new(dir.path().join("oauth2.json"));

		store.save(credential()).await.expect("Saving should succeed.");

		let rotated = Credential { refresh_token: Some("refresh-2".into()), ..credential() };
		let outcome = store
			.compare_and_swap_refresh(Some("stale"), rotated.clone())
			.await
			.expect("CAS should not fail.");

		assert_eq!(outcome, CompareAndSwapOutcome::RefreshMismatch);

		let outcome = store
			.compare_and_swap_refresh(Some("refresh-token"), rotated)
			.await
			.expect("CAS should not fail.");

		assert_eq!(outcome, CompareAndSwapOutcome::Updated);
	}
}
