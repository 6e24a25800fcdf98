//! League and team display names cached between Fantasy API calls.

// std
use std::{num::NonZeroUsize, time::Instant};
// crates.io
use lru::LruCache;
// self
use crate::{_prelude::*, obs::ServiceMetrics};

/// Default number of names kept before the least recently used entry is evicted.
pub const NAME_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
	Some(n) => n,
	None => unreachable!(),
};

#[derive(Clone, Debug)]
struct NameEntry {
	name: String,
	stored_at: Instant,
}

/// LRU of names keyed by league or team key, with a fixed time-to-live.
#[derive(Debug)]
pub struct NameCache {
	entries: Mutex<LruCache<String, NameEntry>>,
	ttl: StdDuration,
	metrics: Arc<ServiceMetrics>,
}
impl NameCache {
	/// Creates a cache with the default capacity.
	pub fn new(ttl: StdDuration, metrics: Arc<ServiceMetrics>) -> Self {
		Self::with_capacity(NAME_CACHE_CAPACITY, ttl, metrics)
	}

	/// Creates a cache holding at most `capacity` names.
	pub fn with_capacity(
		capacity: NonZeroUsize,
		ttl: StdDuration,
		metrics: Arc<ServiceMetrics>,
	) -> Self {
		Self { entries: Mutex::new(LruCache::new(capacity)), ttl, metrics }
	}

	/// Stores a name; blank names are ignored.
	pub fn insert(&self, key: &str, name: &str) {
		if key.is_empty() || name.trim().is_empty() {
			return;
		}

		self.entries
			.lock()
			.push(key.to_owned(), NameEntry { name: name.to_owned(), stored_at: Instant::now() });
	}

	/// Returns a fresh name and records the lookup as a hit or miss.
	pub fn get(&self, key: &str) -> Option<String> {
		let mut entries = self.entries.lock();
		let hit = entries
			.get(key)
			.filter(|entry| entry.stored_at.elapsed() < self.ttl)
			.map(|entry| entry.name.clone());

		if hit.is_none() {
			entries.pop(key);
		}

		drop(entries);

		self.metrics.record_name_cache(hit.is_some());

		hit
	}

	/// Number of cached entries, including ones that have expired but were not read yet.
	pub fn len(&self) -> usize {
		self.entries.lock().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
