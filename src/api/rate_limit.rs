//! Per-client token buckets.

// std
use std::{net::SocketAddr, time::Instant};
// crates.io
use axum::{
	extract::{ConnectInfo, Request, State},
	middleware::Next,
	response::{IntoResponse, Response},
};
use dashmap::DashMap;
// self
use crate::{
	_prelude::*,
	api::{ApiError, AppState},
};

const UNKNOWN_CLIENT: &str = "unknown";
const PRUNE_THRESHOLD: usize = 4_096;

#[derive(Clone, Copy, Debug)]
struct Bucket {
	tokens: f64,
	updated: Instant,
}

/// Token-bucket limiter keyed by client IP.
///
/// Each client starts with `burst` tokens and regains `per_min / 60` tokens per second.
#[derive(Debug)]
pub struct RateLimiter {
	buckets: DashMap<String, Bucket>,
	capacity: f64,
	refill_per_sec: f64,
}
impl RateLimiter {
	/// Creates a limiter; `per_min == 0` disables limiting.
	pub fn new(per_min: u32, burst: u32) -> Self {
		Self {
			buckets: DashMap::new(),
			capacity: f64::from(burst.max(1)),
			refill_per_sec: f64::from(per_min) / 60.0,
		}
	}

	/// Returns `true` when requests are limited at all.
	pub fn is_enabled(&self) -> bool {
		self.refill_per_sec > 0.0
	}

	/// Takes one token for `client`, or returns how long until one is available.
	pub fn check(&self, client: &str) -> Result<(), StdDuration> {
		self.check_at(client, Instant::now())
	}

	fn check_at(&self, client: &str, now: Instant) -> Result<(), StdDuration> {
		if !self.is_enabled() {
			return Ok(());
		}
		if self.buckets.len() > PRUNE_THRESHOLD {
			self.prune(now);
		}

		let mut bucket = self
			.buckets
			.entry(client.to_owned())
			.or_insert(Bucket { tokens: self.capacity, updated: now });
		let elapsed = now.saturating_duration_since(bucket.updated).as_secs_f64();

		bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.capacity);
		bucket.updated = now;

		if bucket.tokens >= 1.0 {
			bucket.tokens -= 1.0;

			Ok(())
		} else {
			Err(StdDuration::from_secs_f64((1.0 - bucket.tokens) / self.refill_per_sec))
		}
	}

	// Buckets that would be full again carry no state worth keeping.
	fn prune(&self, now: Instant) {
		let refill_window = self.capacity / self.refill_per_sec;

		self.buckets.retain(|_, bucket| {
			now.saturating_duration_since(bucket.updated).as_secs_f64() < refill_window
		});
	}
}

pub(crate) async fn enforce(State(state): State<AppState>, request: Request, next: Next) -> Response {
	let client = request
		.extensions()
		.get::<ConnectInfo<SocketAddr>>()
		.map(|ConnectInfo(addr)| addr.ip().to_string())
		.unwrap_or_else(|| UNKNOWN_CLIENT.to_owned());

	match state.limiter.check(&client) {
		Ok(()) => next.run(request).await,
		Err(retry_after) => {
			state.metrics.record_rate_limited();

			tracing::debug!(client = %client, "rate limit exceeded");

			ApiError::rate_limited(retry_after).into_response()
		},
	}
}
