// crates.io
use metrics::{Recorder, counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, FlowOutcome},
};

const FLOW_TOTAL: &str = "fantasy_gateway_flow_total";
const HTTP_REQUESTS_TOTAL: &str = "fantasy_gateway_http_requests_total";
const HTTP_REQUEST_DURATION: &str = "fantasy_gateway_http_request_duration_seconds";
const RATE_LIMITED_TOTAL: &str = "fantasy_gateway_rate_limited_total";
const NAME_CACHE_HITS_TOTAL: &str = "fantasy_gateway_name_cache_hits_total";
const NAME_CACHE_MISSES_TOTAL: &str = "fantasy_gateway_name_cache_misses_total";

/// Metrics registry served by `/metrics`.
///
/// Each registry owns its own Prometheus recorder and records through it as a local recorder,
/// so several application states (one per test, for instance) never share counters.
pub struct ServiceMetrics {
	recorder: PrometheusRecorder,
	handle: PrometheusHandle,
}
impl ServiceMetrics {
	/// Creates an empty registry.
	pub fn new() -> Self {
		let recorder = PrometheusBuilder::new().build_recorder();
		let handle = recorder.handle();
		let metrics = Self { recorder, handle };

		metrics.record(|| {
			describe_counter!(FLOW_TOTAL, "OAuth and upstream flow outcomes.");
			describe_counter!(HTTP_REQUESTS_TOTAL, "HTTP requests by matched route and status.");
			describe_histogram!(HTTP_REQUEST_DURATION, "HTTP request latency by matched route.");
			describe_counter!(RATE_LIMITED_TOTAL, "Requests rejected by the rate limiter.");
			describe_counter!(NAME_CACHE_HITS_TOTAL, "Name cache lookups that found a fresh entry.");
			describe_counter!(NAME_CACHE_MISSES_TOTAL, "Name cache lookups that missed.");
		});

		metrics
	}

	fn record<T>(&self, f: impl FnOnce() -> T) -> T {
		metrics::with_local_recorder(&self.recorder as &dyn Recorder, f)
	}

	/// Records a flow outcome.
	pub fn record_flow(&self, kind: FlowKind, outcome: FlowOutcome) {
		self.record(|| {
			counter!(FLOW_TOTAL, "flow" => kind.as_str(), "outcome" => outcome.as_str()).increment(1)
		});
	}

	/// Records a completed HTTP request against its matched route.
	pub fn record_request(&self, route: &str, status: u16, latency: StdDuration) {
		let route = route.to_owned();

		self.record(|| {
			counter!(HTTP_REQUESTS_TOTAL, "route" => route.clone(), "status" => status.to_string())
				.increment(1);
			histogram!(HTTP_REQUEST_DURATION, "route" => route).record(latency.as_secs_f64());
		});
	}

	/// Counts a request rejected by the rate limiter.
	pub fn record_rate_limited(&self) {
		self.record(|| counter!(RATE_LIMITED_TOTAL).increment(1));
	}

	/// Counts a name cache lookup.
	pub fn record_name_cache(&self, hit: bool) {
		let name = if hit { NAME_CACHE_HITS_TOTAL } else { NAME_CACHE_MISSES_TOTAL };

		self.record(|| counter!(name).increment(1));
	}

	/// Renders every metric in the Prometheus text exposition format.
	pub fn render(&self) -> String {
		self.handle.render()
	}
}
impl Default for ServiceMetrics {
	fn default() -> Self {
		Self::new()
	}
}
impl Debug for ServiceMetrics {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ServiceMetrics").finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn sample<'a>(text: &'a str, series: &str) -> Option<&'a str> {
		text.lines().find_map(|line| line.strip_prefix(series)).map(str::trim)
	}

	#[test]
	fn flows_and_requests_are_exported() {
		let metrics = ServiceMetrics::default();

		metrics.record_flow(FlowKind::Refresh, FlowOutcome::Success);
		metrics.record_flow(FlowKind::Refresh, FlowOutcome::Success);
		metrics.record_request("/v1/teams", 200, StdDuration::from_millis(250));
		metrics.record_rate_limited();
		metrics.record_name_cache(true);

		let text = metrics.render();

		assert_eq!(
			sample(&text, "fantasy_gateway_flow_total{flow=\"refresh\",outcome=\"success\"}"),
			Some("2")
		);
		assert_eq!(
			sample(&text, "fantasy_gateway_http_requests_total{route=\"/v1/teams\",status=\"200\"}"),
			Some("1")
		);
		assert_eq!(
			sample(&text, "fantasy_gateway_http_request_duration_seconds_count{route=\"/v1/teams\"}"),
			Some("1")
		);
		assert!(
			sample(&text, "fantasy_gateway_http_request_duration_seconds_sum{route=\"/v1/teams\"}")
				.and_then(|value| value.parse::<f64>().ok())
				.is_some_and(|value| (value - 0.25).abs() < 1e-9)
		);
		assert_eq!(sample(&text, "fantasy_gateway_rate_limited_total"), Some("1"));
		assert_eq!(sample(&text, "fantasy_gateway_name_cache_hits_total"), Some("1"));
		assert!(text.contains("# TYPE fantasy_gateway_flow_total counter"));
	}

	#[test]
	fn registries_are_isolated() {
		let first = ServiceMetrics::default();
		let second = ServiceMetrics::default();

		first.record_rate_limited();

		assert!(first.render().contains("fantasy_gateway_rate_limited_total 1"));
		assert!(!second.render().contains("fantasy_gateway_rate_limited_total 1"));
	}
}
