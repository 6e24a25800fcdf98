// crates.io
use tracing::{Instrument, instrument::Instrumented};
use tracing_subscriber::{EnvFilter, fmt};
// self
use crate::{_prelude::*, obs::FlowKind};

/// Output format for the process-wide subscriber.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
	/// One JSON object per line.
	#[default]
	Json,
	/// Human-readable multi-line output for local development.
	Pretty,
}
impl FromStr for LogFormat {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"json" => Ok(Self::Json),
			"pretty" | "text" => Ok(Self::Pretty),
			other => Err(format!("unknown log format `{other}`")),
		}
	}
}

/// Installs the global tracing subscriber.
///
/// `level` accepts either a bare level (`INFO`) or a full `EnvFilter` directive. Calling
/// this more than once is harmless; later calls leave the first subscriber in place.
pub fn init_tracing(level: &str, format: LogFormat) {
	let filter = EnvFilter::try_new(level.to_ascii_lowercase())
		.unwrap_or_else(|_| EnvFilter::new("info"));
	let builder = fmt().with_env_filter(filter).with_target(true);
	let result = match format {
		LogFormat::Json => builder.json().flatten_event(true).with_current_span(false).try_init(),
		LogFormat::Pretty => builder.pretty().try_init(),
	};

	if let Err(e) = result {
		tracing::debug!(error = %e, "tracing subscriber already installed");
	}
}

/// A span builder used by gateway flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self { span: tracing::info_span!("fantasy_gateway.flow", flow = kind.as_str(), stage) }
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		fut.instrument(self.span.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(FlowKind::Refresh, "instrument_wraps_future");
		let value = FlowSpan::instrument(&span, async { 42 }).await;

		assert_eq!(value, 42);
	}

	#[test]
	fn log_format_parses_known_values() {
		assert_eq!("JSON".parse::<LogFormat>(), Ok(LogFormat::Json));
		assert_eq!("pretty".parse::<LogFormat>(), Ok(LogFormat::Pretty));
		assert!("xml".parse::<LogFormat>().is_err());
	}
}
