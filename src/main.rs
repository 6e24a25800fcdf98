//! Fantasy gateway server.

// crates.io
use color_eyre::Result;
// self
use fantasy_gateway::{
	api::{self, AppState},
	config::Settings,
	obs,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let settings = Settings::from_env()?;

	obs::init_tracing(&settings.log_level, settings.log_format);
	tracing::info!(
		version = env!("CARGO_PKG_VERSION"),
		credential_file = %settings.oauth_file.display(),
		favorites = settings.favorites.len(),
		"starting fantasy gateway"
	);

	let state = AppState::from_settings(settings)?;

	api::serve(state).await?;

	Ok(())
}
