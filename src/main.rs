mod config;
mod logging;
mod ports;
mod services;
mod spotify;

use std::path::PathBuf;

use clap::Parser;
use color_eyre::{Result, eyre::Context, eyre::eyre};

use crate::config::Config;
use crate::logging::init_tracing;
use crate::services::sync::SyncService;
use crate::spotify::auth::{AuthConfig, authorize};
use crate::spotify::client::SpotifyWebClient;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The config file to use
    #[arg(short, long, env = "PLAYLIST_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Tracing filter; defaults to "debug" when the config asks for verbose
    /// output, "info" otherwise
    #[arg(long, env = "LOG_LEVEL")]
    log_level: Option<String>,

    /// Port of the local OAuth callback listener
    #[arg(long, default_value = "8080", env = "SPOTIFY_CALLBACK_PORT")]
    callback_port: u16,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();

    let mut config = {
        if let Some(config) = &args.config {
            Config::from_file(config)
        } else {
            Config::load()
        }
    }
    .with_context(|| "Failed to load playlist sync config")?;
    config.apply_env_overrides();
    config.validate()?;

    let filter = args.log_level.clone().unwrap_or_else(|| {
        if config.verbose {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    });
    init_tracing(&filter)?;

    tracing::debug!("Syncing {} playlists", config.playlists.len());

    let token = authorize(&AuthConfig {
        client_id: config.spotify_id.clone(),
        client_secret: config.spotify_secret.clone(),
        callback_port: args.callback_port,
    })
    .await?;

    let service = SyncService::new(SpotifyWebClient::new(token));
    let failed = service.run(&config.playlists).await;
    if failed > 0 {
        return Err(eyre!(
            "{failed} of {} playlists failed to sync",
            config.playlists.len()
        ));
    }

    Ok(())
}
