use std::path::PathBuf;

use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("playlist \"{0}\" has an empty id")]
    MissingPlaylistId(String),
    #[error("artist \"{artist}\" in playlist \"{playlist}\" needs an id or resolve_by_name = true")]
    MissingArtistId { playlist: String, artist: String },
    #[error("an artist in playlist \"{0}\" has resolve_by_name = true but no name")]
    MissingArtistName(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub verbose: bool,
    #[serde(default)]
    pub spotify_id: String,
    #[serde(default)]
    pub spotify_secret: String,
    #[serde(default)]
    pub playlists: Vec<PlaylistSpec>,
}

/// Desired membership of one playlist. Loaded once per run and immutable
/// while the playlist is processed.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaylistSpec {
    pub name: String,
    pub id: String,
    /// Full-rebuild mode: remove everything, re-add in random order.
    #[serde(default)]
    pub shuffle: bool,
    /// Drop repeated track ids from the desired list. A track released on
    /// two kept albums otherwise ends up in the playlist twice.
    #[serde(default)]
    pub dedupe: bool,
    #[serde(default)]
    pub artists: Vec<ArtistSpec>,
    #[serde(default)]
    pub skip_albums: Vec<AlbumRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistSpec {
    #[serde(default)]
    pub name: String,
    pub id: Option<String>,
    /// Look the id up via artist search instead of taking it from the config.
    #[serde(default)]
    pub resolve_by_name: bool,
    #[serde(default)]
    pub skip_albums: Vec<AlbumRef>,
}

impl ArtistSpec {
    /// Name if we have one, otherwise the id. For log lines only.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            self.id.as_deref().unwrap_or("<unnamed>")
        } else {
            &self.name
        }
    }
}

/// An album to exclude from track expansion. The name is log-only; matching
/// happens by id.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumRef {
    #[serde(default)]
    pub name: String,
    pub id: String,
}

impl Config {
    /// Load config from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .context(format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|path| path.join("spotify-playlist-sync").join("config.toml"))
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()
            .ok_or(color_eyre::eyre::eyre!("No config directory on this system"))?;

        Self::from_file(&config_path)
    }

    /// Environment variables win over the file, so credentials can stay out
    /// of it. `SPF_VERBOSE` accepts anything `bool::from_str` does.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("SPOTIFY_ID").ok(),
            std::env::var("SPOTIFY_SECRET").ok(),
            std::env::var("SPF_VERBOSE").ok(),
        );
    }

    fn apply_overrides(
        &mut self,
        spotify_id: Option<String>,
        spotify_secret: Option<String>,
        verbose: Option<String>,
    ) {
        if let Some(id) = spotify_id.filter(|v| !v.is_empty()) {
            self.spotify_id = id;
        }
        if let Some(secret) = spotify_secret.filter(|v| !v.is_empty()) {
            self.spotify_secret = secret;
        }
        if let Some(verbose) = verbose.and_then(|v| v.parse().ok()) {
            self.verbose = verbose;
        }
    }

    /// Reject specs the sync stage could only fail on later. Runs before any
    /// remote call is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for playlist in &self.playlists {
            if playlist.id.is_empty() {
                return Err(ConfigError::MissingPlaylistId(playlist.name.clone()));
            }
            for artist in &playlist.artists {
                if artist.resolve_by_name {
                    if artist.name.is_empty() {
                        return Err(ConfigError::MissingArtistName(playlist.name.clone()));
                    }
                } else if artist.id.as_deref().unwrap_or_default().is_empty() {
                    return Err(ConfigError::MissingArtistId {
                        playlist: playlist.name.clone(),
                        artist: artist.display_name().to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}
