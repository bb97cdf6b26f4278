mod collect;
mod desired;
mod mutate;
mod reconcile;

pub use mutate::BATCH_LIMIT;
pub use reconcile::{Diff, reconcile};

use crate::config::PlaylistSpec;
use crate::ports::spotify::{Item, SpotifyApi, SpotifyError};

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("{what} still failing after {attempts} attempts: {source}")]
    RetryExhausted {
        what: &'static str,
        attempts: usize,
        source: SpotifyError,
    },
    #[error("{what}: {source}")]
    Api {
        what: &'static str,
        source: SpotifyError,
    },
}

/// Reconciles configured playlists against the remote service, one playlist
/// at a time, in configuration order.
pub struct SyncService<C> {
    api: C,
}

impl<C: SpotifyApi> SyncService<C> {
    pub fn new(api: C) -> Self {
        Self { api }
    }

    /// Syncs every playlist in order. A failing playlist is logged and does
    /// not stop the ones after it. Returns how many failed.
    pub async fn run(&self, playlists: &[PlaylistSpec]) -> usize {
        let mut failed = 0;
        for spec in playlists {
            if let Err(err) = self.sync_playlist(spec).await {
                tracing::error!("Playlist \"{}\" failed to sync: {err}", spec.name);
                failed += 1;
            }
        }
        failed
    }

    pub async fn sync_playlist(&self, spec: &PlaylistSpec) -> Result<(), SyncError> {
        tracing::info!("Processing playlist \"{}\" with id \"{}\"", spec.name, spec.id);

        let desired = self.desired_tracks(spec).await?;
        let current = self.current_tracks(&spec.id).await?;

        let diff = reconcile(&current, &desired, spec.shuffle);
        tracing::info!(
            "Found {} tracks to add and {} tracks to remove",
            diff.to_add.len(),
            diff.to_remove.len()
        );
        if spec.shuffle {
            tracing::info!(
                "Shuffling is enabled, all tracks will be removed, then added in shuffled order"
            );
        }

        mutate::remove_in_batches(&self.api, &spec.id, &diff.to_remove).await?;
        mutate::add_in_batches(&self.api, &spec.id, &diff.to_add).await?;
        Ok(())
    }

    async fn current_tracks(&self, playlist_id: &str) -> Result<Vec<Item>, SyncError> {
        tracing::info!("Getting tracks already in playlist {playlist_id}");
        collect::collect_pages("playlist items", |offset| {
            self.api.playlist_items(playlist_id, offset)
        })
        .await
    }
}
