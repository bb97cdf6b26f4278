/// A resolved catalog entity (track, album or artist). Equality and set
/// membership go by `id` only; names are display-only and may collide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub id: String,
    pub name: String,
}

impl Item {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// One page of a remote listing. `next` carries the offset of the following
/// page, or `None` when the listing is exhausted.
#[derive(Debug, Clone, Default)]
pub struct Page {
    pub items: Vec<Item>,
    pub next: Option<u32>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SpotifyError {
    /// Rate limits, 5xx responses and transport failures. Safe to retry.
    #[error("transient spotify failure: {0}")]
    Transient(String),
    /// The API rejected the request outright. Retrying won't help.
    #[error("spotify api error (status {status}): {message}")]
    Api { status: u16, message: String },
}

impl SpotifyError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Port trait wrapping the Spotify Web API capabilities used by the sync
/// logic. The production implementation lives in `spotify::client`; tests use
/// the generated mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SpotifyApi: Send + Sync {
    /// One page of the playlist's current tracks, starting at `offset`.
    async fn playlist_items(&self, playlist_id: &str, offset: u32) -> Result<Page, SpotifyError>;

    /// One page of the artist's albums, starting at `offset`.
    async fn artist_albums(&self, artist_id: &str, offset: u32) -> Result<Page, SpotifyError>;

    /// One page of the album's tracks, starting at `offset`.
    async fn album_tracks(&self, album_id: &str, offset: u32) -> Result<Page, SpotifyError>;

    /// Artist search results for `query`, in provider order.
    async fn search_artists(&self, query: &str) -> Result<Vec<Item>, SpotifyError>;

    /// Append tracks to the playlist. At most 100 ids per call.
    async fn add_tracks(&self, playlist_id: &str, track_ids: &[String])
    -> Result<(), SpotifyError>;

    /// Remove every occurrence of the given tracks. At most 100 ids per call.
    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError>;
}
