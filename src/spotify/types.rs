use serde::Deserialize;

/// Spotify OAuth token response
#[derive(Debug, Clone, Deserialize)]
pub struct SpotifyTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
    pub refresh_token: Option<String>,
}

/// Generic paging wrapper the listing endpoints share.
#[derive(Debug, Deserialize)]
pub struct PagingObject<T> {
    pub items: Vec<T>,
    pub offset: u32,
    /// Url of the next page; only its presence matters here.
    pub next: Option<String>,
}

/// Entry of a playlist tracks page. `track` is absent for entries Spotify
/// can no longer resolve (removed or region-locked tracks).
#[derive(Debug, Deserialize)]
pub struct PlaylistItemObject {
    pub track: Option<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub struct TrackObject {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AlbumObject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ArtistObject {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ArtistSearchResponse {
    pub artists: PagingObject<ArtistObject>,
}
