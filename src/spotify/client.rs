use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::ports::spotify::{Item, Page, SpotifyApi, SpotifyError};
use crate::spotify::types::{
    AlbumObject, ArtistSearchResponse, PagingObject, PlaylistItemObject, TrackObject,
};

const API_BASE: &str = "https://api.spotify.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Page size for the listing endpoints. 50 is the maximum the album and
/// artist endpoints accept.
const PAGE_LIMIT: u32 = 50;

/// Spotify Web API client
pub struct SpotifyWebClient {
    access_token: String,
    client: reqwest::Client,
}

impl SpotifyWebClient {
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            client: reqwest::Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: String) -> Result<T, SpotifyError> {
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(transport_error)
    }
}

/// Timeouts and dropped connections are worth another try.
fn transport_error(error: reqwest::Error) -> SpotifyError {
    SpotifyError::Transient(error.to_string())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error text".to_string());
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(SpotifyError::Transient(format!("status {status}: {message}")))
    } else {
        Err(SpotifyError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

/// Offset of the page after this one, if the listing isn't exhausted yet.
fn next_offset(offset: u32, fetched: usize, has_next: bool) -> Option<u32> {
    has_next.then(|| offset + fetched as u32)
}

fn track_uri(id: &str) -> String {
    format!("spotify:track:{id}")
}

#[async_trait::async_trait]
impl SpotifyApi for SpotifyWebClient {
    async fn playlist_items(&self, playlist_id: &str, offset: u32) -> Result<Page, SpotifyError> {
        let page: PagingObject<PlaylistItemObject> = self
            .get_json(format!(
                "{API_BASE}/playlists/{playlist_id}/tracks?limit=100&offset={offset}"
            ))
            .await?;

        let fetched = page.items.len();
        let items = page
            .items
            .into_iter()
            // Entries Spotify can't resolve anymore carry no track.
            .filter_map(|entry| entry.track)
            .filter_map(|track| Some(Item::new(track.id?, track.name)))
            .collect();

        Ok(Page {
            items,
            next: next_offset(page.offset, fetched, page.next.is_some()),
        })
    }

    async fn artist_albums(&self, artist_id: &str, offset: u32) -> Result<Page, SpotifyError> {
        let page: PagingObject<AlbumObject> = self
            .get_json(format!(
                "{API_BASE}/artists/{artist_id}/albums?limit={PAGE_LIMIT}&offset={offset}"
            ))
            .await?;

        let fetched = page.items.len();
        let items = page
            .items
            .into_iter()
            .map(|album| Item::new(album.id, album.name))
            .collect();

        Ok(Page {
            items,
            next: next_offset(page.offset, fetched, page.next.is_some()),
        })
    }

    async fn album_tracks(&self, album_id: &str, offset: u32) -> Result<Page, SpotifyError> {
        let page: PagingObject<TrackObject> = self
            .get_json(format!(
                "{API_BASE}/albums/{album_id}/tracks?limit={PAGE_LIMIT}&offset={offset}"
            ))
            .await?;

        let fetched = page.items.len();
        let items = page
            .items
            .into_iter()
            .filter_map(|track| Some(Item::new(track.id?, track.name)))
            .collect();

        Ok(Page {
            items,
            next: next_offset(page.offset, fetched, page.next.is_some()),
        })
    }

    async fn search_artists(&self, query: &str) -> Result<Vec<Item>, SpotifyError> {
        let response: ArtistSearchResponse = self
            .get_json(format!(
                "{API_BASE}/search?type=artist&limit={PAGE_LIMIT}&q={}",
                urlencoding::encode(query)
            ))
            .await?;

        Ok(response
            .artists
            .items
            .into_iter()
            .map(|artist| Item::new(artist.id, artist.name))
            .collect())
    }

    async fn add_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        let uris: Vec<String> = track_ids.iter().map(|id| track_uri(id)).collect();
        let response = self
            .client
            .post(format!("{API_BASE}/playlists/{playlist_id}/tracks"))
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "uris": uris }))
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response).await?;
        Ok(())
    }

    async fn remove_tracks(
        &self,
        playlist_id: &str,
        track_ids: &[String],
    ) -> Result<(), SpotifyError> {
        let tracks: Vec<serde_json::Value> = track_ids
            .iter()
            .map(|id| json!({ "uri": track_uri(id) }))
            .collect();
        let response = self
            .client
            .delete(format!("{API_BASE}/playlists/{playlist_id}/tracks"))
            .bearer_auth(&self.access_token)
            .timeout(REQUEST_TIMEOUT)
            .json(&json!({ "tracks": tracks }))
            .send()
            .await
            .map_err(transport_error)?;

        check_status(response).await?;
        Ok(())
    }
}
