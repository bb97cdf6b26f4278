use std::collections::HashSet;
use std::time::Duration;

use super::collect::{collect_pages, with_retries};
use super::{SyncError, SyncService};
use crate::config::{ArtistSpec, PlaylistSpec};
use crate::ports::spotify::{Item, SpotifyApi};

/// Pause between album track fetches, to stay under the API rate limits.
const ALBUM_FETCH_DELAY: Duration = Duration::from_millis(200);

impl<C: SpotifyApi> SyncService<C> {
    /// Expands the playlist's artists into the full track list it should
    /// contain: every album of every artist, minus the skipped albums,
    /// in artist order, then album order, then track order.
    ///
    /// Duplicates across albums survive unless the spec asks for `dedupe`.
    pub(crate) async fn desired_tracks(&self, spec: &PlaylistSpec) -> Result<Vec<Item>, SyncError> {
        let excluded = excluded_album_ids(spec);
        let mut tracks = Vec::new();

        tracing::info!("Getting tracks to add...");
        for artist in &spec.artists {
            tracing::info!("Getting artist \"{}\" albums...", artist.display_name());
            let Some(artist_id) = self.artist_id(artist).await? else {
                tracing::warn!("Couldn't find artist \"{}\"", artist.name);
                continue;
            };

            let albums = collect_pages("artist albums", |offset| {
                self.api.artist_albums(&artist_id, offset)
            })
            .await?;

            for album in albums {
                if excluded.contains(album.id.as_str()) {
                    tracing::info!("Album \"{}\" skipped", album.name);
                    continue;
                }
                let album_tracks =
                    collect_pages("album tracks", |offset| self.api.album_tracks(&album.id, offset))
                        .await?;
                tracks.extend(album_tracks);
                tokio::time::sleep(ALBUM_FETCH_DELAY).await;
            }
        }

        if spec.dedupe {
            dedupe_by_id(&mut tracks);
        }
        Ok(tracks)
    }

    async fn artist_id(&self, artist: &ArtistSpec) -> Result<Option<String>, SyncError> {
        if artist.resolve_by_name {
            Ok(self.resolve_artist(&artist.name).await?.map(|found| found.id))
        } else {
            Ok(artist.id.clone())
        }
    }

    /// Maps an artist name to its id via search: first result whose name
    /// matches the query exactly, case-sensitive, no fuzzy matching. `None`
    /// is not an error; the caller skips the artist and moves on.
    pub(crate) async fn resolve_artist(&self, name: &str) -> Result<Option<Item>, SyncError> {
        let results = with_retries("artist search", || self.api.search_artists(name)).await?;
        Ok(results.into_iter().find(|artist| artist.name == name))
    }
}

/// Union of the playlist-level and per-artist skip lists, keyed by album id.
/// Computed fresh for each playlist spec.
fn excluded_album_ids(spec: &PlaylistSpec) -> HashSet<String> {
    spec.skip_albums
        .iter()
        .chain(spec.artists.iter().flat_map(|artist| &artist.skip_albums))
        .map(|album| album.id.clone())
        .collect()
}

fn dedupe_by_id(tracks: &mut Vec<Item>) {
    let mut seen = HashSet::new();
    tracks.retain(|track| seen.insert(track.id.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlbumRef;
    use crate::ports::spotify::{MockSpotifyApi, Page, SpotifyError};

    fn item(id: &str, name: &str) -> Item {
        Item::new(id, name)
    }

    fn single_page(items: Vec<Item>) -> Result<Page, SpotifyError> {
        Ok(Page { items, next: None })
    }

    fn album_ref(id: &str) -> AlbumRef {
        AlbumRef {
            name: String::new(),
            id: id.into(),
        }
    }

    fn spec_with_artists(artists: Vec<ArtistSpec>) -> PlaylistSpec {
        PlaylistSpec {
            name: "Test".into(),
            id: "pl1".into(),
            shuffle: false,
            dedupe: false,
            artists,
            skip_albums: vec![],
        }
    }

    fn artist_with_id(id: &str) -> ArtistSpec {
        ArtistSpec {
            name: format!("artist {id}"),
            id: Some(id.into()),
            ..ArtistSpec::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expands_artists_in_order() {
        let mut api = MockSpotifyApi::new();
        api.expect_artist_albums()
            .withf(|id, _| id == "ar1")
            .returning(|_, _| single_page(vec![item("al1", "First")]));
        api.expect_artist_albums()
            .withf(|id, _| id == "ar2")
            .returning(|_, _| single_page(vec![item("al2", "Second")]));
        api.expect_album_tracks()
            .withf(|id, _| id == "al1")
            .returning(|_, _| single_page(vec![item("t1", "one"), item("t2", "two")]));
        api.expect_album_tracks()
            .withf(|id, _| id == "al2")
            .returning(|_, _| single_page(vec![item("t3", "three")]));

        let service = SyncService::new(api);
        let spec = spec_with_artists(vec![artist_with_id("ar1"), artist_with_id("ar2")]);

        let tracks = service.desired_tracks(&spec).await.unwrap();

        let ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_excluded_albums_never_expand() {
        let mut api = MockSpotifyApi::new();
        api.expect_artist_albums().returning(|_, _| {
            single_page(vec![
                item("al1", "Keep"),
                item("al2", "Skip Me"),
                item("al3", "Skip Me Too"),
            ])
        });
        // Only the kept album may be expanded.
        api.expect_album_tracks()
            .withf(|id, _| id == "al1")
            .times(1)
            .returning(|_, _| single_page(vec![item("t1", "one")]));

        let mut artist = artist_with_id("ar1");
        // al2 excluded at both levels: still excluded exactly once in effect.
        artist.skip_albums = vec![album_ref("al2"), album_ref("al3")];
        let mut spec = spec_with_artists(vec![artist]);
        spec.skip_albums = vec![album_ref("al2")];

        let tracks = service_tracks(api, &spec).await;

        assert_eq!(tracks, vec![item("t1", "one")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolved_artist_is_skipped() {
        let mut api = MockSpotifyApi::new();
        api.expect_search_artists()
            .withf(|query| query == "Ghost Band")
            .times(1)
            .returning(|_| Ok(vec![item("ar9", "Some Other Band")]));
        api.expect_artist_albums()
            .withf(|id, _| id == "ar2")
            .times(1)
            .returning(|_, _| single_page(vec![item("al1", "Album")]));
        api.expect_album_tracks()
            .returning(|_, _| single_page(vec![item("t1", "one")]));

        let missing = ArtistSpec {
            name: "Ghost Band".into(),
            resolve_by_name: true,
            ..ArtistSpec::default()
        };
        let spec = spec_with_artists(vec![missing, artist_with_id("ar2")]);

        let tracks = service_tracks(api, &spec).await;

        // The unresolved artist contributes nothing; the rest still sync.
        assert_eq!(tracks, vec![item("t1", "one")]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolution_is_exact_and_case_sensitive() {
        let mut api = MockSpotifyApi::new();
        api.expect_search_artists().returning(|_| {
            Ok(vec![
                item("ar1", "muse tribute"),
                item("ar2", "MUSE"),
                item("ar3", "Muse"),
                item("ar4", "Muse"),
            ])
        });

        let service = SyncService::new(api);
        let resolved = service.resolve_artist("Muse").await.unwrap();

        // First exact match in provider order wins.
        assert_eq!(resolved, Some(item("ar3", "Muse")));

        let resolved = service.resolve_artist("muse").await.unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_preserved_unless_dedupe() {
        let mut api = MockSpotifyApi::new();
        api.expect_artist_albums().returning(|_, _| {
            single_page(vec![item("al1", "Album"), item("al2", "Compilation")])
        });
        // The same single shows up on both albums.
        api.expect_album_tracks()
            .returning(|_, _| single_page(vec![item("t1", "hit single")]));

        let mut spec = spec_with_artists(vec![artist_with_id("ar1")]);

        let service = SyncService::new(api);
        let tracks = service.desired_tracks(&spec).await.unwrap();
        assert_eq!(tracks.len(), 2);

        spec.dedupe = true;
        let tracks = service.desired_tracks(&spec).await.unwrap();
        assert_eq!(tracks, vec![item("t1", "hit single")]);
    }

    async fn service_tracks(api: MockSpotifyApi, spec: &PlaylistSpec) -> Vec<Item> {
        SyncService::new(api).desired_tracks(spec).await.unwrap()
    }
}
