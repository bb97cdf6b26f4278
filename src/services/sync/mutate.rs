use super::SyncError;
use super::collect::with_retries;
use crate::ports::spotify::{Item, SpotifyApi};

/// Hard Spotify limit on track ids per playlist mutation call.
pub const BATCH_LIMIT: usize = 100;

/// Splits a track list into id batches the mutation endpoints accept.
/// Relative order is preserved; only the last batch may be partial.
pub(crate) fn split_batches(items: &[Item]) -> Vec<Vec<String>> {
    items
        .chunks(BATCH_LIMIT)
        .map(|chunk| chunk.iter().map(|t| t.id.clone()).collect())
        .collect()
}

/// Appends `items` to the playlist, one remote call per batch. A failing
/// batch is retried whole; there is no partial-batch rollback.
pub(crate) async fn add_in_batches<C: SpotifyApi>(
    api: &C,
    playlist_id: &str,
    items: &[Item],
) -> Result<(), SyncError> {
    tracing::info!("Adding {} tracks to playlist {playlist_id}", items.len());
    for batch in split_batches(items) {
        with_retries("track add", || api.add_tracks(playlist_id, &batch)).await?;
    }
    Ok(())
}

/// Removes `items` from the playlist, one remote call per batch.
pub(crate) async fn remove_in_batches<C: SpotifyApi>(
    api: &C,
    playlist_id: &str,
    items: &[Item],
) -> Result<(), SyncError> {
    tracing::info!("Removing {} tracks from playlist {playlist_id}", items.len());
    for batch in split_batches(items) {
        with_retries("track removal", || api.remove_tracks(playlist_id, &batch)).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use mockall::Sequence;

    use super::*;
    use crate::ports::spotify::{MockSpotifyApi, SpotifyError};

    fn tracks(n: usize) -> Vec<Item> {
        (0..n)
            .map(|i| Item::new(format!("t{i}"), format!("track {i}")))
            .collect()
    }

    #[test]
    fn test_split_sizes_and_order() {
        let items = tracks(250);

        let batches = split_batches(&items);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 100);
        assert_eq!(batches[1].len(), 100);
        assert_eq!(batches[2].len(), 50);

        let rejoined: Vec<String> = batches.into_iter().flatten().collect();
        let original: Vec<String> = items.into_iter().map(|t| t.id).collect();
        assert_eq!(rejoined, original);
    }

    #[test]
    fn test_split_exact_multiple() {
        let batches = split_batches(&tracks(200));
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 100));
    }

    #[test]
    fn test_split_empty() {
        assert!(split_batches(&[]).is_empty());
    }

    #[tokio::test]
    async fn test_add_issues_one_call_per_batch() {
        let mut api = MockSpotifyApi::new();
        let mut seq = Sequence::new();
        api.expect_add_tracks()
            .withf(|id, ids| id == "pl1" && ids.len() == 100 && ids[0] == "t0")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        api.expect_add_tracks()
            .withf(|id, ids| id == "pl1" && ids.len() == 1 && ids[0] == "t100")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        add_in_batches(&api, "pl1", &tracks(101)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_batch_is_retried_whole() {
        let calls = Mutex::new(Vec::new());

        let mut api = MockSpotifyApi::new();
        api.expect_remove_tracks()
            .times(2)
            .returning(move |_, ids| {
                let mut calls = calls.lock().unwrap();
                calls.push(ids.to_vec());
                if calls.len() == 1 {
                    Err(SpotifyError::Transient("rate limited".into()))
                } else {
                    // The retried batch carries the exact same ids.
                    assert_eq!(calls[0], calls[1]);
                    Ok(())
                }
            });

        remove_in_batches(&api, "pl1", &tracks(3)).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_mutation_retries_are_bounded() {
        let mut api = MockSpotifyApi::new();
        api.expect_add_tracks()
            .times(super::super::collect::MAX_ATTEMPTS)
            .returning(|_, _| Err(SpotifyError::Transient("still down".into())));

        let result = add_in_batches(&api, "pl1", &tracks(1)).await;

        assert!(matches!(result, Err(SyncError::RetryExhausted { .. })));
    }

    #[tokio::test]
    async fn test_no_calls_for_empty_list() {
        let api = MockSpotifyApi::new();
        add_in_batches(&api, "pl1", &[]).await.unwrap();
        remove_in_batches(&api, "pl1", &[]).await.unwrap();
    }
}
