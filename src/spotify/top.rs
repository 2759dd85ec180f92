use crate::{
    error::SpotifyError,
    types::{Artist, Paging, RankedItem, TimeWindow, Track},
};

use super::SpotifyClient;

/// Largest `limit` the top-items endpoints accept in one call.
pub const MAX_PAGE_SIZE: usize = 50;

impl SpotifyClient {
    /// Retrieves the user's top artists for a time window.
    ///
    /// Issues a single request; `limit` is capped at [`MAX_PAGE_SIZE`]. Items are
    /// ranked in the order Spotify returns them.
    ///
    /// # Errors
    ///
    /// Any network failure or non-success status is returned as
    /// [`SpotifyError::Http`]. There is no retry.
    pub async fn fetch_top_artists(
        &self,
        token: &str,
        window: TimeWindow,
        limit: usize,
    ) -> Result<Vec<RankedItem>, SpotifyError> {
        let limit = limit.min(MAX_PAGE_SIZE);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let page: Paging<Artist> = self.get_top(token, "artists", window, limit, 0).await?;

        Ok(rank_artists(page.items.into_iter().take(limit)))
    }

    /// Retrieves up to `total_limit` of the user's top tracks for a time window.
    ///
    /// Pages through the endpoint in chunks of at most [`MAX_PAGE_SIZE`]. The
    /// offset advances by the number of items actually returned, and an empty
    /// page ends the loop early.
    ///
    /// # Errors
    ///
    /// The first failing request aborts the whole fetch.
    pub async fn fetch_top_tracks(
        &self,
        token: &str,
        window: TimeWindow,
        total_limit: usize,
    ) -> Result<Vec<RankedItem>, SpotifyError> {
        let mut tracks: Vec<Track> = Vec::new();

        while tracks.len() < total_limit {
            let limit = MAX_PAGE_SIZE.min(total_limit - tracks.len());
            let page: Paging<Track> = self
                .get_top(token, "tracks", window, limit, tracks.len())
                .await?;

            if page.items.is_empty() {
                break;
            }
            tracks.extend(page.items);
        }

        tracks.truncate(total_limit);
        Ok(rank_tracks(tracks))
    }

    async fn get_top<T>(
        &self,
        token: &str,
        kind: &str,
        window: TimeWindow,
        limit: usize,
        offset: usize,
    ) -> Result<Paging<T>, SpotifyError>
    where
        T: serde::de::DeserializeOwned,
    {
        let api_url = format!("{uri}/me/top/{kind}", uri = self.api_url());
        let page = self
            .http()
            .get(&api_url)
            .bearer_auth(token)
            .query(&[
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
                ("time_range", window.to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json::<Paging<T>>()
            .await?;

        Ok(page)
    }
}

/// Assigns 1-based ranks to artists in the given order.
pub fn rank_artists(artists: impl IntoIterator<Item = Artist>) -> Vec<RankedItem> {
    artists
        .into_iter()
        .enumerate()
        .map(|(i, a)| RankedItem {
            rank: i + 1,
            id: a.id.unwrap_or_default(),
            name: a.name.unwrap_or_default(),
            primary_artist: None,
        })
        .collect()
}

/// Assigns 1-based ranks to tracks in the given order.
///
/// A track without artists gets an empty primary artist.
pub fn rank_tracks(tracks: impl IntoIterator<Item = Track>) -> Vec<RankedItem> {
    tracks
        .into_iter()
        .enumerate()
        .map(|(i, t)| RankedItem {
            rank: i + 1,
            id: t.id.unwrap_or_default(),
            name: t.name.unwrap_or_default(),
            primary_artist: Some(
                t.artists
                    .into_iter()
                    .next()
                    .and_then(|a| a.name)
                    .unwrap_or_default(),
            ),
        })
        .collect()
}
