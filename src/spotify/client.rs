use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use crate::{
    config::ClientConfig,
    error::{ApiError, AuthError},
    types::{
        ItemRef, Playlist, PlaylistTrack, RemoveTracksRequest, RemoveTracksResponse, Track,
        TrackUri, UserProfile,
    },
    utils,
};

use super::auth::Authenticator;

/// Authenticated Spotify Web API client.
///
/// Every resource call goes through [`SpotifyClient::send`], which attaches
/// a bearer token and recovers exactly once from an authorization failure.
pub struct SpotifyClient {
    http: Client,
    auth: Authenticator,
    api_url: String,
}

impl SpotifyClient {
    pub fn new(config: &ClientConfig) -> Self {
        SpotifyClient {
            http: Client::new(),
            auth: Authenticator::new(config),
            api_url: config.api_url.clone(),
        }
    }

    pub fn from_env() -> Result<Self, AuthError> {
        let config = ClientConfig::from_env()?;
        Ok(Self::new(&config))
    }

    /// Forces the interactive authorization handshake, regardless of any
    /// cached or persisted token.
    pub async fn login(&mut self) -> Result<(), AuthError> {
        self.auth.authorize_interactive().await.map(|_| ())
    }

    /// Issues an authenticated request.
    ///
    /// On HTTP 401 the cached access token is dropped, one re-acquisition is
    /// forced and the request retried exactly once; a second 401 is fatal
    /// and carries the provider's response body. Every non-401 response -
    /// success or failure - is returned as-is for the caller to interpret.
    pub async fn send(
        &mut self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, ApiError> {
        let token = self.auth.access_token().await?;
        let response = self.dispatch(method.clone(), url, body, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        self.auth.invalidate();
        let token = self.auth.access_token().await?;
        let retry = self.dispatch(method, url, body, &token).await?;
        if retry.status() == StatusCode::UNAUTHORIZED {
            let body = retry.text().await.unwrap_or_default();
            return Err(ApiError::AuthRetryExhausted { body });
        }
        Ok(retry)
    }

    async fn dispatch(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
        token: &str,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Authenticated GET returning the decoded JSON body. Unlike [`send`],
    /// this treats non-success statuses as errors.
    ///
    /// [`send`]: SpotifyClient::send
    pub async fn get_json(&mut self, url: &str) -> Result<Value, ApiError> {
        let response = self.send(Method::GET, url, None).await?.error_for_status()?;
        Ok(response.json().await?)
    }

    /// Fetches every page of a paginated listing.
    ///
    /// Issues the same request with an advancing `offset` and the given
    /// `limit`, extracts the results array at `items_path` from each page
    /// and concatenates them. A page shorter than `limit` is treated as the
    /// last one; a collection whose final page is exactly `limit` items
    /// therefore costs one extra empty request.
    pub async fn paginate(
        &mut self,
        url: &str,
        limit: u32,
        items_path: &[&str],
    ) -> Result<Vec<Value>, ApiError> {
        let limit = limit.max(1);
        let mut items = Vec::new();
        let mut offset: u32 = 0;

        loop {
            let page_url = utils::expand_url(
                url,
                &[("limit", limit.to_string()), ("offset", offset.to_string())],
            )?;
            let body = self.get_json(&page_url).await?;
            let page = utils::pluck_items(&body, items_path)
                .ok_or_else(|| ApiError::MissingField(items_path.join(".")))?;

            let count = page.len() as u32;
            items.extend(page.iter().cloned());

            if count < limit {
                break;
            }
            offset += limit;
        }

        Ok(items)
    }

    /// Profile of the authorized user (`/me`).
    pub async fn me(&mut self) -> Result<UserProfile, ApiError> {
        let body = self.get_json(&format!("{}/me", self.api_url)).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// All playlists of the authorized user.
    pub async fn playlists(&mut self, page_size: u32) -> Result<Vec<Playlist>, ApiError> {
        let url = format!("{}/me/playlists", self.api_url);
        let items = self.paginate(&url, page_size, &["items"]).await?;
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ApiError::from))
            .collect()
    }

    /// All tracks of a playlist, addressed by ID or by a previously fetched
    /// playlist object.
    pub async fn playlist_tracks(
        &mut self,
        playlist: ItemRef,
        page_size: u32,
    ) -> Result<Vec<PlaylistTrack>, ApiError> {
        let id = playlist.into_id()?;
        let url = format!("{}/playlists/{}/tracks", self.api_url, id);
        let items = self.paginate(&url, page_size, &["items"]).await?;
        items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(ApiError::from))
            .collect()
    }

    /// Removes tracks from a playlist and returns the new snapshot id.
    pub async fn remove_tracks(
        &mut self,
        playlist: ItemRef,
        uris: &[String],
    ) -> Result<String, ApiError> {
        let id = playlist.into_id()?;
        let url = format!("{}/playlists/{}/tracks", self.api_url, id);
        let request = RemoveTracksRequest {
            tracks: uris.iter().map(|uri| TrackUri { uri: uri.clone() }).collect(),
        };
        let body = serde_json::to_value(&request)?;

        let response = self
            .send(Method::DELETE, &url, Some(&body))
            .await?
            .error_for_status()?;
        let parsed: RemoveTracksResponse = response.json().await?;
        Ok(parsed.snapshot_id)
    }

    /// A single track, addressed by ID or by a previously fetched track
    /// object.
    pub async fn track(&mut self, track: ItemRef) -> Result<Track, ApiError> {
        let id = track.into_id()?;
        let body = self
            .get_json(&format!("{}/tracks/{}", self.api_url, id))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Catalog search. `kind` is Spotify's `type` parameter (e.g. `track`);
    /// the raw body is returned since its shape depends on `kind`.
    pub async fn search(&mut self, query: &str, kind: &str, limit: u32) -> Result<Value, ApiError> {
        let url = utils::expand_url(
            &format!("{}/search", self.api_url),
            &[
                ("q", query.to_string()),
                ("type", kind.to_string()),
                ("limit", limit.to_string()),
            ],
        )?;
        self.get_json(&url).await
    }
}
