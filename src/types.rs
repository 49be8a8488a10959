use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabled::Tabled;

use crate::error::ApiError;

/// Body returned by the token endpoint for both grant types. Success carries
/// `access_token` (and sometimes a rotated `refresh_token`); failure carries
/// `error` and optionally `error_description`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub expires_in: Option<u64>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// A successful token exchange. The refresh token is only present when the
/// provider rotated it; a refresh grant frequently returns none.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Either a raw Spotify ID or a previously fetched response object whose
/// `id` field is used instead.
#[derive(Debug, Clone)]
pub enum ItemRef {
    Id(String),
    Object(Value),
}

impl ItemRef {
    /// Resolves the reference to a plain ID at the call boundary.
    pub fn into_id(self) -> Result<String, ApiError> {
        match self {
            ItemRef::Id(id) => Ok(id),
            ItemRef::Object(value) => value
                .get("id")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .ok_or_else(|| ApiError::MissingField("id".to_string())),
        }
    }
}

impl From<&str> for ItemRef {
    fn from(id: &str) -> Self {
        ItemRef::Id(id.to_string())
    }
}

impl From<String> for ItemRef {
    fn from(id: String) -> Self {
        ItemRef::Id(id)
    }
}

impl From<Value> for ItemRef {
    fn from(object: Value) -> Self {
        ItemRef::Object(object)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
    pub product: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub public: Option<bool>,
    pub collaborative: Option<bool>,
    pub tracks: PlaylistTrackSummary,
    pub owner: Option<PlaylistOwner>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrackSummary {
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistOwner {
    pub id: String,
    pub display_name: Option<String>,
}

/// Entry of a playlist's track listing. `track` is null for tracks that are
/// no longer available, `added_at` for very old playlists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistTrack {
    pub added_at: Option<String>,
    pub track: Option<Track>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: Option<String>,
    pub name: String,
    pub uri: String,
    pub artists: Vec<TrackArtist>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackArtist {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksRequest {
    pub tracks: Vec<TrackUri>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackUri {
    pub uri: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveTracksResponse {
    pub snapshot_id: String,
}

#[derive(Tabled)]
pub struct PlaylistTableRow {
    pub name: String,
    pub tracks: u64,
    pub visibility: String,
    pub id: String,
}

#[derive(Tabled)]
pub struct SearchTableRow {
    pub name: String,
    pub artists: String,
    pub uri: String,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub added: String,
    pub name: String,
    pub artists: String,
    pub uri: String,
}
