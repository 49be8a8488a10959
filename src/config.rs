//! Configuration for the Spotify client.
//!
//! Values are resolved from environment variables and an optional `.env` file
//! in the platform's local data directory. Only the application credentials
//! are required; every other value falls back to a built-in default:
//!
//! 1. Explicit [`ClientConfig`] fields (highest priority)
//! 2. Environment variables / `.env` file
//! 3. Built-in defaults

use std::{env, path::PathBuf, time::Duration};

use crate::error::AuthError;

pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";

const DEFAULT_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";
const DEFAULT_REDIRECT_URI: &str = "http://localhost:8090/oauth2callback";
const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8090";
const DEFAULT_SCOPE: &str =
    "user-library-read playlist-read-private playlist-modify-public playlist-modify-private";

/// How long the interactive handshake waits for the provider redirect.
const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(120);

/// Loads environment variables from a `.env` file in the local data directory.
///
/// Looks for `splcli/.env` under the platform-specific local data directory
/// (e.g. `~/.local/share/splcli/.env` on Linux). A missing file is fine -
/// credentials may come from the process environment instead.
pub async fn load_env() -> Result<(), String> {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("splcli/.env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

pub fn client_id() -> Option<String> {
    env::var(ENV_CLIENT_ID).ok()
}

pub fn client_secret() -> Option<String> {
    env::var(ENV_CLIENT_SECRET).ok()
}

/// Authorization scope requested during the interactive handshake. The
/// token-request copy of this value is advisory; the scope granted at
/// authorization time governs what the resulting tokens can do.
pub fn scope() -> String {
    env::var("SPOTIFY_SCOPE").unwrap_or_else(|_| DEFAULT_SCOPE.to_string())
}

/// Redirect URI registered with the Spotify application. Must point at the
/// local callback listener (see [`server_addr`]).
pub fn redirect_uri() -> String {
    env::var("SPOTIFY_REDIRECT_URI").unwrap_or_else(|_| DEFAULT_REDIRECT_URI.to_string())
}

/// Bind address for the local OAuth callback server.
pub fn server_addr() -> String {
    env::var("SERVER_ADDRESS").unwrap_or_else(|_| DEFAULT_SERVER_ADDRESS.to_string())
}

pub fn auth_url() -> String {
    env::var("SPOTIFY_AUTH_URL").unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string())
}

pub fn token_url() -> String {
    env::var("SPOTIFY_TOKEN_URL").unwrap_or_else(|_| DEFAULT_TOKEN_URL.to_string())
}

pub fn api_url() -> String {
    env::var("SPOTIFY_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string())
}

/// Directory holding the persisted refresh token files, one per client id.
pub fn token_store_dir() -> PathBuf {
    match env::var("SPLCLI_DATA_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => {
            let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
            path.push("splcli");
            path
        }
    }
}

/// Fully resolved client configuration.
///
/// [`ClientConfig::from_env`] resolves everything from the environment;
/// building the struct directly keeps the client independent of the process
/// environment (used by the integration tests to point at local servers).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
    pub redirect_uri: String,
    /// Bind address for the callback listener.
    pub server_addr: String,
    pub auth_url: String,
    pub token_url: String,
    pub api_url: String,
    pub token_store_dir: PathBuf,
    /// Suppress per-request logging of the callback listener.
    pub quiet: bool,
    /// Deadline for the interactive handshake.
    pub auth_timeout: Duration,
}

impl ClientConfig {
    /// Resolves the configuration from the environment.
    ///
    /// Missing credentials are a fatal configuration error - there is no
    /// meaningful fallback for them.
    pub fn from_env() -> Result<Self, AuthError> {
        let (Some(client_id), Some(client_secret)) = (client_id(), client_secret()) else {
            return Err(AuthError::MissingCredentials);
        };

        Ok(ClientConfig {
            client_id,
            client_secret,
            scope: scope(),
            redirect_uri: redirect_uri(),
            server_addr: server_addr(),
            auth_url: auth_url(),
            token_url: token_url(),
            api_url: api_url(),
            token_store_dir: token_store_dir(),
            quiet: true,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
        })
    }
}
