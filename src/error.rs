//! Error types for authentication and Spotify Web API requests.

use thiserror::Error;

/// Failures of the token lifecycle: configuration, token endpoint exchanges,
/// the persisted refresh token, and the interactive browser handshake.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "client_id and/or client_secret not provided - pass them explicitly or set {} and {}",
        crate::config::ENV_CLIENT_ID,
        crate::config::ENV_CLIENT_SECRET
    )]
    MissingCredentials,

    /// The token endpoint answered with an `error` body for a grant other
    /// than a rejected refresh token. Surfaced verbatim, never retried.
    #[error("Spotify token endpoint error: {error}")]
    Provider {
        error: String,
        description: Option<String>,
    },

    /// The refresh token itself was rejected (`invalid_grant`). The caller
    /// falls back to interactive authorization.
    #[error("refresh token no longer valid - interactive login required")]
    RefreshRejected,

    /// No authorization code arrived within the handshake deadline.
    #[error("timed out waiting for the authorization callback")]
    Timeout,

    /// The callback listener went away before delivering a code.
    #[error("authorization callback listener stopped before a code arrived")]
    ListenerClosed,

    #[error("invalid authorization URL: {0}")]
    InvalidUrl(String),

    #[error("token store: {0}")]
    Store(#[from] std::io::Error),

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures of authenticated resource calls.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The retried request failed authorization again; `body` is the
    /// provider's raw response body.
    #[error("request unauthorized after re-authentication: {body}")]
    AuthRetryExhausted { body: String },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("response missing expected field `{0}`")]
    MissingField(String),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}
