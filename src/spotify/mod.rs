//! # Spotify Integration Module
//!
//! The integration layer between splcli and the Spotify Web API: the OAuth2
//! authorization-code flow and the authenticated resource calls built on it.
//!
//! ## Core Modules
//!
//! ### Authentication Module
//!
//! [`auth`] - Implements the OAuth 2.0 authorization code flow:
//! - **Token Exchange**: Code-for-token and refresh-token-for-token grants
//!   against the provider's token endpoint
//! - **Token Ownership**: One [`auth::Authenticator`] owns the in-memory
//!   access token and the persisted refresh token per client id
//! - **Browser Integration**: Automatic browser launch for user consent
//! - **Local Callback Listener**: Temporary HTTP server receiving the
//!   authorization redirect, torn down when the handshake ends
//!
//! ### Client Module
//!
//! [`client`] - The authenticated request surface:
//! - **Bearer Wrapping**: Every call carries the current access token
//! - **Single Retry**: One forced re-authentication and retry on a 401;
//!   a second 401 is surfaced with the provider's body
//! - **Convenience Methods**: Profile, playlists, playlist tracks, track
//!   removal, track lookup and catalog search
//! - **Pagination**: A generic fetch-all-pages helper over offset/limit
//!   listings
//!
//! ## Error Types
//!
//! All operations return `Result` with the typed errors in [`crate::error`]:
//! - **`AuthError`** - token lifecycle failures
//! - **`ApiError`** - resource request failures

pub mod auth;
pub mod client;

pub use client::SpotifyClient;
