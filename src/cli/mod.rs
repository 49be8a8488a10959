//! # CLI Module
//!
//! The command-line interface layer: one function per subcommand, each
//! delegating to the [`crate::spotify`] client and handling user feedback.
//!
//! ## Commands
//!
//! ### Authentication
//!
//! - [`auth`] - Forces the interactive Spotify authorization handshake
//!
//! ### Catalog and playlists
//!
//! - [`profile`] - Shows the authorized user's profile
//! - [`playlists`] - Lists the user's playlists as a table
//! - [`tracks`] - Lists a playlist's tracks as a table
//! - [`search`] - Searches the catalog
//! - [`remove`] - Removes tracks from a playlist
//!
//! Every command resolves the client configuration from the environment and
//! terminates with a clear message when the application credentials are
//! missing. Commands that hit the API may transparently run the interactive
//! handshake when no valid token is available.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::{config::ClientConfig, error, spotify::SpotifyClient};

mod auth;
mod playlists;
mod profile;
mod remove;
mod search;
mod tracks;

pub use auth::auth;
pub use playlists::playlists;
pub use profile::profile;
pub use remove::remove;
pub use search::search;
pub use tracks::tracks;

/// Builds the API client from the environment, exiting with a configuration
/// error message when the credentials are missing.
fn build_client(quiet: bool) -> SpotifyClient {
    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => error!("{}", e),
    };
    config.quiet = quiet;
    SpotifyClient::new(&config)
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb
}
