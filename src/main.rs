use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use splcli::{cli, config, error};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Log callback listener requests during authorization
    #[clap(long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with the Spotify API
    Auth,

    /// Show the authorized user's profile
    Me,

    /// List the user's playlists
    Playlists,

    /// List the tracks of a playlist
    Tracks(TracksOptions),

    /// Search the catalog
    Search(SearchOptions),

    /// Remove tracks from a playlist
    Remove(RemoveOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct TracksOptions {
    /// Playlist ID
    playlist: String,
}

#[derive(Parser, Debug, Clone)]
pub struct SearchOptions {
    /// Search query
    query: String,

    /// Result kind: track, album, artist or playlist
    #[clap(long, default_value = "track")]
    kind: String,

    /// Number of results to request
    #[clap(long, default_value_t = 20)]
    limit: u32,
}

#[derive(Parser, Debug, Clone)]
pub struct RemoveOptions {
    /// Playlist ID
    playlist: String,

    /// Track URIs to remove (e.g. spotify:track:...)
    #[clap(required = true)]
    uris: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => cli::auth(cli.verbose).await,
        Command::Me => cli::profile(cli.verbose).await,
        Command::Playlists => cli::playlists(cli.verbose).await,
        Command::Tracks(opt) => cli::tracks(opt.playlist, cli.verbose).await,
        Command::Search(opt) => cli::search(opt.query, opt.kind, opt.limit, cli.verbose).await,
        Command::Remove(opt) => cli::remove(opt.playlist, opt.uris, cli.verbose).await,
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
