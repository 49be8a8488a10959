use tabled::Table;

use crate::{
    cli::{build_client, spinner},
    error, info,
    types::PlaylistTableRow,
};

/// Spotify caps `/me/playlists` pages at 50 items.
const PAGE_SIZE: u32 = 50;

pub async fn playlists(verbose: bool) {
    let mut client = build_client(!verbose);

    let pb = spinner("Fetching playlists...");
    let playlists = match client.playlists(PAGE_SIZE).await {
        Ok(playlists) => {
            pb.finish_and_clear();
            playlists
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch playlists: {}", e)
        }
    };

    if playlists.is_empty() {
        info!("No playlists found.");
        return;
    }

    let rows: Vec<PlaylistTableRow> = playlists
        .into_iter()
        .map(|p| PlaylistTableRow {
            name: p.name,
            tracks: p.tracks.total,
            visibility: match p.public {
                Some(true) => "public",
                Some(false) => "private",
                None => "unknown",
            }
            .to_string(),
            id: p.id,
        })
        .collect();

    println!("{}", Table::new(rows));
}
