use tabled::Table;

use crate::{
    cli::{build_client, spinner},
    error, info,
    types::{ItemRef, TrackTableRow},
    utils,
};

/// Spotify caps `/playlists/{id}/tracks` pages at 100 items.
const PAGE_SIZE: u32 = 100;

pub async fn tracks(playlist: String, verbose: bool) {
    let mut client = build_client(!verbose);

    let pb = spinner("Fetching playlist tracks...");
    let entries = match client
        .playlist_tracks(ItemRef::Id(playlist), PAGE_SIZE)
        .await
    {
        Ok(entries) => {
            pb.finish_and_clear();
            entries
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Failed to fetch playlist tracks: {}", e)
        }
    };

    // entries without a track are removed or otherwise unavailable
    let rows: Vec<TrackTableRow> = entries
        .into_iter()
        .filter_map(|entry| {
            let track = entry.track?;
            Some(TrackTableRow {
                added: entry
                    .added_at
                    .as_deref()
                    .map(utils::format_added_at)
                    .unwrap_or_else(|| "-".to_string()),
                name: track.name,
                artists: track
                    .artists
                    .iter()
                    .map(|a| a.name.clone())
                    .collect::<Vec<_>>()
                    .join(", "),
                uri: track.uri,
            })
        })
        .collect();

    if rows.is_empty() {
        info!("Playlist has no tracks.");
        return;
    }

    println!("{}", Table::new(rows));
}
