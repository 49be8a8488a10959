use crate::{cli::build_client, error, success, types::ItemRef};

pub async fn remove(playlist: String, uris: Vec<String>, verbose: bool) {
    let mut client = build_client(!verbose);

    match client.remove_tracks(ItemRef::Id(playlist), &uris).await {
        Ok(snapshot_id) => success!(
            "Removed {} track(s). New snapshot: {}",
            uris.len(),
            snapshot_id
        ),
        Err(e) => error!("Failed to remove tracks: {}", e),
    }
}
