use serde_json::Value;
use tabled::Table;

use crate::{
    cli::{build_client, spinner},
    error, info,
    types::{SearchTableRow, Track},
    utils, warning,
};

pub async fn search(query: String, kind: String, limit: u32, verbose: bool) {
    let mut client = build_client(!verbose);

    let pb = spinner("Searching...");
    let body = match client.search(&query, &kind, limit).await {
        Ok(body) => {
            pb.finish_and_clear();
            body
        }
        Err(e) => {
            pb.finish_and_clear();
            error!("Search failed: {}", e)
        }
    };

    // the response nests results under the pluralized kind, e.g. `tracks`
    let container = format!("{}s", kind);
    let Some(items) = utils::pluck_items(&body, &[container.as_str(), "items"]) else {
        warning!("No results for '{}' in the response.", container);
        return;
    };

    if items.is_empty() {
        info!("No matches for '{}'.", query);
        return;
    }

    if kind == "track" {
        let rows: Vec<SearchTableRow> = items
            .iter()
            .filter_map(|item| serde_json::from_value::<Track>(item.clone()).ok())
            .map(|track| SearchTableRow {
                name: track.name,
                artists: track
                    .artists
                    .iter()
                    .map(|a| a.name.clone())
                    .collect::<Vec<_>>()
                    .join(", "),
                uri: track.uri,
            })
            .collect();
        println!("{}", Table::new(rows));
        return;
    }

    for item in items {
        let name = item.get("name").and_then(Value::as_str).unwrap_or("-");
        let id = item.get("id").and_then(Value::as_str).unwrap_or("-");
        info!("{} ({})", name, id);
    }
}
