use crate::{cli::build_client, error, info};

pub async fn profile(verbose: bool) {
    let mut client = build_client(!verbose);

    match client.me().await {
        Ok(profile) => {
            info!("User ID: {}", profile.id);
            info!(
                "Display name: {}",
                profile.display_name.unwrap_or_else(|| "-".to_string())
            );
            if let Some(product) = profile.product {
                info!("Product: {}", product);
            }
        }
        Err(e) => error!("Failed to fetch profile: {}", e),
    }
}
