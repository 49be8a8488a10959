use crate::{cli::build_client, error, success};

pub async fn auth(verbose: bool) {
    let mut client = build_client(!verbose);

    match client.login().await {
        Ok(()) => success!("Authentication successful!"),
        Err(e) => error!("Authentication failed: {}", e),
    }
}
