use axum::{Extension, Router, routing::get};
use std::{net::SocketAddr, str::FromStr};

use crate::{api, error, spotify::auth::SharedAuthorization};

/// Serves the OAuth callback endpoint until the surrounding handshake tears
/// the task down.
pub async fn start_callback_server(addr: String, state: SharedAuthorization) {
    let app = Router::new()
        .route("/health", get(api::health))
        .route("/oauth2callback", get(api::callback).layer(Extension(state)));

    let addr = match SocketAddr::from_str(&addr) {
        Ok(addr) => addr,
        Err(e) => error!("Failed to parse server address: {}", e),
    };

    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
