use std::collections::HashMap;

use axum::{Extension, extract::Query, response::Html};

use crate::{error::AuthError, info, spotify::auth::SharedAuthorization};

/// Handles the provider redirect that ends the interactive handshake.
///
/// Exactly one code is accepted per listener lifetime: the completion sender
/// is taken by the first request carrying a `code` or an `error`. A stray
/// request with neither leaves the handshake armed.
pub async fn callback(
    Query(params): Query<HashMap<String, String>>,
    Extension(shared_state): Extension<SharedAuthorization>,
) -> Html<String> {
    let mut state = shared_state.lock().await;

    if !state.quiet {
        info!("Handling authorization callback request");
    }

    let Some(sender) = state.sender.take() else {
        return Html("No authorization in progress.".to_string());
    };

    if let Some(error) = params.get("error") {
        let text = format!("Authorization failed: {}", error);
        let _ = sender.send(Err(AuthError::Provider {
            error: error.clone(),
            description: params.get("error_description").cloned(),
        }));
        return Html(text);
    }

    let Some(code) = params.get("code") else {
        state.sender = Some(sender);
        return Html("Missing authorization code.".to_string());
    };

    match state.exchanger.exchange_code(code).await {
        Ok(grant) => {
            let _ = sender.send(Ok(grant));
            Html("Authentication complete".to_string())
        }
        Err(e) => {
            let text = format!("Authentication failed: {}", e);
            let _ = sender.send(Err(e));
            Html(text)
        }
    }
}
