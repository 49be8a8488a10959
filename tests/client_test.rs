use std::{
    collections::HashMap,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Form, Json, Router,
    extract::{Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde_json::{Value, json};

use splcli::{
    config::ClientConfig,
    error::{ApiError, AuthError},
    management::TokenStore,
    spotify::{SpotifyClient, auth::Authenticator},
    types::ItemRef,
};

// Serves a scripted provider on an ephemeral local port
async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("splcli-client-{}-{}", name, std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn test_config(addr: SocketAddr, store_dir: PathBuf) -> ClientConfig {
    ClientConfig {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
        scope: "user-library-read".to_string(),
        redirect_uri: "http://localhost:8090/oauth2callback".to_string(),
        server_addr: "127.0.0.1:0".to_string(),
        auth_url: format!("http://{}/authorize", addr),
        token_url: format!("http://{}/api/token", addr),
        api_url: format!("http://{}/v1", addr),
        token_store_dir: store_dir,
        quiet: true,
        auth_timeout: Duration::from_secs(2),
    }
}

// Token endpoint that counts calls and always answers with `response`
fn token_route(counter: Arc<AtomicUsize>, response: Value) -> axum::routing::MethodRouter {
    post(move |Form(_): Form<HashMap<String, String>>| {
        let counter = Arc::clone(&counter);
        let response = response.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Json(response)
        }
    })
}

#[tokio::test]
async fn test_stored_refresh_token_yields_access_token_without_handshake() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/token",
        post({
            let token_calls = Arc::clone(&token_calls);
            move |Form(form): Form<HashMap<String, String>>| {
                let token_calls = Arc::clone(&token_calls);
                async move {
                    token_calls.fetch_add(1, Ordering::SeqCst);
                    // the refresh grant carries all form fields of the token contract
                    assert_eq!(
                        form.get("grant_type").map(String::as_str),
                        Some("refresh_token")
                    );
                    assert_eq!(
                        form.get("refresh_token").map(String::as_str),
                        Some("AQD-stored")
                    );
                    assert_eq!(form.get("client_id").map(String::as_str), Some("test-client"));
                    assert_eq!(
                        form.get("client_secret").map(String::as_str),
                        Some("test-secret")
                    );
                    assert_eq!(
                        form.get("redirect_uri").map(String::as_str),
                        Some("http://localhost:8090/oauth2callback")
                    );
                    assert_eq!(
                        form.get("scope").map(String::as_str),
                        Some("user-library-read")
                    );
                    Json(json!({
                        "access_token": "BQC-fresh",
                        "refresh_token": "AQD-rotated",
                        "expires_in": 3600
                    }))
                }
            }
        }),
    );
    let addr = spawn_server(app).await;

    let dir = temp_dir("silent-refresh");
    let store = TokenStore::new(&dir, "test-client");
    store.save("AQD-stored").await.unwrap();

    let config = test_config(addr, dir.clone());
    let mut auth = Authenticator::new(&config);

    let token = auth.access_token().await.unwrap();
    assert_eq!(token, "BQC-fresh");
    assert_eq!(token_calls.load(Ordering::SeqCst), 1);

    // second call hits the in-memory cache
    let again = auth.access_token().await.unwrap();
    assert_eq!(again, "BQC-fresh");
    assert_eq!(token_calls.load(Ordering::SeqCst), 1);

    // the rotated refresh token was persisted
    assert_eq!(store.load().await.unwrap().as_deref(), Some("AQD-rotated"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_refresh_without_rotation_keeps_stored_token() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/token",
        token_route(
            Arc::clone(&token_calls),
            json!({"access_token": "BQC-fresh", "expires_in": 3600}),
        ),
    );
    let addr = spawn_server(app).await;

    let dir = temp_dir("no-rotation");
    let store = TokenStore::new(&dir, "test-client");
    store.save("AQD-stored").await.unwrap();

    let config = test_config(addr, dir.clone());
    let mut auth = Authenticator::new(&config);

    let token = auth.access_token().await.unwrap();
    assert_eq!(token, "BQC-fresh");

    // no refresh_token in the response - the stored one must survive
    assert_eq!(store.load().await.unwrap().as_deref(), Some("AQD-stored"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_rejected_refresh_token_is_deleted() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/token",
        token_route(
            Arc::clone(&token_calls),
            json!({"error": "invalid_grant", "error_description": "Refresh token revoked"}),
        ),
    );
    let addr = spawn_server(app).await;

    let dir = temp_dir("invalid-grant");
    let store = TokenStore::new(&dir, "test-client");
    store.save("AQD-stale").await.unwrap();

    let config = test_config(addr, dir.clone());
    let mut auth = Authenticator::new(&config);

    // not an error: the caller falls back to interactive authorization
    let outcome = auth.refresh_silently().await.unwrap();
    assert!(outcome.is_none());

    // the stale token is gone and nothing is cached
    assert!(store.load().await.unwrap().is_none());
    assert!(auth.cached_access_token().is_none());

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_other_refresh_errors_are_fatal_and_keep_token() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let app = Router::new().route(
        "/api/token",
        token_route(
            Arc::clone(&token_calls),
            json!({"error": "server_error"}),
        ),
    );
    let addr = spawn_server(app).await;

    let dir = temp_dir("server-error");
    let store = TokenStore::new(&dir, "test-client");
    store.save("AQD-stored").await.unwrap();

    let config = test_config(addr, dir.clone());
    let mut auth = Authenticator::new(&config);

    let err = auth.refresh_silently().await.unwrap_err();
    assert!(matches!(err, AuthError::Provider { ref error, .. } if error == "server_error"));

    // a transient provider failure must not discard a valid refresh token
    assert_eq!(store.load().await.unwrap().as_deref(), Some("AQD-stored"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_single_unauthorized_response_is_retried_once() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let api_calls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route(
            "/v1/me",
            get({
                let api_calls = Arc::clone(&api_calls);
                move || {
                    let api_calls = Arc::clone(&api_calls);
                    async move {
                        let call = api_calls.fetch_add(1, Ordering::SeqCst);
                        if call == 0 {
                            (
                                StatusCode::UNAUTHORIZED,
                                Json(json!({"error": {"status": 401, "message": "The access token expired"}})),
                            )
                                .into_response()
                        } else {
                            Json(json!({"id": "tester", "display_name": "Tester"}))
                                .into_response()
                        }
                    }
                }
            }),
        );
    let addr = spawn_server(app).await;

    let dir = temp_dir("retry-once");
    let store = TokenStore::new(&dir, "test-client");
    store.save("AQD-stored").await.unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    let profile = client.me().await.unwrap();
    assert_eq!(profile.id, "tester");

    // first call fails, retry succeeds - and exactly one re-acquisition
    assert_eq!(api_calls.load(Ordering::SeqCst), 2);
    assert_eq!(token_calls.load(Ordering::SeqCst), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_second_unauthorized_response_is_fatal() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let api_calls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route(
            "/v1/me",
            get({
                let api_calls = Arc::clone(&api_calls);
                move || {
                    let api_calls = Arc::clone(&api_calls);
                    async move {
                        api_calls.fetch_add(1, Ordering::SeqCst);
                        (
                            StatusCode::UNAUTHORIZED,
                            Json(json!({"error": {"status": 401, "message": "The access token expired"}})),
                        )
                    }
                }
            }),
        );
    let addr = spawn_server(app).await;

    let dir = temp_dir("retry-exhausted");
    TokenStore::new(&dir, "test-client")
        .save("AQD-stored")
        .await
        .unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    let err = client.me().await.unwrap_err();
    assert!(
        matches!(err, ApiError::AuthRetryExhausted { ref body } if body.contains("The access token expired"))
    );

    // no third attempt
    assert_eq!(api_calls.load(Ordering::SeqCst), 2);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_non_authorization_errors_pass_through() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let api_calls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route(
            "/v1/me",
            get({
                let api_calls = Arc::clone(&api_calls);
                move || {
                    let api_calls = Arc::clone(&api_calls);
                    async move {
                        api_calls.fetch_add(1, Ordering::SeqCst);
                        (StatusCode::NOT_FOUND, Json(json!({"error": {"status": 404}})))
                    }
                }
            }),
        );
    let addr = spawn_server(app).await;

    let dir = temp_dir("passthrough");
    TokenStore::new(&dir, "test-client")
        .save("AQD-stored")
        .await
        .unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    // send() hands the response back untouched, no retry
    let response = client
        .send(
            reqwest::Method::GET,
            &format!("http://{}/v1/me", addr),
            None,
        )
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert_eq!(api_calls.load(Ordering::SeqCst), 1);

    let _ = std::fs::remove_dir_all(&dir);
}

fn paged_route(offsets: Arc<Mutex<Vec<u32>>>, total: usize) -> axum::routing::MethodRouter {
    get(move |Query(params): Query<HashMap<String, String>>| {
        let offsets = Arc::clone(&offsets);
        async move {
            let limit: usize = params.get("limit").unwrap().parse().unwrap();
            let offset: usize = params.get("offset").unwrap().parse().unwrap();
            offsets.lock().unwrap().push(offset as u32);

            let end = (offset + limit).min(total);
            let items: Vec<Value> = (offset..end.max(offset))
                .map(|i| json!({"n": i}))
                .collect();
            Json(json!({"items": items}))
        }
    })
}

#[tokio::test]
async fn test_pagination_concatenates_partial_last_page() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let offsets = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route("/v1/collection", paged_route(Arc::clone(&offsets), 47));
    let addr = spawn_server(app).await;

    let dir = temp_dir("pages-47");
    TokenStore::new(&dir, "test-client")
        .save("AQD-stored")
        .await
        .unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    let items = client
        .paginate(&format!("http://{}/v1/collection", addr), 20, &["items"])
        .await
        .unwrap();

    // pages of 20, 20 and 7 - three requests, no fourth
    assert_eq!(items.len(), 47);
    assert_eq!(*offsets.lock().unwrap(), vec![0, 20, 40]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_pagination_exact_limit_tail_costs_one_empty_request() {
    let token_calls = Arc::new(AtomicUsize::new(0));
    let offsets = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route("/v1/collection", paged_route(Arc::clone(&offsets), 40));
    let addr = spawn_server(app).await;

    let dir = temp_dir("pages-40");
    TokenStore::new(&dir, "test-client")
        .save("AQD-stored")
        .await
        .unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    let items = client
        .paginate(&format!("http://{}/v1/collection", addr), 20, &["items"])
        .await
        .unwrap();

    assert_eq!(items.len(), 40);
    // the final full page cannot be recognized as last - one empty request follows
    assert_eq!(*offsets.lock().unwrap(), vec![0, 20, 40]);

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_playlist_tracks_accepts_playlist_object() {
    let token_calls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route(
            "/v1/playlists/{id}/tracks",
            get(
                |Path(id): Path<String>, Query(params): Query<HashMap<String, String>>| async move {
                    assert_eq!(id, "pl-obj");
                    let limit: usize = params.get("limit").unwrap().parse().unwrap();
                    let offset: usize = params.get("offset").unwrap().parse().unwrap();
                    let total = 3usize;
                    let end = (offset + limit).min(total);
                    let items: Vec<Value> = (offset..end.max(offset))
                        .map(|i| {
                            json!({
                                "added_at": "2024-01-05T10:00:00Z",
                                "track": {
                                    "id": format!("t{}", i),
                                    "name": format!("Track {}", i),
                                    "uri": format!("spotify:track:t{}", i),
                                    "artists": [{"id": "a1", "name": "Artist"}]
                                }
                            })
                        })
                        .collect();
                    Json(json!({"items": items}))
                },
            ),
        );
    let addr = spawn_server(app).await;

    let dir = temp_dir("flexible-ref");
    TokenStore::new(&dir, "test-client")
        .save("AQD-stored")
        .await
        .unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    // a previously fetched playlist object stands in for the raw ID
    let playlist = json!({"id": "pl-obj", "name": "Mix"});
    let entries = client
        .playlist_tracks(ItemRef::from(playlist), 100)
        .await
        .unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].track.as_ref().unwrap().name, "Track 0");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_track_lookup_accepts_object_or_id() {
    let token_calls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route(
            "/v1/tracks/{id}",
            get(|Path(id): Path<String>| async move {
                Json(json!({
                    "id": id,
                    "name": "Cloudbusting",
                    "uri": format!("spotify:track:{}", id),
                    "artists": [{"id": "a7", "name": "Kate Bush"}]
                }))
            }),
        );
    let addr = spawn_server(app).await;

    let dir = temp_dir("track-lookup");
    TokenStore::new(&dir, "test-client")
        .save("AQD-stored")
        .await
        .unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    let by_id = client.track(ItemRef::from("trk1")).await.unwrap();
    assert_eq!(by_id.name, "Cloudbusting");
    assert_eq!(by_id.uri, "spotify:track:trk1");

    // a fetched response object resolves through its id field
    let by_object = client
        .track(ItemRef::from(json!({"id": "trk2", "name": "ignored"})))
        .await
        .unwrap();
    assert_eq!(by_object.uri, "spotify:track:trk2");

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_authorize_url_carries_the_grant_parameters() {
    let dir = temp_dir("authorize-url");
    let config = test_config("127.0.0.1:9".parse().unwrap(), dir.clone());
    let auth = Authenticator::new(&config);

    let url = reqwest::Url::parse(&auth.authorize_url().unwrap()).unwrap();
    let pairs: HashMap<String, String> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    assert_eq!(pairs.get("client_id").map(String::as_str), Some("test-client"));
    assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
    assert_eq!(
        pairs.get("redirect_uri").map(String::as_str),
        Some("http://localhost:8090/oauth2callback")
    );
    assert_eq!(
        pairs.get("scope").map(String::as_str),
        Some("user-library-read")
    );
    // the secret never appears in the user-facing URL
    assert!(!pairs.contains_key("client_secret"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn test_remove_tracks_sends_uris_and_returns_snapshot() {
    let token_calls = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route(
            "/api/token",
            token_route(
                Arc::clone(&token_calls),
                json!({"access_token": "BQC-fresh"}),
            ),
        )
        .route(
            "/v1/playlists/{id}/tracks",
            delete(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                assert_eq!(id, "pl9");
                let uris: Vec<&str> = body["tracks"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|t| t["uri"].as_str().unwrap())
                    .collect();
                assert_eq!(uris, vec!["spotify:track:aaa", "spotify:track:bbb"]);
                Json(json!({"snapshot_id": "snap-2"}))
            }),
        );
    let addr = spawn_server(app).await;

    let dir = temp_dir("remove");
    TokenStore::new(&dir, "test-client")
        .save("AQD-stored")
        .await
        .unwrap();

    let config = test_config(addr, dir.clone());
    let mut client = SpotifyClient::new(&config);

    let uris = vec![
        "spotify:track:aaa".to_string(),
        "spotify:track:bbb".to_string(),
    ];
    let snapshot = client
        .remove_tracks(ItemRef::Id("pl9".to_string()), &uris)
        .await
        .unwrap();

    assert_eq!(snapshot, "snap-2");

    let _ = std::fs::remove_dir_all(&dir);
}
