use std::{sync::Arc, time::Duration};

use reqwest::Client;
use tokio::sync::{Mutex, oneshot};

use crate::{
    config::ClientConfig,
    error::AuthError,
    management::TokenStore,
    server::start_callback_server,
    types::{TokenGrant, TokenResponse},
    utils, warning,
};

/// How long the listener gets to finish binding before the browser opens.
const BIND_GRACE: Duration = Duration::from_millis(500);

/// Performs the two grant exchanges against the provider's token endpoint.
///
/// Both grants are a single form-encoded POST carrying the client
/// credentials, redirect URI and scope plus the grant-specific field. The
/// scope sent here is advisory; the scope granted at authorization time
/// determines what the resulting tokens can do.
#[derive(Clone)]
pub struct TokenExchanger {
    http: Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    scope: String,
}

impl TokenExchanger {
    pub fn new(config: &ClientConfig) -> Self {
        TokenExchanger {
            http: Client::new(),
            token_url: config.token_url.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
            scope: config.scope.clone(),
        }
    }

    /// Exchanges an authorization code received on the callback for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenGrant, AuthError> {
        self.request_token(&[("code", code), ("grant_type", "authorization_code")])
            .await
    }

    /// Exchanges a refresh token for a fresh access token.
    ///
    /// An `invalid_grant` answer means the refresh token itself is no longer
    /// valid and maps to [`AuthError::RefreshRejected`]; any other provider
    /// error is fatal and surfaced verbatim.
    pub async fn exchange_refresh(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        match self
            .request_token(&[("refresh_token", refresh_token), ("grant_type", "refresh_token")])
            .await
        {
            Err(AuthError::Provider { error, .. }) if error == "invalid_grant" => {
                Err(AuthError::RefreshRejected)
            }
            other => other,
        }
    }

    async fn request_token(&self, grant_params: &[(&str, &str)]) -> Result<TokenGrant, AuthError> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("scope", self.scope.as_str()),
        ];
        form.extend_from_slice(grant_params);

        let response = self.http.post(&self.token_url).form(&form).send().await?;
        let body: TokenResponse = response.json().await?;

        match body.access_token {
            Some(access_token) => Ok(TokenGrant {
                access_token,
                refresh_token: body.refresh_token,
            }),
            None => Err(AuthError::Provider {
                error: body.error.unwrap_or_else(|| "unknown".to_string()),
                description: body.error_description,
            }),
        }
    }
}

/// State shared with the callback handler while a handshake is pending.
///
/// The sender is taken by the first request that carries a code or a
/// provider error, so exactly one outcome is accepted per listener lifetime.
pub struct PendingAuthorization {
    pub exchanger: TokenExchanger,
    pub sender: Option<oneshot::Sender<Result<TokenGrant, AuthError>>>,
    pub quiet: bool,
}

pub type SharedAuthorization = Arc<Mutex<PendingAuthorization>>;

/// Owns the token state for one client-id-scoped instance: the in-memory
/// access token, the exchanger, and the persisted refresh token.
///
/// The access token is held in memory only and assumed valid until a request
/// proves otherwise - there is no proactive expiry check.
pub struct Authenticator {
    exchanger: TokenExchanger,
    store: TokenStore,
    access_token: Option<String>,
    auth_url: String,
    server_addr: String,
    quiet: bool,
    auth_timeout: Duration,
}

impl Authenticator {
    pub fn new(config: &ClientConfig) -> Self {
        Authenticator {
            exchanger: TokenExchanger::new(config),
            store: TokenStore::new(&config.token_store_dir, &config.client_id),
            access_token: None,
            auth_url: config.auth_url.clone(),
            server_addr: config.server_addr.clone(),
            quiet: config.quiet,
            auth_timeout: config.auth_timeout,
        }
    }

    /// Returns a bearer token, acquiring one if nothing is cached.
    ///
    /// Acquisition order: the cached access token; otherwise a silent
    /// exchange of the persisted refresh token; otherwise the full
    /// interactive handshake in the user's browser.
    pub async fn access_token(&mut self) -> Result<String, AuthError> {
        if let Some(token) = &self.access_token {
            return Ok(token.clone());
        }
        if let Some(token) = self.refresh_silently().await? {
            return Ok(token);
        }
        self.authorize_interactive().await
    }

    /// Attempts to mint an access token from the persisted refresh token.
    ///
    /// Returns `Ok(None)` when no refresh token is stored, or when the
    /// provider rejected it - in that case the stale token is deleted and
    /// the in-memory access token cleared, forcing a return to interactive
    /// authorization. Any other provider error is fatal.
    pub async fn refresh_silently(&mut self) -> Result<Option<String>, AuthError> {
        let Some(refresh_token) = self.store.load().await? else {
            return Ok(None);
        };

        match self.exchanger.exchange_refresh(&refresh_token).await {
            Ok(grant) => {
                self.apply_grant(&grant).await?;
                Ok(Some(grant.access_token))
            }
            Err(AuthError::RefreshRejected) => {
                self.access_token = None;
                self.store.invalidate().await?;
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs the interactive authorization handshake.
    ///
    /// Spawns the local callback listener, opens the provider authorization
    /// URL in the default browser and waits for the redirect to deliver a
    /// code, bounded by the configured deadline. The listener is torn down
    /// on every exit path.
    pub async fn authorize_interactive(&mut self) -> Result<String, AuthError> {
        let (sender, receiver) = oneshot::channel();
        let state: SharedAuthorization = Arc::new(Mutex::new(PendingAuthorization {
            exchanger: self.exchanger.clone(),
            sender: Some(sender),
            quiet: self.quiet,
        }));

        let listener = tokio::spawn(start_callback_server(
            self.server_addr.clone(),
            Arc::clone(&state),
        ));

        // let the listener finish binding before the redirect can arrive
        tokio::time::sleep(BIND_GRACE).await;

        let auth_url = self.authorize_url()?;
        if webbrowser::open(&auth_url).is_err() {
            warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                auth_url
            );
        }

        let outcome = tokio::time::timeout(self.auth_timeout, receiver).await;
        listener.abort();

        let grant = match outcome {
            Err(_) => return Err(AuthError::Timeout),
            Ok(Err(_)) => return Err(AuthError::ListenerClosed),
            Ok(Ok(result)) => result?,
        };

        self.apply_grant(&grant).await?;
        Ok(grant.access_token)
    }

    /// Drops the cached access token so the next call re-acquires one.
    pub fn invalidate(&mut self) {
        self.access_token = None;
    }

    pub fn cached_access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// The provider authorization URL the user consents on.
    pub fn authorize_url(&self) -> Result<String, AuthError> {
        utils::expand_url(
            &self.auth_url,
            &[
                ("client_id", self.exchanger.client_id.clone()),
                ("response_type", "code".to_string()),
                ("redirect_uri", self.exchanger.redirect_uri.clone()),
                ("scope", self.exchanger.scope.clone()),
            ],
        )
        .map_err(|e| AuthError::InvalidUrl(e.to_string()))
    }

    async fn apply_grant(&mut self, grant: &TokenGrant) -> Result<(), AuthError> {
        self.access_token = Some(grant.access_token.clone());
        // a refresh grant does not always rotate the refresh token; never
        // overwrite the stored one with nothing
        if let Some(refresh_token) = &grant.refresh_token {
            self.store.save(refresh_token).await?;
        }
        Ok(())
    }
}
