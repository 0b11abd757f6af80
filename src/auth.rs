//! Back-office authentication: login, logout, and token refresh.
//!
//! Every authenticated call carries the access token as a bearer header.
//! When the backend answers `401`, callers exchange the refresh token via
//! `POST /auth/refresh` and retry once; if the exchange itself fails the
//! session is invalidated and the user has to log in again.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use zeroize::Zeroizing;

use crate::credentials::{AuthData, TokenStore};
use crate::{FoodstoreError, Result};

/// Supplies bearer tokens to the REST client and the order stream.
pub trait TokenProvider: Send + Sync + 'static {
    /// Returns the current access token, if logged in.
    fn access_token(&self) -> Option<Zeroizing<String>>;

    /// Exchanges the refresh token for a new token pair.
    fn refresh(&self) -> impl Future<Output = Result<()>> + Send;

    /// Called once the session can no longer be recovered.
    fn invalidate_session(&self);
}

/// Whether a request is the first try or the single retry after a refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuthAttempt {
    Initial,
    Refreshed,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    phone_number: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    token: Option<String>,
    refresh_token: Option<String>,
}

type InvalidationHook = Box<dyn Fn() + Send + Sync>;

/// A logged-in (or logged-out) back-office session.
///
/// Implements [`TokenProvider`] over a [`TokenStore`].
pub struct Session {
    client: reqwest::Client,
    base_url: String,
    store: TokenStore,
    on_invalidated: Option<InvalidationHook>,
}

impl Session {
    /// Creates a session talking to `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, store: TokenStore) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            store,
            on_invalidated: None,
        }
    }

    /// Registers the hook run after the stored credentials are cleared by
    /// [`TokenProvider::invalidate_session`].
    #[must_use]
    pub fn with_invalidation_hook(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_invalidated = Some(Box::new(hook));
        self
    }

    /// The underlying credential store.
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Logs in with a phone number and password and stores the session.
    ///
    /// # Errors
    ///
    /// Returns [`FoodstoreError::Auth`] if the backend rejects the
    /// credentials, or an HTTP/JSON error if the call fails.
    pub async fn login(&self, phone_number: &str, password: &str) -> Result<AuthData> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest {
                phone_number,
                password,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let detail = if body.is_empty() {
                status.canonical_reason().unwrap_or("").to_string()
            } else {
                body
            };
            return Err(FoodstoreError::Auth(format!(
                "Login failed: {} {detail}",
                status.as_u16()
            )));
        }

        let data: AuthData = response.json().await?;
        self.store.save(data.clone())?;
        info!(user_id = data.user_id, role = %data.role, "Logged in");
        Ok(data)
    }

    /// Logs out on the backend and clears the local session.
    ///
    /// Backend failures are logged and otherwise ignored; the local
    /// session is always cleared.
    ///
    /// # Errors
    ///
    /// Returns an error only if the persisted record could not be removed.
    pub async fn logout(&self) -> Result<()> {
        if let Some(token) = self.store.access_token() {
            let result = self
                .client
                .post(format!("{}/auth/logout", self.base_url))
                .bearer_auth(token.as_str())
                .send()
                .await;
            if let Err(e) = result {
                warn!("Logout call failed: {e}");
            }
        }
        self.store.clear()?;
        info!("Logged out");
        Ok(())
    }
}

impl TokenProvider for Session {
    fn access_token(&self) -> Option<Zeroizing<String>> {
        self.store.access_token()
    }

    async fn refresh(&self) -> Result<()> {
        let Some(refresh_token) = self.store.refresh_token() else {
            return Err(FoodstoreError::Auth("no refresh token available".to_string()));
        };

        let response = self
            .client
            .post(format!("{}/auth/refresh", self.base_url))
            .json(&RefreshRequest {
                refresh_token: refresh_token.as_str(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "Token refresh rejected");
            return Err(FoodstoreError::status(response.status()));
        }

        let body: RefreshResponse = response.json().await?;
        match (body.token, body.refresh_token) {
            (Some(token), Some(refresh_token)) => {
                let token = Zeroizing::new(token);
                let refresh_token = Zeroizing::new(refresh_token);
                self.store.update_tokens(&token, &refresh_token)?;
                info!("Refreshed access token");
                Ok(())
            }
            _ => Err(FoodstoreError::Auth(
                "refresh response is missing a token".to_string(),
            )),
        }
    }

    fn invalidate_session(&self) {
        if let Err(e) = self.store.clear() {
            error!("Failed to clear auth record: {e}");
        }
        info!("Session invalidated");
        if let Some(hook) = &self.on_invalidated {
            hook();
        }
    }
}
