//! Storage for the logged-in user's auth record.
//!
//! [`TokenStore`] keeps the [`AuthData`] returned by `/auth/login` in
//! memory and, when opened with a path, mirrors every change to a JSON
//! file so a restarted process picks up the same session. Tokens are
//! handed out wrapped in [`Zeroizing`] and wiped from memory when the
//! record is replaced or cleared.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use zeroize::{Zeroize, Zeroizing};

use crate::Result;

/// The persisted login session.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthData {
    pub user_id: i64,
    pub name: String,
    pub phone_number: String,
    pub role: String,
    pub token: String,
    pub refresh_token: String,
}

impl AuthData {
    /// Returns `true` for accounts that may manage staff and banks.
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("ADMIN")
    }
}

impl std::fmt::Debug for AuthData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthData")
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("phone_number", &self.phone_number)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

impl Drop for AuthData {
    fn drop(&mut self) {
        self.token.zeroize();
        self.refresh_token.zeroize();
    }
}

/// Thread-safe holder of the current [`AuthData`].
#[derive(Debug, Default)]
pub struct TokenStore {
    path: Option<PathBuf>,
    data: Mutex<Option<AuthData>>,
}

impl TokenStore {
    /// Creates a store that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens a file-backed store, loading the record if the file exists.
    ///
    /// An unreadable or corrupt file is logged and treated as logged out.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<AuthData>(&text) {
                Ok(data) => {
                    debug!(path = %path.display(), "loaded auth record");
                    Some(data)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "ignoring corrupt auth record");
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read auth record");
                None
            }
        };

        Self {
            path: Some(path),
            data: Mutex::new(data),
        }
    }

    /// Returns a copy of the current record.
    pub fn auth_data(&self) -> Option<AuthData> {
        self.lock().clone()
    }

    /// Returns the current access token.
    pub fn access_token(&self) -> Option<Zeroizing<String>> {
        self.lock()
            .as_ref()
            .map(|data| Zeroizing::new(data.token.clone()))
    }

    /// Returns the current refresh token.
    pub fn refresh_token(&self) -> Option<Zeroizing<String>> {
        self.lock()
            .as_ref()
            .map(|data| Zeroizing::new(data.refresh_token.clone()))
    }

    /// Replaces the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`FoodstoreError::Io`](crate::FoodstoreError::Io) or
    /// [`FoodstoreError::Json`](crate::FoodstoreError::Json) if the file
    /// could not be written.
    pub fn save(&self, data: AuthData) -> Result<()> {
        let mut guard = self.lock();
        self.persist(Some(&data))?;
        *guard = Some(data);
        Ok(())
    }

    /// Swaps in a new access/refresh token pair, keeping the user profile.
    ///
    /// Does nothing when no user is logged in.
    ///
    /// # Errors
    ///
    /// Returns an error if the file could not be written.
    pub fn update_tokens(&self, token: &str, refresh_token: &str) -> Result<()> {
        let mut guard = self.lock();
        let Some(current) = guard.as_ref() else {
            return Ok(());
        };
        let mut updated = current.clone();
        updated.token.zeroize();
        updated.refresh_token.zeroize();
        updated.token = token.to_string();
        updated.refresh_token = refresh_token.to_string();
        self.persist(Some(&updated))?;
        *guard = Some(updated);
        Ok(())
    }

    /// Forgets the record and removes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but could not be removed.
    pub fn clear(&self) -> Result<()> {
        let mut guard = self.lock();
        *guard = None;
        self.persist(None)
    }

    fn persist(&self, data: Option<&AuthData>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match data {
            Some(data) => {
                let json = Zeroizing::new(serde_json::to_string_pretty(data)?);
                std::fs::write(path, json.as_bytes())?;
            }
            None => match std::fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            },
        }
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<AuthData>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}
