use std::{
    io::{Error, ErrorKind},
    path::{Path, PathBuf},
};

/// Persistence for the refresh token, one plain-text file per client id.
///
/// The access token is never written to disk; only the refresh token
/// survives process restarts.
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// A store rooted at `dir`, keyed by the client id so that multiple
    /// client identities do not collide.
    pub fn new(dir: &Path, client_id: &str) -> Self {
        TokenStore {
            path: dir.join(format!("refresh_token_{}", client_id)),
        }
    }

    /// Reads the persisted refresh token. A missing file is not an error -
    /// it means the user has never authorized (or the token was invalidated)
    /// and the caller falls back to interactive authorization.
    pub async fn load(&self) -> Result<Option<String>, Error> {
        match async_fs::read_to_string(&self.path).await {
            Ok(content) => {
                let token = content.trim().to_string();
                if token.is_empty() {
                    return Ok(None);
                }
                Ok(Some(token))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Overwrites the persisted refresh token.
    ///
    /// Writes to a sibling temp file and renames it into place, so a crash
    /// mid-write leaves either the old token or the new one, never a torn
    /// file that would be trusted on the next start.
    pub async fn save(&self, token: &str) -> Result<(), Error> {
        if let Some(parent) = self.path.parent() {
            async_fs::create_dir_all(parent).await?;
        }

        let tmp = self.path.with_extension("tmp");
        async_fs::write(&tmp, token).await?;
        async_fs::rename(&tmp, &self.path).await
    }

    /// Deletes the persisted refresh token. Deleting an already-missing
    /// token is a success.
    pub async fn invalidate(&self) -> Result<(), Error> {
        match async_fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
