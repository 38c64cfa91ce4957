use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::LoginResult;
use crate::error::Result;

/// Supplies the bearer token for authenticated requests
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

/// Fixed token, or none at all
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    token: Option<String>,
}

impl StaticCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

impl CredentialProvider for StaticCredentials {
    fn bearer_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// Login session persisted as JSON on disk
#[derive(Debug)]
pub struct TokenStore {
    path: PathBuf,
    session: RwLock<Option<LoginResult>>,
}

impl TokenStore {
    /// Open the store, loading a previously saved session if one exists.
    ///
    /// An unreadable or corrupt file is treated as logged out.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let session = match tokio::fs::read(&path).await {
            Ok(contents) => match serde_json::from_slice::<LoginResult>(&contents) {
                Ok(session) => {
                    debug!("Loaded session for {} from {:?}", session.name, path);
                    Some(session)
                }
                Err(e) => {
                    warn!("Ignoring corrupt token file {}: {}", path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            session: RwLock::new(session),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current_user(&self) -> Option<LoginResult> {
        self.session.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_some()
    }

    pub async fn save(&self, session: LoginResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let contents = serde_json::to_vec_pretty(&session)?;
        tokio::fs::write(&self.path, contents).await?;

        info!("Saved session for {} to {:?}", session.name, self.path);
        *self.session.write() = Some(session);
        Ok(())
    }

    /// Forget the session. Idempotent.
    pub async fn clear(&self) -> Result<()> {
        *self.session.write() = None;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Removed token file {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl CredentialProvider for TokenStore {
    fn bearer_token(&self) -> Option<String> {
        self.session.read().as_ref().map(|s| s.token.clone())
    }
}
