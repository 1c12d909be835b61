//! Session persistence
//!
//! The token triple lives in a small JSON file under the platform config
//! directory. An environment variable carrying the same triple takes
//! precedence over the file.

use crate::{
    Result,
    config::{Settings, loader::APP_DIR_NAME},
    types::Session,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable holding `access:refresh:user_session`
pub const SESSION_ENV_VAR: &str = "RIVIAN_SESSION";

const SESSION_FILE_NAME: &str = "session.json";

/// Loads and saves the long-lived login tokens
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    env_session: Option<String>,
}

impl SessionStore {
    /// Store backed by `path` only
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            env_session: None,
        }
    }

    /// Store for the configured session file, honouring `RIVIAN_SESSION`
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let path = match &settings.auth.session_file {
            Some(path) => path.clone(),
            None => Self::default_path().ok_or_else(|| {
                crate::Error::config("session_file", "No config directory available")
            })?,
        };

        Ok(Self::new(path).with_env_session(std::env::var(SESSION_ENV_VAR).ok()))
    }

    /// Default location, `<config_dir>/rivian-telemetry/session.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(SESSION_FILE_NAME))
    }

    /// Override the delimited session value normally read from the environment
    pub fn with_env_session(mut self, value: Option<String>) -> Self {
        self.env_session = value.filter(|v| !v.trim().is_empty());
        self
    }

    /// Session file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Restore the session
    ///
    /// Fails with [`crate::Error::AuthRequired`] when neither the environment
    /// nor the session file provides one.
    ///
    /// ```
    /// use rivian_telemetry::session::SessionStore;
    ///
    /// # tokio_test::block_on(async {
    /// let store = SessionStore::new("/nonexistent/session.json")
    ///     .with_env_session(Some("access:refresh:user".to_string()));
    /// let session = store.load().await.unwrap();
    /// assert_eq!(session.user_session_token, "user");
    /// # });
    /// ```
    pub async fn load(&self) -> Result<Session> {
        if let Some(value) = &self.env_session {
            debug!("Using session from {}", SESSION_ENV_VAR);
            return Session::from_delimited(value).map_err(|e| match e {
                crate::Error::Validation { message, .. } => {
                    crate::Error::config(SESSION_ENV_VAR.to_string(), message)
                }
                other => other,
            });
        }

        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(crate::Error::auth_required(format!(
                    "no session file at {}",
                    self.path.display()
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let session: Session = serde_json::from_str(&content).map_err(|e| {
            crate::Error::auth_required(format!(
                "session file {} is unreadable: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), "Loaded session file");
        Ok(session)
    }

    /// Persist the session, replacing any previous file
    pub async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(session)?;
        tokio::fs::write(&self.path, content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600)).await?;
        }

        info!(path = %self.path.display(), "Session saved");
        Ok(())
    }
}
