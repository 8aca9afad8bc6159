//! Persisted sign-in state between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{AuthUser, BearerToken};
use crate::error::AuthError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub user: AuthUser,
    pub id_token: BearerToken,
    pub access_token: BearerToken,
    #[serde(default)]
    pub refresh_token: Option<BearerToken>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// JSON file holding at most one [`StoredSession`].
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing file means signed out.
    pub fn load(&self) -> Result<Option<StoredSession>, AuthError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuthError::Storage(e.to_string())),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| AuthError::Storage(format!("{}: {}", self.path.display(), e)))
    }

    pub fn save(&self, session: &StoredSession) -> Result<(), AuthError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| AuthError::Storage(e.to_string()))?;
        }
        let content = serde_json::to_string_pretty(session)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        write_private(&self.path, &content)
            .map_err(|e| AuthError::Storage(e.to_string()))?;
        tracing::debug!(path = %self.path.display(), "session saved");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), AuthError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuthError::Storage(e.to_string())),
        }
    }
}

/// Write a file only the owner can read. An existing file is tightened too.
fn write_private(path: &Path, content: &str) -> std::io::Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(content.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn session(expires_at: Option<DateTime<Utc>>) -> StoredSession {
        StoredSession {
            user: AuthUser {
                user_id: "sub-1".to_string(),
                username: "chef_anna".to_string(),
            },
            id_token: BearerToken::new("id"),
            access_token: BearerToken::new("access"),
            refresh_token: Some(BearerToken::new("refresh")),
            expires_at,
        }
    }

    #[test]
    fn test_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let file = SessionFile::new(dir.path().join("nested").join("session.json"));

        assert_eq!(file.load().unwrap(), None);

        let stored = session(None);
        file.save(&stored).unwrap();
        assert_eq!(file.load().unwrap(), Some(stored));

        file.clear().unwrap();
        assert_eq!(file.load().unwrap(), None);
        file.clear().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(
            SessionFile::new(path).load(),
            Err(AuthError::Storage(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_saved_session_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        SessionFile::new(path.clone()).save(&session(None)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "session file mode {:o}", mode & 0o777);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let file = SessionFile::new(path.clone());
        file.save(&session(None)).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0, "session file mode {:o}", mode & 0o777);
        assert_eq!(file.load().unwrap(), Some(session(None)));
    }

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        assert!(session(Some(now - Duration::seconds(1))).is_expired(now));
        assert!(!session(Some(now + Duration::minutes(5))).is_expired(now));
        assert!(!session(None).is_expired(now));
    }
}
