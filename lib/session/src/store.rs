//! Local persistence of the session record.
//!
//! The client keeps four values between runs: the access token, the refresh
//! token, the role and the user id. They are stored together as one JSON
//! record so that a crash can never leave a half-written mix of old and new
//! values behind.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use instar_core::UserId;
use instar_platform_access::Role;
use instar_core::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;

/// The persisted session record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// Key-value persistence for the session record.
pub trait TokenStore: Send + Sync {
    /// Loads the record; an absent record loads as the empty default.
    fn load(&self) -> Result<PersistedSession, ClientError>;

    /// Replaces the stored record.
    fn save(&self, session: &PersistedSession) -> Result<(), ClientError>;

    /// Removes the stored record entirely.
    fn clear(&self) -> Result<(), ClientError>;
}

/// Stores the record as a JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<PersistedSession, ClientError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted session");
                return Ok(PersistedSession::default());
            }
            Err(e) => {
                return Err(ClientError::Storage {
                    details: format!("reading {}: {e}", self.path.display()),
                }
                .into());
            }
        };

        let session = serde_json::from_str(&contents).map_err(|e| ClientError::Storage {
            details: format!("parsing {}: {e}", self.path.display()),
        })?;
        Ok(session)
    }

    fn save(&self, session: &PersistedSession) -> Result<(), ClientError> {
        let json = serde_json::to_vec_pretty(session).map_err(|e| ClientError::Storage {
            details: e.to_string(),
        })?;

        // Write-then-rename keeps the previous record intact if we die mid-write.
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &json).map_err(|e| ClientError::Storage {
            details: format!("writing {}: {e}", tmp.display()),
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| ClientError::Storage {
            details: format!("replacing {}: {e}", self.path.display()),
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ClientError::Storage {
                details: format!("removing {}: {e}", self.path.display()),
            }
            .into()),
        }
    }
}

/// Writes `contents` to a file only the current user can read.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;

    // `mode` only applies to newly created files.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

/// Keeps the record in memory; nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: Mutex<Option<PersistedSession>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-seeded with a record.
    #[must_use]
    pub fn with_record(session: PersistedSession) -> Self {
        Self {
            record: Mutex::new(Some(session)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<PersistedSession, ClientError> {
        let record = self.record.lock().unwrap_or_else(|p| p.into_inner());
        Ok(record.clone().unwrap_or_default())
    }

    fn save(&self, session: &PersistedSession) -> Result<(), ClientError> {
        *self.record.lock().unwrap_or_else(|p| p.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        *self.record.lock().unwrap_or_else(|p| p.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedSession {
        PersistedSession {
            access_token: Some("access".to_string()),
            refresh_token: Some("refresh".to_string()),
            role: Some(Role::Admin),
            user_id: Some(UserId::new()),
        }
    }

    #[test]
    fn missing_file_loads_empty_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("session.json"));
        assert_eq!(store.load().expect("load"), PersistedSession::default());
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        let record = sample();

        FileTokenStore::new(&path).save(&record).expect("save");
        let loaded = FileTokenStore::new(&path).load().expect("load");

        assert_eq!(loaded, record);
        assert!(!path.with_extension("tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(path.with_extension("tmp"), "stale").expect("stale tmp");

        FileTokenStore::new(&path).save(&sample()).expect("save");

        let mode = std::fs::metadata(&path).expect("metadata").permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn file_store_clear_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = FileTokenStore::new(dir.path().join("session.json"));

        store.save(&sample()).expect("save");
        store.clear().expect("clear");
        store.clear().expect("clear again");

        assert_eq!(store.load().expect("load"), PersistedSession::default());
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{ not json").expect("write");

        let err = FileTokenStore::new(&path).load().unwrap_err();
        assert!(matches!(err.current_context(), ClientError::Storage { .. }));
    }

    #[test]
    fn record_uses_camel_case_keys() {
        let json = serde_json::to_value(sample()).expect("serialize");
        assert!(json.get("accessToken").is_some());
        assert!(json.get("refreshToken").is_some());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::new();
        assert_eq!(store.load().expect("load"), PersistedSession::default());

        store.save(&sample()).expect("save");
        assert_eq!(store.load().expect("load").role, Some(Role::Admin));

        store.clear().expect("clear");
        assert_eq!(store.load().expect("load"), PersistedSession::default());
    }
}
