//! Session snapshot adapters
//!
//! [`FileSnapshotStore`] keeps one JSON document per namespaced key on disk;
//! [`MemorySnapshotStore`] keeps it in process for tests and ephemeral runs.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use questline_core::SessionSnapshotStore;
use questline_domain::{QuestlineError, Result, Session};
use tracing::debug;

use crate::errors::InfraError;

/// Snapshot persisted as `<dir>/<key>.json`
#[derive(Debug, Clone)]
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self { path: dir.as_ref().join(format!("{key}.json")) }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("json.tmp")
    }
}

#[async_trait]
impl SessionSnapshotStore for FileSnapshotStore {
    async fn load(&self) -> Result<Option<Session>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(InfraError::from(err).into()),
        };

        let session = parse_snapshot(&contents)?;
        debug!(path = %self.path.display(), "session snapshot loaded");
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(InfraError::from)?;
        }

        let contents = serde_json::to_vec_pretty(session).map_err(InfraError::from)?;

        // Write-then-rename so a crash never leaves a half-written snapshot
        let temp = self.temp_path();
        tokio::fs::write(&temp, contents).await.map_err(InfraError::from)?;
        tokio::fs::rename(&temp, &self.path).await.map_err(InfraError::from)?;

        debug!(path = %self.path.display(), "session snapshot saved");
        Ok(())
    }

    async fn erase(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "session snapshot erased");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(InfraError::from(err).into()),
        }
    }
}

/// In-process snapshot holding the serialized text
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    raw: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with arbitrary text, e.g. a snapshot written by an
    /// older build or a corrupted one.
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self { raw: Mutex::new(Some(raw.into())) }
    }

    /// Raw stored text, if any.
    pub fn raw(&self) -> Option<String> {
        self.raw.lock().clone()
    }
}

#[async_trait]
impl SessionSnapshotStore for MemorySnapshotStore {
    async fn load(&self) -> Result<Option<Session>> {
        let raw = self.raw.lock().clone();
        raw.as_deref().map(parse_snapshot).transpose()
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let text = serde_json::to_string(session).map_err(InfraError::from)?;
        *self.raw.lock() = Some(text);
        Ok(())
    }

    async fn erase(&self) -> Result<()> {
        self.raw.lock().take();
        Ok(())
    }
}

fn parse_snapshot(contents: &str) -> Result<Session> {
    serde_json::from_str(contents).map_err(|err| {
        QuestlineError::InvalidInput(format!("unreadable session snapshot: {err}"))
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use questline_domain::SessionUser;
    use tempfile::TempDir;

    use super::*;

    fn session() -> Session {
        Session {
            user: SessionUser {
                user_id: "u-42".to_string(),
                email: "sylvanas@example.test".to_string(),
                user_name: "Sylvanas".to_string(),
                is_admin: false,
            },
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            access_token_expires_at: Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn file_store_round_trip_is_lossless() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path(), "questline.session");

        assert!(store.load().await.unwrap().is_none());

        store.save(&session()).await.unwrap();
        assert!(store.path().exists());
        assert_eq!(store.load().await.unwrap(), Some(session()));

        store.erase().await.unwrap();
        assert!(store.load().await.unwrap().is_none());

        // Erasing twice is fine
        store.erase().await.unwrap();
    }

    #[tokio::test]
    async fn file_store_creates_missing_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path().join("nested/state"), "s");

        store.save(&session()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session()));
        assert!(!dir.path().join("nested/state/s.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_store_reports_corrupt_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = FileSnapshotStore::new(dir.path(), "questline.session");
        std::fs::write(store.path(), "{ \"user\": 12").unwrap();

        let err = store.load().await.unwrap_err();
        assert!(matches!(err, QuestlineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn memory_store_round_trip() {
        let store = MemorySnapshotStore::new();
        store.save(&session()).await.unwrap();

        assert!(store.raw().unwrap().contains("\"refreshToken\":\"refresh-1\""));
        assert_eq!(store.load().await.unwrap(), Some(session()));

        store.erase().await.unwrap();
        assert!(store.raw().is_none());
    }

    #[tokio::test]
    async fn memory_store_rejects_partial_session() {
        let store = MemorySnapshotStore::with_raw(r#"{ "accessToken": "a" }"#);
        assert!(store.load().await.is_err());
    }
}
