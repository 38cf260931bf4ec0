// Flat JSON snapshot document, fully replaced on every save
use std::path::{Path, PathBuf};

use tracing::info;

use crate::persist::types::{PersistResult, Snapshot};
use crate::persist::SnapshotStore;

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait::async_trait]
impl SnapshotStore for JsonFileStore {
    async fn load_snapshot(&self) -> PersistResult<Option<Snapshot>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    async fn save_snapshot(&mut self, snapshot: &Snapshot) -> PersistResult<()> {
        let mut body = serde_json::to_string_pretty(snapshot)?;
        body.push('\n');

        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        // Write beside the target then rename so readers never see a partial file
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        info!(path = %self.path.display(), markets = snapshot.markets.len(), "Wrote snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::snapshot::tests::sample_snapshot;

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("data").join("latest.json"));
        assert!(store.load_snapshot().await.unwrap().is_none());

        let snap = sample_snapshot();
        store.save_snapshot(&snap).await.unwrap();
        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded.markets, snap.markets);
        assert_eq!(loaded.counts, snap.counts);
        assert_eq!(loaded.updated_at, snap.updated_at);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn test_save_replaces_previous_document() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::new(dir.path().join("latest.json"));

        let mut snap = sample_snapshot();
        store.save_snapshot(&snap).await.unwrap();
        snap.markets.truncate(1);
        store.save_snapshot(&snap).await.unwrap();

        let loaded = store.load_snapshot().await.unwrap().unwrap();
        assert_eq!(loaded.markets.len(), 1);
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.ends_with("}\n"));
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latest.json");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(path);
        assert!(store.load_snapshot().await.is_err());
    }
}
