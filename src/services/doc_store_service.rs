use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::models::Snapshot;

/// Which copy made it to disk when a save only half succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrittenCopy {
    Primary,
    Snapshot,
}

#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    InvalidName(String),
    Persistence(io::Error),
    /// One of the two writes of a save succeeded, the other did not.
    Degraded { written: WrittenCopy, source: io::Error },
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(name) => write!(f, "Document '{}' not found", name),
            StoreError::InvalidName(name) => write!(f, "Invalid document name '{}'", name),
            StoreError::Persistence(e) => write!(f, "Storage error: {}", e),
            StoreError::Degraded { written: WrittenCopy::Primary, source } => {
                write!(f, "Degraded save: document written but snapshot failed: {}", source)
            }
            StoreError::Degraded { written: WrittenCopy::Snapshot, source } => {
                write!(f, "Degraded save: snapshot written but document failed: {}", source)
            }
            StoreError::Corrupt(e) => write!(f, "Corrupt snapshot: {}", e),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Persistence(e) | StoreError::Degraded { source: e, .. } => Some(e),
            _ => None,
        }
    }
}

/// Holds the live document content shared by every connection, plus the
/// durable primary copies and their append-only version history on disk.
///
/// Layout: `<data_dir>/documents/<name>` and `<data_dir>/versions/<name>/<version>.json`.
pub struct DocumentStore {
    docs_dir: PathBuf,
    versions_dir: PathBuf,
    current: RwLock<String>,
    history_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl DocumentStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref();
        Self {
            docs_dir: data_dir.join("documents"),
            versions_dir: data_dir.join("versions"),
            current: RwLock::new(String::new()),
            history_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the in-memory authoritative content. Nothing is persisted.
    pub fn set_current_content(&self, content: String) {
        match self.current.write() {
            Ok(mut current) => *current = content,
            Err(poisoned) => *poisoned.into_inner() = content,
        }
    }

    pub fn current_content(&self) -> String {
        match self.current.read() {
            Ok(current) => current.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Write `content` as the primary copy of `name` and append a snapshot.
    ///
    /// Both writes are always attempted, serialized per document name so the
    /// primary copy always matches the newest snapshot. The live content is
    /// never touched.
    pub async fn save(&self, name: &str, content: &str) -> Result<Snapshot, StoreError> {
        validate_name(name)?;

        let lock = self.history_lock(name).await;
        let _guard = lock.lock().await;

        let primary = self.write_primary(name, content).await;
        let snapshot = self.append_snapshot(name, content).await;

        match (primary, snapshot) {
            (Ok(()), Ok(snapshot)) => {
                info!("Saved document '{}' as version {}", name, snapshot.version);
                Ok(snapshot)
            }
            (Ok(()), Err(e)) => {
                error!("Document '{}' written but snapshot failed: {}", name, e);
                Err(StoreError::Degraded { written: WrittenCopy::Primary, source: e })
            }
            (Err(e), Ok(snapshot)) => {
                error!("Snapshot {} of '{}' written but document failed: {}", snapshot.version, name, e);
                Err(StoreError::Degraded { written: WrittenCopy::Snapshot, source: e })
            }
            (Err(e), Err(snapshot_err)) => {
                error!("Failed to save document '{}': {} (snapshot: {})", name, e, snapshot_err);
                Err(StoreError::Persistence(e))
            }
        }
    }

    /// Read the primary copy of `name`.
    pub async fn open(&self, name: &str) -> Result<String, StoreError> {
        validate_name(name)?;
        match fs::read_to_string(self.docs_dir.join(name)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StoreError::NotFound(name.to_string())),
            Err(e) => {
                error!("Failed to read document '{}': {}", name, e);
                Err(StoreError::Persistence(e))
            }
        }
    }

    /// Names of all documents with a primary copy, sorted.
    pub async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut entries = match fs::read_dir(&self.docs_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Persistence(e)),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(StoreError::Persistence)? {
            let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
            if !is_file {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// All snapshots of `name`, oldest first.
    pub async fn history(&self, name: &str) -> Result<Vec<Snapshot>, StoreError> {
        validate_name(name)?;
        let dir = self.versions_dir.join(name);

        let lock = self.history_lock(name).await;
        let _guard = lock.lock().await;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                // A primary copy without history is still a known document.
                return match self.open(name).await {
                    Ok(_) => Ok(Vec::new()),
                    Err(e) => Err(e),
                };
            }
            Err(e) => return Err(StoreError::Persistence(e)),
        };

        let mut snapshots = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(StoreError::Persistence)? {
            let path = entry.path();
            if snapshot_version(&path).is_none() {
                continue;
            }
            let bytes = fs::read(&path).await.map_err(StoreError::Persistence)?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
                warn!("Unreadable snapshot {}: {}", path.display(), e);
                StoreError::Corrupt(format!("{}: {}", path.display(), e))
            })?;
            snapshots.push(snapshot);
        }
        snapshots.sort_by_key(|s| s.version);
        Ok(snapshots)
    }

    async fn write_primary(&self, name: &str, content: &str) -> io::Result<()> {
        fs::create_dir_all(&self.docs_dir).await?;
        let tmp = self.docs_dir.join(format!(".{}.tmp", name));
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, self.docs_dir.join(name)).await
    }

    // Caller holds the per-name lock.
    async fn append_snapshot(&self, name: &str, content: &str) -> io::Result<Snapshot> {
        let dir = self.versions_dir.join(name);
        fs::create_dir_all(&dir).await?;

        let snapshot = Snapshot {
            version: last_version(&dir).await? + 1,
            timestamp: Utc::now(),
            content: content.to_string(),
        };
        let bytes = serde_json::to_vec_pretty(&snapshot).map_err(io::Error::other)?;

        // Only complete snapshots ever carry a `<version>.json` name.
        let tmp = dir.join(format!(".{:06}.json.tmp", snapshot.version));
        let path = dir.join(format!("{:06}.json", snapshot.version));
        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);
        if fs::try_exists(&path).await? {
            let _ = fs::remove_file(&tmp).await;
            return Err(io::Error::new(io::ErrorKind::AlreadyExists, path.display().to_string()));
        }
        fs::rename(&tmp, &path).await?;
        debug!("Appended snapshot {}", path.display());
        Ok(snapshot)
    }

    async fn history_lock(&self, name: &str) -> Arc<Mutex<()>> {
        let mut locks = self.history_locks.lock().await;
        locks.entry(name.to_string()).or_default().clone()
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let invalid = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains("..")
        || name.contains(['/', '\\', '\0']);
    if invalid {
        warn!("Rejected document name '{}'", name);
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn snapshot_version(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "json" {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

async fn last_version(dir: &Path) -> io::Result<u32> {
    let mut entries = fs::read_dir(dir).await?;
    let mut last = 0;
    while let Some(entry) = entries.next_entry().await? {
        if let Some(version) = snapshot_version(&entry.path()) {
            last = last.max(version);
        }
    }
    Ok(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_then_open_returns_latest_and_keeps_every_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        store.save("notes.txt", "v1").await.unwrap();
        store.save("notes.txt", "v2").await.unwrap();

        assert_eq!(store.open("notes.txt").await.unwrap(), "v2");
        let history = store.history("notes.txt").await.unwrap();
        let contents: Vec<_> = history.iter().map(|s| s.content.as_str()).collect();
        assert_eq!(contents, vec!["v1", "v2"]);
        assert_eq!(history[0].version, 1);
        assert_eq!(history[1].version, 2);
        assert!(history[0].timestamp <= history[1].timestamp);
    }

    #[tokio::test]
    async fn successful_save_is_readable_and_in_history() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        for content in ["", "one line", "multi\nline\ncontent"] {
            let snapshot = store.save("doc.txt", content).await.unwrap();
            assert_eq!(store.open("doc.txt").await.unwrap(), content);
            let history = store.history("doc.txt").await.unwrap();
            assert!(history.contains(&snapshot));
        }
    }

    #[tokio::test]
    async fn open_missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        assert!(matches!(store.open("missing.txt").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.history("missing.txt").await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_is_sorted_and_skips_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        assert!(store.list().await.unwrap().is_empty());

        store.save("b.txt", "b").await.unwrap();
        store.save("a.txt", "a").await.unwrap();
        std::fs::write(dir.path().join("documents").join(".c.txt.tmp"), "partial").unwrap();

        assert_eq!(store.list().await.unwrap(), vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());

        for name in ["", "../etc/passwd", "a/b.txt", ".hidden", "a\\b"] {
            assert!(matches!(store.save(name, "x").await, Err(StoreError::InvalidName(_))), "{name}");
        }
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn snapshot_failure_is_reported_as_degraded() {
        let dir = tempfile::tempdir().unwrap();
        // A file where the versions directory should be makes snapshot writes fail.
        std::fs::write(dir.path().join("versions"), "").unwrap();
        let store = DocumentStore::new(dir.path());

        let err = store.save("notes.txt", "v1").await.unwrap_err();
        assert!(matches!(err, StoreError::Degraded { written: WrittenCopy::Primary, .. }));
        assert_eq!(store.open("notes.txt").await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn primary_failure_is_reported_as_degraded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("documents"), "").unwrap();
        let store = DocumentStore::new(dir.path());

        let err = store.save("notes.txt", "v1").await.unwrap_err();
        assert!(matches!(err, StoreError::Degraded { written: WrittenCopy::Snapshot, .. }));
    }

    #[tokio::test]
    async fn failed_save_leaves_live_content_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("documents"), "").unwrap();
        std::fs::write(dir.path().join("versions"), "").unwrap();
        let store = DocumentStore::new(dir.path());
        store.set_current_content("live text".to_string());

        assert!(matches!(store.save("notes.txt", "other").await, Err(StoreError::Persistence(_))));
        assert_eq!(store.current_content(), "live text");
    }

    #[tokio::test]
    async fn concurrent_saves_get_distinct_versions() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocumentStore::new(dir.path()));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move { store.save("shared.txt", &format!("rev {i}")).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let versions: Vec<u32> = store.history("shared.txt").await.unwrap().iter().map(|s| s.version).collect();
        assert_eq!(versions, (1..=8).collect::<Vec<_>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn history_never_sees_a_partial_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(DocumentStore::new(dir.path()));
        store.save("race.txt", "seed").await.unwrap();

        let big = "x".repeat(4 * 1024 * 1024);
        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for _ in 0..4 {
                    store.save("race.txt", &big).await.unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let history = store.history("race.txt").await.unwrap();
            assert!(history.iter().all(|s| s.content == "seed" || s.content.len() == 4 * 1024 * 1024));
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(store.history("race.txt").await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn leftover_temp_snapshots_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path());
        store.save("notes.txt", "v1").await.unwrap();
        std::fs::write(dir.path().join("versions").join("notes.txt").join(".000002.json.tmp"), "{\"vers").unwrap();

        let history = store.history("notes.txt").await.unwrap();
        assert_eq!(history.len(), 1);
        let next = store.save("notes.txt", "v2").await.unwrap();
        assert_eq!(next.version, 2);
        assert_eq!(store.history("notes.txt").await.unwrap().len(), 2);
    }
}
