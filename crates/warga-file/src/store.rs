use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use warga_data::{LoginAttempt, Payment, Template, User};

/// Rows of one kind with their id sequence
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Table<T> {
    pub next_id: u32,
    pub rows: Vec<T>,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            next_id: 1,
            rows: vec![],
        }
    }
}

impl<T> Table<T> {
    /// Ids are never reused, even after deletes.
    pub fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    #[serde(default)]
    pub users: Table<User>,
    #[serde(default)]
    pub payments: Table<Payment>,
    #[serde(default)]
    pub login_history: Table<LoginAttempt>,
    #[serde(default)]
    pub templates: Table<Template>,
}

/// JSON file store.
///
/// Nothing is cached: every read loads the file. Writes hold an
/// exclusive lock on a `.lock` file next to the store, load the
/// current contents, apply the change and replace the file, so
/// several processes can share one store.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    writer: Mutex<()>,
    temporary: bool,
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}

impl FileStore {
    /// Open a store file. A missing file is an empty store,
    /// it is created on the first write.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
            writer: Mutex::new(()),
            temporary: false,
        };
        // Fail early on unreadable files
        store.load().await?;
        tracing::debug!(path = %store.path.display(), "opened file store");
        Ok(store)
    }

    /// Open a new test store in the temp directory.
    /// The file is removed when the store is dropped.
    pub async fn open_test() -> Self {
        let path = std::env::temp_dir()
            .join(format!("warga_test_{}.json", rand::random::<u64>()));
        let mut store = Self::open(&path).await.unwrap();
        store.temporary = true;
        store
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    /// Write the store file if it does not exist yet
    pub async fn create(&self) -> Result<()> {
        self.write(|_| Ok(())).await
    }

    async fn load(&self) -> Result<Snapshot> {
        match tokio::fs::read(&self.path).await {
            Ok(data) => serde_json::from_slice(&data)
                .with_context(|| format!("could not parse {}", self.path.display())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Snapshot::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// Current contents of the store file
    pub(crate) async fn read(&self) -> Result<Snapshot> {
        self.load().await
    }

    /// Take the cross-process write lock. It is held until
    /// the returned file is dropped.
    async fn lock_file(&self) -> Result<File> {
        let lock_path = self.lock_path();
        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
                .with_context(|| format!("could not open {}", lock_path.display()))?;
            FileExt::lock_exclusive(&file)?;
            Ok(file)
        })
        .await??;
        Ok(file)
    }

    /// Apply a change to the current contents and persist it.
    /// If the change fails nothing is written.
    pub(crate) async fn write<F, R>(&self, change: F) -> Result<R>
    where
        F: FnOnce(&mut Snapshot) -> Result<R> + Send,
        R: Send,
    {
        let _writer = self.writer.lock().await;
        let _lock = self.lock_file().await?;

        let mut snapshot = self.load().await?;
        let result = change(&mut snapshot)?;
        self.persist(&snapshot).await?;
        Ok(result)
    }

    async fn persist(&self, snapshot: &Snapshot) -> Result<()> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        let tmp = sibling(&self.path, ".tmp");
        tokio::fs::write(&tmp, data).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if self.temporary {
            let _ = std::fs::remove_file(&self.path);
            let _ = std::fs::remove_file(self.lock_path());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use super::*;
    use warga_data::{FailureReason, Insert, LoginAttemptFilter, Query, UserFilter};

    #[tokio::test]
    async fn test_reopen_keeps_data() {
        let store = FileStore::open_test().await;
        store
            .insert(User {
                name: "Persisted".to_string(),
                email: "persisted@warga.test".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let reopened = FileStore::open(store.path()).await.unwrap();
        let users: Vec<User> = reopened.query(&UserFilter::default()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Persisted");
        assert_eq!(users[0].id, 1);

        // Both point to the same file, only one owns it.
        drop(reopened);
    }

    #[tokio::test]
    async fn test_create() {
        let store = FileStore::open_test().await;
        assert!(!store.path().exists());
        store.create().await.unwrap();
        assert!(store.path().exists());

        let reopened = FileStore::open(store.path()).await.unwrap();
        let users: Vec<User> = reopened.query(&UserFilter::default()).await.unwrap();
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn test_two_handles_keep_each_others_writes() {
        let first = FileStore::open_test().await;
        let second = FileStore::open(first.path()).await.unwrap();

        first
            .insert(LoginAttempt::failed(
                None,
                "x@warga.test",
                FailureReason::UserNotFound,
                Utc::now(),
            ))
            .await
            .unwrap();
        second
            .insert(LoginAttempt::failed(
                None,
                "y@warga.test",
                FailureReason::UserNotFound,
                Utc::now(),
            ))
            .await
            .unwrap();
        let user = second
            .insert(User {
                name: "Shared".to_string(),
                email: "shared@warga.test".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        // Each handle sees the other's rows
        let users: Vec<User> = first.query(&UserFilter::default()).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, user.id);

        let reopened = FileStore::open(first.path()).await.unwrap();
        let history: Vec<LoginAttempt> = reopened
            .query(&LoginAttemptFilter::default())
            .await
            .unwrap();
        let emails: Vec<&str> = history.iter().map(|a| a.email.as_str()).collect();
        assert_eq!(emails, vec!["y@warga.test", "x@warga.test"]);
        assert_eq!(history[0].id, 2);
    }

    #[tokio::test]
    async fn test_concurrent_handles() {
        let first = Arc::new(FileStore::open_test().await);
        let second = Arc::new(FileStore::open(first.path()).await.unwrap());

        let mut tasks = vec![];
        for _ in 0..10 {
            for (db, email) in [(first.clone(), "a@warga.test"), (second.clone(), "b@warga.test")] {
                tasks.push(tokio::spawn(async move {
                    let attempt = LoginAttempt::failed(
                        None,
                        email,
                        FailureReason::UserNotFound,
                        Utc::now(),
                    );
                    db.insert(attempt).await
                }));
            }
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let history: Vec<LoginAttempt> = first
            .query(&LoginAttemptFilter::default())
            .await
            .unwrap();
        assert_eq!(history.len(), 20);
    }

    #[test]
    fn test_table_allocate() {
        let mut table: Table<User> = Table::default();
        assert_eq!(table.allocate(), 1);
        assert_eq!(table.allocate(), 2);
    }
}
