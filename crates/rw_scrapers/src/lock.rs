use chrono::Utc;
use fs2::FileExt;
use rw_core::Result;
use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const REWRITE_LOCK_KEY: &str = "rewrite-in-progress";

/// Held while a job runs; releases its key when dropped.
pub struct Lease {
    key: String,
    release: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Lease {
    fn new(key: &str, release: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            key: key.to_string(),
            release: Some(Box::new(release)),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
            tracing::debug!("Released lease {}", self.key);
        }
    }
}

/// At-most-one-in-flight guard, keyed by job name.
pub trait JobLock: Send + Sync {
    /// `None` when another holder already has `key`.
    fn try_acquire(&self, key: &str) -> Result<Option<Lease>>;
}

/// Advisory locks on files in a shared directory, so separate processes
/// exclude each other.
///
/// The OS drops the lock when the holding process exits, so a crashed run
/// never leaves the key held. The lock file itself stays on disk.
#[derive(Debug, Clone)]
pub struct FileLock {
    dir: PathBuf,
}

impl FileLock {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.lock", key))
    }
}

impl JobLock for FileLock {
    fn try_acquire(&self, key: &str) -> Result<Option<Lease>> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;

        if let Err(e) = file.try_lock_exclusive() {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Ok(None);
            }
            return Err(e.into());
        }

        file.set_len(0)?;
        writeln!(file, "pid={} acquired_at={}", std::process::id(), Utc::now().to_rfc3339())?;

        Ok(Some(Lease::new(key, move || {
            if let Err(e) = FileExt::unlock(&file) {
                tracing::warn!("⚠️ Failed to unlock {}: {}", path.display(), e);
            }
        })))
    }
}

/// Keys held within this process only.
#[derive(Debug, Clone, Default)]
pub struct MemoryLock {
    held: Arc<Mutex<HashSet<String>>>,
}

impl MemoryLock {
    pub fn new() -> Self {
        Self::default()
    }
}

impl JobLock for MemoryLock {
    fn try_acquire(&self, key: &str) -> Result<Option<Lease>> {
        let mut keys = self.held.lock().unwrap_or_else(|e| e.into_inner());
        if !keys.insert(key.to_string()) {
            return Ok(None);
        }
        drop(keys);

        let held = Arc::clone(&self.held);
        let owned_key = key.to_string();
        Ok(Some(Lease::new(key, move || {
            held.lock().unwrap_or_else(|e| e.into_inner()).remove(&owned_key);
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_lock_is_exclusive() {
        let lock = MemoryLock::new();
        let lease = lock.try_acquire(REWRITE_LOCK_KEY).unwrap();
        assert!(lease.is_some());
        assert!(lock.try_acquire(REWRITE_LOCK_KEY).unwrap().is_none());
        assert!(lock.try_acquire("ingest").unwrap().is_some());

        drop(lease);
        assert!(lock.try_acquire(REWRITE_LOCK_KEY).unwrap().is_some());
    }

    #[test]
    fn test_file_lock_is_exclusive_across_instances() {
        let dir = tempdir().unwrap();
        let first = FileLock::new(dir.path());
        let second = FileLock::new(dir.path());

        let lease = first.try_acquire(REWRITE_LOCK_KEY).unwrap().unwrap();
        assert_eq!(lease.key(), REWRITE_LOCK_KEY);
        assert!(dir.path().join("rewrite-in-progress.lock").exists());
        assert!(second.try_acquire(REWRITE_LOCK_KEY).unwrap().is_none());

        drop(lease);
        assert!(second.try_acquire(REWRITE_LOCK_KEY).unwrap().is_some());
    }

    #[test]
    fn test_long_running_holder_keeps_file_lock() {
        let dir = tempdir().unwrap();
        let lock = FileLock::new(dir.path());

        let a = lock.try_acquire(REWRITE_LOCK_KEY).unwrap().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(100));
        assert!(lock.try_acquire(REWRITE_LOCK_KEY).unwrap().is_none());
        drop(a);

        let b = lock.try_acquire(REWRITE_LOCK_KEY).unwrap().unwrap();
        assert!(lock.try_acquire(REWRITE_LOCK_KEY).unwrap().is_none());
        assert!(dir.path().join("rewrite-in-progress.lock").exists());
        drop(b);
    }

    #[test]
    fn test_leftover_lock_file_is_not_held() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("rewrite-in-progress.lock"), "pid=1").unwrap();

        let lock = FileLock::new(dir.path());
        let lease = lock.try_acquire(REWRITE_LOCK_KEY).unwrap();
        assert!(lease.is_some());

        let contents = std::fs::read_to_string(dir.path().join("rewrite-in-progress.lock")).unwrap();
        assert!(contents.starts_with(&format!("pid={}", std::process::id())));
    }
}
