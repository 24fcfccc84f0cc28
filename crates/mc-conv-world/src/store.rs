//! Key-value store access for Bedrock worlds.
//!
//! `rusty_leveldb::DB` is single-threaded, so [`LevelDbStore`] owns it on a
//! dedicated thread and serves requests over a channel. The handle is
//! `Send + Sync` and can be shared by every conversion worker.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};

use rusty_leveldb::{LdbIterator, DB};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to open {path}: {message}")]
    Open { path: PathBuf, message: String },
    #[error("store operation failed: {0}")]
    Backend(String),
    #[error("store is closed")]
    Closed,
}

/// Operations the converters need from a Bedrock key-value store.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
    /// Every key, in ascending byte order.
    fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError>;
    fn flush(&self) -> Result<(), StoreError>;
}

// ─── LevelDB actor ──────────────────────────────────────────────────────────

type Reply<T> = Sender<Result<T, StoreError>>;

enum Request {
    Get(Vec<u8>, Reply<Option<Vec<u8>>>),
    Put(Vec<u8>, Vec<u8>, Reply<()>),
    Delete(Vec<u8>, Reply<()>),
    Keys(Reply<Vec<Vec<u8>>>),
    Flush(Reply<()>),
    Compact(Reply<()>),
}

/// A LevelDB database owned by a background thread.
pub struct LevelDbStore {
    path: PathBuf,
    tx: Mutex<Option<Sender<Request>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LevelDbStore {
    /// Open or create a database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let (tx, rx) = mpsc::channel::<Request>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), StoreError>>();
        let db_path = path.to_path_buf();

        let worker = thread::Builder::new()
            .name("leveldb".into())
            .spawn(move || {
                let opts = rusty_leveldb::Options {
                    create_if_missing: true,
                    ..rusty_leveldb::Options::default()
                };
                let mut db = match DB::open(&db_path, opts) {
                    Ok(db) => {
                        let _ = ready_tx.send(Ok(()));
                        db
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(StoreError::Open {
                            path: db_path.clone(),
                            message: e.to_string(),
                        }));
                        return;
                    }
                };
                for req in rx {
                    serve(&mut db, req);
                }
                if let Err(e) = db.flush() {
                    warn!(path = %db_path.display(), "final flush failed: {e}");
                }
            })
            .map_err(|e| StoreError::Open {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;

        ready_rx.recv().map_err(|_| StoreError::Closed)??;
        debug!(path = %path.display(), "opened LevelDB store");

        Ok(Self {
            path: path.to_path_buf(),
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn call<T>(&self, make: impl FnOnce(Reply<T>) -> Request) -> Result<T, StoreError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        {
            let guard = self.tx.lock().map_err(|_| StoreError::Closed)?;
            let tx = guard.as_ref().ok_or(StoreError::Closed)?;
            tx.send(make(reply_tx)).map_err(|_| StoreError::Closed)?;
        }
        reply_rx.recv().map_err(|_| StoreError::Closed)?
    }

    /// Flush, compact and release the database. `progress` receives
    /// `(step, total)` as the close advances.
    pub fn close(self, mut progress: impl FnMut(u32, u32)) -> Result<(), StoreError> {
        progress(0, 2);
        self.call(Request::Flush)?;
        progress(1, 2);
        self.call(Request::Compact)?;
        self.shutdown();
        progress(2, 2);
        debug!(path = %self.path.display(), "closed LevelDB store");
        Ok(())
    }

    /// Release the database and delete its directory, for output that
    /// must not survive a failed conversion.
    pub fn abandon(self) {
        self.shutdown();
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), "could not remove abandoned store: {e}");
        }
    }

    fn shutdown(&self) {
        if let Ok(mut tx) = self.tx.lock() {
            tx.take();
        }
        let handle = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!(path = %self.path.display(), "LevelDB thread panicked");
            }
        }
    }
}

impl Drop for LevelDbStore {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn backend(e: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn serve(db: &mut DB, req: Request) {
    match req {
        Request::Get(key, reply) => {
            let _ = reply.send(Ok(db.get(&key).map(|v| v.to_vec())));
        }
        Request::Put(key, value, reply) => {
            let _ = reply.send(db.put(&key, &value).map_err(backend));
        }
        Request::Delete(key, reply) => {
            let _ = reply.send(db.delete(&key).map_err(backend));
        }
        Request::Keys(reply) => {
            let result = db.new_iter().map_err(backend).map(|mut iter| {
                let mut keys = Vec::new();
                while let Some((k, _)) = iter.next() {
                    keys.push(k.to_vec());
                }
                keys
            });
            let _ = reply.send(result);
        }
        Request::Flush(reply) => {
            let _ = reply.send(db.flush().map_err(backend));
        }
        Request::Compact(reply) => {
            let _ = reply.send(db.compact_range(&[], &[0xFF; 16]).map_err(backend));
        }
    }
}

impl KvStore for LevelDbStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        self.call(|r| Request::Get(key.to_vec(), r))
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.call(|r| Request::Put(key.to_vec(), value.to_vec(), r))
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.call(|r| Request::Delete(key.to_vec(), r))
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        self.call(Request::Keys)
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.call(Request::Flush)
    }
}

// ─── In-memory store ────────────────────────────────────────────────────────

/// Sorted in-memory store, used by tests and for comparing outputs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every record.
    pub fn snapshot(&self) -> BTreeMap<Vec<u8>, Vec<u8>> {
        self.map.lock().map(|m| m.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.map.lock().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<Vec<u8>, Vec<u8>>>, StoreError> {
        self.map
            .lock()
            .map_err(|_| StoreError::Backend("memory store poisoned".into()))
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.lock()?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<Vec<u8>>, StoreError> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
