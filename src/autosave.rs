//! Loading the persisted collection at startup and writing it back, debounced,
//! whenever the store changes.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::models::Variety;
use crate::sanitize::{sanitize_document, UntrustedJson};
use crate::storage::{KeyValueStorage, STORAGE_KEY};
use crate::store::Snapshot;

pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(1000);
pub const DEFAULT_SAVED_DISPLAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Idle,
    /// A write is scheduled or running.
    Saving,
    /// The last write succeeded. Falls back to `Idle` on its own.
    Saved,
    /// The last write failed. Stays until the next write attempt.
    Error,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Idle => "",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Saved => "Saved",
            SaveStatus::Error => "Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveConfig {
    /// Quiet period after the last change before writing.
    pub delay: Duration,
    /// How long `Saved` is shown before reverting to `Idle`.
    pub saved_display: Duration,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self { delay: DEFAULT_SAVE_DELAY, saved_display: DEFAULT_SAVED_DISPLAY }
    }
}

/// Reads the persisted collection once. Any problem (missing key, unreadable
/// storage, bad JSON, wrong shape) yields an empty collection.
pub fn load(storage: &dyn KeyValueStorage) -> Vec<Variety> {
    let text = match storage.get(STORAGE_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => {
            debug!("nothing persisted yet");
            return vec![];
        }
        Err(e) => {
            warn!(error = %e, "could not read persisted data, starting empty");
            return vec![];
        }
    };
    match UntrustedJson::parse(&text) {
        Ok(document) => {
            let varieties = sanitize_document(document);
            info!(count = varieties.len(), "loaded varieties");
            varieties
        }
        Err(e) => {
            warn!(error = %e, "persisted data is not valid JSON, starting empty");
            vec![]
        }
    }
}

/// Writes `varieties` right away.
pub fn save_now(storage: &dyn KeyValueStorage, varieties: &[Variety]) -> Result<()> {
    let text = serde_json::to_string(varieties)?;
    storage.set(STORAGE_KEY, &text)
}

/// Drops the persisted collection.
pub fn reset(storage: &dyn KeyValueStorage) -> Result<()> {
    warn!("clearing persisted data");
    storage.remove(STORAGE_KEY)
}

enum Command {
    Flush(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Background writer following a store's change feed.
///
/// Each change (re)starts the delay; only the newest snapshot of a burst is
/// written. Failures are logged and reported through [`SaveStatus`], never
/// propagated.
#[derive(Debug)]
pub struct AutoSaver {
    status: watch::Receiver<SaveStatus>,
    commands: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Flush(_) => f.write_str("Flush"),
            Command::Shutdown(_) => f.write_str("Shutdown"),
        }
    }
}

impl AutoSaver {
    pub fn spawn(
        storage: Arc<dyn KeyValueStorage>,
        changes: watch::Receiver<Snapshot>,
        config: AutosaveConfig,
    ) -> Self {
        let (status_tx, status) = watch::channel(SaveStatus::Idle);
        let (commands, command_rx) = mpsc::unbounded_channel();
        let worker = Worker {
            storage,
            config,
            status: status_tx,
            pending: None,
            write_at: None,
            idle_at: None,
        };
        let task = tokio::spawn(worker.run(changes, command_rx));
        Self { status, commands, task }
    }

    pub fn status(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    pub fn current_status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    /// Writes any pending snapshot now instead of waiting out the delay.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }

    /// Flushes and stops the background task.
    pub async fn shutdown(self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Shutdown(ack)).is_ok() {
            let _ = done.await;
        }
        if let Err(e) = self.task.await {
            error!(error = %e, "autosave task ended abnormally");
        }
    }
}

struct Worker {
    storage: Arc<dyn KeyValueStorage>,
    config: AutosaveConfig,
    status: watch::Sender<SaveStatus>,
    pending: Option<Snapshot>,
    write_at: Option<Instant>,
    idle_at: Option<Instant>,
}

impl Worker {
    async fn run(
        mut self,
        mut changes: watch::Receiver<Snapshot>,
        mut commands: mpsc::UnboundedReceiver<Command>,
    ) {
        let mut store_alive = true;
        loop {
            tokio::select! {
                changed = changes.changed(), if store_alive => {
                    if changed.is_err() {
                        debug!("store dropped, no further changes");
                        store_alive = false;
                        continue;
                    }
                    let snapshot = changes.borrow_and_update().clone();
                    self.schedule(snapshot);
                }
                _ = wait_for(self.write_at) => {
                    self.write_pending().await;
                }
                _ = wait_for(self.idle_at) => {
                    self.idle_at = None;
                    self.status.send_if_modified(|status| {
                        let revert = *status == SaveStatus::Saved;
                        if revert {
                            *status = SaveStatus::Idle;
                        }
                        revert
                    });
                }
                command = commands.recv() => match command {
                    Some(Command::Flush(ack)) => {
                        self.catch_up(&mut changes);
                        self.write_pending().await;
                        let _ = ack.send(());
                    }
                    Some(Command::Shutdown(ack)) => {
                        self.catch_up(&mut changes);
                        self.write_pending().await;
                        let _ = ack.send(());
                        break;
                    }
                    None => {
                        self.catch_up(&mut changes);
                        self.write_pending().await;
                        break;
                    }
                },
            }
        }
        debug!("autosave stopped");
    }

    /// Picks up a change the select loop has not seen yet, so a flush right
    /// after an edit includes that edit.
    fn catch_up(&mut self, changes: &mut watch::Receiver<Snapshot>) {
        let unseen = {
            let current = changes.borrow_and_update();
            current.has_changed().then(|| current.clone())
        };
        if let Some(snapshot) = unseen {
            self.schedule(snapshot);
        }
    }

    fn schedule(&mut self, snapshot: Snapshot) {
        // Writing `[]` over a first session that never stored anything would
        // look exactly like "no data yet", so that write is skipped.
        if snapshot.is_empty() && !self.has_persisted_key() {
            debug!("empty collection and nothing persisted, not scheduling a write");
            self.pending = None;
            self.write_at = None;
            self.status.send_if_modified(|status| {
                let cancelled = *status == SaveStatus::Saving;
                if cancelled {
                    *status = SaveStatus::Idle;
                }
                cancelled
            });
            return;
        }
        debug!(count = snapshot.len(), delay = ?self.config.delay, "scheduling write");
        self.pending = Some(snapshot);
        self.write_at = Some(Instant::now() + self.config.delay);
        self.idle_at = None;
        self.status.send_replace(SaveStatus::Saving);
    }

    fn has_persisted_key(&self) -> bool {
        self.storage.contains(STORAGE_KEY).unwrap_or_else(|e| {
            warn!(error = %e, "could not check for persisted data");
            true
        })
    }

    async fn write_pending(&mut self) {
        self.write_at = None;
        let Some(snapshot) = self.pending.take() else {
            return;
        };
        let storage = self.storage.clone();
        let document = snapshot.clone();
        // Documents carry inline photos; the file write and sync stay off the
        // runtime threads.
        let written = tokio::task::spawn_blocking(move || save_now(storage.as_ref(), &document))
            .await
            .unwrap_or_else(|e| Err(Error::Storage(format!("save task failed: {}", e))));
        match written {
            Ok(()) => {
                info!(count = snapshot.len(), "saved varieties");
                self.status.send_replace(SaveStatus::Saved);
                self.idle_at = Some(Instant::now() + self.config.saved_display);
            }
            Err(e) => {
                error!(error = %e, "auto-save failed");
                self.status.send_replace(SaveStatus::Error);
                self.idle_at = None;
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Variety;
    use crate::storage::MemoryStorage;
    use crate::store::RecordStore;
    use tokio::time::sleep;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn spawn(storage: &MemoryStorage, store: &RecordStore) -> AutoSaver {
        AutoSaver::spawn(Arc::new(storage.clone()), store.subscribe(), AutosaveConfig::default())
    }

    fn persisted(storage: &MemoryStorage) -> Vec<Variety> {
        load(storage)
    }

    #[test]
    fn load_falls_back_to_empty() {
        let storage = MemoryStorage::new();
        assert!(load(&storage).is_empty());

        storage.set(STORAGE_KEY, "{not json").unwrap();
        assert!(load(&storage).is_empty());

        storage.set(STORAGE_KEY, r#"{"roses": []}"#).unwrap();
        assert!(load(&storage).is_empty());

        storage.set(STORAGE_KEY, r#"[{"name": "Bolero"}]"#).unwrap();
        let loaded = load(&storage);
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "Bolero");
    }

    #[test]
    fn reset_clears_the_key() {
        let storage = MemoryStorage::new();
        save_now(&storage, &[Variety::new("a", "b")]).unwrap();
        reset(&storage).unwrap();
        assert_eq!(storage.get(STORAGE_KEY).unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn a_burst_of_changes_is_written_once_with_the_last_state() {
        let storage = MemoryStorage::new();
        let mut store = RecordStore::default();
        let saver = spawn(&storage, &store);

        for i in 0..5 {
            store.add(Variety::new("Tantau", format!("rose {}", i)));
            sleep(ms(300)).await;
        }
        assert_eq!(storage.writes(), 0);

        sleep(ms(1100)).await;
        assert_eq!(storage.writes(), 1);
        let saved = persisted(&storage);
        assert_eq!(saved.len(), 5);
        assert_eq!(saved[0].name, "rose 4");

        saver.shutdown().await;
        assert_eq!(storage.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn status_goes_saving_saved_idle() {
        let storage = MemoryStorage::new();
        let mut store = RecordStore::default();
        let saver = spawn(&storage, &store);
        assert_eq!(saver.current_status(), SaveStatus::Idle);

        store.add(Variety::new("Meilland", "Bolero"));
        sleep(ms(10)).await;
        assert_eq!(saver.current_status(), SaveStatus::Saving);

        sleep(ms(1000)).await;
        assert_eq!(saver.current_status(), SaveStatus::Saved);

        sleep(ms(2000)).await;
        assert_eq!(saver.current_status(), SaveStatus::Idle);
        saver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failed_writes_are_sticky_and_keep_memory_intact() {
        let storage = MemoryStorage::with_quota(10);
        let mut store = RecordStore::default();
        let saver = spawn(&storage, &store);

        store.add(Variety::new("Delbard", "Nahema"));
        sleep(ms(1100)).await;
        assert_eq!(saver.current_status(), SaveStatus::Error);
        sleep(ms(10_000)).await;
        assert_eq!(saver.current_status(), SaveStatus::Error);
        assert_eq!(store.len(), 1);
        assert_eq!(storage.get(STORAGE_KEY).unwrap(), None);

        storage.set_quota(None);
        store.add(Variety::new("Delbard", "Claude Monet"));
        sleep(ms(1100)).await;
        assert_eq!(saver.current_status(), SaveStatus::Saved);
        assert_eq!(persisted(&storage).len(), 2);
        saver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn empty_collection_without_persisted_key_is_not_written() {
        let storage = MemoryStorage::new();
        let mut store = RecordStore::default();
        let saver = spawn(&storage, &store);

        store.replace_all(vec![]);
        sleep(ms(3000)).await;
        assert_eq!(storage.writes(), 0);
        assert_eq!(storage.get(STORAGE_KEY).unwrap(), None);
        assert_eq!(saver.current_status(), SaveStatus::Idle);
        saver.shutdown().await;
        assert_eq!(storage.writes(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn emptying_a_persisted_collection_is_written() {
        let storage = MemoryStorage::new();
        save_now(&storage, &[Variety::new("a", "b")]).unwrap();
        let mut store = RecordStore::new(load(&storage));
        let saver = spawn(&storage, &store);

        store.replace_all(vec![]);
        sleep(ms(1100)).await;
        assert_eq!(storage.get(STORAGE_KEY).unwrap().as_deref(), Some("[]"));
        saver.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn file_backed_writes_finish_and_report_saved() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(crate::storage::FileStorage::open(dir.path()).unwrap());
        let mut store = RecordStore::default();
        let saver = AutoSaver::spawn(storage.clone(), store.subscribe(), AutosaveConfig::default());

        store.add(Variety::new("Guillot", "Sonia Rykiel"));
        saver.flush().await;
        assert_eq!(saver.current_status(), SaveStatus::Saved);
        assert_eq!(load(storage.as_ref())[0].name, "Sonia Rykiel");
        saver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn flush_writes_without_waiting() {
        let storage = MemoryStorage::new();
        let mut store = RecordStore::default();
        let saver = spawn(&storage, &store);

        store.add(Variety::new("Keisei", "Kaikyo"));
        saver.flush().await;
        assert_eq!(storage.writes(), 1);

        // nothing left to write afterwards
        sleep(ms(2000)).await;
        assert_eq!(storage.writes(), 1);
        saver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_writes_the_pending_snapshot() {
        let storage = MemoryStorage::new();
        let mut store = RecordStore::default();
        let saver = spawn(&storage, &store);

        store.add(Variety::new("Keisei", "Kaoruno"));
        saver.shutdown().await;
        assert_eq!(persisted(&storage)[0].name, "Kaoruno");
    }
}
