//! Debounced session write-back.
//!
//! Every change schedules the latest state; the write happens once no new
//! state has arrived for the debounce interval. Only the most recent state
//! is ever written.

use crate::config::{DEFAULT_DEBOUNCE, StoreConfig};
use crate::error::Result;
use crate::tiered::SessionStore;
use pulse::v1::session::UiSessionState;
use std::future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep_until};

/// Configuration for the debounced writer
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Quiet period after the last schedule before writing
    pub debounce: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

impl From<&StoreConfig> for WriterConfig {
    fn from(config: &StoreConfig) -> Self {
        Self {
            debounce: config.debounce(),
        }
    }
}

enum Command {
    Schedule(Box<UiSessionState>),
    Flush(oneshot::Sender<bool>),
    Shutdown(oneshot::Sender<bool>),
}

/// Handle to a background task that coalesces session writes.
///
/// Must be created inside a Tokio runtime. Dropping the handle writes any
/// pending state and ends the task.
pub struct DebouncedWriter {
    tx: mpsc::UnboundedSender<Command>,
    task: tokio::task::JoinHandle<()>,
}

impl DebouncedWriter {
    pub fn spawn(store: Arc<SessionStore>, config: Option<WriterConfig>) -> Self {
        let config = config.unwrap_or_default();
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(store, config.debounce, rx));
        Self { tx, task }
    }

    /// Open the [`SessionStore`] described by `config` and spawn a writer
    /// using its debounce interval.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let store = SessionStore::open(config)?;
        Ok(Self::spawn(Arc::new(store), Some(config.into())))
    }

    /// Replace the pending state and restart the debounce timer.
    pub fn schedule(&self, state: UiSessionState) {
        if self.tx.send(Command::Schedule(Box::new(state))).is_err() {
            tracing::warn!("session writer stopped; dropping scheduled state");
        }
    }

    /// Write the pending state now.
    ///
    /// Returns whether the write succeeded; `true` when nothing was pending.
    pub async fn flush(&self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Flush(ack)).is_err() {
            return false;
        }
        done.await.unwrap_or(false)
    }

    /// Flush and stop the background task.
    pub async fn shutdown(self) -> bool {
        let (ack, done) = oneshot::channel();
        if self.tx.send(Command::Shutdown(ack)).is_err() {
            return false;
        }
        let saved = done.await.unwrap_or(false);
        let _ = self.task.await;
        saved
    }
}

async fn run(
    store: Arc<SessionStore>,
    debounce: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<UiSessionState> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let wake = deadline;
        let timer = async move {
            match wake {
                Some(at) => sleep_until(at).await,
                None => future::pending().await,
            }
        };

        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Schedule(state)) => {
                    pending = Some(*state);
                    deadline = Some(Instant::now() + debounce);
                }
                Some(Command::Flush(ack)) => {
                    deadline = None;
                    let _ = ack.send(write(&store, pending.take()).await);
                }
                Some(Command::Shutdown(ack)) => {
                    let _ = ack.send(write(&store, pending.take()).await);
                    break;
                }
                None => {
                    write(&store, pending.take()).await;
                    break;
                }
            },

            _ = timer => {
                deadline = None;
                write(&store, pending.take()).await;
            }
        }
    }
}

async fn write(store: &Arc<SessionStore>, state: Option<UiSessionState>) -> bool {
    let Some(state) = state else {
        return true;
    };

    let store = Arc::clone(store);
    match tokio::task::spawn_blocking(move || store.save_session(&state)).await {
        Ok(saved) => saved,
        Err(error) => {
            tracing::warn!(%error, "session write task failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{KeyValueStore, MemoryStore};
    use crate::tiered::TieredStore;
    use pulse::v1::session;
    use tokio::time::sleep;

    fn memory_session_store() -> (Arc<MemoryStore>, Arc<SessionStore>) {
        let memory = Arc::new(MemoryStore::new());
        let store = SessionStore::new(TieredStore::new().with_tier(memory.clone(), "k"));
        (memory, Arc::new(store))
    }

    fn fast() -> Option<WriterConfig> {
        Some(WriterConfig {
            debounce: Duration::from_millis(30),
        })
    }

    fn stored_state(memory: &MemoryStore) -> UiSessionState {
        session::deserialize(&memory.load("k").unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_burst_is_coalesced() {
        let (memory, store) = memory_session_store();
        let writer = DebouncedWriter::spawn(store, fast());

        let base = UiSessionState::default_session();
        writer.schedule(base.select("tab-cef"));
        writer.schedule(base.select("file-readme"));
        let last = base.select("tab-shadcn");
        writer.schedule(last.clone());

        sleep(Duration::from_millis(300)).await;
        assert_eq!(memory.save_count(), 1);
        assert_eq!(stored_state(&memory), last);

        assert!(writer.shutdown().await);
    }

    #[tokio::test]
    async fn test_nothing_written_before_debounce() {
        let (memory, store) = memory_session_store();
        let writer = DebouncedWriter::spawn(
            store,
            Some(WriterConfig {
                debounce: Duration::from_secs(30),
            }),
        );

        writer.schedule(UiSessionState::default_session());
        sleep(Duration::from_millis(50)).await;
        assert_eq!(memory.save_count(), 0);

        assert!(writer.flush().await);
        assert_eq!(memory.save_count(), 1);

        // flushed state is not written again when the timer would have fired
        assert!(writer.flush().await);
        assert_eq!(memory.save_count(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_writes_pending_state() {
        let (memory, store) = memory_session_store();
        let writer = DebouncedWriter::spawn(
            store,
            Some(WriterConfig {
                debounce: Duration::from_secs(30),
            }),
        );

        let state = UiSessionState::default_session().select("group-project");
        writer.schedule(state.clone());
        assert!(writer.shutdown().await);
        assert_eq!(stored_state(&memory), state);
    }

    #[tokio::test]
    async fn test_flush_with_nothing_pending() {
        let (memory, store) = memory_session_store();
        let writer = DebouncedWriter::spawn(store, fast());
        assert!(writer.flush().await);
        assert_eq!(memory.save_count(), 0);
    }

    #[tokio::test]
    async fn test_failed_write_reported() {
        let (memory, store) = memory_session_store();
        memory.set_read_only(true);
        let writer = DebouncedWriter::spawn(store, fast());
        writer.schedule(UiSessionState::default_session());
        assert!(!writer.flush().await);
    }

    #[test]
    fn test_writer_config_from_store_config() {
        let config = StoreConfig::from_lookup(|_| None).with_debounce(Duration::from_millis(5));
        assert_eq!(WriterConfig::from(&config).debounce, Duration::from_millis(5));
        assert_eq!(
            WriterConfig::from(&StoreConfig::from_lookup(|_| None)).debounce,
            DEFAULT_DEBOUNCE
        );
    }

    #[tokio::test]
    async fn test_open_uses_configured_debounce() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = StoreConfig::from_lookup(|_| None)
            .with_root(temp.path())
            .with_debounce(Duration::from_secs(30));
        let writer = DebouncedWriter::open(&config).unwrap();

        let state = UiSessionState::default_session().select("tab-cef");
        writer.schedule(state.clone());
        sleep(Duration::from_millis(300)).await;
        assert!(!config.state_dir().join("workspace-state.json").exists());

        assert!(writer.shutdown().await);
        let reopened = SessionStore::open(&config).unwrap();
        assert_eq!(reopened.load_session(), state);
    }

    #[tokio::test]
    async fn test_separate_bursts_write_separately() {
        let (memory, store) = memory_session_store();
        let writer = DebouncedWriter::spawn(store, fast());

        writer.schedule(UiSessionState::default_session());
        sleep(Duration::from_millis(200)).await;
        writer.schedule(UiSessionState::default_session().select("tab-cef"));
        sleep(Duration::from_millis(200)).await;

        assert_eq!(memory.save_count(), 2);
        writer.shutdown().await;
    }
}
