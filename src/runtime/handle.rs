use std::sync::Arc;

use tokio::sync::{Mutex, broadcast, mpsc, oneshot};

use crate::{
    core::store::{ItineraryStore, ResetRequest, StoreError},
    documents::{DocumentStore, PurgeError},
    history::ResetSummary,
    itinerary::Itinerary,
    types::{RecordTimestamp, ResetType, format_timestamp},
};

use super::events::ItineraryEvent;

/// Failures seen by [`ItineraryHandle`] callers.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// The store refused the command.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The store task has shut down.
    #[error("itinerary store is not running")]
    ChannelClosed,
}

/// Channel sizes for the store task.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Commands that may wait before senders block.
    pub command_queue_bound: usize,
    /// Events kept for slow subscribers before they lag.
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            event_capacity: 1024,
        }
    }
}

/// What happened to uploaded documents during a reset.
#[derive(Debug)]
pub enum DocumentCleanup {
    /// Partial resets never touch documents.
    Skipped,
    /// Complete reset asked to keep them.
    Preserved,
    /// No document store is configured, so there was nothing to purge.
    NoStore,
    /// Count of files removed.
    Purged { removed: usize },
    /// The itinerary change is committed regardless.
    Failed(PurgeError),
}

/// Committed reset plus the separate outcome of document cleanup.
#[derive(Debug)]
pub struct ResetOutcome {
    /// Identifier of the history record written for this reset.
    pub timestamp: RecordTimestamp,
    /// Which reset ran.
    pub reset_type: ResetType,
    /// The itinerary after the reset.
    pub itinerary: Option<Itinerary>,
    /// What happened to uploaded documents.
    pub documents: DocumentCleanup,
}

impl ResetOutcome {
    /// Message for callers when cleanup failed after the reset committed.
    pub fn cleanup_warning(&self) -> Option<String> {
        match &self.documents {
            DocumentCleanup::Failed(err) => Some(format!(
                "Itinerary was reset, but uploaded documents could not be removed: {err}"
            )),
            _ => None,
        }
    }
}

type SharedDocuments = Arc<Mutex<Box<dyn DocumentStore>>>;

/// Cloneable sender side of the store task.
pub struct ItineraryHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<ItineraryEvent>,
}

impl Clone for ItineraryHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    Replace {
        itinerary: Option<Itinerary>,
        resp: oneshot::Sender<()>,
    },
    Current {
        resp: oneshot::Sender<Option<Itinerary>>,
    },
    Reset {
        request: ResetRequest,
        resp: oneshot::Sender<Result<ResetOutcome, RuntimeError>>,
    },
    History {
        resp: oneshot::Sender<Vec<ResetSummary>>,
    },
    Restore {
        timestamp: RecordTimestamp,
        resp: oneshot::Sender<Result<Option<Itinerary>, RuntimeError>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `store` onto its own task and returns the only way to reach it.
///
/// Every command runs to completion before the next is read, so a reset's
/// capture-then-mutate never interleaves with another reset, a restore or a
/// producer write. Must be called from within a tokio runtime.
pub fn spawn_itinerary_store(
    store: ItineraryStore,
    documents: Option<Box<dyn DocumentStore>>,
    config: RuntimeConfig,
) -> ItineraryHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<ItineraryEvent>(config.event_capacity.max(1));

    let documents: Option<SharedDocuments> = documents.map(|d| Arc::new(Mutex::new(d)));
    let events_tx_loop = events_tx.clone();

    tokio::spawn(async move {
        let mut store = store;
        while let Some(cmd) = cmd_rx.recv().await {
            let done = handle_command(cmd, &mut store, &events_tx_loop, documents.as_ref()).await;
            if done {
                break;
            }
        }
        tracing::debug!("itinerary store stopped");
    });

    ItineraryHandle { cmd_tx, events_tx }
}

impl ItineraryHandle {
    /// New receiver for every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ItineraryEvent> {
        self.events_tx.subscribe()
    }

    /// Producer write of the current itinerary.
    pub async fn replace(&self, itinerary: Option<Itinerary>) -> Result<(), RuntimeError> {
        self.call(|resp| Command::Replace { itinerary, resp }).await
    }

    /// Copy of the live itinerary.
    pub async fn current(&self) -> Result<Option<Itinerary>, RuntimeError> {
        self.call(|resp| Command::Current { resp }).await
    }

    /// Runs a reset, then any document purge it asks for.
    pub async fn reset(&self, request: ResetRequest) -> Result<ResetOutcome, RuntimeError> {
        self.call(|resp| Command::Reset { request, resp }).await?
    }

    /// Public view of the reset history, oldest first.
    pub async fn history(&self) -> Result<Vec<ResetSummary>, RuntimeError> {
        self.call(|resp| Command::History { resp }).await
    }

    /// Makes the snapshot recorded at `timestamp` current again.
    pub async fn restore(&self, timestamp: RecordTimestamp) -> Result<Option<Itinerary>, RuntimeError> {
        self.call(|resp| Command::Restore { timestamp, resp }).await?
    }

    /// Stops the store task once earlier commands have run.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.call(|resp| Command::Shutdown { resp }).await
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

async fn handle_command(
    cmd: Command,
    store: &mut ItineraryStore,
    events_tx: &broadcast::Sender<ItineraryEvent>,
    documents: Option<&SharedDocuments>,
) -> bool {
    match cmd {
        Command::Replace { itinerary, resp } => {
            let cleared = itinerary.is_none();
            store.replace(itinerary);
            tracing::info!(cleared, "current itinerary replaced");
            let _ = events_tx.send(ItineraryEvent::Replaced { cleared });
            let _ = resp.send(());
        }
        Command::Current { resp } => {
            let _ = resp.send(store.current_cloned());
        }
        Command::Reset { request, resp } => {
            let reset_type = request.reset_type;
            let res = match store.reset(request) {
                Ok(applied) => {
                    tracing::info!(
                        timestamp = %format_timestamp(&applied.timestamp),
                        reset_type = reset_type.as_str(),
                        history = store.history_len(),
                        "itinerary reset"
                    );
                    let _ = events_tx.send(ItineraryEvent::Reset {
                        timestamp: applied.timestamp,
                        reset_type,
                    });

                    let cleanup = match reset_type {
                        ResetType::Partial => DocumentCleanup::Skipped,
                        ResetType::Complete if !applied.purge_documents => DocumentCleanup::Preserved,
                        ResetType::Complete => purge_documents(documents, events_tx).await,
                    };

                    Ok(ResetOutcome {
                        timestamp: applied.timestamp,
                        reset_type,
                        itinerary: applied.itinerary,
                        documents: cleanup,
                    })
                }
                Err(err) => {
                    tracing::info!(reset_type = reset_type.as_str(), %err, "itinerary reset rejected");
                    Err(RuntimeError::from(err))
                }
            };
            let _ = resp.send(res);
        }
        Command::History { resp } => {
            let history = store.history();
            tracing::debug!(records = history.len(), "reset history read");
            let _ = resp.send(history);
        }
        Command::Restore { timestamp, resp } => {
            let res = store.restore(&timestamp).map_err(RuntimeError::from);
            match &res {
                Ok(_) => {
                    tracing::info!(timestamp = %format_timestamp(&timestamp), "itinerary restored");
                    let _ = events_tx.send(ItineraryEvent::Restored { timestamp });
                }
                Err(err) => {
                    tracing::info!(timestamp = %format_timestamp(&timestamp), %err, "restore rejected");
                }
            }
            let _ = resp.send(res);
        }
        Command::Shutdown { resp } => {
            let _ = resp.send(());
            return true;
        }
    }

    false
}

async fn purge_documents(
    documents: Option<&SharedDocuments>,
    events_tx: &broadcast::Sender<ItineraryEvent>,
) -> DocumentCleanup {
    let Some(documents) = documents else {
        return DocumentCleanup::NoStore;
    };

    let documents = Arc::clone(documents);
    let res = tokio::task::spawn_blocking(move || {
        let mut documents = documents.blocking_lock();
        documents.purge()
    })
    .await
    .map_err(|e| PurgeError::Join(e.to_string()))
    .and_then(|inner| inner);

    match res {
        Ok(removed) => {
            let _ = events_tx.send(ItineraryEvent::DocumentsPurged { removed });
            DocumentCleanup::Purged { removed }
        }
        Err(err) => {
            tracing::warn!(%err, "document purge failed after complete reset");
            let _ = events_tx.send(ItineraryEvent::PurgeFailed {
                message: err.to_string(),
            });
            DocumentCleanup::Failed(err)
        }
    }
}
