mod catalog;
mod error;
mod reserve;
mod store;

pub use error::EngineError;
pub use store::SharedSlot;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::info;

use crate::clock::Clock;
use crate::config::{EngineConfig, LockStrategy};
use crate::model::Event;
use crate::wal::Wal;

use store::SlotStore;

// ── Group-commit WAL channel ─────────────────────────────

enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
}

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first Append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available Appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond Ok to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(WalCommand::Append { event, response }) = rx.recv().await {
        let mut batch = vec![(event, response)];

        // Drain all immediately available appends
        while let Ok(WalCommand::Append { event, response }) = rx.try_recv() {
            batch.push((event, response));
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE)
            .record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());
        respond_batch(batch, &result);
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let mut append_err: Option<io::Error> = None;
    for (event, _) in batch {
        if let Err(e) = wal.append_buffered(event) {
            append_err = Some(e);
            break;
        }
    }
    // Always flush — even on append error — so partially buffered bytes
    // don't leak into the next batch (callers were told this batch failed).
    let flush_err = wal.flush_sync().err();
    if let Some(e) = append_err {
        return Err(e);
    }
    if let Some(e) = flush_err {
        return Err(e);
    }
    Ok(())
}

fn respond_batch(batch: Vec<(Event, oneshot::Sender<io::Result<()>>)>, result: &io::Result<()>) {
    for (_, tx) in batch {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

/// The slot reservation engine. Owns the in-memory store, the injected
/// clock, the configured lock strategy, and the WAL group-commit channel.
pub struct Engine {
    store: SlotStore,
    clock: Arc<dyn Clock>,
    strategy: LockStrategy,
    wal_tx: mpsc::Sender<WalCommand>,
}

impl Engine {
    /// Open the engine: replay the WAL at `wal_path` into memory and spawn
    /// the group-commit writer. Must run inside a tokio runtime.
    pub fn open(
        wal_path: PathBuf,
        clock: Arc<dyn Clock>,
        config: EngineConfig,
    ) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let store = SlotStore::new();
        // Replay — we're the sole owner of the slot Arcs here, so try_write
        // always succeeds instantly (no contention). Never block here:
        // open may run inside an async context.
        for event in &events {
            store.apply_replay(event);
        }
        if !events.is_empty() {
            info!("replayed {} events from {}", events.len(), wal_path.display());
        }

        Ok(Self {
            store,
            clock,
            strategy: config.lock_strategy,
            wal_tx,
        })
    }

    /// Write an event to the WAL via the background group-commit writer.
    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::WalError("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::WalError("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::WalError(e.to_string()))
    }
}
