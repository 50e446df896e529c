mod conflict;
mod error;
mod mutations;
mod queries;
#[cfg(test)]
mod tests;

pub use conflict::first_conflict;
pub use error::{ConflictInfo, ReservationError};
pub use mutations::Receipt;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};

use crate::advisory::AdvisoryAnnotator;
use crate::catalog::ResourceCatalog;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::wal::Wal;

pub type SharedResourceState = Arc<RwLock<ResourceState>>;

// ── Group-commit WAL channel ─────────────────────────────

type WalJob = (Event, oneshot::Sender<io::Result<()>>);

/// Background task that owns the WAL and batches appends for group commit.
/// 1. Block until the first append arrives.
/// 2. Buffer it (no fsync).
/// 3. Drain all immediately available appends (the batch window).
/// 4. Single flush_sync for the whole batch.
/// 5. Respond to all senders.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalJob>) {
    while let Some(job) = rx.recv().await {
        let mut batch = vec![job];

        // Drain all immediately available appends
        while let Ok(job) = rx.try_recv() {
            batch.push(job);
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

fn flush_batch(wal: &mut Wal, batch: &[WalJob]) -> io::Result<()> {
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

fn respond_batch(batch: Vec<WalJob>, result: &io::Result<()>) {
    for (_, tx) in batch {
        let r = match result {
            Ok(()) => Ok(()),
            Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
        };
        let _ = tx.send(r);
    }
}

/// Apply a committed event directly to a ResourceState (no locking — caller
/// holds the lock).
fn apply_to_resource(rs: &mut ResourceState, event: &Event) {
    match event {
        Event::ReservationCommitted {
            id,
            resource_id,
            resource_kind,
            requester_name,
            requester_group,
            purpose,
            span,
            academic_level,
        } => {
            rs.insert_reservation(Reservation {
                id: *id,
                resource_id: resource_id.clone(),
                resource_kind: *resource_kind,
                requester_name: requester_name.clone(),
                requester_group: requester_group.clone(),
                purpose: purpose.clone(),
                span: *span,
                academic_level: *academic_level,
            });
        }
    }
}

/// The reservation service: catalog-backed, WAL-durable, one write lock per
/// resource so the conflict check and the commit are indivisible.
pub struct Engine {
    pub catalog: Arc<ResourceCatalog>,
    pub(super) state: DashMap<String, SharedResourceState>,
    wal_tx: mpsc::Sender<WalJob>,
    pub notify: Arc<NotifyHub>,
    pub(super) advisory: Arc<dyn AdvisoryAnnotator>,
}

impl Engine {
    /// Replay the WAL, seed one state slot per catalog resource, and start
    /// the group-commit writer. Must run inside a tokio runtime.
    pub fn new(
        catalog: Arc<ResourceCatalog>,
        wal_path: PathBuf,
        notify: Arc<NotifyHub>,
        advisory: Arc<dyn AdvisoryAnnotator>,
    ) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            catalog,
            state: DashMap::new(),
            wal_tx,
            notify,
            advisory,
        };

        for resource in engine.catalog.iter() {
            engine.state.insert(
                resource.id.clone(),
                Arc::new(RwLock::new(ResourceState::new(resource.id.clone()))),
            );
        }

        // Replay events — we're the sole owner of these Arcs, so try_write
        // always succeeds instantly (no contention). Never use blocking_write
        // here because this may run inside an async context.
        for event in &events {
            match engine.state.get(event.resource_id()) {
                Some(entry) => {
                    let rs_arc = entry.value().clone();
                    let mut guard = rs_arc.try_write().expect("replay: uncontended write");
                    apply_to_resource(&mut guard, event);
                }
                None => {
                    // The catalog no longer lists this resource; its history
                    // stays in the log but is not servable.
                    tracing::warn!(
                        resource_id = event.resource_id(),
                        "replay: dropping event for resource absent from catalog"
                    );
                }
            }
        }

        Ok(engine)
    }

    /// Write an event to the WAL via the background group-commit writer.
    /// An error here means nothing was committed.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), ReservationError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send((event.clone(), tx))
            .await
            .map_err(|_| ReservationError::Persistence("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| ReservationError::Persistence("WAL writer dropped response".into()))?
            .map_err(|e| ReservationError::Persistence(e.to_string()))
    }

    pub(super) fn resource_state(&self, resource_id: &str) -> Option<SharedResourceState> {
        self.state.get(resource_id).map(|e| e.value().clone())
    }
}
