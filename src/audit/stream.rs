//! Ordered, multi-reader record channel.

use super::{AuditRecord, MessageKind};
use chrono::Utc;
use futures::stream::{self, BoxStream};
use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Lazy reader over one audit channel.
///
/// Yields every record appended after its channel position, in order, and
/// ends only when its cancellation token fires.
pub type AuditStream = BoxStream<'static, AuditRecord>;

struct ChannelState {
    /// Bumped by every reset so readers drop stale cursors
    epoch: u64,
    records: Vec<AuditRecord>,
}

/// Unbounded append-only log of one message kind.
pub struct AuditChannel {
    kind: MessageKind,
    state: RwLock<ChannelState>,
    appended: Notify,
}

impl AuditChannel {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            state: RwLock::new(ChannelState {
                epoch: 0,
                records: Vec::new(),
            }),
            appended: Notify::new(),
        }
    }

    /// Append a record and wake every waiting reader. Returns its sequence.
    pub fn append(
        &self,
        dispatch_id: Uuid,
        message_type: &'static str,
        message: Arc<dyn Any + Send + Sync>,
    ) -> u64 {
        let sequence = {
            let mut state = self.state.write();
            let sequence = state.records.len() as u64;
            state.records.push(AuditRecord {
                sequence,
                dispatch_id,
                kind: self.kind,
                message_type,
                recorded_at: Utc::now(),
                message,
            });
            sequence
        };
        self.appended.notify_waiters();
        sequence
    }

    pub fn len(&self) -> usize {
        self.state.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&self) {
        let mut state = self.state.write();
        state.epoch += 1;
        state.records.clear();
    }

    /// Start a reader at the beginning of the channel.
    pub fn reader(self: &Arc<Self>, cancel: CancellationToken) -> AuditStream {
        let cursor = Cursor {
            channel: Arc::clone(self),
            cancel,
            epoch: self.state.read().epoch,
            position: 0,
        };
        Box::pin(stream::unfold(cursor, |mut cursor| async move {
            let record = cursor.next_record().await?;
            Some((record, cursor))
        }))
    }
}

impl fmt::Debug for AuditChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("AuditChannel")
            .field("kind", &self.kind)
            .field("epoch", &state.epoch)
            .field("records", &state.records.len())
            .finish()
    }
}

struct Cursor {
    channel: Arc<AuditChannel>,
    cancel: CancellationToken,
    epoch: u64,
    position: usize,
}

impl Cursor {
    fn try_next(&mut self) -> Option<AuditRecord> {
        let state = self.channel.state.read();
        if state.epoch != self.epoch {
            self.epoch = state.epoch;
            self.position = 0;
        }
        let record = state.records.get(self.position).cloned()?;
        self.position += 1;
        Some(record)
    }

    /// `None` once cancelled.
    async fn next_record(&mut self) -> Option<AuditRecord> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }

            // Register interest before checking, so an append between the
            // check and the await is not missed.
            let channel = Arc::clone(&self.channel);
            let appended = channel.appended.notified();
            tokio::pin!(appended);
            appended.as_mut().enable();

            if let Some(record) = self.try_next() {
                return Some(record);
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = &mut appended => {}
            }
        }
    }
}
