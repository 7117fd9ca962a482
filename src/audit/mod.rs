//! # Audit Log
//!
//! Append-only record of dispatched messages for external observability.
//!
//! ## Architecture
//!
//! Requests and notifications are recorded on separate [`AuditChannel`]s.
//! Each channel is an unbounded ordered log:
//! - **Producers never wait**: appending takes a short write lock and wakes readers
//! - **Every reader sees every record**: readers keep their own cursor
//! - **Lazy, infinite readers**: an [`AuditStream`] yields records as they
//!   arrive and ends only when its cancellation token fires
//!
//! ## Usage
//!
//! ```rust
//! use futures::StreamExt;
//! use mediator_core::audit::{AuditLog, MessageKind};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//! use uuid::Uuid;
//!
//! # tokio_test::block_on(async {
//! let audit = AuditLog::new(true);
//! let cancel = CancellationToken::new();
//! let mut requests = audit.read_requests(cancel.clone());
//!
//! audit.record(MessageKind::Request, Uuid::new_v4(), "app::Ping", Arc::new("ping"));
//!
//! let record = requests.next().await.unwrap();
//! assert_eq!(record.message_type, "app::Ping");
//! assert_eq!(record.downcast_ref::<&str>(), Some(&"ping"));
//!
//! cancel.cancel();
//! assert!(requests.next().await.is_none());
//! # });
//! ```

mod stream;

pub use stream::{AuditChannel, AuditStream};

use crate::config::AuditConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Which dispatch path produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Request,
    Notification,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Request => write!(f, "request"),
            MessageKind::Notification => write!(f, "notification"),
        }
    }
}

/// One dispatched message.
#[derive(Clone)]
pub struct AuditRecord {
    /// Position in its channel since the last reset
    pub sequence: u64,
    pub dispatch_id: Uuid,
    pub kind: MessageKind,
    pub message_type: &'static str,
    pub recorded_at: DateTime<Utc>,
    message: Arc<dyn Any + Send + Sync>,
}

impl AuditRecord {
    /// The dispatched value itself.
    pub fn message(&self) -> &(dyn Any + Send + Sync) {
        self.message.as_ref()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.message.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.message.is::<T>()
    }
}

impl fmt::Debug for AuditRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuditRecord")
            .field("sequence", &self.sequence)
            .field("dispatch_id", &self.dispatch_id)
            .field("kind", &self.kind)
            .field("message_type", &self.message_type)
            .field("recorded_at", &self.recorded_at)
            .field("message", &"<Arc<dyn Any>>")
            .finish()
    }
}

/// Request and notification channels owned by one mediator.
#[derive(Debug, Clone)]
pub struct AuditLog {
    record_requests: bool,
    record_notifications: bool,
    requests: Arc<AuditChannel>,
    notifications: Arc<AuditChannel>,
}

impl AuditLog {
    /// A disabled log drops every record; readers simply wait.
    pub fn new(enabled: bool) -> Self {
        Self::from_config(&AuditConfig {
            enabled,
            ..AuditConfig::default()
        })
    }

    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            record_requests: config.enabled && config.record_requests,
            record_notifications: config.enabled && config.record_notifications,
            requests: Arc::new(AuditChannel::new(MessageKind::Request)),
            notifications: Arc::new(AuditChannel::new(MessageKind::Notification)),
        }
    }

    pub fn is_recording(&self, kind: MessageKind) -> bool {
        match kind {
            MessageKind::Request => self.record_requests,
            MessageKind::Notification => self.record_notifications,
        }
    }

    /// Append a dispatched message to the channel for `kind`.
    pub fn record(
        &self,
        kind: MessageKind,
        dispatch_id: Uuid,
        message_type: &'static str,
        message: Arc<dyn Any + Send + Sync>,
    ) {
        if !self.is_recording(kind) {
            return;
        }
        let sequence = self.channel(kind).append(dispatch_id, message_type, message);
        debug!(
            kind = %kind,
            sequence = sequence,
            dispatch_id = %dispatch_id,
            message_type = message_type,
            "Audit record appended"
        );
    }

    pub fn read_requests(&self, cancel: CancellationToken) -> AuditStream {
        self.requests.reader(cancel)
    }

    pub fn read_notifications(&self, cancel: CancellationToken) -> AuditStream {
        self.notifications.reader(cancel)
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.len()
    }

    /// Clear both channels. Intended for tests and teardown.
    pub fn reset(&self) {
        self.requests.reset();
        self.notifications.reset();
        debug!("Audit log reset");
    }

    fn channel(&self, kind: MessageKind) -> &AuditChannel {
        match kind {
            MessageKind::Request => &self.requests,
            MessageKind::Notification => &self.notifications,
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_kinds_are_not_recorded() {
        let audit = AuditLog::from_config(&AuditConfig {
            enabled: true,
            record_requests: true,
            record_notifications: false,
        });

        audit.record(MessageKind::Request, Uuid::new_v4(), "app::Ping", Arc::new(1u8));
        audit.record(MessageKind::Notification, Uuid::new_v4(), "app::Tick", Arc::new(2u8));

        assert_eq!(audit.request_count(), 1);
        assert_eq!(audit.notification_count(), 0);
        assert!(!AuditLog::new(false).is_recording(MessageKind::Request));
    }

    #[test]
    fn test_reset_clears_both_channels() {
        let audit = AuditLog::default();
        audit.record(MessageKind::Request, Uuid::new_v4(), "app::Ping", Arc::new(1u8));
        audit.record(MessageKind::Notification, Uuid::new_v4(), "app::Tick", Arc::new(2u8));

        audit.reset();
        assert_eq!(audit.request_count(), 0);
        assert_eq!(audit.notification_count(), 0);
    }

    #[test]
    fn test_message_kind_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&MessageKind::Notification).unwrap(), "\"notification\"");
        assert_eq!(MessageKind::Request.to_string(), "request");
    }
}
