//! # Registry Infrastructure
//!
//! Type-indexed tables mapping message types to handlers and behaviors.
//!
//! ## Overview
//!
//! A single [`Registry`] owns every table behind one coarse `RwLock`.
//! Registrations take the write lock, so each entry appears atomically;
//! dispatch takes the read lock only long enough to clone out the providers
//! it needs and never holds it across an `.await`.
//!
//! ## Architecture
//!
//! ```text
//! Registry
//! ├── requests        TypeId -> handler provider (last registration wins)
//! ├── notifications   TypeId -> [handler provider] (all retained)
//! ├── behaviors       TypeId -> behavior chain (registration order, deduplicated)
//! └── generic         [generic behavior] bound to every request type with a handler
//! ```
//!
//! Lookups use the exact [`TypeId`](std::any::TypeId) of the message, so
//! a message held behind [`AnyRequest`](crate::messages::AnyRequest) still
//! resolves by its concrete type.
//!
//! ## Usage
//!
//! ```rust
//! use async_trait::async_trait;
//! use mediator_core::{
//!     ComponentId, DynRequestHandler, HandlerResult, Provider, Registry, Request, RequestHandler,
//! };
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ping;
//! impl Request for Ping {
//!     type Response = &'static str;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler for PingHandler {
//!     type Request = Ping;
//!
//!     async fn handle(&self, _request: &Ping, _cancel: &CancellationToken) -> HandlerResult<&'static str> {
//!         Ok("pong")
//!     }
//! }
//!
//! let registry = Registry::new();
//! registry.register_request_handler(Provider::instance(
//!     ComponentId::of::<PingHandler>(),
//!     Arc::new(PingHandler) as Arc<DynRequestHandler<Ping>>,
//! ));
//!
//! assert!(registry.resolve_request_handler::<Ping>().is_ok());
//! assert_eq!(registry.stats().request_handlers, 1);
//! ```

pub mod handler_registry;
pub mod pipeline_registry;

use handler_registry::{NotificationRegistration, RequestRegistration};
use parking_lot::RwLock;
use pipeline_registry::GenericRegistration;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Type-erased behavior chains keyed by request type.
pub(crate) type BehaviorTables = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

#[derive(Default)]
pub(crate) struct RegistryTables {
    pub(crate) requests: HashMap<TypeId, RequestRegistration>,
    pub(crate) notifications: HashMap<TypeId, NotificationRegistration>,
    pub(crate) behaviors: BehaviorTables,
    pub(crate) generic_behaviors: Vec<GenericRegistration>,
}

/// Handler and behavior tables shared by every dispatch.
pub struct Registry {
    tables: RwLock<RegistryTables>,
    /// Orders behavior registrations across concrete and generic kinds
    sequence: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(RegistryTables::default()),
            sequence: AtomicU64::new(0),
        }
    }

    fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::Relaxed)
    }

    /// Snapshot of registration counts.
    pub fn stats(&self) -> RegistryStats {
        let tables = self.tables.read();

        let mut request_types: Vec<&'static str> =
            tables.requests.values().map(|r| r.type_name).collect();
        request_types.sort_unstable();
        let mut notification_type_names: Vec<&'static str> =
            tables.notifications.values().map(|n| n.type_name).collect();
        notification_type_names.sort_unstable();

        RegistryStats {
            request_handlers: tables.requests.len(),
            notification_types: tables.notifications.len(),
            notification_handlers: tables
                .notifications
                .values()
                .map(|n| n.handlers.len())
                .sum(),
            behavior_bindings: tables
                .requests
                .values()
                .map(|r| (r.behavior_count)(&tables.behaviors))
                .sum(),
            generic_behaviors: tables.generic_behaviors.len(),
            request_types,
            notification_type_names,
        }
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("stats", &self.stats())
            .finish()
    }
}

/// Registration counts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStats {
    pub request_handlers: usize,
    pub notification_types: usize,
    pub notification_handlers: usize,
    /// Behaviors bound to request types that have a handler
    pub behavior_bindings: usize,
    pub generic_behaviors: usize,
    pub request_types: Vec<&'static str>,
    pub notification_type_names: Vec<&'static str>,
}
