//! # Handler Registry
//!
//! Request and notification handler tables.
//!
//! - Request types map to exactly one handler provider. Registering again for
//!   the same type replaces the previous provider (last registration wins).
//! - Notification types map to an ordered list of providers; registrations
//!   are appended and never overwrite.

use super::pipeline_registry::{behavior_count, bind_generic, GenericRegistration};
use super::{BehaviorTables, Registry, RegistryTables};
use crate::error::{MediatorError, Result};
use crate::handlers::{DynNotificationHandler, DynRequestHandler};
use crate::logging::log_registry_operation;
use crate::mediator::dynamic::{publish_erased, send_erased, ErasedPublish, ErasedSend};
use crate::messages::{short_type_name, Notification, Request};
use crate::provider::{ComponentId, Provider};
use std::any::{type_name, Any, TypeId};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{debug, warn};

pub(crate) struct RequestRegistration {
    pub(crate) type_name: &'static str,
    component: ComponentId,
    /// `Provider<DynRequestHandler<R>>`
    handler: Arc<dyn Any + Send + Sync>,
    pub(crate) bind_generic: fn(&mut BehaviorTables, &GenericRegistration),
    pub(crate) behavior_count: fn(&BehaviorTables) -> usize,
    pub(crate) send: ErasedSend,
}

pub(crate) struct NotificationRegistration {
    pub(crate) type_name: &'static str,
    /// `Provider<DynNotificationHandler<N>>` each
    pub(crate) handlers: Vec<Arc<dyn Any + Send + Sync>>,
    pub(crate) publish: ErasedPublish,
}

impl Registry {
    /// Associate a handler with request type `R`, replacing any previous one.
    ///
    /// Generic behaviors already registered are bound to `R` the first time a
    /// handler for `R` appears.
    pub fn register_request_handler<R: Request>(&self, provider: Provider<DynRequestHandler<R>>) {
        let request_type = type_name::<R>();
        let component = provider.component();
        let handler: Arc<dyn Any + Send + Sync> = Arc::new(provider);

        let replaced = {
            let mut tables = self.tables.write();
            let RegistryTables {
                requests,
                behaviors,
                generic_behaviors,
                ..
            } = &mut *tables;

            match requests.entry(TypeId::of::<R>()) {
                Entry::Occupied(mut occupied) => {
                    let registration = occupied.get_mut();
                    warn!(
                        request_type = request_type,
                        previous = registration.component.name,
                        handler = component.name,
                        "Request handler already registered, replacing"
                    );
                    registration.component = component;
                    registration.handler = handler;
                    true
                }
                Entry::Vacant(vacant) => {
                    let registration = vacant.insert(RequestRegistration {
                        type_name: request_type,
                        component,
                        handler,
                        bind_generic: bind_generic::<R>,
                        behavior_count: behavior_count::<R>,
                        send: send_erased::<R>,
                    });
                    for generic in generic_behaviors.iter() {
                        (registration.bind_generic)(behaviors, generic);
                    }
                    false
                }
            }
        };

        log_registry_operation(
            "register_request_handler",
            request_type,
            component.name,
            if replaced { "replaced" } else { "registered" },
        );
    }

    /// Append a handler for notification type `N`.
    pub fn register_notification_handler<N: Notification>(
        &self,
        provider: Provider<DynNotificationHandler<N>>,
    ) {
        let notification_type = type_name::<N>();
        let component = provider.component();

        let handler_count = {
            let mut tables = self.tables.write();
            let registration = tables
                .notifications
                .entry(TypeId::of::<N>())
                .or_insert_with(|| NotificationRegistration {
                    type_name: notification_type,
                    handlers: Vec::new(),
                    publish: publish_erased::<N>,
                });
            registration.handlers.push(Arc::new(provider));
            registration.handlers.len()
        };

        debug!(
            notification_type = notification_type,
            handler_count = handler_count,
            "Notification handler appended"
        );
        log_registry_operation(
            "register_notification_handler",
            notification_type,
            component.name,
            "registered",
        );
    }

    /// The handler registered most recently for exactly `R`.
    pub fn resolve_request_handler<R: Request>(
        &self,
    ) -> Result<Arc<Provider<DynRequestHandler<R>>>> {
        let handler = {
            let tables = self.tables.read();
            tables
                .requests
                .get(&TypeId::of::<R>())
                .map(|registration| Arc::clone(&registration.handler))
        };

        let handler = handler.ok_or_else(|| MediatorError::HandlerNotFound {
            request_type: short_type_name(type_name::<R>()),
        })?;

        handler
            .downcast::<Provider<DynRequestHandler<R>>>()
            .map_err(|_| MediatorError::TypeMismatch {
                message_type: short_type_name(type_name::<R>()),
            })
    }

    /// Every handler registered for exactly `N`, in registration order.
    ///
    /// An empty list is a valid result.
    pub fn resolve_notification_handlers<N: Notification>(
        &self,
    ) -> Result<Vec<Arc<Provider<DynNotificationHandler<N>>>>> {
        let handlers = {
            let tables = self.tables.read();
            tables
                .notifications
                .get(&TypeId::of::<N>())
                .map(|registration| registration.handlers.clone())
                .unwrap_or_default()
        };

        handlers
            .into_iter()
            .map(|handler| {
                handler
                    .downcast::<Provider<DynNotificationHandler<N>>>()
                    .map_err(|_| MediatorError::TypeMismatch {
                        message_type: short_type_name(type_name::<N>()),
                    })
            })
            .collect()
    }

    /// Whether a request handler exists for the runtime type `type_id`.
    pub fn has_request_handler(&self, type_id: TypeId) -> bool {
        self.tables.read().requests.contains_key(&type_id)
    }

    pub(crate) fn erased_send(&self, type_id: TypeId) -> Option<ErasedSend> {
        self.tables
            .read()
            .requests
            .get(&type_id)
            .map(|registration| registration.send)
    }

    pub(crate) fn erased_publish(&self, type_id: TypeId) -> Option<ErasedPublish> {
        self.tables
            .read()
            .notifications
            .get(&type_id)
            .map(|registration| registration.publish)
    }
}
