//! # Mediator
//!
//! The dispatch entry point callers hold.
//!
//! ## Request path
//!
//! ```text
//! send(request)
//!   -> resolve handler            HandlerNotFound, nothing else runs
//!   -> construct handler          HandlerConstruction
//!   -> resolve behaviors          failed constructions are skipped
//!   -> audit write
//!   -> last-registered behavior -> ... -> first-registered behavior -> handler
//! ```
//!
//! ## Notification path
//!
//! ```text
//! publish(notification)
//!   -> resolve handlers           none: Ok, no audit
//!   -> audit write
//!   -> every handler concurrently, wait for all to settle
//!   -> NotificationFailed listing every failure, if any
//! ```
//!
//! A [`Mediator`] is cheap to clone. Clones share registries, audit streams
//! and scope; [`Mediator::create_scope`] shares everything but the scope.

mod builder;
pub(crate) mod dynamic;

pub use builder::{HandlerModule, MediatorBuilder};

use crate::audit::{AuditLog, AuditStream, MessageKind};
use crate::config::MediatorConfig;
use crate::error::{HandlerResult, MediatorError, Result};
use crate::handlers::DynNotificationHandler;
use crate::logging::{log_dispatch_operation, log_error};
use crate::messages::{short_type_name, Notification, Request};
use crate::pipeline::Next;
use crate::provider::{Provider, Scope};
use crate::registry::Registry;
use futures::future::join_all;
use std::any::{type_name, Any};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};
use uuid::Uuid;

struct MediatorInner {
    registry: Registry,
    audit: AuditLog,
    config: MediatorConfig,
}

/// Routes requests to their handler and notifications to their observers.
#[derive(Clone)]
pub struct Mediator {
    inner: Arc<MediatorInner>,
    scope: Arc<Scope>,
}

impl Mediator {
    /// An empty mediator with default configuration.
    ///
    /// Handlers can still be registered at runtime through [`Mediator::registry`].
    pub fn new() -> Self {
        Self::with_registry(Registry::new(), MediatorConfig::default())
    }

    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    pub(crate) fn with_registry(registry: Registry, config: MediatorConfig) -> Self {
        let audit = AuditLog::from_config(&config.audit);
        Self {
            inner: Arc::new(MediatorInner {
                registry,
                audit,
                config,
            }),
            scope: Arc::new(Scope::new()),
        }
    }

    /// Send a request to its handler and return the response.
    pub async fn send<R: Request>(&self, request: R) -> Result<R::Response> {
        self.send_with_cancel(request, &CancellationToken::new()).await
    }

    /// [`Mediator::send`] with a caller-supplied cancellation signal, passed
    /// through every behavior into the handler.
    #[instrument(skip_all, fields(request_type = type_name::<R>(), scope_id = %self.scope.id()))]
    pub async fn send_with_cancel<R: Request>(
        &self,
        request: R,
        cancel: &CancellationToken,
    ) -> Result<R::Response> {
        let started = Instant::now();
        let request_type = type_name::<R>();

        let provider = self.inner.registry.resolve_request_handler::<R>()?;
        let handler = provider.resolve(&self.scope)?;

        // Registration order; the last registered wraps everything else.
        let mut behaviors = self.inner.registry.resolve_behaviors::<R>(&self.scope);
        behaviors.reverse();
        debug!(
            handler = provider.component().name,
            behaviors = behaviors.len(),
            "Resolved request pipeline"
        );

        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled {
                message_type: short_type_name(request_type),
            });
        }

        let request = Arc::new(request);
        let dispatch_id = Uuid::new_v4();
        self.inner.audit.record(
            MessageKind::Request,
            dispatch_id,
            request_type,
            Arc::clone(&request) as Arc<dyn Any + Send + Sync>,
        );

        let result = Next::new(&*request, &behaviors, &*handler, cancel)
            .run()
            .await;

        log_dispatch_operation(
            "send",
            request_type,
            &dispatch_id.to_string(),
            if result.is_ok() { "completed" } else { "failed" },
            Some(started.elapsed().as_millis() as u64),
            None,
        );

        result.map_err(into_mediator_error)
    }

    /// Deliver a notification to every handler registered for its exact type.
    pub async fn publish<N: Notification>(&self, notification: N) -> Result<()> {
        self.publish_with_cancel(notification, &CancellationToken::new())
            .await
    }

    /// [`Mediator::publish`] with a caller-supplied cancellation signal,
    /// shared by every handler of the fan-out.
    #[instrument(skip_all, fields(notification_type = type_name::<N>(), scope_id = %self.scope.id()))]
    pub async fn publish_with_cancel<N: Notification>(
        &self,
        notification: N,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let started = Instant::now();
        let notification_type = type_name::<N>();

        let providers = self.inner.registry.resolve_notification_handlers::<N>()?;
        if providers.is_empty() {
            debug!("No handlers registered for notification, nothing to publish");
            return Ok(());
        }

        if cancel.is_cancelled() {
            return Err(MediatorError::Cancelled {
                message_type: short_type_name(notification_type),
            });
        }

        let notification = Arc::new(notification);
        let dispatch_id = Uuid::new_v4();
        self.inner.audit.record(
            MessageKind::Notification,
            dispatch_id,
            notification_type,
            Arc::clone(&notification) as Arc<dyn Any + Send + Sync>,
        );

        let handler_count = providers.len();
        let outcomes = join_all(providers.iter().map(|provider| {
            notify_one(provider, &self.scope, &*notification, cancel)
        }))
        .await;
        let failures: Vec<anyhow::Error> = outcomes.into_iter().filter_map(|r| r.err()).collect();

        log_dispatch_operation(
            "publish",
            notification_type,
            &dispatch_id.to_string(),
            if failures.is_empty() { "completed" } else { "failed" },
            Some(started.elapsed().as_millis() as u64),
            None,
        );

        if failures.is_empty() {
            return Ok(());
        }

        let error = MediatorError::NotificationFailed {
            notification_type: short_type_name(notification_type),
            handler_count,
            failures,
        };
        log_error(
            "mediator",
            "publish",
            &error.to_string(),
            Some(&format!("dispatch_id={dispatch_id}")),
        );
        Err(error)
    }

    /// A mediator sharing registries and audit streams with this one, with
    /// its own instance scope.
    pub fn create_scope(&self) -> Mediator {
        let scope = Arc::new(Scope::new());
        debug!(scope_id = %scope.id(), "Created dispatch scope");
        Mediator {
            inner: Arc::clone(&self.inner),
            scope,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Handler and behavior tables, open for runtime registration.
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    pub fn config(&self) -> &MediatorConfig {
        &self.inner.config
    }

    pub fn audit(&self) -> &AuditLog {
        &self.inner.audit
    }

    /// Every request dispatched from now on, and every one already recorded.
    ///
    /// The stream ends when `cancel` fires.
    pub fn read_request_audit(&self, cancel: CancellationToken) -> AuditStream {
        self.inner.audit.read_requests(cancel)
    }

    /// Every notification dispatched to at least one handler.
    ///
    /// The stream ends when `cancel` fires.
    pub fn read_notification_audit(&self, cancel: CancellationToken) -> AuditStream {
        self.inner.audit.read_notifications(cancel)
    }

    /// Clear both audit streams. Intended for tests and teardown.
    pub fn reset_audit(&self) {
        self.inner.audit.reset();
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("registry", &self.inner.registry)
            .field("config", &self.inner.config)
            .field("scope", &self.scope)
            .finish()
    }
}

async fn notify_one<N: Notification>(
    provider: &Provider<DynNotificationHandler<N>>,
    scope: &Scope,
    notification: &N,
    cancel: &CancellationToken,
) -> HandlerResult<()> {
    let handler = provider.resolve(scope)?;
    handler.handle(notification, cancel).await
}

/// A failure that already is a dispatch error, from a nested send, keeps
/// its variant.
fn into_mediator_error(error: anyhow::Error) -> MediatorError {
    match error.downcast::<MediatorError>() {
        Ok(error) => error,
        Err(error) => MediatorError::Handler(error),
    }
}
