//! Startup wiring for a [`Mediator`].
//!
//! Registrations are collected first and applied in order by
//! [`MediatorBuilder::build`], so factories registered without an explicit
//! lifetime pick up the lifetime in effect at build time no matter where
//! the lifetime toggle appears in the chain.

use super::Mediator;
use crate::config::MediatorConfig;
use crate::handlers::{DynNotificationHandler, DynRequestHandler, NotificationHandler, RequestHandler};
use crate::messages::{Notification, Request};
use crate::pipeline::{DynPipelineBehavior, GenericBehavior, PipelineBehavior};
use crate::provider::{ComponentId, Lifetime, Provider};
use crate::registry::Registry;
use std::sync::Arc;
use tracing::{debug, info};

type Registration = Box<dyn FnOnce(&Registry, Lifetime) + Send>;

/// A group of handlers and behaviors registered together.
///
/// Stands in for scanning a module for handler types: each module lists its
/// own components.
pub trait HandlerModule {
    fn name(&self) -> &str;

    fn register(&self, builder: MediatorBuilder) -> MediatorBuilder;
}

/// Builder for [`Mediator`]
pub struct MediatorBuilder {
    config: MediatorConfig,
    registrations: Vec<Registration>,
    modules: Vec<String>,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self {
            config: MediatorConfig::default(),
            registrations: Vec::new(),
            modules: Vec::new(),
        }
    }

    /// Replace the configuration, including the default lifetime.
    pub fn with_config(mut self, config: MediatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Lifetime for factories registered without an explicit one
    pub fn lifetime(mut self, lifetime: Lifetime) -> Self {
        self.config.default_lifetime = lifetime;
        self
    }

    pub fn use_singleton_lifetime(self) -> Self {
        self.lifetime(Lifetime::Singleton)
    }

    pub fn use_scoped_lifetime(self) -> Self {
        self.lifetime(Lifetime::Scoped)
    }

    pub fn use_transient_lifetime(self) -> Self {
        self.lifetime(Lifetime::Transient)
    }

    /// Enable/disable both audit streams
    pub fn audit(mut self, enabled: bool) -> Self {
        self.config.audit.enabled = enabled;
        self
    }

    fn defer<F>(mut self, registration: F) -> Self
    where
        F: FnOnce(&Registry, Lifetime) + Send + 'static,
    {
        self.registrations.push(Box::new(registration));
        self
    }

    /// Register a ready handler instance, shared by every dispatch.
    pub fn request_handler<H: RequestHandler>(self, handler: H) -> Self {
        let handler = Arc::new(handler) as Arc<DynRequestHandler<H::Request>>;
        self.defer(move |registry, _| {
            registry.register_request_handler(Provider::instance(ComponentId::of::<H>(), handler));
        })
    }

    /// Register a handler built by `factory` under the default lifetime.
    pub fn request_handler_factory<H, F>(self, factory: F) -> Self
    where
        H: RequestHandler,
        F: Fn() -> anyhow::Result<H> + Send + Sync + 'static,
    {
        self.defer(move |registry, lifetime| {
            registry.register_request_handler(Provider::factory(
                ComponentId::of::<H>(),
                lifetime,
                move || factory().map(|handler| Arc::new(handler) as Arc<DynRequestHandler<H::Request>>),
            ));
        })
    }

    /// Register a provider with its own lifetime.
    pub fn request_handler_provider<R: Request>(self, provider: Provider<DynRequestHandler<R>>) -> Self {
        self.defer(move |registry, _| registry.register_request_handler(provider))
    }

    pub fn notification_handler<H: NotificationHandler>(self, handler: H) -> Self {
        let handler = Arc::new(handler) as Arc<DynNotificationHandler<H::Notification>>;
        self.defer(move |registry, _| {
            registry.register_notification_handler(Provider::instance(ComponentId::of::<H>(), handler));
        })
    }

    pub fn notification_handler_factory<H, F>(self, factory: F) -> Self
    where
        H: NotificationHandler,
        F: Fn() -> anyhow::Result<H> + Send + Sync + 'static,
    {
        self.defer(move |registry, lifetime| {
            registry.register_notification_handler(Provider::factory(
                ComponentId::of::<H>(),
                lifetime,
                move || {
                    factory().map(|handler| {
                        Arc::new(handler) as Arc<DynNotificationHandler<H::Notification>>
                    })
                },
            ));
        })
    }

    pub fn notification_handler_provider<N: Notification>(
        self,
        provider: Provider<DynNotificationHandler<N>>,
    ) -> Self {
        self.defer(move |registry, _| registry.register_notification_handler(provider))
    }

    /// Wrap `B::Request` with a behavior instance.
    ///
    /// Behaviors are keyed by type: a second registration of `B` for the same
    /// request type is ignored, whatever its state. Compose validators into a
    /// single [`ValidationBehavior`](crate::ValidationBehavior) rather than
    /// registering one per validator.
    pub fn behavior<B: PipelineBehavior>(self, behavior: B) -> Self {
        let behavior = Arc::new(behavior) as Arc<DynPipelineBehavior<B::Request>>;
        self.defer(move |registry, _| {
            registry.register_behavior(Provider::instance(ComponentId::of::<B>(), behavior));
        })
    }

    pub fn behavior_factory<B, F>(self, factory: F) -> Self
    where
        B: PipelineBehavior,
        F: Fn() -> anyhow::Result<B> + Send + Sync + 'static,
    {
        self.defer(move |registry, lifetime| {
            registry.register_behavior(Provider::factory(
                ComponentId::of::<B>(),
                lifetime,
                move || factory().map(|behavior| Arc::new(behavior) as Arc<DynPipelineBehavior<B::Request>>),
            ));
        })
    }

    /// Wrap every request type that has a handler with a behavior instance.
    pub fn generic_behavior<B: GenericBehavior>(self, behavior: B) -> Self {
        let behavior = Arc::new(behavior) as Arc<dyn GenericBehavior>;
        self.defer(move |registry, _| {
            registry.register_generic_behavior(Provider::instance(ComponentId::of::<B>(), behavior));
        })
    }

    pub fn generic_behavior_factory<B, F>(self, factory: F) -> Self
    where
        B: GenericBehavior,
        F: Fn() -> anyhow::Result<B> + Send + Sync + 'static,
    {
        self.defer(move |registry, lifetime| {
            registry.register_generic_behavior(Provider::factory(
                ComponentId::of::<B>(),
                lifetime,
                move || factory().map(|behavior| Arc::new(behavior) as Arc<dyn GenericBehavior>),
            ));
        })
    }

    /// Let a module add its components.
    pub fn add_module<M: HandlerModule + ?Sized>(self, module: &M) -> Self {
        let before = self.registrations.len();
        let mut builder = module.register(self);
        debug!(
            module = module.name(),
            registrations = builder.registrations.len().saturating_sub(before),
            "Handler module added"
        );
        builder.modules.push(module.name().to_string());
        builder
    }

    /// Apply every registration, in order, to a fresh registry.
    pub fn build(self) -> Mediator {
        let registry = Registry::new();
        let lifetime = self.config.default_lifetime;
        let registrations = self.registrations.len();

        for registration in self.registrations {
            registration(&registry, lifetime);
        }

        let stats = registry.stats();
        info!(
            registrations = registrations,
            modules = ?self.modules,
            default_lifetime = %lifetime,
            request_handlers = stats.request_handlers,
            notification_handlers = stats.notification_handlers,
            behavior_bindings = stats.behavior_bindings,
            "Mediator built"
        );

        Mediator::with_registry(registry, self.config)
    }
}

impl Default for MediatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
