#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Mediator Core
//!
//! In-process message dispatch: typed requests routed to exactly one handler,
//! notifications fanned out to every observer, and middleware pipelines
//! wrapped around request handling.
//!
//! ## Overview
//!
//! Callers depend on a [`Mediator`] rather than on concrete handlers. The
//! mediator looks handlers up by the exact runtime type of the message, runs
//! the request through its behaviors, and records every accepted dispatch
//! on an audit stream for external inspection.
//!
//! ## Architecture
//!
//! - **Type-indexed tables**: handlers and behaviors keyed by `TypeId`, built
//!   at startup and shared behind one coarse lock
//! - **Two-phase bind**: generic behaviors are materialized per request type
//!   when handlers are registered, never resolved per call
//! - **Explicit middleware stack**: [`Next`] walks a slice of behaviors down to
//!   the handler; the last-registered behavior is outermost
//! - **Cooperative cancellation**: one `CancellationToken` threads through
//!   every behavior and handler
//!
//! ## Module Organization
//!
//! - [`messages`] - Request and notification contracts
//! - [`handlers`] - Handler traits
//! - [`pipeline`] - Behavior traits and the continuation chain
//! - [`behaviors`] - Built-in logging and validation behaviors
//! - [`registry`] - Handler and behavior tables
//! - [`provider`] - Construction and lifetime policy
//! - [`mediator`] - Dispatch entry point and builder
//! - [`audit`] - Append-only dispatch streams
//! - [`config`] - Configuration loading
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust
//! use async_trait::async_trait;
//! use mediator_core::{HandlerResult, MediatorBuilder, Request, RequestHandler};
//! use tokio_util::sync::CancellationToken;
//!
//! #[derive(Debug)]
//! struct Ping {
//!     message: String,
//! }
//!
//! #[derive(Debug, PartialEq)]
//! struct Pong {
//!     text: String,
//! }
//!
//! impl Request for Ping {
//!     type Response = Pong;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler for PingHandler {
//!     type Request = Ping;
//!
//!     async fn handle(&self, request: &Ping, _cancel: &CancellationToken) -> HandlerResult<Pong> {
//!         Ok(Pong {
//!             text: format!("{} => Pong!", request.message),
//!         })
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let mediator = MediatorBuilder::new().request_handler(PingHandler).build();
//!
//! let pong = mediator.send(Ping { message: "hi".into() }).await.unwrap();
//! assert_eq!(pong.text, "hi => Pong!");
//! # });
//! ```

pub mod audit;
pub mod behaviors;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod mediator;
pub mod messages;
pub mod pipeline;
pub mod provider;
pub mod registry;

pub use audit::{AuditLog, AuditRecord, AuditStream, MessageKind};
pub use behaviors::{LoggingBehavior, ValidationBehavior, ValidationError, ValidationFailure, Validator};
pub use config::{ConfigLoader, ConfigurationError, MediatorConfig};
pub use error::{ConstructionError, HandlerResult, MediatorError, Result};
pub use handlers::{DynNotificationHandler, DynRequestHandler, NotificationHandler, RequestHandler};
pub use mediator::{HandlerModule, Mediator, MediatorBuilder};
pub use messages::{AnyNotification, AnyRequest, Notification, Request};
pub use pipeline::{
    DynPipelineBehavior, ErasedNext, ErasedResponse, GenericBehavior, MessageContext, Next,
    PipelineBehavior,
};
pub use provider::{ComponentId, Lifetime, Provider, Scope};
pub use registry::{Registry, RegistryStats};

// Re-exported so handler signatures need no extra dependency
pub use tokio_util::sync::CancellationToken;
