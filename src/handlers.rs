//! # Handlers
//!
//! Units of business logic. Each handler is bound to exactly one message type
//! through an associated type, so registration never needs the message type
//! spelled out.
//!
//! ```rust
//! use async_trait::async_trait;
//! use mediator_core::{HandlerResult, Request, RequestHandler};
//! use tokio_util::sync::CancellationToken;
//!
//! struct Ping {
//!     message: String,
//! }
//!
//! impl Request for Ping {
//!     type Response = String;
//! }
//!
//! struct PingHandler;
//!
//! #[async_trait]
//! impl RequestHandler for PingHandler {
//!     type Request = Ping;
//!
//!     async fn handle(&self, request: &Ping, _cancel: &CancellationToken) -> HandlerResult<String> {
//!         Ok(format!("{} => Pong!", request.message))
//!     }
//! }
//! ```

use crate::error::HandlerResult;
use crate::messages::{Notification, Request};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Produces the single response for a request type.
#[async_trait]
pub trait RequestHandler: Send + Sync + 'static {
    type Request: Request;

    async fn handle(
        &self,
        request: &Self::Request,
        cancel: &CancellationToken,
    ) -> HandlerResult<<Self::Request as Request>::Response>;
}

/// Observes one notification type. Any number may be registered per type.
#[async_trait]
pub trait NotificationHandler: Send + Sync + 'static {
    type Notification: Notification;

    async fn handle(
        &self,
        notification: &Self::Notification,
        cancel: &CancellationToken,
    ) -> HandlerResult<()>;
}

/// Trait object for the handler of request type `R`.
pub type DynRequestHandler<R> = dyn RequestHandler<Request = R>;

/// Trait object for a handler of notification type `N`.
pub type DynNotificationHandler<N> = dyn NotificationHandler<Notification = N>;
