//! Dispatch of messages held behind [`AnyRequest`] / [`AnyNotification`].
//!
//! Each registration stores a monomorphized entry point for its message type,
//! so a value whose static type has been erased can still be routed by its
//! runtime [`TypeId`](std::any::TypeId) to the fully typed pipeline.

use super::Mediator;
use crate::error::{MediatorError, Result};
use crate::messages::{
    notification_type_id, request_type_id, short_type_name, AnyNotification, AnyRequest,
    Notification, Request,
};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::{type_name, Any};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub(crate) type ErasedSend = for<'a> fn(
    &'a Mediator,
    Box<dyn Any + Send + Sync>,
    &'a CancellationToken,
) -> BoxFuture<'a, Result<Box<dyn Any + Send>>>;

pub(crate) type ErasedPublish = for<'a> fn(
    &'a Mediator,
    Box<dyn Any + Send + Sync>,
    &'a CancellationToken,
) -> BoxFuture<'a, Result<()>>;

pub(crate) fn send_erased<'a, R: Request>(
    mediator: &'a Mediator,
    request: Box<dyn Any + Send + Sync>,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<Box<dyn Any + Send>>> {
    async move {
        let request = request
            .downcast::<R>()
            .map_err(|_| MediatorError::TypeMismatch {
                message_type: short_type_name(type_name::<R>()),
            })?;
        let response = mediator.send_with_cancel(*request, cancel).await?;
        Ok(Box::new(response) as Box<dyn Any + Send>)
    }
    .boxed()
}

pub(crate) fn publish_erased<'a, N: Notification>(
    mediator: &'a Mediator,
    notification: Box<dyn Any + Send + Sync>,
    cancel: &'a CancellationToken,
) -> BoxFuture<'a, Result<()>> {
    async move {
        let notification =
            notification
                .downcast::<N>()
                .map_err(|_| MediatorError::TypeMismatch {
                    message_type: short_type_name(type_name::<N>()),
                })?;
        mediator.publish_with_cancel(*notification, cancel).await
    }
    .boxed()
}

impl Mediator {
    /// Send a request whose concrete type is only known at runtime.
    ///
    /// The response comes back boxed; downcast it to the request's
    /// `Response` type.
    pub async fn send_dyn(
        &self,
        request: Box<dyn AnyRequest>,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn Any + Send>> {
        let type_id = request_type_id(request.as_ref());
        let request_type = request.type_name();

        let send = self
            .inner
            .registry
            .erased_send(type_id)
            .ok_or_else(|| MediatorError::HandlerNotFound {
                request_type: short_type_name(request_type),
            })?;

        debug!(request_type = request_type, "Dispatching request by runtime type");
        send(self, request.into_any(), cancel).await
    }

    /// Publish a notification whose concrete type is only known at runtime.
    ///
    /// A type with no registered handlers is a successful no-op.
    pub async fn publish_dyn(
        &self,
        notification: Box<dyn AnyNotification>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let type_id = notification_type_id(notification.as_ref());
        let notification_type = notification.type_name();

        match self.inner.registry.erased_publish(type_id) {
            Some(publish) => {
                debug!(
                    notification_type = notification_type,
                    "Publishing notification by runtime type"
                );
                publish(self, notification.into_any(), cancel).await
            }
            None => {
                debug!(
                    notification_type = notification_type,
                    "No handlers registered for notification, nothing to publish"
                );
                Ok(())
            }
        }
    }
}
