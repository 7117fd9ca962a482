//! Type-erased behaviors that apply to every request type.
//!
//! A [`GenericBehavior`] is registered once and bound to each request type
//! that has a handler. Binding wraps it in a [`GenericAdapter`] so the
//! dispatcher only ever deals with typed [`PipelineBehavior`]s.

use super::{Next, PipelineBehavior};
use crate::error::HandlerResult;
use crate::messages::{short_type_name, Request};
use anyhow::anyhow;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Response of a request as seen by a generic behavior.
pub type ErasedResponse = Box<dyn Any + Send>;

/// Middleware applied uniformly to every request type.
#[async_trait]
pub trait GenericBehavior: Send + Sync + 'static {
    async fn handle(
        &self,
        context: MessageContext<'_>,
        next: ErasedNext<'_>,
        cancel: &CancellationToken,
    ) -> HandlerResult<ErasedResponse>;
}

/// Read-only view of the request passing through a generic behavior.
#[derive(Clone, Copy)]
pub struct MessageContext<'a> {
    message: &'a (dyn Any + Send + Sync),
    type_name: &'static str,
}

impl<'a> MessageContext<'a> {
    pub(crate) fn of<R: Request>(request: &'a R) -> Self {
        Self {
            message: request,
            type_name: std::any::type_name::<R>(),
        }
    }

    /// Fully qualified type name of the request.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Type name without module path, as used in error messages.
    pub fn short_type_name(&self) -> String {
        short_type_name(self.type_name)
    }

    pub fn message(&self) -> &'a (dyn Any + Send + Sync) {
        self.message
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&'a T> {
        self.message.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.message.is::<T>()
    }
}

/// Continuation into the rest of the pipeline with its response boxed.
///
/// Nothing runs until [`ErasedNext::run`] is awaited; dropping it
/// short-circuits the handler.
pub struct ErasedNext<'a> {
    inner: BoxFuture<'a, HandlerResult<ErasedResponse>>,
}

impl<'a> ErasedNext<'a> {
    pub(crate) fn new(inner: BoxFuture<'a, HandlerResult<ErasedResponse>>) -> Self {
        Self { inner }
    }

    pub async fn run(self) -> HandlerResult<ErasedResponse> {
        self.inner.await
    }
}

/// Binds a [`GenericBehavior`] to request type `R`.
pub(crate) struct GenericAdapter<R> {
    behavior: Arc<dyn GenericBehavior>,
    behavior_name: &'static str,
    _request: PhantomData<fn() -> R>,
}

impl<R: Request> GenericAdapter<R> {
    pub(crate) fn new(behavior: Arc<dyn GenericBehavior>, behavior_name: &'static str) -> Self {
        Self {
            behavior,
            behavior_name,
            _request: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior for GenericAdapter<R> {
    type Request = R;

    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        cancel: &CancellationToken,
    ) -> HandlerResult<R::Response> {
        let context = MessageContext::of(request);
        let next = ErasedNext::new(Box::pin(async move {
            let response = next.run().await?;
            Ok(Box::new(response) as ErasedResponse)
        }));

        let response = self.behavior.handle(context, next, cancel).await?;
        response
            .downcast::<R::Response>()
            .map(|response| *response)
            .map_err(|_| {
                anyhow!(
                    "Behavior {} returned a response that is not {}",
                    short_type_name(self.behavior_name),
                    short_type_name(std::any::type_name::<R::Response>())
                )
            })
    }
}
