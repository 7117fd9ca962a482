//! # Request Pipeline
//!
//! Middleware ("behaviors") wrapped around request handling.
//!
//! ## Architecture
//!
//! A dispatch resolves an ordered slice of behaviors, outermost first, and
//! threads a [`Next`] continuation through it. Each behavior receives the
//! request plus a `Next` covering the rest of the slice; the handler sits at
//! the end of the slice.
//!
//! ```text
//! send(request)
//!   └─► Behavior B (registered last)
//!         └─► Behavior A (registered first)
//!               └─► Handler
//! ```
//!
//! A behavior that returns without running `next` short-circuits everything
//! inside it, including the handler.
//!
//! Behaviors come in two forms:
//! - [`PipelineBehavior`]: bound to one request type
//! - [`GenericBehavior`]: applies to every request type with a handler, seen
//!   through the type-erased [`MessageContext`] and [`ErasedNext`]

mod generic;

pub use generic::{ErasedNext, ErasedResponse, GenericBehavior, MessageContext};
pub(crate) use generic::GenericAdapter;

use crate::error::HandlerResult;
use crate::handlers::DynRequestHandler;
use crate::messages::Request;
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Middleware bound to a single request type.
#[async_trait]
pub trait PipelineBehavior: Send + Sync + 'static {
    type Request: Request;

    async fn handle(
        &self,
        request: &Self::Request,
        next: Next<'_, Self::Request>,
        cancel: &CancellationToken,
    ) -> HandlerResult<<Self::Request as Request>::Response>;
}

/// Trait object for a behavior wrapping request type `R`.
pub type DynPipelineBehavior<R> = dyn PipelineBehavior<Request = R>;

/// Continuation into the remainder of the pipeline.
pub struct Next<'a, R: Request> {
    request: &'a R,
    behaviors: &'a [Arc<DynPipelineBehavior<R>>],
    handler: &'a DynRequestHandler<R>,
    cancel: &'a CancellationToken,
}

impl<'a, R: Request> Next<'a, R> {
    /// `behaviors` is ordered outermost first.
    pub(crate) fn new(
        request: &'a R,
        behaviors: &'a [Arc<DynPipelineBehavior<R>>],
        handler: &'a DynRequestHandler<R>,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            request,
            behaviors,
            handler,
            cancel,
        }
    }

    /// Number of behaviors still to run before the handler.
    pub fn remaining(&self) -> usize {
        self.behaviors.len()
    }

    /// Run the rest of the pipeline and return its response.
    pub fn run(self) -> BoxFuture<'a, HandlerResult<R::Response>> {
        match self.behaviors.split_first() {
            Some((behavior, rest)) => {
                let next = Next {
                    behaviors: rest,
                    ..self
                };
                behavior.handle(self.request, next, self.cancel)
            }
            None => self.handler.handle(self.request, self.cancel),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::RequestHandler;
    use parking_lot::Mutex;

    struct Echo(String);
    impl Request for Echo {
        type Response = String;
    }

    struct EchoHandler {
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl RequestHandler for EchoHandler {
        type Request = Echo;

        async fn handle(&self, request: &Echo, _cancel: &CancellationToken) -> HandlerResult<String> {
            self.calls.lock().push("handler".to_string());
            Ok(request.0.clone())
        }
    }

    struct Tag {
        name: &'static str,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl PipelineBehavior for Tag {
        type Request = Echo;

        async fn handle(
            &self,
            _request: &Echo,
            next: Next<'_, Echo>,
            _cancel: &CancellationToken,
        ) -> HandlerResult<String> {
            self.calls.lock().push(format!("{} before", self.name));
            let response = next.run().await?;
            self.calls.lock().push(format!("{} after", self.name));
            Ok(format!("{}({response})", self.name))
        }
    }

    #[tokio::test]
    async fn test_chain_runs_outermost_first() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handler = EchoHandler {
            calls: calls.clone(),
        };
        let behaviors: Vec<Arc<DynPipelineBehavior<Echo>>> = vec![
            Arc::new(Tag {
                name: "outer",
                calls: calls.clone(),
            }),
            Arc::new(Tag {
                name: "inner",
                calls: calls.clone(),
            }),
        ];
        let cancel = CancellationToken::new();
        let request = Echo("hi".to_string());

        let next = Next::new(&request, &behaviors, &handler, &cancel);
        assert_eq!(next.remaining(), 2);
        let response = next.run().await.unwrap();

        assert_eq!(response, "outer(inner(hi))");
        assert_eq!(
            *calls.lock(),
            vec![
                "outer before",
                "inner before",
                "handler",
                "inner after",
                "outer after"
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_chain_calls_handler() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let handler = EchoHandler {
            calls: calls.clone(),
        };
        let cancel = CancellationToken::new();
        let request = Echo("solo".to_string());

        let response = Next::new(&request, &[], &handler, &cancel).run().await.unwrap();

        assert_eq!(response, "solo");
        assert_eq!(*calls.lock(), vec!["handler"]);
    }
}
