//! Handler lifetimes across dispatches and scopes.

mod common;

use async_trait::async_trait;
use common::*;
use mediator_core::{HandlerResult, Lifetime, Mediator, MediatorBuilder, Request, RequestHandler};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct WhoAmI;

impl Request for WhoAmI {
    type Response = usize;
}

struct InstanceHandler {
    instance: usize,
}

#[async_trait]
impl RequestHandler for InstanceHandler {
    type Request = WhoAmI;

    async fn handle(&self, _request: &WhoAmI, _cancel: &CancellationToken) -> HandlerResult<usize> {
        Ok(self.instance)
    }
}

fn mediator_with(lifetime: Lifetime) -> (Mediator, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let mediator = MediatorBuilder::new()
        .lifetime(lifetime)
        .request_handler_factory(move || {
            Ok(InstanceHandler {
                instance: counter.fetch_add(1, Ordering::SeqCst),
            })
        })
        .build();
    (mediator, built)
}

#[tokio::test]
async fn test_transient_builds_per_dispatch() {
    let (mediator, built) = mediator_with(Lifetime::Transient);

    assert_eq!(mediator.send(WhoAmI).await.unwrap(), 0);
    assert_eq!(mediator.send(WhoAmI).await.unwrap(), 1);
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_scoped_builds_once_per_scope() {
    let (mediator, built) = mediator_with(Lifetime::Scoped);

    let root_first = mediator.send(WhoAmI).await.unwrap();
    let root_second = mediator.send(WhoAmI).await.unwrap();
    assert_eq!(root_first, root_second);

    let scoped = mediator.create_scope();
    let scoped_first = scoped.send(WhoAmI).await.unwrap();
    let scoped_second = scoped.send(WhoAmI).await.unwrap();
    assert_eq!(scoped_first, scoped_second);
    assert_ne!(root_first, scoped_first);

    assert_eq!(built.load(Ordering::SeqCst), 2);
    assert_ne!(mediator.scope().id(), scoped.scope().id());
}

#[tokio::test]
async fn test_singleton_is_shared_across_scopes() {
    let (mediator, built) = mediator_with(Lifetime::Singleton);

    let root = mediator.send(WhoAmI).await.unwrap();
    let scoped = mediator.create_scope().send(WhoAmI).await.unwrap();

    assert_eq!(root, scoped);
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_scoped_notification_handlers() {
    let journal = Journal::new();
    let factory_journal = journal.clone();
    let mediator = MediatorBuilder::new()
        .use_scoped_lifetime()
        .notification_handler_factory(move || {
            Ok(EmailHandler {
                journal: factory_journal.clone(),
            })
        })
        .build();

    let scoped = mediator.create_scope();
    for name in ["Ann", "Bob"] {
        scoped
            .publish(UserCreated {
                name: name.to_string(),
            })
            .await
            .unwrap();
    }

    assert_eq!(journal.entries(), vec!["email:Ann", "email:Bob"]);
    assert_eq!(scoped.scope().len(), 1);
    assert!(mediator.scope().is_empty());
}
