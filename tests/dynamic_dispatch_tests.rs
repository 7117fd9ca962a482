//! Dispatch of messages held behind `AnyRequest` / `AnyNotification`.

mod common;

use common::*;
use mediator_core::{AnyNotification, AnyRequest, MediatorBuilder};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn test_send_dyn_routes_by_runtime_type() {
    let mediator = MediatorBuilder::new()
        .request_handler(PingHandler)
        .request_handler(UserCreateHandler)
        .build();
    let cancel = CancellationToken::new();

    let requests: Vec<Box<dyn AnyRequest>> = vec![
        Box::new(Ping::new("hi")),
        Box::new(UserCreateCommand::named("John")),
    ];

    let mut responses = Vec::new();
    for request in requests {
        responses.push(mediator.send_dyn(request, &cancel).await.unwrap());
    }

    assert_eq!(
        responses[0].downcast_ref::<Pong>(),
        Some(&Pong {
            text: "hi => Pong!".to_string()
        })
    );
    assert_eq!(
        responses[1].downcast_ref::<String>().map(String::as_str),
        Some("created John")
    );
    assert_eq!(mediator.audit().request_count(), 2);
}

#[tokio::test]
async fn test_send_dyn_without_handler_names_runtime_type() {
    let mediator = MediatorBuilder::new().build();

    let error = mediator
        .send_dyn(Box::new(Unhandled), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(error.is_handler_not_found());
    assert_eq!(error.to_string(), "No handler registered for request type Unhandled");
}

#[tokio::test]
async fn test_publish_dyn_reaches_every_handler() {
    let journal = Journal::new();
    let mediator = with_user_created_handlers(MediatorBuilder::new(), &journal).build();
    let notification: Box<dyn AnyNotification> = Box::new(UserCreated {
        name: "Bob".to_string(),
    });

    mediator
        .publish_dyn(notification, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(journal.sorted(), vec!["email:Bob", "push:Bob", "sms:Bob"]);
}

#[tokio::test]
async fn test_publish_dyn_without_handlers_is_noop() {
    #[derive(Debug)]
    struct Heartbeat;
    impl mediator_core::Notification for Heartbeat {}

    let mediator = MediatorBuilder::new().build();

    mediator
        .publish_dyn(Box::new(Heartbeat), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(mediator.audit().notification_count(), 0);
}
