//! Audit streams of dispatched requests and notifications.

mod common;

use common::*;
use futures::StreamExt;
use mediator_core::{AuditRecord, MediatorBuilder, MediatorConfig, MessageKind};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn next_record(stream: &mut mediator_core::AuditStream) -> AuditRecord {
    tokio::time::timeout(Duration::from_secs(1), stream.next())
        .await
        .expect("audit record should arrive")
        .expect("stream should still be open")
}

#[tokio::test]
async fn test_requests_are_recorded_in_dispatch_order() {
    let mediator = MediatorBuilder::new().request_handler(PingHandler).build();
    let cancel = CancellationToken::new();
    let mut requests = mediator.read_request_audit(cancel.clone());

    mediator.send(Ping::new("first")).await.unwrap();
    mediator.send(Ping::new("second")).await.unwrap();

    let first = next_record(&mut requests).await;
    let second = next_record(&mut requests).await;
    assert_eq!(first.kind, MessageKind::Request);
    assert_eq!(first.sequence, 0);
    assert_eq!(second.sequence, 1);
    assert_eq!(first.downcast_ref::<Ping>(), Some(&Ping::new("first")));
    assert_eq!(second.downcast_ref::<Ping>(), Some(&Ping::new("second")));
    assert!(first.message_type.ends_with("Ping"));
    assert_ne!(first.dispatch_id, second.dispatch_id);
}

#[tokio::test]
async fn test_failed_request_is_still_recorded() {
    let mediator = MediatorBuilder::new()
        .request_handler(UserCreateHandler)
        .behavior(
            mediator_core::ValidationBehavior::<UserCreateCommand>::new().with_validator(NameValidator),
        )
        .build();

    assert!(mediator.send(UserCreateCommand { name: None }).await.is_err());

    assert_eq!(mediator.audit().request_count(), 1);
}

#[tokio::test]
async fn test_notifications_are_recorded_once_per_publish() {
    let journal = Journal::new();
    let mediator = with_user_created_handlers(MediatorBuilder::new(), &journal).build();
    let cancel = CancellationToken::new();
    let mut notifications = mediator.read_notification_audit(cancel.clone());

    mediator
        .publish(UserCreated {
            name: "Bob".to_string(),
        })
        .await
        .unwrap();

    let record = next_record(&mut notifications).await;
    assert_eq!(record.kind, MessageKind::Notification);
    assert_eq!(record.downcast_ref::<UserCreated>().map(|n| n.name.as_str()), Some("Bob"));
    assert_eq!(mediator.audit().notification_count(), 1);
    assert_eq!(mediator.audit().request_count(), 0);
}

#[tokio::test]
async fn test_reader_waits_for_future_dispatches() {
    let mediator = MediatorBuilder::new().request_handler(PingHandler).build();
    let cancel = CancellationToken::new();
    let mut requests = mediator.read_request_audit(cancel.clone());

    let sender = {
        let mediator = mediator.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            mediator.send(Ping::new("later")).await
        })
    };

    let record = next_record(&mut requests).await;
    assert_eq!(record.downcast_ref::<Ping>().unwrap().message, "later");
    sender.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_cancelling_ends_the_stream() {
    let mediator = MediatorBuilder::new().request_handler(PingHandler).build();
    let cancel = CancellationToken::new();
    let mut requests = mediator.read_request_audit(cancel.clone());

    mediator.send(Ping::new("hi")).await.unwrap();
    next_record(&mut requests).await;

    cancel.cancel();
    assert!(requests.next().await.is_none());
}

#[tokio::test]
async fn test_reset_clears_streams() {
    let journal = Journal::new();
    let mediator = with_user_created_handlers(MediatorBuilder::new(), &journal)
        .request_handler(PingHandler)
        .build();
    mediator.send(Ping::new("hi")).await.unwrap();
    mediator
        .publish(UserCreated {
            name: "Bob".to_string(),
        })
        .await
        .unwrap();

    mediator.reset_audit();

    assert_eq!(mediator.audit().request_count(), 0);
    assert_eq!(mediator.audit().notification_count(), 0);

    mediator.send(Ping::new("again")).await.unwrap();
    let mut requests = mediator.read_request_audit(CancellationToken::new());
    let record = next_record(&mut requests).await;
    assert_eq!(record.sequence, 0);
    assert_eq!(record.downcast_ref::<Ping>().unwrap().message, "again");
}

#[tokio::test]
async fn test_scopes_share_audit_streams() {
    let mediator = MediatorBuilder::new().request_handler(PingHandler).build();
    let scoped = mediator.create_scope();

    scoped.send(Ping::new("from scope")).await.unwrap();

    assert_eq!(mediator.audit().request_count(), 1);
}

#[tokio::test]
async fn test_disabled_audit_records_nothing() {
    let mut config = MediatorConfig::default();
    config.audit.record_requests = false;
    let journal = Journal::new();
    let mediator = with_user_created_handlers(MediatorBuilder::new().with_config(config), &journal)
        .request_handler(PingHandler)
        .build();

    mediator.send(Ping::new("hi")).await.unwrap();
    mediator
        .publish(UserCreated {
            name: "Bob".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(mediator.audit().request_count(), 0);
    assert_eq!(mediator.audit().notification_count(), 1);

    let silent = MediatorBuilder::new().request_handler(PingHandler).audit(false).build();
    silent.send(Ping::new("hi")).await.unwrap();
    assert_eq!(silent.audit().request_count(), 0);
}
