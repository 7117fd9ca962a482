//! Shared message types and handlers for integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use mediator_core::{
    HandlerResult, MediatorBuilder, Notification, NotificationHandler, Request, RequestHandler,
    ValidationFailure, Validator,
};
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Ordered record of what ran, shared between a test and its handlers.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn sorted(&self) -> Vec<String> {
        let mut entries = self.entries();
        entries.sort();
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.0.lock().is_empty()
    }
}

// Ping / Pong

#[derive(Debug, Clone, PartialEq)]
pub struct Ping {
    pub message: String,
}

impl Ping {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pong {
    pub text: String,
}

impl Request for Ping {
    type Response = Pong;
}

#[derive(Debug, Default)]
pub struct PingHandler;

#[async_trait]
impl RequestHandler for PingHandler {
    type Request = Ping;

    async fn handle(&self, request: &Ping, _cancel: &CancellationToken) -> HandlerResult<Pong> {
        Ok(Pong {
            text: format!("{} => Pong!", request.message),
        })
    }
}

/// Ping handler that notes it ran.
pub struct JournalingPingHandler {
    pub journal: Journal,
}

#[async_trait]
impl RequestHandler for JournalingPingHandler {
    type Request = Ping;

    async fn handle(&self, request: &Ping, _cancel: &CancellationToken) -> HandlerResult<Pong> {
        self.journal.push("handler");
        Ok(Pong {
            text: format!("{} => Pong!", request.message),
        })
    }
}

/// A request nothing handles.
#[derive(Debug)]
pub struct Unhandled;

impl Request for Unhandled {
    type Response = ();
}

// UserCreated

#[derive(Debug, Clone)]
pub struct UserCreated {
    pub name: String,
}

impl Notification for UserCreated {}

macro_rules! user_created_handler {
    ($name:ident, $channel:literal) => {
        pub struct $name {
            pub journal: Journal,
        }

        #[async_trait]
        impl NotificationHandler for $name {
            type Notification = UserCreated;

            async fn handle(
                &self,
                notification: &UserCreated,
                _cancel: &CancellationToken,
            ) -> HandlerResult<()> {
                self.journal
                    .push(format!("{}:{}", $channel, notification.name));
                Ok(())
            }
        }
    };
}

user_created_handler!(EmailHandler, "email");
user_created_handler!(SmsHandler, "sms");
user_created_handler!(PushHandler, "push");

/// Email, SMS and push observers of [`UserCreated`] writing to `journal`.
pub fn with_user_created_handlers(builder: MediatorBuilder, journal: &Journal) -> MediatorBuilder {
    builder
        .notification_handler(EmailHandler {
            journal: journal.clone(),
        })
        .notification_handler(SmsHandler {
            journal: journal.clone(),
        })
        .notification_handler(PushHandler {
            journal: journal.clone(),
        })
}

// UserCreateCommand

#[derive(Debug, Clone)]
pub struct UserCreateCommand {
    pub name: Option<String>,
}

impl UserCreateCommand {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
        }
    }
}

impl Request for UserCreateCommand {
    type Response = String;
}

#[derive(Debug, Default)]
pub struct UserCreateHandler;

#[async_trait]
impl RequestHandler for UserCreateHandler {
    type Request = UserCreateCommand;

    async fn handle(
        &self,
        request: &UserCreateCommand,
        _cancel: &CancellationToken,
    ) -> HandlerResult<String> {
        Ok(format!("created {}", request.name.as_deref().unwrap_or_default()))
    }
}

pub struct NameValidator;

#[async_trait]
impl Validator<UserCreateCommand> for NameValidator {
    async fn validate(&self, request: &UserCreateCommand) -> Vec<ValidationFailure> {
        match request.name.as_deref() {
            None | Some("") => vec![ValidationFailure::new("name", "Name is required")],
            Some(name) if name.len() < 3 => vec![ValidationFailure::new(
                "name",
                "Name must be at least 3 characters",
            )],
            Some(_) => Vec::new(),
        }
    }
}
