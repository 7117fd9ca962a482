//! # Mediator Errors
//!
//! Structured error types for dispatch, using thiserror instead of
//! stringly-typed variants.
//!
//! Handler and behavior failures travel as [`anyhow::Error`] and are surfaced
//! unchanged, so callers can recover the concrete error type with
//! [`MediatorError::downcast_ref`].

use std::fmt;
use thiserror::Error;

/// Result type returned by handlers and behaviors.
pub type HandlerResult<T> = anyhow::Result<T>;

/// Result type returned by the mediator.
pub type Result<T> = std::result::Result<T, MediatorError>;

/// A handler or behavior could not be instantiated by its provider.
#[derive(Error, Debug)]
#[error("Failed to construct {component}: {source}")]
pub struct ConstructionError {
    pub component: &'static str,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Error, Debug)]
pub enum MediatorError {
    #[error("No handler registered for request type {request_type}")]
    HandlerNotFound { request_type: String },

    #[error(transparent)]
    HandlerConstruction(#[from] ConstructionError),

    /// Failure raised by a handler or behavior, passed through untouched.
    #[error(transparent)]
    Handler(anyhow::Error),

    #[error(
        "{} of {handler_count} handlers failed for notification {notification_type}: {}",
        .failures.len(),
        FirstFailure(.failures)
    )]
    NotificationFailed {
        notification_type: String,
        handler_count: usize,
        failures: Vec<anyhow::Error>,
    },

    #[error("Dispatch of {message_type} was cancelled")]
    Cancelled { message_type: String },

    #[error("Registry entry for {message_type} does not match the dispatched type")]
    TypeMismatch { message_type: String },
}

impl MediatorError {
    pub fn is_handler_not_found(&self) -> bool {
        matches!(self, MediatorError::HandlerNotFound { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, MediatorError::Cancelled { .. })
    }

    /// Look for a handler failure of type `E`.
    ///
    /// For fan-out failures the first matching failure is returned.
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        match self {
            MediatorError::Handler(error) => error.downcast_ref::<E>(),
            MediatorError::NotificationFailed { failures, .. } => {
                failures.iter().find_map(|error| error.downcast_ref::<E>())
            }
            _ => None,
        }
    }

    /// All underlying handler failures, in completion-independent order.
    pub fn failures(&self) -> &[anyhow::Error] {
        match self {
            MediatorError::Handler(error) => std::slice::from_ref(error),
            MediatorError::NotificationFailed { failures, .. } => failures,
            _ => &[],
        }
    }
}

struct FirstFailure<'a>(&'a [anyhow::Error]);

impl fmt::Display for FirstFailure<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.first() {
            Some(error) => write!(f, "{error}"),
            None => write!(f, "unknown failure"),
        }
    }
}
