//! Request validation ahead of the handler.

use crate::error::HandlerResult;
use crate::messages::{short_type_name, Request};
use crate::pipeline::{Next, PipelineBehavior};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::any::type_name;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One rule a request broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub field: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every failure reported for one request.
#[derive(Debug, Clone, Error)]
#[error("Validation failed for {request_type}: {}", join_failures(.failures))]
pub struct ValidationError {
    pub request_type: String,
    pub failures: Vec<ValidationFailure>,
}

fn join_failures(failures: &[ValidationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Checks requests of type `R`.
#[async_trait]
pub trait Validator<R: Request>: Send + Sync + 'static {
    /// An empty list means the request is valid.
    async fn validate(&self, request: &R) -> Vec<ValidationFailure>;
}

/// Runs every validator for `R` concurrently and short-circuits with a
/// [`ValidationError`] when any of them reports a failure.
pub struct ValidationBehavior<R: Request> {
    validators: Vec<Arc<dyn Validator<R>>>,
}

impl<R: Request> ValidationBehavior<R> {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Add a validator to this behavior.
    ///
    /// All validators for `R` belong on one instance. A second
    /// `ValidationBehavior<R>` registered for the same request type is
    /// dropped as a duplicate.
    pub fn with_validator<V: Validator<R>>(mut self, validator: V) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }
}

impl<R: Request> Default for ValidationBehavior<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<R: Request> PipelineBehavior for ValidationBehavior<R> {
    type Request = R;

    async fn handle(
        &self,
        request: &R,
        next: Next<'_, R>,
        _cancel: &CancellationToken,
    ) -> HandlerResult<R::Response> {
        let failures: Vec<ValidationFailure> =
            join_all(self.validators.iter().map(|validator| validator.validate(request)))
                .await
                .into_iter()
                .flatten()
                .collect();

        if !failures.is_empty() {
            debug!(
                request_type = type_name::<R>(),
                failures = failures.len(),
                "Request rejected by validation"
            );
            return Err(ValidationError {
                request_type: short_type_name(type_name::<R>()),
                failures,
            }
            .into());
        }

        next.run().await
    }
}
