//! Request logging behavior
//!
//! Emits one structured event per request with its outcome and elapsed time.

use crate::error::HandlerResult;
use crate::pipeline::{ErasedNext, ErasedResponse, GenericBehavior, MessageContext};
use async_trait::async_trait;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Records request type, outcome and elapsed time for every request.
///
/// Register it last to have it wrap every other behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingBehavior;

#[async_trait]
impl GenericBehavior for LoggingBehavior {
    async fn handle(
        &self,
        context: MessageContext<'_>,
        next: ErasedNext<'_>,
        _cancel: &CancellationToken,
    ) -> HandlerResult<ErasedResponse> {
        let started = Instant::now();
        let result = next.run().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => info!(
                request_type = context.type_name(),
                elapsed_ms = elapsed_ms,
                "Request handled"
            ),
            Err(error) => warn!(
                request_type = context.type_name(),
                elapsed_ms = elapsed_ms,
                error = %error,
                "Request failed"
            ),
        }
        result
    }
}
