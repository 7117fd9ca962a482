//! Built-in pipeline behaviors.
//!
//! - [`LoggingBehavior`]: generic, traces every request with its outcome and
//!   elapsed time
//! - [`ValidationBehavior`]: concrete, rejects a request before its handler
//!   runs when any [`Validator`] reports failures

mod logging;
mod validation;

pub use logging::LoggingBehavior;
pub use validation::{ValidationBehavior, ValidationError, ValidationFailure, Validator};
