//! # Message Contracts
//!
//! Marker traits separating requests (exactly one typed response) from
//! notifications (zero or more observers, no response).
//!
//! Dispatch is keyed by the [`TypeId`] of the concrete message type. The
//! [`AnyRequest`] and [`AnyNotification`] views let callers hand the mediator a
//! message held behind a trait object; lookup still uses the value's runtime
//! type, never the static type of the reference.

use std::any::{Any, TypeId};

/// A message that expects exactly one response of type `Response`.
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// A message broadcast to every registered observer of its type.
pub trait Notification: Send + Sync + 'static {}

/// Object-safe view of any [`Request`].
pub trait AnyRequest: Send + Sync + 'static {
    fn as_any(&self) -> &(dyn Any + Send + Sync);
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
    fn type_name(&self) -> &'static str;
}

impl<R: Request> AnyRequest for R {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<R>()
    }
}

/// Object-safe view of any [`Notification`].
pub trait AnyNotification: Send + Sync + 'static {
    fn as_any(&self) -> &(dyn Any + Send + Sync);
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;
    fn type_name(&self) -> &'static str;
}

impl<N: Notification> AnyNotification for N {
    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<N>()
    }
}

/// Runtime type of a request held behind a trait object.
pub(crate) fn request_type_id(request: &dyn AnyRequest) -> TypeId {
    request.as_any().type_id()
}

/// Runtime type of a notification held behind a trait object.
pub(crate) fn notification_type_id(notification: &dyn AnyNotification) -> TypeId {
    notification.as_any().type_id()
}

/// Strip module paths from a type name, keeping generic arguments readable.
///
/// `my_app::commands::Ping` becomes `Ping`, and
/// `my_app::Envelope<my_app::Ping>` becomes `Envelope<Ping>`.
pub fn short_type_name(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let mut segment = String::new();

    for ch in full.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                short.push_str(last_path_segment(&segment));
                segment.clear();
                short.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    short.push_str(last_path_segment(&segment));
    short
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ping;
    impl Request for Ping {
        type Response = String;
    }

    struct UserCreated;
    impl Notification for UserCreated {}

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("my_app::commands::Ping"), "Ping");
        assert_eq!(short_type_name("Ping"), "Ping");
        assert_eq!(
            short_type_name("my_app::Envelope<my_app::Ping, alloc::string::String>"),
            "Envelope<Ping, String>"
        );
    }

    #[test]
    fn test_runtime_type_survives_erasure() {
        let boxed: Box<dyn AnyRequest> = Box::new(Ping);
        assert_eq!(request_type_id(boxed.as_ref()), TypeId::of::<Ping>());
        assert!(boxed.type_name().ends_with("Ping"));

        let boxed: Box<dyn AnyNotification> = Box::new(UserCreated);
        assert_eq!(notification_type_id(boxed.as_ref()), TypeId::of::<UserCreated>());
    }
}
