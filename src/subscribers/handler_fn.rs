//! # Function-backed handlers (`HandlerFn`, `PayloadFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(Event, CancellationToken) -> Fut`,
//! producing a fresh future per invocation. This avoids shared mutable state;
//! if handlers need shared state, capture an `Arc<...>` explicitly inside the
//! closure.
//!
//! [`PayloadFn`] additionally deserializes the payload into a typed value
//! before invoking the closure; a payload that does not decode is a handler
//! failure (the event itself already passed bus-level validation).
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use eventum::{Event, HandlerError, HandlerFn, Subscribe};
//!
//! let h = HandlerFn::arc("audit", |event: Event, _ctx: CancellationToken| async move {
//!     if event.payload.is_null() {
//!         return Err(HandlerError::Fail { error: "empty payload".into() });
//!     }
//!     Ok(())
//! });
//!
//! assert_eq!(h.name(), "audit");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::events::Event;
use crate::subscribers::Subscribe;

/// Function-backed handler implementation.
///
/// Wraps a closure that *creates* a new future per invocation. The closure
/// receives an owned clone of the event.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need an
    /// `Arc<dyn Subscribe>` for [`EventBus::subscribe`](crate::EventBus::subscribe).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self { name: name.into(), f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Subscribe for HandlerFn<F>
where
    F: Fn(Event, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn on_event(&self, event: &Event, ctx: CancellationToken) -> Result<(), HandlerError> {
        (self.f)(event.clone(), ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Typed handler: deserializes the payload into `T` before invoking.
///
/// ## Example
/// ```rust
/// use serde::Deserialize;
/// use tokio_util::sync::CancellationToken;
/// use eventum::{HandlerError, PayloadFn, Subscribe};
///
/// #[derive(Deserialize)]
/// struct OrderCreated {
///     order_id: u64,
/// }
///
/// let h = PayloadFn::arc("billing", |order: OrderCreated, _ctx: CancellationToken| async move {
///     let _ = order.order_id;
///     Ok::<_, HandlerError>(())
/// });
///
/// assert_eq!(h.name(), "billing");
/// ```
#[derive(Debug)]
pub struct PayloadFn<T, F> {
    name: Cow<'static, str>,
    f: F,
    _payload: PhantomData<fn() -> T>,
}

impl<T, F> PayloadFn<T, F> {
    /// Creates a new typed handler.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
            _payload: PhantomData,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<T, F, Fut> Subscribe for PayloadFn<T, F>
where
    T: DeserializeOwned + Send + 'static,
    F: Fn(T, CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), HandlerError>> + Send + 'static,
{
    async fn on_event(&self, event: &Event, ctx: CancellationToken) -> Result<(), HandlerError> {
        let payload: T =
            serde_json::from_value(event.payload.clone()).map_err(|e| HandlerError::Fail {
                error: format!("payload decode: {e}"),
            })?;
        (self.f)(payload, ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use std::future::{ready, Ready};

    use super::*;

    fn drop_event(_event: Event, _ctx: CancellationToken) -> Ready<Result<(), HandlerError>> {
        ready(Ok(()))
    }

    fn drop_payload(_id: u64, _ctx: CancellationToken) -> Ready<Result<(), HandlerError>> {
        ready(Ok(()))
    }

    #[test]
    fn test_debug_render_names_the_handler() {
        let plain = HandlerFn::new("audit", drop_event as fn(_, _) -> _);
        assert!(format!("{plain:?}").contains("audit"));

        let typed: PayloadFn<u64, _> = PayloadFn::new("billing", drop_payload as fn(_, _) -> _);
        assert!(format!("{typed:?}").contains("billing"));
    }
}
