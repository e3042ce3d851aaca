//! Bus core: registration, validation, dispatch, shutdown.
//!
//! This module contains the embedded implementation of the event bus. The
//! public API from here is [`EventBus`] (with [`BusBuilder`] and
//! [`BusConfig`]) plus the subscription vocabulary ([`DeliveryMode`],
//! [`SubscriptionHandle`]).
//!
//! Internal modules:
//! - [`bus`]: the facade, gate (closed check + validation), dead letters;
//! - [`dispatch`]: ordered fan-out loop with panic/cancellation isolation;
//! - [`registry`]: kind-keyed, order-preserving subscription store;
//! - [`builder`]: bus assembly with an optional validator;
//! - [`config`]: publish-policy knobs.

mod builder;
mod bus;
mod config;
mod dispatch;
mod registry;

pub use builder::BusBuilder;
pub use bus::EventBus;
pub use config::BusConfig;
pub use registry::{DeliveryMode, SubscriptionHandle};
