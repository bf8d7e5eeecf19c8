//! Core types, config, errors, and event model for the JLMap bridge.

pub mod config;
pub mod error;
pub mod event;
pub mod listener;
pub mod protocol;
pub mod types;

pub use error::{JlMapError, Result};
pub use event::{Action, Event, EventContext, SubscriptionSet};
pub use listener::{EventDispatcher, EventListener, LegacyCallback, Lifecycle, SubscriberId};
pub use types::{Bounds, LatLng, ObjectHandle, ObjectId, ObjectKind};
