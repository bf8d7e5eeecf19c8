//! Listener registration and event fan-out.
//!
//! There is one listener capability, [`EventListener`]. What a subscriber
//! receives depends on the scope it registered with:
//!
//! * any: every event;
//! * map view: every event, plus [`Lifecycle`] notifications;
//! * object: only events originating from one object id, optionally followed
//!   by the [`LegacyCallback`] derived from the event.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::event::Event;
use crate::types::{LatLng, ObjectKind};

pub trait EventListener: Send + Sync {
    fn on_event(&self, event: &Event);
}

impl<F> EventListener for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn on_event(&self, event: &Event) {
        self(event)
    }
}

/// Outcome of bringing the map bridge up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    Ready,
    Failed(String),
}

/// Per-action callbacks older hosts registered instead of the unified event.
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyCallback {
    Moved { object_id: String, position: LatLng },
    Clicked { object_id: String, position: LatLng },
}

/// Derive the legacy callback for an event, if it has one.
pub fn legacy_callback(event: &Event) -> Option<LegacyCallback> {
    match event {
        Event::Move(ctx) => Some(LegacyCallback::Moved {
            object_id: ctx.object_id.clone(),
            position: ctx.coordinate,
        }),
        Event::Click(ctx) => Some(LegacyCallback::Clicked {
            object_id: ctx.object_id.clone(),
            position: ctx.coordinate,
        }),
        _ => None,
    }
}

pub type LifecycleHandler = Box<dyn Fn(&Lifecycle) + Send + Sync>;
pub type LegacyHandler = Box<dyn Fn(&LegacyCallback) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

enum Scope {
    Any,
    MapView {
        lifecycle: LifecycleHandler,
    },
    Object {
        object_id: String,
        legacy: Option<LegacyHandler>,
    },
}

struct Subscriber {
    id: SubscriberId,
    scope: Scope,
    listener: Option<Arc<dyn EventListener>>,
}

/// Registry of listeners, invoked in registration order.
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    async fn push(&self, scope: Scope, listener: Option<Arc<dyn EventListener>>) -> SubscriberId {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().await.push(Subscriber {
            id,
            scope,
            listener,
        });
        id
    }

    /// Receive every event.
    pub async fn subscribe(&self, listener: Arc<dyn EventListener>) -> SubscriberId {
        self.push(Scope::Any, Some(listener)).await
    }

    /// Receive every event plus map lifecycle notifications.
    pub async fn subscribe_map_view(
        &self,
        listener: Arc<dyn EventListener>,
        lifecycle: impl Fn(&Lifecycle) + Send + Sync + 'static,
    ) -> SubscriberId {
        self.push(
            Scope::MapView {
                lifecycle: Box::new(lifecycle),
            },
            Some(listener),
        )
        .await
    }

    /// Receive events originating from `object_id` only.
    ///
    /// When both are given, `listener` fires before `legacy` for each event.
    pub async fn subscribe_object(
        &self,
        object_id: impl Into<String>,
        listener: Option<Arc<dyn EventListener>>,
        legacy: Option<LegacyHandler>,
    ) -> SubscriberId {
        self.push(
            Scope::Object {
                object_id: object_id.into(),
                legacy,
            },
            listener,
        )
        .await
    }

    pub async fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.write().await;
        let before = subscribers.len();
        subscribers.retain(|s| s.id != id);
        subscribers.len() != before
    }

    /// Drop every object-scoped subscription for `object_id`.
    pub async fn unsubscribe_object(&self, object_id: &str) -> usize {
        let mut subscribers = self.subscribers.write().await;
        let before = subscribers.len();
        subscribers.retain(|s| !matches!(&s.scope, Scope::Object { object_id: id, .. } if id == object_id));
        before - subscribers.len()
    }

    /// Fan `event` out to matching subscribers. Returns how many received it.
    pub async fn dispatch(&self, event: &Event) -> usize {
        let subscribers = self.subscribers.read().await;
        let mut delivered = 0;
        for subscriber in subscribers.iter() {
            let legacy = match &subscriber.scope {
                Scope::Any | Scope::MapView { .. } => None,
                Scope::Object { object_id, legacy } => {
                    if object_id != event.object_id() || event.context().source == ObjectKind::Map {
                        continue;
                    }
                    legacy.as_ref()
                }
            };

            if let Some(listener) = &subscriber.listener {
                guarded(event, || listener.on_event(event));
            }
            if let Some(handler) = legacy {
                if let Some(callback) = legacy_callback(event) {
                    guarded(event, || handler(&callback));
                }
            }
            delivered += 1;
        }
        debug!(action = %event.action(), object_id = event.object_id(), delivered, "Dispatched event");
        delivered
    }

    /// Notify map-view subscribers of a lifecycle transition.
    pub async fn notify_lifecycle(&self, lifecycle: &Lifecycle) -> usize {
        let subscribers = self.subscribers.read().await;
        let mut notified = 0;
        for subscriber in subscribers.iter() {
            if let Scope::MapView { lifecycle: handler } = &subscriber.scope {
                if catch_unwind(AssertUnwindSafe(|| handler(lifecycle))).is_err() {
                    warn!(?lifecycle, "Lifecycle listener panicked, continuing");
                }
                notified += 1;
            }
        }
        notified
    }

    pub async fn len(&self) -> usize {
        self.subscribers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.subscribers.read().await.is_empty()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn guarded(event: &Event, f: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        warn!(action = %event.action(), object_id = event.object_id(), "Event listener panicked, continuing");
    }
}
