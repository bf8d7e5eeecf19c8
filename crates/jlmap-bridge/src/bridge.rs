//! Endpoints the embedded engine calls back into.
//!
//! Nothing here returns an error or unwinds past the boundary: inbound calls
//! answer `""` on failure and malformed events are dropped, both with a log
//! line carrying whatever context the call had.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use jlmap_core::error::Result;
use jlmap_core::event::Event;
use jlmap_core::listener::Lifecycle;
use jlmap_core::protocol::{BRIDGE_GLOBAL, CALL_ENDPOINT, InboundMessage};
use jlmap_transport::envelope::Envelope;

use crate::methods::{self, BridgeMethod};
use crate::pending::PendingCall;
use crate::session::MapSession;

#[derive(Clone)]
pub struct Bridge {
    session: Arc<MapSession>,
}

impl Bridge {
    /// Wrap a session without injecting anything.
    pub fn new(session: Arc<MapSession>) -> Self {
        Self { session }
    }

    /// Inject the bootstrap script, then tell map-view listeners how it went.
    ///
    /// Injecting twice is harmless: the script returns early when the global
    /// already exists.
    pub async fn attach(session: Arc<MapSession>) -> Result<Self> {
        let bridge = Self::new(session);
        let injected = bridge
            .session
            .transport()
            .execute_void(Envelope::map(Self::bootstrap_script()))
            .await;
        let dispatcher = bridge.session.dispatcher();
        match injected {
            Ok(()) => {
                info!(global = BRIDGE_GLOBAL, "Bridge attached");
                dispatcher.notify_lifecycle(&Lifecycle::Ready).await;
                Ok(bridge)
            }
            Err(e) => {
                error!(error = %e, "Bridge bootstrap failed");
                dispatcher
                    .notify_lifecycle(&Lifecycle::Failed(e.to_string()))
                    .await;
                Err(e)
            }
        }
    }

    pub fn session(&self) -> &Arc<MapSession> {
        &self.session
    }

    /// Script installing `globalThis.jlObjectBridge.call(objectId, methodName, arg)`.
    pub fn bootstrap_script() -> String {
        [
            "(function () {".to_string(),
            format!("  if (typeof globalThis.{BRIDGE_GLOBAL} !== 'undefined') {{ return; }}"),
            format!("  globalThis.{BRIDGE_GLOBAL} = Object.freeze({{"),
            "    call: function (objectId, methodName, arg) {".to_string(),
            "      var correlationId = 'call_' + Date.now() + '_' + Math.random().toString(36).slice(2, 10);".to_string(),
            "      var argsJson = (typeof arg === 'undefined') ? null : JSON.stringify(arg);".to_string(),
            format!(
                "      return {CALL_ENDPOINT}(correlationId, String(objectId), String(methodName), argsJson);"
            ),
            "    }".to_string(),
            "  });".to_string(),
            "})();".to_string(),
        ]
        .join("\n")
    }

    /// `jlObjectBridgeCall`: run `method_name` on the object registered as
    /// `object_id`.
    ///
    /// Returns `""` when there is no result or anything failed, the bare
    /// string for string results, and JSON text otherwise.
    pub async fn call_object_method(
        &self,
        correlation_id: &str,
        object_id: &str,
        method_name: &str,
        args_json: Option<&str>,
    ) -> String {
        let call = PendingCall::new(correlation_id, object_id, method_name, args_json);
        match AssertUnwindSafe(self.invoke(call)).catch_unwind().await {
            Ok(Ok(value)) => encode_result(value),
            Ok(Err(e)) => {
                warn!(correlation_id, object_id, method_name, error = %e, "Bridge call failed");
                String::new()
            }
            Err(_) => {
                error!(correlation_id, object_id, method_name, "Bridge call panicked");
                String::new()
            }
        }
    }

    async fn invoke(&self, call: PendingCall) -> Result<Value> {
        let handle = self.session.registry().resolve(&call.object_id).await?;
        let verb = methods::resolve(handle.kind, &call.method_name)?;
        let method = verb.bind(call.args_json.as_deref())?;
        debug!(
            correlation_id = %call.correlation_id,
            object_id = %handle.id,
            method = verb.name(),
            "Bridge call"
        );
        match method {
            BridgeMethod::GetId => Ok(Value::String(handle.id.to_string())),
            BridgeMethod::GetKind => Ok(Value::String(handle.kind.as_str().to_string())),
            BridgeMethod::Command(command) => self.session.run(handle.id.as_str(), command).await,
        }
    }

    /// `eventHandler`: decode and fan out. Returns how many subscribers
    /// received the event; undecodable events reach nobody.
    pub async fn event_handler(
        &self,
        action: &str,
        object_kind: &str,
        object_id: &str,
        zoom: f64,
        coordinate_json: Option<&str>,
        bounds_json: &str,
    ) -> usize {
        match Event::decode(action, object_kind, object_id, zoom, coordinate_json, bounds_json) {
            Ok(event) => self.session.dispatcher().dispatch(&event).await,
            Err(e) => {
                warn!(action, object_kind, object_id, error = %e, "Dropping undecodable event");
                0
            }
        }
    }

    /// Route one message from a host that only has a string channel.
    ///
    /// Calls answer as [`Bridge::call_object_method`] does; events and
    /// unreadable messages answer `""`.
    pub async fn handle_message(&self, message: &str) -> String {
        let inbound: InboundMessage = match serde_json::from_str(message) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!(error = %e, "Dropping unreadable bridge message");
                return String::new();
            }
        };
        match inbound {
            InboundMessage::Call {
                correlation_id,
                object_id,
                method_name,
                args_json,
            } => {
                self.call_object_method(&correlation_id, &object_id, &method_name, args_json.as_deref())
                    .await
            }
            InboundMessage::Event {
                action,
                object_kind,
                object_id,
                zoom,
                coordinate_json,
                bounds_json,
            } => {
                self.event_handler(
                    &action,
                    &object_kind,
                    &object_id,
                    zoom,
                    coordinate_json.as_deref(),
                    &bounds_json,
                )
                .await;
                String::new()
            }
        }
    }
}

fn encode_result(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}
