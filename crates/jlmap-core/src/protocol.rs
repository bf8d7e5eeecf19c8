//! Names and payload shapes shared by the generated script and the host.
//!
//! The hosting toolkit must expose [`EVENT_ENDPOINT`] and [`CALL_ENDPOINT`]
//! to the embedded engine under exactly these names and argument shapes,
//! otherwise the generated script will not link.

use serde::{Deserialize, Serialize};

/// `eventHandler(actionName, objectKind, objectId, zoomLevel, coordinateJson, boundsJson)`
pub const EVENT_ENDPOINT: &str = "eventHandler";

/// `jlObjectBridgeCall(correlationId, objectId, methodName, argsJson)`
pub const CALL_ENDPOINT: &str = "jlObjectBridgeCall";

/// Global installed by the bridge bootstrap script.
pub const BRIDGE_GLOBAL: &str = "jlObjectBridge";

/// Property every created primitive is stamped with.
pub const ID_PROPERTY: &str = "uuid";

/// Origin id reported for map-level events.
pub const MAP_SOURCE_ID: &str = "main_map";

pub const CALLBACK_START: &str = "// callback start";
pub const CALLBACK_END: &str = "// callback end";

/// Quote `value` as a single-quoted JS string literal.
pub fn js_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            // keeps `</script>` inert when the text lands inside an HTML page
            '<' => out.push_str("\\x3c"),
            // no raw `{` means text can never forge a `{{id}}` placeholder
            '{' => out.push_str("\\x7b"),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Messages delivered by hosts that only expose a string channel
/// (e.g. `postMessage`) instead of two callable endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundMessage {
    Call {
        correlation_id: String,
        object_id: String,
        method_name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        args_json: Option<String>,
    },
    Event {
        action: String,
        object_kind: String,
        object_id: String,
        zoom: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        coordinate_json: Option<String>,
        bounds_json: String,
    },
}
