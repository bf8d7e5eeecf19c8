//! Creation scripts: construct, bind, stamp, wire listeners, attach.

use tracing::trace;

use jlmap_core::error::Result;
use jlmap_core::event::{Action, SubscriptionSet};
use jlmap_core::protocol::{
    CALLBACK_END, CALLBACK_START, EVENT_ENDPOINT, ID_PROPERTY, MAP_SOURCE_ID, js_string,
};
use jlmap_core::types::{ObjectHandle, ObjectId, ObjectKind};

use crate::layer::Layer;

/// Render the full creation script for one primitive.
///
/// `constructor` is the JS expression building the primitive (see
/// [`Layer::constructor`]); `map_binding` is the expression naming the live
/// map, usually `this.map`.
pub fn creation_script(
    handle: &ObjectHandle,
    constructor: &str,
    subscriptions: &SubscriptionSet,
    map_binding: &str,
) -> String {
    let id = handle.id.as_str();
    let mut lines = vec![
        format!("var {id} = {constructor};"),
        format!("this.{id} = {id};"),
        format!("{id}.{ID_PROPERTY} = {};", js_string(id)),
    ];
    for action in subscriptions.iter() {
        lines.push(listener_block(
            id,
            handle.kind,
            &format!("{id}.{ID_PROPERTY}"),
            action,
            map_binding,
        ));
    }
    lines.push(format!("{id}.addTo({map_binding});"));
    lines.join("\n")
}

/// Build the layer's constructor and wrap it in a creation script.
pub fn render_layer(
    id: &ObjectId,
    layer: &Layer,
    subscriptions: &SubscriptionSet,
    map_binding: &str,
) -> Result<String> {
    let handle = ObjectHandle::new(id.clone(), layer.kind());
    let constructor = layer.constructor()?;
    let script = creation_script(&handle, &constructor, subscriptions, map_binding);
    trace!(id = %id, kind = %handle.kind, listeners = subscriptions.len(), "Rendered creation script");
    Ok(script)
}

/// Listener registrations for map-level events, reported with origin `map`.
///
/// Returns an empty string for an empty set.
pub fn map_subscription_script(subscriptions: &SubscriptionSet, map_binding: &str) -> String {
    subscriptions
        .iter()
        .map(|action| {
            listener_block(
                map_binding,
                ObjectKind::Map,
                &js_string(MAP_SOURCE_ID),
                action,
                map_binding,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One bracketed listener registration. The whole call sits on one line.
fn listener_block(
    target: &str,
    kind: ObjectKind,
    origin: &str,
    action: Action,
    map_binding: &str,
) -> String {
    let wire = js_string(action.wire_name());
    format!(
        "{CALLBACK_START}\n\
         {target}.on({wire}, (e) => {EVENT_ENDPOINT}({wire}, {kind}, {origin}, \
         {map_binding}.getZoom(), JSON.stringify(e.latlng || {map_binding}.getCenter()), \
         JSON.stringify({map_binding}.getBounds())));\n\
         {CALLBACK_END}",
        kind = js_string(kind.as_str()),
    )
}
