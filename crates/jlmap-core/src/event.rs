//! Action taxonomy, subscription sets and the typed event union.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{JlMapError, Result};
use crate::types::{Bounds, LatLng, ObjectKind};

/// Interactions reported across the boundary.
///
/// Declaration order is the order listener registrations are rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Action {
    Zoom,
    ZoomStart,
    ZoomEnd,
    Move,
    MoveStart,
    MoveEnd,
    Drag,
    DragStart,
    DragEnd,
    Click,
    DoubleClick,
    Add,
    Remove,
    Resize,
}

impl Action {
    pub const ALL: [Action; 14] = [
        Action::Zoom,
        Action::ZoomStart,
        Action::ZoomEnd,
        Action::Move,
        Action::MoveStart,
        Action::MoveEnd,
        Action::Drag,
        Action::DragStart,
        Action::DragEnd,
        Action::Click,
        Action::DoubleClick,
        Action::Add,
        Action::Remove,
        Action::Resize,
    ];

    /// Leaflet event name.
    pub fn wire_name(self) -> &'static str {
        match self {
            Action::Zoom => "zoom",
            Action::ZoomStart => "zoomstart",
            Action::ZoomEnd => "zoomend",
            Action::Move => "move",
            Action::MoveStart => "movestart",
            Action::MoveEnd => "moveend",
            Action::Drag => "drag",
            Action::DragStart => "dragstart",
            Action::DragEnd => "dragend",
            Action::Click => "click",
            Action::DoubleClick => "dblclick",
            Action::Add => "add",
            Action::Remove => "remove",
            Action::Resize => "resize",
        }
    }

    pub fn from_wire(name: &str) -> Result<Self> {
        Action::ALL
            .into_iter()
            .find(|action| action.wire_name() == name)
            .ok_or_else(|| JlMapError::conversion(name, "unknown action"))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for Action {
    type Err = JlMapError;

    fn from_str(s: &str) -> Result<Self> {
        Action::from_wire(s)
    }
}

impl TryFrom<String> for Action {
    type Error = JlMapError;

    fn try_from(value: String) -> Result<Self> {
        Action::from_wire(&value)
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        action.wire_name().to_string()
    }
}

/// The set of actions an object is registered for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionSet(BTreeSet<Action>);

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the action was already present.
    pub fn insert(&mut self, action: Action) -> bool {
        self.0.insert(action)
    }

    pub fn with(mut self, action: Action) -> Self {
        self.0.insert(action);
        self
    }

    pub fn contains(&self, action: Action) -> bool {
        self.0.contains(&action)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate in declared [`Action`] order.
    pub fn iter(&self) -> impl Iterator<Item = Action> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Action> for SubscriptionSet {
    fn from_iter<I: IntoIterator<Item = Action>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Action; N]> for SubscriptionSet {
    fn from(actions: [Action; N]) -> Self {
        actions.into_iter().collect()
    }
}

/// Data every event carries about its origin and the map state.
#[derive(Debug, Clone, PartialEq)]
pub struct EventContext {
    pub object_id: String,
    pub source: ObjectKind,
    pub zoom: f64,
    /// Pointer/anchor coordinate, or the map center when none was reported.
    pub coordinate: LatLng,
    pub coordinate_reported: bool,
    pub bounds: Bounds,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Click(EventContext),
    DoubleClick(EventContext),
    Move(EventContext),
    MoveStart(EventContext),
    MoveEnd(EventContext),
    Drag(EventContext),
    DragStart(EventContext),
    DragEnd(EventContext),
    Zoom(EventContext),
    ZoomStart(EventContext),
    ZoomEnd(EventContext),
    Add(EventContext),
    Remove(EventContext),
    Resize(EventContext),
}

impl Event {
    pub fn new(action: Action, context: EventContext) -> Self {
        match action {
            Action::Click => Event::Click(context),
            Action::DoubleClick => Event::DoubleClick(context),
            Action::Move => Event::Move(context),
            Action::MoveStart => Event::MoveStart(context),
            Action::MoveEnd => Event::MoveEnd(context),
            Action::Drag => Event::Drag(context),
            Action::DragStart => Event::DragStart(context),
            Action::DragEnd => Event::DragEnd(context),
            Action::Zoom => Event::Zoom(context),
            Action::ZoomStart => Event::ZoomStart(context),
            Action::ZoomEnd => Event::ZoomEnd(context),
            Action::Add => Event::Add(context),
            Action::Remove => Event::Remove(context),
            Action::Resize => Event::Resize(context),
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Event::Click(_) => Action::Click,
            Event::DoubleClick(_) => Action::DoubleClick,
            Event::Move(_) => Action::Move,
            Event::MoveStart(_) => Action::MoveStart,
            Event::MoveEnd(_) => Action::MoveEnd,
            Event::Drag(_) => Action::Drag,
            Event::DragStart(_) => Action::DragStart,
            Event::DragEnd(_) => Action::DragEnd,
            Event::Zoom(_) => Action::Zoom,
            Event::ZoomStart(_) => Action::ZoomStart,
            Event::ZoomEnd(_) => Action::ZoomEnd,
            Event::Add(_) => Action::Add,
            Event::Remove(_) => Action::Remove,
            Event::Resize(_) => Action::Resize,
        }
    }

    pub fn context(&self) -> &EventContext {
        match self {
            Event::Click(c)
            | Event::DoubleClick(c)
            | Event::Move(c)
            | Event::MoveStart(c)
            | Event::MoveEnd(c)
            | Event::Drag(c)
            | Event::DragStart(c)
            | Event::DragEnd(c)
            | Event::Zoom(c)
            | Event::ZoomStart(c)
            | Event::ZoomEnd(c)
            | Event::Add(c)
            | Event::Remove(c)
            | Event::Resize(c) => c,
        }
    }

    pub fn object_id(&self) -> &str {
        &self.context().object_id
    }

    /// Decode the arguments of an `eventHandler` call.
    ///
    /// A missing coordinate (`None`, empty, or JSON `null`) is replaced by the
    /// center of the reported bounds.
    pub fn decode(
        action: &str,
        object_kind: &str,
        object_id: &str,
        zoom: f64,
        coordinate_json: Option<&str>,
        bounds_json: &str,
    ) -> Result<Self> {
        let action = Action::from_wire(action)?;
        let source: ObjectKind = object_kind.parse()?;
        if object_id.is_empty() {
            return Err(JlMapError::conversion(object_id, "empty object id"));
        }
        if !zoom.is_finite() {
            return Err(JlMapError::conversion(zoom.to_string(), "zoom is not finite"));
        }

        let bounds: Bounds = serde_json::from_str(bounds_json)
            .map_err(|e| JlMapError::conversion(bounds_json, e))?;

        let reported = match coordinate_json.map(str::trim) {
            None | Some("") | Some("null") | Some("undefined") => None,
            Some(raw) => Some(
                serde_json::from_str::<LatLng>(raw).map_err(|e| JlMapError::conversion(raw, e))?,
            ),
        };

        let context = EventContext {
            object_id: object_id.to_string(),
            source,
            zoom,
            coordinate: reported.unwrap_or_else(|| bounds.center()),
            coordinate_reported: reported.is_some(),
            bounds,
        };
        Ok(Event::new(action, context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOUNDS: &str =
        r#"{"_southWest":{"lat":0.0,"lng":0.0},"_northEast":{"lat":20.0,"lng":40.0}}"#;

    #[test]
    fn test_wire_names_round_trip() {
        for action in Action::ALL {
            assert_eq!(Action::from_wire(action.wire_name()).unwrap(), action);
        }
        assert_eq!(Action::DoubleClick.wire_name(), "dblclick");
    }

    #[test]
    fn test_unknown_action_is_conversion_error() {
        for name in ["", "Click", "hover", "doubleclick", "zoom "] {
            let err = Action::from_wire(name).unwrap_err();
            assert!(matches!(err, JlMapError::Conversion { ref payload, .. } if payload == name));
        }
    }

    #[test]
    fn test_subscription_set_is_idempotent_and_ordered() {
        let mut subs = SubscriptionSet::new();
        assert!(subs.insert(Action::Remove));
        assert!(subs.insert(Action::Move));
        assert!(subs.insert(Action::Add));
        assert!(!subs.insert(Action::Move));
        assert_eq!(subs.len(), 3);
        let order: Vec<_> = subs.iter().collect();
        assert_eq!(order, vec![Action::Move, Action::Add, Action::Remove]);
    }

    #[test]
    fn test_subscription_set_serde_uses_wire_names() {
        let subs = SubscriptionSet::from([Action::Click, Action::DoubleClick]);
        assert_eq!(serde_json::to_string(&subs).unwrap(), r#"["click","dblclick"]"#);
        let back: SubscriptionSet = serde_json::from_str(r#"["dblclick","click","click"]"#).unwrap();
        assert_eq!(back, subs);
        assert!(serde_json::from_str::<SubscriptionSet>(r#"["hover"]"#).is_err());
    }

    #[test]
    fn test_decode_with_coordinate() {
        let event = Event::decode(
            "click",
            "marker",
            "m1",
            7.0,
            Some(r#"{"lat":1.5,"lng":2.5}"#),
            BOUNDS,
        )
        .unwrap();
        assert_eq!(event.action(), Action::Click);
        let ctx = event.context();
        assert_eq!(ctx.object_id, "m1");
        assert_eq!(ctx.source, ObjectKind::Marker);
        assert_eq!(ctx.coordinate, LatLng::new(1.5, 2.5));
        assert!(ctx.coordinate_reported);
        assert_eq!(ctx.zoom, 7.0);
    }

    #[test]
    fn test_decode_missing_coordinate_uses_center() {
        for coordinate in [None, Some("null"), Some("")] {
            let event = Event::decode("add", "circle", "c1", 3.0, coordinate, BOUNDS).unwrap();
            assert!(matches!(event, Event::Add(_)));
            assert_eq!(event.context().coordinate, LatLng::new(10.0, 20.0));
            assert!(!event.context().coordinate_reported);
        }
    }

    #[test]
    fn test_decode_rejects_bad_payloads() {
        assert!(Event::decode("hover", "marker", "m1", 1.0, None, BOUNDS).is_err());
        assert!(Event::decode("click", "hexagon", "m1", 1.0, None, BOUNDS).is_err());
        assert!(Event::decode("click", "marker", "m1", f64::NAN, None, BOUNDS).is_err());
        assert!(Event::decode("click", "marker", "m1", 1.0, Some(r#"{"lat":"north"}"#), BOUNDS).is_err());

        let err = Event::decode("click", "marker", "m1", 1.0, None, "{not json").unwrap_err();
        assert!(matches!(err, JlMapError::Conversion { ref payload, .. } if payload == "{not json"));
    }
}
