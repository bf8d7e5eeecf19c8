use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::JlMapError;

/// A geographic coordinate, shaped like a serialized Leaflet `LatLng`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Rectangular map bounds, shaped like a serialized Leaflet `LatLngBounds`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(rename = "_southWest", alias = "southWest")]
    pub south_west: LatLng,
    #[serde(rename = "_northEast", alias = "northEast")]
    pub north_east: LatLng,
}

impl Bounds {
    pub const fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south_west.lat + self.north_east.lat) / 2.0,
            lng: (self.south_west.lng + self.north_east.lng) / 2.0,
        }
    }

    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

/// Kinds of map primitive the bridge can create and address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// The map itself; only ever an event origin.
    Map,
    Marker,
    Popup,
    Circle,
    CircleMarker,
    Polyline,
    MultiPolyline,
    Polygon,
    Rectangle,
    #[serde(rename = "geojson")]
    GeoJson,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 10] = [
        ObjectKind::Map,
        ObjectKind::Marker,
        ObjectKind::Popup,
        ObjectKind::Circle,
        ObjectKind::CircleMarker,
        ObjectKind::Polyline,
        ObjectKind::MultiPolyline,
        ObjectKind::Polygon,
        ObjectKind::Rectangle,
        ObjectKind::GeoJson,
    ];

    /// Tag used in generated script and in event payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Map => "map",
            ObjectKind::Marker => "marker",
            ObjectKind::Popup => "popup",
            ObjectKind::Circle => "circle",
            ObjectKind::CircleMarker => "circle_marker",
            ObjectKind::Polyline => "polyline",
            ObjectKind::MultiPolyline => "multi_polyline",
            ObjectKind::Polygon => "polygon",
            ObjectKind::Rectangle => "rectangle",
            ObjectKind::GeoJson => "geojson",
        }
    }

    /// Vector layers share Leaflet's `Path` style options.
    pub fn is_path(self) -> bool {
        matches!(
            self,
            ObjectKind::Circle
                | ObjectKind::CircleMarker
                | ObjectKind::Polyline
                | ObjectKind::MultiPolyline
                | ObjectKind::Polygon
                | ObjectKind::Rectangle
                | ObjectKind::GeoJson
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = JlMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| JlMapError::conversion(s, "unknown object kind"))
    }
}

static IDENTIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("static regex"));

/// Names an object id may not take: JS reserved words and every global the
/// generated script binds or calls.
const RESERVED_IDS: &[&str] = &[
    "await", "break", "case", "catch", "class", "const", "continue", "debugger", "default",
    "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for", "function",
    "if", "implements", "import", "in", "instanceof", "interface", "let", "new", "null",
    "package", "private", "protected", "public", "return", "static", "super", "switch", "this",
    "throw", "true", "try", "typeof", "var", "void", "while", "with", "yield", "arguments",
    "eval", "undefined", "NaN", "Infinity", "window", "globalThis", "document", "JSON", "L",
    "map", "eventHandler", "jlObjectBridgeCall", "jlObjectBridge",
    crate::protocol::MAP_SOURCE_ID,
];

/// Caller-supplied object id, guaranteed to be usable both as a JS local
/// (`var <id>`) and as a property (`this.<id>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    pub fn new(id: impl Into<String>) -> crate::error::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(JlMapError::InvalidObjectId {
                id,
                reason: "id is empty".into(),
            });
        }
        if !IDENTIFIER.is_match(&id) {
            return Err(JlMapError::InvalidObjectId {
                id,
                reason: "id must be a plain identifier ([A-Za-z_$][A-Za-z0-9_$]*)".into(),
            });
        }
        if RESERVED_IDS.contains(&id.as_str()) {
            return Err(JlMapError::InvalidObjectId {
                id,
                reason: "id is reserved in generated script".into(),
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = JlMapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectId::new(value)
    }
}

impl TryFrom<&str> for ObjectId {
    type Error = JlMapError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ObjectId::new(value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

/// Stable id plus kind tag for a map primitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectHandle {
    pub id: ObjectId,
    pub kind: ObjectKind,
}

impl ObjectHandle {
    pub fn new(id: ObjectId, kind: ObjectKind) -> Self {
        Self { id, kind }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_accepts_identifiers() {
        for id in ["circle", "marker_1", "$layer", "_x9"] {
            assert!(ObjectId::new(id).is_ok(), "{id} should be valid");
        }
    }

    #[test]
    fn test_object_id_rejects_unsafe_names() {
        for id in ["", "my-marker", "1st", "a'b", "with space", "map", "this", "L", "main_map"] {
            let err = ObjectId::new(id).unwrap_err();
            assert!(matches!(err, JlMapError::InvalidObjectId { .. }), "{id}");
        }
    }

    #[test]
    fn test_object_id_deserialize_validates() {
        let ok: ObjectId = serde_json::from_str(r#""circle""#).unwrap();
        assert_eq!(ok.as_str(), "circle");
        assert!(serde_json::from_str::<ObjectId>(r#""bad id""#).is_err());
    }

    #[test]
    fn test_object_kind_round_trip() {
        for kind in ObjectKind::ALL {
            assert_eq!(kind.as_str().parse::<ObjectKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert!("hexagon".parse::<ObjectKind>().is_err());
    }

    #[test]
    fn test_bounds_leaflet_shape() {
        let json = r#"{"_southWest":{"lat":10.0,"lng":20.0},"_northEast":{"lat":12.0,"lng":24.0}}"#;
        let bounds: Bounds = serde_json::from_str(json).unwrap();
        assert_eq!(bounds.center(), LatLng::new(11.0, 22.0));
        assert!(bounds.contains(&LatLng::new(11.5, 21.0)));
        assert!(!bounds.contains(&LatLng::new(13.0, 21.0)));

        let alias = r#"{"southWest":{"lat":10.0,"lng":20.0},"northEast":{"lat":12.0,"lng":24.0}}"#;
        assert_eq!(serde_json::from_str::<Bounds>(alias).unwrap(), bounds);
    }
}
