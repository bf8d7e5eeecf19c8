//! Layer descriptions and their constructor expressions.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use jlmap_core::error::{JlMapError, Result};
use jlmap_core::protocol::js_string;
use jlmap_core::types::{Bounds, LatLng, ObjectKind};

use crate::literal::{JsField, JsValue, ToLiteral, lat_lng, lat_lng_list, object_literal};
use crate::options::{MarkerOptions, PopupOptions, ShapeOptions};

/// Geometry plus options for one map primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    Marker {
        position: LatLng,
        #[serde(default)]
        options: MarkerOptions,
    },
    Popup {
        position: LatLng,
        content: String,
        #[serde(default)]
        options: PopupOptions,
    },
    Circle {
        center: LatLng,
        /// Metres.
        radius: f64,
        #[serde(default)]
        options: ShapeOptions,
    },
    CircleMarker {
        center: LatLng,
        /// Pixels.
        radius: f64,
        #[serde(default)]
        options: ShapeOptions,
    },
    Polyline {
        points: Vec<LatLng>,
        #[serde(default = "ShapeOptions::line")]
        options: ShapeOptions,
    },
    MultiPolyline {
        lines: Vec<Vec<LatLng>>,
        #[serde(default = "ShapeOptions::line")]
        options: ShapeOptions,
    },
    /// The first ring is the outline, any further rings are holes.
    Polygon {
        rings: Vec<Vec<LatLng>>,
        #[serde(default)]
        options: ShapeOptions,
    },
    Rectangle {
        bounds: Bounds,
        #[serde(default)]
        options: ShapeOptions,
    },
    #[serde(rename = "geojson")]
    GeoJson {
        data: Value,
        #[serde(default)]
        options: ShapeOptions,
    },
}

impl Layer {
    pub fn marker(position: LatLng) -> Self {
        Layer::Marker {
            position,
            options: MarkerOptions::default(),
        }
    }

    pub fn popup(position: LatLng, content: impl Into<String>) -> Self {
        Layer::Popup {
            position,
            content: content.into(),
            options: PopupOptions::default(),
        }
    }

    pub fn circle(center: LatLng, radius: f64) -> Self {
        Layer::Circle {
            center,
            radius,
            options: ShapeOptions::default(),
        }
    }

    pub fn polyline(points: Vec<LatLng>) -> Self {
        Layer::Polyline {
            points,
            options: ShapeOptions::line(),
        }
    }

    pub fn polygon(outline: Vec<LatLng>) -> Self {
        Layer::Polygon {
            rings: vec![outline],
            options: ShapeOptions::default(),
        }
    }

    pub fn rectangle(bounds: Bounds) -> Self {
        Layer::Rectangle {
            bounds,
            options: ShapeOptions::default(),
        }
    }

    /// Parse GeoJSON text. Only objects are accepted.
    pub fn geo_json(text: &str) -> Result<Self> {
        let data: Value =
            serde_json::from_str(text).map_err(|e| JlMapError::conversion(text, e))?;
        if !data.is_object() {
            return Err(JlMapError::conversion(text, "GeoJSON must be an object"));
        }
        Ok(Layer::GeoJson {
            data,
            options: ShapeOptions::default(),
        })
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Layer::Marker { .. } => ObjectKind::Marker,
            Layer::Popup { .. } => ObjectKind::Popup,
            Layer::Circle { .. } => ObjectKind::Circle,
            Layer::CircleMarker { .. } => ObjectKind::CircleMarker,
            Layer::Polyline { .. } => ObjectKind::Polyline,
            Layer::MultiPolyline { .. } => ObjectKind::MultiPolyline,
            Layer::Polygon { .. } => ObjectKind::Polygon,
            Layer::Rectangle { .. } => ObjectKind::Rectangle,
            Layer::GeoJson { .. } => ObjectKind::GeoJson,
        }
    }

    /// The JS expression that constructs this layer.
    pub fn constructor(&self) -> Result<String> {
        let expression = match self {
            Layer::Marker { position, options } => {
                format!("L.marker({}, {})", lat_lng(position), options.to_literal())
            }
            Layer::Popup {
                position,
                content,
                options,
            } => format!(
                "L.popup({}).setLatLng({}).setContent({})",
                options.to_literal(),
                lat_lng(position),
                js_string(content)
            ),
            Layer::Circle {
                center,
                radius,
                options,
            } => format!(
                "L.circle({}, {})",
                lat_lng(center),
                with_radius(*radius, options)?
            ),
            Layer::CircleMarker {
                center,
                radius,
                options,
            } => format!(
                "L.circleMarker({}, {})",
                lat_lng(center),
                with_radius(*radius, options)?
            ),
            Layer::Polyline { points, options } => {
                format!("L.polyline({}, {})", lat_lng_list(points), options.to_literal())
            }
            Layer::MultiPolyline { lines, options } => {
                format!("L.polyline({}, {})", nested(lines), options.to_literal())
            }
            Layer::Polygon { rings, options } => {
                let geometry = match rings.as_slice() {
                    [] => return Err(self.invalid("polygon needs at least one ring")),
                    [outline] => lat_lng_list(outline),
                    _ => nested(rings),
                };
                format!("L.polygon({geometry}, {})", options.to_literal())
            }
            Layer::Rectangle { bounds, options } => format!(
                "L.rectangle([{}, {}], {})",
                lat_lng(&bounds.south_west),
                lat_lng(&bounds.north_east),
                options.to_literal()
            ),
            Layer::GeoJson { data, options } => {
                if !data.is_object() {
                    return Err(self.invalid("GeoJSON must be an object"));
                }
                let style = object_literal(&[JsField::new(
                    "style",
                    JsValue::Object(options.fields()),
                )]);
                // `{{` and `<` only occur inside JSON strings, where the
                // `\u` escapes mean the same
                let json = data
                    .to_string()
                    .replace("{{", "{\\u007b")
                    .replace('<', "\\u003c");
                format!("L.geoJSON({json}, {style})")
            }
        };
        Ok(expression)
    }

    fn invalid(&self, reason: &str) -> JlMapError {
        let payload = serde_json::to_string(self).unwrap_or_else(|_| self.kind().to_string());
        JlMapError::conversion(payload, reason)
    }
}

/// Shape literal with `radius` as its first field.
fn with_radius(radius: f64, options: &ShapeOptions) -> Result<String> {
    if !radius.is_finite() || radius < 0.0 {
        return Err(JlMapError::conversion(
            radius.to_string(),
            "radius must be a finite, non-negative number",
        ));
    }
    let mut fields = vec![JsField::new("radius", JsValue::coordinate(radius))];
    fields.extend(options.fields());
    Ok(object_literal(&fields))
}

fn nested(lines: &[Vec<LatLng>]) -> String {
    let items = lines
        .iter()
        .map(|line| lat_lng_list(line))
        .collect::<Vec<_>>()
        .join(", ");
    format!("[{items}]")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::options::Color;

    #[test]
    fn test_circle_puts_radius_first() {
        let ctor = Layer::circle(LatLng::new(10.2, 20.1), 13.0).constructor().unwrap();
        assert!(ctor.starts_with("L.circle([10.200000, 20.100000], {radius: 13.000000, stroke: true"));
        assert!(ctor.ends_with("interactive: true})"));
    }

    #[test]
    fn test_circle_rejects_bad_radius() {
        for radius in [-1.0, f64::NAN, f64::INFINITY] {
            let err = Layer::circle(LatLng::new(0.0, 0.0), radius)
                .constructor()
                .unwrap_err();
            assert!(matches!(err, JlMapError::Conversion { .. }));
        }
    }

    #[test]
    fn test_marker_constructor() {
        let ctor = Layer::marker(LatLng::new(1.0, 2.0)).constructor().unwrap();
        assert!(ctor.starts_with("L.marker([1.000000, 2.000000], {draggable: false,"));
    }

    #[test]
    fn test_popup_chains_position_and_content() {
        let ctor = Layer::popup(LatLng::new(1.0, 2.0), "<b>Hi</b> it's me")
            .constructor()
            .unwrap();
        assert!(ctor.starts_with("L.popup({maxWidth: 300,"));
        assert!(ctor.ends_with(
            r".setLatLng([1.000000, 2.000000]).setContent('\x3cb>Hi\x3c/b> it\'s me')"
        ));
    }

    #[test]
    fn test_polyline_defaults_to_no_fill() {
        let ctor = Layer::polyline(vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)])
            .constructor()
            .unwrap();
        assert!(ctor.starts_with("L.polyline([[0.000000, 0.000000], [1.000000, 1.000000]], {"));
        assert!(ctor.contains("fill: false"));
    }

    #[test]
    fn test_multi_polyline_nests_lines() {
        let layer = Layer::MultiPolyline {
            lines: vec![vec![LatLng::new(0.0, 0.0)], vec![LatLng::new(5.0, 5.0)]],
            options: ShapeOptions::line(),
        };
        assert_eq!(layer.kind(), ObjectKind::MultiPolyline);
        assert!(
            layer
                .constructor()
                .unwrap()
                .starts_with("L.polyline([[[0.000000, 0.000000]], [[5.000000, 5.000000]]], {")
        );
    }

    #[test]
    fn test_polygon_holes() {
        let outline = vec![LatLng::new(0.0, 0.0), LatLng::new(0.0, 4.0), LatLng::new(4.0, 0.0)];
        let hole = vec![LatLng::new(1.0, 1.0), LatLng::new(1.0, 2.0), LatLng::new(2.0, 1.0)];

        let simple = Layer::polygon(outline.clone()).constructor().unwrap();
        assert!(simple.starts_with("L.polygon([[0.000000, 0.000000], "));

        let holed = Layer::Polygon {
            rings: vec![outline, hole],
            options: ShapeOptions::default(),
        };
        assert!(holed.constructor().unwrap().starts_with("L.polygon([[[0.000000, 0.000000], "));

        let empty = Layer::Polygon {
            rings: vec![],
            options: ShapeOptions::default(),
        };
        assert!(empty.constructor().is_err());
    }

    #[test]
    fn test_rectangle_corners() {
        let bounds = Bounds::new(LatLng::new(-1.0, -2.0), LatLng::new(3.0, 4.0));
        let ctor = Layer::rectangle(bounds).constructor().unwrap();
        assert!(ctor.starts_with("L.rectangle([[-1.000000, -2.000000], [3.000000, 4.000000]], {"));
    }

    #[test]
    fn test_geo_json_wraps_style() {
        let layer = Layer::geo_json(r#"{"type": "Point", "coordinates": [1, 2]}"#).unwrap();
        let Layer::GeoJson { data, .. } = &layer else {
            panic!("expected geojson");
        };
        assert_eq!(data["type"], json!("Point"));

        let ctor = layer.constructor().unwrap();
        assert!(ctor.starts_with(r#"L.geoJSON({"coordinates":[1,2],"type":"Point"}, {style: {stroke: true"#)
            || ctor.starts_with(r#"L.geoJSON({"type":"Point","coordinates":[1,2]}, {style: {stroke: true"#));
        assert!(ctor.ends_with("}})"));

        let tricky = Layer::geo_json(r#"{"name": "{{id}}"}"#).unwrap();
        assert!(!tricky.constructor().unwrap().contains("{{"));

        let closing = Layer::geo_json(r#"{"name": "</script><b>"}"#).unwrap();
        let ctor = closing.constructor().unwrap();
        assert!(!ctor.contains('<'));
        assert!(ctor.contains(r#""name":"\u003c/script>\u003cb>""#));

        assert!(Layer::geo_json("[1, 2]").is_err());
        assert!(Layer::geo_json("{nope").is_err());
    }

    #[test]
    fn test_layer_deserializes_from_tagged_json() {
        let layer: Layer = serde_json::from_value(json!({
            "kind": "circle",
            "center": {"lat": 10.2, "lng": 20.1},
            "radius": 13.0,
            "options": {"color": "red"}
        }))
        .unwrap();
        assert_eq!(layer.kind(), ObjectKind::Circle);
        let Layer::Circle { options, .. } = &layer else {
            panic!("expected circle");
        };
        assert_eq!(options.color, Color::Red);

        let line: Layer = serde_json::from_value(json!({
            "kind": "polyline",
            "points": [{"lat": 0.0, "lng": 0.0}]
        }))
        .unwrap();
        let Layer::Polyline { options, .. } = line else {
            panic!("expected polyline");
        };
        assert!(!options.fill);

        let geo: Layer = serde_json::from_value(json!({
            "kind": "geojson",
            "data": {"type": "FeatureCollection", "features": []}
        }))
        .unwrap();
        assert_eq!(geo.kind(), ObjectKind::GeoJson);
    }
}
