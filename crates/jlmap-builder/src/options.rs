//! Typed option sets for map layers.
//!
//! Each type is an immutable value: the `with_*` methods consume and return a
//! new value. Defaults follow Leaflet's own defaults.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use jlmap_core::error::{JlMapError, Result};

use crate::literal::{JsField, JsValue, ParsedFields, ToLiteral, parse_literal};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Color {
    /// Leaflet's default path colour.
    #[default]
    Blue,
    Red,
    Green,
    Orange,
    Yellow,
    Purple,
    Black,
    White,
    Gray,
    Rgb(u8, u8, u8),
}

impl Color {
    const NAMED: [Color; 9] = [
        Color::Blue,
        Color::Red,
        Color::Green,
        Color::Orange,
        Color::Yellow,
        Color::Purple,
        Color::Black,
        Color::White,
        Color::Gray,
    ];

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            Color::Blue => (0x33, 0x88, 0xff),
            Color::Red => (0xff, 0x00, 0x00),
            Color::Green => (0x00, 0x80, 0x00),
            Color::Orange => (0xff, 0xa5, 0x00),
            Color::Yellow => (0xff, 0xff, 0x00),
            Color::Purple => (0x80, 0x00, 0x80),
            Color::Black => (0x00, 0x00, 0x00),
            Color::White => (0xff, 0xff, 0xff),
            Color::Gray => (0x80, 0x80, 0x80),
            Color::Rgb(r, g, b) => (r, g, b),
        }
    }

    /// Canonical `#rrggbb` token.
    pub fn token(self) -> String {
        let (r, g, b) = self.rgb();
        format!("#{r:02x}{g:02x}{b:02x}")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl FromStr for Color {
    type Err = JlMapError;

    /// Accepts `#rrggbb` or a palette name; named colours are recognised
    /// from their hex form too.
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        let named = |name: &str| match name {
            "blue" => Some(Color::Blue),
            "red" => Some(Color::Red),
            "green" => Some(Color::Green),
            "orange" => Some(Color::Orange),
            "yellow" => Some(Color::Yellow),
            "purple" => Some(Color::Purple),
            "black" => Some(Color::Black),
            "white" => Some(Color::White),
            "gray" | "grey" => Some(Color::Gray),
            _ => None,
        };
        if let Some(color) = named(&lower) {
            return Ok(color);
        }

        let hex = lower
            .strip_prefix('#')
            .filter(|h| h.len() == 6 && h.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| JlMapError::conversion(s, "expected #rrggbb or a colour name"))?;
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or_default();
        let rgb = (channel(0), channel(2), channel(4));
        Ok(Color::NAMED
            .into_iter()
            .find(|c| c.rgb() == rgb)
            .unwrap_or(Color::Rgb(rgb.0, rgb.1, rgb.2)))
    }
}

impl TryFrom<String> for Color {
    type Error = JlMapError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.token()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineCap {
    Butt,
    #[default]
    Round,
    Square,
}

impl LineCap {
    pub fn token(self) -> &'static str {
        match self {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        [LineCap::Butt, LineCap::Round, LineCap::Square]
            .into_iter()
            .find(|c| c.token() == token)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineJoin {
    Miter,
    #[default]
    Round,
    Bevel,
}

impl LineJoin {
    pub fn token(self) -> &'static str {
        match self {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        [LineJoin::Miter, LineJoin::Round, LineJoin::Bevel]
            .into_iter()
            .find(|j| j.token() == token)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FillRule {
    NonZero,
    #[default]
    EvenOdd,
}

impl FillRule {
    pub fn token(self) -> &'static str {
        match self {
            FillRule::NonZero => "nonzero",
            FillRule::EvenOdd => "evenodd",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        [FillRule::NonZero, FillRule::EvenOdd]
            .into_iter()
            .find(|r| r.token() == token)
    }
}

/// Style options shared by every vector layer (Leaflet `Path` options).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapeOptions {
    /// Draw the outline (default: true).
    pub stroke: bool,
    /// Outline colour (default: `#3388ff`).
    pub color: Color,
    /// Outline width in pixels (default: 3.0).
    pub weight: f64,
    /// Outline opacity (default: 1.0).
    pub opacity: f64,
    pub line_cap: LineCap,
    pub line_join: LineJoin,
    /// Dash pattern such as `"5, 10"` (default: none).
    pub dash_array: Option<String>,
    pub dash_offset: Option<String>,
    /// Fill the shape (default: true; polylines use [`ShapeOptions::line`]).
    pub fill: bool,
    /// Fill colour (default: same as `color`).
    pub fill_color: Option<Color>,
    /// Fill opacity (default: 0.2).
    pub fill_opacity: f64,
    pub fill_rule: FillRule,
    /// Polyline simplification factor (default: 1.0).
    pub smooth_factor: f64,
    pub no_clip: bool,
    pub interactive: bool,
    pub class_name: Option<String>,
}

impl Default for ShapeOptions {
    fn default() -> Self {
        Self {
            stroke: true,
            color: Color::Blue,
            weight: 3.0,
            opacity: 1.0,
            line_cap: LineCap::Round,
            line_join: LineJoin::Round,
            dash_array: None,
            dash_offset: None,
            fill: true,
            fill_color: None,
            fill_opacity: 0.2,
            fill_rule: FillRule::EvenOdd,
            smooth_factor: 1.0,
            no_clip: false,
            interactive: true,
            class_name: None,
        }
    }
}

impl ShapeOptions {
    /// Defaults for open lines: no fill.
    pub fn line() -> Self {
        Self {
            fill: false,
            ..Self::default()
        }
    }

    pub fn with_color(self, color: Color) -> Self {
        Self { color, ..self }
    }

    pub fn with_weight(self, weight: f64) -> Self {
        Self { weight, ..self }
    }

    pub fn with_opacity(self, opacity: f64) -> Self {
        Self { opacity, ..self }
    }

    pub fn with_fill(self, fill: bool) -> Self {
        Self { fill, ..self }
    }

    pub fn with_fill_color(self, color: Color) -> Self {
        Self {
            fill_color: Some(color),
            ..self
        }
    }

    pub fn with_fill_opacity(self, fill_opacity: f64) -> Self {
        Self {
            fill_opacity,
            ..self
        }
    }

    pub fn with_dash_array(self, pattern: impl Into<String>) -> Self {
        Self {
            dash_array: Some(pattern.into()),
            ..self
        }
    }

    /// Recover options from a literal produced by [`ToLiteral::to_literal`].
    ///
    /// Fields missing from the literal keep their defaults.
    pub fn from_literal(text: &str) -> Result<Self> {
        let parsed = ParsedFields(parse_literal(text)?);
        let invalid = |field: &str| JlMapError::conversion(text, format!("invalid {field}"));
        let defaults = Self::default();

        let color = match parsed.str("color") {
            Some(token) => token.parse()?,
            None => defaults.color,
        };
        let fill_color = parsed.str("fillColor").map(str::parse).transpose()?;
        let line_cap = match parsed.str("lineCap") {
            Some(token) => LineCap::from_token(token).ok_or_else(|| invalid("lineCap"))?,
            None => defaults.line_cap,
        };
        let line_join = match parsed.str("lineJoin") {
            Some(token) => LineJoin::from_token(token).ok_or_else(|| invalid("lineJoin"))?,
            None => defaults.line_join,
        };
        let fill_rule = match parsed.str("fillRule") {
            Some(token) => FillRule::from_token(token).ok_or_else(|| invalid("fillRule"))?,
            None => defaults.fill_rule,
        };

        Ok(Self {
            stroke: parsed.bool("stroke").unwrap_or(defaults.stroke),
            color,
            weight: parsed.number("weight").unwrap_or(defaults.weight),
            opacity: parsed.number("opacity").unwrap_or(defaults.opacity),
            line_cap,
            line_join,
            dash_array: parsed.str("dashArray").map(str::to_string),
            dash_offset: parsed.str("dashOffset").map(str::to_string),
            fill: parsed.bool("fill").unwrap_or(defaults.fill),
            fill_color,
            fill_opacity: parsed.number("fillOpacity").unwrap_or(defaults.fill_opacity),
            fill_rule,
            smooth_factor: parsed.number("smoothFactor").unwrap_or(defaults.smooth_factor),
            no_clip: parsed.bool("noClip").unwrap_or(defaults.no_clip),
            interactive: parsed.bool("interactive").unwrap_or(defaults.interactive),
            class_name: parsed.str("className").map(str::to_string),
        })
    }
}

impl ToLiteral for ShapeOptions {
    fn fields(&self) -> Vec<JsField> {
        let mut fields = vec![
            JsField::new("stroke", JsValue::Bool(self.stroke)),
            JsField::new("color", JsValue::Str(self.color.token())),
            JsField::new("weight", JsValue::scale(self.weight)),
            JsField::new("opacity", JsValue::scale(self.opacity)),
            JsField::new("lineCap", JsValue::string(self.line_cap.token())),
            JsField::new("lineJoin", JsValue::string(self.line_join.token())),
        ];
        if let Some(dash) = &self.dash_array {
            fields.push(JsField::new("dashArray", JsValue::string(dash.as_str())));
        }
        if let Some(offset) = &self.dash_offset {
            fields.push(JsField::new("dashOffset", JsValue::string(offset.as_str())));
        }
        fields.push(JsField::new("fill", JsValue::Bool(self.fill)));
        if let Some(fill_color) = self.fill_color {
            fields.push(JsField::new("fillColor", JsValue::Str(fill_color.token())));
        }
        fields.extend([
            JsField::new("fillOpacity", JsValue::scale(self.fill_opacity)),
            JsField::new("fillRule", JsValue::string(self.fill_rule.token())),
            JsField::new("smoothFactor", JsValue::scale(self.smooth_factor)),
            JsField::new("noClip", JsValue::Bool(self.no_clip)),
            JsField::new("interactive", JsValue::Bool(self.interactive)),
        ]);
        if let Some(class_name) = &self.class_name {
            fields.push(JsField::new("className", JsValue::string(class_name.as_str())));
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerOptions {
    /// Whether the marker can be dragged (default: false).
    pub draggable: bool,
    /// Keyboard focusable (default: true).
    pub keyboard: bool,
    /// Hover tooltip text (default: empty).
    pub title: String,
    /// Image alt text (default: "Marker").
    pub alt: String,
    /// Z offset in pixels (default: 0).
    pub z_index_offset: i64,
    /// Opacity (default: 1.0).
    pub opacity: f64,
    pub rise_on_hover: bool,
    /// Z offset applied on hover (default: 250).
    pub rise_offset: i64,
    /// Pan the map when dragging near the edge (default: false).
    pub auto_pan: bool,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            draggable: false,
            keyboard: true,
            title: String::new(),
            alt: "Marker".into(),
            z_index_offset: 0,
            opacity: 1.0,
            rise_on_hover: false,
            rise_offset: 250,
            auto_pan: false,
        }
    }
}

impl MarkerOptions {
    pub fn with_draggable(self, draggable: bool) -> Self {
        Self { draggable, ..self }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..self
        }
    }

    pub fn with_opacity(self, opacity: f64) -> Self {
        Self { opacity, ..self }
    }
}

impl ToLiteral for MarkerOptions {
    fn fields(&self) -> Vec<JsField> {
        vec![
            JsField::new("draggable", JsValue::Bool(self.draggable)),
            JsField::new("keyboard", JsValue::Bool(self.keyboard)),
            JsField::new("title", JsValue::string(self.title.as_str())),
            JsField::new("alt", JsValue::string(self.alt.as_str())),
            JsField::new("zIndexOffset", JsValue::Integer(self.z_index_offset)),
            JsField::new("opacity", JsValue::scale(self.opacity)),
            JsField::new("riseOnHover", JsValue::Bool(self.rise_on_hover)),
            JsField::new("riseOffset", JsValue::Integer(self.rise_offset)),
            JsField::new("autoPan", JsValue::Bool(self.auto_pan)),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopupOptions {
    /// Maximum width in pixels (default: 300).
    pub max_width: i64,
    /// Minimum width in pixels (default: 50).
    pub min_width: i64,
    /// Pan the map so the popup is visible (default: true).
    pub auto_pan: bool,
    pub keep_in_view: bool,
    /// Show a close button (default: true).
    pub close_button: bool,
    /// Close when another popup opens (default: true).
    pub auto_close: bool,
    pub close_on_escape_key: bool,
    pub class_name: String,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            max_width: 300,
            min_width: 50,
            auto_pan: true,
            keep_in_view: false,
            close_button: true,
            auto_close: true,
            close_on_escape_key: true,
            class_name: String::new(),
        }
    }
}

impl ToLiteral for PopupOptions {
    fn fields(&self) -> Vec<JsField> {
        vec![
            JsField::new("maxWidth", JsValue::Integer(self.max_width)),
            JsField::new("minWidth", JsValue::Integer(self.min_width)),
            JsField::new("autoPan", JsValue::Bool(self.auto_pan)),
            JsField::new("keepInView", JsValue::Bool(self.keep_in_view)),
            JsField::new("closeButton", JsValue::Bool(self.close_button)),
            JsField::new("autoClose", JsValue::Bool(self.auto_close)),
            JsField::new("closeOnEscapeKey", JsValue::Bool(self.close_on_escape_key)),
            JsField::new("className", JsValue::string(self.class_name.as_str())),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_tokens() {
        assert_eq!(Color::default().token(), "#3388ff");
        assert_eq!(Color::Rgb(1, 2, 255).token(), "#0102ff");
        assert_eq!("#3388FF".parse::<Color>().unwrap(), Color::Blue);
        assert_eq!("grey".parse::<Color>().unwrap(), Color::Gray);
        assert_eq!("#123456".parse::<Color>().unwrap(), Color::Rgb(0x12, 0x34, 0x56));
        assert!("#12345".parse::<Color>().is_err());
        assert!("chartreuse".parse::<Color>().is_err());
    }

    #[test]
    fn test_color_serde() {
        assert_eq!(serde_json::to_string(&Color::Red).unwrap(), r##""#ff0000""##);
        let c: Color = serde_json::from_str(r#""purple""#).unwrap();
        assert_eq!(c, Color::Purple);
    }

    #[test]
    fn test_shape_defaults_literal() {
        assert_eq!(
            ShapeOptions::default().to_literal(),
            "{stroke: true, color: '#3388ff', weight: 3.0, opacity: 1.0, lineCap: 'round', \
             lineJoin: 'round', fill: true, fillOpacity: 0.2, fillRule: 'evenodd', \
             smoothFactor: 1.0, noClip: false, interactive: true}"
        );
    }

    #[test]
    fn test_shape_optional_fields_in_declared_order() {
        let options = ShapeOptions::default()
            .with_fill_color(Color::Red)
            .with_dash_array("5, 10");
        let literal = options.to_literal();
        let dash = literal.find("dashArray: '5, 10'").unwrap();
        let fill = literal.find("fill: true").unwrap();
        let fill_color = literal.find("fillColor: '#ff0000'").unwrap();
        assert!(dash < fill && fill < fill_color);
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let options = ShapeOptions::line()
            .with_color(Color::Rgb(10, 20, 30))
            .with_weight(2.5)
            .with_opacity(0.75);
        assert_eq!(options.to_literal(), options.clone().to_literal());
        assert_eq!(MarkerOptions::default().to_literal(), MarkerOptions::default().to_literal());
    }

    #[test]
    fn test_shape_literal_round_trip() {
        let options = ShapeOptions {
            stroke: false,
            color: Color::Rgb(0xab, 0xcd, 0xef),
            weight: 4.5,
            opacity: 0.5,
            line_cap: LineCap::Square,
            line_join: LineJoin::Bevel,
            dash_array: Some("4, 2".into()),
            dash_offset: Some("1".into()),
            fill: false,
            fill_color: Some(Color::Green),
            fill_opacity: 0.3,
            fill_rule: FillRule::NonZero,
            smooth_factor: 2.0,
            no_clip: true,
            interactive: false,
            class_name: Some("zone 'a'".into()),
        };
        let back = ShapeOptions::from_literal(&options.to_literal()).unwrap();
        assert_eq!(back, options);
    }

    #[test]
    fn test_round_trip_within_precision() {
        let options = ShapeOptions::default().with_opacity(0.33).with_weight(1.26);
        let back = ShapeOptions::from_literal(&options.to_literal()).unwrap();
        assert!((back.opacity - options.opacity).abs() <= 0.05);
        assert!((back.weight - options.weight).abs() <= 0.05);
    }

    #[test]
    fn test_from_literal_rejects_bad_tokens() {
        assert!(ShapeOptions::from_literal("{lineCap: 'wavy'}").is_err());
        assert!(ShapeOptions::from_literal("{color: 'nope'}").is_err());
        assert_eq!(ShapeOptions::from_literal("{}").unwrap(), ShapeOptions::default());
    }

    #[test]
    fn test_marker_literal_escapes_strings() {
        let literal = MarkerOptions::default()
            .with_draggable(true)
            .with_title("Joe's café")
            .to_literal();
        assert!(literal.starts_with("{draggable: true, keyboard: true, title: 'Joe\\'s café'"));
        assert!(literal.contains("zIndexOffset: 0"));
        assert!(literal.contains("riseOffset: 250"));
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: ShapeOptions =
            serde_json::from_str(r##"{"color": "#ff0000", "weight": 5.0}"##).unwrap();
        assert_eq!(options.color, Color::Red);
        assert_eq!(options.weight, 5.0);
        assert_eq!(options.fill_opacity, 0.2);

        let popup: PopupOptions = serde_json::from_str(r#"{"max_width": 120}"#).unwrap();
        assert_eq!(popup.max_width, 120);
        assert!(popup.close_button);
    }
}
