//! One-statement commands sent after a primitive exists.

use jlmap_core::error::{JlMapError, Result};
use jlmap_core::protocol::js_string;
use jlmap_core::types::{Bounds, LatLng, ObjectHandle, ObjectKind};
use jlmap_transport::envelope::{Envelope, ID_PLACEHOLDER};

use crate::literal::{JsValue, ToLiteral, lat_lng};
use crate::options::ShapeOptions;

/// A call on one created primitive, addressed as `this.<id>`.
///
/// Nothing here checks that the primitive still exists: removing twice without
/// re-creating it fails in the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectCommand {
    Remove,
    GetAttribution,
    GetLatLng,
    SetLatLng(LatLng),
    SetRadius(f64),
    SetOpacity(f64),
    SetContent(String),
    SetStyle(ShapeOptions),
    BringToFront,
    BringToBack,
}

impl ObjectCommand {
    /// Leaflet method name.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectCommand::Remove => "remove",
            ObjectCommand::GetAttribution => "getAttribution",
            ObjectCommand::GetLatLng => "getLatLng",
            ObjectCommand::SetLatLng(_) => "setLatLng",
            ObjectCommand::SetRadius(_) => "setRadius",
            ObjectCommand::SetOpacity(_) => "setOpacity",
            ObjectCommand::SetContent(_) => "setContent",
            ObjectCommand::SetStyle(_) => "setStyle",
            ObjectCommand::BringToFront => "bringToFront",
            ObjectCommand::BringToBack => "bringToBack",
        }
    }

    pub fn supports(&self, kind: ObjectKind) -> bool {
        Self::method_supported(self.name(), kind)
    }

    /// Whether objects of `kind` accept the Leaflet method `name`.
    pub fn method_supported(name: &str, kind: ObjectKind) -> bool {
        use ObjectKind::*;
        match name {
            "remove" | "getAttribution" => kind != Map,
            "getLatLng" | "setLatLng" => matches!(kind, Marker | Popup | Circle | CircleMarker),
            "setRadius" => matches!(kind, Circle | CircleMarker),
            "setOpacity" => kind == Marker,
            "setContent" => kind == Popup,
            "setStyle" | "bringToFront" | "bringToBack" => kind.is_path(),
            _ => false,
        }
    }

    /// Whether the completion value carries a result worth decoding.
    pub fn returns_value(&self) -> bool {
        matches!(
            self,
            ObjectCommand::GetAttribution | ObjectCommand::GetLatLng
        )
    }

    /// The statement template, still holding the `{{id}}` placeholder.
    pub fn render(&self) -> Result<String> {
        let target = format!("this.{ID_PLACEHOLDER}");
        let statement = match self {
            ObjectCommand::SetLatLng(point) => {
                format!("{target}.setLatLng({});", lat_lng(point))
            }
            ObjectCommand::SetRadius(radius) => {
                if !radius.is_finite() || *radius < 0.0 {
                    return Err(JlMapError::conversion(
                        radius.to_string(),
                        "radius must be a finite, non-negative number",
                    ));
                }
                format!("{target}.setRadius({});", JsValue::coordinate(*radius))
            }
            ObjectCommand::SetOpacity(opacity) => {
                if !(0.0..=1.0).contains(opacity) {
                    return Err(JlMapError::conversion(
                        opacity.to_string(),
                        "opacity must be between 0 and 1",
                    ));
                }
                format!("{target}.setOpacity({});", JsValue::scale(*opacity))
            }
            ObjectCommand::SetContent(content) => {
                format!("{target}.setContent({});", js_string(content))
            }
            ObjectCommand::SetStyle(options) => {
                format!("{target}.setStyle({});", options.to_literal())
            }
            other => format!("{target}.{}();", other.name()),
        };
        Ok(statement)
    }

    /// Package for `handle`, rejecting kinds that lack the method.
    pub fn envelope(&self, handle: &ObjectHandle) -> Result<Envelope> {
        if !self.supports(handle.kind) {
            return Err(JlMapError::UnsupportedMethod {
                kind: handle.kind,
                method: self.name().to_string(),
            });
        }
        Ok(Envelope::targeted(handle.id.clone(), self.render()?))
    }
}

/// A call on the live map itself.
#[derive(Debug, Clone, PartialEq)]
pub enum MapCommand {
    SetView { center: LatLng, zoom: f64 },
    FlyTo { center: LatLng, zoom: f64 },
    FitBounds(Bounds),
    SetZoom(f64),
    ZoomIn,
    ZoomOut,
    GetZoom,
    GetCenter,
    GetBounds,
    InvalidateSize,
}

impl MapCommand {
    pub fn returns_value(&self) -> bool {
        matches!(
            self,
            MapCommand::GetZoom | MapCommand::GetCenter | MapCommand::GetBounds
        )
    }

    /// Render against the expression naming the map, e.g. `this.map`.
    pub fn render(&self, map_binding: &str) -> Result<Envelope> {
        let zoom_level = |zoom: f64| {
            if zoom.is_finite() {
                Ok(JsValue::scale(zoom))
            } else {
                Err(JlMapError::conversion(zoom.to_string(), "zoom must be finite"))
            }
        };
        let statement = match self {
            MapCommand::SetView { center, zoom } => format!(
                "{map_binding}.setView({}, {});",
                lat_lng(center),
                zoom_level(*zoom)?
            ),
            MapCommand::FlyTo { center, zoom } => format!(
                "{map_binding}.flyTo({}, {});",
                lat_lng(center),
                zoom_level(*zoom)?
            ),
            MapCommand::FitBounds(bounds) => format!(
                "{map_binding}.fitBounds([{}, {}]);",
                lat_lng(&bounds.south_west),
                lat_lng(&bounds.north_east)
            ),
            MapCommand::SetZoom(zoom) => {
                format!("{map_binding}.setZoom({});", zoom_level(*zoom)?)
            }
            MapCommand::ZoomIn => format!("{map_binding}.zoomIn();"),
            MapCommand::ZoomOut => format!("{map_binding}.zoomOut();"),
            MapCommand::GetZoom => format!("{map_binding}.getZoom();"),
            MapCommand::GetCenter => format!("{map_binding}.getCenter();"),
            MapCommand::GetBounds => format!("{map_binding}.getBounds();"),
            MapCommand::InvalidateSize => format!("{map_binding}.invalidateSize();"),
        };
        Ok(Envelope::map(statement))
    }
}
