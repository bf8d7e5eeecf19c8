//! Option/command builder DSL.
//!
//! Typed option values render to JS object literals, layers render to
//! constructor expressions, and [`script::creation_script`] wraps them into a
//! complete creation script with event wiring.

pub mod command;
pub mod layer;
pub mod literal;
pub mod options;
pub mod script;

pub use command::{MapCommand, ObjectCommand};
pub use layer::Layer;
pub use literal::{JsField, JsValue, LiteralValue, ToLiteral, parse_literal};
pub use options::{Color, FillRule, LineCap, LineJoin, MarkerOptions, PopupOptions, ShapeOptions};
pub use script::{creation_script, map_subscription_script, render_layer};
