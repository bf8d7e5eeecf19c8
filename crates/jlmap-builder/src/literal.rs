//! JS literal values with fixed textual formatting.
//!
//! Every value renders deterministically so generated scripts are stable and
//! diffable: floats always carry a fixed number of decimals, strings are
//! single-quoted, and object fields keep the order they were declared in.

use std::fmt;

use jlmap_core::error::{JlMapError, Result};
use jlmap_core::protocol::js_string;
use jlmap_core::types::LatLng;

/// Decimals for coordinates and distances.
pub const COORDINATE_PRECISION: usize = 6;

/// Decimals for opacity, weight and other scale fields.
pub const SCALE_PRECISION: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub enum JsValue {
    Number { value: f64, precision: usize },
    Integer(i64),
    Bool(bool),
    Str(String),
    Null,
    Object(Vec<JsField>),
}

impl JsValue {
    pub fn coordinate(value: f64) -> Self {
        JsValue::Number {
            value,
            precision: COORDINATE_PRECISION,
        }
    }

    pub fn scale(value: f64) -> Self {
        JsValue::Number {
            value,
            precision: SCALE_PRECISION,
        }
    }

    pub fn string(value: impl Into<String>) -> Self {
        JsValue::Str(value.into())
    }
}

impl fmt::Display for JsValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JsValue::Number { value, .. } if !value.is_finite() => f.write_str("null"),
            JsValue::Number { value, precision } => write!(f, "{:.*}", *precision, value),
            JsValue::Integer(value) => write!(f, "{value}"),
            JsValue::Bool(value) => write!(f, "{value}"),
            JsValue::Str(value) => f.write_str(&js_string(value)),
            JsValue::Null => f.write_str("null"),
            JsValue::Object(fields) => f.write_str(&object_literal(fields)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsField {
    pub name: &'static str,
    pub value: JsValue,
}

impl JsField {
    pub fn new(name: &'static str, value: JsValue) -> Self {
        Self { name, value }
    }
}

/// `{a: 1, b: 'x'}`, or `{}` for no fields.
pub fn object_literal(fields: &[JsField]) -> String {
    if fields.is_empty() {
        return "{}".to_string();
    }
    let body = fields
        .iter()
        .map(|field| format!("{}: {}", field.name, field.value))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

/// `[lat, lng]` at coordinate precision.
pub fn lat_lng(point: &LatLng) -> String {
    format!(
        "[{}, {}]",
        JsValue::coordinate(point.lat),
        JsValue::coordinate(point.lng)
    )
}

pub fn lat_lng_list(points: &[LatLng]) -> String {
    let items = points.iter().map(lat_lng).collect::<Vec<_>>().join(", ");
    format!("[{items}]")
}

/// Options types render themselves as a JS object literal.
pub trait ToLiteral {
    /// Fields in declared order. Unset optional fields are left out.
    fn fields(&self) -> Vec<JsField>;

    fn to_literal(&self) -> String {
        object_literal(&self.fields())
    }
}

/// A value read back from a rendered literal.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Number(f64),
    Bool(bool),
    Str(String),
    Null,
}

/// Read a flat object literal (as produced by [`object_literal`]) back into
/// its fields. Nested objects and arrays are not supported.
pub fn parse_literal(text: &str) -> Result<Vec<(String, LiteralValue)>> {
    let fail = |reason: &str| JlMapError::conversion(text, reason);
    let inner = text
        .trim()
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| fail("not an object literal"))?;

    let mut fields = Vec::new();
    let mut chars = inner.chars().peekable();
    loop {
        skip_whitespace(&mut chars);
        if chars.peek().is_none() {
            break;
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
                name.push(c);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            return Err(fail("expected a field name"));
        }
        skip_whitespace(&mut chars);
        if chars.next() != Some(':') {
            return Err(fail("expected ':' after field name"));
        }
        skip_whitespace(&mut chars);

        let value = match chars.peek() {
            Some('\'') => {
                chars.next();
                LiteralValue::Str(read_string(&mut chars).ok_or_else(|| fail("bad string"))?)
            }
            Some('{') | Some('[') => return Err(fail("nested values are not supported")),
            Some(_) => {
                let mut token = String::new();
                while let Some(&c) = chars.peek() {
                    if c == ',' || c.is_whitespace() {
                        break;
                    }
                    token.push(c);
                    chars.next();
                }
                match token.as_str() {
                    "true" => LiteralValue::Bool(true),
                    "false" => LiteralValue::Bool(false),
                    "null" => LiteralValue::Null,
                    number => LiteralValue::Number(
                        number.parse().map_err(|_| fail("bad number"))?,
                    ),
                }
            }
            None => return Err(fail("missing value")),
        };
        fields.push((name, value));

        skip_whitespace(&mut chars);
        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(_) => return Err(fail("expected ',' between fields")),
        }
    }
    Ok(fields)
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

/// Read the rest of a single-quoted string, undoing [`js_string`] escapes.
fn read_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let mut out = String::new();
    loop {
        match chars.next()? {
            '\'' => return Some(out),
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                'r' => out.push('\r'),
                't' => out.push('\t'),
                'x' => {
                    let hex: String = chars.by_ref().take(2).collect();
                    out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                }
                'u' => {
                    let hex: String = chars.by_ref().take(4).collect();
                    out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
                }
                other => out.push(other),
            },
            c => out.push(c),
        }
    }
}

/// Typed accessors over parsed fields.
pub(crate) struct ParsedFields(pub Vec<(String, LiteralValue)>);

impl ParsedFields {
    fn get(&self, name: &str) -> Option<&LiteralValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(LiteralValue::Number(n)) => Some(*n),
            _ => None,
        }
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name) {
            Some(LiteralValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(LiteralValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}
